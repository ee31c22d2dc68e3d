//! # Scratch Pipeline
//!
//! A scriptable frame render pipeline. Every frame, for each camera:
//! cull the scene, pack the visible lights into a GPU buffer, record the
//! passes of the active pipeline variant into a command stream, and submit
//! it to a [`RenderBackend`](render::RenderBackend).
//!
//! ## Features
//!
//! - **Five pipeline variants**: clear, unlit, lit, skybox and deferred
//! - **Per-camera isolation**: a camera that fails to cull or record never
//!   affects the others
//! - **Leak-free temporaries**: every temporary render target is released
//!   exactly once, whether the camera submits or is abandoned
//! - **Headless backend**: [`RecordingBackend`](render::RecordingBackend)
//!   validates and stores submissions for tests and tooling
//!
//! ## Quick Start
//!
//! ```rust
//! use scratch_pipeline::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let materials = MaterialLibrary::with_builtin_materials();
//!     let standard = materials.find_by_name("Standard").ok_or("no Standard material")?;
//!
//!     let scene = Scene::new()
//!         .with_object(RenderObject::new(
//!             "crate",
//!             Transform::from_position(Vec3::new(0.0, 0.0, -5.0)),
//!             BoundingSphere::new(Vec3::zeros(), 1.0),
//!             standard,
//!         ))
//!         .with_light(Light::directional(Vec3::new(0.0, -1.0, 0.0), Color::WHITE, 1.0));
//!     let camera = Camera::perspective("main", 640, 480, 60.0, 0.1, 100.0);
//!
//!     let asset = PipelineAsset::new("Deferred", PipelineKind::Deferred);
//!     let mut renderer = Renderer::from_asset(asset, RecordingBackend::new(), materials)?;
//!     let report = renderer.render(&[camera], &scene);
//!     assert_eq!(report.submitted(), 1);
//!
//!     renderer.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;

/// Common imports for pipeline users
pub mod prelude {
    pub use crate::{
        core::{Config, ConfigError, PipelineAsset, RendererConfig, ShaderLibraryConfig},
        foundation::math::{Color, Mat4, Transform, Vec3},
        render::{
            CameraFrameState, FrameReport, FrameRenderer, MaterialLibrary, PipelineKind,
            RecordingBackend, RenderBackend, RenderError, RenderResult, Renderer,
        },
        scene::{BoundingSphere, Camera, CameraTarget, Light, LightType, RenderObject, Scene},
    };
}

//! # Rendering System
//!
//! The frame render pipeline: for every camera, cull the scene, record the
//! passes of the active pipeline variant, and submit the recorded commands to
//! a backend.
//!
//! ## Architecture
//!
//! - **Renderer**: Per-frame driver; owns the backend, the pipeline instance
//!   and the per-frame scratch memory
//! - **Visibility Resolver**: Frustum culling into reusable cull results
//! - **Light Packer**: Fixed-capacity GPU light buffer
//! - **Render Context**: Per-camera command recording and temporary target
//!   bookkeeping
//! - **Pipelines**: Clear, unlit, lit, skybox and deferred variants
//! - **Backends**: Implementations of [`RenderBackend`]
//!
//! ## Failure model
//!
//! Failures are scoped to one camera. A camera that fails culling is skipped;
//! a camera whose passes fail is abandoned and its temporary targets are
//! released. Other cameras in the same frame are unaffected.

pub mod backend;
pub mod backends;
pub mod commands;
pub mod context;
pub mod drawing;
pub mod frame;
pub mod lighting;
pub mod materials;
pub mod pipelines;
pub mod properties;
pub mod renderer;
pub mod targets;
pub mod visibility;


pub use backend::{BackendError, BackendResult, RenderBackend};
pub use backends::{RecordingBackend, Submission};
pub use commands::{ClearFlags, Command, CommandBuffer, CommandBufferPool};
pub use context::RenderContext;
pub use drawing::{shader_pass, DrawSettings, FilterSettings, QueueRange, SortMode};
pub use frame::{CameraFrameState, CameraOutcome, FrameArena, FrameReport, FrameScratch};
pub use lighting::{
    LightBuffer, LightPacker, PackedLight, DIRECTIONAL_LIGHT_SENTINEL, MAX_VISIBLE_LIGHTS,
};
pub use materials::{render_queue, Material, MaterialLibrary};
pub use pipelines::{create_pipeline, FrameRenderer, PipelineKind};
pub use properties::{property_to_id, BuiltinProperties, PropertyId};
pub use renderer::Renderer;
pub use targets::{FilterMode, TargetDesc, TargetId, TextureFormat};
pub use visibility::{CullResults, VisibilityResolver, VisibleLight, VisibleRenderer};

use thiserror::Error;

/// Errors that can occur while rendering a frame
///
/// All of them are scoped to one camera or one pipeline instance; none of
/// them ends the process.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The camera could not be culled
    ///
    /// The camera is skipped for this frame. Other cameras still render.
    #[error("Culling failed for camera '{camera}': {reason}")]
    CullingFailed {
        /// Camera name
        camera: String,
        /// What was wrong with the camera
        reason: String,
    },

    /// A temporary render target could not be allocated
    ///
    /// The camera's frame is abandoned and every target it already acquired
    /// is released.
    #[error("Failed to allocate render target '{target}': {reason}")]
    TargetAllocationFailed {
        /// Target name
        target: String,
        /// Why the allocation failed
        reason: String,
    },

    /// A persistent GPU resource could not be created
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// A material named by the pipeline asset is not in the library
    #[error("Material not found: {0}")]
    MissingMaterial(String),

    /// Backend-specific error occurred
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// The pipeline asset or renderer configuration is invalid
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;

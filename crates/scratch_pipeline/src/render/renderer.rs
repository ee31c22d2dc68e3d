//! # Renderer
//!
//! The per-frame driver around a [`FrameRenderer`]. For each camera, in order:
//!
//! 1. cull the scene into the frame's scratch cull results
//! 2. set up camera properties
//! 3. let the pipeline record its passes
//! 4. submit, or abandon on failure
//!
//! Cameras are processed strictly one after another. A failing camera never
//! affects the ones after it.

use std::path::PathBuf;

use crate::core::config::{PipelineAsset, RendererConfig};
use crate::render::backend::RenderBackend;
use crate::render::commands::CommandBufferPool;
use crate::render::context::RenderContext;
use crate::render::frame::{CameraFrameState, CameraOutcome, FrameArena, FrameReport};
use crate::render::materials::MaterialLibrary;
use crate::render::pipelines::{create_pipeline, FrameRenderer, PipelineKind};
use crate::render::visibility::VisibilityResolver;
use crate::render::{RenderError, RenderResult};
use crate::scene::{Camera, Scene};

/// Frame driver owning the backend and one pipeline instance
pub struct Renderer<B: RenderBackend> {
    backend: B,
    pipeline: Option<Box<dyn FrameRenderer>>,
    materials: MaterialLibrary,
    resolver: VisibilityResolver,
    arena: FrameArena,
    command_pool: CommandBufferPool,
    shader_include_paths: Vec<PathBuf>,
    frame_index: u64,
}

impl<B: RenderBackend> Renderer<B> {
    /// Build the renderer and the pipeline named by `config.pipeline`
    pub fn new(config: &RendererConfig, mut backend: B, materials: MaterialLibrary) -> RenderResult<Self> {
        config
            .validate()
            .map_err(|e| RenderError::InvalidConfiguration(e.to_string()))?;
        let shader_include_paths = config
            .shader_library
            .resolve()
            .map_err(|e| RenderError::InvalidConfiguration(e.to_string()))?;
        for path in &shader_include_paths {
            log::debug!("Shader include path: {}", path.display());
        }

        let pipeline = create_pipeline(&config.pipeline, &mut backend, &materials)?;

        Ok(Self {
            backend,
            pipeline: Some(pipeline),
            materials,
            resolver: VisibilityResolver::new(),
            arena: FrameArena::new(config.max_frames_in_flight),
            command_pool: CommandBufferPool::new(),
            shader_include_paths,
            frame_index: 0,
        })
    }

    /// Build a renderer with default settings around `asset`
    pub fn from_asset(asset: PipelineAsset, backend: B, materials: MaterialLibrary) -> RenderResult<Self> {
        Self::new(&RendererConfig::new(asset), backend, materials)
    }

    /// Render one frame for every camera
    pub fn render(&mut self, cameras: &[Camera], scene: &Scene) -> FrameReport {
        let frame_index = self.frame_index;
        self.frame_index += 1;
        let mut report = FrameReport::new(frame_index);

        let Some(pipeline) = self.pipeline.as_mut() else {
            log::warn!("Render called after shutdown, frame {} skipped", frame_index);
            return report;
        };
        let scratch = self.arena.slot_mut(frame_index);

        for camera in cameras {
            let mut outcome = CameraOutcome::new(camera.name.as_str());

            if let Err(e) = self
                .resolver
                .cull(camera, scene, &self.materials, &mut scratch.cull_results)
            {
                log::warn!("Skipping camera '{}': {}", camera.name, e);
                outcome.fail(CameraFrameState::CullFailed, &e);
                report.cameras.push(outcome);
                continue;
            }
            outcome.advance(CameraFrameState::Culled);
            outcome.visible_renderers = scratch.cull_results.visible_renderers.len();
            outcome.visible_lights = scratch.cull_results.visible_lights.len();

            let mut ctx = RenderContext::new(
                &mut self.backend,
                &self.materials,
                &mut self.command_pool,
                &mut scratch.commands,
                &camera.name,
            );
            ctx.setup_camera_properties(camera);

            let recorded = pipeline.render_camera(&mut ctx, camera, &scratch.cull_results);
            outcome.targets_acquired = ctx.acquired_total();
            match recorded {
                Ok(()) => {
                    outcome.advance(CameraFrameState::PassesRecorded);
                    let command_count = ctx.commands().len();
                    match ctx.submit() {
                        Ok(()) => {
                            outcome.commands_submitted = command_count;
                            outcome.advance(CameraFrameState::Submitted);
                        }
                        Err(e) => {
                            log::warn!("Submission failed for camera '{}': {}", camera.name, e);
                            outcome.fail(CameraFrameState::Abandoned, &e);
                        }
                    }
                }
                Err(e) => {
                    log::warn!("Recording failed for camera '{}': {}", camera.name, e);
                    ctx.abandon();
                    outcome.fail(CameraFrameState::Abandoned, &e);
                }
            }
            report.cameras.push(outcome);
        }

        log::debug!(
            "Frame {}: {} submitted, {} skipped, {} abandoned",
            frame_index,
            report.submitted(),
            report.skipped(),
            report.abandoned()
        );
        report
    }

    /// Dispose the pipeline. Later calls do nothing.
    pub fn shutdown(&mut self) {
        if let Some(mut pipeline) = self.pipeline.take() {
            pipeline.dispose(&mut self.backend);
            log::info!("Renderer shut down after {} frames", self.frame_index);
        }
    }

    /// Active pipeline variant, until shutdown
    pub fn pipeline_kind(&self) -> Option<PipelineKind> {
        self.pipeline.as_ref().map(|p| p.kind())
    }

    /// Frames rendered so far
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The material library
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    /// Absolute shader include directories
    pub fn shader_include_paths(&self) -> &[PathBuf] {
        &self.shader_include_paths
    }
}

impl<B: RenderBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

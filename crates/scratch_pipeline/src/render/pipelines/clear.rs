//! Clear-only pipeline

use crate::core::config::PipelineAsset;
use crate::foundation::math::Color;
use crate::render::backend::RenderBackend;
use crate::render::commands::ClearFlags;
use crate::render::context::RenderContext;
use crate::render::pipelines::{FrameRenderer, PipelineKind};
use crate::render::visibility::CullResults;
use crate::render::RenderResult;
use crate::scene::Camera;

/// Clears the camera target's color and depth
#[derive(Debug)]
pub struct ClearPipeline {
    clear_color: Color,
}

impl ClearPipeline {
    /// Create from an asset
    pub fn new(asset: &PipelineAsset) -> Self {
        Self {
            clear_color: asset.clear_color,
        }
    }
}

impl FrameRenderer for ClearPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Clear
    }

    fn render_camera(&mut self, ctx: &mut RenderContext<'_>, _camera: &Camera, _cull: &CullResults) -> RenderResult<()> {
        let clear_color = self.clear_color;
        ctx.record("Clear", |cmd| cmd.clear_render_target(ClearFlags::ALL, clear_color))
    }

    fn dispose(&mut self, _backend: &mut dyn RenderBackend) {
        log::info!("Disposed clear pipeline");
    }
}

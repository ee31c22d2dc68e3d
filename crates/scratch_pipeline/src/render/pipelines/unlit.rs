//! Forward pipeline without lighting

use crate::core::config::PipelineAsset;
use crate::foundation::math::Color;
use crate::render::backend::RenderBackend;
use crate::render::commands::ClearFlags;
use crate::render::context::RenderContext;
use crate::render::drawing::shader_pass;
use crate::render::pipelines::{draw_opaque, draw_transparent, FrameRenderer, PipelineKind};
use crate::render::visibility::CullResults;
use crate::render::RenderResult;
use crate::scene::Camera;

/// Clears, then draws opaque and transparent renderers with the forward pass
#[derive(Debug)]
pub struct UnlitPipeline {
    clear_color: Color,
}

impl UnlitPipeline {
    /// Create from an asset
    pub fn new(asset: &PipelineAsset) -> Self {
        Self {
            clear_color: asset.clear_color,
        }
    }
}

impl FrameRenderer for UnlitPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Unlit
    }

    fn render_camera(&mut self, ctx: &mut RenderContext<'_>, _camera: &Camera, cull: &CullResults) -> RenderResult<()> {
        let clear_color = self.clear_color;
        ctx.record("Clear", |cmd| cmd.clear_render_target(ClearFlags::ALL, clear_color))?;

        draw_opaque(ctx, cull, shader_pass::FORWARD);
        draw_transparent(ctx, cull);
        Ok(())
    }

    fn dispose(&mut self, _backend: &mut dyn RenderBackend) {
        log::info!("Disposed unlit pipeline");
    }
}

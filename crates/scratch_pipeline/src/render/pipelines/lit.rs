//! Forward pipeline with a packed light buffer

use crate::core::config::PipelineAsset;
use crate::foundation::math::Color;
use crate::render::backend::RenderBackend;
use crate::render::commands::ClearFlags;
use crate::render::context::RenderContext;
use crate::render::drawing::shader_pass;
use crate::render::lighting::{setup_light_buffer, LightBuffer};
use crate::render::pipelines::{draw_opaque, draw_transparent, FrameRenderer, PipelineKind};
use crate::render::visibility::CullResults;
use crate::render::RenderResult;
use crate::scene::Camera;

/// Clears, publishes the visible lights, then draws forward
#[derive(Debug)]
pub struct LitPipeline {
    clear_color: Color,
    light_buffer: LightBuffer,
}

impl LitPipeline {
    /// Create from an asset, allocating the light buffer
    pub fn new(asset: &PipelineAsset, backend: &mut dyn RenderBackend) -> RenderResult<Self> {
        Ok(Self {
            clear_color: asset.clear_color,
            light_buffer: LightBuffer::create(backend, asset.light_capacity)?,
        })
    }
}

impl FrameRenderer for LitPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Lit
    }

    fn render_camera(&mut self, ctx: &mut RenderContext<'_>, _camera: &Camera, cull: &CullResults) -> RenderResult<()> {
        let clear_color = self.clear_color;
        ctx.record("Clear", |cmd| cmd.clear_render_target(ClearFlags::ALL, clear_color))?;

        setup_light_buffer(ctx, &mut self.light_buffer, cull)?;

        draw_opaque(ctx, cull, shader_pass::FORWARD);
        draw_transparent(ctx, cull);
        Ok(())
    }

    fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        if self.light_buffer.release(backend) {
            log::info!("Disposed lit pipeline");
        }
    }
}

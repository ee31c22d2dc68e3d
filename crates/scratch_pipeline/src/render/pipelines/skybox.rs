//! Offscreen forward pipeline with a skybox
//!
//! Renders into temporary `_ColorRT` / `_CameraDepthTexture` targets, draws
//! the skybox between opaque and transparent geometry (it relies on the depth
//! buffer to fill only uncovered pixels), then copies depth and color into
//! the camera target.

use crate::core::config::PipelineAsset;
use crate::foundation::collections::MaterialHandle;
use crate::foundation::math::Color;
use crate::render::backend::RenderBackend;
use crate::render::commands::ClearFlags;
use crate::render::context::RenderContext;
use crate::render::drawing::shader_pass;
use crate::render::lighting::{setup_light_buffer, LightBuffer};
use crate::render::materials::MaterialLibrary;
use crate::render::pipelines::{draw_opaque, draw_transparent, resolve_material, FrameRenderer, PipelineKind};
use crate::render::properties::BuiltinProperties;
use crate::render::targets::{TargetDesc, TargetId, TextureFormat};
use crate::render::visibility::CullResults;
use crate::render::RenderResult;
use crate::scene::Camera;

/// Forward rendering into offscreen targets with skybox and depth copy
#[derive(Debug)]
pub struct SkyboxPipeline {
    clear_color: Color,
    light_buffer: LightBuffer,
    copy_depth: MaterialHandle,
}

impl SkyboxPipeline {
    /// Create from an asset, resolving its copy-depth material
    pub fn new(
        asset: &PipelineAsset,
        backend: &mut dyn RenderBackend,
        materials: &MaterialLibrary,
    ) -> RenderResult<Self> {
        let copy_depth = resolve_material(materials, asset.copy_depth_material.as_deref(), "copy depth")?;
        Ok(Self {
            clear_color: asset.clear_color,
            light_buffer: LightBuffer::create(backend, asset.light_capacity)?,
            copy_depth,
        })
    }
}

impl FrameRenderer for SkyboxPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Skybox
    }

    fn render_camera(&mut self, ctx: &mut RenderContext<'_>, camera: &Camera, cull: &CullResults) -> RenderResult<()> {
        let properties = BuiltinProperties::get();
        let (width, height) = (camera.pixel_width, camera.pixel_height);
        let clear_color = self.clear_color;
        let copy_depth = self.copy_depth;

        ctx.record("Set-up Render Targets", |cmd| {
            cmd.get_temporary_target(properties.color, TargetDesc::color(width, height, TextureFormat::Argb32));
            cmd.get_temporary_target(properties.camera_depth, TargetDesc::depth(width, height, 24));
            cmd.set_render_target(properties.color, properties.camera_depth);
            cmd.clear_render_target(ClearFlags::ALL, clear_color);
        })?;

        setup_light_buffer(ctx, &mut self.light_buffer, cull)?;

        draw_opaque(ctx, cull, shader_pass::FORWARD);
        ctx.draw_skybox();
        draw_transparent(ctx, cull);

        ctx.record("Copy Depth", |cmd| {
            cmd.blit(TargetId::CameraTarget, TargetId::CameraTarget, Some(copy_depth));
        })?;

        ctx.record("Final Blit", |cmd| {
            cmd.blit(properties.color, TargetId::CameraTarget, None);
            cmd.release_temporary_target(properties.color);
            cmd.release_temporary_target(properties.camera_depth);
        })
    }

    fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        if self.light_buffer.release(backend) {
            log::info!("Disposed skybox pipeline");
        }
    }
}

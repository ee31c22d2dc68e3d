//! # Deferred Pipeline
//!
//! Opaque geometry is written into a G-buffer, lights are packed, and a
//! full-screen composite resolves the G-buffer into `_ColorRT`. Skybox and
//! transparent geometry are then drawn forward on top, before depth and
//! color are copied into the camera target.
//!
//! | target                | format       | contents |
//! |-----------------------|--------------|----------|
//! | `_GBuffer0`           | ARGB32       | albedo   |
//! | `_GBuffer1`           | ARGB2101010  | normals  |
//! | `_ColorRT`            | ARGB32       | lit color |
//! | `_CameraDepthTexture` | 24-bit depth | scene depth |
//!
//! The composite blit must come after the G-buffer draw and before the
//! skybox; it rebinds the render target, so `_ColorRT` is bound again right
//! after it.

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

/// G-buffer fill plus full-screen composite
#[derive(Debug)]
pub struct DeferredPipeline {
    clear_color: Color,
    light_buffer: LightBuffer,
    copy_depth: MaterialHandle,
    deferred: MaterialHandle,
    gbuffer_targets: [TargetId; 2],
}

impl DeferredPipeline {
    /// Create from an asset, resolving its copy-depth and deferred materials
    pub fn new(
        asset: &PipelineAsset,
        backend: &mut dyn RenderBackend,
        materials: &MaterialLibrary,
    ) -> RenderResult<Self> {
        let copy_depth = resolve_material(materials, asset.copy_depth_material.as_deref(), "copy depth")?;
        let deferred = resolve_material(materials, asset.deferred_material.as_deref(), "deferred")?;
        let properties = BuiltinProperties::get();
        Ok(Self {
            clear_color: asset.clear_color,
            light_buffer: LightBuffer::create(backend, asset.light_capacity)?,
            copy_depth,
            deferred,
            gbuffer_targets: [properties.gbuffer0.into(), properties.gbuffer1.into()],
        })
    }
}

impl FrameRenderer for DeferredPipeline {
    fn kind(&self) -> PipelineKind {
        PipelineKind::Deferred
    }

    fn render_camera(&mut self, ctx: &mut RenderContext<'_>, camera: &Camera, cull: &CullResults) -> RenderResult<()> {
        let properties = BuiltinProperties::get();
        let (width, height) = (camera.pixel_width, camera.pixel_height);
        let clear_color = self.clear_color;
        let gbuffer_targets = self.gbuffer_targets;
        let (copy_depth, deferred) = (self.copy_depth, self.deferred);

        ctx.record("Set-up Render Targets", |cmd| {
            cmd.get_temporary_target(properties.gbuffer0, TargetDesc::color(width, height, TextureFormat::Argb32));
            cmd.get_temporary_target(
                properties.gbuffer1,
                TargetDesc::color(width, height, TextureFormat::Argb2101010),
            );
            cmd.get_temporary_target(properties.color, TargetDesc::color(width, height, TextureFormat::Argb32));
            cmd.get_temporary_target(properties.camera_depth, TargetDesc::depth(width, height, 24));
            cmd.set_render_targets(&gbuffer_targets, properties.camera_depth);
            cmd.clear_render_target(ClearFlags::ALL, clear_color);
        })?;

        // Lights are not needed to fill the G-buffer
        draw_opaque(ctx, cull, shader_pass::GBUFFER);

        setup_light_buffer(ctx, &mut self.light_buffer, cull)?;

        ctx.record("Deferred", |cmd| {
            cmd.blit(properties.color, properties.color, Some(deferred));
            cmd.set_render_target(properties.color, properties.camera_depth);
        })?;

        ctx.record("Skybox", |_| {})?;
        ctx.draw_skybox();

        draw_transparent(ctx, cull);

        ctx.record("Copy Depth", |cmd| {
            cmd.blit(TargetId::CameraTarget, TargetId::CameraTarget, Some(copy_depth));
        })?;

        ctx.record("Final Blit", |cmd| {
            cmd.blit(properties.color, TargetId::CameraTarget, None);
            cmd.release_temporary_target(properties.gbuffer0);
            cmd.release_temporary_target(properties.gbuffer1);
            cmd.release_temporary_target(properties.color);
            cmd.release_temporary_target(properties.camera_depth);
        })
    }

    fn dispose(&mut self, backend: &mut dyn RenderBackend) {
        if self.light_buffer.release(backend) {
            log::info!("Disposed deferred pipeline");
        }
    }
}

//! # Pipeline Variants
//!
//! Each variant records the passes for one camera into a
//! [`RenderContext`]. Culling, camera setup, submission and failure handling
//! live in the [`Renderer`](crate::render::Renderer) that drives them, so a
//! variant only describes its passes.
//!
//! | kind       | passes                                                       |
//! |------------|--------------------------------------------------------------|
//! | `clear`    | clear                                                        |
//! | `unlit`    | clear, opaque, transparent                                   |
//! | `lit`      | clear, light buffer, opaque, transparent                     |
//! | `skybox`   | temp targets, light buffer, opaque, skybox, transparent, depth copy, final blit |
//! | `deferred` | G-buffer fill, light buffer, composite, skybox, transparent, depth copy, final blit |

mod clear;
mod deferred;
mod lit;
mod skybox;
mod unlit;

pub use clear::ClearPipeline;
pub use deferred::DeferredPipeline;
pub use lit::LitPipeline;
pub use skybox::SkyboxPipeline;
pub use unlit::UnlitPipeline;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::config::PipelineAsset;
use crate::foundation::collections::MaterialHandle;
use crate::render::backend::RenderBackend;
use crate::render::context::RenderContext;
use crate::render::drawing::{shader_pass, DrawSettings, FilterSettings, SortMode};
use crate::render::materials::MaterialLibrary;
use crate::render::visibility::CullResults;
use crate::render::{RenderError, RenderResult};
use crate::scene::Camera;

/// Pipeline variant named by a pipeline asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    /// Clear only
    Clear,
    /// Forward, no lights
    Unlit,
    /// Forward with a packed light buffer
    Lit,
    /// Offscreen color and depth with a skybox
    Skybox,
    /// G-buffer fill and full-screen composite
    Deferred,
}

impl PipelineKind {
    /// Every variant, simplest first
    pub const ALL: [Self; 5] = [Self::Clear, Self::Unlit, Self::Lit, Self::Skybox, Self::Deferred];

    /// Lowercase name, as written in asset files
    pub fn name(self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Unlit => "unlit",
            Self::Lit => "lit",
            Self::Skybox => "skybox",
            Self::Deferred => "deferred",
        }
    }

    /// Whether the variant blits depth with a copy-depth material
    pub fn requires_copy_depth(self) -> bool {
        matches!(self, Self::Skybox | Self::Deferred)
    }

    /// Whether the variant composites with a deferred material
    pub fn requires_deferred_material(self) -> bool {
        matches!(self, Self::Deferred)
    }

    /// Whether the variant owns a persistent light buffer
    pub fn uses_light_buffer(self) -> bool {
        matches!(self, Self::Lit | Self::Skybox | Self::Deferred)
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown pipeline kind '{}'", s))
    }
}

/// A pipeline variant
///
/// Implementations own their persistent GPU resources and give them back in
/// [`FrameRenderer::dispose`], which the renderer calls exactly once.
pub trait FrameRenderer {
    /// Which variant this is
    fn kind(&self) -> PipelineKind;

    /// Record every pass for `camera`.
    ///
    /// Camera properties are already set up. On error the renderer abandons
    /// the camera and releases its temporary targets.
    fn render_camera(
        &mut self,
        ctx: &mut RenderContext<'_>,
        camera: &Camera,
        cull: &CullResults,
    ) -> RenderResult<()>;

    /// Release persistent resources
    fn dispose(&mut self, backend: &mut dyn RenderBackend);
}

/// Build the pipeline variant named by `asset`
pub fn create_pipeline(
    asset: &PipelineAsset,
    backend: &mut dyn RenderBackend,
    materials: &MaterialLibrary,
) -> RenderResult<Box<dyn FrameRenderer>> {
    asset
        .validate()
        .map_err(|e| RenderError::InvalidConfiguration(e.to_string()))?;

    let pipeline: Box<dyn FrameRenderer> = match asset.kind {
        PipelineKind::Clear => Box::new(ClearPipeline::new(asset)),
        PipelineKind::Unlit => Box::new(UnlitPipeline::new(asset)),
        PipelineKind::Lit => Box::new(LitPipeline::new(asset, backend)?),
        PipelineKind::Skybox => Box::new(SkyboxPipeline::new(asset, backend, materials)?),
        PipelineKind::Deferred => Box::new(DeferredPipeline::new(asset, backend, materials)?),
    };
    log::info!(
        "Created {} pipeline '{}' on {} backend",
        asset.kind,
        asset.name,
        backend.name()
    );
    Ok(pipeline)
}

/// Resolve a material named by the asset
fn resolve_material(materials: &MaterialLibrary, name: Option<&str>, role: &str) -> RenderResult<MaterialHandle> {
    let name = name.ok_or_else(|| RenderError::InvalidConfiguration(format!("no {} material configured", role)))?;
    materials
        .find_by_name(name)
        .ok_or_else(|| RenderError::MissingMaterial(name.to_string()))
}

/// Opaque renderers, front-to-back
fn draw_opaque(ctx: &mut RenderContext<'_>, cull: &CullResults, pass: &str) {
    ctx.draw_renderers(
        cull,
        &DrawSettings::new(pass, SortMode::CommonOpaque),
        &FilterSettings::opaque(),
    );
}

/// Transparent renderers with the forward pass, back-to-front
fn draw_transparent(ctx: &mut RenderContext<'_>, cull: &CullResults) {
    ctx.draw_renderers(
        cull,
        &DrawSettings::new(shader_pass::FORWARD, SortMode::CommonTransparent),
        &FilterSettings::transparent(),
    );
}

//! # Unified Configuration System
//!
//! This module holds every configuration structure the pipeline reads at
//! startup: the pipeline asset, shader library locations, logging and frame
//! pacing.
//!
//! ## Design Goals
//!
//! - **Centralized**: All configuration types in one place for easy discovery
//! - **Serializable**: Loaded from TOML or RON through [`Config`]
//! - **Type Safe**: Strong typing with validation and defaults
//!
//! ## Configuration Categories
//!
//! - **Pipeline Asset**: Which pipeline variant to build and the materials it uses
//! - **Shader Library**: Include directories handed to shader compilation
//! - **Renderer Config**: Top-level settings combining the above

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::foundation::math::Color;
use crate::render::lighting::MAX_VISIBLE_LIGHTS;
use crate::render::pipelines::PipelineKind;

pub use crate::config::{Config, ConfigError};

/// Upper bound for frames in flight
pub const MAX_FRAMES_IN_FLIGHT: usize = 8;

/// # Pipeline Asset
///
/// The named, serializable description of a pipeline instance. A renderer
/// builds exactly one pipeline from its asset at construction time, so later
/// edits to the asset never affect a running pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineAsset {
    /// Display name of the asset
    pub name: String,
    /// Which pipeline variant to instantiate
    pub kind: PipelineKind,
    /// Capacity of the persistent light buffer, in lights
    pub light_capacity: usize,
    /// Color used when clearing the color targets
    pub clear_color: Color,
    /// Full-screen material that copies scene depth into the camera target
    pub copy_depth_material: Option<String>,
    /// Full-screen material that resolves the G-buffer into lit color
    pub deferred_material: Option<String>,
}

impl PipelineAsset {
    /// Default file name used by [`PipelineAsset::create_asset`] callers
    pub const DEFAULT_FILE_NAME: &'static str = "ScratchAsset.toml";

    /// Create an asset for the given pipeline kind with default settings
    pub fn new(name: impl Into<String>, kind: PipelineKind) -> Self {
        let mut asset = Self {
            name: name.into(),
            kind,
            ..Self::default()
        };
        if kind.requires_copy_depth() {
            asset.copy_depth_material = Some("CopyDepth".to_string());
        }
        if kind.requires_deferred_material() {
            asset.deferred_material = Some("DeferredComposite".to_string());
        }
        asset
    }

    /// Set the copy-depth material name
    pub fn with_copy_depth_material(mut self, name: impl Into<String>) -> Self {
        self.copy_depth_material = Some(name.into());
        self
    }

    /// Set the deferred composite material name
    pub fn with_deferred_material(mut self, name: impl Into<String>) -> Self {
        self.deferred_material = Some(name.into());
        self
    }

    /// Set the light buffer capacity
    pub fn with_light_capacity(mut self, capacity: usize) -> Self {
        self.light_capacity = capacity;
        self
    }

    /// Set the clear color
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Validate the asset
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Validation("Pipeline asset name cannot be empty".to_string()));
        }
        if self.light_capacity == 0 {
            return Err(ConfigError::Validation("Light capacity must be at least 1".to_string()));
        }
        if self.kind.requires_copy_depth() && self.copy_depth_material.is_none() {
            return Err(ConfigError::Validation(format!(
                "{} pipeline requires a copy depth material",
                self.kind
            )));
        }
        if self.kind.requires_deferred_material() && self.deferred_material.is_none() {
            return Err(ConfigError::Validation(format!(
                "{} pipeline requires a deferred material",
                self.kind
            )));
        }
        Ok(())
    }

    /// Write a new asset with default settings to `path`.
    ///
    /// Fails rather than overwriting an existing file.
    pub fn create_asset(path: &str, kind: PipelineKind) -> Result<Self, ConfigError> {
        if Path::new(path).exists() {
            return Err(ConfigError::Validation(format!("Asset already exists: {}", path)));
        }
        let name = Path::new(path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("ScratchAsset")
            .to_string();
        let asset = Self::new(name, kind);
        asset.save_to_file(path)?;
        log::info!("Created {} pipeline asset at {}", kind, path);
        Ok(asset)
    }
}

impl Default for PipelineAsset {
    fn default() -> Self {
        Self {
            name: "ScratchAsset".to_string(),
            kind: PipelineKind::Clear,
            light_capacity: MAX_VISIBLE_LIGHTS,
            clear_color: Color::BLACK,
            copy_depth_material: None,
            deferred_material: None,
        }
    }
}

impl Config for PipelineAsset {}

/// # Shader Library Configuration
///
/// Include directories made available to shader compilation. Relative
/// entries are resolved against the working directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderLibraryConfig {
    /// Include directories, absolute or relative
    pub include_paths: Vec<String>,
}

impl ShaderLibraryConfig {
    /// Resolve the include directories to absolute paths
    pub fn resolve(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let cwd = std::env::current_dir()?;
        Ok(self
            .include_paths
            .iter()
            .map(|p| {
                let path = Path::new(p);
                if path.is_absolute() {
                    path.to_path_buf()
                } else {
                    cwd.join(path)
                }
            })
            .collect())
    }

    /// Validate that every include directory exists
    pub fn validate(&self) -> Result<(), ConfigError> {
        for path in self.resolve()? {
            if !path.is_dir() {
                return Err(ConfigError::Validation(format!(
                    "Shader include path not found: {}",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// # Renderer Configuration
///
/// Top-level configuration that applications load at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Log level filter applied when logging is initialized
    pub log_level: String,
    /// Number of frame scratch slots kept alive for reuse
    pub max_frames_in_flight: usize,
    /// The pipeline to build
    pub pipeline: PipelineAsset,
    /// Shader include directories
    pub shader_library: ShaderLibraryConfig,
}

impl RendererConfig {
    /// Create a configuration for the given pipeline asset
    pub fn new(pipeline: PipelineAsset) -> Self {
        Self {
            pipeline,
            ..Self::default()
        }
    }

    /// Set maximum frames in flight
    pub fn with_max_frames_in_flight(mut self, frames: usize) -> Self {
        self.max_frames_in_flight = frames;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frames_in_flight == 0 {
            return Err(ConfigError::Validation("Max frames in flight must be at least 1".to_string()));
        }
        if self.max_frames_in_flight > MAX_FRAMES_IN_FLIGHT {
            return Err(ConfigError::Validation(format!(
                "Max frames in flight should not exceed {}",
                MAX_FRAMES_IN_FLIGHT
            )));
        }
        self.pipeline.validate()?;
        self.shader_library.validate()
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            max_frames_in_flight: 2,
            pipeline: PipelineAsset::default(),
            shader_library: ShaderLibraryConfig::default(),
        }
    }
}

impl Config for RendererConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RendererConfig::default().validate().is_ok());
    }

    #[test]
    fn test_deferred_asset_names_both_materials() {
        let asset = PipelineAsset::new("Deferred", PipelineKind::Deferred);
        assert!(asset.copy_depth_material.is_some());
        assert!(asset.deferred_material.is_some());
        assert!(asset.validate().is_ok());
    }

    #[test]
    fn test_missing_material_rejected() {
        let mut asset = PipelineAsset::new("Skybox", PipelineKind::Skybox);
        asset.copy_depth_material = None;
        assert!(matches!(asset.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_zero_light_capacity_rejected() {
        let asset = PipelineAsset::new("Lit", PipelineKind::Lit).with_light_capacity(0);
        assert!(asset.validate().is_err());
    }

    #[test]
    fn test_frames_in_flight_bounds() {
        assert!(RendererConfig::default().with_max_frames_in_flight(0).validate().is_err());
        assert!(RendererConfig::default().with_max_frames_in_flight(9).validate().is_err());
        assert!(RendererConfig::default().with_max_frames_in_flight(3).validate().is_ok());
    }

    #[test]
    fn test_renderer_config_from_toml() {
        let text = r#"
            log_level = "debug"
            max_frames_in_flight = 3

            [pipeline]
            name = "Workshop"
            kind = "deferred"
            light_capacity = 32
            copy_depth_material = "CopyDepth"
            deferred_material = "DeferredComposite"

            [pipeline.clear_color]
            r = 0.1
            g = 0.2
            b = 0.3
            a = 1.0
        "#;
        let config = RendererConfig::from_toml_str(text).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.max_frames_in_flight, 3);
        assert_eq!(config.pipeline.kind, PipelineKind::Deferred);
        assert_eq!(config.pipeline.light_capacity, 32);
        assert_eq!(config.pipeline.clear_color, Color::new(0.1, 0.2, 0.3, 1.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = RendererConfig::from_toml_str("[pipeline]\nkind = \"lit\"\n").unwrap();
        assert_eq!(config.pipeline.kind, PipelineKind::Lit);
        assert_eq!(config.pipeline.light_capacity, MAX_VISIBLE_LIGHTS);
        assert_eq!(config.max_frames_in_flight, 2);
    }

    #[test]
    fn test_create_asset_writes_and_refuses_overwrite() {
        let dir = std::env::temp_dir().join(format!("scratch_asset_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("Workshop.toml");
        let path_str = path.to_str().unwrap();
        let _ = std::fs::remove_file(&path);

        let created = PipelineAsset::create_asset(path_str, PipelineKind::Deferred).unwrap();
        assert_eq!(created.name, "Workshop");

        let loaded = PipelineAsset::load_from_file(path_str).unwrap();
        assert_eq!(loaded, created);

        assert!(PipelineAsset::create_asset(path_str, PipelineKind::Deferred).is_err());
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_shader_library_resolves_relative_paths() {
        let config = ShaderLibraryConfig {
            include_paths: vec!["ShaderLibrary".to_string()],
        };
        let resolved = config.resolve().unwrap();
        assert!(resolved[0].is_absolute());
        assert!(resolved[0].ends_with("ShaderLibrary"));
    }
}

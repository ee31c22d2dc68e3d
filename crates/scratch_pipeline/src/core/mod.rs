//! # Core Module
//!
//! Shared configuration used by every other subsystem. The loadable
//! configuration types live in [`config`]; the generic file loading trait
//! lives in [`crate::config`].

pub mod config;

// Re-export commonly used config types
pub use config::{
    Config,
    ConfigError,
    PipelineAsset,
    RendererConfig,
    ShaderLibraryConfig,
};

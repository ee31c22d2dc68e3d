//! Configuration files
//!
//! Renderer settings and pipeline assets are plain serde types. Implementing
//! [`Config`] lets them round-trip through a file whose extension picks the
//! format: `.toml` or `.ron`. Fields missing from a file fall back to the
//! type's `Default` when the type opts in with `#[serde(default)]`.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

/// On-disk format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format for `path`, or [`ConfigError::UnsupportedFormat`]
    pub fn from_path(path: &str) -> Result<Self, ConfigError> {
        match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.to_string())),
        }
    }
}

/// A settings type stored in a TOML or RON file
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read and parse `path`.
    ///
    /// The extension is checked before the file is opened, so an unsupported
    /// path never touches the disk.
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        match format {
            ConfigFormat::Toml => Self::from_toml_str(&contents),
            ConfigFormat::Ron => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Parse TOML text
    fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Write `self` to `path`, replacing any existing file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Why a configuration could not be loaded, saved or accepted
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The text is not valid for the target type
    #[error("Parse error: {0}")]
    Parse(String),

    /// The value could not be written in the chosen format
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// The path has neither a `.toml` nor a `.ron` extension
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Configuration parsed but holds invalid values
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Sample {
        name: String,
        samples: u32,
    }

    impl Default for Sample {
        fn default() -> Self {
            Self {
                name: "default".to_string(),
                samples: 4,
            }
        }
    }

    impl Config for Sample {}

    fn temp_path(file: &str) -> String {
        let dir = std::env::temp_dir().join(format!("scratch_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(file).to_string_lossy().into_owned()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path("renderer.toml").unwrap(), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("assets/Lit.ron").unwrap(), ConfigFormat::Ron);
        assert!(matches!(
            ConfigFormat::from_path("renderer.json"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        assert!(ConfigFormat::from_path("toml").is_err());
    }

    #[test]
    fn test_ron_file_is_written_and_read_back() {
        let path = temp_path("sample.ron");
        let sample = Sample {
            name: "ron".to_string(),
            samples: 8,
        };
        sample.save_to_file(&path).unwrap();
        assert_eq!(Sample::load_from_file(&path).unwrap(), sample);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_unsupported_path_fails_before_reading() {
        let err = Sample::load_from_file("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ref path) if path == "does/not/exist.yaml"));
        assert!(matches!(
            Sample::default().save_to_file("sample.ini"),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Sample::load_from_file(&temp_path("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        assert!(matches!(Sample::from_toml_str("samples = \"many\""), Err(ConfigError::Parse(_))));
        assert_eq!(Sample::from_toml_str("samples = 2").unwrap().name, "default");
    }
}

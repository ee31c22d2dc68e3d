//! Render target descriptions
//!
//! Temporary targets are requested by [`PropertyId`] with a [`TargetDesc`]
//! and live for one camera's frame. The camera's own output surface is
//! addressed with [`TargetId::CameraTarget`].

use crate::render::properties::PropertyId;

/// Pixel format of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// 8 bits per channel RGBA
    Argb32,
    /// 10 bits per color channel, 2 bits alpha
    Argb2101010,
    /// 16-bit float per channel RGBA
    ArgbHalf,
    /// Depth (and optionally stencil) only
    Depth,
}

impl TextureFormat {
    /// Bytes per pixel of the color payload
    pub fn bytes_per_pixel(self) -> u64 {
        match self {
            Self::Argb32 | Self::Argb2101010 => 4,
            Self::ArgbHalf => 8,
            Self::Depth => 0,
        }
    }
}

/// Sampling filter for a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterMode {
    /// Nearest-neighbour
    Point,
    /// Linear
    Bilinear,
}

/// Description of a temporary render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Depth buffer bits (0, 16, 24 or 32)
    pub depth_bits: u32,
    /// Sampling filter
    pub filter: FilterMode,
    /// Pixel format
    pub format: TextureFormat,
}

impl TargetDesc {
    /// Color target without depth
    pub fn color(width: u32, height: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            depth_bits: 0,
            filter: FilterMode::Point,
            format,
        }
    }

    /// Depth-only target
    pub fn depth(width: u32, height: u32, depth_bits: u32) -> Self {
        Self {
            width,
            height,
            depth_bits,
            filter: FilterMode::Point,
            format: TextureFormat::Depth,
        }
    }

    /// Approximate memory footprint in bytes
    pub fn size_in_bytes(&self) -> u64 {
        let pixels = u64::from(self.width) * u64::from(self.height);
        pixels * (self.format.bytes_per_pixel() + u64::from(self.depth_bits) / 8)
    }

    /// Check the description can be allocated
    pub fn validate(&self) -> Result<(), String> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("{}x{} target has no area", self.width, self.height));
        }
        if !matches!(self.depth_bits, 0 | 16 | 24 | 32) {
            return Err(format!("unsupported depth bits {}", self.depth_bits));
        }
        if self.format == TextureFormat::Depth && self.depth_bits == 0 {
            return Err("depth format requires depth bits".to_string());
        }
        Ok(())
    }
}

/// Identifies a render target in recorded commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetId {
    /// The current camera's output surface
    CameraTarget,
    /// A temporary target acquired under this property name
    Temporary(PropertyId),
}

impl From<PropertyId> for TargetId {
    fn from(id: PropertyId) -> Self {
        Self::Temporary(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_includes_depth() {
        assert_eq!(TargetDesc::color(4, 4, TextureFormat::Argb32).size_in_bytes(), 64);
        assert_eq!(TargetDesc::depth(4, 4, 24).size_in_bytes(), 48);
    }

    #[test]
    fn test_validate_rejects_bad_descs() {
        assert!(TargetDesc::color(0, 4, TextureFormat::Argb32).validate().is_err());
        assert!(TargetDesc::depth(4, 4, 0).validate().is_err());
        assert!(TargetDesc::depth(4, 4, 12).validate().is_err());
        assert!(TargetDesc::depth(4, 4, 24).validate().is_ok());
    }
}

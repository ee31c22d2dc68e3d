//! Light sources
//!
//! Lights are described by a kind, a world transform, a color and a range.
//! Directional lights only use the transform's orientation; point lights
//! only use its position together with the range. Spot and area lights
//! exist in scenes but the packed light buffer has no encoding for them.

use crate::foundation::math::{Color, Mat4, Transform, Vec3};

/// Light types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LightType {
    /// Directional light (like sunlight)
    Directional,
    /// Point light (like a lightbulb)
    Point,
    /// Spot light (like a flashlight)
    Spot,
    /// Rectangular area light
    Area,
}

/// Light source
#[derive(Debug, Clone)]
pub struct Light {
    /// Light type
    pub light_type: LightType,
    /// World transform. Directional lights shine along its local -Z axis.
    pub transform: Transform,
    /// Light color
    pub color: Color,
    /// Light intensity
    pub intensity: f32,
    /// Light range (for point/spot/area lights)
    pub range: f32,
    /// Disabled lights are never visible
    pub enabled: bool,
}

impl Light {
    /// Create a directional light shining along `direction`
    pub fn directional(direction: Vec3, color: Color, intensity: f32) -> Self {
        Self {
            light_type: LightType::Directional,
            transform: Transform::facing(direction),
            color,
            intensity,
            range: 0.0,
            enabled: true,
        }
    }

    /// Create a point light
    pub fn point(position: Vec3, color: Color, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Point,
            transform: Transform::from_position(position),
            color,
            intensity,
            range,
            enabled: true,
        }
    }

    /// Create a spot light
    pub fn spot(position: Vec3, direction: Vec3, color: Color, intensity: f32, range: f32) -> Self {
        let mut transform = Transform::facing(direction);
        transform.position = position;
        Self {
            light_type: LightType::Spot,
            transform,
            color,
            intensity,
            range,
            enabled: true,
        }
    }

    /// Create an area light
    pub fn area(position: Vec3, color: Color, intensity: f32, range: f32) -> Self {
        Self {
            light_type: LightType::Area,
            transform: Transform::from_position(position),
            color,
            intensity,
            range,
            enabled: true,
        }
    }

    /// Disable or enable the light
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Local-to-world matrix
    pub fn local_to_world(&self) -> Mat4 {
        self.transform.to_matrix()
    }

    /// Color premultiplied by intensity
    pub fn final_color(&self) -> Color {
        self.color.scaled(self.intensity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::LOCAL_BACK;
    use approx::assert_relative_eq;

    #[test]
    fn test_directional_light_points_along_direction() {
        let dir = Vec3::new(-0.3, -1.0, -0.5).normalize();
        let light = Light::directional(dir, Color::WHITE, 1.0);
        let world_dir = light.local_to_world().transform_vector(&LOCAL_BACK);
        assert_relative_eq!(world_dir, dir, epsilon = 1e-5);
    }

    #[test]
    fn test_final_color_scales_by_intensity() {
        let light = Light::point(Vec3::zeros(), Color::rgb(1.0, 0.5, 0.0), 2.0, 5.0);
        assert_eq!(light.final_color(), Color::rgb(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_spot_light_keeps_position() {
        let light = Light::spot(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(0.0, -1.0, 0.0),
            Color::WHITE,
            1.0,
            4.0,
        );
        assert_eq!(light.transform.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(light.light_type, LightType::Spot);
    }
}

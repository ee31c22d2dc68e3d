//! # Camera
//!
//! Cameras are read-only frame inputs: a viewport size, view and projection
//! matrices, and the surface the final image is written to.
//!
//! ## Coordinate System
//! Right-handed, Y-up world space. Projection matrices follow the OpenGL
//! clip-space convention (`-w <= z <= w`), which is what the frustum plane
//! extraction in [`Frustum::from_matrix`](super::Frustum::from_matrix) expects.

use crate::foundation::math::{utils, Mat4, Point3, Vec3};

/// Surface a camera renders into
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CameraTarget {
    /// A display swapchain, by index
    Display(u32),
    /// A named offscreen texture owned by the host
    Offscreen(String),
}

/// 3D perspective camera
#[derive(Debug, Clone)]
pub struct Camera {
    /// Camera name, used for logs and frame reports
    pub name: String,
    /// Viewport width in pixels
    pub pixel_width: u32,
    /// Viewport height in pixels
    pub pixel_height: u32,
    /// World-to-view transform
    pub view: Mat4,
    /// View-to-clip transform
    pub projection: Mat4,
    /// Final output surface
    pub target: CameraTarget,
}

impl Camera {
    /// Create a perspective camera at the origin looking down -Z
    ///
    /// # Arguments
    /// * `name` - Camera name
    /// * `pixel_width`, `pixel_height` - Viewport size
    /// * `fov_degrees` - Vertical field of view in degrees
    /// * `near`, `far` - Clipping plane distances
    ///
    /// Degenerate parameters (an empty viewport, `near >= far`, a field of
    /// view outside `(0, 180)`) never panic. The viewport falls back to a
    /// square aspect and a bad frustum leaves a zero projection, which
    /// [`Camera::validate`] rejects.
    pub fn perspective(
        name: impl Into<String>,
        pixel_width: u32,
        pixel_height: u32,
        fov_degrees: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let aspect = if pixel_width == 0 || pixel_height == 0 {
            1.0
        } else {
            pixel_width as f32 / pixel_height as f32
        };
        let frustum_ok = near > 0.0 && far > near && fov_degrees > 0.0 && fov_degrees < 180.0;
        let projection = if frustum_ok {
            Mat4::new_perspective(aspect, utils::deg_to_rad(fov_degrees), near, far)
        } else {
            Mat4::zeros()
        };
        Self {
            name: name.into(),
            pixel_width,
            pixel_height,
            view: Mat4::identity(),
            projection,
            target: CameraTarget::Display(0),
        }
    }

    /// Place the camera at `eye` looking at `target`
    pub fn looking_at(mut self, eye: Vec3, target: Vec3, up: Vec3) -> Self {
        self.view = Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up);
        self
    }

    /// Render into a different surface
    pub fn with_target(mut self, target: CameraTarget) -> Self {
        self.target = target;
        self
    }

    /// Combined view-projection matrix
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Camera position in world space, if the view matrix is invertible
    pub fn position(&self) -> Option<Vec3> {
        self.view
            .try_inverse()
            .map(|inv| Vec3::new(inv[(0, 3)], inv[(1, 3)], inv[(2, 3)]))
    }

    /// Check the camera can be culled and rendered.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.pixel_width == 0 || self.pixel_height == 0 {
            return Err(format!(
                "viewport {}x{} has no area",
                self.pixel_width, self.pixel_height
            ));
        }
        if !utils::is_finite_matrix(&self.view) || !utils::is_finite_matrix(&self.projection) {
            return Err("view or projection matrix is not finite".to_string());
        }
        if self.view.try_inverse().is_none() {
            return Err("view matrix is singular".to_string());
        }
        if self.projection.try_inverse().is_none() {
            return Err("projection matrix is singular".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_looking_at_recovers_position() {
        let camera = Camera::perspective("main", 800, 600, 60.0, 0.1, 100.0)
            .looking_at(Vec3::new(0.0, 2.0, 5.0), Vec3::zeros(), Vec3::y());
        let position = camera.position().unwrap();
        assert_relative_eq!(position, Vec3::new(0.0, 2.0, 5.0), epsilon = 1e-4);
    }

    #[test]
    fn test_zero_viewport_is_invalid() {
        let camera = Camera::perspective("empty", 0, 600, 60.0, 0.1, 100.0);
        assert!(camera.validate().is_err());
    }

    #[test]
    fn test_zero_width_viewport_builds_and_is_invalid() {
        let camera = Camera::perspective("empty", 0, 240, 60.0, 0.1, 100.0);
        assert!(camera.validate().unwrap_err().contains("no area"));
    }

    #[test]
    fn test_degenerate_clip_planes_are_invalid() {
        let flat = Camera::perspective("flat", 800, 600, 60.0, 1.0, 1.0);
        assert_eq!(flat.validate().unwrap_err(), "projection matrix is singular");

        let inverted = Camera::perspective("inverted", 800, 600, 60.0, 10.0, 1.0);
        assert!(inverted.validate().is_err());

        let no_fov = Camera::perspective("no fov", 800, 600, 0.0, 0.1, 100.0);
        assert!(no_fov.validate().is_err());
    }

    #[test]
    fn test_non_finite_projection_is_invalid() {
        let mut camera = Camera::perspective("broken", 800, 600, 60.0, 0.1, 100.0);
        camera.projection[(0, 0)] = f32::NAN;
        assert!(camera.validate().is_err());
    }

    #[test]
    fn test_default_target_is_primary_display() {
        let camera = Camera::perspective("main", 800, 600, 60.0, 0.1, 100.0);
        assert_eq!(camera.target, CameraTarget::Display(0));
        assert!(camera.validate().is_ok());
    }
}

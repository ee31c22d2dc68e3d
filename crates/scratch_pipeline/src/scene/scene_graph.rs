//! Spatial primitives used for visibility queries
//!
//! Bounding spheres and a six-plane view frustum extracted from a
//! view-projection matrix.

use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};

/// Sphere bounding volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center
    pub center: Vec3,
    /// Sphere radius
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a new bounding sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Transform the sphere by a world matrix, scaling the radius by `max_scale`
    pub fn transformed(&self, world: &Mat4, max_scale: f32) -> Self {
        Self {
            center: world.transform_point(&Point3::from(self.center)).coords,
            radius: self.radius * max_scale,
        }
    }
}

/// Plane defined by normal and distance from origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector (normalized)
    pub normal: Vec3,
    /// Distance from origin along the normal
    pub distance: f32,
}

impl Plane {
    /// Create a plane from `ax + by + cz + d = 0` coefficients, normalizing them.
    ///
    /// Returns `None` for a degenerate (zero-normal) plane.
    pub fn from_coefficients(coefficients: Vec4) -> Option<Self> {
        let normal = coefficients.xyz();
        let length = normal.norm();
        if length <= f32::EPSILON || !length.is_finite() {
            return None;
        }
        Some(Self {
            normal: normal / length,
            distance: coefficients.w / length,
        })
    }

    /// Calculate signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// Frustum for visibility culling
#[derive(Debug, Clone)]
pub struct Frustum {
    /// Six planes (left, right, bottom, top, near, far), normals pointing inward
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix
    ///
    /// Uses the Gribb-Hartmann method for OpenGL-style clip space
    /// (`-w <= x, y, z <= w`). Returns `None` if any plane is degenerate.
    pub fn from_matrix(vp: &Mat4) -> Option<Self> {
        let row = |i: usize| Vec4::new(vp[(i, 0)], vp[(i, 1)], vp[(i, 2)], vp[(i, 3)]);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Some(Self {
            planes: [
                Plane::from_coefficients(r3 + r0)?,
                Plane::from_coefficients(r3 - r0)?,
                Plane::from_coefficients(r3 + r1)?,
                Plane::from_coefficients(r3 - r1)?,
                Plane::from_coefficients(r3 + r2)?,
                Plane::from_coefficients(r3 - r2)?,
            ],
        })
    }

    /// Check if a sphere is inside or intersects the frustum
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(sphere.center) >= -sphere.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::utils;

    fn test_frustum() -> Frustum {
        let projection = Mat4::new_perspective(1.0, utils::deg_to_rad(90.0), 0.1, 100.0);
        let view = Mat4::look_at_rh(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(0.0, 0.0, -1.0),
            &Vec3::y(),
        );
        Frustum::from_matrix(&(projection * view)).unwrap()
    }

    #[test]
    fn test_sphere_in_front_is_visible() {
        let frustum = test_frustum();
        assert!(frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 1.0)));
    }

    #[test]
    fn test_sphere_behind_is_culled() {
        let frustum = test_frustum();
        assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, 10.0), 1.0)));
    }

    #[test]
    fn test_sphere_beyond_far_plane_is_culled() {
        let frustum = test_frustum();
        assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(0.0, 0.0, -200.0), 1.0)));
    }

    #[test]
    fn test_sphere_straddling_side_plane_is_visible() {
        let frustum = test_frustum();
        // 90 degree fov: the side plane at z = -10 sits at x = 10
        assert!(frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(10.5, 0.0, -10.0), 1.0)));
        assert!(!frustum.intersects_sphere(&BoundingSphere::new(Vec3::new(13.0, 0.0, -10.0), 1.0)));
    }

    #[test]
    fn test_degenerate_matrix_has_no_frustum() {
        assert!(Frustum::from_matrix(&Mat4::zeros()).is_none());
    }

    #[test]
    fn test_transformed_sphere_scales_radius() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 1.0);
        let moved = sphere.transformed(&Mat4::new_translation(&Vec3::new(1.0, 0.0, 0.0)), 2.0);
        assert_eq!(moved.center, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(moved.radius, 2.0);
    }
}

//! Renderable object representation for the scene
//!
//! A renderable is a world transform, a local bounding sphere and a
//! material. The material decides which render queue the object lives in and
//! which shader passes can draw it.

use crate::foundation::collections::MaterialHandle;
use crate::foundation::math::Transform;
use crate::scene::scene_graph::BoundingSphere;

/// Renderable scene object
#[derive(Debug, Clone)]
pub struct RenderObject {
    /// Object name
    pub name: String,

    /// World transform
    pub transform: Transform,

    /// Bounds in local space
    pub local_bounds: BoundingSphere,

    /// Material to use for rendering
    pub material: MaterialHandle,

    /// Whether this object is visible
    pub visible: bool,
}

impl RenderObject {
    /// Create a new visible renderable object
    pub fn new(
        name: impl Into<String>,
        transform: Transform,
        local_bounds: BoundingSphere,
        material: MaterialHandle,
    ) -> Self {
        Self {
            name: name.into(),
            transform,
            local_bounds,
            material,
            visible: true,
        }
    }

    /// Bounds in world space
    pub fn world_bounds(&self) -> BoundingSphere {
        self.local_bounds
            .transformed(&self.transform.to_matrix(), self.transform.max_scale())
    }

    /// Check if this object should be considered for rendering
    pub fn should_render(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_world_bounds_follow_transform() {
        let mut transform = Transform::from_position(Vec3::new(0.0, 0.0, -5.0));
        transform.scale = Vec3::new(1.0, 3.0, 1.0);
        let object = RenderObject::new(
            "pillar",
            transform,
            BoundingSphere::new(Vec3::zeros(), 0.5),
            MaterialHandle::default(),
        );
        let bounds = object.world_bounds();
        assert_eq!(bounds.center, Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(bounds.radius, 1.5);
        assert!(object.should_render());
    }
}

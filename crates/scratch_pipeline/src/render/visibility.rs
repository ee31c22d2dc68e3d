//! # Visibility Resolver
//!
//! Culls a scene against one camera's frustum and fills a reusable
//! [`CullResults`]. Objects are kept when their world bounding sphere touches
//! the frustum. Directional lights are always visible; other lights are kept
//! when the sphere described by their position and range touches it.
//!
//! Visible lights keep scene insertion order. The light packer relies on this.

use crate::foundation::collections::MaterialHandle;
use crate::foundation::math::{Color, Mat4};
use crate::render::materials::MaterialLibrary;
use crate::render::{RenderError, RenderResult};
use crate::scene::{BoundingSphere, Camera, Frustum, LightType, Scene};

/// A renderer that survived culling
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRenderer {
    /// Index into [`Scene::objects`]
    pub object_index: usize,
    /// Material the object is drawn with
    pub material: MaterialHandle,
    /// Render queue of that material
    pub render_queue: i32,
    /// Distance from the camera to the bounds center
    pub distance: f32,
}

/// A light that survived culling
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleLight {
    /// Light kind
    pub light_type: LightType,
    /// Local-to-world matrix of the light
    pub local_to_world: Mat4,
    /// Range (unused for directional lights)
    pub range: f32,
    /// Color premultiplied by intensity
    pub final_color: Color,
    /// Index into [`Scene::lights`]
    pub source_index: usize,
}

/// Reusable output of a cull
#[derive(Debug, Default)]
pub struct CullResults {
    /// Visible renderers, in scene order
    pub visible_renderers: Vec<VisibleRenderer>,
    /// Visible lights, in scene order
    pub visible_lights: Vec<VisibleLight>,
}

impl CullResults {
    /// Create empty results
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop previous contents, keeping allocations
    pub fn clear(&mut self) {
        self.visible_renderers.clear();
        self.visible_lights.clear();
    }

    /// Check if nothing is visible
    pub fn is_empty(&self) -> bool {
        self.visible_renderers.is_empty() && self.visible_lights.is_empty()
    }
}

/// Frustum culler
#[derive(Debug, Default, Clone, Copy)]
pub struct VisibilityResolver;

impl VisibilityResolver {
    /// Create a resolver
    pub fn new() -> Self {
        Self
    }

    /// Cull `scene` for `camera` into `results`.
    ///
    /// `results` is cleared first. Fails with [`RenderError::CullingFailed`]
    /// when the camera cannot produce a usable frustum; the caller should skip
    /// the camera for this frame.
    pub fn cull(
        &self,
        camera: &Camera,
        scene: &Scene,
        materials: &MaterialLibrary,
        results: &mut CullResults,
    ) -> RenderResult<()> {
        results.clear();

        let culling_failed = |reason: String| RenderError::CullingFailed {
            camera: camera.name.clone(),
            reason,
        };
        camera.validate().map_err(culling_failed)?;
        let frustum = Frustum::from_matrix(&camera.view_projection())
            .ok_or_else(|| culling_failed("degenerate view frustum".to_string()))?;
        let eye = camera
            .position()
            .ok_or_else(|| culling_failed("view matrix is singular".to_string()))?;

        for (object_index, object) in scene.objects().iter().enumerate() {
            if !object.should_render() {
                continue;
            }
            let bounds = object.world_bounds();
            if !frustum.intersects_sphere(&bounds) {
                continue;
            }
            let Some(material) = materials.get(object.material) else {
                log::warn!(
                    "Object '{}' references a missing material, skipping",
                    object.name
                );
                continue;
            };
            results.visible_renderers.push(VisibleRenderer {
                object_index,
                material: object.material,
                render_queue: material.render_queue,
                distance: (bounds.center - eye).norm(),
            });
        }

        for (source_index, light) in scene.lights().iter().enumerate() {
            if !light.enabled {
                continue;
            }
            let visible = match light.light_type {
                LightType::Directional => true,
                LightType::Point | LightType::Spot | LightType::Area => frustum
                    .intersects_sphere(&BoundingSphere::new(light.transform.position, light.range)),
            };
            if visible {
                results.visible_lights.push(VisibleLight {
                    light_type: light.light_type,
                    local_to_world: light.local_to_world(),
                    range: light.range,
                    final_color: light.final_color(),
                    source_index,
                });
            }
        }

        log::trace!(
            "Culled '{}': {} renderers, {} lights visible",
            camera.name,
            results.visible_renderers.len(),
            results.visible_lights.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Transform, Vec3};
    use crate::render::materials::Material;
    use crate::scene::{Light, RenderObject};

    fn camera() -> Camera {
        Camera::perspective("main", 640, 480, 60.0, 0.1, 100.0).looking_at(
            Vec3::zeros(),
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::y(),
        )
    }

    fn object(materials: &mut MaterialLibrary, name: &str, z: f32) -> RenderObject {
        let material = materials.add(Material::opaque("Standard", &["Forward"]));
        RenderObject::new(
            name,
            Transform::from_position(Vec3::new(0.0, 0.0, z)),
            BoundingSphere::new(Vec3::zeros(), 1.0),
            material,
        )
    }

    #[test]
    fn test_objects_outside_frustum_are_culled() {
        let mut materials = MaterialLibrary::new();
        let scene = Scene::new()
            .with_object(object(&mut materials, "front", -10.0))
            .with_object(object(&mut materials, "behind", 10.0));
        let mut results = CullResults::new();

        VisibilityResolver::new()
            .cull(&camera(), &scene, &materials, &mut results)
            .unwrap();

        assert_eq!(results.visible_renderers.len(), 1);
        assert_eq!(results.visible_renderers[0].object_index, 0);
        assert!((results.visible_renderers[0].distance - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_lights_keep_scene_order() {
        let scene = Scene::new()
            .with_light(Light::point(Vec3::new(0.0, 0.0, -5.0), Color::RED, 1.0, 2.0))
            .with_light(Light::directional(Vec3::new(0.0, -1.0, 0.0), Color::WHITE, 1.0))
            .with_light(Light::point(Vec3::new(0.0, 0.0, 50.0), Color::WHITE, 1.0, 2.0))
            .with_light(Light::spot(
                Vec3::new(0.0, 1.0, -3.0),
                Vec3::new(0.0, -1.0, 0.0),
                Color::WHITE,
                1.0,
                5.0,
            ))
            .with_light(
                Light::point(Vec3::new(0.0, 0.0, -5.0), Color::WHITE, 1.0, 2.0).with_enabled(false),
            );
        let mut results = CullResults::new();

        VisibilityResolver::new()
            .cull(&camera(), &scene, &MaterialLibrary::new(), &mut results)
            .unwrap();

        let sources: Vec<_> = results.visible_lights.iter().map(|l| l.source_index).collect();
        assert_eq!(sources, [0, 1, 3]);
    }

    #[test]
    fn test_missing_material_is_skipped() {
        let mut materials = MaterialLibrary::new();
        let obj = object(&mut materials, "orphan", -5.0);
        materials.remove(obj.material);
        let scene = Scene::new().with_object(obj);
        let mut results = CullResults::new();

        VisibilityResolver::new()
            .cull(&camera(), &scene, &materials, &mut results)
            .unwrap();
        assert!(results.visible_renderers.is_empty());
    }

    #[test]
    fn test_invalid_camera_fails_and_clears_results() {
        let mut results = CullResults::new();
        results.visible_lights.push(VisibleLight {
            light_type: LightType::Point,
            local_to_world: Mat4::identity(),
            range: 1.0,
            final_color: Color::WHITE,
            source_index: 0,
        });
        let broken = Camera::perspective("broken", 0, 0, 60.0, 0.1, 100.0);

        let err = VisibilityResolver::new()
            .cull(&broken, &Scene::new(), &MaterialLibrary::new(), &mut results)
            .unwrap_err();

        assert!(matches!(err, RenderError::CullingFailed { ref camera, .. } if camera == "broken"));
        assert!(results.is_empty());
    }

    #[test]
    fn test_degenerate_cameras_fail_culling() {
        let cameras = [
            Camera::perspective("narrow", 0, 480, 60.0, 0.1, 100.0),
            Camera::perspective("flat", 640, 480, 60.0, 5.0, 5.0),
        ];
        let mut results = CullResults::new();
        for camera in &cameras {
            let err = VisibilityResolver::new()
                .cull(camera, &Scene::new(), &MaterialLibrary::new(), &mut results)
                .unwrap_err();
            assert!(matches!(err, RenderError::CullingFailed { .. }), "{}", camera.name);
        }
    }
}

//! Scene description
//!
//! The scene is the read-only input to a frame: renderable objects and
//! lights. Cameras are passed to the renderer separately so one scene can be
//! drawn from several viewpoints per frame.
//!
//! ## Architecture
//!
//! ```text
//! Scene (objects + lights)   Cameras
//!            ↓                  ↓
//!        Visibility Resolver (per camera)
//!            ↓
//!        Frame Render Pipeline
//! ```

mod camera;
mod light;
mod renderable_object;
mod scene_graph;

pub use camera::{Camera, CameraTarget};
pub use light::{Light, LightType};
pub use renderable_object::RenderObject;
pub use scene_graph::{BoundingSphere, Frustum, Plane};

/// Collection of renderable objects and lights
#[derive(Debug, Clone, Default)]
pub struct Scene {
    objects: Vec<RenderObject>,
    lights: Vec<Light>,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a renderable object, returning its index
    pub fn add_object(&mut self, object: RenderObject) -> usize {
        self.objects.push(object);
        self.objects.len() - 1
    }

    /// Add a light, returning its index
    pub fn add_light(&mut self, light: Light) -> usize {
        self.lights.push(light);
        self.lights.len() - 1
    }

    /// Builder-style [`Scene::add_object`]
    pub fn with_object(mut self, object: RenderObject) -> Self {
        self.add_object(object);
        self
    }

    /// Builder-style [`Scene::add_light`]
    pub fn with_light(mut self, light: Light) -> Self {
        self.add_light(light);
        self
    }

    /// All renderable objects, in insertion order
    pub fn objects(&self) -> &[RenderObject] {
        &self.objects
    }

    /// All lights, in insertion order
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// Mutable access to the lights
    pub fn lights_mut(&mut self) -> &mut [Light] {
        &mut self.lights
    }

    /// Get an object by index
    pub fn object(&self, index: usize) -> Option<&RenderObject> {
        self.objects.get(index)
    }

    /// Check if the scene has neither objects nor lights
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.lights.is_empty()
    }
}

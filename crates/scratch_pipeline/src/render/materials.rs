//! # Materials
//!
//! Materials decide which render queue an object is drawn in and which shader
//! passes can draw it. Full-screen materials used by blits (depth copy,
//! deferred composite) are ordinary library entries with no passes.

use crate::foundation::collections::{MaterialHandle, SlotMap};

/// Standard render queue values
pub mod render_queue {
    /// Drawn first (backgrounds)
    pub const BACKGROUND: i32 = 1000;
    /// Regular opaque geometry
    pub const GEOMETRY: i32 = 2000;
    /// Alpha-tested geometry
    pub const ALPHA_TEST: i32 = 2450;
    /// Last queue considered opaque
    pub const GEOMETRY_LAST: i32 = 2500;
    /// Alpha-blended geometry
    pub const TRANSPARENT: i32 = 3000;
    /// Overlays and full-screen effects
    pub const OVERLAY: i32 = 4000;
}

/// Material description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    /// Unique name
    pub name: String,
    /// Render queue value
    pub render_queue: i32,
    /// Shader pass tags this material provides
    pub passes: Vec<String>,
}

impl Material {
    /// Create a material with no passes
    pub fn new(name: impl Into<String>, render_queue: i32) -> Self {
        Self {
            name: name.into(),
            render_queue,
            passes: Vec::new(),
        }
    }

    /// Opaque geometry material providing `passes`
    pub fn opaque(name: impl Into<String>, passes: &[&str]) -> Self {
        Self::new(name, render_queue::GEOMETRY).with_passes(passes)
    }

    /// Transparent geometry material providing `passes`
    pub fn transparent(name: impl Into<String>, passes: &[&str]) -> Self {
        Self::new(name, render_queue::TRANSPARENT).with_passes(passes)
    }

    /// Full-screen material used by blits
    pub fn full_screen(name: impl Into<String>) -> Self {
        Self::new(name, render_queue::OVERLAY)
    }

    /// Add shader passes
    pub fn with_passes(mut self, passes: &[&str]) -> Self {
        self.passes.extend(passes.iter().map(|p| (*p).to_string()));
        self
    }

    /// Check if the material provides `pass`
    pub fn has_pass(&self, pass: &str) -> bool {
        self.passes.iter().any(|p| p == pass)
    }

    /// Check if the material is drawn in an opaque queue
    pub fn is_opaque(&self) -> bool {
        self.render_queue <= render_queue::GEOMETRY_LAST
    }
}

/// Slot-map backed material storage
///
/// Cloning keeps every handle valid in the copy.
#[derive(Debug, Clone, Default)]
pub struct MaterialLibrary {
    materials: SlotMap<MaterialHandle, Material>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Library with the materials the built-in pipelines expect:
    /// `Standard` (opaque, Forward + GBuffer), `Glass` (transparent, Forward),
    /// `CopyDepth` and `DeferredComposite` (full-screen).
    pub fn with_builtin_materials() -> Self {
        use crate::render::drawing::shader_pass;

        let mut library = Self::new();
        library.add(Material::opaque(
            "Standard",
            &[shader_pass::FORWARD, shader_pass::GBUFFER],
        ));
        library.add(Material::transparent("Glass", &[shader_pass::FORWARD]));
        library.add(Material::full_screen("CopyDepth"));
        library.add(Material::full_screen("DeferredComposite"));
        library
    }

    /// Register a material. A material with the same name is replaced.
    pub fn add(&mut self, material: Material) -> MaterialHandle {
        if let Some(existing) = self.find_by_name(&material.name) {
            log::debug!("Replacing material '{}'", material.name);
            self.materials[existing] = material;
            return existing;
        }
        self.materials.insert(material)
    }

    /// Look up a material
    pub fn get(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle)
    }

    /// Find a material by name
    pub fn find_by_name(&self, name: &str) -> Option<MaterialHandle> {
        self.materials
            .iter()
            .find(|(_, material)| material.name == name)
            .map(|(handle, _)| handle)
    }

    /// Remove a material
    pub fn remove(&mut self, handle: MaterialHandle) -> Option<Material> {
        self.materials.remove(handle)
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Check if the library is empty
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

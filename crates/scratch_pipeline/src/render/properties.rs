//! Global shader property registry
//!
//! Shader-visible globals and temporary targets are addressed by
//! [`PropertyId`] rather than by string. Names are interned into a single
//! process-wide table, so two pipeline stages that name the same property
//! always agree on its id.
//!
//! The ids used by the built-in pipelines are resolved once into
//! [`BuiltinProperties`] and looked up from there every frame.

use std::collections::HashMap;
use std::fmt;
use std::sync::{OnceLock, PoisonError, RwLock};

/// Interned shader property name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u32);

impl PropertyId {
    /// Raw slot index in the property table
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match property_name(*self) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "#{}", self.0),
        }
    }
}

/// Name → slot table
#[derive(Debug, Default)]
pub struct PropertyTable {
    ids: HashMap<String, PropertyId>,
    names: Vec<String>,
}

impl PropertyTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, assigning the next free slot if it is new
    pub fn intern(&mut self, name: &str) -> PropertyId {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = PropertyId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Look up an already interned name
    pub fn get(&self, name: &str) -> Option<PropertyId> {
        self.ids.get(name).copied()
    }

    /// Name for an id
    pub fn name(&self, id: PropertyId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Number of interned names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn global_table() -> &'static RwLock<PropertyTable> {
    static TABLE: OnceLock<RwLock<PropertyTable>> = OnceLock::new();
    TABLE.get_or_init(|| RwLock::new(PropertyTable::new()))
}

/// Resolve a property name to its process-wide id
pub fn property_to_id(name: &str) -> PropertyId {
    if let Some(id) = global_table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
    {
        return id;
    }
    global_table()
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .intern(name)
}

/// Name registered for a process-wide id
pub fn property_name(id: PropertyId) -> Option<String> {
    global_table()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .name(id)
        .map(str::to_string)
}

/// Property ids used by the built-in pipelines
#[derive(Debug, Clone, Copy)]
pub struct BuiltinProperties {
    /// `_LightBuffer`: packed visible lights
    pub light_buffer: PropertyId,
    /// `_LightCount`: number of packed lights
    pub light_count: PropertyId,
    /// `_GBuffer0`: albedo
    pub gbuffer0: PropertyId,
    /// `_GBuffer1`: normals
    pub gbuffer1: PropertyId,
    /// `_ColorRT`: intermediate scene color
    pub color: PropertyId,
    /// `_CameraDepthTexture`: scene depth
    pub camera_depth: PropertyId,
}

impl BuiltinProperties {
    /// The shared set, resolved on first use
    pub fn get() -> &'static Self {
        static BUILTINS: OnceLock<BuiltinProperties> = OnceLock::new();
        BUILTINS.get_or_init(|| Self {
            light_buffer: property_to_id("_LightBuffer"),
            light_count: property_to_id("_LightCount"),
            gbuffer0: property_to_id("_GBuffer0"),
            gbuffer1: property_to_id("_GBuffer1"),
            color: property_to_id("_ColorRT"),
            camera_depth: property_to_id("_CameraDepthTexture"),
        })
    }
}

//! # Light Packing
//!
//! Visible lights are serialized into a fixed-capacity GPU buffer of
//! [`PackedLight`] entries, two `float4`s each:
//!
//! | kind        | slot 0 xyz          | slot 0 w   | slot 1      |
//! |-------------|---------------------|------------|-------------|
//! | directional | world direction     | `-1`       | final color |
//! | point       | world position      | range      | final color |
//!
//! Spot and area lights have no encoding and are skipped without taking a
//! slot. Writes are compacted, so `_LightCount` is always the number of
//! entries actually written and the packed entries are contiguous.
//!
//! At most `capacity` entries are written. Packable lights past that point
//! are dropped.

// The Pod/Zeroable derives expand to unsafe impls
#![allow(unsafe_code)]

use bytemuck::{Pod, Zeroable};

use crate::foundation::collections::BufferHandle;
use crate::foundation::math::{Vec4, LOCAL_BACK};
use crate::render::backend::RenderBackend;
use crate::render::context::RenderContext;
use crate::render::properties::BuiltinProperties;
use crate::render::visibility::{CullResults, VisibleLight};
use crate::render::{RenderError, RenderResult};
use crate::scene::LightType;

/// Light buffer capacity used by the built-in pipelines
pub const MAX_VISIBLE_LIGHTS: usize = 64;

/// Value stored in slot 0 w to mark a directional light
pub const DIRECTIONAL_LIGHT_SENTINEL: f32 = -1.0;

/// GPU layout of one packed light
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PackedLight {
    /// Direction or position in xyz, sentinel or range in w
    pub position_or_direction: [f32; 4],
    /// Final color
    pub color: [f32; 4],
}

impl PackedLight {
    /// Size of one entry in bytes
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    /// Pack a visible light, or `None` for kinds with no encoding
    pub fn from_visible(light: &VisibleLight) -> Option<Self> {
        let slot0 = match light.light_type {
            LightType::Directional => {
                let direction = light.local_to_world.transform_vector(&LOCAL_BACK);
                Vec4::new(direction.x, direction.y, direction.z, DIRECTIONAL_LIGHT_SENTINEL)
            }
            LightType::Point => {
                let position = light.local_to_world.column(3);
                Vec4::new(position[0], position[1], position[2], light.range)
            }
            LightType::Spot | LightType::Area => return None,
        };
        Some(Self {
            position_or_direction: [slot0.x, slot0.y, slot0.z, slot0.w],
            color: light.final_color.to_array(),
        })
    }

    /// Check the directional sentinel
    pub fn is_directional(&self) -> bool {
        self.position_or_direction[3] == DIRECTIONAL_LIGHT_SENTINEL
    }
}

/// Packs visible lights into reusable CPU-side storage
#[derive(Debug)]
pub struct LightPacker {
    capacity: usize,
    entries: Vec<PackedLight>,
}

impl LightPacker {
    /// Create a packer for at most `capacity` lights
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Maximum number of packed entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pack `lights` in order, returning the number of entries written
    pub fn pack(&mut self, lights: &[VisibleLight]) -> usize {
        self.entries.clear();

        let mut dropped = 0;
        for light in lights {
            let Some(packed) = PackedLight::from_visible(light) else {
                log::trace!(
                    "Skipping {:?} light {} with no packed encoding",
                    light.light_type,
                    light.source_index
                );
                continue;
            };
            if self.entries.len() == self.capacity {
                dropped += 1;
                continue;
            }
            self.entries.push(packed);
        }

        if dropped > 0 {
            log::debug!(
                "Light buffer capacity {} reached, dropping {} packable lights",
                self.capacity,
                dropped
            );
        }
        self.entries.len()
    }

    /// Entries written by the last [`LightPacker::pack`]
    pub fn entries(&self) -> &[PackedLight] {
        &self.entries
    }

    /// Number of entries written by the last [`LightPacker::pack`]
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Packed entries as raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.entries)
    }
}

/// Persistent light buffer owned by a pipeline
///
/// Created once with the pipeline and released once when it is disposed.
#[derive(Debug)]
pub struct LightBuffer {
    handle: Option<BufferHandle>,
    packer: LightPacker,
}

impl LightBuffer {
    /// Allocate a GPU buffer for `capacity` packed lights
    pub fn create(backend: &mut dyn RenderBackend, capacity: usize) -> RenderResult<Self> {
        let handle = backend
            .create_buffer("_LightBuffer", capacity, PackedLight::STRIDE)
            .map_err(|e| {
                RenderError::ResourceCreationFailed(format!("light buffer ({} lights): {}", capacity, e))
            })?;
        log::debug!(
            "Created light buffer for {} lights ({} bytes)",
            capacity,
            capacity * PackedLight::STRIDE
        );
        Ok(Self {
            handle: Some(handle),
            packer: LightPacker::new(capacity),
        })
    }

    /// Buffer handle, while the buffer is alive
    pub fn handle(&self) -> Option<BufferHandle> {
        self.handle
    }

    /// Capacity in lights
    pub fn capacity(&self) -> usize {
        self.packer.capacity()
    }

    /// Last packed entries
    pub fn entries(&self) -> &[PackedLight] {
        self.packer.entries()
    }

    /// Pack `lights` and write them to the GPU buffer
    pub fn upload(&mut self, ctx: &mut RenderContext<'_>, lights: &[VisibleLight]) -> RenderResult<usize> {
        let handle = self.handle.ok_or_else(|| {
            RenderError::ResourceCreationFailed("light buffer used after release".to_string())
        })?;
        let count = self.packer.pack(lights);
        ctx.write_light_buffer(handle, self.packer.as_bytes())?;
        Ok(count)
    }

    /// Destroy the GPU buffer. Returns `false` if it was already released.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        if let Err(e) = backend.destroy_buffer(handle) {
            log::warn!("Failed to destroy light buffer: {}", e);
        }
        true
    }
}

/// Record the "Set-up Light Buffer" pass: pack visible lights, upload them,
/// and publish `_LightBuffer` / `_LightCount`. Returns the packed count.
pub fn setup_light_buffer(
    ctx: &mut RenderContext<'_>,
    light_buffer: &mut LightBuffer,
    cull: &CullResults,
) -> RenderResult<usize> {
    let count = light_buffer.upload(ctx, &cull.visible_lights)?;
    let handle = light_buffer.handle().ok_or_else(|| {
        RenderError::ResourceCreationFailed("light buffer used after release".to_string())
    })?;
    let properties = BuiltinProperties::get();
    let light_count = i32::try_from(count).unwrap_or(i32::MAX);

    ctx.record("Set-up Light Buffer", |cmd| {
        cmd.set_global_buffer(properties.light_buffer, handle);
        cmd.set_global_int(properties.light_count, light_count);
    })?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Color, Mat4, Vec3};
    use crate::scene::Light;
    use approx::assert_relative_eq;

    fn visible(light: &Light, source_index: usize) -> VisibleLight {
        VisibleLight {
            light_type: light.light_type,
            local_to_world: light.local_to_world(),
            range: light.range,
            final_color: light.final_color(),
            source_index,
        }
    }

    #[test]
    fn test_directional_and_point_scenario() {
        let lights = [
            visible(&Light::directional(Vec3::new(0.0, 0.0, -1.0), Color::WHITE, 1.0), 0),
            visible(&Light::point(Vec3::new(1.0, 2.0, 3.0), Color::RED, 1.0, 10.0), 1),
        ];
        let mut packer = LightPacker::new(MAX_VISIBLE_LIGHTS);

        assert_eq!(packer.pack(&lights), 2);
        let entries = packer.entries();
        assert_relative_eq!(
            Vec4::from(entries[0].position_or_direction),
            Vec4::new(0.0, 0.0, -1.0, -1.0),
            epsilon = 1e-6
        );
        assert_eq!(entries[0].color, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(entries[1].position_or_direction, [1.0, 2.0, 3.0, 10.0]);
        assert_eq!(entries[1].color, [1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_sentinel_identifies_kind() {
        let lights: Vec<_> = (0..10)
            .map(|i| {
                let light = if i % 3 == 0 {
                    Light::directional(Vec3::new(0.0, -1.0, 0.0), Color::WHITE, 1.0)
                } else {
                    Light::point(Vec3::new(i as f32, 0.0, 0.0), Color::WHITE, 1.0, 5.0)
                };
                visible(&light, i)
            })
            .collect();
        let mut packer = LightPacker::new(MAX_VISIBLE_LIGHTS);

        assert_eq!(packer.pack(&lights), lights.len());
        for (light, entry) in lights.iter().zip(packer.entries()) {
            assert_eq!(entry.is_directional(), light.light_type == LightType::Directional);
        }
    }

    #[test]
    fn test_overflow_keeps_first_capacity_lights() {
        let lights: Vec<_> = (0..MAX_VISIBLE_LIGHTS + 10)
            .map(|i| visible(&Light::point(Vec3::new(i as f32, 0.0, 0.0), Color::WHITE, 1.0, 1.0), i))
            .collect();
        let mut packer = LightPacker::new(MAX_VISIBLE_LIGHTS);

        assert_eq!(packer.pack(&lights), MAX_VISIBLE_LIGHTS);
        for (i, entry) in packer.entries().iter().enumerate() {
            assert_eq!(entry.position_or_direction[0], i as f32);
        }
    }

    #[test]
    fn test_unsupported_kinds_are_compacted_out() {
        let lights = [
            visible(&Light::spot(Vec3::zeros(), Vec3::new(0.0, -1.0, 0.0), Color::WHITE, 1.0, 4.0), 0),
            visible(&Light::point(Vec3::new(4.0, 0.0, 0.0), Color::RED, 1.0, 2.0), 1),
            visible(&Light::area(Vec3::zeros(), Color::WHITE, 1.0, 4.0), 2),
            visible(&Light::point(Vec3::new(5.0, 0.0, 0.0), Color::WHITE, 1.0, 3.0), 3),
        ];
        let mut packer = LightPacker::new(MAX_VISIBLE_LIGHTS);

        assert_eq!(packer.pack(&lights), 2);
        assert_eq!(packer.entries()[0].position_or_direction, [4.0, 0.0, 0.0, 2.0]);
        assert_eq!(packer.entries()[1].position_or_direction, [5.0, 0.0, 0.0, 3.0]);
        assert_eq!(packer.as_bytes().len(), 2 * PackedLight::STRIDE);
    }

    #[test]
    fn test_unsupported_kinds_do_not_use_capacity() {
        let spot = Light::spot(Vec3::zeros(), Vec3::new(0.0, -1.0, 0.0), Color::WHITE, 1.0, 4.0);
        let mut lights: Vec<_> = (0..5).map(|i| visible(&spot, i)).collect();
        lights.extend((0..60).map(|i| {
            visible(&Light::point(Vec3::new(i as f32, 0.0, 0.0), Color::WHITE, 1.0, 1.0), 5 + i)
        }));
        let mut packer = LightPacker::new(MAX_VISIBLE_LIGHTS);

        assert_eq!(packer.pack(&lights), 60);
        assert_eq!(packer.entries()[59].position_or_direction[0], 59.0);
    }

    #[test]
    fn test_overflow_after_unsupported_kinds_fills_capacity() {
        let mut packer = LightPacker::new(4);
        let area = visible(&Light::area(Vec3::zeros(), Color::WHITE, 1.0, 4.0), 0);
        let mut lights = vec![area.clone(), area];
        lights.extend((0..6).map(|i| {
            visible(&Light::point(Vec3::new(i as f32, 0.0, 0.0), Color::WHITE, 1.0, 1.0), 2 + i)
        }));

        assert_eq!(packer.pack(&lights), 4);
        let xs: Vec<f32> = packer.entries().iter().map(|e| e.position_or_direction[0]).collect();
        assert_eq!(xs, [0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_repack_forgets_previous_frame() {
        let mut packer = LightPacker::new(4);
        let point = visible(&Light::point(Vec3::zeros(), Color::WHITE, 1.0, 1.0), 0);
        packer.pack(&[point.clone(), point]);
        assert_eq!(packer.pack(&[]), 0);
        assert!(packer.entries().is_empty());
    }

    #[test]
    fn test_stride_is_two_float4() {
        assert_eq!(PackedLight::STRIDE, 32);
    }

    #[test]
    fn test_point_position_comes_from_translation() {
        let light = VisibleLight {
            light_type: LightType::Point,
            local_to_world: Mat4::new_translation(&Vec3::new(-2.0, 0.5, 7.0)),
            range: 6.0,
            final_color: Color::WHITE,
            source_index: 0,
        };
        let packed = PackedLight::from_visible(&light).unwrap();
        assert_eq!(packed.position_or_direction, [-2.0, 0.5, 7.0, 6.0]);
    }
}

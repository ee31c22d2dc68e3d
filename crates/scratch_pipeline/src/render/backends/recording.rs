//! # Recording Backend
//!
//! A headless [`RenderBackend`] that validates every command stream and keeps
//! a copy of it. Used by tests and the demo in place of a GPU.
//!
//! ## Behavior
//!
//! - Released surfaces go back to a pool and are reused for matching
//!   descriptions before new memory is taken.
//! - An optional memory budget covers buffers and surfaces. Pooled surfaces
//!   are evicted before an allocation is refused.
//! - Allocation failures can be injected per target name, and the next
//!   submission can be forced to fail.
//! - Allocations and releases are counted per target name.
//!
//! ## Submission validation
//!
//! A stream is rejected when a command refers to a temporary target that is
//! not bound, a target is released twice, or a clear or draw happens before
//! any render target was bound.

use std::collections::{HashMap, HashSet};

use crate::foundation::collections::{BufferHandle, SlotMap, SurfaceHandle};
use crate::render::backend::{BackendError, BackendResult, RenderBackend};
use crate::render::commands::Command;
use crate::render::properties::{property_to_id, PropertyId};
use crate::render::targets::{TargetDesc, TargetId};

#[derive(Debug)]
struct BufferRecord {
    label: String,
    data: Vec<u8>,
}

#[derive(Debug)]
struct Surface {
    desc: TargetDesc,
}

/// One accepted command stream
#[derive(Debug, Clone)]
pub struct Submission {
    /// Camera the stream was recorded for
    pub camera: String,
    /// Commands in execution order
    pub commands: Vec<Command>,
}

impl Submission {
    /// Command labels in order
    pub fn labels(&self) -> Vec<&'static str> {
        self.commands.iter().map(Command::label).collect()
    }

    /// Position of the first command matching `predicate`
    pub fn position(&self, predicate: impl Fn(&Command) -> bool) -> Option<usize> {
        self.commands.iter().position(predicate)
    }
}

/// Headless backend that records submissions
#[derive(Debug, Default)]
pub struct RecordingBackend {
    buffers: SlotMap<BufferHandle, BufferRecord>,
    surfaces: SlotMap<SurfaceHandle, Surface>,
    free_surfaces: Vec<SurfaceHandle>,
    bindings: HashMap<PropertyId, SurfaceHandle>,

    memory_budget: Option<u64>,
    memory_in_use: u64,

    failing_targets: HashSet<PropertyId>,
    fail_next_submit: bool,

    submissions: Vec<Submission>,
    allocations: HashMap<PropertyId, usize>,
    releases: HashMap<PropertyId, usize>,
    destroyed_buffers: usize,
}

impl RecordingBackend {
    /// Create a backend with unlimited memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit buffer and surface memory to `bytes`
    pub fn with_memory_budget(mut self, bytes: u64) -> Self {
        self.memory_budget = Some(bytes);
        self
    }

    /// Make every allocation of the target named `name` fail
    pub fn fail_allocation_of(&mut self, name: &str) {
        self.failing_targets.insert(property_to_id(name));
    }

    /// Stop injecting allocation failures
    pub fn clear_injected_failures(&mut self) {
        self.failing_targets.clear();
        self.fail_next_submit = false;
    }

    /// Make the next submission fail
    pub fn fail_next_submit(&mut self) {
        self.fail_next_submit = true;
    }

    /// Accepted submissions, oldest first
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    /// Most recent accepted submission
    pub fn last_submission(&self) -> Option<&Submission> {
        self.submissions.last()
    }

    /// Accepted submissions for `camera`
    pub fn submissions_for<'a>(&'a self, camera: &'a str) -> impl Iterator<Item = &'a Submission> + 'a {
        self.submissions.iter().filter(move |s| s.camera == camera)
    }

    /// Forget recorded submissions
    pub fn clear_submissions(&mut self) {
        self.submissions.clear();
    }

    /// Times the target named `name` was allocated
    pub fn allocation_count(&self, name: &str) -> usize {
        self.allocations.get(&property_to_id(name)).copied().unwrap_or(0)
    }

    /// Times the target named `name` was released
    pub fn release_count(&self, name: &str) -> usize {
        self.releases.get(&property_to_id(name)).copied().unwrap_or(0)
    }

    /// Allocations across all names
    pub fn total_allocations(&self) -> usize {
        self.allocations.values().sum()
    }

    /// Releases across all names
    pub fn total_releases(&self) -> usize {
        self.releases.values().sum()
    }

    /// Names currently bound to a surface
    pub fn live_targets(&self) -> usize {
        self.bindings.len()
    }

    /// Released surfaces waiting for reuse
    pub fn pooled_surfaces(&self) -> usize {
        self.free_surfaces.len()
    }

    /// Live persistent buffers
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Persistent buffers destroyed so far
    pub fn destroyed_buffers(&self) -> usize {
        self.destroyed_buffers
    }

    /// Contents of a live buffer
    pub fn buffer_data(&self, buffer: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(buffer).map(|b| b.data.as_slice())
    }

    /// Label of a live buffer
    pub fn buffer_label(&self, buffer: BufferHandle) -> Option<&str> {
        self.buffers.get(buffer).map(|b| b.label.as_str())
    }

    /// Bytes held by buffers and surfaces, pooled surfaces included
    pub fn memory_in_use(&self) -> u64 {
        self.memory_in_use
    }

    fn reserve(&mut self, bytes: u64) -> BackendResult<()> {
        let Some(budget) = self.memory_budget else {
            self.memory_in_use += bytes;
            return Ok(());
        };
        while self.memory_in_use + bytes > budget {
            let Some(pooled) = self.free_surfaces.pop() else {
                return Err(BackendError::OutOfMemory {
                    requested: bytes,
                    available: budget.saturating_sub(self.memory_in_use),
                });
            };
            if let Some(surface) = self.surfaces.remove(pooled) {
                self.memory_in_use -= surface.desc.size_in_bytes();
                log::trace!("Evicted pooled {:?} surface", surface.desc.format);
            }
        }
        self.memory_in_use += bytes;
        Ok(())
    }

    fn validate(&self, commands: &[Command]) -> BackendResult<()> {
        let mut live: HashSet<PropertyId> = HashSet::new();
        let mut target_bound = false;

        let check_target = |live: &HashSet<PropertyId>, target: TargetId, index: usize| match target {
            TargetId::CameraTarget => Ok(()),
            TargetId::Temporary(property) if live.contains(&property) => Ok(()),
            TargetId::Temporary(property) => Err(BackendError::SubmissionFailed(format!(
                "command {} uses target '{}' which is not allocated",
                index, property
            ))),
        };

        for (index, command) in commands.iter().enumerate() {
            match command {
                Command::SetupCamera { .. } => target_bound = true,
                Command::GetTemporaryTarget { property, .. } => {
                    if !self.bindings.contains_key(property) {
                        return Err(BackendError::SubmissionFailed(format!(
                            "command {} declares target '{}' with no bound surface",
                            index, property
                        )));
                    }
                    live.insert(*property);
                }
                Command::ReleaseTemporaryTarget { property } => {
                    if !live.remove(property) {
                        return Err(BackendError::SubmissionFailed(format!(
                            "command {} releases target '{}' which is not live",
                            index, property
                        )));
                    }
                }
                Command::SetRenderTargets { colors, depth } => {
                    if colors.is_empty() {
                        return Err(BackendError::SubmissionFailed(format!(
                            "command {} binds no color targets",
                            index
                        )));
                    }
                    for color in colors {
                        check_target(&live, *color, index)?;
                    }
                    check_target(&live, *depth, index)?;
                    target_bound = true;
                }
                Command::ClearRenderTarget { .. }
                | Command::DrawRenderers { .. }
                | Command::DrawSkybox => {
                    if !target_bound {
                        return Err(BackendError::SubmissionFailed(format!(
                            "command {} ({}) runs before any render target is bound",
                            index,
                            command.label()
                        )));
                    }
                }
                Command::SetGlobalBuffer { buffer, .. } => {
                    if !self.buffers.contains_key(*buffer) {
                        return Err(BackendError::UnknownResource(format!(
                            "command {} publishes a destroyed buffer",
                            index
                        )));
                    }
                }
                Command::SetGlobalInt { .. } => {}
                Command::Blit { source, destination, .. } => {
                    check_target(&live, *source, index)?;
                    check_target(&live, *destination, index)?;
                    target_bound = true;
                }
            }
        }
        Ok(())
    }
}

impl RenderBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn create_buffer(&mut self, label: &str, count: usize, stride: usize) -> BackendResult<BufferHandle> {
        if count == 0 || stride == 0 {
            return Err(BackendError::InvalidDescriptor(format!(
                "buffer '{}' has {} elements of {} bytes",
                label, count, stride
            )));
        }
        let size = count * stride;
        self.reserve(size as u64)?;
        Ok(self.buffers.insert(BufferRecord {
            label: label.to_string(),
            data: vec![0; size],
        }))
    }

    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> BackendResult<()> {
        let record = self
            .buffers
            .get_mut(buffer)
            .ok_or_else(|| BackendError::UnknownResource("buffer".to_string()))?;
        if data.len() > record.data.len() {
            return Err(BackendError::InvalidDescriptor(format!(
                "write of {} bytes into '{}' of {} bytes",
                data.len(),
                record.label,
                record.data.len()
            )));
        }
        record.data[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()> {
        let record = self
            .buffers
            .remove(buffer)
            .ok_or_else(|| BackendError::UnknownResource("buffer".to_string()))?;
        self.memory_in_use -= record.data.len() as u64;
        self.destroyed_buffers += 1;
        Ok(())
    }

    fn allocate_target(&mut self, property: PropertyId, desc: &TargetDesc) -> BackendResult<SurfaceHandle> {
        desc.validate().map_err(BackendError::InvalidDescriptor)?;
        if self.bindings.contains_key(&property) {
            return Err(BackendError::InvalidDescriptor(format!(
                "target '{}' is already allocated",
                property
            )));
        }
        if self.failing_targets.contains(&property) {
            return Err(BackendError::OutOfMemory {
                requested: desc.size_in_bytes(),
                available: 0,
            });
        }

        let reusable = self
            .free_surfaces
            .iter()
            .position(|handle| self.surfaces.get(*handle).is_some_and(|s| s.desc == *desc));
        let handle = match reusable {
            Some(index) => self.free_surfaces.swap_remove(index),
            None => {
                self.reserve(desc.size_in_bytes())?;
                self.surfaces.insert(Surface { desc: *desc })
            }
        };

        self.bindings.insert(property, handle);
        *self.allocations.entry(property).or_insert(0) += 1;
        log::trace!("Allocated target '{}' ({}x{})", property, desc.width, desc.height);
        Ok(handle)
    }

    fn release_target(&mut self, property: PropertyId) -> BackendResult<()> {
        let handle = self
            .bindings
            .remove(&property)
            .ok_or_else(|| BackendError::UnknownResource(format!("target '{}'", property)))?;
        self.free_surfaces.push(handle);
        *self.releases.entry(property).or_insert(0) += 1;
        log::trace!("Released target '{}'", property);
        Ok(())
    }

    fn submit(&mut self, camera: &str, commands: &[Command]) -> BackendResult<()> {
        if std::mem::take(&mut self.fail_next_submit) {
            return Err(BackendError::SubmissionFailed("injected failure".to_string()));
        }
        self.validate(commands)?;
        self.submissions.push(Submission {
            camera: camera.to_string(),
            commands: commands.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Color;
    use crate::render::commands::ClearFlags;
    use crate::render::targets::TextureFormat;

    fn color_desc() -> TargetDesc {
        TargetDesc::color(16, 16, TextureFormat::Argb32)
    }

    #[test]
    fn test_released_surfaces_are_reused() {
        let mut backend = RecordingBackend::new();
        let color = property_to_id("_RecordingReuse");

        let first = backend.allocate_target(color, &color_desc()).unwrap();
        backend.release_target(color).unwrap();
        let second = backend.allocate_target(color, &color_desc()).unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.allocation_count("_RecordingReuse"), 2);
        assert_eq!(backend.release_count("_RecordingReuse"), 1);
        assert_eq!(backend.memory_in_use(), color_desc().size_in_bytes());
    }

    #[test]
    fn test_double_allocation_is_rejected() {
        let mut backend = RecordingBackend::new();
        let color = property_to_id("_RecordingDouble");
        backend.allocate_target(color, &color_desc()).unwrap();
        assert!(matches!(
            backend.allocate_target(color, &color_desc()),
            Err(BackendError::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_budget_evicts_pool_before_failing() {
        let size = color_desc().size_in_bytes();
        let mut backend = RecordingBackend::new().with_memory_budget(size);
        let a = property_to_id("_RecordingBudgetA");
        let b = property_to_id("_RecordingBudgetB");

        backend.allocate_target(a, &color_desc()).unwrap();
        assert!(matches!(
            backend.allocate_target(b, &TargetDesc::depth(16, 16, 24)),
            Err(BackendError::OutOfMemory { .. })
        ));

        backend.release_target(a).unwrap();
        backend.allocate_target(b, &TargetDesc::depth(8, 8, 24)).unwrap();
        assert_eq!(backend.pooled_surfaces(), 0);
    }

    #[test]
    fn test_injected_allocation_failure() {
        let mut backend = RecordingBackend::new();
        backend.fail_allocation_of("_RecordingInjected");
        let err = backend
            .allocate_target(property_to_id("_RecordingInjected"), &color_desc())
            .unwrap_err();
        assert!(matches!(err, BackendError::OutOfMemory { available: 0, .. }));
    }

    #[test]
    fn test_clear_before_bind_is_rejected() {
        let mut backend = RecordingBackend::new();
        let stream = [Command::ClearRenderTarget {
            flags: ClearFlags::ALL,
            color: Color::BLACK,
        }];
        assert!(backend.submit("main", &stream).is_err());
        assert!(backend.submissions().is_empty());
    }

    #[test]
    fn test_unallocated_target_is_rejected() {
        let mut backend = RecordingBackend::new();
        let missing = property_to_id("_RecordingMissing");
        let stream = [Command::SetRenderTargets {
            colors: vec![TargetId::Temporary(missing)],
            depth: TargetId::CameraTarget,
        }];
        assert!(matches!(
            backend.submit("main", &stream),
            Err(BackendError::SubmissionFailed(_))
        ));
    }

    #[test]
    fn test_buffer_write_bounds() {
        let mut backend = RecordingBackend::new();
        let buffer = backend.create_buffer("lights", 2, 4).unwrap();
        backend.write_buffer(buffer, &[1, 2, 3, 4]).unwrap();
        assert_eq!(backend.buffer_data(buffer).unwrap(), &[1, 2, 3, 4, 0, 0, 0, 0]);
        assert!(backend.write_buffer(buffer, &[0; 9]).is_err());

        backend.destroy_buffer(buffer).unwrap();
        assert_eq!(backend.live_buffers(), 0);
        assert_eq!(backend.memory_in_use(), 0);
        assert!(backend.destroy_buffer(buffer).is_err());
    }

    #[test]
    fn test_fail_next_submit_is_one_shot() {
        let mut backend = RecordingBackend::new();
        backend.fail_next_submit();
        assert!(backend.submit("main", &[]).is_err());
        assert!(backend.submit("main", &[]).is_ok());
    }
}

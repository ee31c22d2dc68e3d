//! # Render Context
//!
//! Per-camera recording context. Pipelines record into it; the renderer then
//! either submits the recorded stream or abandons it.
//!
//! ## Temporary targets
//!
//! Temporary targets are allocated as soon as a command buffer that requests
//! them is executed, so an allocation failure surfaces while recording rather
//! than at submission. Every acquisition is entered in a ledger and released
//! exactly once when the context finishes, whichever way it finishes:
//!
//! - [`RenderContext::submit`]: after the backend has executed the stream
//! - [`RenderContext::abandon`]: the stream is dropped unexecuted
//! - `Drop`: the context was neither submitted nor abandoned
//!
//! A target acquired without a recorded release is still returned at submit,
//! with a warning.

use crate::foundation::collections::{BufferHandle, MaterialHandle};
use crate::render::backend::{BackendError, RenderBackend};
use crate::render::commands::{Command, CommandBuffer, CommandBufferPool};
use crate::render::drawing::{sort_renderers, DrawSettings, FilterSettings};
use crate::render::materials::MaterialLibrary;
use crate::render::properties::PropertyId;
use crate::render::targets::TargetDesc;
use crate::render::visibility::CullResults;
use crate::render::{RenderError, RenderResult};
use crate::scene::Camera;

#[derive(Debug, Clone, Copy)]
struct LedgerEntry {
    property: PropertyId,
    release_recorded: bool,
}

/// Recording context for one camera
pub struct RenderContext<'a> {
    backend: &'a mut dyn RenderBackend,
    materials: &'a MaterialLibrary,
    pool: &'a mut CommandBufferPool,
    commands: &'a mut Vec<Command>,
    camera: String,
    ledger: Vec<LedgerEntry>,
    acquired_total: usize,
    finished: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a context recording into `commands`, which is cleared first
    pub fn new(
        backend: &'a mut dyn RenderBackend,
        materials: &'a MaterialLibrary,
        pool: &'a mut CommandBufferPool,
        commands: &'a mut Vec<Command>,
        camera: &str,
    ) -> Self {
        commands.clear();
        Self {
            backend,
            materials,
            pool,
            commands,
            camera: camera.to_string(),
            ledger: Vec::new(),
            acquired_total: 0,
            finished: false,
        }
    }

    /// Camera this context records for
    pub fn camera(&self) -> &str {
        &self.camera
    }

    /// Material library used to resolve draws
    pub fn materials(&self) -> &MaterialLibrary {
        self.materials
    }

    /// Commands recorded so far
    pub fn commands(&self) -> &[Command] {
        self.commands
    }

    /// Temporary targets currently held
    pub fn live_targets(&self) -> usize {
        self.ledger.len()
    }

    /// Temporary targets acquired over the context's lifetime
    pub fn acquired_total(&self) -> usize {
        self.acquired_total
    }

    /// Upload camera matrices and bind the camera target
    pub fn setup_camera_properties(&mut self, camera: &Camera) {
        self.commands.push(Command::SetupCamera {
            view: camera.view,
            projection: camera.projection,
            target: camera.target.clone(),
        });
    }

    /// Copy `buffer`'s commands into the stream.
    ///
    /// Temporary targets requested by the buffer are allocated here. On
    /// failure the commands of `buffer` after the failing one are not copied,
    /// and everything acquired so far stays in the ledger to be released.
    pub fn execute_command_buffer(&mut self, buffer: &CommandBuffer) -> RenderResult<()> {
        for command in buffer.commands() {
            match command {
                Command::GetTemporaryTarget { property, desc } => self.acquire(*property, desc)?,
                Command::ReleaseTemporaryTarget { property } => self.mark_released(*property)?,
                _ => {}
            }
            self.commands.push(command.clone());
        }
        Ok(())
    }

    /// Take a pooled command buffer, fill it with `f`, execute it and return
    /// it to the pool.
    pub fn record(&mut self, name: &str, f: impl FnOnce(&mut CommandBuffer)) -> RenderResult<()> {
        let mut buffer = self.pool.get(name);
        f(&mut buffer);
        let result = self.execute_command_buffer(&buffer);
        self.pool.release(buffer);
        result
    }

    /// Draw visible renderers selected by `filter` with `draw`'s shader pass
    /// and sort order. An empty selection still records the draw.
    pub fn draw_renderers(&mut self, cull: &CullResults, draw: &DrawSettings, filter: &FilterSettings) {
        let mut selected: Vec<_> = cull
            .visible_renderers
            .iter()
            .filter(|r| filter.queue.contains(r.render_queue))
            .filter(|r| {
                self.materials
                    .get(r.material)
                    .is_some_and(|m| m.has_pass(&draw.pass))
            })
            .collect();
        sort_renderers(&mut selected, draw.sort);

        self.commands.push(Command::DrawRenderers {
            pass: draw.pass.clone(),
            sort: draw.sort,
            queue: filter.queue,
            objects: selected.iter().map(|r| r.object_index).collect(),
        });
    }

    /// Draw the skybox into the bound targets
    pub fn draw_skybox(&mut self) {
        self.commands.push(Command::DrawSkybox);
    }

    /// Upload packed light data into the persistent light buffer immediately
    pub fn write_light_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> RenderResult<()> {
        self.backend.write_buffer(buffer, data)?;
        Ok(())
    }

    /// Resolve a material by name
    pub fn find_material(&self, name: &str) -> RenderResult<MaterialHandle> {
        self.materials
            .find_by_name(name)
            .ok_or_else(|| RenderError::MissingMaterial(name.to_string()))
    }

    /// Execute the recorded stream, then release every temporary target
    pub fn submit(mut self) -> RenderResult<()> {
        let result = self.backend.submit(&self.camera, self.commands.as_slice());
        self.commands.clear();
        self.release_all(true);
        self.finished = true;
        result.map_err(RenderError::from)
    }

    /// Drop the recorded stream and release every temporary target
    pub fn abandon(mut self) {
        log::warn!(
            "Abandoning frame for camera '{}' ({} temporary targets to release)",
            self.camera,
            self.ledger.len()
        );
        self.commands.clear();
        self.release_all(false);
        self.finished = true;
    }

    fn acquire(&mut self, property: PropertyId, desc: &TargetDesc) -> RenderResult<()> {
        let allocation_failed = |reason: String| RenderError::TargetAllocationFailed {
            target: property.to_string(),
            reason,
        };
        if self.ledger.iter().any(|e| e.property == property) {
            return Err(allocation_failed("already acquired by this camera".to_string()));
        }
        desc.validate().map_err(allocation_failed)?;
        self.backend
            .allocate_target(property, desc)
            .map_err(|e| allocation_failed(e.to_string()))?;

        self.ledger.push(LedgerEntry {
            property,
            release_recorded: false,
        });
        self.acquired_total += 1;
        Ok(())
    }

    fn mark_released(&mut self, property: PropertyId) -> RenderResult<()> {
        match self
            .ledger
            .iter_mut()
            .find(|e| e.property == property && !e.release_recorded)
        {
            Some(entry) => {
                entry.release_recorded = true;
                Ok(())
            }
            None => Err(RenderError::Backend(BackendError::UnknownResource(format!(
                "release of '{}' which this camera does not hold",
                property
            )))),
        }
    }

    fn release_all(&mut self, warn_unreleased: bool) {
        let ledger = std::mem::take(&mut self.ledger);
        for entry in ledger {
            if warn_unreleased && !entry.release_recorded {
                log::warn!(
                    "Camera '{}' never released target '{}', reclaiming it",
                    self.camera,
                    entry.property
                );
            }
            if let Err(e) = self.backend.release_target(entry.property) {
                log::error!("Failed to release target '{}': {}", entry.property, e);
            }
        }
    }
}

impl Drop for RenderContext<'_> {
    fn drop(&mut self) {
        if !self.finished && !self.ledger.is_empty() {
            log::warn!(
                "Render context for '{}' dropped while holding {} targets",
                self.camera,
                self.ledger.len()
            );
            self.commands.clear();
            self.release_all(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backends::RecordingBackend;
    use crate::render::commands::ClearFlags;
    use crate::render::properties::property_to_id;
    use crate::foundation::math::Color;
    use crate::render::targets::{TargetId, TextureFormat};

    struct Fixture {
        backend: RecordingBackend,
        materials: MaterialLibrary,
        pool: CommandBufferPool,
        commands: Vec<Command>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                backend: RecordingBackend::new(),
                materials: MaterialLibrary::with_builtin_materials(),
                pool: CommandBufferPool::new(),
                commands: Vec::new(),
            }
        }

        fn context(&mut self) -> RenderContext<'_> {
            RenderContext::new(
                &mut self.backend,
                &self.materials,
                &mut self.pool,
                &mut self.commands,
                "main",
            )
        }
    }

    fn camera() -> Camera {
        Camera::perspective("main", 32, 32, 60.0, 0.1, 100.0)
    }

    #[test]
    fn test_submit_releases_recorded_targets() {
        let color = property_to_id("_ContextSubmit");
        let mut fixture = Fixture::new();
        {
            let mut ctx = fixture.context();
            ctx.setup_camera_properties(&camera());
            ctx.record("Targets", |cmd| {
                cmd.get_temporary_target(color, TargetDesc::color(32, 32, TextureFormat::Argb32));
                cmd.set_render_target(color, TargetId::CameraTarget);
                cmd.clear_render_target(ClearFlags::ALL, Color::BLACK);
                cmd.blit(color, TargetId::CameraTarget, None);
                cmd.release_temporary_target(color);
            })
            .unwrap();
            assert_eq!(ctx.live_targets(), 1);
            ctx.submit().unwrap();
        }
        assert_eq!(fixture.backend.allocation_count("_ContextSubmit"), 1);
        assert_eq!(fixture.backend.release_count("_ContextSubmit"), 1);
        assert_eq!(fixture.backend.submissions().len(), 1);
        assert_eq!(fixture.pool.outstanding(), 0);
    }

    #[test]
    fn test_failed_allocation_releases_earlier_targets() {
        let first = property_to_id("_ContextFirst");
        let second = property_to_id("_ContextSecond");
        let mut fixture = Fixture::new();
        fixture.backend.fail_allocation_of("_ContextSecond");
        {
            let mut ctx = fixture.context();
            let err = ctx
                .record("Targets", |cmd| {
                    cmd.get_temporary_target(first, TargetDesc::color(8, 8, TextureFormat::Argb32));
                    cmd.get_temporary_target(second, TargetDesc::depth(8, 8, 24));
                })
                .unwrap_err();
            assert!(matches!(err, RenderError::TargetAllocationFailed { .. }));
            ctx.abandon();
        }
        assert_eq!(fixture.backend.release_count("_ContextFirst"), 1);
        assert_eq!(fixture.backend.allocation_count("_ContextSecond"), 0);
        assert_eq!(fixture.backend.release_count("_ContextSecond"), 0);
        assert_eq!(fixture.backend.live_targets(), 0);
        assert!(fixture.backend.submissions().is_empty());
        assert!(fixture.commands.is_empty());
    }

    #[test]
    fn test_unreleased_target_is_reclaimed_on_submit() {
        let color = property_to_id("_ContextLeak");
        let mut fixture = Fixture::new();
        {
            let mut ctx = fixture.context();
            ctx.setup_camera_properties(&camera());
            ctx.record("Targets", |cmd| {
                cmd.get_temporary_target(color, TargetDesc::color(8, 8, TextureFormat::Argb32));
            })
            .unwrap();
            ctx.submit().unwrap();
        }
        assert_eq!(fixture.backend.release_count("_ContextLeak"), 1);
        assert_eq!(fixture.backend.live_targets(), 0);
    }

    #[test]
    fn test_drop_releases_targets() {
        let color = property_to_id("_ContextDrop");
        let mut fixture = Fixture::new();
        {
            let mut ctx = fixture.context();
            ctx.record("Targets", |cmd| {
                cmd.get_temporary_target(color, TargetDesc::color(8, 8, TextureFormat::Argb32));
            })
            .unwrap();
        }
        assert_eq!(fixture.backend.release_count("_ContextDrop"), 1);
    }

    #[test]
    fn test_duplicate_acquisition_is_rejected() {
        let color = property_to_id("_ContextDuplicate");
        let mut fixture = Fixture::new();
        let mut ctx = fixture.context();
        let err = ctx
            .record("Targets", |cmd| {
                cmd.get_temporary_target(color, TargetDesc::color(8, 8, TextureFormat::Argb32));
                cmd.get_temporary_target(color, TargetDesc::color(8, 8, TextureFormat::Argb32));
            })
            .unwrap_err();
        assert!(matches!(err, RenderError::TargetAllocationFailed { .. }));
        assert_eq!(ctx.live_targets(), 1);
        ctx.abandon();
    }

    #[test]
    fn test_draw_renderers_filters_by_pass_and_queue() {
        use crate::render::drawing::{shader_pass, SortMode};
        use crate::render::visibility::VisibleRenderer;

        let mut fixture = Fixture::new();
        let standard = fixture.materials.find_by_name("Standard").unwrap();
        let glass = fixture.materials.find_by_name("Glass").unwrap();
        let mut cull = CullResults::new();
        for (object_index, material, render_queue, distance) in
            [(0, standard, 2000, 9.0), (1, glass, 3000, 4.0), (2, standard, 2000, 3.0)]
        {
            cull.visible_renderers.push(VisibleRenderer {
                object_index,
                material,
                render_queue,
                distance,
            });
        }

        let mut ctx = fixture.context();
        ctx.draw_renderers(
            &cull,
            &DrawSettings::new(shader_pass::GBUFFER, SortMode::CommonOpaque),
            &FilterSettings::opaque(),
        );
        ctx.draw_renderers(
            &cull,
            &DrawSettings::new(shader_pass::GBUFFER, SortMode::CommonTransparent),
            &FilterSettings::transparent(),
        );

        match &ctx.commands()[0] {
            Command::DrawRenderers { objects, .. } => assert_eq!(objects, &[2, 0]),
            other => panic!("unexpected {:?}", other),
        }
        match &ctx.commands()[1] {
            Command::DrawRenderers { objects, .. } => assert!(objects.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
    }
}

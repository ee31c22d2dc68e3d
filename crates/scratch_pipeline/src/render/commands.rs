//! # Command Recording
//!
//! Pipelines record GPU work as [`Command`] values. Commands are written into
//! named [`CommandBuffer`]s taken from a [`CommandBufferPool`] and handed to
//! the render context, which copies them into the camera's pending stream.
//! The buffer can be cleared or returned to the pool right after the hand-off.
//!
//! ## Ordering
//!
//! Commands execute in exactly the order they were recorded. A pass must bind
//! its render targets before it clears or draws into them.

use bitflags::bitflags;

use crate::foundation::collections::{BufferHandle, FreeList, MaterialHandle};
use crate::foundation::math::{Color, Mat4};
use crate::render::drawing::{QueueRange, SortMode};
use crate::render::properties::PropertyId;
use crate::render::targets::{TargetDesc, TargetId};
use crate::scene::CameraTarget;

bitflags! {
    /// Which attachments a clear touches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Clear color attachments
        const COLOR = 1;
        /// Clear the depth attachment
        const DEPTH = 1 << 1;
        /// Clear everything
        const ALL = Self::COLOR.bits() | Self::DEPTH.bits();
    }
}

/// A single recorded GPU operation
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Upload camera matrices and bind the camera target
    SetupCamera {
        /// World-to-view transform
        view: Mat4,
        /// View-to-clip transform
        projection: Mat4,
        /// Surface bound as the active target
        target: CameraTarget,
    },
    /// Acquire a temporary render target for the rest of the camera's frame
    GetTemporaryTarget {
        /// Name the target is bound to
        property: PropertyId,
        /// Size and format
        desc: TargetDesc,
    },
    /// Return a temporary render target
    ReleaseTemporaryTarget {
        /// Name the target is bound to
        property: PropertyId,
    },
    /// Bind color attachments and a depth attachment
    SetRenderTargets {
        /// Color attachments, in slot order
        colors: Vec<TargetId>,
        /// Depth attachment
        depth: TargetId,
    },
    /// Clear the bound attachments
    ClearRenderTarget {
        /// Attachments to clear
        flags: ClearFlags,
        /// Clear color for color attachments
        color: Color,
    },
    /// Publish a buffer to shaders under a global name
    SetGlobalBuffer {
        /// Global name
        property: PropertyId,
        /// Buffer to publish
        buffer: BufferHandle,
    },
    /// Publish an integer to shaders under a global name
    SetGlobalInt {
        /// Global name
        property: PropertyId,
        /// Value
        value: i32,
    },
    /// Draw visible renderers with one shader pass
    DrawRenderers {
        /// Shader pass tag
        pass: String,
        /// Sort order used for `objects`
        sort: SortMode,
        /// Queue filter that selected `objects`
        queue: QueueRange,
        /// Scene object indices in draw order
        objects: Vec<usize>,
    },
    /// Draw the skybox behind everything already rendered
    DrawSkybox,
    /// Full-screen pass from `source` into `destination`
    ///
    /// A blit leaves `destination` bound as the active color target.
    Blit {
        /// Input texture
        source: TargetId,
        /// Output target
        destination: TargetId,
        /// Full-screen material, or a plain copy when `None`
        material: Option<MaterialHandle>,
    },
}

impl Command {
    /// Short name used in logs and validation messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::SetupCamera { .. } => "SetupCamera",
            Self::GetTemporaryTarget { .. } => "GetTemporaryTarget",
            Self::ReleaseTemporaryTarget { .. } => "ReleaseTemporaryTarget",
            Self::SetRenderTargets { .. } => "SetRenderTargets",
            Self::ClearRenderTarget { .. } => "ClearRenderTarget",
            Self::SetGlobalBuffer { .. } => "SetGlobalBuffer",
            Self::SetGlobalInt { .. } => "SetGlobalInt",
            Self::DrawRenderers { .. } => "DrawRenderers",
            Self::DrawSkybox => "DrawSkybox",
            Self::Blit { .. } => "Blit",
        }
    }
}

/// Named, reusable list of recorded commands
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    name: String,
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Create an empty buffer
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
        }
    }

    /// Buffer name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recorded commands
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of recorded commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop all recorded commands, keeping the allocation
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Append a command
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Acquire a temporary target bound to `property`
    pub fn get_temporary_target(&mut self, property: PropertyId, desc: TargetDesc) {
        self.push(Command::GetTemporaryTarget { property, desc });
    }

    /// Release the temporary target bound to `property`
    pub fn release_temporary_target(&mut self, property: PropertyId) {
        self.push(Command::ReleaseTemporaryTarget { property });
    }

    /// Bind a single color target with a depth target
    pub fn set_render_target(&mut self, color: impl Into<TargetId>, depth: impl Into<TargetId>) {
        self.push(Command::SetRenderTargets {
            colors: vec![color.into()],
            depth: depth.into(),
        });
    }

    /// Bind several color targets (multiple render targets) with one depth target
    pub fn set_render_targets(&mut self, colors: &[TargetId], depth: impl Into<TargetId>) {
        self.push(Command::SetRenderTargets {
            colors: colors.to_vec(),
            depth: depth.into(),
        });
    }

    /// Clear the bound targets
    pub fn clear_render_target(&mut self, flags: ClearFlags, color: Color) {
        self.push(Command::ClearRenderTarget { flags, color });
    }

    /// Publish a buffer to shaders
    pub fn set_global_buffer(&mut self, property: PropertyId, buffer: BufferHandle) {
        self.push(Command::SetGlobalBuffer { property, buffer });
    }

    /// Publish an integer to shaders
    pub fn set_global_int(&mut self, property: PropertyId, value: i32) {
        self.push(Command::SetGlobalInt { property, value });
    }

    /// Full-screen pass
    pub fn blit(
        &mut self,
        source: impl Into<TargetId>,
        destination: impl Into<TargetId>,
        material: Option<MaterialHandle>,
    ) {
        self.push(Command::Blit {
            source: source.into(),
            destination: destination.into(),
            material,
        });
    }
}

/// Pool of command buffers reused across cameras and frames
#[derive(Debug, Default)]
pub struct CommandBufferPool {
    free: FreeList<CommandBuffer>,
    outstanding: usize,
}

impl CommandBufferPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Take an empty buffer and give it `name`
    pub fn get(&mut self, name: &str) -> CommandBuffer {
        let mut buffer = self.free.acquire(CommandBuffer::default);
        buffer.name.clear();
        buffer.name.push_str(name);
        self.outstanding += 1;
        buffer
    }

    /// Return a buffer to the pool
    pub fn release(&mut self, mut buffer: CommandBuffer) {
        buffer.clear();
        self.outstanding = self.outstanding.saturating_sub(1);
        self.free.release(buffer);
    }

    /// Buffers handed out and not yet returned
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Buffers ready for reuse
    pub fn pooled(&self) -> usize {
        self.free.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::properties::property_to_id;

    #[test]
    fn test_buffer_records_in_order() {
        let color = property_to_id("_CommandsColor");
        let mut cmd = CommandBuffer::new("Set-up Render Targets");
        cmd.get_temporary_target(color, TargetDesc::color(8, 8, crate::render::TextureFormat::Argb32));
        cmd.set_render_target(color, TargetId::CameraTarget);
        cmd.clear_render_target(ClearFlags::ALL, Color::BLACK);

        let labels: Vec<_> = cmd.commands().iter().map(Command::label).collect();
        assert_eq!(labels, ["GetTemporaryTarget", "SetRenderTargets", "ClearRenderTarget"]);
        assert_eq!(cmd.name(), "Set-up Render Targets");
    }

    #[test]
    fn test_pool_reuses_cleared_buffers() {
        let mut pool = CommandBufferPool::new();
        let mut cmd = pool.get("Clear");
        cmd.clear_render_target(ClearFlags::COLOR, Color::BLACK);
        assert_eq!(pool.outstanding(), 1);
        pool.release(cmd);
        assert_eq!(pool.outstanding(), 0);
        assert_eq!(pool.pooled(), 1);

        let reused = pool.get("Final Blit");
        assert!(reused.is_empty());
        assert_eq!(reused.name(), "Final Blit");
        assert_eq!(pool.pooled(), 0);
    }

    #[test]
    fn test_clear_flags_all_covers_both() {
        assert!(ClearFlags::ALL.contains(ClearFlags::COLOR));
        assert!(ClearFlags::ALL.contains(ClearFlags::DEPTH));
    }
}

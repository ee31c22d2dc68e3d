//! Backend abstraction traits for the rendering system
//!
//! A backend owns GPU memory and executes recorded command streams. The
//! pipelines never talk to it directly; they go through the render context,
//! which keeps track of the temporary targets each camera acquires.

use thiserror::Error;

use crate::foundation::collections::{BufferHandle, SurfaceHandle};
use crate::render::commands::Command;
use crate::render::properties::PropertyId;
use crate::render::targets::TargetDesc;

/// Errors reported by a backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Not enough memory left for the request
    #[error("Out of memory: requested {requested} bytes, {available} available")]
    OutOfMemory {
        /// Bytes requested
        requested: u64,
        /// Bytes still available
        available: u64,
    },

    /// The resource description cannot be satisfied
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// A handle or name does not refer to a live resource
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    /// A command stream was rejected or failed to execute
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Main rendering backend trait
///
/// Temporary targets are bound by name: while a name is allocated, every
/// command that refers to it resolves to the same surface.
pub trait RenderBackend {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Create a persistent structured buffer of `count` elements of `stride` bytes
    fn create_buffer(&mut self, label: &str, count: usize, stride: usize) -> BackendResult<BufferHandle>;

    /// Overwrite the start of a buffer with `data`
    fn write_buffer(&mut self, buffer: BufferHandle, data: &[u8]) -> BackendResult<()>;

    /// Destroy a persistent buffer
    fn destroy_buffer(&mut self, buffer: BufferHandle) -> BackendResult<()>;

    /// Allocate a surface for `desc` and bind it to `property`
    fn allocate_target(&mut self, property: PropertyId, desc: &TargetDesc) -> BackendResult<SurfaceHandle>;

    /// Unbind `property` and return its surface to the backend
    fn release_target(&mut self, property: PropertyId) -> BackendResult<()>;

    /// Execute one camera's command stream, in order
    fn submit(&mut self, camera: &str, commands: &[Command]) -> BackendResult<()>;
}

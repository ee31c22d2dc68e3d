//! Rendering backend implementations
//!
//! Currently a single headless backend that validates and records command
//! streams.

pub mod recording;

pub use recording::{RecordingBackend, Submission};

//! # Frame Bookkeeping
//!
//! Per-camera frame state, the report returned by each
//! [`Renderer::render`](crate::render::Renderer::render) call, and the
//! per-frame-in-flight scratch memory reused across frames.
//!
//! ## Camera state machine
//!
//! ```text
//! Idle ──> Culled ──> PassesRecorded ──> Submitted
//!   │         │              │
//!   │         └──────────────┴──> Abandoned
//!   └──> CullFailed
//! ```
//!
//! `Submitted`, `CullFailed` and `Abandoned` are terminal.

use std::fmt;

use crate::render::commands::Command;
use crate::render::visibility::CullResults;

/// Where one camera is in its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CameraFrameState {
    /// Not processed yet
    Idle,
    /// Visible set resolved
    Culled,
    /// All passes recorded
    PassesRecorded,
    /// Commands executed by the backend
    Submitted,
    /// Culling failed; the camera was skipped
    CullFailed,
    /// Recording or submission failed; targets were released
    Abandoned,
}

impl CameraFrameState {
    /// Check if `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Culled)
                | (Self::Idle, Self::CullFailed)
                | (Self::Culled, Self::PassesRecorded)
                | (Self::Culled, Self::Abandoned)
                | (Self::PassesRecorded, Self::Submitted)
                | (Self::PassesRecorded, Self::Abandoned)
        )
    }

    /// Check if no further transition is possible
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Submitted | Self::CullFailed | Self::Abandoned)
    }
}

impl fmt::Display for CameraFrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Culled => "culled",
            Self::PassesRecorded => "passes recorded",
            Self::Submitted => "submitted",
            Self::CullFailed => "cull failed",
            Self::Abandoned => "abandoned",
        };
        f.write_str(name)
    }
}

/// What happened to one camera in a frame
#[derive(Debug, Clone, PartialEq)]
pub struct CameraOutcome {
    /// Camera name
    pub camera: String,
    /// Final state
    pub state: CameraFrameState,
    /// Error message when the camera did not submit
    pub error: Option<String>,
    /// Renderers that survived culling
    pub visible_renderers: usize,
    /// Lights that survived culling
    pub visible_lights: usize,
    /// Commands handed to the backend
    pub commands_submitted: usize,
    /// Temporary targets acquired
    pub targets_acquired: usize,
}

impl CameraOutcome {
    /// Start tracking a camera
    pub fn new(camera: impl Into<String>) -> Self {
        Self {
            camera: camera.into(),
            state: CameraFrameState::Idle,
            error: None,
            visible_renderers: 0,
            visible_lights: 0,
            commands_submitted: 0,
            targets_acquired: 0,
        }
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: CameraFrameState) {
        if self.state.can_transition_to(next) {
            log::trace!("Camera '{}': {} -> {}", self.camera, self.state, next);
            self.state = next;
        } else {
            debug_assert!(false, "illegal camera transition {} -> {}", self.state, next);
            log::error!(
                "Camera '{}': illegal transition {} -> {}",
                self.camera,
                self.state,
                next
            );
        }
    }

    /// Move to a failure state, keeping the error message
    pub fn fail(&mut self, next: CameraFrameState, error: &dyn std::error::Error) {
        self.error = Some(error.to_string());
        self.advance(next);
    }
}

/// Result of one [`Renderer::render`](crate::render::Renderer::render) call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    /// Frame counter value for this frame
    pub frame_index: u64,
    /// One entry per camera, in the order the cameras were given
    pub cameras: Vec<CameraOutcome>,
}

impl FrameReport {
    /// Create an empty report
    pub fn new(frame_index: u64) -> Self {
        Self {
            frame_index,
            cameras: Vec::new(),
        }
    }

    /// Cameras that reached `state`
    pub fn count(&self, state: CameraFrameState) -> usize {
        self.cameras.iter().filter(|c| c.state == state).count()
    }

    /// Cameras that submitted
    pub fn submitted(&self) -> usize {
        self.count(CameraFrameState::Submitted)
    }

    /// Cameras skipped by a cull failure
    pub fn skipped(&self) -> usize {
        self.count(CameraFrameState::CullFailed)
    }

    /// Cameras abandoned after recording started
    pub fn abandoned(&self) -> usize {
        self.count(CameraFrameState::Abandoned)
    }

    /// Outcome for the named camera
    pub fn outcome(&self, camera: &str) -> Option<&CameraOutcome> {
        self.cameras.iter().find(|c| c.camera == camera)
    }
}

/// Scratch memory for one frame in flight
#[derive(Debug, Default)]
pub struct FrameScratch {
    /// Reused cull output
    pub cull_results: CullResults,
    /// Reused command stream storage
    pub commands: Vec<Command>,
}

/// Ring of [`FrameScratch`] slots indexed by frame counter
#[derive(Debug)]
pub struct FrameArena {
    slots: Vec<FrameScratch>,
}

impl FrameArena {
    /// Create `frames_in_flight` slots (at least one)
    pub fn new(frames_in_flight: usize) -> Self {
        let slots = (0..frames_in_flight.max(1)).map(|_| FrameScratch::default()).collect();
        Self { slots }
    }

    /// Slot used by `frame_index`
    pub fn slot_mut(&mut self, frame_index: u64) -> &mut FrameScratch {
        let len = self.slots.len();
        &mut self.slots[(frame_index % len as u64) as usize]
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; an arena has at least one slot
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

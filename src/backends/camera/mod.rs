// SPDX-License-Identifier: MPL-2.0

//! Frame sources and frame delivery
//!
//! ```text
//! ┌─────────────────────┐
//! │    FrameSource      │  ← camera, test pattern, still image
//! └──────────┬──────────┘
//!            │ deliver() (never blocks)
//!            ▼
//! ┌─────────────────────┐
//! │     FrameSlot       │  ← one pending frame, newest wins
//! └──────────┬──────────┘
//!            │ recv_timeout()
//!            ▼
//! ┌─────────────────────┐
//! │   FrameProcessor    │
//! └─────────────────────┘
//! ```

pub mod file_source;
pub mod frame_loop;
pub mod synthetic;
pub mod types;

pub use file_source::ImageFileSource;
pub use frame_loop::{CaptureLoopController, LoopAction};
pub use synthetic::SyntheticSource;
pub use types::Frame;

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::trace;

/// A push source of raw frames
pub trait FrameSource: Send {
    /// Block until the next frame is ready; `None` when the source is exhausted
    fn next_frame(&mut self) -> Option<Frame>;

    /// Human readable source name for logging
    fn name(&self) -> &str;
}

#[derive(Default)]
struct SlotState {
    pending: Option<Frame>,
    next_sequence: u64,
    superseded: u64,
    senders: usize,
    closed: bool,
}

/// Single-slot mailbox between a frame source and the processor
///
/// Delivering a frame while another is still pending replaces it; the
/// replaced frame is counted as dropped. The producer never waits.
#[derive(Default)]
struct FrameSlot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

impl FrameSlot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected sender/receiver pair
pub fn frame_slot() -> (FrameSender, FrameReceiver) {
    let slot = Arc::new(FrameSlot::default());
    slot.lock().senders = 1;
    (
        FrameSender {
            slot: Arc::clone(&slot),
        },
        FrameReceiver { slot },
    )
}

/// Producer half of the frame slot
pub struct FrameSender {
    slot: Arc<FrameSlot>,
}

impl FrameSender {
    /// Hand a frame to the processor, replacing any frame it has not picked up yet
    ///
    /// Returns the sequence number stamped on the frame.
    pub fn deliver(&self, mut frame: Frame) -> u64 {
        let mut state = self.slot.lock();
        state.next_sequence += 1;
        frame.sequence = state.next_sequence;
        if state.pending.replace(frame).is_some() {
            state.superseded += 1;
            trace!(sequence = state.next_sequence, "Pending frame superseded");
        }
        let sequence = state.next_sequence;
        drop(state);
        self.slot.ready.notify_one();
        sequence
    }
}

impl Clone for FrameSender {
    fn clone(&self) -> Self {
        self.slot.lock().senders += 1;
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl Drop for FrameSender {
    fn drop(&mut self) {
        let mut state = self.slot.lock();
        state.senders -= 1;
        if state.senders == 0 {
            state.closed = true;
            drop(state);
            self.slot.ready.notify_all();
        }
    }
}

/// Why [`FrameReceiver::recv_timeout`] returned without a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvError {
    /// No frame arrived within the timeout
    Timeout,
    /// Every sender is gone and nothing is pending
    Closed,
}

/// Consumer half of the frame slot
pub struct FrameReceiver {
    slot: Arc<FrameSlot>,
}

impl FrameReceiver {
    /// Take the pending frame, waiting up to `timeout` for one to arrive
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Frame, RecvError> {
        let state = self.slot.lock();
        let (mut state, _) = self
            .slot
            .ready
            .wait_timeout_while(state, timeout, |s| s.pending.is_none() && !s.closed)
            .unwrap_or_else(PoisonError::into_inner);

        match state.pending.take() {
            Some(frame) => Ok(frame),
            None if state.closed => Err(RecvError::Closed),
            None => Err(RecvError::Timeout),
        }
    }

    /// Frames replaced before the processor picked them up
    pub fn dropped(&self) -> u64 {
        self.slot.lock().superseded
    }
}

/// Run a source on its own thread, delivering into `sender` until the source
/// is exhausted or the controller is stopped
pub fn spawn_source_pump<S>(mut source: S, sender: FrameSender) -> CaptureLoopController
where
    S: FrameSource + 'static,
{
    let name = format!("source-{}", source.name());
    CaptureLoopController::start(&name, move || match source.next_frame() {
        Some(frame) => {
            sender.deliver(frame);
            LoopAction::Continue
        }
        None => LoopAction::Stop,
    })
}

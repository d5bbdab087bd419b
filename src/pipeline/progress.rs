//! Progress reporting from the job thread.
//!
//! The job calls [`ProgressSink::on_progress`] on its own worker thread for
//! every state change. Implementations must return quickly.

use crate::pipeline::types::JobState;
use crossbeam_channel::{Sender, TrySendError};
use std::sync::Arc;

pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, state: &JobState);
}

impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn on_progress(&self, state: &JobState) {
        (**self).on_progress(state)
    }
}

/// Discards all updates.
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn on_progress(&self, _state: &JobState) {}
}

/// Writes every state change to the log.
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn on_progress(&self, state: &JobState) {
        match state {
            JobState::Failed(_) => log::error!("Job {}", state),
            JobState::Transcribing { .. } => log::debug!("Job {}", state),
            _ => log::info!("Job {}", state),
        }
    }
}

/// Forwards states over a bounded channel.
///
/// Intermediate updates are dropped when the receiver falls behind. Terminal
/// states are always delivered unless the receiver is gone, since the job has
/// nothing left to do but wait for room.
pub struct ChannelProgressSink {
    tx: Sender<JobState>,
}

impl ChannelProgressSink {
    pub fn new(tx: Sender<JobState>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn on_progress(&self, state: &JobState) {
        if state.is_terminal() {
            if self.tx.send(state.clone()).is_err() {
                log::debug!("Progress receiver dropped before terminal state");
            }
            return;
        }
        match self.tx.try_send(state.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::debug!("Progress channel full, dropping '{}' update", state.label());
            }
            Err(TrySendError::Disconnected(_)) => {
                log::debug!("Progress receiver dropped");
            }
        }
    }
}

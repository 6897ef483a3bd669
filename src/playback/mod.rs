// Step-by-step playback of a decoded log.
//
// Two interchangeable providers implement `Playback`:
// - `StepManager` keeps the steps it has seen plus undo data and can move both ways.
// - `StreamingPlayback` keeps only the current board and moves forward only.

pub mod manager;
pub mod progress;
pub mod snapshot;
pub mod source;
pub mod stream;

use std::sync::Arc;

use serde::Serialize;

pub use manager::StepManager;
pub use progress::{estimate_total, ProgressEstimator, StepCount};
pub use snapshot::Snapshot;
pub use source::{MemorySource, StepSource};
pub use stream::StreamingPlayback;

use crate::config::ReplayConfig;
use crate::error::ReplayError;
use crate::protocol::{InitRecord, Standing};

/// What a renderer needs to draw one step. Read-only for callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current_step_index: usize,
    pub fields: Snapshot,
    pub standings: Vec<Standing>,
    /// Fraction of the compressed input decoded so far; never decreases
    /// while stepping forward.
    pub progress: f64,
    /// Display estimate of the total number of steps.
    pub step_count: StepCount,
}

impl PlaybackState {
    /// State before the first step.
    pub fn initial(init: &InitRecord) -> Result<Self, ReplayError> {
        Ok(PlaybackState {
            current_step_index: 0,
            fields: Snapshot::from_init(init)?,
            standings: init.initial_standings(),
            progress: 0.0,
            step_count: StepCount::Unknown,
        })
    }
}

/// Navigation over a log's steps.
pub trait Playback {
    fn init(&self) -> &InitRecord;

    /// Throw away all state and start again from the init record.
    fn reset(&mut self) -> Result<&PlaybackState, ReplayError>;

    fn has_next(&self) -> bool;

    fn has_prev(&self) -> bool;

    /// Apply the next step. At the end of the log this returns the unchanged state;
    /// past a step that failed to decode it returns [`ReplayError::SessionFailed`].
    fn next(&mut self) -> Result<&PlaybackState, ReplayError>;

    /// Undo the last step, or fail with [`ReplayError::InvalidOperation`].
    fn prev(&mut self) -> Result<&PlaybackState, ReplayError>;

    fn state(&self) -> &PlaybackState;
}

/// Open a compressed log for playback.
///
/// A reversible player retains every step it decodes; a forward-only one keeps
/// just the current board.
pub fn open(
    blob: impl Into<Arc<[u8]>>,
    config: ReplayConfig,
    reversible: bool,
) -> Result<Box<dyn Playback>, ReplayError> {
    if reversible {
        Ok(Box::new(StepManager::from_blob(blob, config)?))
    } else {
        Ok(Box::new(StreamingPlayback::from_blob(blob, config)?))
    }
}

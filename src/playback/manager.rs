// Bidirectional playback with a lazily built undo history.

use std::sync::Arc;

use super::progress::{ProgressEstimator, StepCount};
use super::source::{MemorySource, StepSource};
use super::{Playback, PlaybackState};
use crate::config::ReplayConfig;
use crate::decode::ReplayDecoder;
use crate::error::ReplayError;
use crate::protocol::{Field, InitRecord, Replay, Standing, StepRecord};

/// What step `i` displaced: enough to reverse it exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub fields: Vec<Field>,
    pub standings: Vec<Standing>,
}

/// Plays a log forwards and backwards.
///
/// Steps are pulled from the source one at a time and kept, so moving back
/// and forth never decodes anything twice. Undo entries are captured the
/// first time each step is applied.
pub struct StepManager<S> {
    source: S,
    state: PlaybackState,
    /// Every step pulled so far; one ahead of the current index while the
    /// source still has steps.
    steps: Vec<StepRecord>,
    undo: Vec<UndoEntry>,
    source_ended: bool,
    /// A decode error ended the source; steps already pulled still play.
    failed: bool,
    estimator: ProgressEstimator,
}

impl StepManager<ReplayDecoder> {
    /// Decode a compressed log incrementally.
    pub fn from_blob(
        blob: impl Into<Arc<[u8]>>,
        config: ReplayConfig,
    ) -> Result<Self, ReplayError> {
        Self::new(ReplayDecoder::new(blob, config)?)
    }
}

impl StepManager<MemorySource> {
    /// Play an already parsed log.
    pub fn from_replay(replay: impl Into<Arc<Replay>>) -> Result<Self, ReplayError> {
        Self::new(MemorySource::new(replay))
    }
}

impl<S: StepSource> StepManager<S> {
    pub fn new(source: S) -> Result<Self, ReplayError> {
        let state = PlaybackState::initial(source.init())?;
        let mut manager = StepManager {
            source,
            state,
            steps: Vec::new(),
            undo: Vec::new(),
            source_ended: false,
            failed: false,
            estimator: ProgressEstimator::default(),
        };
        manager.fill_lookahead()?;
        manager.refresh_progress();
        Ok(manager)
    }

    /// Number of undo entries captured so far.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Pull one more step if the one after the current index is not known yet.
    fn fill_lookahead(&mut self) -> Result<(), ReplayError> {
        if self.source_ended || self.failed || self.steps.len() > self.state.current_step_index {
            return Ok(());
        }
        match self.source.next_step() {
            Ok(Some(step)) => self.steps.push(step),
            Ok(None) => self.source_ended = true,
            Err(e) => {
                tracing::warn!(index = self.state.current_step_index, "playback stopped: {e}");
                self.failed = true;
                return Err(e);
            }
        }
        Ok(())
    }

    fn refresh_progress(&mut self) {
        self.state.progress = self.state.progress.max(self.source.consumed_fraction());
        self.state.step_count = match self.source.total_steps() {
            Some(total) => StepCount::Exact(total as u64),
            None if self.source_ended => StepCount::Exact(self.steps.len() as u64),
            None => self
                .estimator
                .update(self.source.consumed_fraction(), self.steps.len()),
        };
    }
}

impl<S: StepSource> Playback for StepManager<S> {
    fn init(&self) -> &InitRecord {
        self.source.init()
    }

    fn reset(&mut self) -> Result<&PlaybackState, ReplayError> {
        *self = StepManager::new(self.source.restart()?)?;
        Ok(&self.state)
    }

    fn has_next(&self) -> bool {
        self.state.current_step_index < self.steps.len()
    }

    fn has_prev(&self) -> bool {
        let index = self.state.current_step_index;
        index > 0 && index <= self.undo.len()
    }

    /// Apply the next step.
    ///
    /// The step after it is decoded before returning; if that fails, the
    /// error is returned with this step already applied, and asking for a
    /// step past it fails with [`ReplayError::SessionFailed`].
    fn next(&mut self) -> Result<&PlaybackState, ReplayError> {
        if !self.has_next() {
            if self.failed {
                return Err(ReplayError::SessionFailed);
            }
            return Ok(&self.state);
        }
        let index = self.state.current_step_index;
        let step = &self.steps[index];
        if index == self.undo.len() {
            let fields = self.state.fields.capture(&step.fields)?;
            self.undo.push(UndoEntry {
                fields,
                standings: self.state.standings.clone(),
            });
        }
        self.state.fields.overwrite(&step.fields)?;
        self.state.standings = step.standings.clone();
        self.state.current_step_index += 1;

        self.fill_lookahead()?;
        self.refresh_progress();
        Ok(&self.state)
    }

    fn prev(&mut self) -> Result<&PlaybackState, ReplayError> {
        if !self.has_prev() {
            tracing::warn!(
                index = self.state.current_step_index,
                "prev() without undo data"
            );
            return Err(ReplayError::InvalidOperation(
                "no undo data for the previous step",
            ));
        }
        let index = self.state.current_step_index - 1;
        let entry = &self.undo[index];
        self.state.fields.overwrite(&entry.fields)?;
        self.state.standings = entry.standings.clone();
        self.state.current_step_index = index;
        Ok(&self.state)
    }

    fn state(&self) -> &PlaybackState {
        &self.state
    }
}

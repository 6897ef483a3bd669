// Forward-only playback straight off the decoder.
//
// Nothing but the current board and one decoded step of look-ahead is kept,
// so stepping backwards is not supported: it would mean re-decoding from the
// start or retaining the whole history.

use std::sync::Arc;

use super::progress::{ProgressEstimator, StepCount};
use super::{Playback, PlaybackState};
use crate::config::ReplayConfig;
use crate::decode::ReplayDecoder;
use crate::error::ReplayError;
use crate::protocol::{InitRecord, StepRecord};

pub struct StreamingPlayback {
    decoder: ReplayDecoder,
    state: PlaybackState,
    lookahead: Option<StepRecord>,
    failed: bool,
    estimator: ProgressEstimator,
}

impl StreamingPlayback {
    pub fn new(mut decoder: ReplayDecoder) -> Result<Self, ReplayError> {
        let state = PlaybackState::initial(decoder.init())?;
        let lookahead = decoder.next_step()?;
        let mut playback = StreamingPlayback {
            decoder,
            state,
            lookahead,
            failed: false,
            estimator: ProgressEstimator::default(),
        };
        playback.refresh_progress();
        Ok(playback)
    }

    pub fn from_blob(
        blob: impl Into<Arc<[u8]>>,
        config: ReplayConfig,
    ) -> Result<Self, ReplayError> {
        Self::new(ReplayDecoder::new(blob, config)?)
    }

    fn refresh_progress(&mut self) {
        let consumed = self.decoder.consumed_fraction();
        self.state.progress = self.state.progress.max(consumed);
        self.state.step_count = if self.lookahead.is_none() {
            StepCount::Exact(self.state.current_step_index as u64)
        } else {
            self.estimator
                .update(consumed, self.decoder.steps_decoded())
        };
    }
}

impl Playback for StreamingPlayback {
    fn init(&self) -> &InitRecord {
        self.decoder.init()
    }

    fn reset(&mut self) -> Result<&PlaybackState, ReplayError> {
        *self = StreamingPlayback::new(self.decoder.restart()?)?;
        Ok(&self.state)
    }

    fn has_next(&self) -> bool {
        self.lookahead.is_some()
    }

    fn has_prev(&self) -> bool {
        false
    }

    fn next(&mut self) -> Result<&PlaybackState, ReplayError> {
        let Some(step) = self.lookahead.take() else {
            if self.failed {
                return Err(ReplayError::SessionFailed);
            }
            return Ok(&self.state);
        };
        if let Err(e) = self.state.fields.overwrite(&step.fields) {
            self.lookahead = Some(step);
            return Err(e);
        }
        self.state.standings = step.standings;
        self.state.current_step_index += 1;

        self.lookahead = match self.decoder.next_step() {
            Ok(lookahead) => lookahead,
            Err(e) => {
                tracing::warn!(index = self.state.current_step_index, "playback stopped: {e}");
                self.failed = true;
                return Err(e);
            }
        };
        self.refresh_progress();
        Ok(&self.state)
    }

    fn prev(&mut self) -> Result<&PlaybackState, ReplayError> {
        tracing::warn!("prev() on forward-only playback");
        Err(ReplayError::InvalidOperation(
            "streaming playback cannot step backwards",
        ))
    }

    fn state(&self) -> &PlaybackState {
        &self.state
    }
}

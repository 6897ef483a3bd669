// Where a step manager gets its steps from: a decode session or an in-memory log.

use std::sync::Arc;

use crate::decode::ReplayDecoder;
use crate::error::ReplayError;
use crate::protocol::{InitRecord, Replay, StepRecord};

/// A forward-only supplier of step records.
pub trait StepSource {
    fn init(&self) -> &InitRecord;

    /// The next step, or `None` once the log is exhausted.
    fn next_step(&mut self) -> Result<Option<StepRecord>, ReplayError>;

    /// Fraction of the underlying input consumed so far.
    fn consumed_fraction(&self) -> f64;

    /// Total step count when it is known without decoding everything.
    fn total_steps(&self) -> Option<usize>;

    /// A new source positioned before the first step.
    fn restart(&self) -> Result<Self, ReplayError>
    where
        Self: Sized;
}

impl StepSource for ReplayDecoder {
    fn init(&self) -> &InitRecord {
        ReplayDecoder::init(self)
    }

    fn next_step(&mut self) -> Result<Option<StepRecord>, ReplayError> {
        ReplayDecoder::next_step(self)
    }

    fn consumed_fraction(&self) -> f64 {
        ReplayDecoder::consumed_fraction(self)
    }

    fn total_steps(&self) -> Option<usize> {
        None
    }

    fn restart(&self) -> Result<Self, ReplayError> {
        ReplayDecoder::restart(self)
    }
}

/// Steps of a log that is already fully parsed.
#[derive(Debug, Clone)]
pub struct MemorySource {
    replay: Arc<Replay>,
    next: usize,
}

impl MemorySource {
    pub fn new(replay: impl Into<Arc<Replay>>) -> Self {
        MemorySource {
            replay: replay.into(),
            next: 0,
        }
    }
}

impl StepSource for MemorySource {
    fn init(&self) -> &InitRecord {
        &self.replay.init
    }

    fn next_step(&mut self) -> Result<Option<StepRecord>, ReplayError> {
        let step = self.replay.steps.get(self.next).cloned();
        if step.is_some() {
            self.next += 1;
        }
        Ok(step)
    }

    fn consumed_fraction(&self) -> f64 {
        if self.replay.steps.is_empty() {
            1.0
        } else {
            self.next as f64 / self.replay.steps.len() as f64
        }
    }

    fn total_steps(&self) -> Option<usize> {
        Some(self.replay.steps.len())
    }

    fn restart(&self) -> Result<Self, ReplayError> {
        Ok(MemorySource::new(self.replay.clone()))
    }
}

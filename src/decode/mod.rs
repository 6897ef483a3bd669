// Incremental decoding of gzip-compressed replay logs.

pub mod document;
pub mod inflate;
pub mod scanner;

use std::sync::Arc;

pub use document::{DecodeStage, DocumentDecoder};

use crate::config::ReplayConfig;
use crate::error::ReplayError;
use crate::metrics;
use crate::protocol::{InitRecord, Replay, StepRecord};

/// A decode session over one compressed log.
///
/// The init record is decoded on construction so the board size is known
/// before any step is requested. Steps are then pulled one at a time.
pub struct ReplayDecoder {
    blob: Arc<[u8]>,
    config: ReplayConfig,
    document: DocumentDecoder,
    init: InitRecord,
    steps_decoded: usize,
}

impl ReplayDecoder {
    pub fn new(blob: impl Into<Arc<[u8]>>, config: ReplayConfig) -> Result<Self, ReplayError> {
        let blob = blob.into();
        metrics::DECODE_SESSIONS_TOTAL.inc();
        let (document, init) = DocumentDecoder::open(blob.clone(), &config)?;
        tracing::debug!(
            width = init.width,
            height = init.height,
            brains = init.brains.len(),
            compressed_bytes = blob.len(),
            "decoded init record"
        );
        Ok(ReplayDecoder {
            blob,
            config,
            document,
            init,
            steps_decoded: 0,
        })
    }

    /// A fresh session over the same bytes.
    pub fn restart(&self) -> Result<Self, ReplayError> {
        Self::new(self.blob.clone(), self.config)
    }

    pub fn init(&self) -> &InitRecord {
        &self.init
    }

    pub fn width(&self) -> usize {
        self.init.width
    }

    pub fn height(&self) -> usize {
        self.init.height
    }

    pub fn stage(&self) -> DecodeStage {
        self.document.stage()
    }

    pub fn is_ended(&self) -> bool {
        self.document.stage() == DecodeStage::Ended
    }

    pub fn steps_decoded(&self) -> usize {
        self.steps_decoded
    }

    pub fn consumed_fraction(&self) -> f64 {
        self.document.consumed_fraction()
    }

    /// Decode the next step; `None` marks the end of the step list.
    ///
    /// Asking again after `None` is a caller bug and fails with
    /// [`ReplayError::StreamEnded`].
    pub fn next_step(&mut self) -> Result<Option<StepRecord>, ReplayError> {
        match self.document.next_step()? {
            Some(step) => {
                self.steps_decoded += 1;
                Ok(Some(step))
            }
            None => {
                tracing::debug!(steps = self.steps_decoded, "step list ended");
                Ok(None)
            }
        }
    }

    /// Decode every remaining step into an in-memory replay.
    pub fn into_replay(mut self) -> Result<Replay, ReplayError> {
        let mut steps = Vec::new();
        while let Some(step) = self.next_step()? {
            steps.push(step);
        }
        Ok(Replay {
            init: self.init,
            steps,
        })
    }
}

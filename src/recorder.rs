// Replay recording: streams a log document into a gzip encoder one record at a time.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::config::ReplayConfig;
use crate::error::ReplayError;
use crate::metrics;
use crate::protocol::{InitRecord, Replay, StepRecord};

/// How records are laid out in the decompressed text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// No whitespace at all.
    #[default]
    Compact,
    /// Indented records, one per line block.
    Pretty,
}

/// Writes `{"init": ..., "steps": [...]}` incrementally and compresses it.
pub struct ReplayRecorder {
    encoder: GzEncoder<Vec<u8>>,
    layout: Layout,
    steps: usize,
}

impl ReplayRecorder {
    /// Start a log with its init record.
    pub fn new(
        init: &InitRecord,
        config: &ReplayConfig,
        layout: Layout,
    ) -> Result<Self, ReplayError> {
        let mut recorder = ReplayRecorder {
            encoder: GzEncoder::new(Vec::new(), config.compression()),
            layout,
            steps: 0,
        };
        let head: &[u8] = match layout {
            Layout::Compact => b"{\"init\":",
            Layout::Pretty => b"{\n  \"init\": ",
        };
        recorder.write_raw(head)?;
        recorder.write_record(init)?;
        let list: &[u8] = match layout {
            Layout::Compact => b",\"steps\":[",
            Layout::Pretty => b",\n  \"steps\": [\n",
        };
        recorder.write_raw(list)?;
        Ok(recorder)
    }

    /// Append one step.
    pub fn record_step(&mut self, step: &StepRecord) -> Result<(), ReplayError> {
        if self.steps > 0 {
            let sep: &[u8] = match self.layout {
                Layout::Compact => b",",
                Layout::Pretty => b",\n",
            };
            self.write_raw(sep)?;
        }
        self.write_record(step)?;
        self.steps += 1;
        Ok(())
    }

    /// Number of steps recorded so far.
    pub fn step_count(&self) -> usize {
        self.steps
    }

    /// Close the document and return the compressed bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, ReplayError> {
        let tail: &[u8] = match self.layout {
            Layout::Compact => b"]}",
            Layout::Pretty => b"\n  ]\n}\n",
        };
        self.write_raw(tail)?;
        let data = self.encoder.finish().map_err(ReplayError::Encode)?;
        metrics::LOGS_WRITTEN_TOTAL.inc();
        tracing::info!(
            steps = self.steps,
            compressed_bytes = data.len(),
            "replay log written"
        );
        Ok(data)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<(), ReplayError> {
        self.encoder.write_all(bytes).map_err(ReplayError::Encode)
    }

    fn write_record<T: serde::Serialize>(&mut self, record: &T) -> Result<(), ReplayError> {
        match self.layout {
            Layout::Compact => serde_json::to_writer(&mut self.encoder, record),
            Layout::Pretty => serde_json::to_writer_pretty(&mut self.encoder, record),
        }
        .map_err(ReplayError::Json)
    }
}

/// Compress a whole in-memory log.
pub fn compress_replay(
    replay: &Replay,
    config: &ReplayConfig,
    layout: Layout,
) -> Result<Vec<u8>, ReplayError> {
    let mut recorder = ReplayRecorder::new(&replay.init, config, layout)?;
    for step in &replay.steps {
        recorder.record_step(step)?;
    }
    recorder.finish()
}

/// Decompress a gzipped log back to its JSON text.
pub fn decompress_replay(data: &[u8]) -> Result<String, ReplayError> {
    let mut decoder = GzDecoder::new(data);
    let mut result = String::new();
    decoder
        .read_to_string(&mut result)
        .map_err(ReplayError::Decompress)?;
    Ok(result)
}

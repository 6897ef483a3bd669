// State machine over the decoded text of a log document:
//
//   {"init": <InitRecord>, "steps": [<StepRecord>, <StepRecord>, ...]}
//
// Literal tokens are matched as they arrive; the values between them are cut
// out with the depth scanner and handed to serde_json one unit at a time.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::inflate::Inflater;
use super::scanner::{extract_unit, Boundary, Depth};
use crate::config::ReplayConfig;
use crate::error::ReplayError;
use crate::metrics;
use crate::protocol::{InitRecord, StepRecord};

/// Characters of context carried by a format error.
const EXCERPT_CHARS: usize = 10;

/// Phase of the document decoder. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecodeStage {
    AwaitInit,
    AwaitFirstStep,
    AwaitNextStep,
    Ended,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeStage::AwaitInit => write!(f, "awaiting init record"),
            DecodeStage::AwaitFirstStep => write!(f, "awaiting first step"),
            DecodeStage::AwaitNextStep => write!(f, "awaiting next step"),
            DecodeStage::Ended => write!(f, "ended"),
        }
    }
}

fn is_json_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t')
}

fn count_error(e: &ReplayError) {
    metrics::DECODE_ERRORS_TOTAL.with_label_values(&[e.kind()]).inc();
}

/// Decodes one compressed log document record by record.
pub struct DocumentDecoder {
    inflater: Inflater,
    stage: DecodeStage,
    /// Decoded bytes not yet looked at.
    carry: Vec<u8>,
    carry_pos: usize,
    /// Bytes of the unit currently being accumulated.
    pending: Vec<u8>,
    depth: Depth,
    failed: bool,
}

impl DocumentDecoder {
    /// Start decoding `data` and read its init record.
    pub fn open(
        data: Arc<[u8]>,
        config: &ReplayConfig,
    ) -> Result<(Self, InitRecord), ReplayError> {
        let mut decoder = DocumentDecoder {
            inflater: Inflater::new(data, config),
            stage: DecodeStage::AwaitInit,
            carry: Vec::new(),
            carry_pos: 0,
            pending: Vec::new(),
            depth: Depth::default(),
            failed: false,
        };
        let init = decoder.decode_init().inspect_err(count_error)?;
        Ok((decoder, init))
    }

    pub fn stage(&self) -> DecodeStage {
        self.stage
    }

    /// Fraction of the compressed input consumed so far.
    pub fn consumed_fraction(&self) -> f64 {
        self.inflater.consumed_fraction()
    }

    /// Decode the next step; `None` once the step list has closed.
    ///
    /// Errors are fatal to the session: once one is returned, later calls fail
    /// with [`ReplayError::SessionFailed`]. Calling again after `None` fails
    /// with [`ReplayError::StreamEnded`].
    pub fn next_step(&mut self) -> Result<Option<StepRecord>, ReplayError> {
        if self.failed {
            return Err(ReplayError::SessionFailed);
        }
        let result = match self.stage {
            DecodeStage::Ended => Err(ReplayError::StreamEnded),
            DecodeStage::AwaitNextStep => self.decode_next_step(),
            _ => self.decode_first_step(),
        };
        if let Err(e) = &result {
            count_error(e);
            if !matches!(e, ReplayError::StreamEnded) {
                self.failed = true;
            }
        }
        result
    }

    fn decode_init(&mut self) -> Result<InitRecord, ReplayError> {
        for token in ["{", "\"init\"", ":"] {
            self.expect_literal(token)?;
        }
        if !self.skip_whitespace()? {
            return Err(self.truncated());
        }
        if self.carry[self.carry_pos] != b'{' {
            return Err(self.format_error("{", &self.carry[self.carry_pos..]));
        }
        self.depth = Depth::new(0, 0);
        let unit = self.scan_unit(Boundary::Object)?;
        let init: InitRecord = self.parse_unit(&unit)?;
        self.advance(DecodeStage::AwaitFirstStep);
        Ok(init)
    }

    fn decode_first_step(&mut self) -> Result<Option<StepRecord>, ReplayError> {
        debug_assert_eq!(self.stage, DecodeStage::AwaitFirstStep);
        // `{"init": {...}}` closes without a step list.
        if !self.skip_whitespace()? {
            return Err(self.truncated());
        }
        if self.carry[self.carry_pos] == b'}' {
            return Err(self.format_error("\"steps\"", &self.carry[self.carry_pos..]));
        }
        for token in [",", "\"steps\"", ":", "["] {
            self.expect_literal(token)?;
        }
        self.depth = Depth::new(0, 1);
        let unit = self.scan_unit(Boundary::ElementOrListEnd)?;
        if self.depth.bracket == 0 {
            // `[]`: no steps at all.
            self.advance(DecodeStage::AwaitNextStep);
            self.close_steps(&unit)?;
            return Ok(None);
        }
        let step: StepRecord = self.parse_unit(&unit)?;
        self.advance(DecodeStage::AwaitNextStep);
        metrics::STEPS_DECODED_TOTAL.inc();
        Ok(Some(step))
    }

    fn decode_next_step(&mut self) -> Result<Option<StepRecord>, ReplayError> {
        self.depth = Depth::new(0, 1);
        let unit = self.scan_unit(Boundary::ElementOrListEnd)?;
        if self.depth.bracket == 0 {
            self.close_steps(&unit)?;
            return Ok(None);
        }
        let start = unit
            .iter()
            .position(|&b| !is_json_whitespace(b))
            .unwrap_or(unit.len());
        if unit.get(start) != Some(&b',') {
            return Err(self.format_error(",", &unit[start..]));
        }
        let step: StepRecord = self.parse_unit(&unit[start + 1..])?;
        metrics::STEPS_DECODED_TOTAL.inc();
        Ok(Some(step))
    }

    /// `unit` ended with the `]` closing the step list. The document's `}`
    /// must follow, then nothing but whitespace.
    fn close_steps(&mut self, unit: &[u8]) -> Result<(), ReplayError> {
        let body = &unit[..unit.len() - 1];
        if let Some(pos) = body.iter().position(|&b| !is_json_whitespace(b)) {
            return Err(self.format_error("{", &body[pos..]));
        }
        self.expect_literal("}")?;
        if self.skip_whitespace()? {
            return Err(self.format_error("end of log", &self.carry[self.carry_pos..]));
        }
        if self.inflater.is_truncated() {
            return Err(self.truncated());
        }
        self.advance(DecodeStage::Ended);
        Ok(())
    }

    fn advance(&mut self, next: DecodeStage) {
        debug_assert!(next > self.stage);
        tracing::debug!(from = %self.stage, to = %next, "decode stage advanced");
        self.stage = next;
    }

    /// Make sure at least one unread decoded byte is available.
    /// Returns false once the input is exhausted.
    fn fill_carry(&mut self) -> Result<bool, ReplayError> {
        while self.carry_pos >= self.carry.len() {
            match self.inflater.next() {
                Some(chunk) => {
                    self.carry = chunk?;
                    self.carry_pos = 0;
                }
                None => return Ok(false),
            }
        }
        Ok(true)
    }

    /// Skip insignificant whitespace. Returns false if the input ran out.
    fn skip_whitespace(&mut self) -> Result<bool, ReplayError> {
        loop {
            if !self.fill_carry()? {
                return Ok(false);
            }
            while self.carry_pos < self.carry.len() && is_json_whitespace(self.carry[self.carry_pos])
            {
                self.carry_pos += 1;
            }
            if self.carry_pos < self.carry.len() {
                return Ok(true);
            }
        }
    }

    fn expect_literal(&mut self, token: &'static str) -> Result<(), ReplayError> {
        if !self.skip_whitespace()? {
            return Err(self.truncated());
        }
        let bytes = token.as_bytes();
        for (i, &expected) in bytes.iter().enumerate() {
            if !self.fill_carry()? {
                return Err(self.truncated());
            }
            if self.carry[self.carry_pos] != expected {
                let mut found = bytes[..i].to_vec();
                found.extend_from_slice(&self.carry[self.carry_pos..]);
                return Err(self.format_error(token, &found));
            }
            self.carry_pos += 1;
        }
        Ok(())
    }

    /// Accumulate decoded bytes until the awaited boundary closes a unit.
    fn scan_unit(&mut self, boundary: Boundary) -> Result<Vec<u8>, ReplayError> {
        loop {
            if !self.fill_carry()? {
                return Err(self.truncated());
            }
            let chunk = &self.carry[self.carry_pos..];
            match extract_unit(&mut self.depth, &mut self.pending, chunk, boundary) {
                Some(n) => {
                    self.carry_pos += n;
                    break;
                }
                None => self.carry_pos = self.carry.len(),
            }
        }
        let unit = std::mem::take(&mut self.pending);
        metrics::UNIT_BYTES.observe(unit.len() as f64);
        tracing::trace!(stage = %self.stage, bytes = unit.len(), "extracted unit");
        Ok(unit)
    }

    fn parse_unit<T: DeserializeOwned>(&self, unit: &[u8]) -> Result<T, ReplayError> {
        serde_json::from_slice(unit).map_err(|source| ReplayError::Record {
            stage: self.stage,
            source,
        })
    }

    fn truncated(&self) -> ReplayError {
        ReplayError::TruncatedInput {
            stage: self.stage,
            pending: self.pending.len(),
        }
    }

    fn format_error(&self, expected: &'static str, found: &[u8]) -> ReplayError {
        let found = String::from_utf8_lossy(&found[..found.len().min(4 * EXCERPT_CHARS)])
            .chars()
            .take(EXCERPT_CHARS)
            .collect();
        ReplayError::Format {
            stage: self.stage,
            expected,
            found,
        }
    }
}

// Error type shared by the decoder, the playback managers and the replay writer.

use std::io;

use crate::decode::DecodeStage;

/// Errors raised while decoding, replaying or writing a log.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// A literal token of the document did not match.
    #[error("unsupported log format ({stage}): expected token '{expected}', got '{found}' instead")]
    Format {
        stage: DecodeStage,
        expected: &'static str,
        /// Up to ten characters of what was found instead.
        found: String,
    },
    /// The compressed input ran out inside a structural unit.
    #[error("log truncated ({stage}): input exhausted with {pending} bytes of an unfinished record")]
    TruncatedInput { stage: DecodeStage, pending: usize },
    /// Another record was requested after the end of the step list.
    #[error("stream ended")]
    StreamEnded,
    /// The playback variant cannot perform the requested operation right now.
    #[error("invalid operation: {0}")]
    InvalidOperation(&'static str),
    /// An earlier decode error ended the session; only a reset recovers.
    #[error("decode session already failed")]
    SessionFailed,
    /// An extracted unit is not a valid record.
    #[error("invalid record ({stage}): {source}")]
    Record {
        stage: DecodeStage,
        source: serde_json::Error,
    },
    /// A whole document could not be parsed or serialized.
    #[error("invalid log: {0}")]
    Json(#[source] serde_json::Error),
    /// Corrupt deflate data or a gzip checksum mismatch.
    #[error("corrupt gzip data: {0}")]
    Decompress(#[source] io::Error),
    /// The gzip encoder failed while writing a log.
    #[error("gzip encoding failed: {0}")]
    Encode(#[source] io::Error),
    /// A field addresses a coordinate outside the board.
    #[error("field ({x}, {y}) is outside the {width}x{height} board")]
    UnknownCoordinate {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

impl ReplayError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ReplayError::Format { .. } => "format",
            ReplayError::TruncatedInput { .. } => "truncated",
            ReplayError::StreamEnded => "stream_ended",
            ReplayError::InvalidOperation(_) => "invalid_operation",
            ReplayError::SessionFailed => "session_failed",
            ReplayError::Record { .. } => "record",
            ReplayError::Json(_) => "json",
            ReplayError::Decompress(_) => "decompress",
            ReplayError::Encode(_) => "encode",
            ReplayError::UnknownCoordinate { .. } => "unknown_coordinate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_message_names_expected_token() {
        let err = ReplayError::Format {
            stage: DecodeStage::AwaitFirstStep,
            expected: "\"steps\"",
            found: "\"turns\": [".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("expected token '\"steps\"'"));
        assert!(msg.contains("\"turns\""));
        assert_eq!(err.kind(), "format");
    }

    #[test]
    fn test_truncated_message() {
        let err = ReplayError::TruncatedInput {
            stage: DecodeStage::AwaitFirstStep,
            pending: 42,
        };
        assert!(err.to_string().contains("42 bytes"));
        assert_eq!(err.kind(), "truncated");
    }
}

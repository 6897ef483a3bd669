// Incremental decoding and step-by-step playback of compressed swarm-game replay logs.

pub mod config;
pub mod decode;
pub mod error;
pub mod metrics;
pub mod playback;
pub mod protocol;
pub mod rating;
pub mod recorder;

pub use config::ReplayConfig;
pub use decode::{DecodeStage, ReplayDecoder};
pub use error::ReplayError;
pub use playback::{open, Playback, PlaybackState, StepCount, StepManager, StreamingPlayback};
pub use protocol::{InitRecord, Replay, StepRecord};
pub use recorder::{compress_replay, Layout, ReplayRecorder};

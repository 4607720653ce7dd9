//! Audio output trait and error types.

use ss_engine::Frame;

/// Error type for audio operations.
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("device init error: {0}")]
    DeviceInit(String),
    #[error("stream create error: {0}")]
    StreamCreate(String),
    #[error("playback error: {0}")]
    Playback(String),
    #[error("no audio output device available")]
    NoDevice,
}

/// An audio sink fed one stereo frame at a time.
pub trait AudioOutput {
    /// Sample rate the device was opened with.
    fn sample_rate(&self) -> u32;

    /// Queue frames for playback. Frames that do not fit are dropped.
    fn write(&mut self, frames: &[Frame]) -> Result<(), AudioError>;

    fn start(&mut self) -> Result<(), AudioError>;

    fn stop(&mut self) -> Result<(), AudioError>;
}

//! Offline rendering.

use ss_engine::{Engine, Frame, ReleaseTarget};

use crate::config::SynthConfig;
use crate::wav;

/// Render one note: held for `hold_secs`, then released and followed for
/// `tail_secs` so the release and any effect tails are captured.
pub fn render_note(
    config: &SynthConfig,
    frequency: f32,
    hold_secs: f32,
    tail_secs: f32,
) -> Vec<Frame> {
    let mut engine = Engine::new(config.effective_sample_rate() as f32);
    render_with(&mut engine, config, frequency, hold_secs, tail_secs)
}

/// Like [`render_note`] with a fixed random seed, for reproducible output.
pub fn render_note_seeded(
    config: &SynthConfig,
    frequency: f32,
    hold_secs: f32,
    tail_secs: f32,
    seed: u64,
) -> Vec<Frame> {
    let mut engine = Engine::with_seed(config.effective_sample_rate() as f32, seed);
    render_with(&mut engine, config, frequency, hold_secs, tail_secs)
}

fn render_with(
    engine: &mut Engine,
    config: &SynthConfig,
    frequency: f32,
    hold_secs: f32,
    tail_secs: f32,
) -> Vec<Frame> {
    config.apply_to(engine);

    let sample_rate = engine.sample_rate();
    let hold = seconds_to_frames(hold_secs, sample_rate);
    let tail = seconds_to_frames(tail_secs, sample_rate);

    let mut frames = vec![Frame::silence(); hold + tail];
    engine.trigger(frequency);
    engine.render(&mut frames[..hold]);
    engine.release(ReleaseTarget::Frequency(frequency));
    engine.render(&mut frames[hold..]);
    frames
}

/// Render a note straight to WAV bytes.
pub fn render_note_to_wav(
    config: &SynthConfig,
    frequency: f32,
    hold_secs: f32,
    tail_secs: f32,
) -> Vec<u8> {
    let frames = render_note(config, frequency, hold_secs, tail_secs);
    wav::frames_to_wav(&frames, config.effective_sample_rate())
}

fn seconds_to_frames(secs: f32, sample_rate: f32) -> usize {
    if secs.is_finite() && secs > 0.0 {
        (secs * sample_rate).round() as usize
    } else {
        0
    }
}

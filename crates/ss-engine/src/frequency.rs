//! Pitch conversions: MIDI notes, cents and pitch bend.
//!
//! All pitch modulation in the engine is expressed in cents and converted
//! to a frequency ratio at render time.

/// The MIDI note number that corresponds to `REFERENCE_FREQUENCY`.
const REFERENCE_NOTE: i16 = 69;

/// A4 in Hz.
const REFERENCE_FREQUENCY: f32 = 440.0;

/// Highest frequency accepted by `Engine::trigger`.
pub const MAX_TRIGGER_FREQUENCY: f32 = 20_000.0;

/// Pitch bend swing in cents at full deflection (one semitone).
pub const PITCH_BEND_RANGE_CENTS: f32 = 100.0;

/// Lowest raw 14-bit pitch bend value (full down).
pub const PITCH_BEND_MIN: i32 = -8192;

/// Highest raw 14-bit pitch bend value (full up).
pub const PITCH_BEND_MAX: i32 = 8191;

/// Convert a MIDI note number to its 12-TET frequency in Hz.
pub fn note_to_frequency(note: u8) -> f32 {
    let semitones = note as i16 - REFERENCE_NOTE;
    REFERENCE_FREQUENCY * (2.0f32).powf(semitones as f32 / 12.0)
}

/// Convert a pitch offset in cents to a frequency ratio.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    (2.0f32).powf(cents / 1200.0)
}

/// Convert a raw pitch bend value to cents.
///
/// The range is asymmetric like the MIDI wire value: positive values are
/// normalized by 8191 and negative ones by 8192, so both extremes reach
/// exactly one semitone.
pub fn pitch_bend_to_cents(value: i32) -> f32 {
    let clamped = value.clamp(PITCH_BEND_MIN, PITCH_BEND_MAX);
    let normalized = if clamped >= 0 {
        clamped as f32 / PITCH_BEND_MAX as f32
    } else {
        clamped as f32 / -(PITCH_BEND_MIN as f32)
    };
    normalized * PITCH_BEND_RANGE_CENTS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_440() {
        assert!((note_to_frequency(69) - 440.0).abs() < 1e-4);
    }

    #[test]
    fn octave_up_doubles_frequency() {
        let a4 = note_to_frequency(69);
        let a5 = note_to_frequency(81);
        assert!((a5 - 2.0 * a4).abs() < 1e-3);
    }

    #[test]
    fn middle_c() {
        assert!((note_to_frequency(60) - 261.6256).abs() < 1e-2);
    }

    #[test]
    fn twelve_hundred_cents_is_an_octave() {
        assert!((cents_to_ratio(1200.0) - 2.0).abs() < 1e-6);
        assert!((cents_to_ratio(-1200.0) - 0.5).abs() < 1e-6);
        assert_eq!(cents_to_ratio(0.0), 1.0);
    }

    #[test]
    fn pitch_bend_extremes() {
        assert_eq!(pitch_bend_to_cents(8191), 100.0);
        assert_eq!(pitch_bend_to_cents(-8192), -100.0);
        assert_eq!(pitch_bend_to_cents(0), 0.0);
    }

    #[test]
    fn pitch_bend_clamps() {
        assert_eq!(pitch_bend_to_cents(20_000), pitch_bend_to_cents(8191));
        assert_eq!(pitch_bend_to_cents(-20_000), pitch_bend_to_cents(-8192));
    }

    #[test]
    fn pitch_bend_half_deflection() {
        assert!((pitch_bend_to_cents(-4096) + 50.0).abs() < 1e-4);
    }
}

//! Audio frame type.

/// A stereo audio frame (32-bit float, nominally in [-1, 1]).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Create a silent frame.
    pub const fn silence() -> Self {
        Self {
            left: 0.0,
            right: 0.0,
        }
    }

    /// Create a mono frame (same value for both channels).
    pub const fn mono(value: f32) -> Self {
        Self {
            left: value,
            right: value,
        }
    }

    /// Convert to signed 16-bit PCM, clamping out-of-range values.
    pub fn to_i16(self) -> (i16, i16) {
        let convert = |v: f32| (v.clamp(-1.0, 1.0) * 32767.0).round() as i16;
        (convert(self.left), convert(self.right))
    }

    /// Largest absolute sample value across both channels.
    pub fn peak(self) -> f32 {
        self.left.abs().max(self.right.abs())
    }
}

impl From<(f32, f32)> for Frame {
    fn from((left, right): (f32, f32)) -> Self {
        Self { left, right }
    }
}

impl From<Frame> for (f32, f32) {
    fn from(frame: Frame) -> Self {
        (frame.left, frame.right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_conversion_clamps() {
        assert_eq!(Frame::new(2.0, -2.0).to_i16(), (32767, -32767));
        assert_eq!(Frame::silence().to_i16(), (0, 0));
    }

    #[test]
    fn mono_duplicates_channels() {
        let f = Frame::mono(0.25);
        assert_eq!(f.left, f.right);
        assert_eq!(f.peak(), 0.25);
    }
}

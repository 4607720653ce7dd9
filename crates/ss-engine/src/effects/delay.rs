//! Stereo delay line with feedback and mix control.

use super::{EffectParams, Processor};
use crate::frame::Frame;

const DEFAULT_DELAY_SECONDS: f32 = 0.3;
const DEFAULT_FEEDBACK: f32 = 0.5;
const DEFAULT_MIX: f32 = 0.5;
const MIN_DELAY_SECONDS: f32 = 0.005;
const MAX_DELAY_SECONDS: f32 = 2.5;
const MAX_FEEDBACK: f32 = 0.97;
const MIN_SAMPLE_RATE: f32 = 100.0;

/// Feedback writes are limited to this magnitude.
const BUFFER_LIMIT: f32 = 2.0;

/// A stereo delay with configurable time, feedback, and dry/wet mix.
///
/// The buffers always hold `MAX_DELAY_SECONDS` of audio at the current
/// sample rate, so changing the delay time never reallocates. Only a
/// sample rate change resizes them, discarding their content.
#[derive(Debug, Clone)]
pub struct Delay {
    buffer_l: Vec<f32>,
    buffer_r: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
    delay_time: f32,
    feedback: f32,
    mix: f32,
    sample_rate: f32,
}

impl Delay {
    /// Create a delay. Out-of-range parameters are clamped and non-finite
    /// ones take the defaults (0.3 s, feedback 0.5, mix 0.5, 44.1 kHz).
    pub fn new(delay_time: f32, feedback: f32, mix: f32, sample_rate: f32) -> Self {
        let sample_rate = if sample_rate.is_finite() {
            sample_rate.max(MIN_SAMPLE_RATE)
        } else {
            44100.0
        };
        let mut d = Self {
            buffer_l: Vec::new(),
            buffer_r: Vec::new(),
            write_pos: 0,
            delay_samples: 1,
            delay_time: DEFAULT_DELAY_SECONDS,
            feedback: DEFAULT_FEEDBACK,
            mix: DEFAULT_MIX,
            sample_rate,
        };
        d.allocate_buffers();
        d.set_delay_time(delay_time);
        d.set_feedback(feedback);
        d.set_mix(mix);
        d.update_delay_samples();
        d
    }

    pub fn delay_time(&self) -> f32 {
        self.delay_time
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Current delay in whole samples.
    pub fn delay_samples(&self) -> usize {
        self.delay_samples
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_l.len()
    }

    /// Change the sample rate, resizing the buffers. Rates at or below
    /// 100 Hz and changes smaller than 1e-3 are ignored.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if !sample_rate.is_finite()
            || sample_rate <= MIN_SAMPLE_RATE
            || (sample_rate - self.sample_rate).abs() < 1e-3 {
            return;
        }
        self.sample_rate = sample_rate;
        self.allocate_buffers();
        self.update_delay_samples();
    }

    /// Non-finite values are ignored here and in the other setters.
    pub fn set_delay_time(&mut self, delay_time: f32) {
        if !delay_time.is_finite() {
            return;
        }
        let clamped = delay_time.clamp(MIN_DELAY_SECONDS, MAX_DELAY_SECONDS);
        if (clamped - self.delay_time).abs() < 1e-6 {
            return;
        }
        self.delay_time = clamped;
        self.update_delay_samples();
    }

    pub fn set_feedback(&mut self, feedback: f32) {
        if !feedback.is_finite() {
            return;
        }
        self.feedback = feedback.clamp(0.0, MAX_FEEDBACK);
    }

    pub fn set_mix(&mut self, mix: f32) {
        if !mix.is_finite() {
            return;
        }
        self.mix = mix.clamp(0.0, 1.0);
    }

    fn allocate_buffers(&mut self) {
        let required = (MAX_DELAY_SECONDS * self.sample_rate).ceil() as usize + 1;
        let len = required.max(2);
        if len != self.buffer_l.len() {
            self.buffer_l = vec![0.0; len];
            self.buffer_r = vec![0.0; len];
        }
        if self.write_pos >= len {
            self.write_pos = 0;
        }
    }

    fn update_delay_samples(&mut self) {
        let len = self.buffer_l.len();
        let samples = (self.delay_time * self.sample_rate).round() as usize;
        self.delay_samples = samples.clamp(1, len - 1);
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY_SECONDS, DEFAULT_FEEDBACK, DEFAULT_MIX, 44100.0)
    }
}

impl Processor for Delay {
    #[inline]
    fn process(&mut self, frame: Frame) -> Frame {
        let len = self.buffer_l.len();
        let read_pos = (self.write_pos + len - self.delay_samples) % len;

        let delayed_l = self.buffer_l[read_pos];
        let delayed_r = self.buffer_r[read_pos];

        self.buffer_l[self.write_pos] =
            (frame.left + delayed_l * self.feedback).clamp(-BUFFER_LIMIT, BUFFER_LIMIT);
        self.buffer_r[self.write_pos] =
            (frame.right + delayed_r * self.feedback).clamp(-BUFFER_LIMIT, BUFFER_LIMIT);

        self.write_pos = (self.write_pos + 1) % len;

        let dry = 1.0 - self.mix;
        Frame {
            left: dry * frame.left + self.mix * delayed_l,
            right: dry * frame.right + self.mix * delayed_r,
        }
    }

    fn reset(&mut self) {
        self.buffer_l.fill(0.0);
        self.buffer_r.fill(0.0);
        self.write_pos = 0;
    }

    fn apply_note_context(&mut self, _frequency: f32, sample_rate: f32) {
        self.set_sample_rate(sample_rate);
    }

    fn apply_params(&mut self, params: &EffectParams) -> bool {
        match *params {
            EffectParams::Delay {
                time_secs,
                feedback,
                mix,
            } => {
                self.set_delay_time(time_secs);
                self.set_feedback(feedback);
                self.set_mix(mix);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passthrough_when_dry() {
        let mut delay = Delay::new(0.5, 0.0, 0.0, 44100.0);
        let out = delay.process(Frame::new(0.5, -0.5));
        assert!((out.left - 0.5).abs() < 1e-6);
        assert!((out.right + 0.5).abs() < 1e-6);
    }

    #[test]
    fn pure_echo_reproduces_input_after_delay() {
        let sample_rate = 44100.0;
        let mut delay = Delay::new(0.01, 0.0, 1.0, sample_rate);
        let n = delay.delay_samples();
        assert_eq!(n, 441);

        let input: Vec<f32> = (0..2000).map(|i| ((i * 37) % 101) as f32 / 101.0 - 0.5).collect();
        let output: Vec<f32> = input
            .iter()
            .map(|&x| delay.process(Frame::new(x, -x)).left)
            .collect();

        for i in 0..n {
            assert_eq!(output[i], 0.0, "nothing should leak before the delay");
        }
        for i in 0..input.len() - n {
            assert_eq!(output[i + n], input[i], "echo mismatch at {i}");
        }
    }

    #[test]
    fn feedback_attenuates_repeats() {
        let mut delay = Delay::new(0.01, 0.5, 1.0, 1000.0);
        let n = delay.delay_samples();
        assert_eq!(n, 10);

        delay.process(Frame::mono(1.0));
        for _ in 1..n {
            delay.process(Frame::silence());
        }
        let first = delay.process(Frame::silence());
        assert!((first.left - 1.0).abs() < 1e-6);

        for _ in 1..n {
            delay.process(Frame::silence());
        }
        let second = delay.process(Frame::silence());
        assert!((second.left - 0.5).abs() < 1e-6);
    }

    #[test]
    fn parameters_are_clamped() {
        let d = Delay::new(10.0, 2.0, -1.0, 44100.0);
        assert_eq!(d.delay_time(), 2.5);
        assert_eq!(d.feedback(), 0.97);
        assert_eq!(d.mix(), 0.0);

        let d = Delay::new(0.0, -1.0, 3.0, 44100.0);
        assert_eq!(d.delay_time(), 0.005);
        assert_eq!(d.feedback(), 0.0);
        assert_eq!(d.mix(), 1.0);
    }

    #[test]
    fn buffer_holds_max_delay() {
        let d = Delay::new(0.3, 0.5, 0.5, 48000.0);
        assert_eq!(d.buffer_len(), 120_001);
    }

    #[test]
    fn sample_rate_change_resizes() {
        let mut d = Delay::new(0.1, 0.5, 0.5, 44100.0);
        d.process(Frame::mono(1.0));
        d.set_sample_rate(22050.0);
        assert_eq!(d.buffer_len(), (2.5f32 * 22050.0).ceil() as usize + 1);
        assert_eq!(d.delay_samples(), 2205);

        d.set_sample_rate(50.0);
        assert_eq!(d.sample_rate(), 22050.0, "tiny rates are ignored");
    }

    #[test]
    fn feedback_buffer_is_limited() {
        let mut d = Delay::new(0.005, 0.97, 1.0, 1000.0);
        for _ in 0..10_000 {
            let out = d.process(Frame::mono(1.0));
            assert!(out.left.abs() <= BUFFER_LIMIT);
        }
    }

    #[test]
    fn reset_clears_tail() {
        let mut d = Delay::new(0.01, 0.5, 1.0, 1000.0);
        d.process(Frame::mono(1.0));
        d.reset();
        for _ in 0..100 {
            assert_eq!(d.process(Frame::silence()), Frame::silence());
        }
    }

    #[test]
    fn non_finite_parameters_are_ignored() {
        let mut d = Delay::new(0.01, 0.4, 0.6, 1000.0);
        d.apply_params(&EffectParams::Delay {
            time_secs: f32::NAN,
            feedback: f32::NAN,
            mix: f32::INFINITY,
        });
        d.set_sample_rate(f32::NAN);
        assert_eq!(d.delay_time(), 0.01);
        assert_eq!(d.feedback(), 0.4);
        assert_eq!(d.mix(), 0.6);
        assert_eq!(d.sample_rate(), 1000.0);

        for _ in 0..100 {
            assert!(d.process(Frame::mono(1.0)).left.is_finite());
        }

        let d = Delay::new(f32::NAN, f32::NAN, f32::NAN, f32::NAN);
        assert_eq!(d.delay_time(), 0.3);
        assert_eq!(d.feedback(), 0.5);
        assert_eq!(d.mix(), 0.5);
        assert_eq!(d.sample_rate(), 44100.0);
    }
}

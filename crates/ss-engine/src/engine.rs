//! The synthesis engine.
//!
//! One audible pitch at a time, driven by a stack of held notes. Each call
//! to [`Engine::next_sample`] advances the envelope, renders the oscillators
//! with drift and pitch bend applied, runs the effect chain and publishes
//! the result to the optional visualization tap.

use std::sync::Arc;

use arrayvec::ArrayVec;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::command::{Command, ReleaseTarget};
use crate::config::EngineConfig;
use crate::effects::{Effect, EffectKind, EffectParams, Processor};
use crate::envelope::{AdsrParams, Envelope};
use crate::frame::Frame;
use crate::frequency::{cents_to_ratio, pitch_bend_to_cents, MAX_TRIGGER_FREQUENCY};
use crate::modulation::{Drift, SecondaryOscillator};
use crate::notes::{ActiveNote, NoteStack};
use crate::tap::TapBuffer;
use crate::waveform::Waveform;

/// Sample rate used when the caller passes a non-positive one.
pub const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// Maximum number of effects in the chain.
pub const EFFECT_CHAIN_CAPACITY: usize = 8;

/// Cached view of the low-pass effects in the chain.
///
/// Recomputed by `Engine::sync_low_pass` after every chain mutation and
/// every cutoff change.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LowPassCache {
    active: bool,
    cutoff: f32,
}

/// Monophonic synthesizer with a legato note stack.
pub struct Engine {
    /// Output sample rate in Hz
    sample_rate: f32,
    /// Primary oscillator shape
    waveform: Waveform,
    /// Primary oscillator phase in [0, 1)
    phase: f32,
    secondary: SecondaryOscillator,
    envelope: Envelope,
    /// Effects in processing order
    effects: ArrayVec<Effect, EFFECT_CHAIN_CAPACITY>,
    low_pass: LowPassCache,
    notes: NoteStack,
    /// True while at least one note is held
    gate: bool,
    /// Base frequency of the sounding note
    frequency: f32,
    /// Jitter of the sounding note in cents
    note_detune: f32,
    drift: Drift,
    pitch_bend_cents: f32,
    rng: StdRng,
    tap: Option<Arc<TapBuffer>>,
}

impl Engine {
    /// Create an engine seeded from system entropy.
    pub fn new(sample_rate: f32) -> Self {
        Self::with_rng(sample_rate, StdRng::from_entropy())
    }

    /// Create an engine with a fixed random seed, for reproducible jitter.
    pub fn with_seed(sample_rate: f32, seed: u64) -> Self {
        Self::with_rng(sample_rate, StdRng::seed_from_u64(seed))
    }

    fn with_rng(sample_rate: f32, rng: StdRng) -> Self {
        let sample_rate = if sample_rate > 0.0 && sample_rate.is_finite() {
            sample_rate
        } else {
            DEFAULT_SAMPLE_RATE
        };

        Self {
            sample_rate,
            waveform: Waveform::default(),
            phase: 0.0,
            secondary: SecondaryOscillator::default(),
            envelope: Envelope::default(),
            effects: ArrayVec::new(),
            low_pass: LowPassCache::default(),
            notes: NoteStack::new(),
            gate: false,
            frequency: 0.0,
            note_detune: 0.0,
            drift: Drift::default(),
            pitch_bend_cents: 0.0,
            rng,
            tap: None,
        }
    }

    // --- Notes ---

    /// Start a note. Frequencies outside (0, 20000] Hz are ignored.
    ///
    /// The first note from silence restarts the oscillators, the LFO and
    /// the envelope. Later notes only change pitch.
    pub fn trigger(&mut self, frequency: f32) {
        if !(frequency > 0.0 && frequency <= MAX_TRIGGER_FREQUENCY) {
            return;
        }

        let jitter = self.drift.jitter_cents;
        let detune = if jitter > 0.0 {
            self.rng.gen_range(-jitter..=jitter)
        } else {
            0.0
        };

        let from_silence = self.notes.is_empty();
        self.notes.push(ActiveNote {
            frequency,
            detune_cents: detune,
        });

        if from_silence {
            self.phase = 0.0;
            self.secondary.phase = 0.0;
            let lfo_phase: f32 = self.rng.gen();
            self.drift.set_phase(lfo_phase);
            self.envelope.reset();
        }

        // Delay tails and filter history survive note changes.
        for effect in self.effects.iter_mut() {
            effect.apply_note_context(frequency, self.sample_rate);
        }

        self.frequency = frequency;
        self.note_detune = detune;
        self.gate = true;
    }

    /// Release held notes. Releasing a frequency that is not held does
    /// nothing. If notes remain, the new top sounds without retriggering
    /// the envelope.
    pub fn release(&mut self, target: ReleaseTarget) {
        match target {
            ReleaseTarget::All => self.notes.clear(),
            ReleaseTarget::MostRecent => {
                if self.notes.pop().is_none() {
                    return;
                }
            }
            ReleaseTarget::Frequency(frequency) => {
                if !self.notes.remove_latest_matching(frequency) {
                    return;
                }
            }
        }

        match self.notes.top() {
            Some(top) => {
                self.frequency = top.frequency;
                self.note_detune = top.detune_cents;
            }
            None => self.gate = false,
        }
    }

    // --- Rendering ---

    /// Render one stereo frame.
    #[inline]
    pub fn next_sample(&mut self) -> Frame {
        // 1. Envelope
        let env = self.envelope.process(self.gate, self.sample_rate);

        // 2. Oscillators
        let mut mono = 0.0;
        if env > 0.0 && self.frequency > 0.0 {
            let lfo_cents = self.drift.tick(self.sample_rate);
            let cents = self.note_detune + lfo_cents + self.pitch_bend_cents;
            let frequency = self.frequency * cents_to_ratio(cents);

            let primary = self
                .waveform
                .generate(frequency, self.sample_rate, &mut self.phase);

            let voice = if self.secondary.is_audible() {
                let secondary_frequency = frequency * self.secondary.ratio();
                let secondary = self.secondary.waveform.generate(
                    secondary_frequency,
                    self.sample_rate,
                    &mut self.secondary.phase,
                );
                let mix = self.secondary.mix;
                primary * (1.0 - mix).max(0.0) + secondary * mix
            } else {
                primary
            };
            mono = voice * env;
        }

        // 3. Effect chain
        let mut frame = Frame::mono(mono);
        for effect in self.effects.iter_mut() {
            frame = effect.process(frame);
        }

        // 4. Visualization
        if let Some(tap) = &self.tap {
            tap.push(frame);
        }

        frame
    }

    /// Render `out.len()` frames.
    pub fn render(&mut self, out: &mut [Frame]) {
        for slot in out.iter_mut() {
            *slot = self.next_sample();
        }
    }

    // --- Effect chain ---

    /// Append an effect. Ignored with a warning once the chain is full.
    pub fn add_effect(&mut self, effect: impl Into<Effect>) {
        let effect = effect.into();
        let kind = effect.kind();
        if let Err(rejected) = self.effects.try_push(effect) {
            warn!(
                effect = rejected.element().kind().name(),
                capacity = EFFECT_CHAIN_CAPACITY,
                "effect chain full, dropping effect"
            );
            return;
        }
        debug!(effect = kind.name(), len = self.effects.len(), "added effect");
        if kind == EffectKind::LowPass {
            self.sync_low_pass();
        }
    }

    /// Clear every effect's internal state, keeping the chain.
    pub fn reset_effects(&mut self) {
        for effect in self.effects.iter_mut() {
            effect.reset();
        }
    }

    /// Reset and remove every effect.
    pub fn clear_effects(&mut self) {
        self.reset_effects();
        self.effects.clear();
        self.sync_low_pass();
    }

    /// Apply a parameter set to the first effect of the matching kind.
    /// Returns false if the chain has no such effect.
    pub fn update_effect_params(&mut self, params: &EffectParams) -> bool {
        let kind = params.kind();
        let applied = self
            .effects
            .iter_mut()
            .find(|effect| effect.kind() == kind)
            .map(|effect| effect.apply_params(params))
            .unwrap_or(false);

        if let (true, EffectParams::LowPass { cutoff_hz, .. }) = (applied, params) {
            self.record_low_pass_cutoff(*cutoff_hz);
        }
        applied
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    // --- Low-pass ---

    /// Set the cutoff of every low-pass effect in the chain. Non-finite
    /// values are ignored.
    pub fn set_low_pass_cutoff(&mut self, cutoff_hz: f32) {
        if !cutoff_hz.is_finite() {
            return;
        }
        for low_pass in self.effects.iter_mut().filter_map(Effect::as_low_pass_mut) {
            low_pass.set_cutoff(cutoff_hz);
        }
        self.record_low_pass_cutoff(cutoff_hz);
    }

    /// The cutoff last requested for the chain's low-pass, or 0 when there
    /// is none. The filter itself may run at a clamped value.
    pub fn low_pass_cutoff(&self) -> f32 {
        if self.low_pass.active {
            self.low_pass.cutoff
        } else {
            0.0
        }
    }

    pub fn has_low_pass(&self) -> bool {
        self.low_pass.active
    }

    fn record_low_pass_cutoff(&mut self, cutoff_hz: f32) {
        if !cutoff_hz.is_finite() {
            return;
        }
        self.low_pass = if self.effects.iter().any(|e| e.kind() == EffectKind::LowPass) {
            LowPassCache {
                active: true,
                cutoff: cutoff_hz,
            }
        } else {
            LowPassCache::default()
        };
    }

    /// Rescan the chain after it changes shape.
    fn sync_low_pass(&mut self) {
        self.low_pass = match self.effects.iter().rev().find_map(Effect::as_low_pass) {
            Some(low_pass) => LowPassCache {
                active: true,
                cutoff: low_pass.cutoff(),
            },
            None => LowPassCache::default(),
        };
    }

    // --- Oscillators and modulation ---

    /// Set both oscillator shapes. The running phase is kept.
    pub fn set_waveform(&mut self, waveform: Waveform) {
        self.waveform = waveform;
        self.secondary.waveform = waveform;
    }

    pub fn set_secondary_waveform(&mut self, waveform: Waveform) {
        self.secondary.waveform = waveform;
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn configure_secondary_oscillator(
        &mut self,
        enabled: bool,
        mix: f32,
        detune_cents: f32,
        octave_offset: i32,
    ) {
        self.secondary
            .configure(enabled, mix, detune_cents, octave_offset);
    }

    pub fn secondary(&self) -> &SecondaryOscillator {
        &self.secondary
    }

    /// Set pitch bend from a raw 14-bit value centred on zero.
    pub fn set_pitch_bend(&mut self, value: i32) {
        self.pitch_bend_cents = pitch_bend_to_cents(value);
    }

    pub fn pitch_bend_cents(&self) -> f32 {
        self.pitch_bend_cents
    }

    pub fn set_drift_parameters(&mut self, rate_hz: f32, amount_cents: f32, jitter_cents: f32) {
        self.drift
            .set_parameters(rate_hz, amount_cents, jitter_cents);
    }

    pub fn drift(&self) -> &Drift {
        &self.drift
    }

    /// Replace the envelope with a fresh one using `params`.
    pub fn update_adsr(&mut self, params: AdsrParams) {
        self.envelope = Envelope::new(params);
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    // --- Configuration ---

    /// Reconfigure waveform, effect chain and envelope in one step.
    pub fn configure(&mut self, config: &EngineConfig) {
        let waveform = Waveform::from_name(&config.waveform).unwrap_or_else(|| {
            warn!(name = %config.waveform, "unknown waveform, using default");
            Waveform::default()
        });
        self.set_waveform(waveform);

        self.clear_effects();
        for name in &config.effects {
            match EffectKind::from_name(name) {
                Some(kind) => self.add_effect(Effect::with_defaults(kind, self.sample_rate)),
                None => warn!(name = %name, "unknown effect, skipping"),
            }
        }

        self.update_adsr(config.envelope);

        info!(
            waveform = waveform.name(),
            effects = self.effects.len(),
            low_pass = self.low_pass.active,
            "engine configured"
        );
    }

    /// Attach or detach the visualization tap.
    pub fn set_tap(&mut self, tap: Option<Arc<TapBuffer>>) {
        self.tap = tap;
    }

    /// Apply a control message.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Trigger(frequency) => self.trigger(frequency),
            Command::Release(target) => self.release(target),
            Command::SetPitchBend(value) => self.set_pitch_bend(value),
            Command::ConfigureSecondary {
                enabled,
                mix,
                detune_cents,
                octave_offset,
            } => self.configure_secondary_oscillator(enabled, mix, detune_cents, octave_offset),
            Command::SetSecondaryWaveform(waveform) => self.set_secondary_waveform(waveform),
            Command::SetLowPassCutoff(cutoff) => self.set_low_pass_cutoff(cutoff),
            Command::SetDrift {
                rate_hz,
                amount_cents,
                jitter_cents,
            } => self.set_drift_parameters(rate_hz, amount_cents, jitter_cents),
            Command::UpdateAdsr(params) => self.update_adsr(params),
            Command::AddEffect(effect) => self.add_effect(effect),
            Command::UpdateEffectParams(params) => {
                if !self.update_effect_params(&params) {
                    debug!(effect = params.kind().name(), "no effect to update");
                }
            }
            Command::ResetEffects => self.reset_effects(),
            Command::ClearEffects => self.clear_effects(),
            Command::SetWaveform(waveform) => self.set_waveform(waveform),
            Command::Configure(config) => self.configure(&config),
        }
    }

    // --- State ---

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn gate(&self) -> bool {
        self.gate
    }

    /// Base frequency of the sounding (or last sounded) note.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    pub fn notes(&self) -> &NoteStack {
        &self.notes
    }

    pub fn active_note_count(&self) -> usize {
        self.notes.len()
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("sample_rate", &self.sample_rate)
            .field("waveform", &self.waveform)
            .field("gate", &self.gate)
            .field("frequency", &self.frequency)
            .field("notes", &self.notes.len())
            .field("effects", &self.effects.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{Delay, LowPass, Octave};
    use crate::envelope::Stage;

    const SR: f32 = 44100.0;

    fn engine() -> Engine {
        Engine::with_seed(SR, 7)
    }

    fn run(engine: &mut Engine, n: usize) -> Frame {
        let mut last = Frame::silence();
        for _ in 0..n {
            last = engine.next_sample();
        }
        last
    }

    #[test]
    fn bad_sample_rate_falls_back() {
        assert_eq!(Engine::with_seed(0.0, 1).sample_rate(), DEFAULT_SAMPLE_RATE);
        assert_eq!(Engine::with_seed(-5.0, 1).sample_rate(), DEFAULT_SAMPLE_RATE);
        assert_eq!(Engine::with_seed(48000.0, 1).sample_rate(), 48000.0);
    }

    #[test]
    fn silent_before_any_note() {
        let mut e = engine();
        for _ in 0..100 {
            assert_eq!(e.next_sample(), Frame::silence());
        }
    }

    #[test]
    fn trigger_then_release_empties_stack() {
        for f in [0.01, 27.5, 440.0, 4186.0, 20_000.0] {
            let mut e = engine();
            e.trigger(f);
            assert!(e.gate());
            assert_eq!(e.active_note_count(), 1);
            e.release(ReleaseTarget::Frequency(f));
            assert!(!e.gate(), "gate still high for {f}");
            assert_eq!(e.active_note_count(), 0);
        }
    }

    #[test]
    fn out_of_range_trigger_is_ignored() {
        let mut e = engine();
        for f in [0.0, -440.0, 20_000.5, f32::NAN, f32::INFINITY] {
            e.trigger(f);
        }
        assert_eq!(e.active_note_count(), 0);
        assert!(!e.gate());
    }

    #[test]
    fn releasing_unknown_note_is_noop() {
        let mut e = engine();
        e.trigger(440.0);
        e.trigger(550.0);
        e.release(ReleaseTarget::Frequency(660.0));
        assert_eq!(e.active_note_count(), 2);
        assert_eq!(e.frequency(), 550.0);
        assert!(e.gate());
    }

    #[test]
    fn legato_returns_to_previous_note() {
        let mut e = engine();
        e.trigger(440.0);
        run(&mut e, 1000);
        e.trigger(550.0);
        assert_eq!(e.frequency(), 550.0);
        assert_eq!(e.envelope().stage(), Stage::Attack);

        e.release(ReleaseTarget::Frequency(550.0));
        assert_eq!(e.frequency(), 440.0);
        assert!(e.gate());
        assert_eq!(e.envelope().stage(), Stage::Attack, "legato must not retrigger");
    }

    #[test]
    fn releasing_older_note_keeps_current_pitch() {
        let mut e = engine();
        e.trigger(440.0);
        e.trigger(550.0);
        e.release(ReleaseTarget::Frequency(440.0));
        assert_eq!(e.frequency(), 550.0);
        assert_eq!(e.active_note_count(), 1);
    }

    #[test]
    fn release_all_and_most_recent() {
        let mut e = engine();
        e.trigger(220.0);
        e.trigger(330.0);
        e.trigger(440.0);

        e.release(ReleaseTarget::MostRecent);
        assert_eq!(e.frequency(), 330.0);
        assert_eq!(e.active_note_count(), 2);

        e.release(ReleaseTarget::All);
        assert_eq!(e.active_note_count(), 0);
        assert!(!e.gate());
    }

    #[test]
    fn jitter_stays_within_range() {
        let mut e = engine();
        e.set_drift_parameters(0.0, 0.0, 10.0);
        for _ in 0..50 {
            e.trigger(440.0);
        }
        for note in e.notes().iter() {
            assert!(note.detune_cents.abs() <= 10.0);
        }
        assert!(e.notes().iter().any(|n| n.detune_cents != 0.0));
    }

    #[test]
    fn pitch_bend_extremes() {
        let mut e = engine();
        e.set_pitch_bend(8191);
        assert_eq!(e.pitch_bend_cents(), 100.0);
        e.set_pitch_bend(-8192);
        assert_eq!(e.pitch_bend_cents(), -100.0);
        e.set_pitch_bend(0);
        assert_eq!(e.pitch_bend_cents(), 0.0);
        e.set_pitch_bend(20_000);
        assert_eq!(e.pitch_bend_cents(), 100.0);
        e.set_pitch_bend(-20_000);
        assert_eq!(e.pitch_bend_cents(), -100.0);
    }

    #[test]
    fn low_pass_cutoff_follows_chain() {
        let mut e = engine();
        assert!(!e.has_low_pass());
        assert_eq!(e.low_pass_cutoff(), 0.0);

        e.add_effect(LowPass::new(800.0, SR));
        assert!(e.has_low_pass());
        assert_eq!(e.low_pass_cutoff(), 800.0);

        e.set_low_pass_cutoff(1500.0);
        assert_eq!(e.low_pass_cutoff(), 1500.0);

        assert!(e.update_effect_params(&EffectParams::LowPass {
            cutoff_hz: 2500.0,
            resonance: 1.2,
        }));
        assert_eq!(e.low_pass_cutoff(), 2500.0);

        // Reports what was asked for, not the clamped filter value.
        e.set_low_pass_cutoff(15_000.0);
        assert_eq!(e.low_pass_cutoff(), 15_000.0);
        e.set_low_pass_cutoff(5.0);
        assert_eq!(e.low_pass_cutoff(), 5.0);
        assert_eq!(e.effects()[0].as_low_pass().map(LowPass::cutoff), Some(20.0));

        e.set_low_pass_cutoff(12_000.0);
        assert_eq!(e.low_pass_cutoff(), 12_000.0);

        e.clear_effects();
        assert!(!e.has_low_pass());
        assert_eq!(e.low_pass_cutoff(), 0.0);
    }

    #[test]
    fn nan_cutoff_does_not_poison_the_filter() {
        let mut e = engine();
        e.add_effect(LowPass::new(1000.0, SR));
        e.trigger(440.0);
        e.set_low_pass_cutoff(f32::NAN);
        assert_eq!(e.low_pass_cutoff(), 1000.0);
        run(&mut e, 64);
        e.set_low_pass_cutoff(1000.0);
        for _ in 0..4410 {
            let frame = e.next_sample();
            assert!(frame.left.is_finite() && frame.right.is_finite());
        }

        assert!(e.update_effect_params(&EffectParams::LowPass {
            cutoff_hz: f32::NAN,
            resonance: f32::NAN,
        }));
        assert_eq!(e.low_pass_cutoff(), 1000.0);
        assert!(e.next_sample().left.is_finite());
    }

    #[test]
    fn cutoff_without_low_pass_reports_inactive() {
        let mut e = engine();
        e.add_effect(Delay::new(0.1, 0.2, 0.5, SR));
        e.set_low_pass_cutoff(900.0);
        assert!(!e.has_low_pass());
        assert_eq!(e.low_pass_cutoff(), 0.0);
    }

    #[test]
    fn chain_capacity_is_enforced() {
        let mut e = engine();
        for _ in 0..EFFECT_CHAIN_CAPACITY + 3 {
            e.add_effect(Octave::default());
        }
        assert_eq!(e.effects().len(), EFFECT_CHAIN_CAPACITY);
    }

    #[test]
    fn update_without_matching_effect_returns_false() {
        let mut e = engine();
        e.add_effect(LowPass::new(800.0, SR));
        let delay = EffectParams::Delay {
            time_secs: 0.2,
            feedback: 0.1,
            mix: 0.4,
        };
        assert!(!e.update_effect_params(&delay));
    }

    #[test]
    fn reset_effects_twice_is_same_as_once() {
        let mut e = engine();
        e.add_effect(Delay::new(0.05, 0.6, 0.5, SR));
        e.update_adsr(AdsrParams::new(0.0, 0.0, 1.0, 0.0));
        e.trigger(440.0);
        run(&mut e, 4410);
        e.release(ReleaseTarget::All);
        run(&mut e, 10);

        e.reset_effects();
        e.reset_effects();
        for _ in 0..10_000 {
            assert_eq!(e.next_sample(), Frame::silence());
        }
        assert_eq!(e.effects().len(), 1);
    }

    #[test]
    fn delay_tail_survives_new_notes() {
        let mut e = engine();
        e.set_drift_parameters(0.0, 0.0, 0.0);
        e.add_effect(Delay::new(0.01, 0.0, 1.0, SR));
        e.update_adsr(AdsrParams::new(0.0, 0.0, 1.0, 0.0));
        e.trigger(440.0);
        run(&mut e, 200);
        e.release(ReleaseTarget::All);
        run(&mut e, 10);
        e.trigger(440.0);
        // The echo of the first note is still playing out.
        let echoed = (0..441).any(|_| e.next_sample().left != 0.0);
        assert!(echoed);
    }

    #[test]
    fn configure_rebuilds_chain_and_envelope() {
        let mut e = engine();
        e.add_effect(Octave::default());
        let config = EngineConfig {
            waveform: "SAW".to_string(),
            effects: vec!["echo".into(), "reverb".into(), "LowPass".into()],
            envelope: AdsrParams::new(0.5, 0.1, 0.4, 1.0),
        };
        e.configure(&config);

        assert_eq!(e.waveform(), Waveform::Sawtooth);
        let kinds: Vec<_> = e.effects().iter().map(Effect::kind).collect();
        assert_eq!(kinds, vec![EffectKind::Delay, EffectKind::LowPass]);
        assert!(e.has_low_pass());
        assert_eq!(e.low_pass_cutoff(), 1000.0);
        assert_eq!(e.envelope().params().attack, 0.5);
    }

    #[test]
    fn configure_with_unknown_waveform_uses_default() {
        let mut e = engine();
        e.set_waveform(Waveform::Sine);
        e.configure(&EngineConfig {
            waveform: "wobble".into(),
            ..EngineConfig::default()
        });
        assert_eq!(e.waveform(), Waveform::Square);
        assert!(e.effects().is_empty());
    }

    #[test]
    fn secondary_oscillator_replaces_primary_at_full_mix() {
        let mut e = engine();
        e.set_waveform(Waveform::Sine);
        e.set_secondary_waveform(Waveform::Square);
        e.configure_secondary_oscillator(true, 1.0, 7.0, -1);
        e.trigger(220.0);
        for _ in 0..2000 {
            let level = e.envelope().level();
            let s = e.next_sample();
            assert!((s.left.abs() - level).abs() < 1e-6);
        }
    }

    #[test]
    fn tap_receives_every_frame() {
        let mut e = engine();
        let tap = Arc::new(TapBuffer::new(64));
        e.set_tap(Some(tap.clone()));
        e.trigger(440.0);
        let rendered: Vec<Frame> = (0..32).map(|_| e.next_sample()).collect();
        assert_eq!(tap.latest(32), rendered);
    }

    #[test]
    fn commands_dispatch_to_operations() {
        let mut e = engine();
        e.apply(Command::AddEffect(LowPass::new(600.0, SR).into()));
        e.apply(Command::SetLowPassCutoff(700.0));
        e.apply(Command::Trigger(440.0));
        e.apply(Command::SetPitchBend(-8192));
        e.apply(Command::SetWaveform(Waveform::Triangle));

        assert_eq!(e.low_pass_cutoff(), 700.0);
        assert_eq!(e.active_note_count(), 1);
        assert_eq!(e.pitch_bend_cents(), -100.0);
        assert_eq!(e.waveform(), Waveform::Triangle);

        e.apply(Command::Release(ReleaseTarget::Frequency(440.0)));
        assert!(!e.gate());
        e.apply(Command::ClearEffects);
        assert!(!e.has_low_pass());
    }

    #[test]
    fn square_wave_adsr_scenario() {
        let mut e = engine();
        e.trigger(440.0);

        let first = e.next_sample();
        assert_eq!(first.left, 0.0);
        assert_eq!(first.left, first.right);

        // Attack: 0.1 s at 44.1 kHz
        let mut prev = 0.0;
        for _ in 1..4410 {
            let amp = e.next_sample().left.abs();
            assert!(amp > prev, "attack must rise");
            prev = amp;
        }
        assert!((e.next_sample().left.abs() - 1.0).abs() < 1e-3);

        // Decay to sustain over 0.2 s
        run(&mut e, 8820 + 1);
        let sustained = e.next_sample().left.abs();
        assert!((sustained - 0.7).abs() < 1e-4, "sustain level {sustained}");

        e.release(ReleaseTarget::Frequency(440.0));
        assert_eq!(e.active_note_count(), 0);
        let tail = run(&mut e, (0.3 * SR) as usize + 2);
        assert!(tail.left.abs() < 1e-3);
        assert!(e.envelope().is_idle());
    }
}

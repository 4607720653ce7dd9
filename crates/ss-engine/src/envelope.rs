//! ADSR amplitude envelope.
//!
//! The envelope is driven by a gate that is re-evaluated every sample.
//! Attack is only entered through an explicit `reset()`; the engine calls
//! it when the first note sounds from silence, so held legato notes never
//! retrigger the amplitude.

/// Envelope stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// ADSR timing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdsrParams {
    /// Attack time in seconds.
    pub attack: f32,
    /// Decay time in seconds.
    pub decay: f32,
    /// Sustain level [0, 1].
    pub sustain: f32,
    /// Release time in seconds.
    pub release: f32,
}

impl AdsrParams {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
        .sanitized()
    }

    /// Negative times become zero and sustain is clamped to [0, 1].
    pub fn sanitized(self) -> Self {
        let time = |t: f32| if t.is_finite() { t.max(0.0) } else { 0.0 };
        Self {
            attack: time(self.attack),
            decay: time(self.decay),
            sustain: if self.sustain.is_finite() {
                self.sustain.clamp(0.0, 1.0)
            } else {
                0.0
            },
            release: time(self.release),
        }
    }
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.2,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

/// ADSR envelope with linear segments.
#[derive(Debug, Clone)]
pub struct Envelope {
    params: AdsrParams,
    stage: Stage,
    level: f32,
    /// Level the current attack started from.
    attack_start: f32,
    /// Level the current release started from.
    release_start: f32,
    /// Samples elapsed in the current stage.
    counter: u32,
}

impl Envelope {
    pub fn new(params: AdsrParams) -> Self {
        Self {
            params: params.sanitized(),
            stage: Stage::Idle,
            level: 0.0,
            attack_start: 0.0,
            release_start: 0.0,
            counter: 0,
        }
    }

    pub fn params(&self) -> AdsrParams {
        self.params
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current amplitude.
    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn is_idle(&self) -> bool {
        self.stage == Stage::Idle
    }

    /// Restart from the attack stage, keeping the current level so a
    /// retrigger during release does not click.
    pub fn reset(&mut self) {
        self.stage = Stage::Attack;
        self.attack_start = self.level;
        self.counter = 0;
    }

    /// Produce the amplitude for this sample, then advance one step.
    ///
    /// A low gate moves any active stage into release, starting from the
    /// current level.
    pub fn process(&mut self, gate: bool, sample_rate: f32) -> f32 {
        if !gate && !matches!(self.stage, Stage::Idle | Stage::Release) {
            self.enter_release(sample_rate);
        }

        let out = self.level;
        self.advance(sample_rate);
        out
    }

    fn enter_release(&mut self, sample_rate: f32) {
        let samples = self.params.release * sample_rate;
        if samples < 1.0 {
            self.level = 0.0;
            self.stage = Stage::Idle;
            return;
        }
        self.release_start = self.level;
        self.counter = 0;
        self.stage = Stage::Release;
    }

    fn advance(&mut self, sample_rate: f32) {
        match self.stage {
            Stage::Idle => {
                self.level = 0.0;
            }
            Stage::Attack => {
                // Rises at 1/attack per second from wherever reset() found it.
                let samples = self.params.attack * sample_rate;
                self.counter += 1;
                self.level = if samples < 1.0 {
                    1.0
                } else {
                    self.attack_start + self.counter as f32 / samples
                };
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = Stage::Decay;
                    self.counter = 0;
                }
            }
            Stage::Decay => {
                let samples = (self.params.decay * sample_rate) as u32;
                self.counter += 1;
                if self.counter >= samples {
                    self.level = self.params.sustain;
                    self.stage = Stage::Sustain;
                } else {
                    let t = self.counter as f32 / samples as f32;
                    self.level = 1.0 - (1.0 - self.params.sustain) * t;
                }
            }
            Stage::Sustain => {
                self.level = self.params.sustain;
            }
            Stage::Release => {
                let samples = self.params.release * sample_rate;
                self.counter += 1;
                let remaining = 1.0 - self.counter as f32 / samples;
                if remaining <= 0.0 {
                    self.level = 0.0;
                    self.stage = Stage::Idle;
                } else {
                    self.level = self.release_start * remaining;
                }
            }
        }
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new(AdsrParams::default())
    }
}

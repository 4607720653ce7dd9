//! Headless controller for stacksynth.
//!
//! Owns the render thread and funnels every control call into it as a
//! [`Command`]. The engine itself is only ever touched by the render thread;
//! other threads observe it through the visualization tap and the
//! published [`EngineStatus`].

mod config;
mod error;
mod render;
mod status;
mod wav;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use ss_audio::{AudioError, AudioOutput, CpalOutput};
use ss_engine::{AdsrParams, Command, Effect, EffectParams, Engine, ReleaseTarget, TapBuffer, Waveform};
use ss_midi::{MidiAdapter, MidiInput};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, error, info, warn};

pub use config::{DriftConfig, EnvelopeConfig, SecondaryConfig, SynthConfig};
pub use error::{ConfigError, ControllerError};
pub use render::{render_note, render_note_seeded, render_note_to_wav};
pub use ss_engine::Frame;
pub use status::{EngineStatus, StatusSnapshot};
pub use wav::{frames_to_wav, write_wav};

/// Pending control messages before senders start dropping.
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Commands are drained and status published once per this many frames.
pub const CONTROL_INTERVAL_FRAMES: u64 = 64;

/// Headless synth controller.
pub struct Controller {
    config: SynthConfig,
    tap: Arc<TapBuffer>,
    commands: Sender<Command>,
    receiver: Receiver<Command>,
    status: Arc<EngineStatus>,
    playback: Option<PlaybackHandle>,
    midi: Option<MidiInput>,
}

struct PlaybackHandle {
    stop_signal: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Controller {
    pub fn new(config: SynthConfig) -> Self {
        let (commands, receiver) = crossbeam_channel::bounded(COMMAND_QUEUE_CAPACITY);
        Self {
            tap: Arc::new(TapBuffer::for_sample_rate(config.effective_sample_rate() as f32)),
            config,
            commands,
            receiver,
            status: Arc::new(EngineStatus::default()),
            playback: None,
            midi: None,
        }
    }

    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    // --- Real-time playback ---

    /// Start the render thread and open the audio device. Returns once the
    /// device is running, or with the error that prevented it.
    pub fn play(&mut self) -> Result<(), ControllerError> {
        self.stop();

        let stop_signal = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), AudioError>>(1);

        let thread = {
            let config = self.config.clone();
            let receiver = self.receiver.clone();
            let tap = self.tap.clone();
            let status = self.status.clone();
            let stop = stop_signal.clone();
            std::thread::Builder::new()
                .name("stacksynth-render".into())
                .spawn(move || {
                    render_thread(RenderContext {
                        config,
                        receiver,
                        tap,
                        status,
                        stop,
                        ready: ready_tx,
                    })
                })
                .map_err(|_| ControllerError::RenderThread)?
        };

        match ready_rx.recv() {
            Ok(Ok(())) => {
                self.playback = Some(PlaybackHandle {
                    stop_signal,
                    thread: Some(thread),
                });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e.into())
            }
            Err(_) => {
                let _ = thread.join();
                Err(ControllerError::RenderThread)
            }
        }
    }

    pub fn stop(&mut self) {
        if let Some(mut pb) = self.playback.take() {
            pb.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = pb.thread.take() {
                let _ = handle.join();
            }
            info!("playback stopped");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some() && self.status.snapshot().running
    }

    // --- MIDI ---

    /// Open MIDI input and forward translated messages to the engine.
    /// Uses the configured port unless `port` is given. Returns the port name.
    pub fn connect_midi(&mut self, port: Option<usize>) -> Result<String, ControllerError> {
        self.disconnect_midi();

        let adapter = MidiAdapter::default();
        let commands = self.commands.clone();
        let input = MidiInput::connect(port.or(self.config.midi_port), move |message| {
            if let Some(command) = adapter.translate(&message) {
                enqueue(&commands, command);
            }
        })?;

        let name = input.port_name().to_string();
        self.midi = Some(input);
        Ok(name)
    }

    pub fn disconnect_midi(&mut self) {
        if let Some(input) = self.midi.take() {
            input.close();
        }
    }

    pub fn midi_port_name(&self) -> Option<&str> {
        self.midi.as_ref().map(MidiInput::port_name)
    }

    // --- Engine control ---

    /// Queue a command for the render thread. Returns false if it was dropped.
    pub fn send(&self, command: Command) -> bool {
        enqueue(&self.commands, command)
    }

    pub fn trigger(&self, frequency: f32) -> bool {
        self.send(Command::Trigger(frequency))
    }

    pub fn release(&self, target: ReleaseTarget) -> bool {
        self.send(Command::Release(target))
    }

    pub fn set_pitch_bend(&self, value: i32) -> bool {
        self.send(Command::SetPitchBend(value))
    }

    pub fn configure_secondary_oscillator(
        &self,
        enabled: bool,
        mix: f32,
        detune_cents: f32,
        octave_offset: i32,
    ) -> bool {
        self.send(Command::ConfigureSecondary {
            enabled,
            mix,
            detune_cents,
            octave_offset,
        })
    }

    pub fn set_low_pass_cutoff(&self, cutoff_hz: f32) -> bool {
        self.send(Command::SetLowPassCutoff(cutoff_hz))
    }

    pub fn set_drift_parameters(&self, rate_hz: f32, amount_cents: f32, jitter_cents: f32) -> bool {
        self.send(Command::SetDrift {
            rate_hz,
            amount_cents,
            jitter_cents,
        })
    }

    pub fn update_adsr(&self, params: AdsrParams) -> bool {
        self.send(Command::UpdateAdsr(params))
    }

    /// Hand a fully configured effect to the engine.
    pub fn add_effect(&self, effect: impl Into<Effect>) -> bool {
        self.send(Command::AddEffect(effect.into()))
    }

    pub fn update_effect_params(&self, params: EffectParams) -> bool {
        self.send(Command::UpdateEffectParams(params))
    }

    pub fn reset_effects(&self) -> bool {
        self.send(Command::ResetEffects)
    }

    pub fn clear_effects(&self) -> bool {
        self.send(Command::ClearEffects)
    }

    /// Select a waveform by name; unknown names select the default.
    pub fn set_waveform(&self, name: &str) -> bool {
        let waveform = Waveform::from_name(name).unwrap_or_else(|| {
            warn!(name, "unknown waveform, using default");
            Waveform::default()
        });
        self.send(Command::SetWaveform(waveform))
    }

    // --- Observation ---

    /// The most recent `max_frames` rendered frames, oldest first.
    pub fn recent_frames(&self, max_frames: usize) -> Vec<Frame> {
        self.tap.latest(max_frames)
    }

    pub fn tap(&self) -> Arc<TapBuffer> {
        self.tap.clone()
    }

    pub fn status(&self) -> StatusSnapshot {
        self.status.snapshot()
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.disconnect_midi();
        self.stop();
    }
}

fn enqueue(commands: &Sender<Command>, command: Command) -> bool {
    match commands.try_send(command) {
        Ok(()) => true,
        Err(TrySendError::Full(command)) => {
            warn!(?command, "command queue full, dropping");
            false
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

/// Apply every pending command. Returns how many were applied.
fn drain_commands(engine: &mut Engine, receiver: &Receiver<Command>) -> usize {
    let mut applied = 0;
    while let Ok(command) = receiver.try_recv() {
        engine.apply(command);
        applied += 1;
    }
    applied
}

#[cfg(feature = "alloc_check")]
#[inline]
fn next_frame(engine: &mut Engine) -> Frame {
    assert_no_alloc::assert_no_alloc(|| engine.next_sample())
}

#[cfg(not(feature = "alloc_check"))]
#[inline]
fn next_frame(engine: &mut Engine) -> Frame {
    engine.next_sample()
}

struct RenderContext {
    config: SynthConfig,
    receiver: Receiver<Command>,
    tap: Arc<TapBuffer>,
    status: Arc<EngineStatus>,
    stop: Arc<AtomicBool>,
    ready: Sender<Result<(), AudioError>>,
}

fn open_output(config: &SynthConfig) -> Result<CpalOutput, AudioError> {
    let (mut output, consumer) =
        CpalOutput::new(config.effective_sample_rate(), config.buffer_frames)?;
    output.build_stream(consumer)?;
    output.start()?;
    Ok(output)
}

fn render_thread(ctx: RenderContext) {
    let mut output = match open_output(&ctx.config) {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "failed to open audio output");
            let _ = ctx.ready.send(Err(e));
            return;
        }
    };

    let sample_rate = output.sample_rate();
    let mut engine = Engine::new(sample_rate as f32);
    ctx.config.apply_to(&mut engine);
    engine.set_tap(Some(ctx.tap.clone()));

    ctx.status.set_running(true);
    let _ = ctx.ready.send(Ok(()));
    info!(sample_rate, "render thread started");

    let mut frames: u64 = 0;
    while !ctx.stop.load(Ordering::Relaxed) {
        if frames % CONTROL_INTERVAL_FRAMES == 0 {
            let applied = drain_commands(&mut engine, &ctx.receiver);
            if applied > 0 {
                debug!(applied, "applied commands");
            }
            ctx.status.publish(&engine, frames);
        }
        output.write_spin(next_frame(&mut engine));
        frames += 1;
    }

    // Let the device ring drain to silence before the stream drops.
    for _ in 0..sample_rate / 10 {
        output.write_spin(Frame::silence());
    }
    let _ = output.stop();

    ctx.status.publish(&engine, frames);
    ctx.status.set_running(false);
    info!(frames, "render thread finished");
}

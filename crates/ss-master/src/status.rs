//! Engine state published by the render thread.

use ss_engine::Engine;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};

/// Lock-free mirror of the engine's observable state.
#[derive(Debug, Default)]
pub struct EngineStatus {
    running: AtomicBool,
    active_notes: AtomicUsize,
    gate: AtomicBool,
    frequency_bits: AtomicU32,
    low_pass_active: AtomicBool,
    low_pass_cutoff_bits: AtomicU32,
    frames_rendered: AtomicU64,
}

/// A point-in-time copy of [`EngineStatus`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatusSnapshot {
    pub running: bool,
    pub active_notes: usize,
    pub gate: bool,
    pub frequency: f32,
    pub low_pass_active: bool,
    pub low_pass_cutoff: f32,
    pub frames_rendered: u64,
}

impl EngineStatus {
    pub fn publish(&self, engine: &Engine, frames_rendered: u64) {
        self.active_notes
            .store(engine.active_note_count(), Ordering::Relaxed);
        self.gate.store(engine.gate(), Ordering::Relaxed);
        self.frequency_bits
            .store(engine.frequency().to_bits(), Ordering::Relaxed);
        self.low_pass_active
            .store(engine.has_low_pass(), Ordering::Relaxed);
        self.low_pass_cutoff_bits
            .store(engine.low_pass_cutoff().to_bits(), Ordering::Relaxed);
        self.frames_rendered
            .store(frames_rendered, Ordering::Relaxed);
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        StatusSnapshot {
            running: self.running.load(Ordering::Relaxed),
            active_notes: self.active_notes.load(Ordering::Relaxed),
            gate: self.gate.load(Ordering::Relaxed),
            frequency: f32::from_bits(self.frequency_bits.load(Ordering::Relaxed)),
            low_pass_active: self.low_pass_active.load(Ordering::Relaxed),
            low_pass_cutoff: f32::from_bits(self.low_pass_cutoff_bits.load(Ordering::Relaxed)),
            frames_rendered: self.frames_rendered.load(Ordering::Relaxed),
        }
    }
}

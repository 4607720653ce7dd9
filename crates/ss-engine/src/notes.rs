//! Stack of held notes for legato release ordering.

use heapless::Vec as FixedVec;

/// Maximum number of simultaneously tracked notes.
pub const NOTE_STACK_CAPACITY: usize = 128;

/// Frequencies closer than this are considered the same note.
pub const FREQUENCY_TOLERANCE: f32 = 1e-3;

/// One held key.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveNote {
    pub frequency: f32,
    /// Random jitter assigned when the note was triggered.
    pub detune_cents: f32,
}

/// Held notes, most recent on top.
///
/// Backed by a fixed-capacity vector so pushes and removals never touch
/// the heap. When full, pushing discards the oldest note.
#[derive(Debug, Default)]
pub struct NoteStack {
    notes: FixedVec<ActiveNote, NOTE_STACK_CAPACITY>,
}

impl NoteStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, note: ActiveNote) {
        if self.notes.is_full() {
            self.notes.remove(0);
        }
        // Cannot fail: a slot was freed above if needed.
        let _ = self.notes.push(note);
    }

    /// Remove the most recently pushed note matching `frequency`.
    /// Returns false if no note matched.
    pub fn remove_latest_matching(&mut self, frequency: f32) -> bool {
        let found = self
            .notes
            .iter()
            .rposition(|n| (n.frequency - frequency).abs() < FREQUENCY_TOLERANCE);
        match found {
            Some(index) => {
                self.notes.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn pop(&mut self) -> Option<ActiveNote> {
        self.notes.pop()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    pub fn top(&self) -> Option<&ActiveNote> {
        self.notes.last()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Notes from oldest to most recent.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveNote> {
        self.notes.iter()
    }
}

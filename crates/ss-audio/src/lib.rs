//! Audio output backends for stacksynth.

mod cpal_backend;
mod traits;

pub use cpal_backend::{list_output_devices, CpalOutput};
pub use traits::{AudioError, AudioOutput};

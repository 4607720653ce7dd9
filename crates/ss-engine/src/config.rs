//! Wholesale engine configuration.

use crate::envelope::AdsrParams;

/// Settings consumed by `Engine::configure`.
///
/// Names are resolved leniently: an unknown waveform falls back to the
/// default and unknown effect names are skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub waveform: String,
    /// Effect names in chain order.
    pub effects: Vec<String>,
    pub envelope: AdsrParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            waveform: "square".to_string(),
            effects: Vec::new(),
            envelope: AdsrParams::default(),
        }
    }
}

//! Engine configuration constants and tunable parameters.

/// Tunable engine parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Upper bound on periodic ticks fired for one instance in one frame.
    ///
    /// The catch-up loop fires one full tick per whole interval elapsed,
    /// which after a long frame stall can mean many ticks at once. `None`
    /// reproduces that unbounded behavior; a cap drops the excess whole
    /// intervals while keeping the fractional phase.
    pub max_catchup_ticks: Option<u32>,
}

impl EngineConfig {
    pub const fn new() -> Self {
        Self {
            max_catchup_ticks: None,
        }
    }

    pub const fn with_max_catchup_ticks(max_catchup_ticks: u32) -> Self {
        Self {
            max_catchup_ticks: Some(max_catchup_ticks),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

//! In-memory run configuration.

use cell_common::Time;
use cell_config::{SimulationSettings, DEFAULT_MAX_CYCLES};

/// Configuration for a simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Maximum number of delta cycles per time step.
    pub max_cycles: u32,
    /// Run length used by [`simulate`](crate::simulate).
    pub duration: Time,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            duration: Time::zero(),
        }
    }
}

impl SimConfig {
    /// Builds a run configuration from the `[simulation]` table of `cell.toml`.
    pub fn from_settings(settings: &SimulationSettings) -> Self {
        Self {
            max_cycles: settings.max_cycles,
            duration: settings.duration.to_ps(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cap() {
        let c = SimConfig::default();
        assert_eq!(c.max_cycles, 1000);
        assert!(c.duration.is_zero());
    }

    #[test]
    fn from_settings_normalizes_duration() {
        let cfg = cell_config::load_config_from_str(
            "[simulation]\ntop = \"t\"\nduration = \"10ns\"\nmax_cycles = 7\n",
        )
        .unwrap();
        let c = SimConfig::from_settings(&cfg.simulation);
        assert_eq!(c.max_cycles, 7);
        assert_eq!(c.duration.exponent, -12);
        assert_eq!(c.duration.value, 10_000);
    }
}

//! Configuration types deserialized from `cell.toml`.

use cell_common::Time;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Default delta-cycle cap per time step.
pub const DEFAULT_MAX_CYCLES: u32 = 1000;

/// The top-level configuration parsed from `cell.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct CellConfig {
    /// Simulation run settings.
    pub simulation: SimulationSettings,
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The `[simulation]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSettings {
    /// Namespaced path of the top module, e.g. `"test::counter"`.
    pub top: String,
    /// Default run length.
    #[serde(default = "Time::zero", deserialize_with = "deserialize_time")]
    pub duration: Time,
    /// Maximum number of delta cycles per time step.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
}

/// The `[logging]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_max_cycles() -> u32 {
    DEFAULT_MAX_CYCLES
}

fn default_filter() -> String {
    "warn".to_string()
}

/// Accepts a time literal such as `"10ns"`, or a bare integer in picoseconds.
fn deserialize_time<'de, D>(deserializer: D) -> Result<Time, D::Error>
where
    D: Deserializer<'de>,
{
    struct TimeLiteral;

    impl<'de> Visitor<'de> for TimeLiteral {
        type Value = Time;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a time literal like \"10ns\" or an integer number of picoseconds")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            v.parse::<Time>().map_err(E::custom)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Time::ps(v))
        }
    }

    deserializer.deserialize_any(TimeLiteral)
}

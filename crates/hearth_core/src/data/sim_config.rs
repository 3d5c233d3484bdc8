//! Tunable economy and lifecycle constants.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};

/// Simulation tuning.
///
/// # Example RON
///
/// ```ron
/// SimConfig(
///     starting_heat: 30,
///     max_heat: 100,
///     kill_heat: 15,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Heat at construction.
    pub starting_heat: u32,
    /// Upper bound of the heat pool.
    pub max_heat: u32,
    /// Heat granted when an enemy dies.
    pub kill_heat: u32,
    /// Cooldown set on death or sacrifice.
    pub death_cooldown: u32,
    /// Percent of max hp regenerated per turn by benched and dead heroes.
    pub bench_heal_percent: u32,
    /// Heroes to place before deployment ends.
    pub deployment_size: usize,
    /// Max heroes on the board after deployment.
    pub field_cap: usize,
    /// Turns a residual marker lasts after a sacrifice.
    pub residual_turns: u32,
    /// Victory requires the turn counter to exceed this.
    pub final_wave_turn: u32,
}

impl SimConfig {
    /// Parse a config from RON text. Missing fields take defaults.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            what: "sim config".into(),
            message: e.to_string(),
        })
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            starting_heat: 30,
            max_heat: 100,
            kill_heat: 15,
            death_cooldown: 2,
            bench_heal_percent: 25,
            deployment_size: 4,
            field_cap: 5,
            residual_turns: 1,
            final_wave_turn: 8,
        }
    }
}

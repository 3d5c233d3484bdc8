//! Data structures for game configuration.
//!
//! This module contains pure data structures that define archetypes, the
//! combo catalog, the spawn schedule and tuning constants. All structs have
//! built-in defaults matching the shipped level and can be deserialized
//! from RON text.
//!
//! **Note:** This module contains no IO - it only parses strings.
//! File loading is handled by `hearth_headless`.

mod archetype_data;
mod combo_data;
mod sim_config;
mod spawn_data;

pub use archetype_data::{ArchetypeCatalog, ArchetypeData};
pub use combo_data::{AreaShape, ComboCatalog, ComboData, EffectScript, OffenseStat, TargetMode};
pub use sim_config::SimConfig;
pub use spawn_data::{SpawnEntry, SpawnSchedule, Wave};

/// Everything a simulation is built from.
///
/// `GameData::default()` is the shipped level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameData {
    /// Economy and lifecycle tuning.
    pub config: SimConfig,
    /// Unit templates.
    pub archetypes: ArchetypeCatalog,
    /// Combo definitions.
    pub combos: ComboCatalog,
    /// Enemy waves.
    pub schedule: SpawnSchedule,
}

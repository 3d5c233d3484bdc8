//! # Hearth Core
//!
//! Deterministic simulation core for Hearth, a turn-based grid defense game
//! where a small roster of food heroes protects a 2×2 base from enemy waves.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No randomness
//! - No floating-point math (uses integer percentages and fixed-point)
//!
//! This separation enables:
//! - Headless runners and scripted autoplay
//! - Replaying a command log to an identical state hash
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`simulation`] - Orchestrator, turn phases and player commands
//! - [`grid`] - Board, cells and the base footprint
//! - [`components`] - Combatants, stats and status effects
//! - [`pathfinding`] - Movement and attack-target queries
//! - [`combat`] - Damage formula and attack resolution
//! - [`combo`] - Connectivity and combo triggering
//! - [`ai`] - Enemy objectives and greedy walking
//! - [`spawner`] - Scheduled enemy waves
//! - [`data`] - Catalogs and tuning, parseable from RON
//! - [`events`] - Notifications emitted after every mutation

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod combat;
pub mod combo;
pub mod components;
pub mod data;
pub mod error;
pub mod events;
pub mod grid;
pub mod math;
pub mod pathfinding;
pub mod simulation;
pub mod spawner;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{AttackReport, DamageKind};
    pub use crate::combo::{ComboAvailability, MissingRequirement};
    pub use crate::components::*;
    pub use crate::data::{ComboCatalog, GameData, SimConfig, SpawnSchedule};
    pub use crate::error::{GameError, Result};
    pub use crate::events::GameEvent;
    pub use crate::grid::{Board, GridPoint, BASE_POINTS};
    pub use crate::simulation::{Outcome, Phase, Simulation};
}

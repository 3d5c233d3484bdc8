//! JSON protocol for headless game communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controller
//! **Output (stdout):** Responses, one or more per command
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0",...}`
//! 2. Controller sends commands as JSON lines
//! 3. Each accepted command is answered with `ack` plus the events it caused
//! 4. Rejected commands are answered with `rejected` and leave the game as is
//! 5. When the game ends, a `game_over` line follows the final `ack`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","turn":0,"phase":"Deployment"}
//! -> {"cmd":"place","unit":2,"x":4,"y":4}
//! <- {"type":"ack","cmd":"place","events":[{"event":"unit_placed",...}]}
//! -> {"cmd":"attack","unit":3,"target":12}
//! <- {"type":"rejected","cmd":"attack","reason":"Command not allowed during Deployment"}
//! -> {"cmd":"hash"}
//! <- {"type":"hash","turn":0,"hash":1234567890}
//! ```

use hearth_core::combo::ComboAvailability;
use hearth_core::components::{ArchetypeId, EntityId, Faction, LifeState, StatusEffect};
use hearth_core::events::GameEvent;
use hearth_core::grid::GridPoint;
use hearth_core::simulation::{Outcome, Phase, Simulation};
use serde::{Deserialize, Serialize};

/// Protocol version reported in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (controller -> runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Place or summon a benched hero.
    Place { unit: EntityId, x: i32, y: i32 },

    /// Move an idle hero (onto its own cell to stay put).
    Move { unit: EntityId, x: i32, y: i32 },

    /// Attack a hostile unit.
    Attack { unit: EntityId, target: EntityId },

    /// End a unit's turn without attacking.
    Standby { unit: EntityId },

    /// Undo a pending move.
    CancelMove { unit: EntityId },

    /// List combos a hero takes part in, with availability.
    Combos { unit: EntityId },

    /// Trigger a combo.
    Combo {
        unit: EntityId,
        combo: String,
        #[serde(default)]
        x: Option<i32>,
        #[serde(default)]
        y: Option<i32>,
    },

    /// End the player phase.
    EndTurn,

    /// Full state snapshot.
    Query,

    /// Current state hash (for determinism verification).
    Hash,

    /// Debug: add heat.
    GrantHeat { amount: u32 },

    /// Quit the runner.
    Quit,
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Place { .. } => "place",
            Self::Move { .. } => "move",
            Self::Attack { .. } => "attack",
            Self::Standby { .. } => "standby",
            Self::CancelMove { .. } => "cancel_move",
            Self::Combos { .. } => "combos",
            Self::Combo { .. } => "combo",
            Self::EndTurn => "end_turn",
            Self::Query => "query",
            Self::Hash => "hash",
            Self::GrantHeat { .. } => "grant_heat",
            Self::Quit => "quit",
        }
    }
}

// ============================================================================
// Output Responses (runner -> controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready {
        version: String,
        turn: u32,
        phase: Phase,
    },

    /// Command accepted.
    Ack { cmd: String, events: Vec<GameEvent> },

    /// Command rejected by the rules; nothing changed.
    Rejected { cmd: String, reason: String },

    /// Current game state.
    State(GameSnapshot),

    /// Combo availability for one hero.
    Combos {
        unit: EntityId,
        combos: Vec<ComboAvailability>,
    },

    /// State hash for determinism verification.
    Hash { turn: u32, hash: u64 },

    /// Game has ended.
    GameOver { outcome: Outcome, turn: u32 },

    /// Malformed input.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

impl Response {
    /// Create a ready response.
    pub fn ready(sim: &Simulation) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            turn: sim.turn(),
            phase: sim.phase(),
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str, events: Vec<GameEvent>) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
            events,
        }
    }

    /// Create a rejection.
    pub fn rejected(cmd: &str, reason: impl ToString) -> Self {
        Self::Rejected {
            cmd: cmd.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

// ============================================================================
// State Types
// ============================================================================

/// State of a single combatant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitState {
    pub id: EntityId,
    pub archetype: ArchetypeId,
    pub faction: Faction,
    pub state: LifeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPoint>,
    pub hp: u32,
    pub max_hp: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub cooldown: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub status_effects: Vec<StatusEffect>,
}

/// A cell carrying a residual marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResidualState {
    pub at: GridPoint,
    pub turns: u32,
}

/// Whole-game snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSnapshot {
    pub turn: u32,
    pub phase: Phase,
    pub heat: u32,
    pub max_heat: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    pub units: Vec<UnitState>,
    pub residuals: Vec<ResidualState>,
    pub hash: u64,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(n: &u32) -> bool {
    *n == 0
}

impl GameSnapshot {
    /// Capture the current state, units in ID order.
    pub fn capture(sim: &Simulation) -> Self {
        let units = sim
            .entities()
            .sorted_ids()
            .into_iter()
            .filter_map(|id| sim.get(id))
            .map(|u| UnitState {
                id: u.id,
                archetype: u.archetype,
                faction: u.faction,
                state: u.state,
                position: u.position,
                hp: u.stats.hp,
                max_hp: u.stats.max_hp,
                cooldown: u.cooldown,
                status_effects: u.status_effects.clone(),
            })
            .collect();

        let residuals = sim
            .board()
            .cells()
            .filter(|c| c.residual_turns > 0)
            .map(|c| ResidualState {
                at: c.pos,
                turns: c.residual_turns,
            })
            .collect();

        Self {
            turn: sim.turn(),
            phase: sim.phase(),
            heat: sim.heat(),
            max_heat: sim.max_heat(),
            outcome: sim.outcome(),
            units,
            residuals,
            hash: sim.state_hash(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_place_command() {
        let json = r#"{"cmd":"place","unit":2,"x":4,"y":5}"#;
        let cmd = Command::from_json(json).unwrap();
        assert_eq!(cmd, Command::Place { unit: 2, x: 4, y: 5 });
    }

    #[test]
    fn test_parse_combo_without_target() {
        let json = r#"{"cmd":"combo","unit":2,"combo":"potato_stew"}"#;
        let cmd = Command::from_json(json).unwrap();
        assert!(matches!(
            cmd,
            Command::Combo { unit: 2, ref combo, x: None, y: None } if combo == "potato_stew"
        ));
    }

    #[test]
    fn test_parse_unit_commands() {
        assert_eq!(Command::from_json(r#"{"cmd":"end_turn"}"#).unwrap(), Command::EndTurn);
        assert_eq!(
            Command::from_json(r#"{"cmd":"cancel_move","unit":3}"#).unwrap(),
            Command::CancelMove { unit: 3 }
        );
        assert!(Command::from_json(r#"{"cmd":"teleport"}"#).is_err());
    }

    #[test]
    fn test_serialize_snapshot() {
        let sim = Simulation::new();
        let resp = Response::State(GameSnapshot::capture(&sim));
        let json = resp.to_json_line();
        assert!(json.ends_with('\n'));
        assert!(json.contains(r#""type":"state""#));
        assert!(json.contains(r#""phase":"Deployment""#));
        assert!(json.contains(r#""heat":30"#));
    }

    #[test]
    fn test_serialize_rejection() {
        let json = Response::rejected("attack", "nope").to_json_line();
        assert_eq!(json, "{\"type\":\"rejected\",\"cmd\":\"attack\",\"reason\":\"nope\"}\n");
    }
}

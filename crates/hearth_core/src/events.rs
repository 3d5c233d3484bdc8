//! Change notifications.
//!
//! The simulation records a [`GameEvent`] after every atomic mutation. Events
//! are advisory: a presentation layer can animate them, a test can assert on
//! them, and dropping them changes nothing about the outcome.

use serde::Serialize;

use crate::combat::DamageKind;
use crate::components::{ArchetypeId, EntityId, Faction, LifeState, StatusEffect};
use crate::grid::GridPoint;
use crate::simulation::{Outcome, Phase};

/// A single state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// A hero was placed from the bench.
    UnitPlaced {
        /// Placed unit.
        unit: EntityId,
        /// Destination cell.
        at: GridPoint,
        /// State it arrived in.
        state: LifeState,
    },
    /// A unit changed cells.
    UnitMoved {
        /// Moving unit.
        unit: EntityId,
        /// Origin cell.
        from: GridPoint,
        /// Destination cell.
        to: GridPoint,
    },
    /// A pending move was undone.
    MoveCancelled {
        /// Returning unit.
        unit: EntityId,
        /// Cell it returned to.
        to: GridPoint,
    },
    /// A unit's lifecycle state changed outside a move or placement.
    StateChanged {
        /// Unit.
        unit: EntityId,
        /// New state.
        state: LifeState,
    },
    /// A normal attack landed.
    HitLanded {
        /// Attacker.
        attacker: EntityId,
        /// Defender.
        target: EntityId,
        /// Damage dealt.
        damage: u32,
        /// Formula used.
        kind: DamageKind,
    },
    /// A combo effect damaged an enemy.
    ComboHit {
        /// Combo identifier.
        combo: String,
        /// Damaged enemy.
        target: EntityId,
        /// Damage dealt.
        damage: u32,
    },
    /// Burn ticked during the environment phase.
    BurnTick {
        /// Burning unit.
        unit: EntityId,
        /// Damage dealt.
        damage: u32,
    },
    /// A status effect was applied or refreshed.
    StatusApplied {
        /// Affected unit.
        unit: EntityId,
        /// Effect as applied.
        effect: StatusEffect,
    },
    /// A unit reached zero hp.
    UnitDied {
        /// Dead unit.
        unit: EntityId,
        /// Its template.
        archetype: ArchetypeId,
        /// Its side.
        faction: Faction,
    },
    /// A combo participant left the board.
    UnitSacrificed {
        /// Sacrificed unit.
        unit: EntityId,
        /// Cell it vacated, now carrying a residual marker.
        at: GridPoint,
    },
    /// The heat pool changed.
    HeatChanged {
        /// Previous value.
        from: u32,
        /// New value.
        to: u32,
    },
    /// A combo was triggered.
    ComboTriggered {
        /// Combo identifier.
        combo: String,
        /// Unit that started it.
        initiator: EntityId,
        /// Every participant, initiator first.
        participants: Vec<EntityId>,
        /// Target point, if any.
        target: Option<GridPoint>,
    },
    /// An enemy entered the board.
    EnemySpawned {
        /// New enemy.
        unit: EntityId,
        /// Its template.
        archetype: ArchetypeId,
        /// Cell it landed on.
        at: GridPoint,
    },
    /// The turn phase changed.
    PhaseChanged {
        /// Previous phase.
        from: Phase,
        /// New phase.
        to: Phase,
    },
    /// The turn counter advanced.
    TurnAdvanced {
        /// New turn number.
        turn: u32,
    },
    /// The game ended.
    GameOver {
        /// Win or loss.
        outcome: Outcome,
        /// Turn on which it ended.
        turn: u32,
    },
}

/// Callback invoked with every event as it is recorded.
pub type Observer = Box<dyn FnMut(&GameEvent) + Send>;

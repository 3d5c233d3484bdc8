//! Error types for the game simulation.
//!
//! Every command on [`Simulation`](crate::simulation::Simulation) returns a
//! [`Result`]. An `Err` means the command was rejected and no state was
//! touched, so callers that only care about the happy path may ignore it.

use thiserror::Error;

use crate::combo::MissingRequirement;
use crate::components::EntityId;
use crate::grid::GridPoint;
use crate::simulation::Phase;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game simulation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Command is not legal in the current phase.
    #[error("Command not allowed during {0:?}")]
    WrongPhase(Phase),

    /// A terminal outcome has been reached; the game accepts no more commands.
    #[error("Game is over")]
    GameOver,

    /// Invalid entity reference.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// Entity exists but cannot be controlled by the player.
    #[error("Entity {0} is not a controllable player unit")]
    NotControllable(EntityId),

    /// Unit is in the wrong lifecycle state or still cooling down.
    #[error("Unit {0} is not ready for this command")]
    UnitNotReady(EntityId),

    /// Destination cell is not a legal destination.
    #[error("Illegal destination {0}")]
    IllegalDestination(GridPoint),

    /// Target is not a valid attack target for this unit.
    #[error("Target {target} is not attackable by {attacker}")]
    InvalidTarget {
        /// Attacking unit.
        attacker: EntityId,
        /// Requested target.
        target: EntityId,
    },

    /// The field already holds the maximum number of deployed units.
    #[error("Field is full ({0} units deployed)")]
    FieldFull(usize),

    /// Unknown combo identifier.
    #[error("Unknown combo: {0}")]
    UnknownCombo(String),

    /// Unit's archetype is not one of the combo's ingredients.
    #[error("Unit {unit} cannot start combo {combo}")]
    NotAnIngredient {
        /// Would-be initiator.
        unit: EntityId,
        /// Combo identifier.
        combo: String,
    },

    /// Combo cannot be triggered right now.
    #[error("Combo {combo} unavailable: {missing:?}")]
    ComboUnavailable {
        /// Combo identifier.
        combo: String,
        /// Every unmet condition.
        missing: Vec<MissingRequirement>,
    },

    /// Combo needs a target point and none was given.
    #[error("Combo {0} requires a target point")]
    MissingTarget(String),

    /// Data file parsing error.
    #[error("Failed to parse {what}: {message}")]
    DataParseError {
        /// What was being parsed.
        what: String,
        /// Error message.
        message: String,
    },

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),
}

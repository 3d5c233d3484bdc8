//! The orchestrator: board, entity table and the turn-phase state machine.
//!
//! [`Simulation`] is the sole owner of the [`Board`] and the
//! [`EntityStorage`]. Every external command goes through it and returns a
//! [`Result`]; an `Err` means the command was rejected and nothing changed.
//!
//! # Determinism
//!
//! All operations in this module are fully deterministic:
//! - No floating-point math (uses fixed-point via [`crate::math`])
//! - No randomness at all
//! - Consistent iteration order (sorted entity IDs, row-major cells)
//! - Same commands always produce the same [`Simulation::state_hash`]
//!
//! # Example
//!
//! ```
//! use hearth_core::grid::GridPoint;
//! use hearth_core::simulation::{Phase, Simulation};
//!
//! let mut sim = Simulation::new();
//! let spots = [(4, 4), (4, 5), (4, 6), (4, 7)];
//! for (hero, (x, y)) in sim.roster()[..4].to_vec().into_iter().zip(spots) {
//!     sim.place_unit(hero, GridPoint::new(x, y)).unwrap();
//! }
//! assert_eq!(sim.phase(), Phase::PlayerMain);
//! assert_eq!(sim.turn(), 1);
//!
//! sim.end_player_turn().unwrap();
//! assert_eq!(sim.turn(), 2);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::combat::AttackReport;
use crate::components::{
    ArchetypeId, Combatant, EntityId, Faction, LifeState, StatusKind, DEFAULT_BURN_DAMAGE,
};
use crate::data::{GameData, SimConfig};
use crate::error::{GameError, Result};
use crate::events::{GameEvent, Observer};
use crate::grid::{in_deployment_zone, Board, GridPoint, BASE_POINTS};
use crate::math::percent_of;
use crate::pathfinding::{valid_attack_targets, valid_moves};

/// Turn phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Initial placement of the starting heroes.
    Deployment,
    /// The player issues commands until ending the turn.
    PlayerMain,
    /// Reserved for presentation layers; never entered by the core.
    UiLockdown,
    /// Enemies act one after another.
    EnemyResolve,
    /// Damage over time, cooldowns, regeneration, spawns and win/loss.
    Environment,
}

/// Terminal result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Every wave cleared with the base standing.
    Victory,
    /// The base fell.
    Defeat,
}

/// Storage for all combatants.
///
/// Uses a `HashMap` for O(1) lookup by ID, with deterministic iteration via
/// sorted keys. IDs are handed out in increasing order and never reused, so
/// sorted order is also creation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityStorage {
    /// Map of entity ID to combatant.
    entities: HashMap<EntityId, Combatant>,
    /// Next entity ID to assign.
    next_id: EntityId,
}

impl EntityStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            next_id: 1,
        }
    }

    /// Insert a combatant, assign it a fresh ID and return that ID.
    pub fn insert(&mut self, mut unit: Combatant) -> EntityId {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        unit.id = id;
        self.entities.insert(id, unit);
        id
    }

    /// Remove a combatant by ID.
    pub fn remove(&mut self, id: EntityId) -> Option<Combatant> {
        self.entities.remove(&id)
    }

    /// Get a combatant by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Combatant> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to a combatant by ID.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        self.entities.get_mut(&id)
    }

    /// Check if a combatant exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of combatants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if storage is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Get sorted IDs for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all combatants (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &Combatant)> {
        self.entities.iter()
    }
}

/// The core game simulation.
///
/// # Turn order
///
/// 1. **Deployment** - place heroes until the deployment size is reached
/// 2. **Player main** - move, attack, summon and trigger combos
/// 3. **Enemy resolve** - every enemy walks and attacks, in ID order
/// 4. **Environment** - burn, effect decay, resets, regeneration, residual
///    decay, turn advance, spawns, win/loss
///
/// Steps 2 to 4 repeat until a terminal [`Outcome`] is reached. After that
/// every state-changing command returns [`GameError::GameOver`].
pub struct Simulation {
    pub(crate) board: Board,
    pub(crate) entities: EntityStorage,
    pub(crate) data: GameData,
    pub(crate) base_id: EntityId,
    pub(crate) heat: u32,
    turn: u32,
    phase: Phase,
    outcome: Option<Outcome>,
    roster: Vec<EntityId>,
    events: Vec<GameEvent>,
    observer: Option<Observer>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("turn", &self.turn)
            .field("phase", &self.phase)
            .field("heat", &self.heat)
            .field("outcome", &self.outcome)
            .field("entities", &self.entities.len())
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Create a game on the shipped level.
    ///
    /// The base and the eight-hero roster are created, every hero benched,
    /// and the turn-0 wave is already on the board.
    #[must_use]
    pub fn new() -> Self {
        Self::with_data(GameData::default())
    }

    /// Create a game from custom data.
    #[must_use]
    pub fn with_data(data: GameData) -> Self {
        let heat = data.config.starting_heat.min(data.config.max_heat);
        let mut sim = Self {
            board: Board::new(),
            entities: EntityStorage::new(),
            data,
            base_id: 0,
            heat,
            turn: 0,
            phase: Phase::Deployment,
            outcome: None,
            roster: Vec::new(),
            events: Vec::new(),
            observer: None,
        };

        let mut base = sim.create(ArchetypeId::Base);
        base.state = LifeState::Idle;
        base.position = Some(BASE_POINTS[0]);
        sim.base_id = sim.entities.insert(base);
        for p in BASE_POINTS {
            sim.board.set_occupant(p, Some(sim.base_id));
        }

        for _ in 0..2 {
            for archetype in ArchetypeId::HEROES {
                let hero = sim.create(archetype);
                let id = sim.entities.insert(hero);
                sim.roster.push(id);
            }
        }

        sim.spawn_wave(0);
        tracing::info!(heroes = sim.roster.len(), heat = sim.heat, "Simulation created");
        sim
    }

    fn create(&self, archetype: ArchetypeId) -> Combatant {
        let template = self.data.archetypes.resolve(archetype);
        Combatant::new(
            0,
            template.id,
            template.faction,
            template.initial_stats(),
            template.capabilities,
            template.passive,
        )
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current turn number. 0 during deployment.
    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Current heat.
    #[must_use]
    pub const fn heat(&self) -> u32 {
        self.heat
    }

    /// Upper bound of the heat pool.
    #[must_use]
    pub fn max_heat(&self) -> u32 {
        self.data.config.max_heat
    }

    /// Terminal result, if reached.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Whether the game has been won.
    #[must_use]
    pub fn is_won(&self) -> bool {
        self.outcome == Some(Outcome::Victory)
    }

    /// Whether the game has been lost.
    #[must_use]
    pub fn is_lost(&self) -> bool {
        self.outcome == Some(Outcome::Defeat)
    }

    /// The board.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The entity table.
    #[must_use]
    pub fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Look up a combatant.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Combatant> {
        self.entities.get(id)
    }

    /// The base's entity ID.
    #[must_use]
    pub const fn base_id(&self) -> EntityId {
        self.base_id
    }

    /// The base.
    #[must_use]
    pub fn base(&self) -> Option<&Combatant> {
        self.entities.get(self.base_id)
    }

    /// Hero IDs in roster order.
    #[must_use]
    pub fn roster(&self) -> &[EntityId] {
        &self.roster
    }

    /// Tuning in use.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.data.config
    }

    /// Data the game was built from.
    #[must_use]
    pub fn data(&self) -> &GameData {
        &self.data
    }

    /// Heroes currently on the board, in ID order.
    #[must_use]
    pub fn deployed_heroes(&self) -> Vec<EntityId> {
        self.roster
            .iter()
            .copied()
            .filter(|id| self.entities.get(*id).is_some_and(Combatant::is_deployed))
            .collect()
    }

    /// Living enemies, in ID order.
    #[must_use]
    pub fn enemies(&self) -> Vec<EntityId> {
        self.entities
            .sorted_ids()
            .into_iter()
            .filter(|id| {
                self.entities
                    .get(*id)
                    .is_some_and(|u| u.faction == Faction::Enemy && u.is_alive())
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    /// Install a callback invoked with every event as it is recorded.
    pub fn set_observer<F>(&mut self, observer: F)
    where
        F: FnMut(&GameEvent) + Send + 'static,
    {
        self.observer = Some(Box::new(observer));
    }

    /// Remove the observer callback.
    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: GameEvent) {
        if let Some(observer) = self.observer.as_mut() {
            observer(&event);
        }
        self.events.push(event);
    }

    // ------------------------------------------------------------------
    // Heat
    // ------------------------------------------------------------------

    pub(crate) fn add_heat(&mut self, amount: u32) {
        let from = self.heat;
        self.heat = self.heat.saturating_add(amount).min(self.data.config.max_heat);
        if self.heat != from {
            self.emit(GameEvent::HeatChanged { from, to: self.heat });
        }
    }

    pub(crate) fn spend_heat(&mut self, amount: u32) {
        let from = self.heat;
        self.heat = self.heat.saturating_sub(amount);
        if self.heat != from {
            self.emit(GameEvent::HeatChanged { from, to: self.heat });
        }
    }

    /// Debug command: add heat, clamped to the maximum. Returns the new pool.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::GameOver`] once the game has ended.
    pub fn grant_heat(&mut self, amount: u32) -> Result<u32> {
        self.ensure_active()?;
        self.add_heat(amount);
        Ok(self.heat)
    }

    // ------------------------------------------------------------------
    // Guards
    // ------------------------------------------------------------------

    fn ensure_active(&self) -> Result<()> {
        if self.outcome.is_some() {
            Err(GameError::GameOver)
        } else {
            Ok(())
        }
    }

    pub(crate) fn ensure_phase(&self, phase: Phase) -> Result<()> {
        self.ensure_active()?;
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::WrongPhase(self.phase))
        }
    }

    /// A player-faction unit able to act this turn.
    fn ready_unit(&self, id: EntityId, allow_base: bool) -> Result<&Combatant> {
        let unit = self.entities.get(id).ok_or(GameError::EntityNotFound(id))?;
        let controllable = unit.is_hero() || (allow_base && unit.is_base());
        if !controllable {
            return Err(GameError::NotControllable(id));
        }
        if !unit.is_deployed() {
            return Err(GameError::UnitNotReady(id));
        }
        Ok(unit)
    }

    fn set_phase(&mut self, to: Phase) {
        let from = self.phase;
        if from == to {
            return;
        }
        self.phase = to;
        tracing::debug!(?from, ?to, turn = self.turn, "Phase changed");
        self.emit(GameEvent::PhaseChanged { from, to });
    }

    fn set_state(&mut self, id: EntityId, state: LifeState) {
        if let Some(unit) = self.entities.get_mut(id) {
            unit.state = state;
            if state != LifeState::Moved {
                unit.move_origin = None;
            }
        }
        self.emit(GameEvent::StateChanged { unit: id, state });
    }

    fn relocate(&mut self, id: EntityId, from: GridPoint, to: GridPoint) {
        self.board.set_occupant(from, None);
        self.board.set_occupant(to, Some(id));
        if let Some(unit) = self.entities.get_mut(id) {
            unit.position = Some(to);
        }
    }

    // ------------------------------------------------------------------
    // Placement
    // ------------------------------------------------------------------

    fn is_placement_spot(&self, p: GridPoint, deploying: bool) -> bool {
        if !self.board.in_bounds(p) || self.board.is_occupied(p) || self.board.is_base(p) {
            return false;
        }
        if in_deployment_zone(p) {
            return true;
        }
        if deploying {
            return false;
        }
        if self.board.residual(p) > 0 {
            return true;
        }
        self.board.neighbors(p).any(|n| {
            self.board
                .occupant(n)
                .and_then(|id| self.entities.get(id))
                .is_some_and(|u| u.is_hero() && u.is_deployed())
        })
    }

    /// Cells where a benched hero could be placed right now, row-major.
    /// Empty outside deployment and the player phase, or when the field is
    /// full.
    #[must_use]
    pub fn placement_spots(&self) -> Vec<GridPoint> {
        let deploying = match self.phase {
            Phase::Deployment => true,
            Phase::PlayerMain => false,
            _ => return Vec::new(),
        };
        if self.outcome.is_some()
            || (!deploying && self.deployed_heroes().len() >= self.data.config.field_cap)
        {
            return Vec::new();
        }
        self.board
            .cells()
            .map(|c| c.pos)
            .filter(|p| self.is_placement_spot(*p, deploying))
            .collect()
    }

    /// Place a benched hero on the board.
    ///
    /// During deployment the hero arrives IDLE anywhere in the deployment
    /// square, and deployment ends once enough heroes are placed. During the
    /// player phase the hero is summoned: the field cap applies, the cell
    /// must be in the square, next to a deployed hero or on a residual
    /// marker, and it arrives ACTIONED unless it consumed a marker.
    ///
    /// # Errors
    ///
    /// Rejected without changes on the wrong phase, an unknown or
    /// non-hero unit, a unit that is not benched and ready, a full field or
    /// an illegal cell.
    pub fn place_unit(&mut self, unit: EntityId, at: GridPoint) -> Result<()> {
        self.ensure_active()?;
        let deploying = match self.phase {
            Phase::Deployment => true,
            Phase::PlayerMain => false,
            other => return Err(GameError::WrongPhase(other)),
        };

        let hero = self.entities.get(unit).ok_or(GameError::EntityNotFound(unit))?;
        if !hero.is_hero() {
            return Err(GameError::NotControllable(unit));
        }
        if hero.state != LifeState::Benched || hero.cooldown > 0 {
            return Err(GameError::UnitNotReady(unit));
        }
        if !deploying {
            let deployed = self.deployed_heroes().len();
            if deployed >= self.data.config.field_cap {
                return Err(GameError::FieldFull(deployed));
            }
        }
        if !self.is_placement_spot(at, deploying) {
            return Err(GameError::IllegalDestination(at));
        }

        let consumed = !deploying && self.board.residual(at) > 0;
        if consumed {
            self.board.set_residual(at, 0);
        }
        let state = if deploying || consumed {
            LifeState::Idle
        } else {
            LifeState::Actioned
        };

        if let Some(hero) = self.entities.get_mut(unit) {
            hero.state = state;
            hero.position = Some(at);
            hero.move_origin = None;
        }
        self.board.set_occupant(at, Some(unit));
        tracing::debug!(unit, %at, ?state, consumed, "Unit placed");
        self.emit(GameEvent::UnitPlaced { unit, at, state });

        if deploying && self.deployed_heroes().len() >= self.data.config.deployment_size {
            self.turn = 1;
            self.set_phase(Phase::PlayerMain);
            tracing::info!(turn = self.turn, "Deployment complete");
            self.emit(GameEvent::TurnAdvanced { turn: self.turn });
        }

        self.validate();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Unit commands
    // ------------------------------------------------------------------

    /// Select an IDLE hero and list where it may move.
    ///
    /// # Errors
    ///
    /// Rejected outside the player phase or for units that cannot move now.
    pub fn select_unit(&self, unit: EntityId) -> Result<Vec<GridPoint>> {
        self.ensure_phase(Phase::PlayerMain)?;
        let hero = self.ready_unit(unit, false)?;
        if hero.state != LifeState::Idle {
            return Err(GameError::UnitNotReady(unit));
        }
        let Some(start) = hero.position else {
            return Err(GameError::UnitNotReady(unit));
        };
        Ok(valid_moves(
            &self.board,
            &self.entities,
            start,
            hero.effective_stats().move_range,
            Faction::Player,
            true,
        ))
    }

    /// Units the given player unit could attack right now.
    ///
    /// # Errors
    ///
    /// Rejected outside the player phase or for units that already acted.
    pub fn attack_targets(&self, unit: EntityId) -> Result<Vec<EntityId>> {
        self.ensure_phase(Phase::PlayerMain)?;
        let attacker = self.ready_unit(unit, true)?;
        if !matches!(attacker.state, LifeState::Idle | LifeState::Moved) {
            return Err(GameError::UnitNotReady(unit));
        }
        Ok(valid_attack_targets(&self.board, &self.entities, attacker))
    }

    /// Move an IDLE hero. Moving onto its own cell counts as staying put.
    /// Either way the unit becomes MOVED and remembers its origin.
    ///
    /// # Errors
    ///
    /// Rejected when the destination is not in [`select_unit`](Self::select_unit).
    pub fn move_unit(&mut self, unit: EntityId, to: GridPoint) -> Result<()> {
        let moves = self.select_unit(unit)?;
        let from = self
            .entities
            .get(unit)
            .and_then(|u| u.position)
            .ok_or(GameError::UnitNotReady(unit))?;

        if to != from {
            if !moves.contains(&to) {
                return Err(GameError::IllegalDestination(to));
            }
            self.relocate(unit, from, to);
            tracing::debug!(unit, %from, %to, "Unit moved");
            self.emit(GameEvent::UnitMoved { unit, from, to });
        }

        self.set_state(unit, LifeState::Moved);
        if let Some(hero) = self.entities.get_mut(unit) {
            hero.move_origin = Some(from);
        }
        self.validate();
        Ok(())
    }

    /// Undo a pending move and return the unit to IDLE.
    ///
    /// # Errors
    ///
    /// Rejected unless the unit is MOVED, or if its origin is now taken.
    pub fn cancel_move(&mut self, unit: EntityId) -> Result<()> {
        self.ensure_phase(Phase::PlayerMain)?;
        let hero = self.ready_unit(unit, false)?;
        let (Some(current), Some(origin), LifeState::Moved) =
            (hero.position, hero.move_origin, hero.state)
        else {
            return Err(GameError::UnitNotReady(unit));
        };
        if origin != current {
            if self.board.occupant(origin).is_some_and(|id| id != unit) {
                return Err(GameError::IllegalDestination(origin));
            }
            self.relocate(unit, current, origin);
        }

        tracing::debug!(unit, %origin, "Move cancelled");
        self.emit(GameEvent::MoveCancelled { unit, to: origin });
        self.set_state(unit, LifeState::Idle);
        self.validate();
        Ok(())
    }

    /// Attack a hostile unit. The attacker ends ACTIONED.
    ///
    /// The base may attack too, measuring range from its nearest cell.
    ///
    /// # Errors
    ///
    /// Rejected when the target is not in [`attack_targets`](Self::attack_targets).
    pub fn attack(&mut self, attacker: EntityId, target: EntityId) -> Result<AttackReport> {
        let targets = self.attack_targets(attacker)?;
        if !self.entities.contains(target) {
            return Err(GameError::EntityNotFound(target));
        }
        if !targets.contains(&target) {
            return Err(GameError::InvalidTarget { attacker, target });
        }
        let report = self.process_attack_resolution(attacker, target)?;
        self.emit(GameEvent::StateChanged {
            unit: attacker,
            state: LifeState::Actioned,
        });
        self.validate();
        Ok(report)
    }

    /// Finish a unit's turn without attacking.
    ///
    /// # Errors
    ///
    /// Rejected unless the unit is IDLE or MOVED.
    pub fn standby(&mut self, unit: EntityId) -> Result<()> {
        self.ensure_phase(Phase::PlayerMain)?;
        let hero = self.ready_unit(unit, true)?;
        if !matches!(hero.state, LifeState::Idle | LifeState::Moved) {
            return Err(GameError::UnitNotReady(unit));
        }
        self.set_state(unit, LifeState::Actioned);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Turn flow
    // ------------------------------------------------------------------

    /// End the player phase: enemies act, then the environment runs.
    ///
    /// # Errors
    ///
    /// Rejected outside the player phase and after the game has ended.
    pub fn end_player_turn(&mut self) -> Result<()> {
        self.ensure_phase(Phase::PlayerMain)?;

        // 1. Enemy resolution
        self.set_phase(Phase::EnemyResolve);
        self.resolve_enemy_turn();

        // 2. Environment
        self.set_phase(Phase::Environment);
        self.run_environment();

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(turn = self.turn, state_hash = hash, "Simulation state hash");
        }

        self.validate();
        Ok(())
    }

    fn run_environment(&mut self) {
        let ids = self.entities.sorted_ids();

        // 1. Burn, then effect decay for whoever survived it
        for &id in &ids {
            let Some(unit) = self.entities.get_mut(id) else {
                continue;
            };
            if !unit.is_alive() {
                continue;
            }
            if let Some(burn) = unit.status(StatusKind::Burn).copied() {
                let damage = burn
                    .magnitude
                    .filter(|m| *m > 0)
                    .unwrap_or(DEFAULT_BURN_DAMAGE);
                let died = unit.take_damage(damage);
                self.emit(GameEvent::BurnTick { unit: id, damage });
                if died {
                    self.handle_death(id);
                    continue;
                }
            }
            if let Some(unit) = self.entities.get_mut(id) {
                unit.tick_status_effects();
            }
        }

        // 2. Player resets, cooldowns and bench regeneration
        let heal_percent = self.data.config.bench_heal_percent;
        for &id in &ids {
            let Some(unit) = self.entities.get_mut(id) else {
                continue;
            };
            if unit.faction != Faction::Player {
                continue;
            }

            if unit.position.is_some() && matches!(unit.state, LifeState::Actioned | LifeState::Moved) {
                self.set_state(id, LifeState::Idle);
                continue;
            }

            if matches!(unit.state, LifeState::Benched | LifeState::Dead) {
                unit.cooldown = unit.cooldown.saturating_sub(1);
                let revived = unit.cooldown == 0 && unit.state == LifeState::Dead;
                if revived {
                    unit.state = LifeState::Benched;
                }
                if unit.stats.hp < unit.stats.max_hp {
                    let amount = percent_of(unit.stats.max_hp, heal_percent);
                    unit.restore_hp(amount);
                }
                if revived {
                    self.emit(GameEvent::StateChanged {
                        unit: id,
                        state: LifeState::Benched,
                    });
                }
            }
        }

        // 3. Residual markers
        self.board.decay_residuals();

        // 4. Advance and spawn
        self.turn += 1;
        tracing::info!(turn = self.turn, heat = self.heat, "Turn advanced");
        self.emit(GameEvent::TurnAdvanced { turn: self.turn });
        self.spawn_wave(self.turn);

        // 5. Win, then loss
        let base_hp = self.base().map_or(0, |b| b.stats.hp);
        if self.turn > self.data.config.final_wave_turn && self.enemies().is_empty() && base_hp > 0 {
            self.finish(Outcome::Victory);
        } else if base_hp == 0 {
            self.finish(Outcome::Defeat);
        } else {
            self.set_phase(Phase::PlayerMain);
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        self.outcome = Some(outcome);
        tracing::info!(?outcome, turn = self.turn, "Game over");
        self.emit(GameEvent::GameOver {
            outcome,
            turn: self.turn,
        });
    }

    /// Centralized death handling.
    ///
    /// Enemies leave the entity table and grant the kill bonus. Heroes go to
    /// DEAD with the death cooldown. The base stays in place; its loss is
    /// picked up by the environment phase.
    pub(crate) fn handle_death(&mut self, id: EntityId) {
        let cooldown = self.data.config.death_cooldown;
        let Some(unit) = self.entities.get(id) else {
            return;
        };
        let (archetype, faction, position) = (unit.archetype, unit.faction, unit.position);

        if archetype != ArchetypeId::Base {
            if let Some(at) = position {
                if self.board.occupant(at) == Some(id) {
                    self.board.set_occupant(at, None);
                }
            }
            match faction {
                Faction::Enemy => {
                    self.entities.remove(id);
                }
                Faction::Player => {
                    if let Some(hero) = self.entities.get_mut(id) {
                        hero.handle_death(cooldown);
                    }
                }
            }
        }

        tracing::debug!(id, ?archetype, ?faction, "Unit died");
        self.emit(GameEvent::UnitDied {
            unit: id,
            archetype,
            faction,
        });

        if faction == Faction::Enemy {
            self.add_heat(self.data.config.kill_heat);
        }
    }

    // ------------------------------------------------------------------
    // Determinism and validation
    // ------------------------------------------------------------------

    /// Calculate a hash of the current simulation state.
    ///
    /// Two simulations fed the same commands produce the same hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.turn.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.heat.hash(&mut hasher);
        self.outcome.hash(&mut hasher);

        // Entities in deterministic order
        let ids = self.entities.sorted_ids();
        ids.len().hash(&mut hasher);
        for id in ids {
            if let Some(unit) = self.entities.get(id) {
                id.hash(&mut hasher);
                unit.archetype.hash(&mut hasher);
                unit.stats.hash(&mut hasher);
                unit.state.hash(&mut hasher);
                unit.position.hash(&mut hasher);
                unit.cooldown.hash(&mut hasher);
                unit.status_effects.hash(&mut hasher);
                unit.move_origin.hash(&mut hasher);
            }
        }

        // Board
        for cell in self.board.cells() {
            cell.occupant.hash(&mut hasher);
            cell.residual_turns.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Verify the board/entity invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] describing the first violation.
    pub fn check_invariants(&self) -> Result<()> {
        let fail = |msg: String| Err(GameError::InvalidState(msg));

        if self.heat > self.data.config.max_heat {
            return fail(format!("heat {} above max", self.heat));
        }

        for p in BASE_POINTS {
            if self.board.occupant(p) != Some(self.base_id) {
                return fail(format!("base cell {p} not held by the base"));
            }
        }

        for cell in self.board.cells() {
            let Some(id) = cell.occupant else {
                continue;
            };
            let Some(unit) = self.entities.get(id) else {
                return fail(format!("cell {} holds unknown entity {id}", cell.pos));
            };
            if !unit.is_base() && unit.position != Some(cell.pos) {
                return fail(format!("cell {} holds {id} positioned at {:?}", cell.pos, unit.position));
            }
        }

        for (&id, unit) in self.entities.iter() {
            if unit.is_base() {
                continue;
            }
            if unit.position.is_some() != unit.state.is_deployed() {
                return fail(format!("entity {id} in {:?} with position {:?}", unit.state, unit.position));
            }
            if let Some(p) = unit.position {
                if self.board.occupant(p) != Some(id) {
                    return fail(format!("entity {id} at {p} not on the board"));
                }
            }
            for (i, effect) in unit.status_effects.iter().enumerate() {
                if unit.status_effects[..i].iter().any(|e| e.kind == effect.kind) {
                    return fail(format!("entity {id} holds {:?} twice", effect.kind));
                }
            }
        }

        Ok(())
    }

    #[allow(clippy::unused_self)]
    fn validate(&self) {
        #[cfg(feature = "debug-validation")]
        {
            if let Err(err) = self.check_invariants() {
                tracing::error!(%err, turn = self.turn, "Invariant violated");
            }
        }
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{StatusEffect, Stats};
    use crate::data::SpawnSchedule;

    fn quiet() -> Simulation {
        Simulation::with_data(GameData {
            schedule: SpawnSchedule::empty(),
            ..GameData::default()
        })
    }

    fn deploy(sim: &mut Simulation) -> Vec<EntityId> {
        let heroes = sim.roster()[..4].to_vec();
        let spots = [(4, 4), (4, 5), (4, 6), (4, 7)];
        for (&hero, (x, y)) in heroes.iter().zip(spots) {
            sim.place_unit(hero, GridPoint::new(x, y)).unwrap();
        }
        heroes
    }

    #[test]
    fn test_simulation_new() {
        let sim = Simulation::new();
        assert_eq!(sim.turn(), 0);
        assert_eq!(sim.phase(), Phase::Deployment);
        assert_eq!(sim.heat(), 30);
        assert_eq!(sim.roster().len(), 8);
        // Turn-0 wave is on the board
        assert_eq!(sim.enemies().len(), 2);
        for &id in sim.roster() {
            assert_eq!(sim.get(id).unwrap().state, LifeState::Benched);
        }
        sim.check_invariants().unwrap();
    }

    #[test]
    fn test_deployment_ends_after_four() {
        let mut sim = quiet();
        let heroes = sim.roster()[..3].to_vec();
        for (i, hero) in heroes.into_iter().enumerate() {
            sim.place_unit(hero, GridPoint::new(4, 4 + i as i32)).unwrap();
            assert_eq!(sim.phase(), Phase::Deployment);
        }
        let fourth = sim.roster()[3];
        sim.place_unit(fourth, GridPoint::new(7, 7)).unwrap();
        assert_eq!(sim.phase(), Phase::PlayerMain);
        assert_eq!(sim.turn(), 1);
    }

    #[test]
    fn test_deployment_rejects_outside_zone_and_base() {
        let mut sim = quiet();
        let hero = sim.roster()[0];
        assert_eq!(
            sim.place_unit(hero, GridPoint::new(3, 4)),
            Err(GameError::IllegalDestination(GridPoint::new(3, 4)))
        );
        assert_eq!(
            sim.place_unit(hero, GridPoint::new(5, 5)),
            Err(GameError::IllegalDestination(GridPoint::new(5, 5)))
        );
        assert_eq!(sim.placement_spots().len(), 12);
        assert!(sim.drain_events().is_empty());
    }

    #[test]
    fn test_commands_rejected_in_wrong_phase() {
        let mut sim = quiet();
        assert_eq!(sim.end_player_turn(), Err(GameError::WrongPhase(Phase::Deployment)));
        let hero = sim.roster()[0];
        assert!(matches!(sim.select_unit(hero), Err(GameError::WrongPhase(_))));
    }

    #[test]
    fn test_move_and_cancel() {
        let mut sim = quiet();
        let heroes = deploy(&mut sim);
        let potato = heroes[0];
        let to = GridPoint::new(3, 4);
        assert!(sim.select_unit(potato).unwrap().contains(&to));

        sim.move_unit(potato, to).unwrap();
        assert_eq!(sim.get(potato).unwrap().state, LifeState::Moved);
        assert_eq!(sim.board().occupant(to), Some(potato));
        // Cannot move twice
        assert_eq!(sim.move_unit(potato, GridPoint::new(2, 4)), Err(GameError::UnitNotReady(potato)));

        sim.cancel_move(potato).unwrap();
        let unit = sim.get(potato).unwrap();
        assert_eq!(unit.state, LifeState::Idle);
        assert_eq!(unit.position, Some(GridPoint::new(4, 4)));
        assert!(!sim.board().is_occupied(to));
        sim.check_invariants().unwrap();
    }

    #[test]
    fn test_stay_in_place_counts_as_move() {
        let mut sim = quiet();
        let heroes = deploy(&mut sim);
        sim.move_unit(heroes[1], GridPoint::new(4, 5)).unwrap();
        let unit = sim.get(heroes[1]).unwrap();
        assert_eq!(unit.state, LifeState::Moved);
        assert_eq!(unit.move_origin, Some(GridPoint::new(4, 5)));
    }

    #[test]
    fn test_standby_and_reset() {
        let mut sim = quiet();
        let heroes = deploy(&mut sim);
        sim.standby(heroes[0]).unwrap();
        assert_eq!(sim.get(heroes[0]).unwrap().state, LifeState::Actioned);
        assert_eq!(sim.standby(heroes[0]), Err(GameError::UnitNotReady(heroes[0])));
        sim.end_player_turn().unwrap();
        assert_eq!(sim.get(heroes[0]).unwrap().state, LifeState::Idle);
        assert_eq!(sim.turn(), 2);
    }

    #[test]
    fn test_heat_is_clamped() {
        let mut sim = quiet();
        assert_eq!(sim.grant_heat(500).unwrap(), 100);
        sim.spend_heat(250);
        assert_eq!(sim.heat(), 0);
    }

    #[test]
    fn test_burn_kills_and_skips_decay() {
        let mut sim = quiet();
        deploy(&mut sim);
        let base = sim.base_id();
        let slime = {
            let mut unit = sim.create(ArchetypeId::Slime);
            unit.state = LifeState::Idle;
            unit.position = Some(GridPoint::new(0, 11));
            unit.stats.hp = 10;
            unit.add_status_effect(StatusEffect::new(StatusKind::Burn, 2, 15));
            let id = sim.entities.insert(unit);
            sim.board.set_occupant(GridPoint::new(0, 11), Some(id));
            id
        };
        sim.end_player_turn().unwrap();
        assert!(sim.get(slime).is_none());
        assert_eq!(sim.heat(), 45);
        assert!(sim.get(base).is_some());
    }

    #[test]
    fn test_observer_sees_every_event() {
        use std::sync::{Arc, Mutex};

        let mut sim = quiet();
        let seen = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&seen);
        sim.set_observer(move |_| *counter.lock().unwrap() += 1);
        sim.drain_events();
        deploy(&mut sim);
        let drained = sim.drain_events();
        assert_eq!(*seen.lock().unwrap(), drained.len());
        assert!(drained.contains(&GameEvent::TurnAdvanced { turn: 1 }));
    }

    #[test]
    fn test_deterministic_hash() {
        let mut a = Simulation::new();
        let mut b = Simulation::new();
        deploy(&mut a);
        deploy(&mut b);
        for _ in 0..3 {
            a.end_player_turn().unwrap();
            b.end_player_turn().unwrap();
        }
        assert_eq!(a.state_hash(), b.state_hash());

        a.grant_heat(1).unwrap();
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn test_storage_ids_are_monotonic() {
        let mut storage = EntityStorage::new();
        let unit = Combatant::new(
            42,
            ArchetypeId::Slime,
            Faction::Enemy,
            Stats::new(1, 1, 0, 0, 0, 1, 1),
            crate::components::Capabilities::default(),
            None,
        );
        let a = storage.insert(unit.clone());
        let b = storage.insert(unit);
        assert!(b > a);
        storage.remove(a);
        assert_eq!(storage.sorted_ids(), vec![b]);
        assert_eq!(storage.get(b).unwrap().id, b);
    }
}

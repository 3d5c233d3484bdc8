//! Connectivity-gated combos.
//!
//! A combo needs a multiset of hero archetypes standing in one orthogonal
//! chain, plus enough heat. Discovery runs in three passes:
//!
//! 1. Flood fill from the initiator through occupied cells. Only heroes
//!    extend the fill; enemies and the base are visited but stop it.
//! 2. Greedy match of the remaining ingredients against the group, in
//!    discovery order.
//! 3. A strict check that the chosen participants are connected using only
//!    direct adjacency among themselves.
//!
//! Triggering spends heat, runs the combo's [`EffectScript`] and then
//! sacrifices every participant, whether or not the effect connected.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;

use crate::combat::{calculate_damage, DamageKind};
use crate::components::{
    ArchetypeId, Combatant, EntityId, Faction, LifeState, Stats, StatusEffect,
};
use crate::data::{ComboData, EffectScript, OffenseStat, TargetMode};
use crate::error::{GameError, Result};
use crate::events::GameEvent;
use crate::grid::{Board, GridPoint};
use crate::simulation::{EntityStorage, Phase, Simulation};

/// A reason a combo cannot be triggered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MissingRequirement {
    /// No unused adjacent hero of this archetype.
    Ingredient {
        /// Archetype still needed.
        archetype: ArchetypeId,
    },
    /// Participants were found but do not touch each other directly.
    Disconnected,
    /// Not enough heat.
    InsufficientHeat {
        /// Combo cost.
        required: u32,
        /// Current pool.
        available: u32,
    },
}

/// Whether a combo can fire for an initiator, and why not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComboAvailability {
    /// Combo identifier.
    pub combo: String,
    /// Display name.
    pub name: String,
    /// Heat cost.
    pub heat_cost: u32,
    /// Matched participants, initiator first. Partial when ingredients are
    /// missing.
    pub participants: Vec<EntityId>,
    /// True iff `missing` is empty.
    pub available: bool,
    /// Every unmet condition.
    pub missing: Vec<MissingRequirement>,
}

/// Heroes reachable from `start` through occupied cells, in discovery order.
///
/// The first entry is the hero at `start` when there is one.
#[must_use]
pub fn connected_group(board: &Board, entities: &EntityStorage, start: GridPoint) -> Vec<EntityId> {
    let mut group = Vec::new();
    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let hero = board
            .occupant(current)
            .and_then(|id| entities.get(id))
            .filter(|unit| unit.is_hero());
        let Some(hero) = hero else {
            continue;
        };
        group.push(hero.id);

        for next in board.neighbors(current) {
            if board.is_occupied(next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    group
}

/// Whether a set of cells forms one component under orthogonal adjacency.
#[must_use]
pub fn participants_connected(positions: &[GridPoint]) -> bool {
    let Some(&first) = positions.first() else {
        return true;
    };
    let members: HashSet<GridPoint> = positions.iter().copied().collect();
    let mut visited = HashSet::from([first]);
    let mut queue = VecDeque::from([first]);

    while let Some(current) = queue.pop_front() {
        for next in current.neighbors() {
            if members.contains(&next) && visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    visited.len() == members.len()
}

/// Evaluate one combo for an initiator. Pure over board, entities and heat.
#[must_use]
pub fn check_combo(
    board: &Board,
    entities: &EntityStorage,
    heat: u32,
    initiator: &Combatant,
    combo: &ComboData,
) -> ComboAvailability {
    let mut participants = vec![initiator.id];
    let mut missing = Vec::new();

    if let Some(start) = initiator.position {
        let group = connected_group(board, entities, start);

        let mut remaining = combo.ingredients.clone();
        if let Some(idx) = remaining.iter().position(|a| *a == initiator.archetype) {
            remaining.remove(idx);
        }

        for archetype in remaining {
            let found = group.iter().copied().find(|id| {
                !participants.contains(id)
                    && entities.get(*id).is_some_and(|u| u.archetype == archetype)
            });
            match found {
                Some(id) => participants.push(id),
                None => missing.push(MissingRequirement::Ingredient { archetype }),
            }
        }

        if missing.is_empty() && participants.len() > 1 {
            let positions: Vec<GridPoint> = participants
                .iter()
                .filter_map(|id| entities.get(*id).and_then(|u| u.position))
                .collect();
            if positions.len() != participants.len() || !participants_connected(&positions) {
                missing.push(MissingRequirement::Disconnected);
            }
        }
    } else {
        missing.push(MissingRequirement::Disconnected);
    }

    if heat < combo.heat_cost {
        missing.push(MissingRequirement::InsufficientHeat {
            required: combo.heat_cost,
            available: heat,
        });
    }

    ComboAvailability {
        combo: combo.id.clone(),
        name: combo.name.clone(),
        heat_cost: combo.heat_cost,
        participants,
        available: missing.is_empty(),
        missing,
    }
}

/// Cells covered by a combo aimed at `target`, in row-major order.
#[must_use]
pub fn footprint(board: &Board, combo: &ComboData, target: Option<GridPoint>) -> Vec<GridPoint> {
    let all = board.cells().map(|c| c.pos);
    match (combo.target_mode, &combo.effect, target) {
        (TargetMode::Global, _, _) => all.collect(),
        (_, _, None) => Vec::new(),
        (TargetMode::SingleTarget, _, Some(t)) | (_, EffectScript::DoubleHit { .. }, Some(t)) => {
            if board.in_bounds(t) {
                vec![t]
            } else {
                Vec::new()
            }
        }
        (TargetMode::Footprint, EffectScript::AreaDamage { shape, radius, .. }, Some(t)) => {
            all.filter(|p| shape.distance(t, *p) <= *radius).collect()
        }
    }
}

/// Cells within cast range of at least one participant, in row-major order.
#[must_use]
pub fn target_points(board: &Board, participants: &[GridPoint], cast_range: u32) -> Vec<GridPoint> {
    board
        .cells()
        .map(|c| c.pos)
        .filter(|p| participants.iter().any(|q| q.manhattan(*p) <= cast_range))
        .collect()
}

impl Simulation {
    /// Combos the initiator takes part in, with availability.
    ///
    /// # Errors
    ///
    /// Fails if the unit is missing, is not a hero, or is off the board.
    pub fn available_combos(&self, initiator: EntityId) -> Result<Vec<ComboAvailability>> {
        let unit = self.deployed_hero(initiator)?;
        Ok(self
            .data
            .combos
            .iter()
            .filter(|combo| combo.uses(unit.archetype))
            .map(|combo| check_combo(&self.board, &self.entities, self.heat, unit, combo))
            .collect())
    }

    /// Availability of one combo for an initiator.
    ///
    /// # Errors
    ///
    /// Fails on an unknown combo, a non-ingredient initiator, or the same
    /// unit checks as [`available_combos`](Self::available_combos).
    pub fn combo_availability(&self, initiator: EntityId, combo_id: &str) -> Result<ComboAvailability> {
        let unit = self.deployed_hero(initiator)?;
        let combo = self.combo(combo_id)?;
        if !combo.uses(unit.archetype) {
            return Err(GameError::NotAnIngredient {
                unit: initiator,
                combo: combo_id.to_string(),
            });
        }
        Ok(check_combo(&self.board, &self.entities, self.heat, unit, combo))
    }

    /// Points the combo could be aimed at from the initiator's current group.
    /// Empty for global combos.
    ///
    /// # Errors
    ///
    /// Same as [`combo_availability`](Self::combo_availability).
    pub fn combo_target_points(&self, initiator: EntityId, combo_id: &str) -> Result<Vec<GridPoint>> {
        let availability = self.combo_availability(initiator, combo_id)?;
        let combo = self.combo(combo_id)?;
        if !combo.target_mode.needs_target() {
            return Ok(Vec::new());
        }
        let positions: Vec<GridPoint> = availability
            .participants
            .iter()
            .filter_map(|id| self.entities.get(*id).and_then(|u| u.position))
            .collect();
        Ok(target_points(&self.board, &positions, combo.cast_range))
    }

    /// Cells a combo aimed at `target` would cover.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownCombo`] for an unknown id.
    pub fn combo_footprint(&self, combo_id: &str, target: Option<GridPoint>) -> Result<Vec<GridPoint>> {
        let combo = self.combo(combo_id)?;
        Ok(footprint(&self.board, combo, target))
    }

    /// Trigger a combo.
    ///
    /// Participants are resolved from the initiator's current group. Heat is
    /// spent even when the target point is out of cast range, in which case
    /// the effect does nothing. Every participant is sacrificed afterwards.
    ///
    /// # Errors
    ///
    /// Rejected without changes when the game is over, outside the player
    /// phase, when the initiator cannot act, when the combo is unknown or
    /// unavailable, or when a required target point is absent or off the
    /// board.
    pub fn trigger_combo(
        &mut self,
        initiator: EntityId,
        combo_id: &str,
        target: Option<GridPoint>,
    ) -> Result<()> {
        self.ensure_phase(Phase::PlayerMain)?;
        let unit = self.deployed_hero(initiator)?;
        if !matches!(unit.state, LifeState::Idle | LifeState::Moved) {
            return Err(GameError::UnitNotReady(initiator));
        }

        let availability = self.combo_availability(initiator, combo_id)?;
        if !availability.available {
            return Err(GameError::ComboUnavailable {
                combo: combo_id.to_string(),
                missing: availability.missing,
            });
        }

        let combo = self.combo(combo_id)?.clone();
        if combo.target_mode.needs_target() {
            match target {
                None => return Err(GameError::MissingTarget(combo_id.to_string())),
                Some(t) if !self.board.in_bounds(t) => {
                    return Err(GameError::IllegalDestination(t));
                }
                Some(_) => {}
            }
        }
        let target = if combo.target_mode.needs_target() {
            target
        } else {
            None
        };

        let participants = availability.participants;
        self.spend_heat(combo.heat_cost);

        tracing::debug!(combo = %combo.id, initiator, ?participants, ?target, "Combo triggered");
        self.emit(GameEvent::ComboTriggered {
            combo: combo.id.clone(),
            initiator,
            participants: participants.clone(),
            target,
        });

        let in_range = match target {
            None => true,
            Some(t) => participants.iter().any(|id| {
                self.entities
                    .get(*id)
                    .and_then(|u| u.position)
                    .is_some_and(|p| p.manhattan(t) <= combo.cast_range)
            }),
        };

        if in_range {
            self.run_combo_effect(&combo, &participants, target);
        } else {
            tracing::debug!(combo = %combo.id, "Target out of cast range, effect skipped");
        }

        for id in participants {
            self.sacrifice(id);
        }

        Ok(())
    }

    fn combo(&self, combo_id: &str) -> Result<&ComboData> {
        self.data
            .combos
            .get(combo_id)
            .ok_or_else(|| GameError::UnknownCombo(combo_id.to_string()))
    }

    fn deployed_hero(&self, id: EntityId) -> Result<&Combatant> {
        let unit = self.entities.get(id).ok_or(GameError::EntityNotFound(id))?;
        if !unit.is_hero() {
            return Err(GameError::NotControllable(id));
        }
        if !unit.is_deployed() {
            return Err(GameError::UnitNotReady(id));
        }
        Ok(unit)
    }

    /// Enemies standing inside a combo's footprint, in id order.
    fn enemies_in(&self, cells: &[GridPoint]) -> Vec<EntityId> {
        let cells: HashSet<GridPoint> = cells.iter().copied().collect();
        self.entities
            .sorted_ids()
            .into_iter()
            .filter(|id| {
                self.entities.get(*id).is_some_and(|u| {
                    u.faction == Faction::Enemy && u.position.is_some_and(|p| cells.contains(&p))
                })
            })
            .collect()
    }

    fn run_combo_effect(&mut self, combo: &ComboData, participants: &[EntityId], target: Option<GridPoint>) {
        let stats: Vec<(ArchetypeId, Stats)> = participants
            .iter()
            .filter_map(|id| self.entities.get(*id))
            .map(|u| (u.archetype, u.effective_stats()))
            .collect();

        match &combo.effect {
            EffectScript::AreaDamage {
                scaling,
                kind,
                coefficient,
                on_survivor,
                ..
            } => {
                let total: u32 = stats
                    .iter()
                    .map(|(_, s)| match scaling {
                        OffenseStat::Physical => s.phys_atk,
                        OffenseStat::Magic => s.mag_atk,
                    })
                    .sum();
                let mut pooled = Stats::new(0, 0, 0, 0, 0, 0, 0);
                match scaling {
                    OffenseStat::Physical => pooled.phys_atk = total,
                    OffenseStat::Magic => pooled.mag_atk = total,
                }

                let cells = footprint(&self.board, combo, target);
                for enemy in self.enemies_in(&cells) {
                    let Some(defender) = self.entities.get(enemy).map(Combatant::effective_stats) else {
                        continue;
                    };
                    let damage = calculate_damage(&pooled, &defender, *kind, *coefficient, 0);
                    self.combo_hit(&combo.id, enemy, damage, *on_survivor);
                }
            }
            EffectScript::DoubleHit {
                physical_from,
                magic_from,
                coefficient,
                on_survivor,
            } => {
                let Some(point) = target else {
                    return;
                };
                let Some(enemy) = self.board.occupant(point).filter(|id| {
                    self.entities
                        .get(*id)
                        .is_some_and(|u| u.faction == Faction::Enemy && u.position.is_some())
                }) else {
                    return;
                };
                let Some(defender) = self.entities.get(enemy).map(Combatant::effective_stats) else {
                    return;
                };
                let Some(&(_, fallback)) = stats.first() else {
                    return;
                };
                let pick = |wanted: ArchetypeId| {
                    stats
                        .iter()
                        .find(|(a, _)| *a == wanted)
                        .map_or(fallback, |(_, s)| *s)
                };

                let physical = calculate_damage(
                    &pick(*physical_from),
                    &defender,
                    DamageKind::Physical,
                    *coefficient,
                    0,
                );
                let magic =
                    calculate_damage(&pick(*magic_from), &defender, DamageKind::Magic, *coefficient, 0);
                self.combo_hit(&combo.id, enemy, physical + magic, *on_survivor);
            }
        }
    }

    fn combo_hit(
        &mut self,
        combo: &str,
        enemy: EntityId,
        damage: u32,
        on_survivor: Option<StatusEffect>,
    ) {
        let Some(unit) = self.entities.get_mut(enemy) else {
            return;
        };
        let killed = unit.take_damage(damage);
        let survived = unit.is_alive();
        if survived {
            if let Some(effect) = on_survivor {
                unit.add_status_effect(effect);
            }
        }

        self.emit(GameEvent::ComboHit {
            combo: combo.to_string(),
            target: enemy,
            damage,
        });
        if killed {
            self.handle_death(enemy);
        } else if let (true, Some(effect)) = (survived, on_survivor) {
            self.emit(GameEvent::StatusApplied {
                unit: enemy,
                effect,
            });
        }
    }

    /// Take a participant off the board, leaving a residual marker behind.
    fn sacrifice(&mut self, id: EntityId) {
        let residual = self.data.config.residual_turns;
        let cooldown = self.data.config.death_cooldown;
        let Some(unit) = self.entities.get_mut(id) else {
            return;
        };
        let vacated = unit.position;
        unit.handle_death(cooldown);

        if let Some(at) = vacated {
            self.board.set_occupant(at, None);
            self.board.set_residual(at, residual);
            tracing::debug!(id, %at, "Participant sacrificed");
            self.emit(GameEvent::UnitSacrificed { unit: id, at });
        }
    }
}

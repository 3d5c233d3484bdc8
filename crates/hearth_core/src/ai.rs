//! Enemy decision engine.
//!
//! Each enemy picks an objective, walks greedily toward it and then attacks
//! if anything is in range. Enemies act one at a time in spawn order and
//! every step is applied to the board immediately, so later enemies see the
//! results of earlier ones.

use crate::components::{AiTrait, Combatant, EntityId, Faction, LifeState};
use crate::events::GameEvent;
use crate::grid::{Board, GridPoint, DIRECTIONS};
use crate::pathfinding::{footprint_distance, valid_attack_targets};
use crate::simulation::{EntityStorage, Simulation};

/// Upper bound on walk steps regardless of move range.
pub const MAX_WALK_STEPS: u32 = 20;

/// What an enemy is heading for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Objective {
    /// Unit to attack on arrival.
    pub target: EntityId,
    /// Cell to walk toward.
    pub point: GridPoint,
}

/// Pick an enemy's objective.
///
/// Hunters chase the deployed hero with the lowest current hp, first found
/// in id order on ties. Everyone else, and hunters with no prey, heads for
/// the nearest base cell.
#[must_use]
pub fn choose_objective(
    board: &Board,
    entities: &EntityStorage,
    enemy: &Combatant,
    base: EntityId,
) -> Option<Objective> {
    let origin = enemy.position?;

    if enemy.capabilities.ai_trait == AiTrait::Hunter {
        let mut prey: Option<(u32, Objective)> = None;
        for id in entities.sorted_ids() {
            let Some(unit) = entities.get(id) else {
                continue;
            };
            let Some(point) = unit.position else {
                continue;
            };
            if !unit.is_hero() || !unit.is_alive() || !unit.is_deployed() {
                continue;
            }
            if prey.map_or(true, |(hp, _)| unit.stats.hp < hp) {
                prey = Some((unit.stats.hp, Objective { target: id, point }));
            }
        }
        if let Some((_, objective)) = prey {
            return Some(objective);
        }
    }

    let mut nearest: Option<(u32, GridPoint)> = None;
    for &p in board.base_points() {
        let dist = origin.manhattan(p);
        if nearest.map_or(true, |(best, _)| dist < best) {
            nearest = Some((dist, p));
        }
    }
    nearest.map(|(_, point)| Objective {
        target: base,
        point,
    })
}

/// Outcome of one greedy step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Move onto a free cell.
    Advance(GridPoint),
    /// A player unit stands in the way.
    Blocked(EntityId),
    /// No improving cell is available.
    Stuck,
}

/// Choose the next step from `from` toward `goal`.
///
/// Candidates are in-bounds neighbors strictly closer to the goal, nearest
/// first and then in direction order. Cells held by other enemies are
/// skipped.
fn next_step(board: &Board, entities: &EntityStorage, from: GridPoint, goal: GridPoint) -> Step {
    let current = from.manhattan(goal);
    let mut candidates: Vec<(u32, GridPoint)> = DIRECTIONS
        .iter()
        .map(|&(dx, dy)| from.offset(dx, dy))
        .filter(|p| board.in_bounds(*p))
        .map(|p| (p.manhattan(goal), p))
        .filter(|(dist, _)| *dist < current)
        .collect();
    candidates.sort_by_key(|(dist, _)| *dist);

    for (_, cell) in candidates {
        match board.occupant(cell) {
            None => return Step::Advance(cell),
            Some(id) => {
                let blocker = entities.get(id).map(|u| u.faction);
                if blocker == Some(Faction::Player) {
                    return Step::Blocked(id);
                }
            }
        }
    }
    Step::Stuck
}

impl Simulation {
    /// Run every living, positioned enemy once, in id order.
    pub(crate) fn resolve_enemy_turn(&mut self) {
        let roster: Vec<EntityId> = self
            .entities
            .sorted_ids()
            .into_iter()
            .filter(|id| {
                self.entities.get(*id).is_some_and(|u| {
                    u.faction == Faction::Enemy && u.is_alive() && u.position.is_some()
                })
            })
            .collect();

        tracing::debug!(enemies = roster.len(), "Resolving enemy turn");

        for id in roster {
            // May have died to an earlier enemy's actions
            let ready = self
                .entities
                .get(id)
                .is_some_and(|u| u.is_alive() && u.position.is_some());
            if ready {
                self.act_enemy(id);
            }
        }
    }

    fn act_enemy(&mut self, id: EntityId) {
        let Some(enemy) = self.entities.get(id) else {
            return;
        };
        let Some(mut pos) = enemy.position else {
            return;
        };
        let stats = enemy.effective_stats();
        let Some(objective) = choose_objective(&self.board, &self.entities, enemy, self.base_id)
        else {
            return;
        };
        let mut target = objective.target;

        // 1. Greedy walk
        for _ in 0..stats.move_range.min(MAX_WALK_STEPS) {
            if pos == objective.point {
                break;
            }
            match next_step(&self.board, &self.entities, pos, objective.point) {
                Step::Advance(next) => {
                    self.board.set_occupant(pos, None);
                    self.board.set_occupant(next, Some(id));
                    if let Some(unit) = self.entities.get_mut(id) {
                        unit.position = Some(next);
                    }
                    tracing::trace!(id, from = %pos, to = %next, "Enemy step");
                    self.emit(GameEvent::UnitMoved {
                        unit: id,
                        from: pos,
                        to: next,
                    });
                    pos = next;
                }
                Step::Blocked(blocker) => {
                    target = blocker;
                    break;
                }
                Step::Stuck => break,
            }
        }

        // 2. Attack the objective, else whatever is in range
        let reachable = self.entities.get(target).is_some_and(|unit| {
            let present = unit.is_base() || unit.is_deployed();
            present
                && unit.is_alive()
                && footprint_distance(&self.board, unit, pos).is_some_and(|d| d <= stats.attack_range)
        });

        let victim = if reachable {
            Some(target)
        } else {
            self.entities
                .get(id)
                .and_then(|enemy| valid_attack_targets(&self.board, &self.entities, enemy).first().copied())
        };

        if let Some(victim) = victim {
            if let Err(err) = self.process_attack_resolution(id, victim) {
                tracing::warn!(id, victim, %err, "Enemy attack failed");
            }
        }

        if let Some(unit) = self.entities.get_mut(id) {
            unit.state = LifeState::Actioned;
        }
        self.emit(GameEvent::StateChanged {
            unit: id,
            state: LifeState::Actioned,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ArchetypeId, Capabilities, Stats};
    use crate::grid::BASE_POINTS;

    fn unit(archetype: ArchetypeId, faction: Faction, trait_: AiTrait) -> Combatant {
        let mut unit = Combatant::new(
            0,
            archetype,
            faction,
            Stats::new(50, 10, 0, 0, 0, 2, 1),
            Capabilities {
                ai_trait: trait_,
                ..Capabilities::default()
            },
            None,
        );
        unit.state = LifeState::Idle;
        unit
    }

    fn put(board: &mut Board, entities: &mut EntityStorage, mut u: Combatant, at: GridPoint) -> EntityId {
        u.position = Some(at);
        let id = entities.insert(u);
        board.set_occupant(at, Some(id));
        id
    }

    #[test]
    fn test_default_targets_nearest_base_cell() {
        let mut board = Board::new();
        let mut entities = EntityStorage::new();
        let slime = put(
            &mut board,
            &mut entities,
            unit(ArchetypeId::Slime, Faction::Enemy, AiTrait::Default),
            GridPoint::new(6, 11),
        );
        let enemy = entities.get(slime).unwrap().clone();
        let objective = choose_objective(&board, &entities, &enemy, 99).unwrap();
        assert_eq!(objective.target, 99);
        assert_eq!(objective.point, GridPoint::new(6, 6));
    }

    #[test]
    fn test_hunter_picks_lowest_hp_first_on_ties() {
        let mut board = Board::new();
        let mut entities = EntityStorage::new();
        let mut weak = unit(ArchetypeId::Tomato, Faction::Player, AiTrait::Default);
        weak.stats.hp = 20;
        let mut tie = unit(ArchetypeId::Potato, Faction::Player, AiTrait::Default);
        tie.stats.hp = 20;
        let first = put(&mut board, &mut entities, weak, GridPoint::new(1, 1));
        put(&mut board, &mut entities, tie, GridPoint::new(2, 2));
        let hunter = put(
            &mut board,
            &mut entities,
            unit(ArchetypeId::Assassin, Faction::Enemy, AiTrait::Hunter),
            GridPoint::new(10, 10),
        );
        let enemy = entities.get(hunter).unwrap().clone();
        let objective = choose_objective(&board, &entities, &enemy, 99).unwrap();
        assert_eq!(objective.target, first);
        assert_eq!(objective.point, GridPoint::new(1, 1));
    }

    #[test]
    fn test_hunter_without_prey_goes_for_base() {
        let board = Board::new();
        let mut entities = EntityStorage::new();
        let mut hunter = unit(ArchetypeId::Assassin, Faction::Enemy, AiTrait::Hunter);
        hunter.position = Some(GridPoint::new(11, 2));
        let id = entities.insert(hunter);
        let enemy = entities.get(id).unwrap().clone();
        let objective = choose_objective(&board, &entities, &enemy, 99).unwrap();
        assert_eq!(objective.target, 99);
        assert_eq!(objective.point, GridPoint::new(6, 5));
    }

    #[test]
    fn test_step_prefers_direction_order() {
        let board = Board::new();
        let entities = EntityStorage::new();
        // Up and right both improve; up wins
        let step = next_step(&board, &entities, GridPoint::new(0, 0), GridPoint::new(3, 3));
        assert_eq!(step, Step::Advance(GridPoint::new(0, 1)));
    }

    #[test]
    fn test_step_sidesteps_other_enemies() {
        let mut board = Board::new();
        let mut entities = EntityStorage::new();
        put(
            &mut board,
            &mut entities,
            unit(ArchetypeId::Slime, Faction::Enemy, AiTrait::Default),
            GridPoint::new(0, 1),
        );
        let step = next_step(&board, &entities, GridPoint::new(0, 0), GridPoint::new(3, 3));
        assert_eq!(step, Step::Advance(GridPoint::new(1, 0)));
    }

    #[test]
    fn test_step_blocked_by_player() {
        let mut board = Board::new();
        let mut entities = EntityStorage::new();
        let hero = put(
            &mut board,
            &mut entities,
            unit(ArchetypeId::Potato, Faction::Player, AiTrait::Default),
            GridPoint::new(5, 8),
        );
        let step = next_step(&board, &entities, GridPoint::new(5, 9), BASE_POINTS[1]);
        assert_eq!(step, Step::Blocked(hero));
    }

    #[test]
    fn test_step_stuck_at_goal_or_walled() {
        let mut board = Board::new();
        let mut entities = EntityStorage::new();
        let goal = GridPoint::new(0, 2);
        put(
            &mut board,
            &mut entities,
            unit(ArchetypeId::Slime, Faction::Enemy, AiTrait::Default),
            GridPoint::new(0, 1),
        );
        assert_eq!(next_step(&board, &entities, GridPoint::new(0, 0), goal), Step::Stuck);
        assert_eq!(next_step(&board, &entities, goal, goal), Step::Stuck);
    }
}

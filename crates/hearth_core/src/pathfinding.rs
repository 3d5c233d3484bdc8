//! Read-only reachability and targeting queries over the board.
//!
//! Movement is 4-connected breadth-first search in [`DIRECTIONS`] order, so
//! results come out in a deterministic order. Nothing here mutates state.
//!
//! [`DIRECTIONS`]: crate::grid::DIRECTIONS

use std::collections::{HashSet, VecDeque};

use crate::components::{Combatant, EntityId, Faction};
use crate::grid::{Board, GridPoint};
use crate::simulation::EntityStorage;

/// Every free cell reachable from `start` within `move_range` steps.
///
/// Same-faction units can be passed through but not stopped on. Hostile
/// units always block, and base cells block when `avoid_base` is set. The
/// start cell is never part of the result.
#[must_use]
pub fn valid_moves(
    board: &Board,
    entities: &EntityStorage,
    start: GridPoint,
    move_range: u32,
    faction: Faction,
    avoid_base: bool,
) -> Vec<GridPoint> {
    let mut results = Vec::new();
    if !board.in_bounds(start) {
        return results;
    }

    let mut visited: HashSet<GridPoint> = HashSet::new();
    let mut queue: VecDeque<(GridPoint, u32)> = VecDeque::new();
    visited.insert(start);
    queue.push_back((start, 0));

    while let Some((current, steps)) = queue.pop_front() {
        if current != start && !board.is_occupied(current) {
            results.push(current);
        }

        if steps >= move_range {
            continue;
        }

        for next in board.neighbors(current) {
            if visited.contains(&next) {
                continue;
            }
            if avoid_base && board.is_base(next) {
                continue;
            }
            if let Some(occupant) = board.occupant(next) {
                let passable = entities
                    .get(occupant)
                    .is_some_and(|unit| !unit.faction.is_hostile_to(faction));
                if !passable {
                    continue;
                }
            }
            visited.insert(next);
            queue.push_back((next, steps + 1));
        }
    }

    results
}

/// Manhattan distance from a unit's footprint to a point.
///
/// The base measures from the nearest of its four cells; everything else
/// from its position. `None` when the unit is off the board.
#[must_use]
pub fn footprint_distance(board: &Board, unit: &Combatant, point: GridPoint) -> Option<u32> {
    if unit.is_base() {
        board.base_points().iter().map(|p| p.manhattan(point)).min()
    } else {
        unit.position.map(|pos| pos.manhattan(point))
    }
}

/// Hostile units an attacker can hit right now, in row-major board order.
///
/// A target must be alive, deployed and within the attacker's effective
/// attack range. For non-player attackers the base counts as a single target
/// when any of its cells is in range and it still has hp.
#[must_use]
pub fn valid_attack_targets(
    board: &Board,
    entities: &EntityStorage,
    attacker: &Combatant,
) -> Vec<EntityId> {
    let mut targets = Vec::new();
    if !attacker.is_deployed() {
        return targets;
    }
    let range = attacker.effective_stats().attack_range;

    for cell in board.cells() {
        let Some(occupant) = cell.occupant else {
            continue;
        };
        if targets.contains(&occupant) {
            continue;
        }
        let Some(target) = entities.get(occupant) else {
            continue;
        };
        if !attacker.faction.is_hostile_to(target.faction) || !target.is_alive() {
            continue;
        }
        if target.is_base() && attacker.faction == Faction::Player {
            continue;
        }
        if !target.is_base() && !target.is_deployed() {
            continue;
        }
        let in_range =
            footprint_distance(board, attacker, cell.pos).is_some_and(|dist| dist <= range);
        if in_range {
            targets.push(occupant);
        }
    }

    targets
}

//! Scripted enemy spawning with displacement.

use std::collections::{HashSet, VecDeque};

use crate::components::{Combatant, EntityId, LifeState};
use crate::data::SpawnEntry;
use crate::events::GameEvent;
use crate::grid::{Board, GridPoint};
use crate::simulation::Simulation;

/// Nearest free cell to `preferred`, searching outward breadth-first in
/// direction order. `None` when the board is full or the point is off it.
#[must_use]
pub fn find_spawn_cell(board: &Board, preferred: GridPoint) -> Option<GridPoint> {
    if !board.in_bounds(preferred) {
        return None;
    }

    let mut visited = HashSet::from([preferred]);
    let mut queue = VecDeque::from([preferred]);

    while let Some(current) = queue.pop_front() {
        if !board.is_occupied(current) {
            return Some(current);
        }
        for next in board.neighbors(current) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    None
}

impl Simulation {
    /// Spawn every entry scheduled for `turn`.
    pub(crate) fn spawn_wave(&mut self, turn: u32) {
        let wave: Vec<SpawnEntry> = self.data.schedule.wave_for_turn(turn).to_vec();
        for entry in wave {
            self.spawn_enemy(entry);
        }
    }

    /// Place one enemy, displacing it if its cell is taken. Dropped silently
    /// when no free cell exists.
    fn spawn_enemy(&mut self, entry: SpawnEntry) -> Option<EntityId> {
        let Some(at) = find_spawn_cell(&self.board, entry.at) else {
            tracing::warn!(archetype = ?entry.archetype, at = %entry.at, "No free cell, spawn dropped");
            return None;
        };

        let template = self.data.archetypes.resolve(entry.archetype);
        let mut unit = Combatant::new(
            0,
            template.id,
            template.faction,
            template.initial_stats(),
            template.capabilities,
            template.passive,
        );
        unit.state = LifeState::Idle;
        unit.position = Some(at);

        let id = self.entities.insert(unit);
        self.board.set_occupant(at, Some(id));

        tracing::debug!(id, archetype = ?entry.archetype, %at, "Enemy spawned");
        self.emit(GameEvent::EnemySpawned {
            unit: id,
            archetype: entry.archetype,
            at,
        });
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_cell_is_kept() {
        let board = Board::new();
        let p = GridPoint::new(5, 10);
        assert_eq!(find_spawn_cell(&board, p), Some(p));
    }

    #[test]
    fn test_displacement_follows_direction_order() {
        let mut board = Board::new();
        let p = GridPoint::new(5, 10);
        board.set_occupant(p, Some(1));
        // Up first
        assert_eq!(find_spawn_cell(&board, p), Some(GridPoint::new(5, 11)));

        board.set_occupant(GridPoint::new(5, 11), Some(2));
        // Then right
        assert_eq!(find_spawn_cell(&board, p), Some(GridPoint::new(6, 10)));
    }

    #[test]
    fn test_corner_displacement() {
        let mut board = Board::new();
        let corner = GridPoint::new(11, 11);
        board.set_occupant(corner, Some(1));
        // Up and right are off the board, so down comes first
        assert_eq!(find_spawn_cell(&board, corner), Some(GridPoint::new(11, 10)));
    }

    #[test]
    fn test_full_board_drops_spawn() {
        let mut board = Board::new();
        let points: Vec<_> = board.cells().map(|c| c.pos).collect();
        for (i, p) in points.into_iter().enumerate() {
            board.set_occupant(p, Some(i as EntityId + 1));
        }
        assert_eq!(find_spawn_cell(&board, GridPoint::new(0, 0)), None);
    }

    #[test]
    fn test_off_board_is_dropped() {
        let board = Board::new();
        assert_eq!(find_spawn_cell(&board, GridPoint::new(12, 0)), None);
    }
}

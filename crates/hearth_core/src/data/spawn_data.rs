//! Scripted spawn schedule.

use serde::{Deserialize, Serialize};

use crate::components::ArchetypeId;
use crate::error::{GameError, Result};
use crate::grid::GridPoint;

/// One enemy to spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Enemy template.
    pub archetype: ArchetypeId,
    /// Preferred cell.
    pub at: GridPoint,
}

/// All spawns for one absolute turn number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// Turn on which the wave appears.
    pub turn: u32,
    /// Spawns in order.
    pub spawns: Vec<SpawnEntry>,
}

/// Fixed per-turn spawn table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnSchedule {
    /// Waves keyed by turn.
    pub waves: Vec<Wave>,
}

impl SpawnSchedule {
    /// A schedule that never spawns anything.
    #[must_use]
    pub fn empty() -> Self {
        Self { waves: Vec::new() }
    }

    /// Parse a schedule from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            what: "spawn schedule".into(),
            message: e.to_string(),
        })
    }

    /// Spawns for a turn, empty when the turn has no wave.
    #[must_use]
    pub fn wave_for_turn(&self, turn: u32) -> &[SpawnEntry] {
        self.waves
            .iter()
            .find(|w| w.turn == turn)
            .map_or(&[], |w| w.spawns.as_slice())
    }
}

fn wave(turn: u32, spawns: &[(ArchetypeId, i32, i32)]) -> Wave {
    Wave {
        turn,
        spawns: spawns
            .iter()
            .map(|&(archetype, x, y)| SpawnEntry {
                archetype,
                at: GridPoint::new(x, y),
            })
            .collect(),
    }
}

impl Default for SpawnSchedule {
    /// The eight-turn level schedule. Turn 8 and later spawn nothing.
    fn default() -> Self {
        use ArchetypeId::{Assassin, Siege, Slime};

        Self {
            waves: vec![
                // Opening: far north
                wave(0, &[(Slime, 5, 10), (Slime, 6, 10)]),
                wave(1, &[(Slime, 3, 11), (Slime, 8, 11)]),
                // East pair and south pair
                wave(2, &[(Slime, 11, 5), (Slime, 11, 6), (Slime, 5, 0), (Slime, 6, 0)]),
                wave(3, &[(Siege, 0, 5)]),
                wave(4, &[(Slime, 4, 11), (Slime, 5, 11), (Slime, 6, 11)]),
                wave(5, &[(Assassin, 11, 2), (Assassin, 11, 8)]),
                wave(6, &[(Slime, 4, 11), (Slime, 6, 11), (Slime, 0, 4), (Slime, 0, 6)]),
                wave(7, &[(Siege, 5, 11), (Siege, 6, 11)]),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_span() {
        let schedule = SpawnSchedule::default();
        assert_eq!(schedule.wave_for_turn(0).len(), 2);
        assert_eq!(schedule.wave_for_turn(2).len(), 4);
        assert_eq!(schedule.wave_for_turn(3)[0].archetype, ArchetypeId::Siege);
        assert!(schedule.wave_for_turn(8).is_empty());
        assert!(schedule.wave_for_turn(100).is_empty());
    }

    #[test]
    fn test_empty_schedule() {
        assert!(SpawnSchedule::empty().wave_for_turn(0).is_empty());
    }

    #[test]
    fn test_parse_ron_schedule() {
        let text = "(waves: [(turn: 1, spawns: [(archetype: Assassin, at: (x: 0, y: 0))])])";
        let schedule = SpawnSchedule::from_ron_str(text).unwrap();
        assert_eq!(schedule.wave_for_turn(1)[0].at, GridPoint::new(0, 0));
    }
}

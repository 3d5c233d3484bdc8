//! Scripted autoplay.
//!
//! A simple greedy player: deploy the first four heroes around the base,
//! then every turn fire any affordable combo that hits an enemy, attack
//! whatever is in range, summon ready heroes and end the turn.

use hearth_core::components::{ArchetypeId, EntityId, Faction, LifeState};
use hearth_core::events::GameEvent;
use hearth_core::grid::GridPoint;
use hearth_core::simulation::{Outcome, Simulation};
use serde::Serialize;

/// Cells the opening heroes are deployed to, in roster order.
pub const OPENING_SPOTS: [GridPoint; 4] = [
    GridPoint::new(4, 5),
    GridPoint::new(4, 6),
    GridPoint::new(7, 5),
    GridPoint::new(7, 6),
];

/// Autoplay limits.
#[derive(Debug, Clone, Copy)]
pub struct AutoplayConfig {
    /// Stop after this turn even without an outcome.
    pub max_turns: u32,
    /// Whether to trigger combos at all.
    pub use_combos: bool,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            max_turns: 30,
            use_combos: true,
        }
    }
}

/// What happened over a whole autoplay game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AutoplaySummary {
    /// Terminal result, `None` when the turn limit was hit first.
    pub outcome: Option<Outcome>,
    /// Turn counter at the end.
    pub turns: u32,
    /// Heat at the end.
    pub heat: u32,
    /// Base hp at the end.
    pub base_hp: u32,
    /// Enemies killed.
    pub enemies_killed: u32,
    /// Hero deaths. Sacrifices and the base falling are not counted.
    pub heroes_lost: u32,
    /// Combos triggered.
    pub combos_triggered: u32,
    /// Normal attacks landed by either side.
    pub hits: u32,
    /// Final state hash.
    pub hash: u64,
}

impl AutoplaySummary {
    fn record(&mut self, events: &[GameEvent]) {
        for event in events {
            match event {
                GameEvent::UnitDied { faction: Faction::Enemy, .. } => self.enemies_killed += 1,
                GameEvent::UnitDied { archetype, .. } if *archetype != ArchetypeId::Base => {
                    self.heroes_lost += 1;
                }
                GameEvent::ComboTriggered { .. } => self.combos_triggered += 1,
                GameEvent::HitLanded { .. } => self.hits += 1,
                _ => {}
            }
        }
    }
}

/// Play a game from deployment to an outcome or the turn limit.
pub fn autoplay(sim: &mut Simulation, config: AutoplayConfig) -> AutoplaySummary {
    let mut summary = AutoplaySummary::default();
    sim.drain_events();

    deploy(sim);
    summary.record(&sim.drain_events());

    while sim.outcome().is_none() && sim.turn() <= config.max_turns {
        if config.use_combos {
            fire_combos(sim);
        }
        attack_all(sim);
        summon(sim);
        if let Err(err) = sim.end_player_turn() {
            tracing::warn!(%err, "Autoplay could not end the turn");
            break;
        }
        summary.record(&sim.drain_events());
        tracing::debug!(turn = sim.turn(), heat = sim.heat(), "Autoplay turn done");
    }
    summary.record(&sim.drain_events());

    summary.outcome = sim.outcome();
    summary.turns = sim.turn();
    summary.heat = sim.heat();
    summary.base_hp = sim.base().map_or(0, |b| b.stats.hp);
    summary.hash = sim.state_hash();
    tracing::info!(outcome = ?summary.outcome, turns = summary.turns, "Autoplay finished");
    summary
}

fn deploy(sim: &mut Simulation) {
    let heroes: Vec<EntityId> = sim.roster().iter().take(OPENING_SPOTS.len()).copied().collect();
    for (hero, preferred) in heroes.into_iter().zip(OPENING_SPOTS) {
        let at = if sim.placement_spots().contains(&preferred) {
            Some(preferred)
        } else {
            sim.placement_spots().first().copied()
        };
        let Some(at) = at else {
            break;
        };
        if let Err(err) = sim.place_unit(hero, at) {
            tracing::warn!(hero, %at, %err, "Autoplay deployment rejected");
        }
    }
}

fn ready(sim: &Simulation, id: EntityId) -> bool {
    sim.get(id)
        .is_some_and(|u| matches!(u.state, LifeState::Idle | LifeState::Moved))
}

/// Enemies inside the cells a combo would cover.
fn enemies_hit(sim: &Simulation, cells: &[GridPoint]) -> usize {
    cells
        .iter()
        .filter_map(|p| sim.board().occupant(*p))
        .filter(|id| sim.get(*id).is_some_and(|u| u.faction == Faction::Enemy))
        .count()
}

fn fire_combos(sim: &mut Simulation) {
    for hero in sim.deployed_heroes() {
        if !ready(sim, hero) {
            continue;
        }
        let Ok(combos) = sim.available_combos(hero) else {
            continue;
        };
        for combo in combos.into_iter().filter(|c| c.available) {
            let Ok(points) = sim.combo_target_points(hero, &combo.combo) else {
                continue;
            };
            let best = points
                .into_iter()
                .map(|p| {
                    let cells = sim.combo_footprint(&combo.combo, Some(p)).unwrap_or_default();
                    (enemies_hit(sim, &cells), p)
                })
                .filter(|(hits, _)| *hits > 0)
                .max_by_key(|(hits, _)| *hits);
            if let Some((_, target)) = best {
                match sim.trigger_combo(hero, &combo.combo, Some(target)) {
                    Ok(()) => break,
                    Err(err) => tracing::debug!(hero, combo = %combo.combo, %err, "Combo skipped"),
                }
            }
        }
    }
}

fn attack_all(sim: &mut Simulation) {
    let mut actors = sim.deployed_heroes();
    actors.push(sim.base_id());
    for id in actors {
        if !ready(sim, id) {
            continue;
        }
        let target = sim.attack_targets(id).ok().and_then(|t| {
            t.into_iter()
                .min_by_key(|t| sim.get(*t).map_or(u32::MAX, |u| u.stats.hp))
        });
        let result = match target {
            Some(target) => sim.attack(id, target).map(|_| ()),
            None => sim.standby(id),
        };
        if let Err(err) = result {
            tracing::debug!(id, %err, "Autoplay action rejected");
        }
    }
}

fn summon(sim: &mut Simulation) {
    loop {
        let Some(&spot) = sim.placement_spots().first() else {
            return;
        };
        let candidate = sim.roster().iter().copied().find(|id| {
            sim.get(*id)
                .is_some_and(|u| u.state == LifeState::Benched && u.cooldown == 0)
        });
        let Some(hero) = candidate else {
            return;
        };
        if let Err(err) = sim.place_unit(hero, spot) {
            tracing::debug!(hero, %spot, %err, "Autoplay summon rejected");
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::data::{GameData, SpawnSchedule};

    #[test]
    fn test_quiet_game_is_won() {
        let mut sim = Simulation::with_data(GameData {
            schedule: SpawnSchedule::empty(),
            ..GameData::default()
        });
        let summary = autoplay(&mut sim, AutoplayConfig::default());
        assert_eq!(summary.outcome, Some(Outcome::Victory));
        assert_eq!(summary.turns, 9);
        assert_eq!(summary.enemies_killed, 0);
        assert_eq!(summary.base_hp, 100);
    }

    #[test]
    fn test_autoplay_is_deterministic() {
        let mut a = Simulation::new();
        let mut b = Simulation::new();
        let first = autoplay(&mut a, AutoplayConfig::default());
        let second = autoplay(&mut b, AutoplayConfig::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_turn_limit_stops_play() {
        let mut sim = Simulation::new();
        let summary = autoplay(
            &mut sim,
            AutoplayConfig {
                max_turns: 2,
                use_combos: false,
            },
        );
        assert_eq!(summary.turns, 3);
        assert_eq!(summary.combos_triggered, 0);
    }

    #[test]
    fn test_opening_spots_are_deployable() {
        let sim = Simulation::new();
        let spots = sim.placement_spots();
        for spot in OPENING_SPOTS {
            assert!(spots.contains(&spot));
        }
    }
}

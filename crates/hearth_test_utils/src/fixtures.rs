//! Test fixtures and helpers.
//!
//! Pre-built game data, pre-deployed games and a scripted player for
//! consistent testing.

use hearth_core::components::{ArchetypeId, EntityId, LifeState, Stats};
use hearth_core::data::{GameData, SpawnEntry, SpawnSchedule, Wave};
use hearth_core::error::Result;
use hearth_core::grid::GridPoint;
use hearth_core::simulation::{Outcome, Phase, Simulation};

/// Cells used by [`deployed`], one per starting hero.
pub const DEPLOY_SPOTS: [GridPoint; 4] = [
    GridPoint::new(4, 4),
    GridPoint::new(4, 5),
    GridPoint::new(4, 6),
    GridPoint::new(4, 7),
];

/// Shipped data without any enemy waves.
#[must_use]
pub fn quiet_data() -> GameData {
    GameData {
        schedule: SpawnSchedule::empty(),
        ..GameData::default()
    }
}

/// Shipped data whose only wave is the given turn-0 spawns.
#[must_use]
pub fn data_with_enemies(spawns: &[(ArchetypeId, GridPoint)]) -> GameData {
    let wave = Wave {
        turn: 0,
        spawns: spawns
            .iter()
            .map(|&(archetype, at)| SpawnEntry { archetype, at })
            .collect(),
    };
    GameData {
        schedule: SpawnSchedule { waves: vec![wave] },
        ..GameData::default()
    }
}

/// Replace one archetype's stat block.
#[must_use]
pub fn with_stats(mut data: GameData, id: ArchetypeId, stats: Stats) -> GameData {
    let mut template = data.archetypes.resolve(id);
    template.stats = stats;
    data.archetypes.archetypes.retain(|a| a.id != id);
    data.archetypes.archetypes.push(template);
    data
}

/// Build a game and deploy the first four roster heroes at `spots`.
///
/// # Panics
///
/// Panics if any placement is rejected.
#[must_use]
pub fn deploy_at(data: GameData, spots: [GridPoint; 4]) -> Simulation {
    let mut sim = Simulation::with_data(data);
    let heroes = sim.roster()[..4].to_vec();
    for (hero, at) in heroes.into_iter().zip(spots) {
        if let Err(err) = sim.place_unit(hero, at) {
            panic!("fixture placement of {hero} at {at} rejected: {err}");
        }
    }
    assert_eq!(sim.phase(), Phase::PlayerMain);
    sim
}

/// Build a game with the first four heroes on [`DEPLOY_SPOTS`].
#[must_use]
pub fn deployed(data: GameData) -> Simulation {
    deploy_at(data, DEPLOY_SPOTS)
}

/// First hero of an archetype in roster order.
///
/// # Panics
///
/// Panics if the roster has no such hero.
#[must_use]
pub fn hero_of(sim: &Simulation, archetype: ArchetypeId) -> EntityId {
    sim.roster()
        .iter()
        .copied()
        .find(|id| sim.get(*id).is_some_and(|u| u.archetype == archetype))
        .unwrap_or_else(|| panic!("no {archetype:?} in the roster"))
}

/// Whoever stands on a cell.
#[must_use]
pub fn occupant_at(sim: &Simulation, at: GridPoint) -> Option<EntityId> {
    sim.board().occupant(at)
}

/// Play one player turn with a fixed script, then end it.
///
/// Every ready unit (heroes in roster order, then the base) attacks the
/// first target in range or stands by. Ready benched heroes are then
/// summoned onto the first free placement spot while the field has room.
pub fn play_scripted_turn(sim: &mut Simulation) -> Result<()> {
    let mut actors = sim.deployed_heroes();
    actors.push(sim.base_id());

    for id in actors {
        let ready = sim
            .get(id)
            .is_some_and(|u| matches!(u.state, LifeState::Idle | LifeState::Moved));
        if !ready {
            continue;
        }
        match sim.attack_targets(id)?.first() {
            Some(&target) => {
                sim.attack(id, target)?;
            }
            None => sim.standby(id)?,
        }
    }

    loop {
        let Some(&spot) = sim.placement_spots().first() else {
            break;
        };
        let benched = sim.roster().iter().copied().find(|id| {
            sim.get(*id)
                .is_some_and(|u| u.state == LifeState::Benched && u.cooldown == 0)
        });
        let Some(hero) = benched else {
            break;
        };
        sim.place_unit(hero, spot)?;
    }

    tracing::trace!(turn = sim.turn(), heat = sim.heat(), "Scripted turn played");
    sim.end_player_turn()
}

/// Run scripted turns until the game ends or `max_turns` is reached.
pub fn play_to_end(sim: &mut Simulation, max_turns: u32) -> Option<Outcome> {
    while sim.outcome().is_none() && sim.turn() <= max_turns {
        if play_scripted_turn(sim).is_err() {
            break;
        }
    }
    sim.outcome()
}

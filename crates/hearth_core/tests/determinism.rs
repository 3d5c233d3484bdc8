//! Replaying the same scripted game must land on the same state.

use hearth_core::data::GameData;
use hearth_core::simulation::Simulation;
use hearth_test_utils::determinism::{find_first_divergence, run_parallel_simulations, verify_determinism};
use hearth_test_utils::fixtures::{deployed, play_scripted_turn, play_to_end};

#[test]
fn scripted_games_match() {
    let result = verify_determinism(
        3,
        15,
        || deployed(GameData::default()),
        |sim: &mut Simulation| {
            let _ = play_scripted_turn(sim);
        },
        Simulation::state_hash,
    );
    result.assert_deterministic();
}

#[test]
fn scripted_games_match_across_threads() {
    run_parallel_simulations(|| deployed(GameData::default()), 4, 15).assert_deterministic();
}

#[test]
fn scripted_games_never_diverge() {
    assert_eq!(find_first_divergence(|| deployed(GameData::default()), 15), None);
}

#[test]
fn scripted_game_reaches_an_outcome() {
    let mut sim = deployed(GameData::default());
    let outcome = play_to_end(&mut sim, 30);
    assert!(outcome.is_some(), "no outcome by turn {}", sim.turn());
    sim.check_invariants().unwrap();
}

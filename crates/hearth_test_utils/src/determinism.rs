//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A replayed command log must land on the same [`Simulation::state_hash`].
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: damage and healing use integer percentages
//!   and fixed-point via [`hearth_core::math`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   We always iterate in sorted entity ID order.
//!
//! - **Search order**: every breadth-first search expands neighbors in the
//!   same direction order.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual rules (damage, statuses, pathfinding)
//! 2. **Property tests**: random inputs must still uphold invariants
//! 3. **Integration tests**: full scripted games are reproducible
//! 4. **Parallel tests**: running N games on scoped threads all match

use std::thread;

use hearth_core::simulation::Simulation;

use crate::fixtures::play_scripted_turn;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `steps` - Number of steps to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one step
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Advance a game by one scripted player turn. Rejections (including game
/// over) leave the state untouched, so they are ignored here.
pub fn scripted_step(sim: &mut Simulation) {
    if let Err(err) = play_scripted_turn(sim) {
        tracing::trace!(%err, "Scripted step rejected");
    }
}

/// Run the scripted player twice from identical setups and compare the
/// final state hashes.
pub fn verify_simulation_determinism<F>(setup_fn: F, turns: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(2, turns, &setup_fn, scripted_step, Simulation::state_hash);
    result.is_deterministic
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of turns each simulation ran.
    pub turns: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Turns: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.turns,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run N scripted games on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, turns: u64) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..turns {
                        scripted_step(&mut sim);
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    ParallelSimResult {
        hashes,
        turns,
        num_sims,
    }
}

/// Compare two scripted games turn by turn, finding the first divergence.
///
/// # Returns
///
/// `None` if the games stay identical, `Some(turn)` for the first step
/// after which their hashes differ (0 = already at setup).
pub fn find_first_divergence<F>(setup_fn: F, turns: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    // Check initial state
    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for step in 1..=turns {
        scripted_step(&mut sim1);
        scripted_step(&mut sim2);

        if sim1.state_hash() != sim2.state_hash() {
            return Some(step);
        }
    }

    None
}

/// Proptest strategies for property-based testing of the core rules.
pub mod strategies {
    use hearth_core::components::{StatusEffect, StatusKind, Stats};
    use hearth_core::grid::{GridPoint, BOARD_HEIGHT, BOARD_WIDTH};
    use proptest::prelude::*;

    /// Any on-board cell.
    pub fn arb_grid_point() -> impl Strategy<Value = GridPoint> {
        (0..BOARD_WIDTH, 0..BOARD_HEIGHT).prop_map(|(x, y)| GridPoint::new(x, y))
    }

    /// A plausible stat block at full health.
    pub fn arb_stats() -> impl Strategy<Value = Stats> {
        (1u32..300, 0u32..80, 0u32..80, 0u32..80, 0u32..80, 0u32..6, 1u32..4).prop_map(
            |(hp, phys, mag, armor, resist, mv, range)| {
                Stats::new(hp, phys, mag, armor, resist, mv, range)
            },
        )
    }

    /// Any status effect kind.
    pub fn arb_status_kind() -> impl Strategy<Value = StatusKind> {
        prop_oneof![
            Just(StatusKind::Burn),
            Just(StatusKind::ArmorShred),
            Just(StatusKind::Slow),
            Just(StatusKind::Stun),
        ]
    }

    /// A status effect with or without a magnitude.
    pub fn arb_status_effect() -> impl Strategy<Value = StatusEffect> {
        (arb_status_kind(), 0u32..5, proptest::option::of(0u32..40)).prop_map(
            |(kind, duration, magnitude)| StatusEffect {
                kind,
                duration,
                magnitude,
            },
        )
    }

    /// A sequence of status applications.
    pub fn arb_status_sequence(max_len: usize) -> impl Strategy<Value = Vec<StatusEffect>> {
        proptest::collection::vec(arb_status_effect(), 0..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{deployed, quiet_data};
    use hearth_core::data::GameData;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_unique_hashes() {
        let result = DeterminismResult {
            is_deterministic: false,
            hashes: vec![3, 1, 3],
            steps: 1,
        };
        assert_eq!(result.unique_hashes(), vec![1, 3]);
    }

    #[test]
    fn test_fresh_game_determinism() {
        assert!(verify_simulation_determinism(Simulation::new, 0));
    }

    #[test]
    fn test_quiet_game_determinism() {
        assert!(verify_simulation_determinism(|| deployed(quiet_data()), 10));
    }

    #[test]
    fn test_full_game_determinism() {
        assert!(verify_simulation_determinism(|| deployed(GameData::default()), 12));
    }

    #[test]
    fn test_no_divergence() {
        assert_eq!(find_first_divergence(|| deployed(GameData::default()), 12), None);
    }

    #[test]
    fn test_parallel_games_match() {
        let result = run_parallel_simulations(|| deployed(GameData::default()), 4, 12);
        assert_eq!(result.hashes.len(), 4);
        result.assert_deterministic();
    }
}

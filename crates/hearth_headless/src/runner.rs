//! Headless game runner implementation.

use std::io::{self, BufRead, Write};

use hearth_core::error::GameError;
use hearth_core::grid::GridPoint;
use hearth_core::simulation::Simulation;

use crate::protocol::{Command, GameSnapshot, Response};

/// Drives one game from JSON-lines commands.
#[derive(Debug)]
pub struct HeadlessRunner {
    sim: Simulation,
    game_over_sent: bool,
}

impl HeadlessRunner {
    /// Create a runner for the shipped level.
    pub fn new() -> Self {
        Self::with_simulation(Simulation::new())
    }

    /// Create a runner around an existing game.
    pub fn with_simulation(sim: Simulation) -> Self {
        Self {
            sim,
            game_over_sent: false,
        }
    }

    /// The game being driven.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Handle one command and return the responses to emit, in order.
    pub fn handle(&mut self, cmd: &Command) -> Vec<Response> {
        let name = cmd.name();
        tracing::debug!(cmd = name, "Handling command");

        let result: Result<Option<Response>, GameError> = match cmd {
            Command::Place { unit, x, y } => self.sim.place_unit(*unit, GridPoint::new(*x, *y)).map(|()| None),
            Command::Move { unit, x, y } => self.sim.move_unit(*unit, GridPoint::new(*x, *y)).map(|()| None),
            Command::Attack { unit, target } => self.sim.attack(*unit, *target).map(|_| None),
            Command::Standby { unit } => self.sim.standby(*unit).map(|()| None),
            Command::CancelMove { unit } => self.sim.cancel_move(*unit).map(|()| None),
            Command::Combos { unit } => self.sim.available_combos(*unit).map(|combos| {
                Some(Response::Combos {
                    unit: *unit,
                    combos,
                })
            }),
            Command::Combo { unit, combo, x, y } => {
                let target = match (x, y) {
                    (Some(x), Some(y)) => Some(GridPoint::new(*x, *y)),
                    _ => None,
                };
                self.sim.trigger_combo(*unit, combo, target).map(|()| None)
            }
            Command::EndTurn => self.sim.end_player_turn().map(|()| None),
            Command::Query => Ok(Some(Response::State(GameSnapshot::capture(&self.sim)))),
            Command::Hash => Ok(Some(Response::Hash {
                turn: self.sim.turn(),
                hash: self.sim.state_hash(),
            })),
            Command::GrantHeat { amount } => self.sim.grant_heat(*amount).map(|_| None),
            Command::Quit => Ok(Some(Response::Bye)),
        };

        let mut responses = Vec::new();
        match result {
            Ok(Some(reply)) => responses.push(reply),
            Ok(None) => responses.push(Response::ack(name, self.sim.drain_events())),
            Err(err) => {
                tracing::debug!(cmd = name, %err, "Command rejected");
                responses.push(Response::rejected(name, err));
            }
        }

        if let Some(outcome) = self.sim.outcome() {
            if !self.game_over_sent {
                self.game_over_sent = true;
                tracing::info!(?outcome, turn = self.sim.turn(), "Game over");
                responses.push(Response::GameOver {
                    outcome,
                    turn: self.sim.turn(),
                });
            }
        }
        responses
    }

    /// Run the JSON-lines loop until `quit` or end of input.
    ///
    /// Blank lines are skipped; malformed lines get an `error` response.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        // Construction events (turn-0 spawns) are not part of any reply
        self.sim.drain_events();
        output.write_all(Response::ready(&self.sim).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let responses = match Command::from_json(line) {
                Ok(cmd) => self.handle(&cmd),
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed command");
                    vec![Response::error(format!("Invalid command: {e}"), None)]
                }
            };

            let quit = responses.iter().any(|r| matches!(r, Response::Bye));
            for response in responses {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;

            if quit {
                break;
            }
        }

        tracing::info!(turn = self.sim.turn(), "Session ended");
        Ok(())
    }
}

impl Default for HeadlessRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::events::GameEvent;
    use hearth_test_utils::fixtures;

    fn run_script(lines: &[&str]) -> Vec<serde_json::Value> {
        let mut runner = HeadlessRunner::new();
        let input = lines.join("\n");
        let mut output = Vec::new();
        runner.run(input.as_bytes(), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_ready_then_bye() {
        let out = run_script(&[r#"{"cmd":"quit"}"#, r#"{"cmd":"hash"}"#]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0]["type"], "ready");
        assert_eq!(out[0]["phase"], "Deployment");
        assert_eq!(out[1]["type"], "bye");
    }

    #[test]
    fn test_place_is_acked_with_events() {
        let out = run_script(&[r#"{"cmd":"place","unit":2,"x":4,"y":4}"#]);
        assert_eq!(out[1]["type"], "ack");
        assert_eq!(out[1]["cmd"], "place");
        assert_eq!(out[1]["events"][0]["event"], "unit_placed");
    }

    #[test]
    fn test_rejection_and_bad_json() {
        let out = run_script(&[r#"{"cmd":"end_turn"}"#, "not json", ""]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1]["type"], "rejected");
        assert_eq!(out[2]["type"], "error");
    }

    #[test]
    fn test_game_over_reported_once() {
        let mut runner = HeadlessRunner::with_simulation(Simulation::with_data(fixtures::quiet_data()));
        let heroes = runner.simulation().roster()[..4].to_vec();
        for (unit, at) in heroes.into_iter().zip(fixtures::DEPLOY_SPOTS) {
            runner.handle(&Command::Place { unit, x: at.x, y: at.y });
        }

        let mut game_overs = 0;
        for _ in 0..10 {
            for response in runner.handle(&Command::EndTurn) {
                if matches!(response, Response::GameOver { .. }) {
                    game_overs += 1;
                }
            }
        }
        assert_eq!(game_overs, 1);
        assert!(runner.simulation().is_won());
    }

    #[test]
    fn test_ack_drains_events() {
        let mut runner = HeadlessRunner::new();
        let responses = runner.handle(&Command::GrantHeat { amount: 5 });
        let Response::Ack { events, .. } = &responses[0] else {
            panic!("expected ack, got {responses:?}");
        };
        assert!(events.contains(&GameEvent::HeatChanged { from: 30, to: 35 }));
    }
}

//! Headless game runner for scripted play and CI verification.
//!
//! This crate drives a [`hearth_core`] game without any presentation layer:
//!
//! - **Interactive protocol**: a controller sends JSON commands on stdin and
//!   reads responses on stdout
//! - **Autoplay**: a greedy scripted player runs a whole game and reports a
//!   JSON summary
//! - **Determinism checks**: every snapshot carries the state hash
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (place, move, attack, etc.)
//! - **stdout**: Responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"query"}' | cargo run -p hearth_headless -- run
//!
//! # Let the scripted player finish a game
//! cargo run -p hearth_headless -- autoplay --max-turns 20
//!
//! # Use a custom combo catalog
//! cargo run -p hearth_headless -- run --combos data/combos.ron
//! ```

pub mod autoplay;
pub mod data_loader;
pub mod protocol;
pub mod runner;

pub use autoplay::{autoplay, AutoplayConfig, AutoplaySummary};
pub use data_loader::{DataLoadError, DataPaths};
pub use protocol::{Command, GameSnapshot, Response};
pub use runner::HeadlessRunner;

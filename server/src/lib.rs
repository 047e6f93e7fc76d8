//! # Robots Game Server
//!
//! Authoritative server for the turn-based robots game. Players connect over
//! TCP, join a lobby, and once enough of them are in, the server runs a game
//! of a fixed number of turns: robots walk around a grid, place blocks and
//! drop bombs that explode after a delay.
//!
//! ## Architecture
//!
//! ### Single-Threaded Event Loop
//! One task owns the connections, the game and the turn timer, and reacts
//! to whichever is ready first. Each socket gets a reader task and a writer
//! task that talk to the loop over channels, so no state is shared and
//! nothing is locked.
//!
//! ### Turn Processing
//! Clients may send any number of actions during a turn. Only the latest
//! one per player counts; when the turn timer fires the server applies them
//! all at once and broadcasts the resulting events.
//!
//! ### Late Joiners
//! The server keeps every message broadcast since the lobby opened (or since
//! the game started) and replays it to new connections right after `Hello`,
//! so observers can always reconstruct the current state.
//!
//! ## Module Organization
//!
//! - `config`: game parameters and the `Hello` greeting built from them
//! - `rng`: deterministic generator used for board layout and respawns
//! - `game`: the authoritative game state and turn rules
//! - `client_manager`: open connections, player bindings and per-turn actions
//! - `network`: the listener, socket tasks and the main loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig {
//!         server_name: "Arena".to_string(),
//!         port: 2022,
//!         ..ServerConfig::default()
//!     };
//!
//!     let server = Server::bind(config).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod game;
pub mod network;
pub mod rng;

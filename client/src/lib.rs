//! # Robots Game Client
//!
//! The client sits between a player's GUI and the game server. It owns no
//! window and reads no keyboard: the GUI sends it key presses as UDP
//! datagrams and receives complete board snapshots back, while the client
//! keeps a single TCP connection to the server.
//!
//! ## Architecture Overview
//!
//! ### Mirrored Game State
//! The server is the only authority. The client replays every turn's events
//! onto its own copy of the board, recomputing explosion areas with the same
//! blast function the server uses, so both always agree on what was hit.
//!
//! ### Snapshots, Not Diffs
//! Each change produces a full `DrawMessage`, so a lost UDP datagram only
//! delays the GUI until the next turn.
//!
//! ### Failure Policy
//! A malformed datagram from the GUI is logged and dropped. Losing the server
//! connection is fatal, since there is nothing left to play.
//!
//! ## Module Organization
//!
//! - `config`: player name and peer addresses
//! - `game`: the mirrored state machine turning server messages into draws
//!   and GUI input into server requests
//! - `network`: sockets, connection tasks and the main loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::config::ClientConfig;
//! use client::network::Client;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig {
//!         player_name: "alice".to_string(),
//!         port: 2023,
//!         gui_address: "localhost:2024".to_string(),
//!         server_address: "localhost:2022".to_string(),
//!     };
//!
//!     let client = Client::connect(config).await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod game;
pub mod network;

//! Integration tests for the robots server and client
//!
//! These tests run the real components against each other over loopback
//! sockets, plus a lockstep check that the client mirror never drifts from
//! the authoritative game.

use client::config::ClientConfig;
use client::game::ClientGameState;
use client::network::Client;
use server::config::ServerConfig;
use server::game::GameState;
use server::network::Server;
use shared::{
    ClientMessage, DatagramReader, Direction, DrawMessage, Encode, InputMessage, ServerMessage,
    StreamReader, MAX_DATAGRAM_SIZE,
};
use std::collections::{BTreeSet, HashMap};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn game_config(players_count: u8, game_length: u16) -> ServerConfig {
    ServerConfig {
        server_name: "Integration".to_string(),
        players_count,
        size_x: 8,
        size_y: 6,
        game_length,
        bomb_timer: 2,
        explosion_radius: 2,
        initial_blocks: 6,
        turn_duration: Duration::from_millis(25),
        seed: 2022,
        ..ServerConfig::default()
    }
}

async fn spawn_server(config: ServerConfig) -> SocketAddr {
    let server = Server::bind(config).await.unwrap();
    let port = server.local_addr().unwrap().port();
    tokio::spawn(server.run());
    SocketAddr::from((Ipv4Addr::LOCALHOST, port))
}

/// Raw TCP player speaking the wire protocol directly
struct Player {
    stream: TcpStream,
    reader: StreamReader,
}

impl Player {
    async fn connect(addr: SocketAddr) -> Self {
        Self {
            stream: TcpStream::connect(addr).await.unwrap(),
            reader: StreamReader::new(),
        }
    }

    async fn send(&mut self, message: &ClientMessage) {
        self.stream.write_all(&message.to_bytes()).await.unwrap();
    }

    async fn recv(&mut self) -> ServerMessage {
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(message) = self.reader.next_message().unwrap() {
                return message;
            }
            let len = timeout(WAIT, self.stream.read(&mut chunk))
                .await
                .expect("timed out waiting for server")
                .unwrap();
            assert!(len > 0, "server closed the connection");
            self.reader.extend(&chunk[..len]);
        }
    }

    /// Collects messages up to and including `GameEnded`.
    async fn recv_until_game_ended(&mut self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        loop {
            let message = self.recv().await;
            let done = matches!(message, ServerMessage::GameEnded { .. });
            messages.push(message);
            if done {
                return messages;
            }
        }
    }
}

/// SERVER PROTOCOL TESTS
mod server_tests {
    use super::*;

    #[tokio::test]
    async fn two_players_play_a_full_game() {
        let config = game_config(2, 4);
        let addr = spawn_server(config.clone()).await;

        let mut alice = Player::connect(addr).await;
        let mut bob = Player::connect(addr).await;
        assert_eq!(alice.recv().await, config.hello());
        assert_eq!(bob.recv().await, config.hello());

        alice
            .send(&ClientMessage::Join {
                name: "alice".to_string(),
            })
            .await;
        match alice.recv().await {
            ServerMessage::AcceptedPlayer { id, player } => {
                assert_eq!(id, 0);
                assert_eq!(player.name, "alice");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            bob.recv().await,
            ServerMessage::AcceptedPlayer { id: 0, .. }
        ));

        bob.send(&ClientMessage::Join {
            name: "bob".to_string(),
        })
        .await;

        let alice_log = alice.recv_until_game_ended().await;
        let bob_log = bob.recv_until_game_ended().await;
        assert_eq!(alice_log, bob_log);

        assert!(matches!(
            alice_log[0],
            ServerMessage::AcceptedPlayer { id: 1, .. }
        ));
        match &alice_log[1] {
            ServerMessage::GameStarted { players } => {
                assert_eq!(players.len(), 2);
                assert_eq!(players[&1].name, "bob");
            }
            other => panic!("unexpected {:?}", other),
        }

        let turns: Vec<u16> = alice_log
            .iter()
            .filter_map(|m| match m {
                ServerMessage::Turn { turn, .. } => Some(*turn),
                _ => None,
            })
            .collect();
        assert_eq!(turns, vec![0, 1, 2, 3, 4]);

        match alice_log.last() {
            Some(ServerMessage::GameEnded { scores }) => {
                assert_eq!(scores.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn observer_catches_up_mid_game() {
        let config = game_config(1, 40);
        let addr = spawn_server(config.clone()).await;

        let mut player = Player::connect(addr).await;
        player.recv().await;
        player
            .send(&ClientMessage::Join {
                name: "solo".to_string(),
            })
            .await;
        assert!(matches!(
            player.recv().await,
            ServerMessage::AcceptedPlayer { .. }
        ));
        let started = player.recv().await;
        assert!(matches!(started, ServerMessage::GameStarted { .. }));

        // Let a few turns go by.
        for _ in 0..3 {
            player.recv().await;
        }

        let mut observer = Player::connect(addr).await;
        assert_eq!(observer.recv().await, config.hello());
        assert_eq!(observer.recv().await, started);
        match observer.recv().await {
            ServerMessage::Turn { turn, .. } => assert_eq!(turn, 0),
            other => panic!("unexpected {:?}", other),
        }

        // An observer's actions never reach the game.
        observer.send(&ClientMessage::PlaceBomb).await;
        let mut last_turn = 0;
        loop {
            match observer.recv().await {
                ServerMessage::Turn { turn, events } => {
                    assert_eq!(turn, last_turn + 1);
                    last_turn = turn;
                    if turn > 8 {
                        assert!(events.is_empty());
                        break;
                    }
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn server_keeps_serving_after_a_player_leaves() {
        let config = game_config(2, 3);
        let addr = spawn_server(config).await;

        let mut quitter = Player::connect(addr).await;
        quitter.recv().await;
        quitter
            .send(&ClientMessage::Join {
                name: "quitter".to_string(),
            })
            .await;
        quitter.recv().await;
        drop(quitter);

        let mut stayer = Player::connect(addr).await;
        stayer.recv().await;
        assert!(matches!(
            stayer.recv().await,
            ServerMessage::AcceptedPlayer { id: 0, .. }
        ));
        stayer
            .send(&ClientMessage::Join {
                name: "stayer".to_string(),
            })
            .await;

        let log = stayer.recv_until_game_ended().await;
        match log.last() {
            Some(ServerMessage::GameEnded { scores }) => assert_eq!(scores.len(), 2),
            other => panic!("unexpected {:?}", other),
        }

        // The lobby reopens for the next game.
        stayer
            .send(&ClientMessage::Join {
                name: "stayer".to_string(),
            })
            .await;
        assert!(matches!(
            stayer.recv().await,
            ServerMessage::AcceptedPlayer { id: 0, .. }
        ));
    }
}

/// CLIENT BRIDGE TESTS
mod client_tests {
    use super::*;

    async fn recv_draw(gui: &UdpSocket) -> DrawMessage {
        let mut buffer = vec![0u8; MAX_DATAGRAM_SIZE];
        let (len, _) = timeout(WAIT, gui.recv_from(&mut buffer))
            .await
            .expect("timed out waiting for a draw")
            .unwrap();
        DatagramReader::decode_packet(&buffer[..len]).unwrap()
    }

    #[tokio::test]
    async fn gui_plays_a_game_through_the_client() {
        let server_addr = spawn_server(game_config(1, 5)).await;
        let gui = UdpSocket::bind("127.0.0.1:0").await.unwrap();

        let client = Client::connect(ClientConfig {
            player_name: "gui-player".to_string(),
            port: 0,
            gui_address: gui.local_addr().unwrap().to_string(),
            server_address: server_addr.to_string(),
        })
        .await
        .unwrap();
        let input_addr = SocketAddr::from((
            Ipv4Addr::LOCALHOST,
            client.gui_local_addr().unwrap().port(),
        ));
        tokio::spawn(client.run());

        assert!(matches!(recv_draw(&gui).await, DrawMessage::Lobby { .. }));

        let input = InputMessage::Move {
            direction: Direction::Up,
        };
        gui.send_to(&input.to_bytes(), input_addr).await.unwrap();

        match recv_draw(&gui).await {
            DrawMessage::Lobby { players, .. } => {
                assert_eq!(players[&0].name, "gui-player");
            }
            other => panic!("unexpected {:?}", other),
        }

        let mut turns = Vec::new();
        loop {
            match recv_draw(&gui).await {
                DrawMessage::Game {
                    turn,
                    players,
                    player_positions,
                    ..
                } => {
                    assert_eq!(players.len(), 1);
                    assert!(player_positions.contains_key(&0));
                    turns.push(turn);
                    gui.send_to(&InputMessage::PlaceBomb.to_bytes(), input_addr)
                        .await
                        .unwrap();
                }
                DrawMessage::Lobby { players, .. } => {
                    assert!(players.is_empty());
                    break;
                }
            }
        }
        assert_eq!(turns, vec![0, 1, 2, 3, 4, 5]);
    }
}

/// MIRROR CONSISTENCY TESTS
mod mirror_tests {
    use super::*;

    fn scripted_action(turn: u16, id: u8) -> ClientMessage {
        let directions = Direction::ALL;
        match (turn as usize + id as usize) % 5 {
            0 => ClientMessage::PlaceBomb,
            1 => ClientMessage::PlaceBlock,
            n => ClientMessage::Move {
                direction: directions[(n + turn as usize) % directions.len()],
            },
        }
    }

    #[test]
    fn client_mirror_matches_authoritative_game() {
        let config = ServerConfig {
            initial_blocks: 12,
            ..game_config(3, 60)
        };
        let mut game = GameState::new(&config);
        let mut mirror = ClientGameState::new("observer");

        mirror.handle_server_message(config.hello());
        for id in 0..3u8 {
            let accepted = game
                .handle_join(format!("p{}", id), format!("10.0.0.{}:1", id))
                .unwrap();
            mirror.handle_server_message(accepted);
        }

        let (started, first_turn) = game.start_game();
        assert_eq!(mirror.handle_server_message(started), None);
        let mut draw = mirror.handle_server_message(first_turn);

        let mut turn = 1;
        while !game.is_end_of_game() {
            check_in_sync(&game, draw.as_ref().unwrap());

            let actions: HashMap<u8, ClientMessage> =
                (0..3u8).map(|id| (id, scripted_action(turn, id))).collect();
            draw = mirror.handle_server_message(game.handle_turn(&actions));
            turn += 1;
        }
        check_in_sync(&game, draw.as_ref().unwrap());
    }

    fn check_in_sync(game: &GameState, draw: &DrawMessage) {
        match draw {
            DrawMessage::Game {
                player_positions,
                blocks,
                scores,
                ..
            } => {
                for (id, info) in game.players() {
                    assert_eq!(player_positions[id], info.position);
                    assert_eq!(scores[id], info.score);
                }
                let expected: BTreeSet<_> = game.blocks().iter().copied().collect();
                let mirrored: BTreeSet<_> = blocks.iter().copied().collect();
                assert_eq!(mirrored, expected);
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

//! Client-side mirror of the game.
//!
//! The client never simulates on its own. It rebuilds the board purely from
//! the server's messages and turns it into snapshots for the GUI.

use log::warn;
use shared::{
    blast, Bomb, BombId, Board, ClientMessage, DrawMessage, Event, InputMessage, Player,
    PlayerId, PlayerInfo, Position, ServerMessage,
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientPhase {
    /// No `Hello` received yet.
    NotConnected,
    Lobby,
    Game,
}

#[derive(Debug, Clone)]
pub struct ClientGameState {
    player_name: String,
    phase: ClientPhase,

    server_name: String,
    players_count: u8,
    board: Board,
    game_length: u16,
    explosion_radius: u16,
    bomb_timer: u16,

    turn: u16,
    players: BTreeMap<PlayerId, PlayerInfo>,
    bombs: BTreeMap<BombId, Bomb>,
    blocks: BTreeSet<Position>,
    /// Cells hit by explosions during the last turn.
    explosions: BTreeSet<Position>,
    /// Robots destroyed during the last turn.
    destroyed: BTreeSet<PlayerId>,
}

impl ClientGameState {
    pub fn new(player_name: impl Into<String>) -> Self {
        Self {
            player_name: player_name.into(),
            phase: ClientPhase::NotConnected,
            server_name: String::new(),
            players_count: 0,
            board: Board::default(),
            game_length: 0,
            explosion_radius: 0,
            bomb_timer: 0,
            turn: 0,
            players: BTreeMap::new(),
            bombs: BTreeMap::new(),
            blocks: BTreeSet::new(),
            explosions: BTreeSet::new(),
            destroyed: BTreeSet::new(),
        }
    }

    pub fn phase(&self) -> ClientPhase {
        self.phase
    }

    pub fn players(&self) -> &BTreeMap<PlayerId, PlayerInfo> {
        &self.players
    }

    /// Applies a server message, returning a fresh snapshot for the GUI when
    /// something visible changed.
    pub fn handle_server_message(&mut self, message: ServerMessage) -> Option<DrawMessage> {
        if self.phase == ClientPhase::NotConnected
            && !matches!(message, ServerMessage::Hello { .. })
        {
            return None;
        }

        match message {
            ServerMessage::Hello {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
            } => {
                self.server_name = server_name;
                self.players_count = players_count;
                self.board = Board::new(size_x, size_y);
                self.game_length = game_length;
                self.explosion_radius = explosion_radius;
                self.bomb_timer = bomb_timer;
                self.turn = 0;
                self.phase = ClientPhase::Lobby;
                self.draw()
            }
            ServerMessage::AcceptedPlayer { id, player } => {
                self.add_player(id, player);
                self.draw()
            }
            ServerMessage::GameStarted { players } => {
                self.phase = ClientPhase::Game;
                for (id, player) in players {
                    self.add_player(id, player);
                }
                None
            }
            ServerMessage::Turn { turn, events } => self.handle_turn(turn, events),
            ServerMessage::GameEnded { .. } => {
                self.clean_after_game();
                self.draw()
            }
        }
    }

    /// Translates GUI input into what should be sent to the server.
    ///
    /// In the lobby every key press is a request to join.
    pub fn handle_input(&self, input: InputMessage) -> Option<ClientMessage> {
        match self.phase {
            ClientPhase::NotConnected => None,
            ClientPhase::Lobby => Some(ClientMessage::Join {
                name: self.player_name.clone(),
            }),
            ClientPhase::Game => Some(input.into()),
        }
    }

    fn add_player(&mut self, id: PlayerId, player: Player) {
        self.players
            .entry(id)
            .or_insert_with(|| PlayerInfo::new(id, player));
    }

    fn handle_turn(&mut self, turn: u16, events: Vec<Event>) -> Option<DrawMessage> {
        if self.phase != ClientPhase::Game {
            return None;
        }

        if turn > self.turn {
            let elapsed = turn - self.turn;
            for bomb in self.bombs.values_mut() {
                bomb.timer = bomb.timer.saturating_sub(elapsed);
            }
        }
        self.turn = turn;
        self.destroyed.clear();
        self.explosions.clear();

        for event in events {
            self.apply_event(event);
        }

        for id in &self.destroyed {
            if let Some(info) = self.players.get_mut(id) {
                info.score += 1;
            }
        }
        for cell in &self.explosions {
            self.blocks.remove(cell);
        }

        self.draw()
    }

    fn apply_event(&mut self, event: Event) {
        match event {
            Event::BombPlaced { id, position } => {
                self.bombs.insert(
                    id,
                    Bomb {
                        position,
                        timer: self.bomb_timer,
                    },
                );
            }
            Event::BombExploded {
                id,
                robots_destroyed,
                blocks_destroyed,
            } => {
                match self.bombs.remove(&id) {
                    Some(bomb) => {
                        let result = blast(
                            &self.board,
                            bomb.position,
                            self.explosion_radius,
                            |cell| self.blocks.contains(cell),
                        );
                        self.explosions.extend(result.cells);
                    }
                    None => warn!("Explosion of unknown bomb {}", id),
                }
                self.destroyed.extend(robots_destroyed);
                self.explosions.extend(blocks_destroyed);
            }
            Event::PlayerMoved { id, position } => match self.players.get_mut(&id) {
                Some(info) => info.position = position,
                None => warn!("Move of unknown player {}", id),
            },
            Event::BlockPlaced { position } => {
                self.blocks.insert(position);
            }
        }
    }

    fn clean_after_game(&mut self) {
        self.phase = ClientPhase::Lobby;
        self.turn = 0;
        self.players.clear();
        self.bombs.clear();
        self.blocks.clear();
        self.explosions.clear();
        self.destroyed.clear();
    }

    fn draw(&self) -> Option<DrawMessage> {
        match self.phase {
            ClientPhase::NotConnected => None,
            ClientPhase::Lobby => Some(DrawMessage::Lobby {
                server_name: self.server_name.clone(),
                players_count: self.players_count,
                size_x: self.board.size_x,
                size_y: self.board.size_y,
                game_length: self.game_length,
                explosion_radius: self.explosion_radius,
                bomb_timer: self.bomb_timer,
                players: self.roster(),
            }),
            ClientPhase::Game => Some(DrawMessage::Game {
                server_name: self.server_name.clone(),
                size_x: self.board.size_x,
                size_y: self.board.size_y,
                game_length: self.game_length,
                turn: self.turn,
                players: self.roster(),
                player_positions: self
                    .players
                    .iter()
                    .map(|(id, info)| (*id, info.position))
                    .collect(),
                blocks: self.blocks.iter().copied().collect(),
                bombs: self.bombs.values().copied().collect(),
                explosions: self.explosions.iter().copied().collect(),
                scores: self
                    .players
                    .iter()
                    .map(|(id, info)| (*id, info.score))
                    .collect(),
            }),
        }
    }

    fn roster(&self) -> BTreeMap<PlayerId, Player> {
        self.players
            .iter()
            .map(|(id, info)| (*id, info.player.clone()))
            .collect()
    }
}

//! Authoritative turn-based simulation.
//!
//! The server owns the only real copy of the board. Each turn it ages the
//! bombs, resolves explosions, applies at most one action per player and
//! reports everything that happened as an ordered list of events.

use crate::config::ServerConfig;
use crate::rng::MinStdRng;
use log::{info, warn};
use rand::RngCore;
use shared::{
    blast, Bomb, BombId, Board, ClientMessage, Direction, Event, Player, PlayerId, PlayerInfo,
    Position, ServerMessage,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    Game,
}

#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    players_count: u8,
    game_length: u16,
    bomb_timer: u16,
    explosion_radius: u16,
    initial_blocks: u16,

    phase: Phase,
    /// Number of the next turn to be produced.
    turn: u32,
    players: BTreeMap<PlayerId, PlayerInfo>,
    bombs: BTreeMap<BombId, Bomb>,
    blocks: HashSet<Position>,
    next_bomb_id: BombId,
    rng: MinStdRng,
}

impl GameState {
    /// Creates an empty lobby for games played under `config`.
    ///
    /// `config` must pass [`ServerConfig::validate`]: random cells are drawn
    /// modulo the board size, which must not be zero.
    pub fn new(config: &ServerConfig) -> Self {
        debug_assert!(config.validate().is_ok(), "invalid game config");
        Self {
            board: Board::new(config.size_x, config.size_y),
            players_count: config.players_count,
            game_length: config.game_length,
            bomb_timer: config.bomb_timer,
            explosion_radius: config.explosion_radius,
            initial_blocks: config.initial_blocks,
            phase: Phase::Lobby,
            turn: 0,
            players: BTreeMap::new(),
            bombs: BTreeMap::new(),
            blocks: HashSet::new(),
            next_bomb_id: 0,
            rng: MinStdRng::new(config.seed),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn players(&self) -> &BTreeMap<PlayerId, PlayerInfo> {
        &self.players
    }

    pub fn bombs(&self) -> &BTreeMap<BombId, Bomb> {
        &self.bombs
    }

    pub fn blocks(&self) -> &HashSet<Position> {
        &self.blocks
    }

    /// Accepts a player into the lobby.
    ///
    /// Returns the `AcceptedPlayer` announcement, or `None` when a game is
    /// running, the lobby is full, or `address` already has a player.
    pub fn handle_join(&mut self, name: String, address: String) -> Option<ServerMessage> {
        if self.phase != Phase::Lobby || self.players.len() >= usize::from(self.players_count) {
            return None;
        }
        if self.players.values().any(|p| p.player.address == address) {
            return None;
        }

        let id = self.players.len() as PlayerId;
        let player = Player { name, address };
        info!("Player {} ({}) joined from {}", id, player.name, player.address);
        self.players.insert(id, PlayerInfo::new(id, player.clone()));

        Some(ServerMessage::AcceptedPlayer { id, player })
    }

    pub fn is_enough_players(&self) -> bool {
        self.players.len() >= usize::from(self.players_count)
    }

    pub fn is_end_of_game(&self) -> bool {
        self.turn > u32::from(self.game_length)
    }

    /// Leaves the lobby and lays out the board.
    ///
    /// Returns `GameStarted` followed by turn 0, which places every player
    /// and the initial blocks.
    pub fn start_game(&mut self) -> (ServerMessage, ServerMessage) {
        self.phase = Phase::Game;
        self.next_bomb_id = 0;
        let mut events = Vec::new();

        let ids: Vec<PlayerId> = self.players.keys().copied().collect();
        for id in ids {
            let position = self.random_position();
            if let Some(info) = self.players.get_mut(&id) {
                info.position = position;
            }
            events.push(Event::PlayerMoved { id, position });
        }

        for _ in 0..self.initial_blocks {
            let position = self.random_position();
            if self.blocks.insert(position) {
                events.push(Event::BlockPlaced { position });
            }
        }

        info!(
            "Game started with {} players and {} blocks",
            self.players.len(),
            self.blocks.len()
        );

        let players = self
            .players
            .iter()
            .map(|(id, info)| (*id, info.player.clone()))
            .collect();

        (
            ServerMessage::GameStarted { players },
            self.finish_turn(events),
        )
    }

    /// Advances the game by one turn using each player's latest action.
    pub fn handle_turn(&mut self, messages: &HashMap<PlayerId, ClientMessage>) -> ServerMessage {
        let mut events = Vec::new();
        let mut destroyed_robots = BTreeSet::new();
        let mut destroyed_blocks = HashSet::new();

        let mut exploding = Vec::new();
        for (id, bomb) in self.bombs.iter_mut() {
            bomb.timer = bomb.timer.saturating_sub(1);
            if bomb.timer == 0 {
                exploding.push((*id, bomb.position));
            }
        }

        for (id, position) in exploding {
            self.bombs.remove(&id);
            let result = blast(&self.board, position, self.explosion_radius, |cell| {
                self.blocks.contains(cell)
            });

            let robots_destroyed: Vec<PlayerId> = result
                .cells
                .iter()
                .flat_map(|cell| self.players_at(*cell))
                .collect();

            destroyed_robots.extend(robots_destroyed.iter().copied());
            destroyed_blocks.extend(result.blocks.iter().copied());
            events.push(Event::BombExploded {
                id,
                robots_destroyed,
                blocks_destroyed: result.blocks,
            });
        }

        let ids: Vec<PlayerId> = self.players.keys().copied().collect();
        for id in ids {
            if destroyed_robots.contains(&id) {
                self.respawn(id, &mut events);
            } else if let Some(message) = messages.get(&id) {
                self.apply_action(id, message, &mut events);
            }
        }

        for position in &destroyed_blocks {
            self.blocks.remove(position);
        }

        self.finish_turn(events)
    }

    /// Closes the game, returning final scores and going back to the lobby.
    pub fn end_game(&mut self) -> ServerMessage {
        let scores = self
            .players
            .iter()
            .map(|(id, info)| (*id, info.score))
            .collect();

        info!("Game ended after {} turns", self.turn.saturating_sub(1));

        self.phase = Phase::Lobby;
        self.turn = 0;
        self.players.clear();
        self.bombs.clear();
        self.blocks.clear();

        ServerMessage::GameEnded { scores }
    }

    fn finish_turn(&mut self, events: Vec<Event>) -> ServerMessage {
        let turn = self.turn as u16;
        self.turn += 1;
        ServerMessage::Turn { turn, events }
    }

    fn players_at(&self, position: Position) -> Vec<PlayerId> {
        self.players
            .values()
            .filter(|info| info.position == position)
            .map(|info| info.id)
            .collect()
    }

    fn random_position(&mut self) -> Position {
        let x = self.rng.next_u32() % u32::from(self.board.size_x);
        let y = self.rng.next_u32() % u32::from(self.board.size_y);
        Position::new(x as u16, y as u16)
    }

    fn respawn(&mut self, id: PlayerId, events: &mut Vec<Event>) {
        let position = self.random_position();
        if let Some(info) = self.players.get_mut(&id) {
            info.score += 1;
            info.position = position;
            events.push(Event::PlayerMoved { id, position });
        }
    }

    fn apply_action(&mut self, id: PlayerId, message: &ClientMessage, events: &mut Vec<Event>) {
        let Some(position) = self.players.get(&id).map(|info| info.position) else {
            return;
        };

        match message {
            ClientMessage::Join { .. } => {
                warn!("Join from player {} ignored during game", id);
            }
            ClientMessage::PlaceBomb => {
                let bomb_id = self.next_bomb_id;
                self.next_bomb_id += 1;
                self.bombs.insert(
                    bomb_id,
                    Bomb {
                        position,
                        timer: self.bomb_timer,
                    },
                );
                events.push(Event::BombPlaced {
                    id: bomb_id,
                    position,
                });
            }
            ClientMessage::PlaceBlock => {
                if self.blocks.insert(position) {
                    events.push(Event::BlockPlaced { position });
                }
            }
            ClientMessage::Move { direction } => self.apply_move(id, position, *direction, events),
        }
    }

    fn apply_move(
        &mut self,
        id: PlayerId,
        from: Position,
        direction: Direction,
        events: &mut Vec<Event>,
    ) {
        let Some(target) = self.board.step(from, direction) else {
            return;
        };
        if self.blocks.contains(&target) {
            return;
        }
        if let Some(info) = self.players.get_mut(&id) {
            info.position = target;
            events.push(Event::PlayerMoved {
                id,
                position: target,
            });
        }
    }
}

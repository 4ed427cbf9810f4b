//! The match state machine: turns square clicks into moves, runs the computer's search in the
//! background, and reports everything that happens to registered listeners.
//!
//! The manager is not thread-safe, but the search it starts runs on its own thread. Results are
//! only applied when the owner calls one of the `resolve_pc_move` methods, or `poll_pc_move`.

use std::error;
use std::fmt;
use std::ops::RangeInclusive;

use async_channel::{Receiver, Sender, TryRecvError};
use log::{debug, error, info};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::move_gen::find_moves;
use crate::position::{Move, Position, Side, Square};
use crate::search::worker::{spawn_search, SearchHandle, SearchJob, SearchReply};

/// State changes reported to listeners
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StateChange {
    TurnPlayer,
    TurnPc,
    PlayerWon,
    PcWon,
    /// The player selected a piece that cannot move
    IllegalSelection,
    /// The selected piece cannot reach the clicked square
    IllegalMove,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Outcome {
    InProgress,
    PlayerWon,
    PcWon,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MatchState {
    /// No match has been started
    Idle,
    AwaitingSelection,
    PieceSelected(Square),
    /// The computer's search is running
    PcTurn,
    PlayerWon,
    PcWon,
}

/// Receives match events. All methods default to doing nothing.
pub trait MatchListener {
    fn on_state_change(&mut self, _change: StateChange) {}

    fn on_square_selected(&mut self, _square: Square) {}

    fn on_square_possible_move(&mut self, _square: Square) {}

    /// Clears the selection and all possible move highlights
    fn on_square_clear(&mut self) {}

    /// The whole board changed. `first_player` decides which side is drawn as white.
    fn on_position_update(&mut self, _position: &Position, _first_player: Side) {}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub struct ListenerId(u64);

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct InvalidDifficulty {
    pub requested: u16,
    pub allowed: RangeInclusive<u16>,
}

impl fmt::Display for InvalidDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Difficulty {} is outside the supported range {}..={}",
            self.requested,
            self.allowed.start(),
            self.allowed.end()
        )
    }
}

impl error::Error for InvalidDifficulty {}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MatchSettings {
    difficulties: RangeInclusive<u16>,
    default_difficulty: u16,
    shuffle_moves: bool,
    seed: Option<u64>,
}

impl Default for MatchSettings {
    fn default() -> Self {
        MatchSettings {
            difficulties: 0..=12,
            default_difficulty: 3,
            shuffle_moves: true,
            seed: None,
        }
    }
}

impl MatchSettings {
    pub fn add_difficulties(self, difficulties: RangeInclusive<u16>) -> Self {
        assert!(!difficulties.is_empty(), "Empty difficulty range");
        let default_difficulty = self
            .default_difficulty
            .clamp(*difficulties.start(), *difficulties.end());
        MatchSettings {
            difficulties,
            default_difficulty,
            ..self
        }
    }

    pub fn add_default_difficulty(self, default_difficulty: u16) -> Self {
        assert!(self.difficulties.contains(&default_difficulty));
        MatchSettings {
            default_difficulty,
            ..self
        }
    }

    /// If false, the computer always picks the first of its equally good moves
    pub fn add_shuffle_moves(self, shuffle_moves: bool) -> Self {
        MatchSettings {
            shuffle_moves,
            ..self
        }
    }

    /// Makes the computer's choices between equally good moves reproducible
    pub fn add_seed(self, seed: u64) -> Self {
        MatchSettings {
            seed: Some(seed),
            ..self
        }
    }

    pub fn difficulties(&self) -> RangeInclusive<u16> {
        self.difficulties.clone()
    }

    pub fn default_difficulty(&self) -> u16 {
        self.default_difficulty
    }

    pub fn check_difficulty(&self, difficulty: u16) -> Result<(), InvalidDifficulty> {
        if self.difficulties.contains(&difficulty) {
            Ok(())
        } else {
            Err(InvalidDifficulty {
                requested: difficulty,
                allowed: self.difficulties.clone(),
            })
        }
    }
}

pub struct MatchManager {
    settings: MatchSettings,
    position: Position,
    /// The player's legal moves in the current position
    moves: Vec<Move>,
    state: MatchState,
    difficulty: u16,
    pc_first: bool,
    listeners: Vec<(ListenerId, Box<dyn MatchListener>)>,
    next_listener_id: u64,
    search: Option<SearchHandle>,
    /// Generation of the most recently started search
    generation: u64,
    reply_sender: Sender<SearchReply>,
    reply_receiver: Receiver<SearchReply>,
    rng: SmallRng,
}

impl Default for MatchManager {
    fn default() -> Self {
        Self::new(MatchSettings::default())
    }
}

impl Drop for MatchManager {
    fn drop(&mut self) {
        self.cancel_search();
    }
}

impl MatchManager {
    /// Creates the manager. Call `new_match` to start playing.
    pub fn new(settings: MatchSettings) -> Self {
        let (reply_sender, reply_receiver) = async_channel::unbounded();
        let rng = match settings.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        MatchManager {
            difficulty: settings.default_difficulty,
            settings,
            position: Position::start_position(),
            moves: vec![],
            state: MatchState::Idle,
            pc_first: false,
            listeners: vec![],
            next_listener_id: 0,
            search: None,
            generation: 0,
            reply_sender,
            reply_receiver,
            rng,
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn MatchListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Returns the listener, or `None` if it was not registered
    pub fn remove_listener(&mut self, id: ListenerId) -> Option<Box<dyn MatchListener>> {
        let index = self
            .listeners
            .iter()
            .position(|(listener_id, _)| *listener_id == id)?;
        Some(self.listeners.remove(index).1)
    }

    /// Starts a new match from the starting position, aborting the current one
    pub fn new_match(&mut self, difficulty: u16, pc_first: bool) -> Result<(), InvalidDifficulty> {
        self.settings.check_difficulty(difficulty)?;
        info!(
            "New match at difficulty {}, {} moves first",
            difficulty,
            if pc_first { Side::Pc } else { Side::Player }
        );
        self.pc_first = pc_first;
        self.start(difficulty, Position::start_position(), pc_first);
        Ok(())
    }

    /// Starts a match from an arbitrary position, with either side to move
    pub fn start_from_position(
        &mut self,
        difficulty: u16,
        position: Position,
        pc_to_move: bool,
    ) -> Result<(), InvalidDifficulty> {
        self.settings.check_difficulty(difficulty)?;
        info!(
            "New match from position at difficulty {}:{:?}",
            difficulty, position
        );
        self.start(difficulty, position, pc_to_move);
        Ok(())
    }

    /// Restarts the match at the new difficulty
    pub fn change_difficulty(&mut self, difficulty: u16) -> Result<(), InvalidDifficulty> {
        self.new_match(difficulty, self.pc_first)
    }

    /// Restarts the match with the other side moving first
    pub fn flip_first_player(&mut self) {
        self.pc_first = !self.pc_first;
        info!(
            "Restarting match, {} moves first",
            if self.pc_first { Side::Pc } else { Side::Player }
        );
        self.start(self.difficulty, Position::start_position(), self.pc_first);
    }

    fn start(&mut self, difficulty: u16, position: Position, pc_to_move: bool) {
        self.cancel_search();
        self.difficulty = difficulty;
        self.position = position;
        self.moves.clear();
        self.state = MatchState::AwaitingSelection;
        self.notify_square_clear();
        self.notify_position_update();

        if pc_to_move {
            self.start_pc_turn();
        } else {
            self.start_player_turn();
        }
    }

    pub fn difficulty(&self) -> u16 {
        self.difficulty
    }

    /// True if a match has started and is not over
    pub fn is_playing(&self) -> bool {
        !matches!(
            self.state,
            MatchState::Idle | MatchState::PlayerWon | MatchState::PcWon
        )
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self.state, MatchState::PlayerWon | MatchState::PcWon)
    }

    pub fn outcome(&self) -> Outcome {
        match self.state {
            MatchState::PlayerWon => Outcome::PlayerWon,
            MatchState::PcWon => Outcome::PcWon,
            _ => Outcome::InProgress,
        }
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The player's legal moves. Empty while the computer is thinking.
    pub fn legal_moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn selected_square(&self) -> Option<Square> {
        match self.state {
            MatchState::PieceSelected(square) => Some(square),
            _ => None,
        }
    }

    pub fn pc_plays_first(&self) -> bool {
        self.pc_first
    }

    pub fn first_player(&self) -> Side {
        if self.pc_first {
            Side::Pc
        } else {
            Side::Player
        }
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    /// Handles a click on a board square. Ignored unless the player is to move.
    pub fn square_clicked(&mut self, square: Square) {
        let selected = match self.state {
            MatchState::AwaitingSelection => None,
            MatchState::PieceSelected(selected) => Some(selected),
            state => {
                debug!("Ignoring click on {} in state {:?}", square, state);
                return;
            }
        };
        debug!("Square {} clicked, selection {:?}", square, selected);
        let clicked_players_piece =
            self.position[square].is_some_and(|piece| piece.side() == Side::Player);

        let Some(selected) = selected else {
            if clicked_players_piece {
                self.select(square);
            }
            return;
        };

        if clicked_players_piece {
            self.notify_square_clear();
            self.state = MatchState::AwaitingSelection;
            if square != selected {
                self.select(square);
            }
            return;
        }

        if self.position[square].is_some() || !square.is_playable() {
            self.notify_square_clear();
            self.state = MatchState::AwaitingSelection;
            return;
        }

        self.notify_square_clear();
        match self.find_player_move(selected, square) {
            Some(index) => {
                let mv = self.moves.swap_remove(index);
                self.moves.clear();
                debug!("Player plays {}", mv.to_string(&self.position, Side::Player));
                self.position = mv.into_resulting_position();
                self.notify_position_update();
                self.start_pc_turn();
            }
            None => {
                self.state = MatchState::AwaitingSelection;
                self.notify_state_change(StateChange::IllegalMove);
            }
        }
    }

    /// Selects the piece on `square` if it has any moves, highlighting its destinations
    fn select(&mut self, square: Square) {
        let destinations: Vec<Square> = self
            .moves
            .iter()
            .filter(|mv| mv.resulting_position()[square].is_none())
            .filter_map(|mv| mv.destination(&self.position))
            .collect();

        if destinations.is_empty() {
            self.state = MatchState::AwaitingSelection;
            self.notify_state_change(StateChange::IllegalSelection);
            return;
        }
        self.state = MatchState::PieceSelected(square);
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_square_selected(square);
        }
        for destination in destinations {
            for (_, listener) in self.listeners.iter_mut() {
                listener.on_square_possible_move(destination);
            }
        }
    }

    /// Index of the legal move that takes the piece on `from` to `to`.
    /// With several capture chains between the same squares, the first one generated wins.
    fn find_player_move(&self, from: Square, to: Square) -> Option<usize> {
        self.moves.iter().position(|mv| {
            mv.resulting_position()[from].is_none()
                && mv.resulting_position()[to].is_some_and(|piece| piece.side() == Side::Player)
        })
    }

    fn start_player_turn(&mut self) {
        self.moves = find_moves(&self.position, Side::Player);
        if self.moves.is_empty() {
            self.finish(MatchState::PcWon);
        } else {
            self.state = MatchState::AwaitingSelection;
            self.notify_state_change(StateChange::TurnPlayer);
        }
    }

    fn start_pc_turn(&mut self) {
        self.state = MatchState::PcTurn;
        self.notify_state_change(StateChange::TurnPc);

        self.generation += 1;
        let job = SearchJob {
            generation: self.generation,
            position: self.position.clone(),
            depth: self.difficulty,
            seed: if self.settings.shuffle_moves {
                Some(self.rng.gen())
            } else {
                None
            },
        };
        match spawn_search(job, self.reply_sender.clone()) {
            Ok(handle) => self.search = Some(handle),
            Err(err) => {
                error!("Failed to spawn search thread: {}", err);
                panic!("Failed to spawn search thread: {}", err);
            }
        }
    }

    fn cancel_search(&mut self) {
        if let Some(search) = self.search.take() {
            debug!("Aborting search {}", search.generation());
            search.abort();
        }
    }

    /// Applies the computer's move if its search has finished. Returns true if a move was applied,
    /// or the game ended.
    pub fn poll_pc_move(&mut self) -> bool {
        while self.search.is_some() {
            match self.reply_receiver.try_recv() {
                Ok(reply) => {
                    if self.handle_reply(reply) {
                        return true;
                    }
                }
                Err(TryRecvError::Empty) => return false,
                Err(TryRecvError::Closed) => unreachable!("The manager holds a sender"),
            }
        }
        false
    }

    /// Waits for the computer's search to finish and applies its move.
    /// Returns immediately if no search is running.
    pub fn resolve_pc_move_blocking(&mut self) {
        while self.search.is_some() {
            match self.reply_receiver.recv_blocking() {
                Ok(reply) => {
                    self.handle_reply(reply);
                }
                Err(_) => unreachable!("The manager holds a sender"),
            }
        }
    }

    /// Async version of `resolve_pc_move_blocking`
    pub async fn resolve_pc_move(&mut self) {
        while self.search.is_some() {
            match self.reply_receiver.recv().await {
                Ok(reply) => {
                    self.handle_reply(reply);
                }
                Err(_) => unreachable!("The manager holds a sender"),
            }
        }
    }

    /// Returns false if the reply was stale, and discarded
    fn handle_reply(&mut self, reply: SearchReply) -> bool {
        if reply.generation > self.generation {
            error!(
                "Received reply for search {}, but only {} were started",
                reply.generation, self.generation
            );
            panic!("Search reply from a search that was never started");
        }
        match &self.search {
            Some(search) if search.generation() == reply.generation => (),
            _ => {
                debug!("Discarding result of cancelled search {}", reply.generation);
                return false;
            }
        }
        self.search = None;

        match reply.best_move {
            None => {
                info!("Computer cannot move, player won");
                self.finish(MatchState::PlayerWon);
            }
            Some(mv) => {
                debug!("Computer plays {}", mv.to_string(&self.position, Side::Pc));
                self.position = mv.into_resulting_position();
                self.notify_position_update();
                self.start_player_turn();
            }
        }
        true
    }

    fn finish(&mut self, state: MatchState) {
        self.moves.clear();
        self.state = state;
        match state {
            MatchState::PlayerWon => self.notify_state_change(StateChange::PlayerWon),
            MatchState::PcWon => {
                info!("Player cannot move, computer won");
                self.notify_state_change(StateChange::PcWon)
            }
            _ => unreachable!("{:?} is not a final state", state),
        }
    }

    fn notify_state_change(&mut self, change: StateChange) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_state_change(change);
        }
    }

    fn notify_square_clear(&mut self) {
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_square_clear();
        }
    }

    fn notify_position_update(&mut self) {
        let first_player = self.first_player();
        for (_, listener) in self.listeners.iter_mut() {
            listener.on_position_update(&self.position, first_player);
        }
    }
}


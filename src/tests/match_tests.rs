use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use crate::match_manager::{
    MatchListener, MatchManager, MatchSettings, MatchState, Outcome, StateChange,
};
use crate::position::{Position, Side, Square};
use crate::tests::{position_from_diagram, square};

#[derive(Clone, PartialEq, Eq, Debug)]
enum Event {
    State(StateChange),
    Selected(Square),
    PossibleMove(Square),
    Clear,
    Position(Position, Side),
}

type Events = Rc<RefCell<Vec<Event>>>;

struct RecordingListener {
    events: Events,
}

impl MatchListener for RecordingListener {
    fn on_state_change(&mut self, change: StateChange) {
        self.events.borrow_mut().push(Event::State(change));
    }

    fn on_square_selected(&mut self, square: Square) {
        self.events.borrow_mut().push(Event::Selected(square));
    }

    fn on_square_possible_move(&mut self, square: Square) {
        self.events.borrow_mut().push(Event::PossibleMove(square));
    }

    fn on_square_clear(&mut self) {
        self.events.borrow_mut().push(Event::Clear);
    }

    fn on_position_update(&mut self, position: &Position, first_player: Side) {
        self.events
            .borrow_mut()
            .push(Event::Position(position.clone(), first_player));
    }
}

fn recorded_manager(settings: MatchSettings) -> (MatchManager, Events) {
    let events = Events::default();
    let mut manager = MatchManager::new(settings);
    manager.add_listener(Box::new(RecordingListener {
        events: events.clone(),
    }));
    (manager, events)
}

fn take_events(events: &Events) -> Vec<Event> {
    events.borrow_mut().drain(..).collect()
}

fn started_match() -> (MatchManager, Events) {
    let (mut manager, events) = recorded_manager(MatchSettings::default().add_seed(5));
    manager.new_match(2, false).unwrap();
    take_events(&events);
    (manager, events)
}

fn blocked_pc_position() -> Position {
    position_from_diagram(
        "
        x.......
        .o......
        ..o.....
        ........
        ........
        ........
        ........
        ........
        ",
    )
}

#[test]
fn invalid_difficulty_test() {
    let (mut manager, events) = recorded_manager(MatchSettings::default());
    let err = manager.new_match(13, false).unwrap_err();
    assert_eq!(err.requested, 13);
    assert_eq!(err.allowed, 0..=12);
    assert!(events.borrow().is_empty());
    assert_eq!(manager.state(), MatchState::Idle);
    assert!(!manager.is_playing());
    assert_eq!(manager.outcome(), Outcome::InProgress);

    let (mut manager, _events) =
        recorded_manager(MatchSettings::default().add_difficulties(2..=4));
    assert_eq!(manager.difficulty(), 3);
    assert!(manager.new_match(1, false).is_err());
    assert!(manager.new_match(4, false).is_ok());
}

#[test]
fn new_match_test() {
    let (mut manager, events) = recorded_manager(MatchSettings::default());
    manager.new_match(3, false).unwrap();
    assert_eq!(
        take_events(&events),
        vec![
            Event::Clear,
            Event::Position(Position::start_position(), Side::Player),
            Event::State(StateChange::TurnPlayer)
        ]
    );
    assert!(manager.is_playing());
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
    assert_eq!(manager.difficulty(), 3);
    assert_eq!(manager.legal_moves().len(), 7);
    assert_eq!(manager.first_player(), Side::Player);
}

#[test]
fn select_piece_test() {
    let (mut manager, events) = started_match();
    manager.square_clicked(square("b3"));
    assert_eq!(
        take_events(&events),
        vec![
            Event::Selected(square("b3")),
            Event::PossibleMove(square("a4")),
            Event::PossibleMove(square("c4"))
        ]
    );
    assert_eq!(manager.selected_square(), Some(square("b3")));

    // Clicking the selected piece again deselects it
    manager.square_clicked(square("b3"));
    assert_eq!(take_events(&events), vec![Event::Clear]);
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
}

#[test]
fn illegal_selection_test() {
    let (mut manager, events) = started_match();
    manager.square_clicked(square("a2"));
    assert_eq!(
        take_events(&events),
        vec![Event::State(StateChange::IllegalSelection)]
    );
    assert_eq!(manager.state(), MatchState::AwaitingSelection);

    // Computer pieces and empty squares are not selectable
    manager.square_clicked(square("a6"));
    manager.square_clicked(square("c4"));
    assert!(take_events(&events).is_empty());
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
}

#[test]
fn change_selection_test() {
    let (mut manager, events) = started_match();
    manager.square_clicked(square("b3"));
    take_events(&events);
    manager.square_clicked(square("d3"));
    assert_eq!(
        take_events(&events),
        vec![
            Event::Clear,
            Event::Selected(square("d3")),
            Event::PossibleMove(square("c4")),
            Event::PossibleMove(square("e4"))
        ]
    );
    assert_eq!(manager.selected_square(), Some(square("d3")));

    // A blocked piece clears the selection
    manager.square_clicked(square("c2"));
    assert_eq!(
        take_events(&events),
        vec![Event::Clear, Event::State(StateChange::IllegalSelection)]
    );
    assert_eq!(manager.selected_square(), None);
}

#[test]
fn deselect_test() {
    let (mut manager, events) = started_match();

    // Light square
    manager.square_clicked(square("b3"));
    take_events(&events);
    manager.square_clicked(square("b4"));
    assert_eq!(take_events(&events), vec![Event::Clear]);
    assert_eq!(manager.state(), MatchState::AwaitingSelection);

    // Computer piece
    manager.square_clicked(square("b3"));
    take_events(&events);
    manager.square_clicked(square("a6"));
    assert_eq!(take_events(&events), vec![Event::Clear]);
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
    assert_eq!(*manager.position(), Position::start_position());
}

#[test]
fn illegal_move_test() {
    let (mut manager, events) = started_match();
    manager.square_clicked(square("b3"));
    take_events(&events);
    manager.square_clicked(square("e4"));
    assert_eq!(
        take_events(&events),
        vec![Event::Clear, Event::State(StateChange::IllegalMove)]
    );
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
    assert_eq!(*manager.position(), Position::start_position());
}

#[test]
fn play_move_test() {
    let (mut manager, events) = started_match();
    manager.square_clicked(square("b3"));
    take_events(&events);
    manager.square_clicked(square("a4"));

    let mut expected_position = Position::start_position();
    let pawn = expected_position[square("b3")].take();
    expected_position[square("a4")] = pawn;
    assert_eq!(
        take_events(&events),
        vec![
            Event::Clear,
            Event::Position(expected_position.clone(), Side::Player),
            Event::State(StateChange::TurnPc)
        ]
    );
    assert_eq!(manager.state(), MatchState::PcTurn);
    assert!(manager.legal_moves().is_empty());

    // Clicks are ignored while the computer thinks
    manager.square_clicked(square("d3"));
    assert!(take_events(&events).is_empty());

    manager.resolve_pc_move_blocking();
    let events = take_events(&events);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], Event::Position(_, Side::Player)));
    assert_eq!(events[1], Event::State(StateChange::TurnPlayer));

    let position = manager.position();
    assert_ne!(*position, expected_position);
    assert_eq!(position.piece_count(Side::Pc), 12);
    assert_eq!(position.piece_count(Side::Player), 12);
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
    assert!(!manager.legal_moves().is_empty());
}

#[test]
fn pc_moves_first_test() {
    let (mut manager, events) = recorded_manager(MatchSettings::default());
    manager.new_match(1, true).unwrap();
    assert_eq!(
        take_events(&events),
        vec![
            Event::Clear,
            Event::Position(Position::start_position(), Side::Pc),
            Event::State(StateChange::TurnPc)
        ]
    );
    assert_eq!(manager.first_player(), Side::Pc);

    manager.resolve_pc_move_blocking();
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
    assert_eq!(
        manager
            .position()
            .pieces()
            .filter(|(square, _)| square.row() == 3)
            .count(),
        1
    );
}

#[test]
fn player_wins_test() {
    let (mut manager, events) = recorded_manager(MatchSettings::default());
    manager
        .start_from_position(2, blocked_pc_position(), true)
        .unwrap();
    manager.resolve_pc_move_blocking();
    assert_eq!(
        take_events(&events),
        vec![
            Event::Clear,
            Event::Position(blocked_pc_position(), Side::Player),
            Event::State(StateChange::TurnPc),
            Event::State(StateChange::PlayerWon)
        ]
    );
    assert_eq!(manager.state(), MatchState::PlayerWon);
    assert_eq!(manager.outcome(), Outcome::PlayerWon);
    assert!(manager.is_game_over());
    assert!(!manager.is_playing());

    manager.square_clicked(square("b7"));
    assert!(take_events(&events).is_empty());
}

#[test]
fn pc_wins_by_search_test() {
    let (mut manager, events) = recorded_manager(MatchSettings::default());
    let position = position_from_diagram(
        "
        ........
        ........
        ..x.....
        ...o....
        ........
        ........
        ........
        ........
        ",
    );
    manager.start_from_position(4, position, true).unwrap();
    manager.resolve_pc_move_blocking();
    assert_eq!(manager.outcome(), Outcome::PcWon);
    assert_eq!(manager.position().piece_count(Side::Player), 0);
    assert_eq!(
        events.borrow().last(),
        Some(&Event::State(StateChange::PcWon))
    );
}

#[test]
fn pc_wins_when_player_is_blocked_test() {
    let (mut manager, events) = recorded_manager(MatchSettings::default());
    let position = position_from_diagram(
        "
        ........
        ........
        ........
        ........
        ........
        ...x....
        x.x.....
        .o......
        ",
    );
    manager.start_from_position(3, position, false).unwrap();
    assert_eq!(manager.state(), MatchState::PcWon);
    assert_eq!(
        take_events(&events).last(),
        Some(&Event::State(StateChange::PcWon))
    );
    manager.resolve_pc_move_blocking();
    assert_eq!(manager.state(), MatchState::PcWon);
}

#[test]
fn change_difficulty_test() {
    let (mut manager, events) = started_match();
    manager.square_clicked(square("b3"));
    manager.square_clicked(square("a4"));
    manager.resolve_pc_move_blocking();
    take_events(&events);

    assert!(manager.change_difficulty(20).is_err());
    assert_eq!(manager.difficulty(), 2);
    assert!(take_events(&events).is_empty());

    manager.change_difficulty(5).unwrap();
    assert_eq!(manager.difficulty(), 5);
    assert_eq!(*manager.position(), Position::start_position());
    assert_eq!(
        take_events(&events).last(),
        Some(&Event::State(StateChange::TurnPlayer))
    );
}

#[test]
fn flip_first_player_test() {
    let (mut manager, events) = started_match();
    manager.flip_first_player();
    assert!(manager.pc_plays_first());
    assert_eq!(manager.state(), MatchState::PcTurn);
    assert_eq!(manager.difficulty(), 2);
    assert_eq!(
        take_events(&events),
        vec![
            Event::Clear,
            Event::Position(Position::start_position(), Side::Pc),
            Event::State(StateChange::TurnPc)
        ]
    );
    manager.resolve_pc_move_blocking();
    assert_eq!(manager.state(), MatchState::AwaitingSelection);

    manager.flip_first_player();
    assert!(!manager.pc_plays_first());
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
    assert_eq!(*manager.position(), Position::start_position());
}

#[test]
fn stale_search_result_is_discarded_test() {
    let (mut manager, _events) = recorded_manager(MatchSettings::default());
    manager.new_match(1, true).unwrap();
    // Let the search finish, so its reply is waiting in the channel
    thread::sleep(Duration::from_millis(200));
    manager.new_match(1, false).unwrap();

    assert!(!manager.poll_pc_move());
    assert_eq!(*manager.position(), Position::start_position());
    assert_eq!(manager.state(), MatchState::AwaitingSelection);

    manager.square_clicked(square("b3"));
    manager.square_clicked(square("a4"));
    manager.resolve_pc_move_blocking();
    let position = manager.position();
    assert_eq!(position[square("a4")].map(|piece| piece.side()), Some(Side::Player));
    assert_eq!(position[square("b3")], None);
    assert_eq!(
        position
            .pieces()
            .filter(|(square, piece)| piece.side() == Side::Pc && square.row() == 3)
            .count(),
        1
    );
}

#[test]
fn aborted_search_is_replaced_test() {
    let (mut manager, _events) = recorded_manager(MatchSettings::default());
    manager.new_match(12, true).unwrap();
    manager.new_match(0, false).unwrap();
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
    assert_eq!(manager.difficulty(), 0);
    assert_eq!(*manager.position(), Position::start_position());
}

#[test]
fn poll_pc_move_test() {
    let (mut manager, _events) = recorded_manager(MatchSettings::default());
    manager.new_match(1, true).unwrap();
    let mut polls = 0;
    while !manager.poll_pc_move() {
        polls += 1;
        assert!(polls < 1000, "Search did not finish");
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
    assert!(!manager.poll_pc_move());
}

#[test]
fn async_resolve_test() {
    let (mut manager, _events) = recorded_manager(MatchSettings::default());
    manager.new_match(2, true).unwrap();
    smol::block_on(manager.resolve_pc_move());
    assert_eq!(manager.state(), MatchState::AwaitingSelection);
    assert_eq!(manager.position().piece_count(Side::Pc), 12);
}

#[test]
fn seeded_matches_are_reproducible_test() {
    let play = |seed| {
        let (mut manager, _events) = recorded_manager(MatchSettings::default().add_seed(seed));
        manager.new_match(2, true).unwrap();
        manager.resolve_pc_move_blocking();
        manager.position().clone()
    };
    assert_eq!(play(9), play(9));

    let (mut manager, _events) =
        recorded_manager(MatchSettings::default().add_shuffle_moves(false));
    manager.new_match(2, true).unwrap();
    manager.resolve_pc_move_blocking();
    let first = manager.position().clone();
    manager.new_match(2, true).unwrap();
    manager.resolve_pc_move_blocking();
    assert_eq!(*manager.position(), first);
}

#[test]
fn listeners_test() {
    let first = Events::default();
    let second = Events::default();
    let mut manager = MatchManager::default();
    let first_id = manager.add_listener(Box::new(RecordingListener {
        events: first.clone(),
    }));
    manager.add_listener(Box::new(RecordingListener {
        events: second.clone(),
    }));

    manager.new_match(1, false).unwrap();
    assert_eq!(take_events(&first).len(), 3);
    assert_eq!(take_events(&second).len(), 3);

    assert!(manager.remove_listener(first_id).is_some());
    assert!(manager.remove_listener(first_id).is_none());
    manager.square_clicked(square("b3"));
    assert!(first.borrow().is_empty());
    assert_eq!(take_events(&second).len(), 3);
}

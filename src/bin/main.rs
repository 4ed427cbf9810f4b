use std::io;
use std::io::BufRead;

use board_game_traits::Color;
use clap::{Arg, ArgAction, Command};
use log::{info, warn};

use dama::match_manager::{MatchListener, MatchManager, MatchSettings, MatchState, StateChange};
use dama::move_gen;
use dama::position::{Position, Side, Square, BOARD_WIDTH};

/// Prints every match event to stdout
struct TerminalListener;

impl MatchListener for TerminalListener {
    fn on_state_change(&mut self, change: StateChange) {
        match change {
            StateChange::TurnPlayer => println!("Your turn."),
            StateChange::TurnPc => println!("Computer is thinking..."),
            StateChange::PlayerWon => println!("You won! Type \"new\" to play again."),
            StateChange::PcWon => println!("The computer won. Type \"new\" to play again."),
            StateChange::IllegalSelection => println!("That piece cannot move."),
            StateChange::IllegalMove => println!("Illegal move."),
        }
    }

    fn on_square_selected(&mut self, square: Square) {
        println!("Selected {}", square);
    }

    fn on_square_possible_move(&mut self, square: Square) {
        println!("  can move to {}", square);
    }

    fn on_position_update(&mut self, position: &Position, first_player: Side) {
        print_position(position, first_player);
    }
}

fn print_position(position: &Position, first_player: Side) {
    for row in 0..BOARD_WIDTH as u8 {
        print!("{} ", BOARD_WIDTH as u8 - row);
        for col in 0..BOARD_WIDTH as u8 {
            let square = Square::from_row_col(row, col);
            let symbol = match position[square] {
                None if square.is_playable() => '.',
                None => ' ',
                Some(piece) => match (piece.side().color(first_player), piece.is_king()) {
                    (Color::White, false) => 'w',
                    (Color::White, true) => 'W',
                    (Color::Black, false) => 'b',
                    (Color::Black, true) => 'B',
                },
            };
            print!("{} ", symbol);
        }
        println!();
    }
    println!("  a b c d e f g h");
}

fn main() -> io::Result<()> {
    let matches = Command::new("dama")
        .about("Play Italian draughts against the computer")
        .arg(
            Arg::new("difficulty")
                .short('d')
                .long("difficulty")
                .env("DAMA_DIFFICULTY")
                .help("Search depth of the computer")
                .default_value("3")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("pcFirst")
                .long("pc-first")
                .help("Let the computer make the first move")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .env("DAMA_SEED")
                .help("Seed for the computer's choice between equally good moves")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("noShuffle")
                .long("no-shuffle")
                .help("Always play the first of several equally good moves")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("logfile")
                .short('l')
                .long("logfile")
                .help("Name of debug logfile")
                .num_args(1),
        )
        .get_matches();

    let log_dispatcher = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}[{}][{}] {}",
            chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
            record.target(),
            record.level(),
            message
        ))
    });

    if let Some(log_file) = matches.get_one::<String>("logfile") {
        log_dispatcher
            .chain(
                fern::Dispatch::new()
                    .level(log::LevelFilter::Debug)
                    .chain(fern::log_file(log_file)?),
            )
            .chain(
                fern::Dispatch::new()
                    .level(log::LevelFilter::Warn)
                    .chain(io::stderr()),
            )
            .apply()
            .unwrap()
    } else {
        log_dispatcher
            .level(log::LevelFilter::Warn)
            .chain(io::stderr())
            .apply()
            .unwrap()
    }

    let mut settings = MatchSettings::default().add_shuffle_moves(!matches.get_flag("noShuffle"));
    if let Some(seed) = matches.get_one::<u64>("seed") {
        settings = settings.add_seed(*seed);
    }
    let difficulty = *matches.get_one::<u16>("difficulty").unwrap();
    let pc_first = matches.get_flag("pcFirst");

    let mut manager = MatchManager::new(settings);
    manager.add_listener(Box::new(TerminalListener));

    if let Err(err) = manager.new_match(difficulty, pc_first) {
        eprintln!("{}", err);
        return Ok(());
    }
    print_help();
    manager.resolve_pc_move_blocking();

    for line in io::stdin().lock().lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            ["help"] => print_help(),
            ["new"] => {
                let difficulty = manager.difficulty();
                let pc_first = manager.pc_plays_first();
                manager
                    .new_match(difficulty, pc_first)
                    .expect("Current difficulty is always valid");
            }
            ["flip"] => manager.flip_first_player(),
            ["difficulty"] => println!("Difficulty is {}", manager.difficulty()),
            ["difficulty", depth] => match depth.parse::<u16>() {
                Ok(depth) => {
                    if let Err(err) = manager.change_difficulty(depth) {
                        println!("{}", err);
                    }
                }
                Err(err) => println!("Invalid difficulty \"{}\": {}", depth, err),
            },
            ["board"] => print_position(manager.position(), manager.first_player()),
            ["moves"] => {
                for mv in manager.legal_moves() {
                    println!("{}", mv.to_string(manager.position(), Side::Player));
                }
            }
            ["perft", depth] => match depth.parse::<u16>() {
                Ok(depth) => {
                    let side = match manager.state() {
                        MatchState::PcTurn => Side::Pc,
                        _ => Side::Player,
                    };
                    for d in 0..=depth {
                        println!(
                            "{}: {}",
                            d,
                            move_gen::perft(manager.position(), side, d)
                        );
                    }
                }
                Err(err) => println!("Invalid depth \"{}\": {}", depth, err),
            },
            [square] => match Square::parse(square) {
                Ok(square) => manager.square_clicked(square),
                Err(err) => println!("{}", err),
            },
            _ => {
                warn!("Unknown command \"{}\"", line.trim());
                println!("Unknown command \"{}\", type \"help\"", line.trim());
            }
        }
        manager.resolve_pc_move_blocking();
    }
    info!("Exiting");
    Ok(())
}

fn print_help() {
    println!("Click a square by typing it, like c3 or 42. Select a piece, then its destination.");
    println!("new: Start a new match");
    println!("flip: Start a new match with the other side moving first");
    println!("difficulty <n>: Start a new match at a new difficulty");
    println!("board: Print the board");
    println!("moves: List your legal moves");
    println!("perft <n>: Count positions up to n plies ahead");
    println!("quit: Exit");
}

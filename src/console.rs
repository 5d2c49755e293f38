//! Line-based text protocol for playing against the engine.
//!
//! Modelled on GTP: each command line may start with a numeric id, and
//! every reply is `=[id] message` on success or `?[id] message` on failure,
//! followed by a blank line.
//!
//! ## Supported Commands
//!
//! - `name`, `version` - Engine identification
//! - `help` - List all supported commands
//! - `quit` - Exit the loop
//! - `new` - Start a new game
//! - `show` - Print the board
//! - `status` - `in progress`, or which side has won
//! - `turn` - Side to move
//! - `level [n]` - Show or set the difficulty level
//! - `moves <pos>` - Destinations for the piece on `pos`
//! - `play <from> <to>` - Play a move for the side to move
//! - `genmove` - Let the engine move for the side to move
//!
//! Positions are written as a column letter and a rank, `a1` being the
//! bottom-left cell from White's side.

use std::io::{self, BufRead, Write};

use log::{debug, warn};

use crate::board::{Board, Pos};
use crate::constants::DEFAULT_LEVEL;
use crate::mcts::{SearchConfig, spawn_search};
use crate::rules::{Move, Status};

/// The list of known commands.
const KNOWN_COMMANDS: &[&str] = &[
    "genmove", "help", "level", "moves", "name", "new", "play", "quit", "show", "status", "turn",
    "version",
];

/// Console engine state.
pub struct ConsoleEngine {
    board: Board,
    level: u32,
    config: SearchConfig,
}

impl Default for ConsoleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleEngine {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_LEVEL, SearchConfig::default())
    }

    pub fn with_config(level: u32, config: SearchConfig) -> Self {
        Self {
            board: Board::new(),
            level,
            config,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Run the command loop on stdin and stdout.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the command loop until `quit` or the end of `input`.
    pub fn run_with<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        for line in input.lines() {
            let line = line?;

            // Skip empty lines and comments
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (id, command_line) = Self::parse_id(line);
            let parts: Vec<&str> = command_line.split_whitespace().collect();
            let Some((command, args)) = parts.split_first() else {
                continue;
            };
            let command = command.to_lowercase();

            debug!("command: {command} {args:?}");
            let (success, message) = self.execute(&command, args);

            let prefix = if success { '=' } else { '?' };
            let id_str = id.map(|i| i.to_string()).unwrap_or_default();
            writeln!(output, "{prefix}{id_str} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Split an optional numeric command id off the front of the line.
    fn parse_id(line: &str) -> (Option<u32>, &str) {
        let trimmed = line.trim();
        let end = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        if end == 0 {
            return (None, trimmed);
        }
        match trimmed[..end].parse::<u32>() {
            Ok(id) => (Some(id), trimmed[end..].trim()),
            Err(_) => (None, trimmed),
        }
    }

    /// Execute a command and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "name" => (true, env!("CARGO_PKG_NAME").to_string()),

            "version" => (true, env!("CARGO_PKG_VERSION").to_string()),

            "help" => (true, KNOWN_COMMANDS.join("\n")),

            "quit" => (true, String::new()),

            "new" => {
                self.board = Board::new();
                (true, String::new())
            }

            "show" => (true, format!("\n{}", self.board)),

            "status" => match self.board.status() {
                Status::InProgress => (true, "in progress".to_string()),
                Status::Won(color) => (true, format!("{color} won")),
            },

            "turn" => (true, self.board.current().to_string()),

            "level" => {
                let Some(arg) = args.first() else {
                    return (true, self.level.to_string());
                };
                match arg.parse::<u32>() {
                    Ok(level) if level >= 1 => {
                        self.level = level;
                        (true, String::new())
                    }
                    _ => (false, format!("invalid level: {arg}")),
                }
            }

            "moves" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                let Some(pos) = Pos::parse(arg) else {
                    return (false, format!("invalid position: {arg}"));
                };
                let mut targets = self.board.available_positions(pos);
                targets.sort();
                let targets: Vec<String> = targets.iter().map(Pos::to_string).collect();
                (true, targets.join(" "))
            }

            "play" => {
                if args.len() < 2 {
                    return (false, "missing arguments".to_string());
                }
                let (Some(from), Some(to)) = (Pos::parse(args[0]), Pos::parse(args[1])) else {
                    return (false, format!("invalid move: {} {}", args[0], args[1]));
                };
                match self.board.make_move(Move::new(from, to)) {
                    Ok(_) => {
                        self.board.switch_turn();
                        (true, String::new())
                    }
                    Err(e) => (false, e.to_string()),
                }
            }

            "genmove" => {
                let result = spawn_search(self.board.clone(), self.level, self.config.clone())
                    .and_then(|handle| handle.join());
                match result {
                    Ok(outcome) => {
                        self.board = outcome.board;
                        (true, outcome.chosen.to_string())
                    }
                    Err(e) => {
                        warn!("genmove failed: {e}");
                        (false, e.to_string())
                    }
                }
            }

            _ => (false, format!("unknown command: {command}")),
        }
    }
}

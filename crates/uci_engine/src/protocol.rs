//! Line-oriented UCI command handling.
//!
//! Searches run synchronously on the calling thread: `go` returns only after
//! `bestmove` has been written, so a later `stop` has nothing left to cancel.

use std::io::{BufRead, Write};

use chess_core::{
    move_to_uci, parse_legal_move, ChessError, Engine, GameState, GoParams, IterationInfo,
};
use classical_engine::{ClassicalEngine, MAX_HASH_MB, MIN_HASH_MB};
use tracing::{debug, info, warn};

use crate::error::{UciError, UciResult};
use crate::options::{
    EngineOptions, MAX_MAX_TIME_S, MAX_MOVE_OVERHEAD_MS, MIN_MAX_TIME_S, MIN_MOVE_OVERHEAD_MS,
};

pub struct UciProtocol {
    engine: ClassicalEngine,
    game: GameState,
    options: EngineOptions,
}

impl UciProtocol {
    pub fn new(options: EngineOptions) -> anyhow::Result<Self> {
        let options = options.clamped();
        let engine = ClassicalEngine::with_options(options.weights()?, options.hash_mb);
        Ok(Self {
            engine,
            game: GameState::new(),
            options,
        })
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn engine(&self) -> &ClassicalEngine {
        &self.engine
    }

    /// Read commands until `quit`, end of input or a write failure.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> UciResult<()> {
        for line in input.lines() {
            let line = line?;
            match self.handle_command(&line, out) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(command = line.trim(), error = %e, "command failed");
                    writeln!(out, "info string error: {e}")?;
                }
            }
            out.flush()?;
        }
        Ok(())
    }

    /// Handle one input line. Returns `Ok(false)` when the session should end.
    pub fn handle_command(&mut self, line: &str, out: &mut impl Write) -> UciResult<bool> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return Ok(true);
        };
        debug!(command, "received");

        match command {
            "uci" => self.cmd_uci(out)?,
            "isready" => writeln!(out, "readyok")?,
            "setoption" => self.cmd_setoption(args)?,
            "position" => self.cmd_position(args)?,
            "go" => self.cmd_go(args, out)?,
            "ucinewgame" => {
                self.engine.new_game();
                self.game = GameState::new();
            }
            "eval" => writeln!(out, "{}", self.engine.evaluator().breakdown(&self.game))?,
            "stop" => {}
            "quit" => return Ok(false),
            _ => return Err(UciError::UnknownCommand(command.to_string())),
        }
        Ok(true)
    }

    fn cmd_uci(&self, out: &mut impl Write) -> UciResult<()> {
        writeln!(out, "id name {}", self.engine.name())?;
        writeln!(out, "id author {}", self.engine.author())?;
        writeln!(
            out,
            "option name Hash type spin default {} min {MIN_HASH_MB} max {MAX_HASH_MB}",
            self.options.hash_mb
        )?;
        writeln!(
            out,
            "option name Move Overhead type spin default {} min {MIN_MOVE_OVERHEAD_MS} max {MAX_MOVE_OVERHEAD_MS}",
            self.options.move_overhead_ms
        )?;
        writeln!(
            out,
            "option name Max Time type spin default {} min {MIN_MAX_TIME_S} max {MAX_MAX_TIME_S}",
            self.options.max_time_s
        )?;
        writeln!(out, "uciok")?;
        Ok(())
    }

    fn cmd_setoption(&mut self, args: &[&str]) -> UciResult<()> {
        let (name, value) = parse_setoption(args)?;
        match name.to_ascii_lowercase().as_str() {
            "hash" => {
                let mb: usize = parse_number("setoption", &value)?;
                self.engine.set_option("Hash", &mb.to_string());
                self.options.hash_mb = self.engine.hash_mb();
            }
            "move overhead" => {
                let ms: u64 = parse_number("setoption", &value)?;
                self.options.move_overhead_ms = ms.clamp(MIN_MOVE_OVERHEAD_MS, MAX_MOVE_OVERHEAD_MS);
            }
            "max time" => {
                let secs: u64 = parse_number("setoption", &value)?;
                self.options.max_time_s = secs.clamp(MIN_MAX_TIME_S, MAX_MAX_TIME_S);
            }
            _ => {
                if !self.engine.set_option(&name, &value) {
                    return Err(UciError::args("setoption", format!("unknown option \"{name}\"")));
                }
            }
        }
        info!(option = name.as_str(), value = value.as_str(), "option set");
        Ok(())
    }

    /// The current game is replaced only once the whole command has parsed.
    fn cmd_position(&mut self, args: &[&str]) -> UciResult<()> {
        let (mut game, rest) = match args.split_first() {
            Some((&"startpos", rest)) => (GameState::new(), rest),
            Some((&"fen", rest)) => {
                let end = rest.iter().position(|&t| t == "moves").unwrap_or(rest.len());
                if end == 0 {
                    return Err(UciError::args("position", "missing FEN"));
                }
                (GameState::from_fen(&rest[..end].join(" "))?, &rest[end..])
            }
            Some((other, _)) => return Err(UciError::args("position", format!("unexpected \"{other}\""))),
            None => return Err(UciError::args("position", "expected startpos or fen")),
        };

        match rest.split_first() {
            None => {}
            Some((&"moves", moves)) => {
                for &text in moves {
                    let mv = parse_legal_move(game.position(), text).ok_or_else(|| ChessError::InvalidMove {
                        text: text.to_string(),
                        reason: "not legal in this position".to_string(),
                    })?;
                    game.push_move(mv);
                }
            }
            Some((other, _)) => return Err(UciError::args("position", format!("unexpected \"{other}\""))),
        }

        self.game = game;
        Ok(())
    }

    fn cmd_go(&mut self, args: &[&str], out: &mut impl Write) -> UciResult<()> {
        let go = GoParams::parse(args)?;
        let limits = go.search_limits(self.game.side_to_move(), &self.options.time_settings());
        debug!(depth = limits.depth, budget = ?limits.move_time, "starting search");

        let mut write_error = None;
        let result = self.engine.search(&mut self.game, limits, &mut |report: &IterationInfo| {
            if write_error.is_none() {
                if let Err(e) = writeln!(out, "{}", report.to_uci()).and_then(|_| out.flush()) {
                    write_error = Some(e);
                }
            }
        });
        if let Some(e) = write_error {
            return Err(e.into());
        }

        let best = result.best_move.map_or_else(|| "0000".to_string(), move_to_uci);
        info!(
            bestmove = best.as_str(),
            score = result.score,
            depth = result.depth,
            nodes = result.nodes,
            stopped = result.stopped,
            hash_used = self.engine.table().len(),
            hash_capacity = self.engine.table().capacity(),
            "search finished"
        );
        writeln!(out, "bestmove {best}")?;
        Ok(())
    }
}

/// Split `name <words...> value <words...>` into its two parts. Option names
/// may contain spaces, as in `Move Overhead`.
fn parse_setoption(args: &[&str]) -> UciResult<(String, String)> {
    let Some((&"name", rest)) = args.split_first() else {
        return Err(UciError::args("setoption", "expected \"name\""));
    };
    let split = rest.iter().position(|&t| t == "value").unwrap_or(rest.len());
    let name = rest[..split].join(" ");
    if name.is_empty() {
        return Err(UciError::args("setoption", "missing option name"));
    }
    let value = rest.get(split + 1..).map(|v| v.join(" ")).unwrap_or_default();
    Ok((name, value))
}

fn parse_number<T: std::str::FromStr>(command: &'static str, raw: &str) -> UciResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| UciError::args(command, format!("not a number: \"{raw}\"")))
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod protocol_tests;

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Local};

use crate::Move;

/// Who produced a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSource {
    Local,
    Engine,
    Remote,
}

impl fmt::Display for MoveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MoveSource::Local => "local",
            MoveSource::Engine => "engine",
            MoveSource::Remote => "remote",
        };
        f.write_str(name)
    }
}

/// Human-readable record of a game: every move and notable event with the
/// time it happened. Lines are mirrored to the `log` facade.
#[derive(Debug, Clone)]
pub struct GameLog {
    lines: Vec<String>,
    clock: Instant,
    move_count: u32,
}

impl GameLog {
    pub fn new() -> Self {
        let mut game_log = Self {
            lines: Vec::new(),
            clock: Instant::now(),
            move_count: 0,
        };
        let started_at: DateTime<Local> = Local::now();
        game_log.log(&format!("Game started {}", started_at.format("%m/%d/%Y %H:%M:%S")));
        game_log
    }

    pub fn log(&mut self, message: &str) {
        let elapsed = self.clock.elapsed().as_millis();
        log::info!("{message}");
        self.lines.push(format!("[{elapsed:>7}ms] {message}"));
    }

    pub fn log_move(&mut self, mv: Move, source: MoveSource, think_ms: u64) {
        self.move_count += 1;
        let message = format!("{}. {} ({} move, {}ms)", self.move_count, mv, source, think_ms);
        self.log(&message);
    }

    pub fn log_engine_move(&mut self, mv: Move, think_ms: u64, eval: i32, nodes: u64) {
        self.move_count += 1;
        let message = format!(
            "{}. {} (engine move, {}ms) eval {:+} nodes {}",
            self.move_count, mv, think_ms, eval, nodes
        );
        self.log(&message);
    }

    pub fn log_rejected(&mut self, what: &str, reason: &str) {
        log::warn!("rejected {what}: {reason}");
        self.log(&format!("rejected {what}: {reason}"));
    }

    /// Last `count` lines, oldest first.
    pub fn tail(&self, count: usize) -> &[String] {
        let start = self.lines.len().saturating_sub(count);
        &self.lines[start..]
    }
}

impl Default for GameLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Square;

    #[test]
    fn moves_are_numbered_and_tagged() {
        let mut game_log = GameLog::new();
        let e2e4 = Move::new(Square::new(4, 1), Square::new(4, 3));
        let e7e5 = Move::new(Square::new(4, 6), Square::new(4, 4));

        game_log.log_move(e2e4, MoveSource::Local, 12);
        game_log.log_engine_move(e7e5, 40, -1, 812);

        let lines = game_log.tail(10);
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Game started"));
        assert!(lines[1].ends_with("1. e2e4 (local move, 12ms)"));
        assert!(lines[2].ends_with("2. e7e5 (engine move, 40ms) eval -1 nodes 812"));
    }

    #[test]
    fn tail_returns_latest_lines() {
        let mut game_log = GameLog::new();
        for index in 0..5 {
            game_log.log(&format!("event {index}"));
        }
        let tail = game_log.tail(2);
        assert_eq!(tail.len(), 2);
        assert!(tail[1].ends_with("event 4"));
        assert_eq!(game_log.tail(100).len(), 6);
    }
}

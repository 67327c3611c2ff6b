//! Score and line counters with change notifications.

use std::fmt;

/// Points for clearing `lines` rows in one landing. Counts above four cannot happen with
/// four-cell pieces and score nothing.
pub fn line_clear_reward(lines: u32) -> u32 {
    match lines {
        1 => 40,
        2 => 100,
        3 => 300,
        4 => 1200,
        _ => 0,
    }
}

/// Why the score moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreReason {
    LineClear { lines: u32 },
    HardDrop { distance: u32 },
    SpeedUp,
}

/// Notification sent to listeners after every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreChange {
    pub reason: ScoreReason,
    pub delta: u32,
    pub score: u32,
    pub lines: u32,
}

pub type ScoreListener = Box<dyn FnMut(ScoreChange)>;

/// Monotonic score and line counters.
#[derive(Default)]
pub struct ScoreBoard {
    score: u32,
    lines: u32,
    listeners: Vec<ScoreListener>,
}

impl fmt::Debug for ScoreBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoreBoard")
            .field("score", &self.score)
            .field("lines", &self.lines)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    /// Registers a callback run after each change.
    pub fn subscribe(&mut self, listener: impl FnMut(ScoreChange) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Applies the line-clear table for one landing. The line counter always grows by `lines`,
    /// even when the table awards nothing.
    pub fn award_lines(&mut self, lines: u32) {
        self.lines = self.lines.saturating_add(lines);
        if lines > 0 {
            self.add(line_clear_reward(lines), ScoreReason::LineClear { lines });
        }
    }

    /// One-shot hard drop bonus.
    pub fn award_drop(&mut self, distance: u32) {
        self.add(distance, ScoreReason::HardDrop { distance });
    }

    pub fn award_speed_up(&mut self) {
        self.add(1, ScoreReason::SpeedUp);
    }

    fn add(&mut self, delta: u32, reason: ScoreReason) {
        self.score = self.score.saturating_add(delta);
        let change = ScoreChange {
            reason,
            delta,
            score: self.score,
            lines: self.lines,
        };
        for listener in &mut self.listeners {
            listener(change);
        }
    }
}

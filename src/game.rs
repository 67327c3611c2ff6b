//! Game state: playfield, active piece, gravity, line clear, scoring.

use crate::GameConfig;
use crate::input::Action;
use crate::piece::{PieceKind, Rotation};
use crate::playfield::{EXPANSION, FRAME_HEIGHT, FRAME_WIDTH, NextBox, Playfield};
use crate::rng::PieceSource;
use crate::scoring::{ScoreBoard, ScoreChange};
use tracing::{debug, info};

/// Anchor of every freshly spawned piece.
pub const SPAWN_ROW: i32 = 1;
pub const SPAWN_COL: i32 = FRAME_WIDTH as i32 / 2 - 1;

/// With the legacy top-out rule, a piece landing at or above this anchor row ends the game.
pub const LEGACY_TOPOUT_ROW: i32 = 2;

/// The falling piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub row: i32,
    pub col: i32,
    /// Still at the spawn row: gravity has not moved it yet.
    pub first_drop: bool,
}

impl ActivePiece {
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            rotation: Rotation::default(),
            row: SPAWN_ROW,
            col: SPAWN_COL,
            first_drop: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    ToppedOut,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Paused,
    GameOver(GameOverReason),
}

/// One loop event as seen by the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Tick,
    Key(Action),
}

/// What happened during one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    pub landed: bool,
    pub lines_cleared: u32,
    pub speed_up: bool,
    pub status_changed: bool,
}

/// One game session.
pub struct GameState {
    field: Playfield,
    next_box: NextBox,
    piece: ActivePiece,
    next_kind: PieceKind,
    scores: ScoreBoard,
    source: Box<dyn PieceSource>,
    status: Status,
    /// The active piece is currently written into `field`.
    drawn: bool,
    legacy_topout: bool,
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("piece", &self.piece)
            .field("next_kind", &self.next_kind)
            .field("scores", &self.scores)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

impl GameState {
    pub fn new(config: &GameConfig, mut source: Box<dyn PieceSource>) -> Self {
        let first = source.next_kind();
        let next_kind = source.next_kind();
        let mut state = Self {
            field: Playfield::new(),
            next_box: NextBox::new(next_kind),
            piece: ActivePiece::spawn(first),
            next_kind,
            scores: ScoreBoard::new(),
            source,
            status: Status::Running,
            drawn: false,
            legacy_topout: config.legacy_topout,
        };
        state.draw();
        info!(first = ?first, next = ?next_kind, "game started");
        state
    }

    pub fn field(&self) -> &Playfield {
        &self.field
    }

    pub fn next_box(&self) -> &NextBox {
        &self.next_box
    }

    pub fn piece(&self) -> &ActivePiece {
        &self.piece
    }

    pub fn next_kind(&self) -> PieceKind {
        self.next_kind
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.scores.score()
    }

    pub fn lines(&self) -> u32 {
        self.scores.lines()
    }

    pub fn on_score_change(&mut self, listener: impl FnMut(ScoreChange) + 'static) {
        self.scores.subscribe(listener);
    }

    /// Runs one loop iteration for `input`.
    pub fn step(&mut self, input: Input) -> StepReport {
        let mut report = StepReport::default();
        let before = self.status;
        match (self.status, input) {
            (Status::GameOver(_), _) => return report,
            (Status::Paused, Input::Key(Action::Pause)) => {
                self.status = Status::Running;
                info!("resumed");
            }
            (Status::Paused, Input::Key(Action::Quit)) => self.finish(GameOverReason::Quit),
            (Status::Paused, _) => {}
            (Status::Running, input) => self.advance(input, &mut report),
        }
        debug_assert!(self.field.border_intact());
        report.status_changed = self.status != before;
        report
    }

    fn advance(&mut self, input: Input, report: &mut StepReport) {
        self.lift();
        if let Input::Key(action) = input {
            // Every key press is followed by a gravity step; raising the piece first cancels it.
            self.piece.row -= 1;
            match action {
                Action::MoveLeft => self.shift(-EXPANSION),
                Action::MoveRight => self.shift(EXPANSION),
                Action::RotateNext => self.rotate(self.piece.rotation.next()),
                Action::RotatePrev => self.rotate(self.piece.rotation.prev()),
                Action::Drop => self.hard_drop(),
                Action::SpeedUp => {
                    self.piece.row += 1;
                    self.scores.award_speed_up();
                    report.speed_up = true;
                    debug!("speed up");
                }
                Action::Pause => {
                    self.piece.row += 1;
                    self.status = Status::Paused;
                    self.draw();
                    info!("paused");
                    return;
                }
                Action::Quit => {
                    self.piece.row += 1;
                    self.draw();
                    self.finish(GameOverReason::Quit);
                    return;
                }
                Action::None => {}
            }
        }
        self.gravity(report);
        if self.status == Status::Running {
            self.draw();
        }
    }

    /// Moves the piece `delta` grid columns unless that collides.
    fn shift(&mut self, delta: i32) {
        self.lift();
        let p = self.piece;
        if !self.field.collides(p.row, p.col + delta, p.kind, p.rotation) {
            self.piece.col += delta;
        }
    }

    /// Switches to `rotation` in place unless that collides.
    fn rotate(&mut self, rotation: Rotation) {
        self.lift();
        let old = self.piece.rotation;
        self.piece.rotation = rotation;
        let p = self.piece;
        if self.field.collides(p.row, p.col, p.kind, p.rotation) {
            self.piece.rotation = old;
        }
    }

    /// Falls to one row above the first collision and awards `FRAME_HEIGHT - row`.
    fn hard_drop(&mut self) {
        self.lift();
        loop {
            let p = self.piece;
            if self.field.collides(p.row + 1, p.col, p.kind, p.rotation) {
                break;
            }
            self.piece.row += 1;
        }
        let bonus = (FRAME_HEIGHT as i32 - self.piece.row).max(0) as u32;
        self.scores.award_drop(bonus);
        debug!(row = self.piece.row, bonus, "hard drop");
    }

    /// Advances one row, or lands the piece and spawns the next one.
    fn gravity(&mut self, report: &mut StepReport) {
        self.lift();
        let p = self.piece;
        if !self.field.collides(p.row + 1, p.col, p.kind, p.rotation) {
            self.piece.row += 1;
            self.piece.first_drop = false;
            return;
        }

        self.field.place(p.row, p.col, p.kind, p.rotation);
        let lines = self.field.clear_full_lines();
        self.scores.award_lines(lines);
        report.landed = true;
        report.lines_cleared = lines;
        debug!(kind = ?p.kind, row = p.row, col = p.col, first_drop = p.first_drop, lines, "landed");

        self.spawn();
        if self.legacy_topout && p.row <= LEGACY_TOPOUT_ROW {
            self.finish(GameOverReason::ToppedOut);
        }
    }

    fn spawn(&mut self) {
        self.piece = ActivePiece::spawn(self.next_kind);
        self.next_kind = self.source.next_kind();
        self.next_box.show(self.next_kind);
        let p = self.piece;
        if self.field.collides(p.row, p.col, p.kind, p.rotation) {
            self.finish(GameOverReason::ToppedOut);
        }
    }

    fn finish(&mut self, reason: GameOverReason) {
        if matches!(self.status, Status::GameOver(_)) {
            return;
        }
        self.status = Status::GameOver(reason);
        info!(?reason, score = self.score(), lines = self.lines(), "game over");
    }

    /// Removes the active piece from the field if it is drawn there.
    fn lift(&mut self) {
        if self.drawn {
            let p = self.piece;
            self.field.clear(p.row, p.col, p.kind, p.rotation);
            self.drawn = false;
        }
    }

    /// Writes the active piece into the field.
    fn draw(&mut self) {
        if !self.drawn {
            let p = self.piece;
            self.field.place(p.row, p.col, p.kind, p.rotation);
            self.drawn = true;
        }
    }
}

//! App: terminal init, event loop, shutdown.

use crate::GameConfig;
use crate::game::{GameOverReason, GameState, Input, Status};
use crate::input::InputReader;
use crate::rng::PieceSource;
use crate::scheduler::{Cadence, Event, Ticker};
use crate::theme::Theme;
use crate::ui::{self, View};
use anyhow::{Context, Result};
use crossterm::{
    cursor::{Hide, Show},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::DefaultTerminal;
use ratatui::backend::CrosstermBackend;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info, trace, warn};

/// How long the score panel stays highlighted after a change.
const SCORE_FLASH: Duration = Duration::from_millis(250);
/// Redraw interval while the top-out fade plays.
const FADE_FRAME: Duration = Duration::from_millis(33);

/// Final result, printed after the terminal is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub score: u32,
    pub lines: u32,
    /// `None` when the session was cut short by a signal or an input failure.
    pub reason: Option<GameOverReason>,
}

/// Raw mode plus alternate screen for as long as it lives. Restores the terminal on drop, so a
/// failed draw still leaves the shell usable.
struct TerminalGuard {
    terminal: DefaultTerminal,
}

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("enabling raw mode")?;
        let mut stdout = std::io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen, Hide) {
            let _ = disable_raw_mode();
            return Err(err).context("entering alternate screen");
        }
        let terminal = match DefaultTerminal::new(CrosstermBackend::new(stdout)) {
            Ok(t) => t,
            Err(err) => {
                restore();
                return Err(err).context("creating terminal");
            }
        };
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

/// Release builds abort on panic, so drop-based restore never runs there.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        restore();
        default_hook(info);
    }));
}

fn restore() {
    let _ = execute!(std::io::stdout(), Show, LeaveAlternateScreen);
    if let Err(err) = disable_raw_mode() {
        warn!(%err, "failed to leave raw mode");
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    state: GameState,
    /// When the score last changed; written by the score listener.
    score_changed_at: Rc<Cell<Option<Instant>>>,
    /// TachyonFX fade for the top-out board (created on first game-over frame).
    game_over_effect: Option<Effect>,
    /// Last time we processed the game-over effect (for delta).
    game_over_effect_process_time: Option<Instant>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, source: Box<dyn PieceSource>) -> Self {
        let mut state = GameState::new(&config, source);
        let score_changed_at = Rc::new(Cell::new(None));
        let flash = Rc::clone(&score_changed_at);
        state.on_score_change(move |change| {
            debug!(
                reason = ?change.reason,
                delta = change.delta,
                score = change.score,
                lines = change.lines,
                "score changed"
            );
            flash.set(Some(Instant::now()));
        });
        Self {
            config,
            theme,
            state,
            score_changed_at,
            game_over_effect: None,
            game_over_effect_process_time: None,
        }
    }

    pub fn run(&mut self) -> Result<Outcome> {
        let (tx, rx) = mpsc::channel();
        let on_signal = tx.clone();
        ctrlc::set_handler(move || {
            let _ = on_signal.send(Event::Shutdown);
        })
        .context("installing signal handler")?;

        install_panic_hook();
        // Declared first so it drops last, after both worker threads have stopped.
        let mut guard = TerminalGuard::enter()?;
        let cadence = Cadence::new(
            Duration::from_millis(self.config.tick_ms),
            Duration::from_millis(self.config.min_tick_ms),
        );
        let ticker = Ticker::spawn(cadence, tx.clone())?;
        let input = InputReader::spawn(tx)?;
        info!(period_ms = cadence.period().as_millis() as u64, "gravity running");

        self.render(&mut guard.terminal)?;
        while let Ok(event) = rx.recv() {
            let report = match event {
                Event::Tick => self.state.step(Input::Tick),
                Event::Key(action) => self.state.step(Input::Key(action)),
                Event::Resize => {
                    guard.terminal.autoresize()?;
                    self.render(&mut guard.terminal)?;
                    continue;
                }
                Event::Shutdown => {
                    info!("shutdown requested");
                    break;
                }
            };
            if report.speed_up {
                ticker.accelerate();
            }
            if report.landed {
                trace!(
                    cleared = report.lines_cleared,
                    next = ?self.state.piece().kind,
                    "piece settled"
                );
            }
            if report.status_changed {
                match self.state.status() {
                    Status::Paused => ticker.suspend(),
                    Status::Running => ticker.resume(),
                    Status::GameOver(reason) => info!(
                        ?reason,
                        score = self.state.score(),
                        lines = self.state.lines(),
                        "game over"
                    ),
                }
            }
            self.render(&mut guard.terminal)?;
            if matches!(self.state.status(), Status::GameOver(_)) {
                break;
            }
        }
        drop(ticker);

        if self.state.status() == Status::GameOver(GameOverReason::ToppedOut) {
            self.play_game_over(&mut guard.terminal, &rx)?;
        }
        drop(input);
        drop(guard);

        Ok(Outcome {
            score: self.state.score(),
            lines: self.state.lines(),
            reason: match self.state.status() {
                Status::GameOver(reason) => Some(reason),
                _ => None,
            },
        })
    }

    /// Holds the final board while the fade runs. Any key or signal skips it.
    fn play_game_over(&mut self, terminal: &mut DefaultTerminal, rx: &Receiver<Event>) -> Result<()> {
        loop {
            self.render(terminal)?;
            if self.game_over_effect.as_ref().is_some_and(Effect::done) {
                return Ok(());
            }
            match rx.recv_timeout(FADE_FRAME) {
                Ok(Event::Key(_) | Event::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                    return Ok(());
                }
                Ok(Event::Resize) => terminal.autoresize()?,
                Ok(Event::Tick) | Err(RecvTimeoutError::Timeout) => {}
            }
        }
    }

    fn render(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let now = Instant::now();
        let score_flash = self
            .score_changed_at
            .get()
            .is_some_and(|t| now.saturating_duration_since(t) < SCORE_FLASH);
        terminal.draw(|f| {
            ui::draw(
                f,
                &self.state,
                View {
                    theme: &self.theme,
                    score_flash,
                    game_over_effect: &mut self.game_over_effect,
                    effect_process_time: &mut self.game_over_effect_process_time,
                    now,
                },
            );
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Action;
    use crate::piece::PieceKind;
    use crate::rng::ScriptedSource;
    use crate::scoring::ScoreReason;

    fn app() -> App {
        let config = GameConfig {
            tick_ms: 300,
            min_tick_ms: 40,
            legacy_topout: false,
        };
        App::new(config, Theme::default(), Box::new(ScriptedSource::new(vec![PieceKind::I])))
    }

    #[test]
    fn test_score_listener_marks_flash() {
        let mut app = app();
        assert!(app.score_changed_at.get().is_none());
        app.state.step(Input::Key(Action::SpeedUp));
        assert!(app.score_changed_at.get().is_some());
        assert_eq!(app.state.score(), 1);
    }

    #[test]
    fn test_extra_listener_sees_reason() {
        let mut app = app();
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        app.state.on_score_change(move |change| sink.set(Some(change.reason)));
        app.state.step(Input::Key(Action::Drop));
        assert!(matches!(seen.get(), Some(ScoreReason::HardDrop { .. })));
        assert!(app.score_changed_at.get().is_some());
    }
}

//! Key bindings and the keyboard reader thread.

use crate::scheduler::Event;
use anyhow::{Context, Result};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

/// How often the reader checks its stop flag while no key arrives.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateNext,
    RotatePrev,
    Drop,
    SpeedUp,
    Pause,
    Quit,
    /// Any other key: still a key event, but dispatches nothing.
    None,
}

/// Map key event to game action. Letters are case-sensitive; Ctrl-C quits since raw mode
/// swallows SIGINT.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    match code {
        KeyCode::Left => Action::MoveLeft,
        KeyCode::Right => Action::MoveRight,
        KeyCode::Up => Action::RotateNext,
        KeyCode::Down => Action::RotatePrev,
        KeyCode::Char(' ') => Action::Drop,
        KeyCode::Char('s') => Action::SpeedUp,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('q') => Action::Quit,
        _ => Action::None,
    }
}

/// Background thread forwarding key presses and resizes into the event queue.
#[derive(Debug)]
pub struct InputReader {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl InputReader {
    pub fn spawn(events: Sender<Event>) -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("input".into())
            .spawn(move || {
                if let Err(err) = read_loop(&flag, &events) {
                    error!(%err, "input reader failed");
                    let _ = events.send(Event::Shutdown);
                }
            })
            .context("spawning input reader")?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn read_loop(stop: &AtomicBool, events: &Sender<Event>) -> Result<()> {
    while !stop.load(Ordering::Relaxed) {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let forwarded = match event::read()? {
            // Ignore OS repeats and releases; only the first press counts.
            TermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key_to_action(key)),
            TermEvent::Resize(..) => Event::Resize,
            _ => continue,
        };
        if events.send(forwarded).is_err() {
            break;
        }
    }
    debug!("input reader stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_bindings() {
        assert_eq!(key_to_action(key(KeyCode::Left)), Action::MoveLeft);
        assert_eq!(key_to_action(key(KeyCode::Right)), Action::MoveRight);
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::RotateNext);
        assert_eq!(key_to_action(key(KeyCode::Down)), Action::RotatePrev);
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Drop);
        assert_eq!(key_to_action(key(KeyCode::Char('s'))), Action::SpeedUp);
        assert_eq!(key_to_action(key(KeyCode::Char('p'))), Action::Pause);
        assert_eq!(key_to_action(key(KeyCode::Char('q'))), Action::Quit);
    }

    #[test]
    fn test_letters_are_case_sensitive() {
        assert_eq!(key_to_action(key(KeyCode::Char('Q'))), Action::None);
        assert_eq!(key_to_action(key(KeyCode::Char('P'))), Action::None);
        assert_eq!(key_to_action(key(KeyCode::Char('x'))), Action::None);
        assert_eq!(key_to_action(key(KeyCode::Enter)), Action::None);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_c), Action::Quit);
        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_s), Action::None);
    }
}

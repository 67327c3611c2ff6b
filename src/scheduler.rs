//! Gravity timer: a cancellable periodic task feeding ticks into the main event queue.

use crate::input::Action;
use anyhow::{Context, Result};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Each tick shortens the period by `period / TICK_DECAY_DIVISOR`.
const TICK_DECAY_DIVISOR: u32 = 3000;
/// The speed-up key shortens the period by `period / SPEED_UP_DIVISOR`.
const SPEED_UP_DIVISOR: u32 = 20;

/// Everything the main loop reacts to, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Tick,
    Key(Action),
    Resize,
    Shutdown,
}

/// Gravity period arithmetic. The period only ever shrinks and never drops below `floor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    period: Duration,
    floor: Duration,
}

impl Cadence {
    pub fn new(period: Duration, floor: Duration) -> Self {
        Self {
            period: period.max(floor),
            floor,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Gradual acceleration applied after every tick.
    pub fn decay(&mut self) {
        self.shorten(self.period / TICK_DECAY_DIVISOR);
    }

    /// Step applied by the speed-up key.
    pub fn accelerate(&mut self) {
        self.shorten(self.period / SPEED_UP_DIVISOR);
    }

    fn shorten(&mut self, by: Duration) {
        self.period = self.period.saturating_sub(by).max(self.floor);
    }
}

#[derive(Debug)]
enum Control {
    Suspend,
    Resume,
    Accelerate,
    Stop,
}

/// Background thread that sends `Event::Tick` every period. Dropping it stops the thread.
#[derive(Debug)]
pub struct Ticker {
    control: Sender<Control>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn(cadence: Cadence, events: Sender<Event>) -> Result<Self> {
        let (control, control_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("gravity".into())
            .spawn(move || run(cadence, &control_rx, &events))
            .context("spawning gravity timer")?;
        Ok(Self {
            control,
            handle: Some(handle),
        })
    }

    /// Stops ticking until `resume`.
    pub fn suspend(&self) {
        let _ = self.control.send(Control::Suspend);
    }

    /// Restarts ticking with a full period before the next tick.
    pub fn resume(&self) {
        let _ = self.control.send(Control::Resume);
    }

    pub fn accelerate(&self) {
        let _ = self.control.send(Control::Accelerate);
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        let _ = self.control.send(Control::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(mut cadence: Cadence, control: &mpsc::Receiver<Control>, events: &Sender<Event>) {
    let mut active = true;
    let mut deadline = Instant::now() + cadence.period();
    loop {
        let msg = if active {
            control.recv_timeout(deadline.saturating_duration_since(Instant::now()))
        } else {
            control.recv().map_err(|_| RecvTimeoutError::Disconnected)
        };
        match msg {
            Ok(Control::Suspend) => active = false,
            Ok(Control::Resume) => {
                if !active {
                    active = true;
                    deadline = Instant::now() + cadence.period();
                }
            }
            Ok(Control::Accelerate) => {
                cadence.accelerate();
                debug!(period_ms = cadence.period().as_millis() as u64, "gravity accelerated");
            }
            Ok(Control::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if events.send(Event::Tick).is_err() {
                    break;
                }
                cadence.decay();
                trace!(period_us = cadence.period().as_micros() as u64, "tick");
                deadline = Instant::now() + cadence.period();
            }
        }
    }
    debug!("gravity timer stopped");
}

//! Clocks and the reveal driver
//!
//! The engine never sleeps. A driver asks it for the next deadline, waits
//! on a [`Clock`], and advances it. Tests use [`ManualClock`], which jumps
//! straight to each deadline.

use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

use crate::engine::DrawEngine;

/// Millisecond time source
pub trait Clock {
    /// Milliseconds since an arbitrary, fixed origin
    fn now_ms(&self) -> u64;

    /// Block (or jump) until `deadline_ms`
    fn sleep_until(&self, deadline_ms: u64);
}

/// Wall-clock time from a monotonic origin
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn sleep_until(&self, deadline_ms: u64) {
        let now = self.now_ms();
        if deadline_ms > now {
            thread::sleep(Duration::from_millis(deadline_ms - now));
        }
    }
}

/// Virtual clock for deterministic runs
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }

    fn sleep_until(&self, deadline_ms: u64) {
        if deadline_ms > self.now.get() {
            self.now.set(deadline_ms);
        }
    }
}

/// Drive the in-flight draw (if any) until the engine is idle again
///
/// Returns the number of frames processed.
pub fn run_until_idle<C: Clock + ?Sized>(engine: &mut DrawEngine, clock: &C) -> usize {
    let mut frames = 0;
    while let Some(deadline) = engine.next_deadline() {
        clock.sleep_until(deadline);
        frames += engine.advance(clock.now_ms());
    }
    frames
}

//! Time management utilities

use std::time::{Duration, Instant};

/// Frame timer producing the `dt` handed to [`Scene::update`](crate::scene::Scene::update)
#[derive(Debug)]
pub struct Timer {
    last_frame: Instant,
    delta_time: f32,
    total_time: f32,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Update the timer (should be called once per frame)
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        self.delta_time = now.duration_since(self.last_frame).as_secs_f32();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
        self.delta_time
    }

    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f32 {
        self.total_time
    }

    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Fixed-step accumulator.
///
/// Collects variable frame times and hands out whole simulation steps, so
/// scene updates always see the same `dt`. Pending time is capped to avoid
/// a spiral of catch-up steps after a stall.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: f32,
    max_steps: u32,
    accumulator: f32,
}

impl FixedTimestep {
    /// Accumulator producing steps of `step` seconds, at most `max_steps` per frame
    pub fn new(step: f32, max_steps: u32) -> Self {
        Self {
            step,
            max_steps,
            accumulator: 0.0,
        }
    }

    /// Length of one step in seconds
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Add a frame time and return how many steps to simulate now
    pub fn advance(&mut self, dt: f32) -> u32 {
        if self.step <= 0.0 {
            return 0;
        }
        self.accumulator += dt.max(0.0);

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }
        if steps == self.max_steps {
            self.accumulator = self.accumulator.min(self.step);
        }
        steps
    }

    /// Fraction of a step left over, in `[0, 1)` unless steps were dropped
    pub fn alpha(&self) -> f32 {
        if self.step > 0.0 { self.accumulator / self.step } else { 0.0 }
    }
}

/// Simple stopwatch for measuring elapsed time
#[derive(Debug)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time.take() {
            self.elapsed += start.elapsed();
        }
    }

    /// Get the elapsed time, including the running lap
    pub fn elapsed(&self) -> Duration {
        self.elapsed + self.start_time.map_or(Duration::ZERO, |start| start.elapsed())
    }

    /// Get the elapsed time in milliseconds
    pub fn elapsed_millis(&self) -> f64 {
        self.elapsed().as_secs_f64() * 1000.0
    }

    /// Check if the stopwatch is currently running
    pub fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

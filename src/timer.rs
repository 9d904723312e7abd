//! Frame timing.
//!
//! [`FrameTimer`] measures the time between ticks, keeps a rolling frames-per-second
//! average, and can optionally hold each tick back to a target frame rate.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Number of samples in the rolling FPS average.
pub const FPS_SAMPLES: usize = 50;

/// Measures per-frame delta time and average FPS.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Instant,
    frame_cap: Option<Duration>,
    samples: VecDeque<f32>,
    frame_index: u64,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame_cap: None,
            samples: VecDeque::with_capacity(FPS_SAMPLES),
            frame_index: 0,
        }
    }

    /// Limits ticks to at most `fps` per second. Zero, negative or a rate too small
    /// to express as a frame duration removes the cap.
    pub fn with_frame_cap(mut self, fps: f32) -> Self {
        self.frame_cap = if fps > 0.0 {
            Duration::try_from_secs_f32(1.0 / fps).ok()
        } else {
            None
        };
        self
    }

    /// Restarts the measurement, e.g. after the window was hidden.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    /// Ends a frame and returns the seconds elapsed since the previous tick.
    ///
    /// With a frame cap set, sleeps until the frame's time slice has passed.
    pub fn tick(&mut self) -> f32 {
        if let Some(cap) = self.frame_cap {
            let elapsed = self.last.elapsed();
            if elapsed < cap {
                std::thread::sleep(cap - elapsed);
            }
        }

        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        self.record(dt);
        self.frame_index = self.frame_index.wrapping_add(1);
        dt
    }

    /// Average frames per second over the last [`FPS_SAMPLES`] ticks.
    pub fn fps(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    /// Ticks so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    fn record(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        if self.samples.len() == FPS_SAMPLES {
            self.samples.pop_front();
        }
        self.samples.push_back(1.0 / dt);
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

// SPDX-License-Identifier: MPL-2.0

//! Frames-per-second measurement

use crate::constants::timing;
use std::time::{Duration, Instant};

/// Counts completed frames and rolls the count over once per window
#[derive(Debug)]
pub struct FpsCounter {
    window: Duration,
    window_start: Instant,
    count: u32,
    last: Option<u32>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::with_window(timing::FPS_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            window_start: Instant::now(),
            count: 0,
            last: None,
        }
    }

    /// Record one completed frame; returns the rate when a window closes
    pub fn tick(&mut self) -> Option<u32> {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> Option<u32> {
        self.count += 1;
        if now.saturating_duration_since(self.window_start) < self.window {
            return None;
        }
        let fps = self.count;
        self.count = 0;
        self.window_start = now;
        self.last = Some(fps);
        Some(fps)
    }

    /// Rate of the last closed window
    pub fn last(&self) -> Option<u32> {
        self.last
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolls_over_each_window() {
        let start = Instant::now();
        let mut fps = FpsCounter::with_window(Duration::from_secs(1));
        fps.window_start = start;

        for i in 1..30 {
            assert_eq!(fps.tick_at(start + Duration::from_millis(i * 30)), None);
        }
        assert_eq!(fps.tick_at(start + Duration::from_secs(1)), Some(30));
        assert_eq!(fps.last(), Some(30));

        // Counting starts over in the next window
        assert_eq!(fps.tick_at(start + Duration::from_millis(1500)), None);
        assert_eq!(fps.tick_at(start + Duration::from_secs(2)), Some(2));
    }
}

//! Fixed-rate frame pacing.

use std::thread;
use std::time::{Duration, Instant};

/// Sleeps so consecutive ticks are at least one frame apart.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_time: Option<Duration>,
    last: Option<Instant>,
}

impl FrameClock {
    /// `None` or `Some(0)` runs unpaced.
    pub fn new(fps: Option<u32>) -> Self {
        let frame_time = fps
            .filter(|fps| *fps > 0)
            .map(|fps| Duration::from_secs(1) / fps);
        Self {
            frame_time,
            last: None,
        }
    }

    pub fn frame_time(&self) -> Option<Duration> {
        self.frame_time
    }

    /// Wait out the rest of the current frame; returns the time since the
    /// previous tick (zero on the first tick after a reset).
    pub fn tick(&mut self) -> Duration {
        if let (Some(frame_time), Some(last)) = (self.frame_time, self.last) {
            let elapsed = last.elapsed();
            if elapsed < frame_time {
                thread::sleep(frame_time - elapsed);
            }
        }

        let now = Instant::now();
        let delta = self.last.map(|last| now - last).unwrap_or_default();
        self.last = Some(now);
        delta
    }

    /// Forget the previous tick, e.g. after a reload stalled the loop.
    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_time() {
        assert_eq!(
            FrameClock::new(Some(50)).frame_time(),
            Some(Duration::from_millis(20))
        );
        assert_eq!(FrameClock::new(Some(0)).frame_time(), None);
        assert_eq!(FrameClock::new(None).frame_time(), None);
    }

    #[test]
    fn test_paces_ticks() {
        let mut clock = FrameClock::new(Some(100));
        assert_eq!(clock.tick(), Duration::ZERO);
        let delta = clock.tick();
        assert!(delta >= Duration::from_millis(10));
    }

    #[test]
    fn test_reset() {
        let mut clock = FrameClock::new(None);
        clock.tick();
        clock.reset();
        assert_eq!(clock.tick(), Duration::ZERO);
    }
}

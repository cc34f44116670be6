use std::time;

// Counts presented frames and reports the rate once per period
pub struct FrameTimer {
    period: time::Duration,
    start: time::Instant,
    frames: u32,
}

impl FrameTimer {
    pub fn new(period: time::Duration) -> Self {
        Self {
            period,
            start: time::Instant::now(),
            frames: 0,
        }
    }

    /// Records a frame. Returns the frame rate when a period has elapsed.
    pub fn tick(&mut self) -> Option<f32> {
        self.tick_at(time::Instant::now())
    }

    fn tick_at(&mut self, now: time::Instant) -> Option<f32> {
        self.frames += 1;

        let elapsed = now.saturating_duration_since(self.start);

        if elapsed < self.period {
            return None;
        }

        let fps = self.frames as f32 / elapsed.as_secs_f32();

        self.start = now;
        self.frames = 0;

        Some(fps)
    }
}

impl Default for FrameTimer {
    fn default() -> Self { Self::new(time::Duration::from_secs(1)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_period() {
        let mut timer = FrameTimer::new(time::Duration::from_secs(1));
        let start = timer.start;

        for i in 1..60 {
            assert_eq!(timer.tick_at(start + time::Duration::from_millis(i * 10)), None);
        }

        let fps = timer.tick_at(start + time::Duration::from_secs(2)).unwrap();
        assert!((fps - 30.).abs() < 1e-3);

        assert_eq!(timer.frames, 0);
        assert_eq!(timer.tick_at(start + time::Duration::from_millis(2500)), None);
    }
}

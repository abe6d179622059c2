use std::time::{Duration, Instant};

/// Fixed-step catch-up is capped so a stalled terminal does not replay
/// seconds of simulation in one frame.
const MAX_CATCH_UP_STEPS: u32 = 5;
/// Longest elapsed time handed to a frame-driven game in one step.
const MAX_FRAME_DT: Duration = Duration::from_millis(100);

/// How a game wants its `update` driven.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Schedule {
    /// One step of exactly `period` per elapsed period.
    Fixed(Duration),
    /// One step per host frame with the true elapsed time.
    Frame,
    /// No clock; state only changes on input.
    TurnBased,
}

/// Drives `update` for the active game. Owned by the host session, so
/// cancelling it is the single place timed work stops.
#[derive(Debug)]
pub struct GameClock {
    schedule: Schedule,
    last: Option<Instant>,
    accumulator: Duration,
}

impl GameClock {
    pub fn new(schedule: Schedule) -> Self {
        Self {
            schedule,
            last: None,
            accumulator: Duration::ZERO,
        }
    }

    pub fn start(&mut self, now: Instant) {
        if matches!(self.schedule, Schedule::TurnBased) {
            return;
        }
        self.last = Some(now);
        self.accumulator = Duration::ZERO;
    }

    /// Cancels the clock. Safe to call any number of times.
    pub fn stop(&mut self) {
        self.last = None;
        self.accumulator = Duration::ZERO;
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.last.is_some()
    }

    /// Time banked toward the next fixed step.
    #[cfg(test)]
    pub fn pending(&self) -> Duration {
        self.accumulator
    }

    /// Advances to `now` and returns the `dt` of every step to run, oldest
    /// first. Empty when stopped or turn-based.
    pub fn advance(&mut self, now: Instant) -> Vec<Duration> {
        let Some(last) = self.last else {
            return Vec::new();
        };
        let elapsed = now.saturating_duration_since(last);
        self.last = Some(now);

        match self.schedule {
            Schedule::TurnBased => Vec::new(),
            Schedule::Frame => vec![elapsed.min(MAX_FRAME_DT)],
            Schedule::Fixed(period) => {
                if period.is_zero() {
                    return Vec::new();
                }
                self.accumulator += elapsed;
                let mut steps = Vec::new();
                while self.accumulator >= period {
                    self.accumulator -= period;
                    if steps.len() < MAX_CATCH_UP_STEPS as usize {
                        steps.push(period);
                    }
                }
                steps
            }
        }
    }
}

/// Converts a frame-driven `dt` into a multiple of a 60 Hz frame, so
/// per-frame constants integrate to the same speed at any refresh rate.
pub fn frames(dt: Duration) -> f32 {
    dt.as_secs_f32() * 60.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_emits_whole_periods() {
        let t0 = Instant::now();
        let mut clock = GameClock::new(Schedule::Fixed(Duration::from_millis(150)));
        clock.start(t0);
        assert!(clock.advance(t0 + Duration::from_millis(100)).is_empty());
        let steps = clock.advance(t0 + Duration::from_millis(320));
        assert_eq!(steps, vec![Duration::from_millis(150); 2]);
        assert_eq!(clock.pending(), Duration::from_millis(20));
    }

    #[test]
    fn fixed_clock_caps_catch_up() {
        let t0 = Instant::now();
        let mut clock = GameClock::new(Schedule::Fixed(Duration::from_millis(10)));
        clock.start(t0);
        let steps = clock.advance(t0 + Duration::from_secs(2));
        assert_eq!(steps.len(), MAX_CATCH_UP_STEPS as usize);
        assert!(clock.pending() < Duration::from_millis(10));
    }

    #[test]
    fn frame_clock_reports_elapsed_time() {
        let t0 = Instant::now();
        let mut clock = GameClock::new(Schedule::Frame);
        clock.start(t0);
        assert_eq!(clock.advance(t0 + Duration::from_millis(16)), vec![Duration::from_millis(16)]);
        assert_eq!(clock.advance(t0 + Duration::from_secs(5)), vec![MAX_FRAME_DT]);
    }

    #[test]
    fn turn_based_clock_never_steps() {
        let t0 = Instant::now();
        let mut clock = GameClock::new(Schedule::TurnBased);
        clock.start(t0);
        assert!(!clock.is_running());
        assert!(clock.advance(t0 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn stop_is_idempotent_and_cancels_pending_steps() {
        let t0 = Instant::now();
        let mut clock = GameClock::new(Schedule::Fixed(Duration::from_millis(16)));
        clock.start(t0);
        clock.advance(t0 + Duration::from_millis(10));
        clock.stop();
        clock.stop();
        assert!(!clock.is_running());
        assert_eq!(clock.pending(), Duration::ZERO);
        assert!(clock.advance(t0 + Duration::from_secs(1)).is_empty());
    }

    #[test]
    fn stop_before_start_is_harmless() {
        let mut clock = GameClock::new(Schedule::Frame);
        clock.stop();
        assert!(!clock.is_running());
    }

    #[test]
    fn frames_scales_to_sixty_hertz() {
        assert!((frames(Duration::from_millis(1000)) - 60.0).abs() < 1e-3);
    }
}

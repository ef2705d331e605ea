//! Wall-clock frame timing.

use std::time::{Duration, Instant};

/// How a raw frame delta is turned into a simulation step.
///
/// This is the only place a step limit is applied; the motion model always
/// takes the step it is given.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum StepPolicy {
    /// Use the wall-clock delta as is. A stalled frame produces one large step.
    #[default]
    Unbounded,
    /// Cap every step at the given number of seconds.
    Clamped(f32),
}

impl StepPolicy {
    pub fn apply(self, dt: f32) -> f32 {
        match self {
            StepPolicy::Unbounded => dt,
            StepPolicy::Clamped(max) => dt.min(max),
        }
    }
}

/// Measures the time between consecutive frames.
#[derive(Clone, Debug)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    policy: StepPolicy,
}

impl FrameClock {
    pub fn new(policy: StepPolicy) -> Self {
        Self::starting_at(Instant::now(), policy)
    }

    pub fn starting_at(now: Instant, policy: StepPolicy) -> Self {
        Self {
            start: now,
            last: now,
            policy,
        }
    }

    /// Sample the clock and return the step since the previous tick, in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let dt = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        self.policy.apply(dt)
    }

    /// Total time since the clock was started.
    pub fn elapsed(&self) -> Duration {
        self.last.saturating_duration_since(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn stalled_frame_passes_through_when_unbounded() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0, StepPolicy::Unbounded);
        assert_relative_eq!(clock.tick_at(t0 + Duration::from_millis(16)), 0.016, epsilon = 1e-6);
        assert_relative_eq!(clock.tick_at(t0 + Duration::from_millis(3016)), 3.0, epsilon = 1e-6);
        assert_eq!(clock.elapsed(), Duration::from_millis(3016));
    }

    #[test]
    fn clamp_caps_large_steps_only() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0, StepPolicy::Clamped(0.1));
        assert_relative_eq!(clock.tick_at(t0 + Duration::from_millis(20)), 0.02, epsilon = 1e-6);
        assert_relative_eq!(clock.tick_at(t0 + Duration::from_secs(5)), 0.1);
    }
}

// timing.rs — fixed-timestep accumulator ("lag") state.
//
// Elapsed wall-clock time is banked into an accumulator and drained in
// whole tick intervals; whatever fraction remains after draining becomes
// the interpolation factor for rendering. A catch-up clamp bounds how many
// ticks a single frame may run, so a long stall drops time instead of
// spiraling.

use std::time::Duration;

pub struct FixedTimestep {
    tick_interval: Duration,
    max_ticks_per_frame: u32,
    lag: Duration,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32, max_ticks_per_frame: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_interval: Duration::from_nanos(1_000_000_000 / u64::from(tick_rate)),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            lag: Duration::ZERO,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Bank elapsed wall-clock time.
    pub fn advance(&mut self, elapsed: Duration) {
        self.lag += elapsed;
    }

    /// Number of fixed ticks to run this frame, draining the accumulator.
    ///
    /// At most `max_ticks_per_frame` ticks are granted; any whole intervals
    /// still banked beyond that are dropped, keeping only the sub-tick
    /// fraction so interpolation stays continuous.
    pub fn drain_ticks(&mut self) -> u32 {
        let mut ticks = 0;
        while self.lag >= self.tick_interval && ticks < self.max_ticks_per_frame {
            self.lag -= self.tick_interval;
            ticks += 1;
        }

        if self.lag >= self.tick_interval {
            let surplus = self.lag.as_nanos() % self.tick_interval.as_nanos();
            self.lag = Duration::from_nanos(surplus as u64);
        }

        ticks
    }

    /// Interpolation factor in [0, 1): the fraction of the next tick that
    /// has elapsed but not yet been simulated. Call after `drain_ticks`.
    pub fn alpha(&self) -> f32 {
        let ratio = self.lag.as_secs_f64() / self.tick_interval.as_secs_f64();
        ratio.min(0.999_999) as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestep() -> FixedTimestep {
        // 20 Hz, 5-tick clamp
        FixedTimestep::new(20, 5)
    }

    #[test]
    fn zero_tick_rate_is_clamped() {
        let ts = FixedTimestep::new(0, 0);
        assert_eq!(ts.tick_interval(), Duration::from_secs(1));
    }

    #[test]
    fn no_elapsed_time_no_ticks() {
        let mut ts = timestep();
        assert_eq!(ts.drain_ticks(), 0);
        assert_eq!(ts.alpha(), 0.0);
    }

    #[test]
    fn whole_intervals_drain_exactly() {
        let mut ts = timestep();
        ts.advance(Duration::from_millis(150)); // 3 ticks at 50ms
        assert_eq!(ts.drain_ticks(), 3);
        assert!(ts.alpha() < 1e-6);
    }

    #[test]
    fn fraction_becomes_alpha() {
        let mut ts = timestep();
        ts.advance(Duration::from_millis(125)); // 2.5 ticks
        assert_eq!(ts.drain_ticks(), 2);
        assert!((ts.alpha() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn fraction_accumulates_across_frames() {
        let mut ts = timestep();

        ts.advance(Duration::from_millis(30));
        assert_eq!(ts.drain_ticks(), 0);
        assert!((ts.alpha() - 0.6).abs() < 1e-3);

        ts.advance(Duration::from_millis(30)); // now 60ms banked
        assert_eq!(ts.drain_ticks(), 1);
        assert!((ts.alpha() - 0.2).abs() < 1e-3);
    }

    #[test]
    fn stall_is_clamped_and_surplus_dropped() {
        let mut ts = timestep();
        ts.advance(Duration::from_secs(3)); // 60 ticks behind
        assert_eq!(ts.drain_ticks(), 5);
        // Surplus whole intervals were dropped, not banked
        assert_eq!(ts.drain_ticks(), 0);
        assert!(ts.alpha() < 1.0);
    }

    #[test]
    fn alpha_stays_below_one() {
        let mut ts = timestep();
        ts.advance(Duration::from_millis(49));
        assert_eq!(ts.drain_ticks(), 0);
        let alpha = ts.alpha();
        assert!(alpha > 0.9 && alpha < 1.0);
    }
}

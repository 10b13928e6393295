use std::time::{Duration, Instant};

/// Counts how many timer periods have gone by on the wall clock, so the
/// delay and sound timers can run at 60 Hz no matter how fast instructions
/// are executed
#[derive(Debug, Clone)]
pub struct TimerClock {
    period: Duration,
    last_decrement: Instant,
}

impl TimerClock {
    pub fn new(hz: u32) -> Self {
        TimerClock {
            // past 1 GHz the period rounds down to nothing
            period: (Duration::from_secs(1) / hz.max(1)).max(Duration::from_nanos(1)),
            last_decrement: Instant::now(),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of whole periods elapsed since the last call. Leftover time
    /// carries over to the next call
    pub fn elapsed_periods(&mut self) -> u32 {
        let elapsed = self.last_decrement.elapsed();
        let periods = (elapsed.as_nanos() / self.period.as_nanos()).min(u32::MAX as u128) as u32;
        self.last_decrement += self.period * periods;
        periods
    }

    /// Forget any time that has passed, e.g. while the machine was blocked
    pub fn resync(&mut self) {
        self.last_decrement = Instant::now();
    }
}

/// Self-contained timers - accumulate delta time and decide when to fire.
/// Nothing here reads a wall clock; the host pumps them.

/// Frame counter - fires every N ticks
#[derive(Debug, Clone, Copy)]
pub struct EveryNTicks {
    interval: u64,
    count: u64,
}

impl EveryNTicks {
    /// Create timer that fires every N ticks
    pub fn new(interval: u64) -> Self {
        Self {
            interval: interval.max(1),
            count: 0,
        }
    }

    /// Tick once, returns true if should fire
    pub fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.interval {
            self.count = 0;
            true
        } else {
            false
        }
    }
}

/// Fixed-step accumulator - turns variable frame deltas into fixed steps
#[derive(Debug, Clone)]
pub struct Accumulator {
    timestep: f32,
    accumulator: f32,
    max_steps: u8,
}

impl Accumulator {
    pub fn new(hz: f32, max_steps: u8) -> Self {
        Self {
            timestep: 1.0 / hz,
            accumulator: 0.0,
            max_steps,
        }
    }

    /// Update with delta, returns iterator of fixed timesteps to execute
    pub fn tick(&mut self, delta: f32) -> impl Iterator<Item = f32> {
        self.accumulator += delta;

        let steps = (self.accumulator / self.timestep).min(self.max_steps as f32) as usize;

        self.accumulator -= steps as f32 * self.timestep;
        // Drop backlog beyond the cap instead of spiralling
        if steps == self.max_steps as usize {
            self.accumulator = self.accumulator.min(self.timestep);
        }

        std::iter::repeat(self.timestep).take(steps)
    }

    pub fn timestep(&self) -> f32 {
        self.timestep
    }
}

/// Restartable countdown - fires once after `duration` of quiet.
/// Every `start` rewinds it, so a burst of starts yields a single fire.
#[derive(Debug, Clone, Copy)]
pub struct Countdown {
    duration: f32,
    elapsed: f32,
    active: bool,
}

impl Countdown {
    /// Create inactive countdown
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            elapsed: 0.0,
            active: false,
        }
    }

    /// Start or restart the countdown
    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.active = true;
    }

    pub fn cancel(&mut self) {
        self.active = false;
        self.elapsed = 0.0;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Tick with delta, returns true on the tick that completes it
    pub fn tick(&mut self, delta: f32) -> bool {
        if !self.active {
            return false;
        }

        self.elapsed += delta;

        if self.elapsed >= self.duration {
            self.active = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_n_ticks_counts() {
        let mut timer = EveryNTicks::new(3);

        assert!(!timer.tick()); // count=1
        assert!(!timer.tick()); // count=2
        assert!(timer.tick()); // count=3, fire and reset
        assert!(!timer.tick()); // count=1 again
    }

    #[test]
    fn accumulator_yields_fixed_steps() {
        let mut acc = Accumulator::new(60.0, 4);

        let steps1: Vec<_> = acc.tick(0.01).collect();
        assert_eq!(steps1.len(), 0);

        let steps2: Vec<_> = acc.tick(0.01).collect();
        assert_eq!(steps2.len(), 1);
        assert_eq!(steps2[0], 1.0 / 60.0);

        // Large delta - capped
        let steps3: Vec<_> = acc.tick(0.5).collect();
        assert_eq!(steps3.len(), 4);
        let steps4: Vec<_> = acc.tick(0.0).collect();
        assert!(steps4.len() <= 1);
    }

    #[test]
    fn countdown_fires_once() {
        let mut timer = Countdown::new(1.0);

        assert!(!timer.tick(0.5)); // Inactive

        timer.start();
        assert!(!timer.tick(0.5));
        assert!(timer.is_active());

        assert!(timer.tick(0.6));
        assert!(!timer.tick(0.1)); // Inactive again
    }

    #[test]
    fn countdown_restart_collapses_burst() {
        let mut timer = Countdown::new(1.5);
        timer.start();

        let mut fired = 0;
        for _ in 0..10 {
            if timer.tick(1.0) {
                fired += 1;
            }
            timer.start();
        }
        assert_eq!(fired, 0);

        assert!(!timer.tick(1.0));
        assert!(timer.tick(0.5));
    }

    #[test]
    fn countdown_cancel() {
        let mut timer = Countdown::new(1.0);
        timer.start();
        timer.cancel();
        assert!(!timer.is_active());
        assert!(!timer.tick(2.0));
    }
}

use std::time::Duration;

/// Longest frame the clock will catch up on in one go.
const MAX_FRAME: f64 = 0.25;

/// Fixed-step accumulator for the host simulation. Each consumed step
/// advances the tick stamped into snapshots.
#[derive(Debug, Clone)]
pub struct TickClock {
    tick_rate: u32,
    dt: f64,
    accumulator: f64,
    tick: f64,
}

impl TickClock {
    pub fn new(tick_rate: u32) -> Self {
        let tick_rate = tick_rate.max(1);
        Self {
            tick_rate,
            dt: 1.0 / f64::from(tick_rate),
            accumulator: 0.0,
            tick: 0.0,
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn tick(&self) -> f64 {
        self.tick
    }

    pub fn accumulate(&mut self, elapsed: Duration) {
        self.accumulator += elapsed.as_secs_f64().min(MAX_FRAME);
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            self.tick += 1.0;
            true
        } else {
            false
        }
    }

    pub fn alpha(&self) -> f64 {
        self.accumulator / self.dt
    }
}

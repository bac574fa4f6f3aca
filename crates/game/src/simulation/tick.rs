use std::thread;
use std::time::{Duration, Instant};

use crate::behavior::BehaviorScheduler;
use crate::physics::{self, PhysicsValues};
use crate::snapshot::World;
use crate::time::GameDuration;

/// Longest stretch of game time a single tick may cover. Larger gaps (a
/// stalled host, a debugger pause) are truncated rather than simulated.
pub const MAX_TICK_DURATION: GameDuration = GameDuration::from_secs(0.25);

/// Fixed-period wake-up for the tick thread.
///
/// Deadlines advance by whole periods so the cadence does not drift with the
/// time spent inside each tick. If the loop falls more than a period behind,
/// the schedule restarts from now instead of firing a burst of late ticks.
#[derive(Debug)]
pub struct TickClock {
    period: Duration,
    next: Instant,
    last: Instant,
}

impl TickClock {
    pub fn new(tick_rate: u32) -> Self {
        let period = Duration::from_nanos(1_000_000_000 / u64::from(tick_rate.max(1)));
        let now = Instant::now();
        Self {
            period,
            next: now + period,
            last: now,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Sleeps until the next deadline and returns the game time elapsed since
    /// the previous call.
    pub fn wait_next(&mut self) -> GameDuration {
        let now = Instant::now();
        if self.next > now {
            thread::sleep(self.next - now);
        }

        let now = Instant::now();
        self.next += self.period;
        if self.next + self.period < now {
            log::debug!("tick loop fell behind by {:?}", now - self.next);
            self.next = now + self.period;
        }

        let elapsed = GameDuration::from(now - self.last);
        self.last = now;
        elapsed.min(MAX_TICK_DURATION)
    }
}

/// World-advancing state owned by the tick thread.
#[derive(Debug)]
pub struct Simulation {
    physics: PhysicsValues,
    scheduler: BehaviorScheduler,
}

impl Simulation {
    pub fn new(physics: PhysicsValues, scheduler: BehaviorScheduler) -> Self {
        Self { physics, scheduler }
    }

    pub fn physics(&self) -> &PhysicsValues {
        &self.physics
    }

    /// Runs behaviors, then moves every entity, then advances the tick
    /// counter.
    pub fn step(&mut self, world: &mut World, elapsed: GameDuration) {
        self.scheduler.run(world, &self.physics, elapsed);
        for entity in world.entities_mut() {
            physics::move_entity(&self.physics, &mut entity.position_data, elapsed);
        }
        world.advance_tick();
    }
}

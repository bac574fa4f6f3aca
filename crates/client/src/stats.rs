use std::collections::VecDeque;
use std::time::Instant;

const SAMPLE_COUNT: usize = 60;

/// Counters one bot collects while connected.
#[derive(Debug, Clone)]
pub struct BotStats {
    updates: u64,
    last_tick: Option<u64>,
    skipped_ticks: u64,
    update_times: VecDeque<Instant>,
    update_rate: f32,
    rtt_samples: VecDeque<f32>,
    rtt_min: f32,
    rtt_max: f32,
    pongs: u64,
}

impl Default for BotStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BotStats {
    pub fn new() -> Self {
        Self {
            updates: 0,
            last_tick: None,
            skipped_ticks: 0,
            update_times: VecDeque::with_capacity(SAMPLE_COUNT),
            update_rate: 0.0,
            rtt_samples: VecDeque::with_capacity(SAMPLE_COUNT),
            rtt_min: f32::INFINITY,
            rtt_max: 0.0,
            pongs: 0,
        }
    }

    pub fn record_update(&mut self, tick: u64) {
        self.record_update_at(tick, Instant::now());
    }

    fn record_update_at(&mut self, tick: u64, now: Instant) {
        self.updates += 1;
        if let Some(last) = self.last_tick
            && tick > last + 1
        {
            self.skipped_ticks += tick - last - 1;
        }
        self.last_tick = Some(tick);

        if self.update_times.len() >= SAMPLE_COUNT {
            self.update_times.pop_front();
        }
        self.update_times.push_back(now);

        if let Some(oldest) = self.update_times.front() {
            let elapsed = now.duration_since(*oldest).as_secs_f32();
            if elapsed > 0.0 {
                self.update_rate = (self.update_times.len() - 1) as f32 / elapsed;
            }
        }
    }

    pub fn record_rtt(&mut self, rtt_ms: f32) {
        self.pongs += 1;
        self.rtt_min = self.rtt_min.min(rtt_ms);
        self.rtt_max = self.rtt_max.max(rtt_ms);

        if self.rtt_samples.len() >= SAMPLE_COUNT {
            self.rtt_samples.pop_front();
        }
        self.rtt_samples.push_back(rtt_ms);
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Server ticks that never arrived as updates.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    pub fn update_rate(&self) -> f32 {
        self.update_rate
    }

    pub fn pongs(&self) -> u64 {
        self.pongs
    }

    /// Mean over the most recent samples.
    pub fn rtt_avg(&self) -> Option<f32> {
        if self.rtt_samples.is_empty() {
            return None;
        }
        Some(self.rtt_samples.iter().sum::<f32>() / self.rtt_samples.len() as f32)
    }

    pub fn rtt_range(&self) -> Option<(f32, f32)> {
        (self.pongs > 0).then_some((self.rtt_min, self.rtt_max))
    }
}

//! Running statistics primitives shared by all entity aggregators.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// How many per-second samples each [`Rate`] retains.
pub const SAMPLE_CAPACITY: usize = 200;

/// Tracks when an entity was first and last seen.
///
/// `start_time` is set exactly once, on the first update; afterwards
/// `uptime = current_time - start_time`.
#[derive(Debug, Clone, Default)]
pub struct Uptimer {
    start_time: Option<DateTime<Utc>>,
    current_time: Option<DateTime<Utc>>,
    uptime: Duration,
}

impl Uptimer {
    pub fn update(&mut self, t: DateTime<Utc>) {
        self.current_time = Some(t);
        let start = *self.start_time.get_or_insert(t);
        self.uptime = (t - start).to_std().unwrap_or_default();
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn current_time(&self) -> Option<DateTime<Utc>> {
        self.current_time
    }

    pub fn uptime(&self) -> Duration {
        self.uptime
    }

    /// Whether the entity was last refreshed before `cutoff`.
    /// Entities that were never updated count as stale.
    pub fn stale_before(&self, cutoff: DateTime<Utc>) -> bool {
        self.current_time.map_or(true, |ct| ct < cutoff)
    }
}

/// Running min/max/average over unsigned samples.
#[derive(Debug, Clone)]
pub struct MinMaxAvgCurrent {
    update_count: u64,
    total: u64,

    pub min: u64,
    pub max: u64,
    pub avg: f64,
    pub current: u64,
}

impl Default for MinMaxAvgCurrent {
    fn default() -> Self {
        // min starts at the ceiling so the first sample becomes both
        // bounds.
        Self {
            update_count: 0,
            total: 0,
            min: u64::MAX,
            max: 0,
            avg: 0.0,
            current: 0,
        }
    }
}

impl MinMaxAvgCurrent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one raw sample in. Unparsable values count as 0.
    pub fn calculate(&mut self, raw: &str) {
        let v = raw.parse::<u64>().unwrap_or_default();

        self.update_count += 1;
        // The running sum may wrap for counters near u64::MAX over a long
        // observation horizon; the average degrades rather than aborting.
        self.total = self.total.wrapping_add(v);

        if v < self.min {
            self.min = v;
        }
        if v > self.max {
            self.max = v;
        }

        self.avg = self.total as f64 / self.update_count as f64;
        self.current = v;
    }

    pub fn update_count(&self) -> u64 {
        self.update_count
    }
}

/// Bounded FIFO of recent per-second samples, oldest first.
#[derive(Debug, Clone)]
pub struct History {
    values: VecDeque<f64>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, dropping the oldest when full.
    pub fn push(&mut self, v: f64) {
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(v);
    }

    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

/// Total and per-second throughput derived from a monotonic counter that
/// may reset when a peer reconnects.
#[derive(Debug, Clone)]
pub struct Rate {
    initial: u64,
    last: u64,
    fresh: bool,

    pub recent: History,
    pub per_second: f64,
    pub total: u64,
}

impl Rate {
    pub fn new(capacity: usize) -> Self {
        Self {
            initial: 0,
            last: 0,
            fresh: true,
            recent: History::new(capacity),
            per_second: 0.0,
            total: 0,
        }
    }

    /// Fold one raw counter sample in. Unparsable values count as 0.
    ///
    /// The first sample seeds the baseline, so `total` starts at 0. A
    /// sample below the previous one means the upstream counter reset;
    /// the baseline drops to 0 and `total` preserves the delta observed
    /// before the reset.
    pub fn calculate(&mut self, uptime: Duration, raw: &str) {
        let v = raw.parse::<u64>().unwrap_or_default();

        if self.fresh {
            self.initial = v;
            self.fresh = false;
        }

        if v < self.last {
            self.initial = 0;
            self.total = self.last - v;
        } else {
            self.total = v - self.initial;
        }

        self.last = v;

        let per_second = if uptime.is_zero() {
            0.0
        } else {
            self.total as f64 / uptime.as_secs_f64()
        };
        self.recent.push(per_second);
        self.per_second = per_second;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_487_188_673 + secs, 0).unwrap()
    }

    #[test]
    fn test_uptimer_first_update_pins_start() {
        let mut up = Uptimer::default();
        up.update(ts(0));

        assert_eq!(up.start_time(), Some(ts(0)));
        assert_eq!(up.current_time(), Some(ts(0)));
        assert_eq!(up.uptime(), Duration::ZERO);

        up.update(ts(4));

        assert_eq!(up.start_time(), Some(ts(0)), "start_time is set once");
        assert_eq!(up.current_time(), Some(ts(4)));
        assert_eq!(up.uptime(), Duration::from_secs(4));
    }

    #[test]
    fn test_uptimer_staleness() {
        let mut up = Uptimer::default();
        assert!(up.stale_before(ts(0)), "never-updated entities are stale");

        up.update(ts(10));
        assert!(up.stale_before(ts(11)));
        assert!(!up.stale_before(ts(10)));
        assert!(!up.stale_before(ts(5)));
    }

    #[test]
    fn test_min_max_avg_current() {
        let mut stats = MinMaxAvgCurrent::new();

        stats.calculate("5");
        assert_eq!(stats.min, 5);
        assert_eq!(stats.max, 5);
        assert_eq!(stats.avg, 5.0);
        assert_eq!(stats.current, 5);

        stats.calculate("10");
        assert_eq!(stats.min, 5);
        assert_eq!(stats.max, 10);
        assert_eq!(stats.avg, 7.5);
        assert_eq!(stats.current, 10);
    }

    #[test]
    fn test_min_max_avg_unparsable_is_zero() {
        let mut stats = MinMaxAvgCurrent::new();
        stats.calculate("10");
        stats.calculate("not-a-number");

        assert_eq!(stats.current, 0);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 10);
        assert_eq!(stats.avg, 5.0);
    }

    #[test]
    fn test_min_max_avg_count_advances_per_call() {
        let mut stats = MinMaxAvgCurrent::new();
        stats.calculate("8");
        stats.calculate("8");

        // Re-applying the same sample is idempotent for min/max/current
        // but not for the running average bookkeeping.
        assert_eq!(stats.update_count(), 2);
        assert_eq!(stats.min, 8);
        assert_eq!(stats.max, 8);
        assert_eq!(stats.current, 8);
        assert_eq!(stats.avg, 8.0);
    }

    #[test]
    fn test_rate_first_sample_seeds_baseline() {
        let mut r = Rate::new(5);

        r.calculate(Duration::ZERO, "100");

        assert_eq!(r.total, 0);
        assert_eq!(r.per_second, 0.0);
        assert_eq!(r.recent.iter().collect::<Vec<_>>(), vec![0.0]);
    }

    #[test]
    fn test_rate_monotonic_growth() {
        let mut r = Rate::new(5);

        r.calculate(Duration::ZERO, "100");
        r.calculate(Duration::from_secs(1), "200");

        assert_eq!(r.total, 100);
        assert_eq!(r.per_second, 100.0);
        assert_eq!(r.recent.iter().collect::<Vec<_>>(), vec![0.0, 100.0]);

        r.calculate(Duration::from_secs(2), "200");

        assert_eq!(r.total, 100);
        assert_eq!(r.per_second, 50.0);
        assert_eq!(
            r.recent.iter().collect::<Vec<_>>(),
            vec![0.0, 100.0, 50.0]
        );
    }

    #[test]
    fn test_rate_counter_reset_preserves_observed_delta() {
        let mut r = Rate::new(5);

        r.calculate(Duration::ZERO, "100");
        r.calculate(Duration::from_secs(1), "200");
        r.calculate(Duration::from_secs(2), "200");
        r.calculate(Duration::from_secs(3), "200");

        // The counter dropped from 200 to 50: a reconnect re-seeded it.
        r.calculate(Duration::from_secs(4), "50");

        assert_eq!(r.total, 150);

        // Further monotonic growth counts from the new zero baseline.
        r.calculate(Duration::from_secs(5), "60");
        assert_eq!(r.total, 60);
    }

    #[test]
    fn test_rate_zero_uptime_yields_zero() {
        let mut r = Rate::new(5);
        r.calculate(Duration::ZERO, "100");
        r.calculate(Duration::ZERO, "500");

        assert_eq!(r.total, 400);
        assert_eq!(r.per_second, 0.0);
    }

    #[test]
    fn test_rate_unparsable_counts_as_zero() {
        let mut r = Rate::new(5);
        r.calculate(Duration::ZERO, "100");
        r.calculate(Duration::from_secs(1), "bogus");

        // 0 < 100 looks like a reset: the historic delta is preserved.
        assert_eq!(r.total, 100);
    }

    #[test]
    fn test_history_bounded() {
        let mut h = History::new(2);

        h.push(10.10);
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![10.10]);

        h.push(15.9);
        h.push(200.5);
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![15.9, 200.5]);
        assert_eq!(h.latest(), Some(200.5));
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn test_history_empty() {
        let h = History::new(4);
        assert!(h.is_empty());
        assert_eq!(h.latest(), None);
    }
}

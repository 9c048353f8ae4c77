use std::time::Duration;

const MS_PER_OBJECT: f64 = 0.5;
const MIN_PERIOD_MS: u64 = 2_000;
const MAX_PERIOD_MS: u64 = 10_000;

/// Time between propagation passes for a catalog of `object_count` objects.
pub fn refresh_period(object_count: usize) -> Duration {
    let scaled = (object_count as f64 * MS_PER_OBJECT) as u64;
    Duration::from_millis(scaled.clamp(MIN_PERIOD_MS, MAX_PERIOD_MS))
}

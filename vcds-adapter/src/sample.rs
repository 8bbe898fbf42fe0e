//! Sample size derivation.

/// Granularities (seconds per point) the API serves, ascending.
const GRANULARITIES: &[u32] = &[
    1, 5, 10, 30, 60, 300, 600, 1800, 3600, 10800, 21600, 43200, 86400,
];

const DAY: u64 = 86400;

/// Pick the sample size so that `[from, until]` yields roughly `target_points`.
///
/// The raw seconds-per-point is rounded up to the next supported granularity,
/// and to whole days past the largest one. The result is at least 1 and never
/// shrinks as the span grows.
pub fn calculate_sample_size(from: i64, until: i64, target_points: u32) -> u32 {
    let span = until.saturating_sub(from).max(1) as u64;
    let points = u64::from(target_points.max(1));
    let raw = span.div_ceil(points);

    GRANULARITIES
        .iter()
        .copied()
        .find(|g| u64::from(*g) >= raw)
        .unwrap_or_else(|| {
            let days = raw.div_ceil(DAY) * DAY;
            days.min(u64::from(u32::MAX)) as u32
        })
}

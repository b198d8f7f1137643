//! Continuous curve over the sparse curated parallel-rate series
//!
//! ```text
//! [lower, upper] per day → midpoint → linear gap fill → 3 × centered MA(5)
//! ```

use super::types::DailySummary;
use chrono::NaiveDate;

pub const SMOOTHING_WINDOW: usize = 5;
pub const SMOOTHING_PASSES: usize = 3;

/// Midpoint of a day's curated range
pub fn interval_midpoint(day: &DailySummary) -> Option<f64> {
    day.usd_bob_parallel
        .as_ref()
        .and_then(|range| range.quote_interval)
        .map(|[lower, upper]| (lower + upper) / 2.0)
}

/// Fill gaps by linear interpolation between known neighbours
///
/// Leading gaps stay empty; trailing gaps carry the last known value.
pub fn interpolate_linear(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut last_known: Option<(usize, f64)> = None;

    for (idx, value) in values.iter().enumerate() {
        let Some(v) = *value else { continue };
        if let Some((prev_idx, prev)) = last_known {
            let span = (idx - prev_idx) as f64;
            for gap in prev_idx + 1..idx {
                let t = (gap - prev_idx) as f64 / span;
                out[gap] = Some(prev + (v - prev) * t);
            }
        }
        last_known = Some((idx, v));
    }

    if let Some((last_idx, last)) = last_known {
        for slot in out.iter_mut().skip(last_idx + 1) {
            *slot = Some(last);
        }
    }
    out
}

/// Centered moving average that shrinks at the edges and skips empty slots
pub fn centered_moving_average(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let before = (window - 1) / 2;
    let after = window / 2;

    (0..values.len())
        .map(|idx| {
            let lo = idx.saturating_sub(before);
            let hi = (idx + after).min(values.len() - 1);
            let present: Vec<f64> = values[lo..=hi].iter().flatten().copied().collect();
            (!present.is_empty()).then(|| present.iter().sum::<f64>() / present.len() as f64)
        })
        .collect()
}

/// Midpoints → interpolation → repeated smoothing
pub fn smooth_curve(midpoints: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut curve = interpolate_linear(midpoints);
    for _ in 0..SMOOTHING_PASSES {
        curve = centered_moving_average(&curve, SMOOTHING_WINDOW);
    }
    curve
}

/// Smoothed value for every day strictly after `cutover`
///
/// `days` must be ascending by date.
pub fn parallel_curve(days: &[DailySummary], cutover: NaiveDate) -> Vec<(usize, Option<f64>)> {
    let indices: Vec<usize> = days
        .iter()
        .enumerate()
        .filter(|(_, d)| d.timestamp.date_naive() > cutover)
        .map(|(idx, _)| idx)
        .collect();

    let midpoints: Vec<Option<f64>> = indices
        .iter()
        .map(|&idx| interval_midpoint(&days[idx]))
        .collect();
    indices.into_iter().zip(smooth_curve(&midpoints)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::CuratedRange;
    use chrono::{TimeZone, Utc};

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map_or(false, |a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn test_interpolates_gaps() {
        let filled = interpolate_linear(&[Some(10.0), None, Some(12.0), None, Some(14.0)]);
        assert!(approx(filled[1], 11.0));
        assert!(approx(filled[3], 13.0));
    }

    #[test]
    fn test_edges() {
        let filled = interpolate_linear(&[None, Some(10.0), None, None, Some(13.0), None]);
        assert_eq!(filled[0], None);
        assert!(approx(filled[2], 11.0));
        assert!(approx(filled[3], 12.0));
        assert!(approx(filled[5], 13.0));
        assert!(interpolate_linear(&[None, None]).iter().all(Option::is_none));
    }

    #[test]
    fn test_moving_average_shrinks_at_edges() {
        let values = [Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)];
        let smoothed = centered_moving_average(&values, 5);
        assert!(approx(smoothed[0], 2.0)); // mean(1,2,3)
        assert!(approx(smoothed[1], 2.5)); // mean(1,2,3,4)
        assert!(approx(smoothed[2], 3.0));
        assert!(approx(smoothed[5], 5.0)); // mean(4,5,6)
    }

    #[test]
    fn test_moving_average_skips_empty() {
        let smoothed = centered_moving_average(&[None, None, Some(4.0)], 5);
        assert!(smoothed.iter().all(|v| approx(*v, 4.0)));
        assert_eq!(centered_moving_average(&[None], 5), vec![None]);
    }

    #[test]
    fn test_linear_series_survives_smoothing_in_the_interior() {
        let midpoints: Vec<Option<f64>> = (0..20)
            .map(|i| if i % 3 == 0 { Some(10.0 + i as f64 * 0.1) } else { None })
            .collect();
        let curve = smooth_curve(&midpoints);
        assert!(approx(curve[9], 10.9));
    }

    #[test]
    fn test_parallel_curve_honours_cutover() {
        let cutover = chrono::NaiveDate::from_ymd_opt(2023, 2, 8).unwrap();
        let days: Vec<DailySummary> = (7..=11)
            .map(|d| {
                let key = Utc.with_ymd_and_hms(2023, 2, d, 0, 0, 0).unwrap();
                let mut day = DailySummary::empty(key);
                day.usd_bob_parallel = Some(CuratedRange {
                    quote_interval: Some([8.0 + d as f64, 8.0 + d as f64]),
                    sources: Vec::new(),
                });
                day
            })
            .collect();

        let curve = parallel_curve(&days, cutover);
        let indices: Vec<usize> = curve.iter().map(|(idx, _)| *idx).collect();
        assert_eq!(indices, vec![2, 3, 4]);
        // mean of 17, 18, 19 after each pass
        assert!(approx(curve[1].1, 18.0));
    }
}

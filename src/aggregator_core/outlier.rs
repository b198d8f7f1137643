//! IQR price outlier filter

use super::quote::AdQuote;

const IQR_FENCE: f64 = 1.5;

/// Quantile with linear interpolation between order statistics
///
/// `sorted` must be ascending and non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// Tukey fences `(Q1 - 1.5·IQR, Q3 + 1.5·IQR)` over the batch prices
pub fn iqr_bounds(quotes: &[AdQuote]) -> Option<(f64, f64)> {
    if quotes.is_empty() {
        return None;
    }

    let mut prices: Vec<f64> = quotes.iter().map(|q| q.price).collect();
    prices.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile(&prices, 0.25);
    let q3 = quantile(&prices, 0.75);
    let iqr = q3 - q1;
    Some((q1 - IQR_FENCE * iqr, q3 + IQR_FENCE * iqr))
}

/// Keep ads priced strictly inside the IQR fences, preserving listing order
///
/// A degenerate distribution (lower fence == upper fence, e.g. all prices
/// equal) makes this a no-op so a zero-variance batch is never emptied.
pub fn filter_outliers(quotes: Vec<AdQuote>) -> Vec<AdQuote> {
    let Some((lower, upper)) = iqr_bounds(&quotes) else {
        return quotes;
    };

    if lower == upper {
        log::debug!("IQR fences collapsed at {}, skipping outlier filter", lower);
        return quotes;
    }

    quotes
        .into_iter()
        .filter(|q| q.price > lower && q.price < upper)
        .collect()
}

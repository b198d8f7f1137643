//! Merge of a day's approved rate hints into one range
//!
//! Rules per hint type, starting from an empty `[+inf, -inf]` range:
//! - `exact`: lower = min(lower, q), upper = max(upper, q)
//! - `above`: lower = min(lower, q), upper = max(upper, q + 1)
//! - `below`: upper = max(upper, q), lower = min(lower, q - 1)
//! - `null`: contributes its source only
//!
//! Every rule uses min/max, so a hint can only widen the range and the
//! result does not depend on hint order.

use super::types::{CuratedRange, HintSource, HintType, RateHint};

/// Optimistic one-sided extension applied to `above`/`below` bounds
const ONE_SIDED_STEP: f64 = 1.0;

/// Merge the day's hints; `None` when there are no hints at all
///
/// Callers pass only human-approved hints.
pub fn merge_hints(hints: &[RateHint]) -> Option<CuratedRange> {
    if hints.is_empty() {
        return None;
    }

    let mut lower = f64::INFINITY;
    let mut upper = f64::NEG_INFINITY;
    let mut sources = Vec::with_capacity(hints.len());

    for hint in hints {
        sources.push(HintSource {
            source: hint.source.clone(),
            url: hint.url.clone(),
        });

        let Some(q) = hint.quote else { continue };
        match hint.hint_type.unwrap_or(HintType::Null) {
            HintType::Exact => {
                lower = lower.min(q);
                upper = upper.max(q);
            }
            HintType::Above => {
                lower = lower.min(q);
                upper = upper.max(q + ONE_SIDED_STEP);
            }
            HintType::Below => {
                upper = upper.max(q);
                lower = lower.min(q - ONE_SIDED_STEP);
            }
            HintType::Null => {}
        }
    }

    let quote_interval = (lower.is_finite() && upper.is_finite()).then_some([lower, upper]);
    Some(CuratedRange {
        quote_interval,
        sources,
    })
}

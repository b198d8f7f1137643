//! Liquidity depth table

use super::quote::{round2, AdQuote};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: f64,
    pub volume: f64,
}

/// Sum volume per exact price level, ascending by price
///
/// Operates on the full admitted batch, before VWAP truncation. Level volumes
/// are rounded to 2 decimals after summing.
pub fn liquidity_depth(quotes: &[AdQuote]) -> Vec<DepthLevel> {
    let mut levels: Vec<DepthLevel> = Vec::new();

    for quote in quotes {
        match levels.iter_mut().find(|level| level.price == quote.price) {
            Some(level) => level.volume += quote.volume,
            None => levels.push(DepthLevel {
                price: quote.price,
                volume: quote.volume,
            }),
        }
    }

    levels.sort_by(|a, b| a.price.total_cmp(&b.price));
    for level in &mut levels {
        level.volume = round2(level.volume);
    }
    levels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_and_sorts() {
        let quotes = vec![
            AdQuote::new("a", 10.5, 3.0),
            AdQuote::new("b", 10.0, 5.0),
            AdQuote::new("c", 10.5, 2.25),
        ];
        let depth = liquidity_depth(&quotes);
        let levels: Vec<(f64, f64)> = depth.iter().map(|l| (l.price, l.volume)).collect();
        assert_eq!(levels, vec![(10.0, 5.0), (10.5, 5.25)]);
    }

    #[test]
    fn test_volume_conserved() {
        let quotes: Vec<AdQuote> = (0..40)
            .map(|i| AdQuote::new("u", 9.0 + (i % 7) as f64 * 0.05, 10.0 + i as f64))
            .collect();
        let input_total: f64 = quotes.iter().map(|q| q.volume).sum();
        let depth_total: f64 = liquidity_depth(&quotes).iter().map(|l| l.volume).sum();
        assert!((input_total - depth_total).abs() < 1e-9);
    }

    #[test]
    fn test_empty() {
        assert!(liquidity_depth(&[]).is_empty());
    }
}

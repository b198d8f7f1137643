//! Order-book ad types and currency pair identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// One order-book ad as stored in an interval's raw batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdQuote {
    pub username: String,
    pub price: f64,
    pub volume: f64,
}

impl AdQuote {
    pub fn new(username: impl Into<String>, price: f64, volume: f64) -> Self {
        Self {
            username: username.into(),
            price,
            volume,
        }
    }
}

/// An admitted ad with its 1-based position after filtering
#[derive(Debug, Clone, PartialEq)]
pub struct RankedQuote {
    pub quote: AdQuote,
    pub rank_position: usize,
}

/// Assign rank positions in listing order
///
/// Ranks are assigned after admission and outlier filtering, never before.
pub fn rank_quotes(quotes: Vec<AdQuote>) -> Vec<RankedQuote> {
    quotes
        .into_iter()
        .enumerate()
        .map(|(idx, quote)| RankedQuote {
            quote,
            rank_position: idx + 1,
        })
        .collect()
}

/// Which side of the book a batch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Sell,
    Buy,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Sell => write!(f, "sell"),
            Side::Buy => write!(f, "buy"),
        }
    }
}

/// Fiat/crypto pair an ad batch was collected for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurrencyPair {
    pub fiat: String,
    pub crypto: String,
}

impl CurrencyPair {
    pub fn new(fiat: impl Into<String>, crypto: impl Into<String>) -> Self {
        Self {
            fiat: fiat.into().to_uppercase(),
            crypto: crypto.into().to_uppercase(),
        }
    }

    pub fn usdt_bob() -> Self {
        Self::new("BOB", "USDT")
    }

    pub fn usdt_ars() -> Self {
        Self::new("ARS", "USDT")
    }

    /// Primary pair: USDT/BOB
    pub fn is_primary(&self) -> bool {
        self.fiat == "BOB" && self.crypto == "USDT"
    }

    /// Secondary pair: USDT/ARS
    pub fn is_secondary(&self) -> bool {
        self.fiat == "ARS" && self.crypto == "USDT"
    }

    /// Number of top-ranked ads that enter the VWAP
    pub fn vwap_depth(&self) -> usize {
        if self.fiat == "BOB" {
            35
        } else {
            70
        }
    }

    /// Collection holding this pair's aggregated intervals, e.g. `USDT_BOB_Binance`
    pub fn interval_collection(&self) -> String {
        format!("{}_{}_Binance", self.crypto, self.fiat)
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.crypto, self.fiat)
    }
}

/// Round half away from zero to 2 decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_is_one_based_listing_order() {
        let ranked = rank_quotes(vec![
            AdQuote::new("a", 10.0, 1.0),
            AdQuote::new("b", 10.1, 1.0),
        ]);
        assert_eq!(ranked[0].rank_position, 1);
        assert_eq!(ranked[1].rank_position, 2);
        assert_eq!(ranked[1].quote.username, "b");
    }

    #[test]
    fn test_pair_identity() {
        let bob = CurrencyPair::new("bob", "usdt");
        assert!(bob.is_primary());
        assert_eq!(bob.vwap_depth(), 35);
        assert_eq!(bob.interval_collection(), "USDT_BOB_Binance");

        let ars = CurrencyPair::usdt_ars();
        assert!(ars.is_secondary());
        assert_eq!(ars.vwap_depth(), 70);

        let eur = CurrencyPair::new("EUR", "USDT");
        assert!(!eur.is_primary() && !eur.is_secondary());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(10.115384), 10.12);
        assert_eq!(round2(-0.125), -0.13);
        assert_eq!(round2(2.0), 2.0);
    }
}

//! Ad admission rules
//!
//! Each supported pair has a named policy holding its thresholds. A policy
//! evaluates a list of exclusion predicates over the ad and its advertiser;
//! the ad is admitted when none of them hold. The policy also tells the page
//! loop whether further pages are worth fetching.

use super::blocklist::Blocklist;
use super::quote::{AdQuote, CurrencyPair};

/// Advertiser reliability attributes reported alongside an ad
#[derive(Debug, Clone, PartialEq)]
pub struct AdvertiserAttributes {
    pub username: String,
    /// Largest single transaction the ad accepts, in fiat
    pub max_single_trans_amount: f64,
    pub is_tradable: bool,
    pub month_order_count: u32,
    /// Seconds since the advertiser was last active, if reported
    pub active_time_secs: Option<u64>,
    pub month_finish_rate: f64,
    pub positive_rate: Option<f64>,
    pub trade_methods: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionDecision {
    pub admit: bool,
    pub continue_paging: bool,
}

/// Thresholds for the primary pair (USDT/BOB)
#[derive(Debug, Clone, PartialEq)]
pub struct PrimaryPairPolicy {
    pub min_volume: f64,
    /// Official reference rate; ads at or under it are not parallel-market quotes
    pub reference_rate: f64,
    pub min_single_trans_amount: f64,
    pub min_month_orders: u32,
    pub max_inactive_secs: u64,
    pub min_finish_rate: f64,
    pub min_positive_rate: f64,
    pub disallowed_methods: Vec<String>,
}

impl Default for PrimaryPairPolicy {
    fn default() -> Self {
        Self {
            min_volume: 100.0,
            reference_rate: 6.96,
            min_single_trans_amount: 100.0,
            min_month_orders: 20,
            max_inactive_secs: 43_200,
            min_finish_rate: 0.75,
            min_positive_rate: 0.95,
            disallowed_methods: vec!["Banco Fassil".to_string(), "Tigo Money".to_string()],
        }
    }
}

impl PrimaryPairPolicy {
    fn excluded(&self, ad: &AdQuote, attrs: &AdvertiserAttributes, blocklist: &Blocklist) -> bool {
        ad.volume < self.min_volume
            || ad.price <= self.reference_rate
            || attrs.max_single_trans_amount <= self.min_single_trans_amount
            || !attrs.is_tradable
            || attrs.month_order_count < self.min_month_orders
            || inactive_too_long(attrs.active_time_secs, self.max_inactive_secs)
            || attrs.month_finish_rate < self.min_finish_rate
            || below_rate(attrs.positive_rate, self.min_positive_rate)
            || blocklist.contains(&attrs.username)
            || attrs
                .trade_methods
                .iter()
                .any(|method| self.disallowed_methods.iter().any(|d| d == method))
    }
}

/// Thresholds for the secondary pair (USDT/ARS)
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryPairPolicy {
    pub min_volume: f64,
    pub min_month_orders: u32,
    pub max_inactive_secs: u64,
    pub min_finish_rate: f64,
    pub min_positive_rate: f64,
}

impl Default for SecondaryPairPolicy {
    fn default() -> Self {
        Self {
            min_volume: 50.0,
            min_month_orders: 50,
            max_inactive_secs: 43_200,
            min_finish_rate: 0.75,
            min_positive_rate: 0.95,
        }
    }
}

impl SecondaryPairPolicy {
    fn excluded(&self, ad: &AdQuote, attrs: &AdvertiserAttributes) -> bool {
        ad.volume < self.min_volume
            || !attrs.is_tradable
            || attrs.month_order_count < self.min_month_orders
            || inactive_too_long(attrs.active_time_secs, self.max_inactive_secs)
            || attrs.month_finish_rate < self.min_finish_rate
            || below_rate(attrs.positive_rate, self.min_positive_rate)
    }
}

/// Admission policy dispatched by pair identity
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionPolicy {
    Primary(PrimaryPairPolicy),
    Secondary(SecondaryPairPolicy),
    /// Pairs without a policy: every ad is rejected and paging stops
    Unsupported,
}

impl AdmissionPolicy {
    pub fn for_pair(pair: &CurrencyPair) -> Self {
        if pair.is_primary() {
            AdmissionPolicy::Primary(PrimaryPairPolicy::default())
        } else if pair.is_secondary() {
            AdmissionPolicy::Secondary(SecondaryPairPolicy::default())
        } else {
            AdmissionPolicy::Unsupported
        }
    }

    pub fn evaluate(
        &self,
        ad: &AdQuote,
        attrs: &AdvertiserAttributes,
        blocklist: &Blocklist,
    ) -> AdmissionDecision {
        match self {
            AdmissionPolicy::Primary(policy) => AdmissionDecision {
                admit: !policy.excluded(ad, attrs, blocklist),
                continue_paging: ad.price > policy.reference_rate,
            },
            AdmissionPolicy::Secondary(policy) => AdmissionDecision {
                admit: !policy.excluded(ad, attrs),
                continue_paging: true,
            },
            AdmissionPolicy::Unsupported => AdmissionDecision {
                admit: false,
                continue_paging: false,
            },
        }
    }
}

// Unknown activity age counts as inactive.
fn inactive_too_long(active_time_secs: Option<u64>, max_secs: u64) -> bool {
    active_time_secs.map_or(true, |secs| secs > max_secs)
}

fn below_rate(rate: Option<f64>, min: f64) -> bool {
    rate.map_or(true, |r| r < min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reliable(username: &str) -> AdvertiserAttributes {
        AdvertiserAttributes {
            username: username.to_string(),
            max_single_trans_amount: 5_000.0,
            is_tradable: true,
            month_order_count: 300,
            active_time_secs: Some(60),
            month_finish_rate: 0.98,
            positive_rate: Some(0.99),
            trade_methods: vec!["Banco Union".to_string()],
        }
    }

    fn bob_ad(price: f64, volume: f64) -> AdQuote {
        AdQuote::new("trader", price, volume)
    }

    #[test]
    fn test_primary_admits_reliable_ad() {
        let policy = AdmissionPolicy::for_pair(&CurrencyPair::usdt_bob());
        let none = Blocklist::default();
        let decision = policy.evaluate(&bob_ad(12.5, 500.0), &reliable("trader"), &none);
        assert!(decision.admit);
        assert!(decision.continue_paging);
    }

    #[test]
    fn test_primary_reference_rate_stops_paging() {
        let policy = AdmissionPolicy::for_pair(&CurrencyPair::usdt_bob());
        let none = Blocklist::default();
        let decision = policy.evaluate(&bob_ad(6.96, 500.0), &reliable("trader"), &none);
        assert!(!decision.admit);
        assert!(!decision.continue_paging);
    }

    #[test]
    fn test_primary_each_exclusion() {
        let policy = AdmissionPolicy::for_pair(&CurrencyPair::usdt_bob());
        let none = Blocklist::default();
        let ad = bob_ad(12.5, 500.0);

        let with = |change: fn(&mut AdvertiserAttributes)| {
            let mut attrs = reliable("trader");
            change(&mut attrs);
            attrs
        };
        let cases: Vec<(&str, AdvertiserAttributes)> = vec![
            ("small cap", with(|a| a.max_single_trans_amount = 100.0)),
            ("not tradable", with(|a| a.is_tradable = false)),
            ("few orders", with(|a| a.month_order_count = 19)),
            ("inactive", with(|a| a.active_time_secs = Some(43_201))),
            ("unknown activity", with(|a| a.active_time_secs = None)),
            ("low completion", with(|a| a.month_finish_rate = 0.74)),
            ("low feedback", with(|a| a.positive_rate = Some(0.94))),
            ("unknown feedback", with(|a| a.positive_rate = None)),
            (
                "disallowed method",
                with(|a| a.trade_methods.push("Tigo Money".to_string())),
            ),
        ];

        for (label, attrs) in cases {
            let decision = policy.evaluate(&ad, &attrs, &none);
            assert!(!decision.admit, "{} should be excluded", label);
            assert!(decision.continue_paging, "{} should not stop paging", label);
        }

        let small = policy.evaluate(&bob_ad(12.5, 99.9), &reliable("trader"), &none);
        assert!(!small.admit);
    }

    #[test]
    fn test_primary_blocklist() {
        let policy = AdmissionPolicy::for_pair(&CurrencyPair::usdt_bob());
        let blocked = Blocklist::new(["trader"]);
        let decision = policy.evaluate(&bob_ad(12.5, 500.0), &reliable("trader"), &blocked);
        assert!(!decision.admit);
    }

    #[test]
    fn test_secondary_has_no_price_ceiling() {
        let policy = AdmissionPolicy::for_pair(&CurrencyPair::usdt_ars());
        let cheap = AdQuote::new("porteno", 1.0, 60.0);
        let mut attrs = reliable("porteno");
        attrs.max_single_trans_amount = 10.0;

        let decision = policy.evaluate(&cheap, &attrs, &Blocklist::new(["porteno"]));
        assert!(decision.admit);
        assert!(decision.continue_paging);

        attrs.month_order_count = 49;
        let decision = policy.evaluate(&cheap, &attrs, &Blocklist::default());
        assert!(!decision.admit);
        assert!(decision.continue_paging);
    }

    #[test]
    fn test_unsupported_pair_rejects() {
        let policy = AdmissionPolicy::for_pair(&CurrencyPair::new("EUR", "USDT"));
        assert_eq!(policy, AdmissionPolicy::Unsupported);
        let none = Blocklist::default();
        let decision = policy.evaluate(&bob_ad(12.5, 500.0), &reliable("trader"), &none);
        assert_eq!(
            decision,
            AdmissionDecision {
                admit: false,
                continue_paging: false,
            }
        );
    }
}

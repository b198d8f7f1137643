//! Bounded page loop over an ad listing source
//!
//! The exchange returns ads a page at a time in listing order. Each ad is
//! run through the pair's admission policy; the decision on the last ad of a
//! page says whether the next page is still worth fetching.

use super::admission::{AdmissionPolicy, AdvertiserAttributes};
use super::blocklist::Blocklist;
use super::quote::{AdQuote, CurrencyPair, Side};
use crate::error::AggregationError;

/// Hard cap on pages fetched per side
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// One listed ad with its advertiser attributes
#[derive(Debug, Clone, PartialEq)]
pub struct ListedAd {
    pub quote: AdQuote,
    pub advertiser: AdvertiserAttributes,
}

/// Paged listing source (exchange connector or fixture)
pub trait AdPageSource {
    /// Fetch 1-based `page` of ads for `pair` on `side`; an empty page means no more results
    fn fetch_page(
        &mut self,
        pair: &CurrencyPair,
        side: Side,
        page: u32,
    ) -> Result<Vec<ListedAd>, AggregationError>;
}

/// Applies admission rules across pages
pub struct AdCollector<'a> {
    pair: CurrencyPair,
    policy: AdmissionPolicy,
    blocklist: &'a Blocklist,
    max_pages: u32,
}

impl<'a> AdCollector<'a> {
    pub fn new(pair: CurrencyPair, blocklist: &'a Blocklist) -> Self {
        Self {
            policy: AdmissionPolicy::for_pair(&pair),
            pair,
            blocklist,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Collect admitted ads for one side, in listing order
    pub fn collect(
        &self,
        source: &mut impl AdPageSource,
        side: Side,
    ) -> Result<Vec<AdQuote>, AggregationError> {
        let mut admitted = Vec::new();
        let mut page = 1;

        loop {
            if page > self.max_pages {
                log::warn!(
                    "⚠️  {} {} paging stopped at page limit {}",
                    self.pair,
                    side,
                    self.max_pages
                );
                break;
            }

            let ads = source.fetch_page(&self.pair, side, page)?;
            if ads.is_empty() {
                break;
            }

            let mut continue_paging = true;
            for ad in ads {
                let decision = self.policy.evaluate(&ad.quote, &ad.advertiser, self.blocklist);
                if decision.admit {
                    admitted.push(ad.quote);
                }
                continue_paging = decision.continue_paging;
            }

            if !continue_paging {
                break;
            }
            page += 1;
        }

        log::debug!("{} {} ads admitted: {}", self.pair, side, admitted.len());
        Ok(admitted)
    }
}

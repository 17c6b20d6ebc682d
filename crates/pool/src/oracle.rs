//! # Price Oracle
//!
//! Feed lookup with staleness and inversion handling. A registry holds
//! feeds keyed by (quote, base); a missing direct feed falls back to the
//! inverted pair with the price reciprocal taken at the feed's own
//! precision. Time is always passed in explicitly.

use std::collections::HashMap;

use strata_core::errors::{CoreResult, StrataError};
use strata_core::math::decimal::{check_decimals, pow10};
use strata_core::types::AssetId;

/// Oracle seam consumed by the pricing engine
pub trait PriceOracle {
    /// Price of one `quote` unit denominated in `base`, at the feed's
    /// declared precision
    fn price(&self, quote: &AssetId, base: &AssetId, now: i64) -> CoreResult<u128>;

    /// Fractional digits of the pair's price
    fn price_decimals(&self, quote: &AssetId, base: &AssetId) -> CoreResult<u8>;
}

/// A single registered feed
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PriceFeed {
    pub price: u128,
    pub decimals: u8,
    pub last_update: i64,
    /// Maximum age before the feed is considered stale
    pub heartbeat: i64,
}

/// In-memory feed registry
#[derive(Debug, Clone, Default)]
pub struct FeedRegistry {
    feeds: HashMap<(AssetId, AssetId), PriceFeed>,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_feed(
        &mut self,
        quote: AssetId,
        base: AssetId,
        feed: PriceFeed,
    ) -> CoreResult<()> {
        check_decimals(feed.decimals)?;
        if feed.price == 0 || feed.heartbeat <= 0 {
            return Err(StrataError::InvalidParameter);
        }
        self.feeds.insert((quote, base), feed);
        Ok(())
    }

    /// Refresh an existing feed's price and timestamp
    pub fn update_price(
        &mut self,
        quote: &AssetId,
        base: &AssetId,
        price: u128,
        now: i64,
    ) -> CoreResult<()> {
        if price == 0 {
            return Err(StrataError::InvalidParameter);
        }
        let feed = self
            .feeds
            .get_mut(&(quote.clone(), base.clone()))
            .ok_or(StrataError::NoFeedFound)?;
        feed.price = price;
        feed.last_update = now;
        Ok(())
    }

    /// Direct lookup, falling back to the inverted pair. The boolean marks
    /// whether the returned feed must be reciprocated.
    fn lookup(&self, quote: &AssetId, base: &AssetId) -> CoreResult<(&PriceFeed, bool)> {
        if let Some(feed) = self.feeds.get(&(quote.clone(), base.clone())) {
            return Ok((feed, false));
        }
        if let Some(feed) = self.feeds.get(&(base.clone(), quote.clone())) {
            return Ok((feed, true));
        }
        Err(StrataError::NoFeedFound)
    }
}

impl PriceOracle for FeedRegistry {
    fn price(&self, quote: &AssetId, base: &AssetId, now: i64) -> CoreResult<u128> {
        let (feed, inverted) = self.lookup(quote, base)?;
        if feed.last_update + feed.heartbeat < now {
            return Err(StrataError::StalePrice);
        }
        if inverted {
            // reciprocal at the feed's own precision: 10^(2d) / p
            let unit_sq = pow10(feed.decimals)
                .checked_mul(pow10(feed.decimals))
                .ok_or(StrataError::MathOverflow)?;
            return Ok(unit_sq / feed.price);
        }
        Ok(feed.price)
    }

    fn price_decimals(&self, quote: &AssetId, base: &AssetId) -> CoreResult<u8> {
        let (feed, _) = self.lookup(quote, base)?;
        Ok(feed.decimals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eth() -> AssetId {
        AssetId::new("ETH")
    }

    fn usd() -> AssetId {
        AssetId::new("USD")
    }

    fn feed(price: u128, last_update: i64) -> PriceFeed {
        PriceFeed {
            price,
            decimals: 8,
            last_update,
            heartbeat: 3600,
        }
    }

    #[test]
    fn test_direct_lookup() {
        let mut registry = FeedRegistry::new();
        registry.set_feed(eth(), usd(), feed(3_000 * 100_000_000, 1_000)).unwrap();

        assert_eq!(registry.price(&eth(), &usd(), 2_000).unwrap(), 300_000_000_000);
        assert_eq!(registry.price_decimals(&eth(), &usd()).unwrap(), 8);
    }

    #[test]
    fn test_inverted_lookup() {
        let mut registry = FeedRegistry::new();
        // Only USD/ETH registered; asking for ETH/USD must reciprocate.
        registry
            .set_feed(usd(), eth(), PriceFeed { price: 33_333, decimals: 8, last_update: 0, heartbeat: 3600 })
            .unwrap();

        // 10^16 / 33_333 = 300_003_000_030
        assert_eq!(registry.price(&eth(), &usd(), 100).unwrap(), 300_003_000_030);
        assert_eq!(registry.price_decimals(&eth(), &usd()).unwrap(), 8);
    }

    #[test]
    fn test_missing_feed() {
        let registry = FeedRegistry::new();
        assert_eq!(
            registry.price(&eth(), &usd(), 0),
            Err(StrataError::NoFeedFound)
        );
    }

    #[test]
    fn test_stale_feed() {
        let mut registry = FeedRegistry::new();
        registry.set_feed(eth(), usd(), feed(1, 1_000)).unwrap();

        // last_update + heartbeat = 4_600; 4_600 itself is still fresh
        assert!(registry.price(&eth(), &usd(), 4_600).is_ok());
        assert_eq!(
            registry.price(&eth(), &usd(), 4_601),
            Err(StrataError::StalePrice)
        );
    }

    #[test]
    fn test_update_price() {
        let mut registry = FeedRegistry::new();
        registry.set_feed(eth(), usd(), feed(100, 0)).unwrap();
        registry.update_price(&eth(), &usd(), 200, 5_000).unwrap();

        assert_eq!(registry.price(&eth(), &usd(), 5_100).unwrap(), 200);
        assert_eq!(
            registry.update_price(&usd(), &AssetId::new("BTC"), 1, 0),
            Err(StrataError::NoFeedFound)
        );
    }

    #[test]
    fn test_rejects_bad_feed() {
        let mut registry = FeedRegistry::new();
        assert_eq!(
            registry.set_feed(eth(), usd(), feed(0, 0)),
            Err(StrataError::InvalidParameter)
        );
        let bad_decimals = PriceFeed { price: 1, decimals: 30, last_update: 0, heartbeat: 60 };
        assert_eq!(
            registry.set_feed(eth(), usd(), bad_decimals),
            Err(StrataError::InvalidParameter)
        );
    }
}

//! Currency conversion and catalog listing over the snapshot cache.

use crate::cache::{CacheError, TtlCache};
use crate::pricing::PriceFeed;
use std::sync::Arc;

/// Domain logic over [`TtlCache`]: conversion arithmetic, code validation and
/// catalog listing. Never caches independently — every read goes through the
/// cache's TTL policy.
pub struct CurrencyConverter {
    cache: TtlCache,
    feed: Arc<dyn PriceFeed>,
}

impl CurrencyConverter {
    /// Create a converter over the given cache and price feed.
    pub fn new(cache: TtlCache, feed: Arc<dyn PriceFeed>) -> Self {
        Self { cache, feed }
    }

    /// Convert `amount` between two currency codes.
    ///
    /// Rates are USD-relative, so the conversion is
    /// `amount * rate(to) / rate(from)`. Returns `Ok(None)` when either code
    /// is not present in the rates snapshot — an expected outcome, not an
    /// error.
    ///
    /// # Errors
    ///
    /// Only for infrastructure failure (snapshot or unrecovered fetch).
    pub async fn convert(
        &self,
        amount: f64,
        from: &str,
        to: &str,
    ) -> Result<Option<f64>, CacheError> {
        let (rates, _) = self.cache.rates(self.feed.as_ref()).await?;
        match (rates.get(from), rates.get(to)) {
            (Some(from_rate), Some(to_rate)) => Ok(Some(amount * to_rate / from_rate)),
            _ => Ok(None),
        }
    }

    /// Available currency codes, in catalog order.
    ///
    /// # Errors
    ///
    /// On infrastructure failure.
    pub async fn currency_codes(&self) -> Result<Vec<String>, CacheError> {
        let (catalog, _) = self.cache.catalog(self.feed.as_ref()).await?;
        Ok(catalog.into_keys().collect())
    }

    /// Country/display names, in catalog order.
    ///
    /// # Errors
    ///
    /// On infrastructure failure.
    pub async fn country_names(&self) -> Result<Vec<String>, CacheError> {
        let (catalog, _) = self.cache.catalog(self.feed.as_ref()).await?;
        Ok(catalog.into_values().collect())
    }

    /// `(name, code)` pairs, in catalog order.
    ///
    /// # Errors
    ///
    /// On infrastructure failure.
    pub async fn pairs(&self) -> Result<Vec<(String, String)>, CacheError> {
        let (catalog, _) = self.cache.catalog(self.feed.as_ref()).await?;
        Ok(catalog.into_iter().map(|(code, name)| (name, code)).collect())
    }

    /// Run the catalog through the TTL policy.
    ///
    /// Returns whether a network refresh actually occurred, so callers can
    /// decide whether dependent UI needs regeneration.
    ///
    /// # Errors
    ///
    /// On infrastructure failure.
    pub async fn refresh_catalog(&self) -> Result<bool, CacheError> {
        let (_, refreshed) = self.cache.catalog(self.feed.as_ref()).await?;
        Ok(refreshed)
    }

    /// Run the rates through the TTL policy. See [`Self::refresh_catalog`].
    ///
    /// # Errors
    ///
    /// On infrastructure failure.
    pub async fn refresh_rates(&self) -> Result<bool, CacheError> {
        let (_, refreshed) = self.cache.rates(self.feed.as_ref()).await?;
        Ok(refreshed)
    }
}

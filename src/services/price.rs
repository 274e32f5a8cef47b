use moka::future::Cache;
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Used when the price API is unreachable; the preorder UI always needs a
/// SOL quote.
const FALLBACK_SOL_PRICE: Decimal = dec!(200);

const PRICE_CACHE_KEY: &str = "solana_usd";

/// SOL/USD spot price from the CoinGecko simple-price API, cached for a
/// minute so repeated preorder attempts don't hammer the API.
#[derive(Clone)]
pub struct SolPriceService {
    client: Client,
    base_url: String,
    cache: Arc<Cache<String, Decimal>>,
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    solana: UsdQuote,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    usd: f64,
}

impl SolPriceService {
    pub fn new(base_url: String) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(60))
            .build();

        Self {
            client: Client::new(),
            base_url,
            cache: Arc::new(cache),
        }
    }

    /// Current SOL/USD price; falls back to a static quote on any fetch or
    /// parse failure rather than blocking the flow.
    pub async fn sol_usd(&self) -> Decimal {
        if let Some(price) = self.cache.get(PRICE_CACHE_KEY).await {
            return price;
        }

        match self.fetch().await {
            Ok(price) => {
                tracing::info!(%price, "fetched SOL price");
                self.cache.insert(PRICE_CACHE_KEY.to_string(), price).await;
                price
            }
            Err(e) => {
                tracing::warn!(error = %e, fallback = %FALLBACK_SOL_PRICE, "SOL price fetch failed");
                FALLBACK_SOL_PRICE
            }
        }
    }

    async fn fetch(&self) -> Result<Decimal, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/simple/price", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("ids", "solana"), ("vs_currencies", "usd")])
            .send()
            .await?
            .error_for_status()?;

        let parsed: SimplePriceResponse = response.json().await?;
        Decimal::from_f64(parsed.solana.usd)
            .ok_or_else(|| format!("unrepresentable price: {}", parsed.solana.usd).into())
    }
}

//! Bitcoin price sources: CoinGecko first, Binance as fallback.

use serde_json::{Map, Value};

use super::{ProviderId, Source, number};
use crate::config::Endpoints;

/// Sources for a bitcoin price in `currency`, in priority order.
pub fn sources(endpoints: &Endpoints, currency: &str) -> Vec<Source> {
    vec![
        Source::new(ProviderId::CoinGecko, &endpoints.coingecko)
            .param("ids", "bitcoin")
            .param("vs_currencies", currency.to_lowercase()),
        Source::new(ProviderId::Binance, &endpoints.binance)
            .param("symbol", format!("BTC{}", currency.to_uppercase())),
    ]
}

/// Price reported by `provider`, or 0 when the field is missing or the
/// provider does not serve prices.
pub fn extract_price(provider: ProviderId, body: &Map<String, Value>, currency: &str) -> f64 {
    let value = match provider {
        // {"bitcoin": {"usd": 43000.5}}
        ProviderId::CoinGecko => body
            .get("bitcoin")
            .and_then(|coin| coin.get(currency.to_lowercase())),
        // {"symbol": "BTCUSDT", "price": "43000.50000000"}
        ProviderId::Binance => body.get("price"),
        ProviderId::OpenMeteo
        | ProviderId::Wttr
        | ProviderId::ExchangeRateApi
        | ProviderId::Frankfurter => None,
    };

    value.and_then(number).unwrap_or(0.0)
}

//! Exchange-rate sources. Both providers answer with a `rates` object.

use serde_json::{Map, Value};

use super::{ProviderId, Source, number};
use crate::config::Endpoints;

/// Sources for the `from -> to` rate. Codes are expected uppercased.
pub fn sources(endpoints: &Endpoints, from: &str, to: &str) -> Vec<Source> {
    vec![
        Source::new(
            ProviderId::ExchangeRateApi,
            format!("{}/{from}", endpoints.exchangerate_api.trim_end_matches('/')),
        ),
        Source::new(ProviderId::Frankfurter, &endpoints.frankfurter)
            .param("from", from)
            .param("to", to),
    ]
}

pub fn extract_rate(provider: ProviderId, body: &Map<String, Value>, to: &str) -> f64 {
    match provider {
        ProviderId::ExchangeRateApi | ProviderId::Frankfurter => body
            .get("rates")
            .and_then(|rates| rates.get(to))
            .and_then(number)
            .unwrap_or(0.0),
        ProviderId::CoinGecko | ProviderId::Binance | ProviderId::OpenMeteo | ProviderId::Wttr => {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn both_providers_read_rates_table() {
        let body = object(json!({"base": "USD", "rates": {"EUR": 0.92, "RUB": 91.5}}));

        assert_eq!(extract_rate(ProviderId::ExchangeRateApi, &body, "EUR"), 0.92);
        assert_eq!(extract_rate(ProviderId::Frankfurter, &body, "RUB"), 91.5);
    }

    #[test]
    fn missing_target_currency_is_zero() {
        let body = object(json!({"rates": {"EUR": 0.92}}));
        assert_eq!(extract_rate(ProviderId::Frankfurter, &body, "JPY"), 0.0);
    }

    #[test]
    fn sources_embed_codes() {
        let sources = sources(&Endpoints::default(), "USD", "EUR");

        assert_eq!(sources[0].url, "https://api.exchangerate-api.com/v4/latest/USD");
        assert!(sources[0].params.is_empty());
        assert_eq!(
            sources[1].params,
            vec![("from".into(), "USD".into()), ("to".into(), "EUR".into())]
        );
    }
}

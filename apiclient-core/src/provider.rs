use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod exchange;
pub mod price;
pub mod weather;

/// Every upstream provider the client knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "CoinGecko")]
    CoinGecko,
    #[serde(rename = "Binance")]
    Binance,
    #[serde(rename = "Open-Meteo")]
    OpenMeteo,
    #[serde(rename = "wttr.in")]
    Wttr,
    #[serde(rename = "ExchangeRate-API")]
    ExchangeRateApi,
    #[serde(rename = "Frankfurter")]
    Frankfurter,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::CoinGecko => "CoinGecko",
            ProviderId::Binance => "Binance",
            ProviderId::OpenMeteo => "Open-Meteo",
            ProviderId::Wttr => "wttr.in",
            ProviderId::ExchangeRateApi => "ExchangeRate-API",
            ProviderId::Frankfurter => "Frankfurter",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[
            ProviderId::CoinGecko,
            ProviderId::Binance,
            ProviderId::OpenMeteo,
            ProviderId::Wttr,
            ProviderId::ExchangeRateApi,
            ProviderId::Frankfurter,
        ]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One candidate request for a logical query.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub provider: ProviderId,
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl Source {
    pub fn new(provider: ProviderId, url: impl Into<String>) -> Self {
        Self {
            provider,
            url: url.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.params.push((key.to_string(), value.to_string()));
        self
    }
}

/// Numeric value of a JSON number or numeric string.
pub(crate) fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn provider_names_match_serialized_form() {
        for id in ProviderId::all() {
            let serialized = serde_json::to_value(id).expect("provider id should serialize");
            assert_eq!(serialized, Value::String(id.as_str().to_string()));
            assert_eq!(id.to_string(), id.as_str());
        }
    }

    #[test]
    fn number_reads_numbers_and_numeric_strings() {
        assert_eq!(number(&json!(42.5)), Some(42.5));
        assert_eq!(number(&json!("43000.10000000")), Some(43000.1));
        assert_eq!(number(&json!(" 7 ")), Some(7.0));
        assert_eq!(number(&json!("n/a")), None);
        assert_eq!(number(&json!(null)), None);
    }

    #[test]
    fn source_builder_collects_params() {
        let source = Source::new(ProviderId::Binance, "https://example.test/price")
            .param("symbol", "BTCUSD")
            .param("limit", 1);

        assert_eq!(
            source.params,
            vec![
                ("symbol".to_string(), "BTCUSD".to_string()),
                ("limit".to_string(), "1".to_string()),
            ]
        );
    }
}

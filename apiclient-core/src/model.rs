use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::{error::LookupError, provider::ProviderId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub price: f64,
    pub currency: String,
    pub source: ProviderId,
    #[serde(serialize_with = "as_secs")]
    pub response_time: Duration,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub city: String,
    /// Degrees Celsius.
    pub temperature: f64,
    pub description: String,
    pub source: ProviderId,
    #[serde(serialize_with = "as_secs")]
    pub response_time: Duration,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRate {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: f64,
    pub source: ProviderId,
    #[serde(serialize_with = "as_secs")]
    pub response_time: Duration,
    pub fetched_at: DateTime<Utc>,
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Flat `{"success": ..., ...}` JSON view of a lookup result.
///
/// Success carries the payload fields; failure carries `error`, the echoed
/// inputs, a zero `price`/`rate` for price and exchange-rate lookups, and one
/// entry per exhausted source.
pub fn envelope<T: Serialize>(result: &Result<T, LookupError>) -> Value {
    match result {
        Ok(payload) => {
            let mut map = match serde_json::to_value(payload) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            };
            map.insert("success".to_string(), Value::Bool(true));
            Value::Object(map)
        }
        Err(err) => {
            let mut map = Map::new();
            map.insert("success".to_string(), Value::Bool(false));
            map.insert("error".to_string(), Value::String(err.to_string()));

            match err {
                LookupError::Price { currency, .. } => {
                    map.insert("price".to_string(), json!(0));
                    map.insert("currency".to_string(), json!(currency));
                }
                LookupError::Weather { city, .. } => {
                    map.insert("city".to_string(), json!(city));
                }
                LookupError::ExchangeRate {
                    from_currency,
                    to_currency,
                    ..
                } => {
                    map.insert("from_currency".to_string(), json!(from_currency));
                    map.insert("to_currency".to_string(), json!(to_currency));
                    map.insert("rate".to_string(), json!(0));
                }
            }

            let failures: Vec<Value> = err
                .failures()
                .iter()
                .map(|f| {
                    json!({
                        "source": f.provider.as_str(),
                        "attempts": f.attempts,
                        "error": f.last_error.to_string(),
                    })
                })
                .collect();
            map.insert("failures".to_string(), Value::Array(failures));

            Value::Object(map)
        }
    }
}

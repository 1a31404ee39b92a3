//! Weather sources: Open-Meteo for a few known cities, wttr.in for any city.

use serde_json::{Map, Value};

use super::{ProviderId, Source, number};
use crate::config::Endpoints;

/// Cities Open-Meteo can be queried for without geocoding: (name, lat, lon).
const CITY_COORDINATES: [(&str, f64, f64); 4] = [
    ("Moscow", 55.7558, 37.6173),
    ("London", 51.5074, -0.1278),
    ("New York", 40.7128, -74.0060),
    ("Tokyo", 35.6762, 139.6503),
];

/// Coordinates for `city`, matched by exact name.
pub fn coordinates(city: &str) -> Option<(f64, f64)> {
    CITY_COORDINATES
        .iter()
        .find(|(name, _, _)| *name == city)
        .map(|&(_, lat, lon)| (lat, lon))
}

pub fn sources(endpoints: &Endpoints, city: &str) -> Vec<Source> {
    let mut sources = Vec::with_capacity(2);

    if let Some((lat, lon)) = coordinates(city) {
        sources.push(
            Source::new(ProviderId::OpenMeteo, &endpoints.open_meteo)
                .param("latitude", lat)
                .param("longitude", lon)
                .param("current", "temperature_2m,weathercode"),
        );
    }

    let url = format!("{}/{}", endpoints.wttr.trim_end_matches('/'), city.replace(' ', "+"));
    let wttr = Source::new(ProviderId::Wttr, url).param("format", "j1");
    sources.push(wttr);

    sources
}

/// Temperature (Celsius) and description, or `None` for a provider that does
/// not serve weather.
pub fn extract(provider: ProviderId, body: &Map<String, Value>) -> Option<(f64, String)> {
    match provider {
        ProviderId::OpenMeteo => Some(open_meteo(body)),
        ProviderId::Wttr => Some(wttr(body)),
        ProviderId::CoinGecko
        | ProviderId::Binance
        | ProviderId::ExchangeRateApi
        | ProviderId::Frankfurter => None,
    }
}

// {"current": {"temperature_2m": 12.3, "weathercode": 3}}
fn open_meteo(body: &Map<String, Value>) -> (f64, String) {
    let current = body.get("current");

    let temperature = current
        .and_then(|c| c.get("temperature_2m"))
        .and_then(number)
        .unwrap_or(0.0);

    let code = match current.and_then(|c| c.get("weathercode")) {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => "N/A".to_string(),
    };

    (temperature, format!("Weather code: {code}"))
}

// {"current_condition": [{"temp_C": "11", "weatherDesc": [{"value": "Partly cloudy"}]}]}
fn wttr(body: &Map<String, Value>) -> (f64, String) {
    let current = body.get("current_condition").and_then(|c| c.get(0));

    let temperature = current
        .and_then(|c| c.get("temp_C"))
        .and_then(number)
        .unwrap_or(0.0);

    let description = current
        .and_then(|c| c.get("weatherDesc"))
        .and_then(|d| d.get(0))
        .and_then(|d| d.get("value"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    (temperature, description)
}

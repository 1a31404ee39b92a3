use anyhow::Context;
use apiclient_core::{
    ApiClient, ClientConfig, ExchangeRate, LookupError, PriceQuote, Statistics, WeatherReport,
    envelope,
};
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType};
use serde::Serialize;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "apiclient",
    version,
    about = "Multi-source price, weather and exchange-rate client"
)]
pub struct Cli {
    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Per-request timeout in seconds (overrides the config file).
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Extra attempts per source for retrying queries (overrides the config file).
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the bitcoin price.
    Price {
        /// Currency code, e.g. USD, EUR, RUB.
        #[arg(default_value = "USD")]
        currency: String,
    },

    /// Show current weather for a city.
    Weather {
        #[arg(default_value = "London")]
        city: String,
    },

    /// Show an exchange rate.
    Rate {
        #[arg(default_value = "USD")]
        from: String,

        #[arg(default_value = "EUR")]
        to: String,
    },

    /// Check internet connectivity.
    Ping,

    /// Run one query of each kind and print usage statistics.
    Demo,

    /// Interactively edit timeout, retry and cache settings.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli {
            json,
            timeout,
            max_retries,
            command,
        } = self;
        let config = ClientConfig::load()?;

        match command {
            Command::Configure => configure(config)?,
            Command::Price { currency } => {
                let client = build_client(config, timeout, max_retries);
                let result = client.get_bitcoin_price(&currency).await;
                print_result(json, &result, format_price)?;
            }
            Command::Weather { city } => {
                let client = build_client(config, timeout, max_retries);
                let result = client.get_weather(&city).await;
                print_result(json, &result, format_weather)?;
            }
            Command::Rate { from, to } => {
                let client = build_client(config, timeout, max_retries);
                let result = client.get_exchange_rate(&from, &to).await;
                print_result(json, &result, format_rate)?;
            }
            Command::Ping => {
                let client = build_client(config, timeout, max_retries);
                let online = client.test_connection().await;
                if json {
                    println!("{}", serde_json::json!({ "connected": online }));
                } else if online {
                    println!("Internet connection: OK");
                } else {
                    println!("Internet connection: unavailable");
                }
            }
            Command::Demo => {
                let client = build_client(config, timeout, max_retries);
                demo(&client, json).await?;
            }
        }

        Ok(())
    }
}

/// Applies command-line overrides on top of the stored configuration.
fn build_client(
    mut config: ClientConfig,
    timeout: Option<u64>,
    max_retries: Option<u32>,
) -> ApiClient {
    if let Some(timeout) = timeout {
        config.timeout_secs = timeout;
    }
    if let Some(max_retries) = max_retries {
        config.max_retries = max_retries;
    }
    ApiClient::new(config)
}

async fn demo(client: &ApiClient, json: bool) -> anyhow::Result<()> {
    if !client.test_connection().await {
        println!("No internet connection");
        return Ok(());
    }

    let price = client.get_bitcoin_price("USD").await;
    let weather = client.get_weather("London").await;
    let rate = client.get_exchange_rate("USD", "EUR").await;
    let stats = client.statistics();

    if json {
        let report = serde_json::json!({
            "price": envelope(&price),
            "weather": envelope(&weather),
            "exchange_rate": envelope(&rate),
            "statistics": stats,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", outcome_line(&price, format_price));
    println!("{}", outcome_line(&weather, format_weather));
    println!("{}", outcome_line(&rate, format_rate));
    println!();
    print_statistics(&stats);

    Ok(())
}

fn configure(mut config: ClientConfig) -> anyhow::Result<()> {
    config.timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.timeout_secs)
        .prompt()
        .context("Failed to read timeout")?;

    config.max_retries = CustomType::<u32>::new("Retries per source:")
        .with_default(config.max_retries)
        .prompt()
        .context("Failed to read retry count")?;

    config.uniform_retries = Confirm::new("Retry weather and exchange-rate sources too?")
        .with_default(config.uniform_retries)
        .prompt()
        .context("Failed to read retry mode")?;

    let ttl = CustomType::<u64>::new("Cache lifetime in seconds (0 disables the cache):")
        .with_default(config.cache_ttl_secs.unwrap_or(0))
        .prompt()
        .context("Failed to read cache lifetime")?;
    config.cache_ttl_secs = (ttl > 0).then_some(ttl);

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}

fn print_result<T: Serialize>(
    json: bool,
    result: &Result<T, LookupError>,
    format: fn(&T) -> String,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&envelope(result))?);
    } else {
        println!("{}", outcome_line(result, format));
    }
    Ok(())
}

fn outcome_line<T>(result: &Result<T, LookupError>, format: fn(&T) -> String) -> String {
    match result {
        Ok(value) => format(value),
        Err(err) => {
            let tried: Vec<String> = err
                .failures()
                .iter()
                .map(|f| format!("{} ({})", f.provider, f.last_error))
                .collect();
            format!("Error: {err}; tried: {}", tried.join(", "))
        }
    }
}

fn format_price(quote: &PriceQuote) -> String {
    format!(
        "Bitcoin: {:.2} {} (source: {}, {:.2}s, at {})",
        quote.price,
        quote.currency,
        quote.source,
        quote.response_time.as_secs_f64(),
        quote
            .fetched_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S"),
    )
}

fn format_weather(report: &WeatherReport) -> String {
    format!(
        "{}: {}°C, {} (source: {})",
        report.city, report.temperature, report.description, report.source
    )
}

fn format_rate(rate: &ExchangeRate) -> String {
    format!(
        "{}/{}: {:.4} (source: {})",
        rate.from_currency, rate.to_currency, rate.rate, rate.source
    )
}

fn print_statistics(stats: &Statistics) {
    println!("Statistics:");
    println!("  Total requests: {}", stats.total_requests);
    println!("  Successful:     {}", stats.successful_requests);
    println!("  Failed:         {}", stats.failed_requests);
    println!("  HTTP attempts:  {}", stats.http_attempts);
    println!("  Success rate:   {:.1}%", stats.success_rate);
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiclient_core::{AttemptError, ProviderId, SourceFailure};
    use clap::CommandFactory;
    use std::time::Duration;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rate_defaults_to_usd_eur() {
        let cli = Cli::try_parse_from(["apiclient", "rate"]).expect("args should parse");
        match cli.command {
            Command::Rate { from, to } => {
                assert_eq!(from, "USD");
                assert_eq!(to, "EUR");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_overrides_parse_after_subcommand() {
        let cli = Cli::try_parse_from(["apiclient", "price", "eur", "--json", "--max-retries", "1"])
            .expect("args should parse");

        assert!(cli.json);
        assert_eq!(cli.max_retries, Some(1));
        assert!(matches!(cli.command, Command::Price { ref currency } if currency == "eur"));
    }

    #[test]
    fn failure_line_lists_tried_sources() {
        let result: Result<ExchangeRate, LookupError> = Err(LookupError::ExchangeRate {
            from_currency: "USD".into(),
            to_currency: "EUR".into(),
            failures: vec![
                SourceFailure {
                    provider: ProviderId::ExchangeRateApi,
                    attempts: 1,
                    last_error: AttemptError::Timeout,
                },
                SourceFailure {
                    provider: ProviderId::Frankfurter,
                    attempts: 1,
                    last_error: AttemptError::Status(502),
                },
            ],
        });

        assert_eq!(
            outcome_line(&result, format_rate),
            "Error: failed to get exchange rate USD -> EUR; \
             tried: ExchangeRate-API (timeout), Frankfurter (HTTP 502)"
        );
    }

    #[test]
    fn rate_line_uses_four_decimals() {
        let rate = ExchangeRate {
            from_currency: "USD".into(),
            to_currency: "EUR".into(),
            rate: 0.923456,
            source: ProviderId::Frankfurter,
            response_time: Duration::from_millis(120),
            fetched_at: chrono::Utc::now(),
        };

        assert_eq!(format_rate(&rate), "USD/EUR: 0.9235 (source: Frankfurter)");
    }
}

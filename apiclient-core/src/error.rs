use thiserror::Error;

use crate::provider::ProviderId;

/// Why a single attempt against a source did not produce a usable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptError {
    #[error("timeout")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),

    /// HTTP 200, but the body was missing, not a JSON object, or empty.
    #[error("empty or undecodable response body")]
    EmptyBody,

    /// The body decoded but the extracted value failed the validity check.
    #[error("response did not contain a valid value")]
    InvalidValue,
}

/// Final state of one source after all of its attempts were spent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFailure {
    pub provider: ProviderId,
    pub attempts: u32,
    pub last_error: AttemptError,
}

/// Returned when every source of a query was exhausted.
///
/// Carries the echoed input parameters and the per-source failures, so the
/// caller can tell which providers were tried and how each one failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("failed to get bitcoin price in {currency}")]
    Price {
        currency: String,
        failures: Vec<SourceFailure>,
    },

    #[error("failed to get weather for {city}")]
    Weather {
        city: String,
        failures: Vec<SourceFailure>,
    },

    #[error("failed to get exchange rate {from_currency} -> {to_currency}")]
    ExchangeRate {
        from_currency: String,
        to_currency: String,
        failures: Vec<SourceFailure>,
    },
}

impl LookupError {
    pub fn failures(&self) -> &[SourceFailure] {
        match self {
            LookupError::Price { failures, .. }
            | LookupError::Weather { failures, .. }
            | LookupError::ExchangeRate { failures, .. } => failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_error_messages() {
        assert_eq!(AttemptError::Timeout.to_string(), "timeout");
        assert_eq!(AttemptError::Status(503).to_string(), "HTTP 503");
        let refused = AttemptError::Transport("connection refused".into());
        assert_eq!(refused.to_string(), "connection refused");
    }

    #[test]
    fn lookup_error_echoes_inputs() {
        let err = LookupError::ExchangeRate {
            from_currency: "USD".into(),
            to_currency: "EUR".into(),
            failures: vec![SourceFailure {
                provider: ProviderId::Frankfurter,
                attempts: 1,
                last_error: AttemptError::Status(500),
            }],
        };

        assert_eq!(err.to_string(), "failed to get exchange rate USD -> EUR");
        assert_eq!(err.failures().len(), 1);
        assert_eq!(err.failures()[0].provider, ProviderId::Frankfurter);
    }
}

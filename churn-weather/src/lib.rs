//! Next-day weather line for the daily status post.
//!
//! The forecast comes from the public tsukumijima API (`/api/forecast/city/{code}`) and
//! is reduced to a single human-readable line. The tracker treats that line as opaque
//! text: it caches it in the snapshot and shows it in the following day's status.
pub mod city;
pub mod client;
pub mod forecast;

use async_trait::async_trait;
use churn_common::{ChurnError, Result};

pub use city::JapaneseCity;
pub use client::TsukumijimaApi;

/// Cached text after a failed fetch.
pub const WEATHER_ERROR_TEXT: &str = "[天気エラー]";
/// Cached text before any fetch has happened.
pub const WEATHER_MISSING_TEXT: &str = "[天気がありません]";

#[async_trait]
pub trait WeatherService: Send + Sync {
    async fn fetch_tomorrow_forecast(&self, city: JapaneseCity) -> Result<String>;
}

/// Result of a forecast refresh. A failure is not an error for the cycle; it degrades
/// to [`WEATHER_ERROR_TEXT`] and keeps the reason for logging.
#[derive(Debug)]
pub enum WeatherOutcome {
    Fresh(String),
    Degraded { text: String, reason: ChurnError },
}

impl WeatherOutcome {
    pub fn from_result(result: Result<String>) -> Self {
        match result {
            Ok(text) => WeatherOutcome::Fresh(text),
            Err(reason) => WeatherOutcome::Degraded {
                text: WEATHER_ERROR_TEXT.to_string(),
                reason,
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, WeatherOutcome::Degraded { .. })
    }

    pub fn text(&self) -> &str {
        match self {
            WeatherOutcome::Fresh(text) | WeatherOutcome::Degraded { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            WeatherOutcome::Fresh(text) | WeatherOutcome::Degraded { text, .. } => text,
        }
    }
}

/// Fetch tomorrow's line, turning any failure into the degraded branch.
pub async fn tomorrow_or_placeholder<W>(service: &W, city: JapaneseCity) -> WeatherOutcome
where
    W: WeatherService + ?Sized,
{
    let outcome = WeatherOutcome::from_result(service.fetch_tomorrow_forecast(city).await);
    if let WeatherOutcome::Degraded { reason, .. } = &outcome {
        tracing::warn!(city=%city, error=%reason, "weather.fetch_degraded");
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl WeatherService for Broken {
        async fn fetch_tomorrow_forecast(&self, _city: JapaneseCity) -> Result<String> {
            Err(ChurnError::Network("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn failures_degrade_to_the_error_placeholder() {
        let outcome = tomorrow_or_placeholder(&Broken, JapaneseCity::Tokyo).await;
        assert!(outcome.is_degraded());
        assert_eq!(outcome.text(), WEATHER_ERROR_TEXT);
    }

    #[test]
    fn fresh_text_passes_through() {
        let outcome = WeatherOutcome::from_result(Ok("晴れ".into()));
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.into_text(), "晴れ");
    }
}

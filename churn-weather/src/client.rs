use crate::city::JapaneseCity;
use crate::forecast::ForecastResponse;
use crate::WeatherService;
use async_trait::async_trait;
use churn_common::{ChurnError, Result};
use churn_http::{Auth, HttpClient, RequestOpts};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://weather.tsukumijima.net";

/// Client for the public livedoor-compatible forecast API.
#[derive(Clone)]
pub struct TsukumijimaApi {
    http: HttpClient,
}

impl TsukumijimaApi {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let http = HttpClient::new(base_url)
            .map_err(|e| ChurnError::Config(format!("weather base url: {e}")))?
            .with_timeout(Duration::from_secs(10));
        Ok(Self { http })
    }

    pub async fn forecast(&self, city: JapaneseCity) -> Result<ForecastResponse> {
        let path = format!("api/forecast/city/{}", city.code());
        self.http
            .get_json(
                &path,
                RequestOpts {
                    auth: Some(Auth::None),
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| ChurnError::Network(format!("{path}: {e}")))
    }
}

#[async_trait]
impl WeatherService for TsukumijimaApi {
    async fn fetch_tomorrow_forecast(&self, city: JapaneseCity) -> Result<String> {
        let resp = self.forecast(city).await?;
        let Some(tomorrow) = resp.tomorrow() else {
            return Err(ChurnError::Network(format!(
                "forecast for {city} has no tomorrow entry"
            )));
        };
        let line = tomorrow.summary_line();
        tracing::debug!(city=%city, date=%tomorrow.date, "weather.tomorrow_fetched");
        Ok(line)
    }
}

use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const TOMORROW_LABEL: &str = "明日";

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub forecasts: Vec<DailyForecast>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecast {
    pub date: String,
    pub date_label: String,
    #[serde(default)]
    pub telop: Option<String>,
    #[serde(default)]
    pub detail: Option<Detail>,
    #[serde(default)]
    pub temperature: Option<Temperature>,
    /// Period (`T00_06`, ...) to a percentage string such as `"10%"` or `"--%"`.
    #[serde(default)]
    pub chance_of_rain: BTreeMap<String, Option<String>>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Detail {
    #[serde(default)]
    pub weather: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Temperature {
    #[serde(default)]
    pub min: Option<Reading>,
    #[serde(default)]
    pub max: Option<Reading>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Reading {
    #[serde(default)]
    pub celsius: Option<String>,
}

fn leading_percent() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d+)").expect("static regex"))
}

impl DailyForecast {
    /// Highest chance of rain over all periods; unknown periods (`--%`) are skipped.
    pub fn max_chance_of_rain(&self) -> u32 {
        self.chance_of_rain
            .values()
            .flatten()
            .filter_map(|raw| leading_percent().captures(raw))
            .filter_map(|caps| caps[1].parse::<u32>().ok())
            .max()
            .unwrap_or(0)
    }

    fn celsius(reading: Option<&Reading>) -> &str {
        reading
            .and_then(|r| r.celsius.as_deref())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("--")
    }

    /// One-line summary: `{date}の天気：{weather}，{high} °C / {low} °C，{rain} %`.
    pub fn summary_line(&self) -> String {
        let weather = self
            .detail
            .as_ref()
            .and_then(|d| d.weather.as_deref())
            .or(self.telop.as_deref())
            .unwrap_or("--")
            .replace('\u{3000}', " ");
        let temperature = self.temperature.clone().unwrap_or_default();
        format!(
            "{}の天気：{}，{} °C / {} °C，{} %",
            self.date,
            weather,
            Self::celsius(temperature.max.as_ref()),
            Self::celsius(temperature.min.as_ref()),
            self.max_chance_of_rain()
        )
    }
}

impl ForecastResponse {
    pub fn tomorrow(&self) -> Option<&DailyForecast> {
        self.forecasts.iter().find(|f| f.date_label == TOMORROW_LABEL)
    }
}

use std::fmt;
use std::str::FromStr;

/// Cities the forecast source publishes primary-area forecasts for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JapaneseCity {
    #[default]
    Sapporo,
    Sendai,
    Tokyo,
    Nagoya,
    Osaka,
    Hiroshima,
    Fukuoka,
}

impl JapaneseCity {
    pub const ALL: [JapaneseCity; 7] = [
        JapaneseCity::Sapporo,
        JapaneseCity::Sendai,
        JapaneseCity::Tokyo,
        JapaneseCity::Nagoya,
        JapaneseCity::Osaka,
        JapaneseCity::Hiroshima,
        JapaneseCity::Fukuoka,
    ];

    /// Area code used in `/api/forecast/city/{code}`.
    pub fn code(self) -> &'static str {
        match self {
            JapaneseCity::Sapporo => "016010",
            JapaneseCity::Sendai => "040010",
            JapaneseCity::Tokyo => "130010",
            JapaneseCity::Nagoya => "230010",
            JapaneseCity::Osaka => "270000",
            JapaneseCity::Hiroshima => "340010",
            JapaneseCity::Fukuoka => "400010",
        }
    }

    pub fn kanji(self) -> &'static str {
        match self {
            JapaneseCity::Sapporo => "札幌",
            JapaneseCity::Sendai => "仙台",
            JapaneseCity::Tokyo => "東京",
            JapaneseCity::Nagoya => "名古屋",
            JapaneseCity::Osaka => "大阪",
            JapaneseCity::Hiroshima => "広島",
            JapaneseCity::Fukuoka => "福岡",
        }
    }

    fn romaji(self) -> &'static str {
        match self {
            JapaneseCity::Sapporo => "sapporo",
            JapaneseCity::Sendai => "sendai",
            JapaneseCity::Tokyo => "tokyo",
            JapaneseCity::Nagoya => "nagoya",
            JapaneseCity::Osaka => "osaka",
            JapaneseCity::Hiroshima => "hiroshima",
            JapaneseCity::Fukuoka => "fukuoka",
        }
    }

    /// Lenient selector: unknown names fall back to Sapporo.
    pub fn from_selector(selector: &str) -> Self {
        selector.parse().unwrap_or_else(|_| {
            tracing::warn!(selector, "weather.city.unknown_selector_fallback");
            JapaneseCity::default()
        })
    }
}

impl FromStr for JapaneseCity {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        JapaneseCity::ALL
            .into_iter()
            .find(|c| c.kanji() == wanted || c.romaji().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown city `{wanted}`"))
    }
}

impl fmt::Display for JapaneseCity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kanji())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_romaji_and_kanji() {
        assert_eq!("Tokyo".parse::<JapaneseCity>(), Ok(JapaneseCity::Tokyo));
        assert_eq!("名古屋".parse::<JapaneseCity>(), Ok(JapaneseCity::Nagoya));
        assert_eq!(JapaneseCity::Osaka.code(), "270000");
    }

    #[test]
    fn unknown_selector_falls_back_to_sapporo() {
        let city = JapaneseCity::from_selector("那覇");
        assert_eq!(city, JapaneseCity::Sapporo);
        assert_eq!(city.code(), "016010");
    }
}

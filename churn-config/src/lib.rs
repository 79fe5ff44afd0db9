//! Loader for bot configuration with YAML + environment overlays.
//!
//! Sources are merged in this order, later ones winning:
//!
//! 1. built-in defaults (every section is optional),
//! 2. an optional or required YAML/TOML/JSON file (`churn.yaml` by convention),
//! 3. inline YAML snippets (tests, CLI overrides),
//! 4. `CHURN__SECTION__KEY` environment variables.
//!
//! After merging, every string value goes through `${VAR}` expansion so credentials can
//! live in the environment while the file stays committable.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChurnConfig {
    pub version: Option<String>,
    pub twitter: TwitterConfig,
    pub state: StateConfig,
    pub weather: WeatherConfig,
    pub cycle: CycleConfig,
    pub logging: LoggingConfig,
}

/// OAuth 1.0a user-context credentials plus posting defaults.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct TwitterConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
    pub base_url: String,
    /// Appended as the last line of every post.
    pub hashtag: String,
}

impl Default for TwitterConfig {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            access_token_secret: String::new(),
            base_url: "https://api.twitter.com".into(),
            hashtag: "#真空bot".into(),
        }
    }
}

impl std::fmt::Debug for TwitterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shown = |v: &str| if v.is_empty() { "<unset>" } else { "<redacted>" };
        f.debug_struct("TwitterConfig")
            .field("consumer_key", &shown(&self.consumer_key))
            .field("consumer_secret", &shown(&self.consumer_secret))
            .field("access_token", &shown(&self.access_token))
            .field("access_token_secret", &shown(&self.access_token_secret))
            .field("base_url", &self.base_url)
            .field("hashtag", &self.hashtag)
            .finish()
    }
}

impl TwitterConfig {
    /// Fail fast when a credential is missing or still holds an unexpanded `${VAR}`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("twitter.consumer_key", &self.consumer_key),
            ("twitter.consumer_secret", &self.consumer_secret),
            ("twitter.access_token", &self.access_token),
            ("twitter.access_token_secret", &self.access_token_secret),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(ConfigError::Message(format!("{name} is not set")));
            }
            if value.contains("${") {
                return Err(ConfigError::Message(format!(
                    "{name} references an unset environment variable: {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("state.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// City selector, either romanised (`tokyo`) or as written in Japanese (`東京`).
    pub city: String,
    pub base_url: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            city: "sapporo".into(),
            base_url: "https://weather.tsukumijima.net".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Pause before every follower-id page request.
    #[serde(deserialize_with = "native_or_text")]
    pub page_delay_ms: u64,
    /// Pause before every churn post.
    #[serde(deserialize_with = "native_or_text")]
    pub post_delay_ms: u64,
    #[serde(deserialize_with = "native_or_text")]
    pub lookup_batch_size: usize,
    /// Also announce new followers (only unfollows are posted by default).
    #[serde(deserialize_with = "native_or_text")]
    pub post_followed: bool,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            page_delay_ms: 1000,
            post_delay_ms: 1000,
            lookup_batch_size: 100,
            post_followed: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `text` or `json`.
    pub format: String,
    #[serde(deserialize_with = "native_or_text")]
    pub stderr: bool,
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".into(),
            stderr: true,
            filter: "info".into(),
            dir: None,
        }
    }
}

/// Environment overrides always arrive as strings; files carry native scalars.
fn native_or_text<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw<T> {
        Native(T),
        Text(String),
    }

    match Raw::<T>::deserialize(deserializer)? {
        Raw::Native(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (files + env overrides).
pub struct ChurnConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ChurnConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ChurnConfigLoader {
    /// Start with defaults only; sources are layered by the `with_*` calls.
    ///
    /// ```
    /// use churn_config::ChurnConfigLoader;
    ///
    /// let config = ChurnConfigLoader::new()
    ///     .with_yaml_str("version: '1'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.cycle.lookup_batch_size, 100);
    /// assert_eq!(config.state.path.to_str(), Some("state.json"));
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, for headless deployments driven by env only.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use churn_config::ChurnConfigLoader;
    ///
    /// let cfg = ChurnConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// weather:
    ///   city: "tokyo"
    /// cycle:
    ///   post_followed: true
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.weather.city, "tokyo");
    /// assert!(cfg.cycle.post_followed);
    /// assert_eq!(cfg.cycle.page_delay_ms, 1000);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// `CHURN__`-prefixed environment variables are layered last and kept as text, so an
    /// all-digit secret stays a string; numeric and boolean fields parse it themselves.
    /// `${VAR}` placeholders are expanded before materialising the typed structs.
    ///
    /// ```
    /// use churn_config::ChurnConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOC_TWITTER_KEY", "injected-from-env"); }
    ///
    /// let config = ChurnConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// twitter:
    ///   consumer_key: "${DOC_TWITTER_KEY}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.twitter.consumer_key, "injected-from-env");
    /// assert_eq!(config.twitter.base_url, "https://api.twitter.com");
    ///
    /// unsafe { std::env::remove_var("DOC_TWITTER_KEY"); }
    /// ```
    pub fn load(self) -> Result<ChurnConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix("CHURN").separator("__"),
            )
            .build()?;

        // Convert to serde_json::Value first
        let mut v: Value = cfg.try_deserialize()?;
        // Recursively expand environment variables
        expand_env_in_value(&mut v);

        let typed: ChurnConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        if typed.cycle.lookup_batch_size == 0 {
            return Err(ConfigError::Message(
                "cycle.lookup_batch_size must be at least 1".into(),
            ));
        }

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Sendai")), ("PREF", Some("Miyagi"))], || {
            let mut v = json!([
                "hello-$CITY",
                { "loc": "${CITY}-${PREF}" },
                42,
                true,
                null
            ]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Sendai", { "loc": "Sendai-Miyagi" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles_and_leaves_value_reasonable() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn twitter_validation_flags_missing_and_unexpanded_credentials() {
        let mut tw = TwitterConfig::default();
        let err = tw.validate().unwrap_err().to_string();
        assert!(err.contains("twitter.consumer_key"));

        tw.consumer_key = "ck".into();
        tw.consumer_secret = "cs".into();
        tw.access_token = "${TWITTER_ACCESS_TOKEN}".into();
        tw.access_token_secret = "ats".into();
        let err = tw.validate().unwrap_err().to_string();
        assert!(err.contains("unset environment variable"));

        tw.access_token = "at".into();
        assert!(tw.validate().is_ok());
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let tw = TwitterConfig {
            consumer_secret: "super-secret".into(),
            ..TwitterConfig::default()
        };
        let shown = format!("{tw:?}");
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("<unset>"));
    }
}

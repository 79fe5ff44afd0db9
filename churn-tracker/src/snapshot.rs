//! Durable per-account snapshot.
//!
//! Field order is the serialized key order, so keep it stable. Aliases accept state files
//! written by the earlier JavaScript-era bot (`cronCount`, `userData`, `tomorrowWhether`
//! and the raw `verify_credentials` counter names).
use churn_social::{services::de_truncated_count, VerifiedAccount};
use churn_weather::WEATHER_MISSING_TEXT;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCounts {
    #[serde(alias = "followers_count", deserialize_with = "de_truncated_count", default)]
    pub followers_count: u64,
    #[serde(alias = "friends_count", deserialize_with = "de_truncated_count", default)]
    pub following_count: u64,
    #[serde(alias = "listed_count", deserialize_with = "de_truncated_count", default)]
    pub listed_count: u64,
    #[serde(alias = "favourites_count", deserialize_with = "de_truncated_count", default)]
    pub favourites_count: u64,
    #[serde(alias = "statuses_count", deserialize_with = "de_truncated_count", default)]
    pub posts_count: u64,
}

impl From<&VerifiedAccount> for ProfileCounts {
    fn from(account: &VerifiedAccount) -> Self {
        Self {
            followers_count: account.followers_count,
            following_count: account.following_count,
            listed_count: account.listed_count,
            favourites_count: account.favourites_count,
            posts_count: account.posts_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Number of cycles that reached the platform successfully.
    #[serde(alias = "cronCount", default)]
    pub success_count: u64,
    #[serde(default)]
    pub follower_ids: Vec<String>,
    #[serde(alias = "userData", default)]
    pub account_profile: Option<ProfileCounts>,
    #[serde(alias = "tomorrowWhether", default = "default_weather_text")]
    pub cached_weather_text: String,
}

fn default_weather_text() -> String {
    WEATHER_MISSING_TEXT.to_string()
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            success_count: 0,
            follower_ids: Vec::new(),
            account_profile: None,
            cached_weather_text: default_weather_text(),
        }
    }
}

impl Snapshot {
    /// Cold start: nothing to diff against yet.
    pub fn is_cold(&self) -> bool {
        self.follower_ids.is_empty()
    }
}

use crate::services::de_truncated_count;
use serde::{Deserialize, Serialize};

/// `GET 1.1/account/verify_credentials.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub id_str: String,
    #[serde(default)]
    pub screen_name: Option<String>,
    #[serde(default, deserialize_with = "de_truncated_count")]
    pub followers_count: u64,
    #[serde(default, deserialize_with = "de_truncated_count")]
    pub friends_count: u64,
    #[serde(default, deserialize_with = "de_truncated_count")]
    pub listed_count: u64,
    #[serde(default, deserialize_with = "de_truncated_count")]
    pub favourites_count: u64,
    #[serde(default, deserialize_with = "de_truncated_count")]
    pub statuses_count: u64,
}

/// `GET 1.1/followers/ids.json` with `stringify_ids=true`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IdsPage {
    #[serde(default)]
    pub ids: Vec<String>,
    #[serde(default)]
    pub next_cursor: Option<i64>,
    #[serde(default)]
    pub next_cursor_str: Option<String>,
}

impl IdsPage {
    /// Cursor for the following page, or `None` once the listing is exhausted.
    ///
    /// Twitter signals the last page with a zero cursor; a page carrying no cursor at
    /// all is treated the same way.
    pub fn next_cursor(&self) -> Option<String> {
        let from_str = self
            .next_cursor_str
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        match (from_str, self.next_cursor) {
            (Some("0"), _) | (_, Some(0)) | (None, None) => None,
            (Some(s), _) => Some(s.to_string()),
            (None, Some(n)) => Some(n.to_string()),
        }
    }
}

/// Element of `GET 1.1/users/lookup.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupUser {
    pub id_str: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub protected: bool,
}

/// `POST 1.1/statuses/update.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub id_str: String,
}

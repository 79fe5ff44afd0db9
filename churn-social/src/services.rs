use async_trait::async_trait;
use churn_common::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// Identity and public counters of the authenticated account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedAccount {
    pub id: String,
    pub screen_name: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub listed_count: u64,
    pub favourites_count: u64,
    pub posts_count: u64,
}

/// Position in a paginated follower listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cursor {
    /// The first page; platforms encode this as a sentinel (`-1` on Twitter).
    Initial,
    /// Opaque token returned by the previous page.
    Next(String),
}

/// One page of follower ids. `next == None` means there are no more pages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdPage {
    pub ids: Vec<String>,
    pub next: Option<String>,
}

/// Profile details for an id that the platform could resolve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUser {
    pub id: String,
    pub display_name: String,
    pub screen_name: String,
    #[serde(default)]
    pub protected: bool,
}

#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Fetch the authenticated account's identity and counters.
    async fn verify_credentials(&self) -> Result<VerifiedAccount>;
}

#[async_trait]
pub trait FollowerListService: Send + Sync {
    async fn list_follower_ids(&self, owner_id: &str, cursor: &Cursor) -> Result<IdPage>;
}

#[async_trait]
pub trait UserLookupService: Send + Sync {
    /// Largest number of ids a single lookup call accepts.
    fn max_batch_size(&self) -> usize {
        100
    }

    /// Resolve up to [`Self::max_batch_size`] ids. Unknown ids are simply absent.
    async fn lookup_users(&self, ids: &[String]) -> Result<Vec<ResolvedUser>>;
}

#[async_trait]
pub trait TimelineProbe: Send + Sync {
    /// Succeeds when the user's timeline is readable by us.
    async fn probe_timeline(&self, user_id: &str) -> Result<()>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, text: &str) -> Result<()>;
}

/// Accept any JSON number for a counter and truncate it toward zero.
///
/// Negative values clamp to zero; counters are never negative on the platform.
pub fn de_truncated_count<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = serde_json::Number::deserialize(deserializer)?;
    if let Some(n) = number.as_u64() {
        return Ok(n);
    }
    if number.as_i64().is_some() {
        return Ok(0);
    }
    let f = number.as_f64().unwrap_or_default();
    Ok(if f.is_finite() && f > 0.0 { f.trunc() as u64 } else { 0 })
}

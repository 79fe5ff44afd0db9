use crate::snapshot::ProfileCounts;
use churn_common::Result;
use churn_social::{ProfileService, VerifiedAccount};
use std::fmt;

/// Change in one counter since the previous snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delta {
    /// No previous value to compare with.
    Unknown,
    Change(i64),
}

impl Delta {
    pub fn between(previous: Option<u64>, current: u64) -> Self {
        match previous {
            None => Delta::Unknown,
            Some(prev) => {
                let diff = i128::from(current) - i128::from(prev);
                Delta::Change(diff.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64)
            }
        }
    }
}

/// `±0`, `+N`, `-N`, or `-` when unknown.
impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Delta::Unknown => f.write_str("-"),
            Delta::Change(0) => f.write_str("±0"),
            Delta::Change(n) if n > 0 => write!(f, "+{n}"),
            Delta::Change(n) => write!(f, "-{}", n.unsigned_abs()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileDeltas {
    pub followers: Delta,
    pub following: Delta,
    pub listed: Delta,
    pub favourites: Delta,
    pub posts: Delta,
}

impl ProfileDeltas {
    pub fn between(previous: Option<&ProfileCounts>, current: &ProfileCounts) -> Self {
        Self {
            followers: Delta::between(previous.map(|p| p.followers_count), current.followers_count),
            following: Delta::between(previous.map(|p| p.following_count), current.following_count),
            listed: Delta::between(previous.map(|p| p.listed_count), current.listed_count),
            favourites: Delta::between(previous.map(|p| p.favourites_count), current.favourites_count),
            posts: Delta::between(previous.map(|p| p.posts_count), current.posts_count),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CapturedProfile {
    pub account: VerifiedAccount,
    pub counts: ProfileCounts,
    pub deltas: ProfileDeltas,
}

/// Fetch the account's counters and compare them with the previous snapshot's.
pub async fn capture_profile<S>(
    service: &S,
    previous: Option<&ProfileCounts>,
) -> Result<CapturedProfile>
where
    S: ProfileService + ?Sized,
{
    let account = service.verify_credentials().await?;
    let counts = ProfileCounts::from(&account);
    let deltas = ProfileDeltas::between(previous, &counts);
    tracing::info!(
        account_id=%account.id,
        followers=counts.followers_count,
        followers_delta=%deltas.followers,
        "tracker.profile_captured"
    );
    Ok(CapturedProfile {
        account,
        counts,
        deltas,
    })
}

//! Cursor-driven follower listing with a fixed delay before every request.
use async_trait::async_trait;
use churn_common::{ChurnError, Result};
use churn_social::{Cursor, FollowerListService};
use std::collections::HashSet;
use std::time::Duration;

/// Waits between paced calls. Injected so tests can count pauses instead of sleeping.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }
}

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

pub struct RateLimitedPager<'a, S: ?Sized> {
    service: &'a S,
    pacer: &'a dyn Pacer,
}

impl<'a, S> RateLimitedPager<'a, S>
where
    S: FollowerListService + ?Sized,
{
    pub fn new(service: &'a S, pacer: &'a dyn Pacer) -> Self {
        Self { service, pacer }
    }

    /// Walk every page for `owner_id`, pausing before each call (the first included).
    ///
    /// Any failed page aborts the walk; no partial list is returned. A cursor that comes
    /// back a second time within one walk is a network error.
    pub async fn fetch_all_ids(&self, owner_id: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor = Cursor::Initial;
        let mut visited = HashSet::new();
        let mut pages = 0usize;
        loop {
            self.pacer.pause().await;
            let page = self.service.list_follower_ids(owner_id, &cursor).await?;
            pages += 1;
            tracing::debug!(page = pages, got = page.ids.len(), next = ?page.next, "pager.page");
            ids.extend(page.ids);
            match page.next {
                None => break,
                Some(next) => {
                    if !visited.insert(next.clone()) {
                        return Err(ChurnError::Network(format!(
                            "follower listing returned the same cursor `{next}` twice"
                        )));
                    }
                    cursor = Cursor::Next(next);
                }
            }
        }
        tracing::info!(owner_id, pages, total = ids.len(), "pager.complete");
        Ok(ids)
    }
}

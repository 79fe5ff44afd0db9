use crate::compose;
use crate::orchestrator::CycleReport;
use crate::pager::Pacer;
use churn_common::Result;
use churn_social::{Notifier, TimelineProbe};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishSummary {
    pub posts: usize,
    pub blocked: usize,
}

/// Posts a report: the status first, then one post per lost follower and, when
/// enabled, one per new follower. Each churn post waits on the pacer first.
///
/// A failed post aborts publishing; the caller must not save the cycle afterwards.
pub struct Publisher<'a, N: ?Sized, P: ?Sized> {
    notifier: &'a N,
    probe: &'a P,
    pacer: &'a dyn Pacer,
    hashtag: &'a str,
    post_followed: bool,
}

impl<'a, N, P> Publisher<'a, N, P>
where
    N: Notifier + ?Sized,
    P: TimelineProbe + ?Sized,
{
    pub fn new(notifier: &'a N, probe: &'a P, pacer: &'a dyn Pacer) -> Self {
        Self {
            notifier,
            probe,
            pacer,
            hashtag: compose::DEFAULT_HASHTAG,
            post_followed: false,
        }
    }

    pub fn with_hashtag(mut self, hashtag: &'a str) -> Self {
        self.hashtag = hashtag;
        self
    }

    pub fn with_followed_posts(mut self, enabled: bool) -> Self {
        self.post_followed = enabled;
        self
    }

    async fn send(&self, report: &CycleReport, body: &str) -> Result<()> {
        let text = compose::signed(report.screen_name.as_deref(), body, self.hashtag);
        self.notifier.post(&text).await
    }

    pub async fn publish(&self, report: &CycleReport) -> Result<PublishSummary> {
        let mut summary = PublishSummary::default();

        self.send(report, &compose::status_body(report)).await?;
        summary.posts += 1;

        for id in &report.removed_ids {
            self.pacer.pause().await;
            let user = report.resolved_users.get(id);
            let blocked = match user {
                Some(u) if !u.protected => match self.probe.probe_timeline(id).await {
                    Ok(()) => false,
                    Err(err) => {
                        tracing::debug!(user_id=%id, error=%err, "publish.timeline_unreadable");
                        true
                    }
                },
                _ => false,
            };
            summary.blocked += usize::from(blocked);
            self.send(report, &compose::unfollowed_body(id, user, blocked))
                .await?;
            summary.posts += 1;
        }

        if self.post_followed {
            for id in &report.added_ids {
                self.pacer.pause().await;
                let user = report.resolved_users.get(id);
                self.send(report, &compose::followed_body(id, user)).await?;
                summary.posts += 1;
            }
        }

        tracing::info!(posts = summary.posts, blocked = summary.blocked, "publish.complete");
        Ok(summary)
    }
}

use crate::differ::dedup_preserving_order;
use churn_common::ChurnError;
use churn_social::{ResolvedUser, UserLookupService};
use std::collections::BTreeMap;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Resolves changed ids to profiles in sequential bulk-lookup batches.
///
/// A failed batch is logged as a [`ChurnError::LookupBatch`] and its ids stay unresolved;
/// it never fails the resolution as a whole.
pub struct BatchResolver<'a, S: ?Sized> {
    service: &'a S,
    batch_size: usize,
}

impl<'a, S> BatchResolver<'a, S>
where
    S: UserLookupService + ?Sized,
{
    pub fn new(service: &'a S) -> Self {
        Self::with_batch_size(service, DEFAULT_BATCH_SIZE)
    }

    /// Batch size is clamped to `1..=service.max_batch_size()`.
    pub fn with_batch_size(service: &'a S, batch_size: usize) -> Self {
        let max = service.max_batch_size().max(1);
        Self {
            service,
            batch_size: batch_size.clamp(1, max),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub async fn resolve_users(&self, ids: &[String]) -> BTreeMap<String, ResolvedUser> {
        let wanted = dedup_preserving_order(ids);
        let mut resolved = BTreeMap::new();
        for (index, batch) in wanted.chunks(self.batch_size).enumerate() {
            match self.service.lookup_users(batch).await {
                Ok(users) => {
                    tracing::debug!(batch = index, asked = batch.len(), got = users.len(), "resolver.batch");
                    for user in users {
                        // Only keep what we asked for.
                        if batch.contains(&user.id) {
                            resolved.insert(user.id.clone(), user);
                        }
                    }
                }
                Err(err) => {
                    let err = ChurnError::LookupBatch(format!(
                        "batch {index} ({} ids): {err}",
                        batch.len()
                    ));
                    tracing::warn!(error=%err, "resolver.batch_failed");
                }
            }
        }
        tracing::info!(
            requested = wanted.len(),
            resolved = resolved.len(),
            "resolver.complete"
        );
        resolved
    }
}

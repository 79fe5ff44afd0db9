//! Follower-set reconciliation and diff tracking.
//!
//! One daily cycle: capture the account's counters, page through the full follower
//! list, diff it against the persisted snapshot, resolve the changed ids, report, and
//! finally persist the new snapshot. See [`orchestrator`] for the stage machine.
//!
//! ```no_run
//! # async fn demo<A, W>(orch: churn_tracker::CronOrchestrator<A, W>) -> churn_common::Result<()>
//! # where A: churn_tracker::SocialApi, W: churn_weather::WeatherService {
//! let mut cycle = orch.begin();
//! orch.update(&mut cycle).await?;
//! let report = orch.report(&mut cycle)?;
//! println!("{}", churn_tracker::compose::status_body(&report));
//! orch.refresh_weather(&mut cycle).await?;
//! orch.save(&mut cycle)?;
//! # Ok(())
//! # }
//! ```
pub mod compose;
pub mod differ;
pub mod orchestrator;
pub mod pager;
pub mod publish;
pub mod resolver;
pub mod snapshot;
pub mod store;
pub mod tracker;

pub use differ::{diff, ChangeSet};
pub use orchestrator::{CronOrchestrator, Cycle, CycleReport, CycleSettings, CycleStage, SocialApi};
pub use pager::{FixedDelay, Pacer, RateLimitedPager};
pub use publish::{PublishSummary, Publisher};
pub use resolver::BatchResolver;
pub use snapshot::{ProfileCounts, Snapshot};
pub use store::StateStore;
pub use tracker::{Delta, ProfileDeltas};

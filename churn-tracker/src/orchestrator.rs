//! The daily update cycle as an explicit state machine.
//!
//! A [`Cycle`] value carries everything one invocation learns; the orchestrator only
//! holds injected collaborators. Stages advance strictly in order:
//!
//! `Idle → ProfileCaptured → FollowersFetched → Diffed → UsersResolved → Reported → Saved`
//!
//! Nothing is persisted before [`CronOrchestrator::save`], which runs once per cycle.
use crate::differ::{self, dedup_preserving_order, ChangeSet};
use crate::pager::{Pacer, RateLimitedPager};
use crate::resolver::{BatchResolver, DEFAULT_BATCH_SIZE};
use crate::snapshot::{ProfileCounts, Snapshot};
use crate::store::StateStore;
use crate::tracker::{self, CapturedProfile, ProfileDeltas};
use churn_common::{ChurnError, Result};
use churn_social::{FollowerListService, ProfileService, ResolvedUser, UserLookupService};
use churn_weather::{JapaneseCity, WeatherOutcome, WeatherService};
use std::collections::BTreeMap;

/// Platform operations the cycle needs, as one bound.
pub trait SocialApi: ProfileService + FollowerListService + UserLookupService {}

impl<T> SocialApi for T where T: ProfileService + FollowerListService + UserLookupService {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CycleStage {
    Idle,
    ProfileCaptured,
    FollowersFetched,
    Diffed,
    UsersResolved,
    Reported,
    Saved,
}

impl CycleStage {
    pub fn as_str(self) -> &'static str {
        match self {
            CycleStage::Idle => "Idle",
            CycleStage::ProfileCaptured => "ProfileCaptured",
            CycleStage::FollowersFetched => "FollowersFetched",
            CycleStage::Diffed => "Diffed",
            CycleStage::UsersResolved => "UsersResolved",
            CycleStage::Reported => "Reported",
            CycleStage::Saved => "Saved",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CycleSettings {
    pub city: JapaneseCity,
    pub lookup_batch_size: usize,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            city: JapaneseCity::default(),
            lookup_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// State of one invocation. Dropped at the end; never shared across cycles.
#[derive(Debug)]
pub struct Cycle {
    stage: CycleStage,
    previous: Snapshot,
    profile: Option<CapturedProfile>,
    current_ids: Vec<String>,
    changes: ChangeSet,
    resolved: BTreeMap<String, ResolvedUser>,
    next_weather: Option<String>,
}

impl Cycle {
    pub fn new(previous: Snapshot) -> Self {
        Self {
            stage: CycleStage::Idle,
            previous,
            profile: None,
            current_ids: Vec::new(),
            changes: ChangeSet::default(),
            resolved: BTreeMap::new(),
            next_weather: None,
        }
    }

    pub fn stage(&self) -> CycleStage {
        self.stage
    }

    pub fn previous(&self) -> &Snapshot {
        &self.previous
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    fn require(&self, step: &'static str, required: CycleStage) -> Result<()> {
        if self.stage == required {
            Ok(())
        } else {
            Err(self.stage_error(step, required))
        }
    }

    fn stage_error(&self, step: &'static str, required: CycleStage) -> ChurnError {
        ChurnError::Stage {
            step,
            required: required.as_str(),
            actual: self.stage.as_str(),
        }
    }

    fn profile(&self, step: &'static str) -> Result<&CapturedProfile> {
        self.profile
            .as_ref()
            .ok_or_else(|| self.stage_error(step, CycleStage::ProfileCaptured))
    }

    fn advance(&mut self, to: CycleStage) {
        tracing::debug!(from = self.stage.as_str(), to = to.as_str(), "cycle.stage");
        self.stage = to;
    }
}

/// What a finished update has to say, handed to whoever posts it.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub screen_name: Option<String>,
    pub counts: ProfileCounts,
    pub deltas: ProfileDeltas,
    pub added_ids: Vec<String>,
    pub removed_ids: Vec<String>,
    pub resolved_users: BTreeMap<String, ResolvedUser>,
    /// Weather cached by the previous cycle.
    pub weather_text: String,
}

pub struct CronOrchestrator<A, W> {
    api: A,
    weather: W,
    store: StateStore,
    pacer: Box<dyn Pacer>,
    settings: CycleSettings,
}

impl<A, W> CronOrchestrator<A, W>
where
    A: SocialApi,
    W: WeatherService,
{
    pub fn new(
        api: A,
        weather: W,
        store: StateStore,
        pacer: Box<dyn Pacer>,
        settings: CycleSettings,
    ) -> Self {
        Self {
            api,
            weather,
            store,
            pacer,
            settings,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Start a cycle from the persisted snapshot.
    pub fn begin(&self) -> Cycle {
        Cycle::new(self.store.load())
    }

    pub async fn capture_profile(&self, cycle: &mut Cycle) -> Result<()> {
        if cycle.stage >= CycleStage::ProfileCaptured {
            tracing::debug!(stage = cycle.stage.as_str(), "cycle.capture_profile.skipped");
            return Ok(());
        }
        let captured =
            tracker::capture_profile(&self.api, cycle.previous.account_profile.as_ref()).await?;
        cycle.profile = Some(captured);
        cycle.advance(CycleStage::ProfileCaptured);
        Ok(())
    }

    pub async fn fetch_followers(&self, cycle: &mut Cycle) -> Result<()> {
        const STEP: &str = "fetch_followers";
        cycle.require(STEP, CycleStage::ProfileCaptured)?;
        let owner = cycle.profile(STEP)?.account.id.clone();
        let ids = RateLimitedPager::new(&self.api, self.pacer.as_ref())
            .fetch_all_ids(&owner)
            .await?;
        cycle.current_ids = dedup_preserving_order(&ids);
        cycle.advance(CycleStage::FollowersFetched);
        Ok(())
    }

    pub fn diff(&self, cycle: &mut Cycle) -> Result<()> {
        cycle.require("diff", CycleStage::FollowersFetched)?;
        cycle.changes = differ::diff(&cycle.previous.follower_ids, &cycle.current_ids);
        tracing::info!(
            cold_start = cycle.previous.is_cold(),
            added = cycle.changes.added.len(),
            removed = cycle.changes.removed.len(),
            "cycle.diffed"
        );
        cycle.advance(CycleStage::Diffed);
        Ok(())
    }

    pub async fn resolve_users(&self, cycle: &mut Cycle) -> Result<()> {
        cycle.require("resolve_users", CycleStage::Diffed)?;
        let changed = cycle.changes.changed_ids();
        cycle.resolved = if changed.is_empty() {
            BTreeMap::new()
        } else {
            BatchResolver::with_batch_size(&self.api, self.settings.lookup_batch_size)
                .resolve_users(&changed)
                .await
        };
        cycle.advance(CycleStage::UsersResolved);
        Ok(())
    }

    /// Run every network step up to `UsersResolved`, resuming from wherever the cycle is.
    /// Calling it again on an updated cycle does nothing.
    pub async fn update(&self, cycle: &mut Cycle) -> Result<()> {
        if cycle.stage >= CycleStage::UsersResolved {
            tracing::debug!(stage = cycle.stage.as_str(), "cycle.update.already_done");
            return Ok(());
        }
        self.capture_profile(cycle).await?;
        if cycle.stage == CycleStage::ProfileCaptured {
            self.fetch_followers(cycle).await?;
        }
        if cycle.stage == CycleStage::FollowersFetched {
            self.diff(cycle)?;
        }
        self.resolve_users(cycle).await
    }

    /// Build the report. May be called again until the cycle is saved.
    pub fn report(&self, cycle: &mut Cycle) -> Result<CycleReport> {
        const STEP: &str = "report";
        if !matches!(cycle.stage, CycleStage::UsersResolved | CycleStage::Reported) {
            return Err(cycle.stage_error(STEP, CycleStage::UsersResolved));
        }
        let profile = cycle.profile(STEP)?;
        let report = CycleReport {
            screen_name: profile.account.screen_name.clone(),
            counts: profile.counts,
            deltas: profile.deltas,
            added_ids: cycle.changes.added.clone(),
            removed_ids: cycle.changes.removed.clone(),
            resolved_users: cycle.resolved.clone(),
            weather_text: cycle.previous.cached_weather_text.clone(),
        };
        cycle.advance(CycleStage::Reported);
        Ok(report)
    }

    /// Fetch tomorrow's forecast for the next cycle's status. Failures degrade to the
    /// error placeholder, which is cached like any other text.
    pub async fn refresh_weather(&self, cycle: &mut Cycle) -> Result<WeatherOutcome> {
        if cycle.stage == CycleStage::Saved {
            return Err(cycle.stage_error("refresh_weather", CycleStage::Reported));
        }
        let outcome = churn_weather::tomorrow_or_placeholder(&self.weather, self.settings.city).await;
        cycle.next_weather = Some(outcome.text().to_string());
        Ok(outcome)
    }

    /// Persist the cycle. Terminal: a second call fails with a stage error.
    pub fn save(&self, cycle: &mut Cycle) -> Result<Snapshot> {
        const STEP: &str = "save";
        cycle.require(STEP, CycleStage::Reported)?;
        let counts = cycle.profile(STEP)?.counts;
        let snapshot = Snapshot {
            success_count: cycle.previous.success_count + 1,
            follower_ids: cycle.current_ids.clone(),
            account_profile: Some(counts),
            cached_weather_text: cycle
                .next_weather
                .clone()
                .unwrap_or_else(|| cycle.previous.cached_weather_text.clone()),
        };
        self.store.save(&snapshot)?;
        cycle.advance(CycleStage::Saved);
        Ok(snapshot)
    }
}

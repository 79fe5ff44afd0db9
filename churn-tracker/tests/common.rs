#![allow(dead_code)]

use async_trait::async_trait;
use churn_common::observability::{LogConfig, LogFormat};
use churn_common::{ChurnError, Result};
use churn_social::{
    Cursor, FollowerListService, IdPage, Notifier, ProfileService, ResolvedUser, TimelineProbe,
    UserLookupService, VerifiedAccount,
};
use churn_tracker::Pacer;
use churn_weather::{JapaneseCity, WeatherService};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

static INIT_PATH: OnceLock<std::path::PathBuf> = OnceLock::new();

pub fn init_test_tracing() {
    let _ = INIT_PATH.get_or_init(|| {
        let config = LogConfig {
            app_name: "churn-tests",
            emit_stderr: true,
            format: if std::env::var("CHURN_LOG_FORMAT")
                .map(|raw| raw.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(false)
            {
                LogFormat::Json
            } else {
                LogFormat::Text
            },
            default_filter: "debug".into(),
            ..LogConfig::default()
        };

        churn_common::observability::init_logging(config).unwrap_or_default()
    });
}

pub fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

/// Counts pauses instead of sleeping. Clones share the counter.
#[derive(Default, Clone)]
pub struct CountingPacer(pub Arc<AtomicUsize>);

impl CountingPacer {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pacer for CountingPacer {
    async fn pause(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory platform: one account, a follower list served in fixed-size pages, and a
/// user directory.
pub struct FakePlatform {
    pub account: VerifiedAccount,
    pub followers: Vec<String>,
    pub page_size: usize,
    pub directory: HashMap<String, ResolvedUser>,
    pub blocked_by: HashSet<String>,
    pub fail_profile: bool,
    pub fail_lookups: bool,
    /// Pages served successfully before every later page fails.
    pub fail_pages_after: Option<usize>,
    /// Zero-based index of the post that fails.
    pub fail_post_at: Option<usize>,
    pub verify_calls: AtomicUsize,
    pub page_calls: AtomicUsize,
    pub lookup_calls: AtomicUsize,
    pub posts: Mutex<Vec<String>>,
}

impl FakePlatform {
    pub fn new(followers: &[&str]) -> Self {
        Self {
            account: VerifiedAccount {
                id: "1000".into(),
                screen_name: Some("vacuum".into()),
                followers_count: followers.len() as u64,
                following_count: 10,
                listed_count: 1,
                favourites_count: 50,
                posts_count: 300,
            },
            followers: ids(followers),
            page_size: 2,
            directory: HashMap::new(),
            blocked_by: HashSet::new(),
            fail_profile: false,
            fail_lookups: false,
            fail_pages_after: None,
            fail_post_at: None,
            verify_calls: AtomicUsize::new(0),
            page_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_user(mut self, id: &str, screen_name: &str, protected: bool) -> Self {
        self.directory.insert(
            id.to_string(),
            ResolvedUser {
                id: id.to_string(),
                display_name: format!("Name {screen_name}"),
                screen_name: screen_name.to_string(),
                protected,
            },
        );
        self
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProfileService for FakePlatform {
    async fn verify_credentials(&self) -> Result<VerifiedAccount> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_profile {
            return Err(ChurnError::Auth("401 Could not authenticate you.".into()));
        }
        Ok(self.account.clone())
    }
}

#[async_trait]
impl FollowerListService for FakePlatform {
    async fn list_follower_ids(&self, owner_id: &str, cursor: &Cursor) -> Result<IdPage> {
        assert_eq!(owner_id, self.account.id);
        let served = self.page_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_pages_after.is_some_and(|limit| served >= limit) {
            return Err(ChurnError::Network("followers/ids: 503".into()));
        }
        let start = match cursor {
            Cursor::Initial => 0,
            Cursor::Next(token) => token
                .parse::<usize>()
                .map_err(|e| ChurnError::Network(e.to_string()))?,
        };
        let end = (start + self.page_size).min(self.followers.len());
        Ok(IdPage {
            ids: self.followers[start..end].to_vec(),
            next: (end < self.followers.len()).then(|| end.to_string()),
        })
    }
}

#[async_trait]
impl UserLookupService for FakePlatform {
    async fn lookup_users(&self, ids: &[String]) -> Result<Vec<ResolvedUser>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups {
            return Err(ChurnError::Network("users/lookup: 500".into()));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.directory.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl TimelineProbe for FakePlatform {
    async fn probe_timeline(&self, user_id: &str) -> Result<()> {
        if self.blocked_by.contains(user_id) {
            Err(ChurnError::Auth("Not authorized.".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for FakePlatform {
    async fn post(&self, text: &str) -> Result<()> {
        let mut posts = self.posts.lock().unwrap();
        if self.fail_post_at == Some(posts.len()) {
            return Err(ChurnError::Network("statuses/update: 503".into()));
        }
        posts.push(text.to_string());
        Ok(())
    }
}

pub struct FakeWeather(pub Option<String>);

#[async_trait]
impl WeatherService for FakeWeather {
    async fn fetch_tomorrow_forecast(&self, _city: JapaneseCity) -> Result<String> {
        self.0
            .clone()
            .ok_or_else(|| ChurnError::Network("weather: 502".into()))
    }
}

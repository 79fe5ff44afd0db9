//! Minimal wrapper around the Twitter/X v1.1 REST API for a single account.
//!
//! Every call is signed with the account's OAuth 1.0a user-context credentials and
//! issued with zero transport retries: pacing and failure policy belong to the caller
//! (the tracker aborts a cycle on the first failed page rather than half-retrying).
use crate::services::{
    Cursor, FollowerListService, IdPage, Notifier, ProfileService, ResolvedUser, TimelineProbe,
    UserLookupService, VerifiedAccount,
};
use crate::twitter::types::{Credentials, IdsPage, LookupUser, StatusUpdate};
use async_trait::async_trait;
use churn_common::{ChurnError, Result};
use churn_http::{Auth, HttpClient, HttpError, OAuth1Credentials, RequestOpts};
use std::borrow::Cow;

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
const INITIAL_CURSOR: &str = "-1";
const IDS_PAGE_SIZE: &str = "5000";

fn map_http_error(endpoint: &str, err: HttpError) -> ChurnError {
    if err.is_auth_rejection() {
        ChurnError::Auth(format!("{endpoint}: {err}"))
    } else {
        ChurnError::Network(format!("{endpoint}: {err}"))
    }
}

#[derive(Clone)]
pub struct TwitterApi {
    http: HttpClient,
    creds: OAuth1Credentials,
}

impl TwitterApi {
    pub fn new(creds: OAuth1Credentials) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, creds)
    }

    pub fn with_base_url(base_url: &str, creds: OAuth1Credentials) -> Result<Self> {
        let http = HttpClient::new(base_url)
            .map_err(|e| ChurnError::Config(format!("twitter base url: {e}")))?;
        Ok(Self { http, creds })
    }

    fn opts<'a>(&'a self, query: Vec<(&'a str, Cow<'a, str>)>) -> RequestOpts<'a> {
        RequestOpts {
            auth: Some(Auth::OAuth1(&self.creds)),
            query: Some(query),
            retries: Some(0),
            ..Default::default()
        }
    }

    pub async fn credentials(&self) -> Result<Credentials> {
        const ENDPOINT: &str = "1.1/account/verify_credentials.json";
        let creds: Credentials = self
            .http
            .get_json(
                ENDPOINT,
                self.opts(vec![
                    ("skip_status", "true".into()),
                    ("include_entities", "false".into()),
                ]),
            )
            .await
            .map_err(|e| map_http_error(ENDPOINT, e))?;
        tracing::debug!(
            user_id=%creds.id_str,
            followers=creds.followers_count,
            "twitter.verify_credentials"
        );
        Ok(creds)
    }

    pub async fn follower_ids(&self, user_id: &str, cursor: &str) -> Result<IdsPage> {
        const ENDPOINT: &str = "1.1/followers/ids.json";
        self.http
            .get_json(
                ENDPOINT,
                self.opts(vec![
                    ("user_id", user_id.into()),
                    ("cursor", cursor.into()),
                    ("stringify_ids", "true".into()),
                    ("count", IDS_PAGE_SIZE.into()),
                ]),
            )
            .await
            .map_err(|e| map_http_error(ENDPOINT, e))
    }

    pub async fn users_lookup(&self, ids: &[String]) -> Result<Vec<LookupUser>> {
        const ENDPOINT: &str = "1.1/users/lookup.json";
        let joined = ids.join(",");
        match self
            .http
            .get_json::<Vec<LookupUser>>(
                ENDPOINT,
                self.opts(vec![
                    ("user_id", joined.as_str().into()),
                    ("include_entities", "false".into()),
                ]),
            )
            .await
        {
            Ok(users) => Ok(users),
            // The endpoint answers 404 when none of the ids resolve.
            Err(HttpError::Api { status, .. }) if status.as_u16() == 404 => Ok(Vec::new()),
            Err(e) => Err(map_http_error(ENDPOINT, e)),
        }
    }

    pub async fn user_timeline(&self, user_id: &str) -> Result<Vec<serde_json::Value>> {
        const ENDPOINT: &str = "1.1/statuses/user_timeline.json";
        self.http
            .get_json(
                ENDPOINT,
                self.opts(vec![
                    ("user_id", user_id.into()),
                    ("count", "1".into()),
                    ("trim_user", "true".into()),
                ]),
            )
            .await
            .map_err(|e| map_http_error(ENDPOINT, e))
    }

    pub async fn update_status(&self, status: &str) -> Result<StatusUpdate> {
        const ENDPOINT: &str = "1.1/statuses/update.json";
        let posted: StatusUpdate = self
            .http
            .post_json(ENDPOINT, self.opts(vec![("status", status.into())]))
            .await
            .map_err(|e| map_http_error(ENDPOINT, e))?;
        tracing::info!(status_id=%posted.id_str, chars=status.chars().count(), "twitter.status_posted");
        Ok(posted)
    }
}

#[async_trait]
impl ProfileService for TwitterApi {
    async fn verify_credentials(&self) -> Result<VerifiedAccount> {
        let c = self.credentials().await?;
        Ok(VerifiedAccount {
            id: c.id_str,
            screen_name: c.screen_name.filter(|s| !s.is_empty()),
            followers_count: c.followers_count,
            following_count: c.friends_count,
            listed_count: c.listed_count,
            favourites_count: c.favourites_count,
            posts_count: c.statuses_count,
        })
    }
}

#[async_trait]
impl FollowerListService for TwitterApi {
    async fn list_follower_ids(&self, owner_id: &str, cursor: &Cursor) -> Result<IdPage> {
        let raw = match cursor {
            Cursor::Initial => INITIAL_CURSOR,
            Cursor::Next(token) => token.as_str(),
        };
        let page = self.follower_ids(owner_id, raw).await?;
        let next = page.next_cursor();
        Ok(IdPage {
            ids: page.ids,
            next,
        })
    }
}

#[async_trait]
impl UserLookupService for TwitterApi {
    async fn lookup_users(&self, ids: &[String]) -> Result<Vec<ResolvedUser>> {
        let users = self.users_lookup(ids).await?;
        Ok(users
            .into_iter()
            .map(|u| ResolvedUser {
                id: u.id_str,
                display_name: u.name,
                screen_name: u.screen_name,
                protected: u.protected,
            })
            .collect())
    }
}

#[async_trait]
impl TimelineProbe for TwitterApi {
    async fn probe_timeline(&self, user_id: &str) -> Result<()> {
        self.user_timeline(user_id).await.map(|_| ())
    }
}

#[async_trait]
impl Notifier for TwitterApi {
    async fn post(&self, text: &str) -> Result<()> {
        self.update_status(text).await.map(|_| ())
    }
}

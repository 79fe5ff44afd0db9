//! Small JSON-over-HTTP client shared by the platform and weather clients.
//!
//! - per-request options: query params, [`Auth`], timeout, retry budget
//! - 429/5xx and transport failures are retried with exponential backoff, honouring
//!   `Retry-After`; every other status is returned as [`HttpError::Api`]
//! - OAuth 1.0a (HMAC-SHA1) signing, recomputed for every attempt
//! - secrets never reach the logs: the `Authorization` header and secret-looking query
//!   keys are redacted, and only the auth kind is recorded
//!
//! Set `CHURN_HTTP_RAW=1` to additionally log full responses under the `http.raw`
//! target (bodies capped at 64 KiB).
//!
//! ```no_run
//! # async fn demo() -> Result<(), churn_http::HttpError> {
//! let client = churn_http::HttpClient::new("https://weather.tsukumijima.net")?;
//! let forecast: serde_json::Value = client
//!     .get_json("api/forecast/city/016010", churn_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```

pub mod oauth1;

pub use oauth1::OAuth1Credentials;

use oauth1::OAuth1Nonce;
use reqwest::header::{AUTHORIZATION, HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "CHURN_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;
/// Minimum wait after a 429 that carries no `Retry-After`.
const RATE_LIMIT_FLOOR: Duration = Duration::from_millis(1100);

const SECRET_QUERY_KEYS: &[&str] = &[
    "access_token",
    "oauth_token",
    "oauth_signature",
    "token",
    "secret",
    "api_key",
    "key",
];

fn raw_enabled() -> bool {
    matches!(
        std::env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_key(key: &str) -> bool {
    SECRET_QUERY_KEYS.contains(&key.to_ascii_lowercase().as_str())
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

impl HttpError {
    /// Status code for server-side rejections, if any.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            HttpError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server rejected the caller's credentials.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }
}

#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// `Authorization: OAuth ...`, signed over method, URL and query.
    OAuth1(&'a OAuth1Credentials),
    None,
}

impl Auth<'_> {
    fn kind(&self) -> &'static str {
        match self {
            Auth::OAuth1(_) => "oauth1",
            Auth::None => "none",
        }
    }
}

/// Per-request tuning knobs.
///
/// ```
/// use churn_http::{Auth, RequestOpts};
/// use std::borrow::Cow;
///
/// let opts = RequestOpts {
///     retries: Some(0),
///     query: Some(vec![("cursor", Cow::Borrowed("-1"))]),
///     auth: Some(Auth::None),
///     ..Default::default()
/// };
/// assert!(opts.timeout.is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retries: Option<usize>,
    pub auth: Option<Auth<'a>>,
    pub query: Option<Vec<(&'a str, Cow<'a, str>)>>,
}

/// What one attempt ended with.
enum Attempt {
    Done(Vec<u8>),
    Retry { delay: Duration, reason: String },
    Fail(HttpError),
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub max_retries: usize,
}

impl HttpClient {
    /// Client anchored to `base`; paths passed to the request methods are joined onto it.
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("churn/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            max_retries: 2,
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retries(mut self, n: usize) -> Self {
        self.max_retries = n;
        self
    }

    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::GET, path, opts).await
    }

    /// POST with every parameter in the query string and an empty body, which is how
    /// Twitter v1.1 write endpoints take them.
    pub async fn post_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, path, opts).await
    }

    async fn request_json<T>(
        &self,
        method: Method,
        path: &str,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;
        let pairs: Vec<(&str, &str)> = opts
            .query
            .as_ref()
            .map(|q| q.iter().map(|(k, v)| (*k, v.as_ref())).collect())
            .unwrap_or_default();
        let max_retries = opts.retries.unwrap_or(self.max_retries);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);
        let auth = opts.auth.as_ref().unwrap_or(&Auth::None);
        let req_id = uuid::Uuid::new_v4().simple().to_string();

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            query=?redact_query(&pairs),
            timeout_ms=timeout.as_millis() as u64,
            auth_kind=auth.kind(),
            "http.request.start"
        );

        let mut attempt = 0usize;
        loop {
            attempt += 1;
            match self
                .attempt(&method, &url, &pairs, auth, timeout, &req_id, attempt)
                .await
            {
                Attempt::Done(bytes) => return decode(&bytes, &req_id),
                Attempt::Retry { delay, reason } if attempt <= max_retries => {
                    tracing::warn!(
                        req_id=%req_id,
                        attempt,
                        max_retries,
                        backoff_ms=delay.as_millis() as u64,
                        reason=%reason,
                        "http.retrying"
                    );
                    sleep(delay).await;
                }
                Attempt::Retry { reason, .. } => {
                    tracing::warn!(req_id=%req_id, attempt, reason=%reason, "http.retries_exhausted");
                    return Err(HttpError::Network(reason));
                }
                Attempt::Fail(err) => {
                    tracing::warn!(req_id=%req_id, attempt, error=%err, "http.error");
                    return Err(err);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn attempt(
        &self,
        method: &Method,
        url: &Url,
        pairs: &[(&str, &str)],
        auth: &Auth<'_>,
        timeout: Duration,
        req_id: &str,
        attempt: usize,
    ) -> Attempt {
        let mut rb = self
            .inner
            .request(method.clone(), url.clone())
            .timeout(timeout);
        if !pairs.is_empty() {
            rb = rb.query(pairs);
        }
        if let Auth::OAuth1(creds) = auth {
            // A nonce may only be used once, so retries are re-signed.
            match oauth1::authorization_header(method, url, pairs, creds, &OAuth1Nonce::fresh()) {
                Ok(header) => rb = rb.header(AUTHORIZATION, header),
                Err(err) => return Attempt::Fail(err),
            }
        }

        let started = Instant::now();
        let resp = match rb.send().await {
            Ok(resp) => resp,
            Err(err) => {
                return Attempt::Retry {
                    delay: backoff(attempt),
                    reason: format!("send: {err}"),
                };
            }
        };
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = match resp.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => {
                return Attempt::Retry {
                    delay: backoff(attempt),
                    reason: format!("body: {err}"),
                };
            }
        };

        log_response(req_id, attempt, status, &headers, &bytes, started.elapsed());

        if status.is_success() {
            return Attempt::Done(bytes);
        }

        let message = extract_error_message(&bytes);
        let retry_after = retry_after_secs(&headers).map(Duration::from_secs);
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Attempt::Retry {
                delay: retry_after.unwrap_or_else(|| backoff(attempt).max(RATE_LIMIT_FLOOR)),
                reason: format!("{status}: {message}"),
            };
        }
        if status.is_server_error() {
            return Attempt::Retry {
                delay: retry_after.unwrap_or_else(|| backoff(attempt)),
                reason: format!("{status}: {message}"),
            };
        }
        Attempt::Fail(HttpError::Api {
            status,
            message,
            request_id: header_request_id(&headers).to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(bytes: &[u8], req_id: &str) -> Result<T, HttpError> {
    serde_json::from_slice::<T>(bytes).map_err(|e| {
        let snippet = snip_body(bytes);
        tracing::warn!(
            req_id=%req_id,
            serde_line=e.line(),
            serde_col=e.column(),
            serde_err=%e,
            body_snippet=%snippet,
            "http.response.decode_error"
        );
        HttpError::Decode(e.to_string(), snippet)
    })
}

fn redact_query(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| {
            let shown = if is_secret_key(k) { "<redacted>" } else { v };
            (k.to_string(), shown.to_string())
        })
        .collect()
}

fn header_request_id(headers: &HeaderMap) -> &str {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("x-transaction-id"))
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

fn log_response(
    req_id: &str,
    attempt: usize,
    status: StatusCode,
    headers: &HeaderMap,
    bytes: &[u8],
    elapsed: Duration,
) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    tracing::debug!(
        req_id=%req_id,
        attempt,
        %status,
        duration_ms=elapsed.as_millis() as u64,
        body_len=bytes.len(),
        x_request_id=%header_request_id(headers),
        rate_limit.remaining=?header("x-rate-limit-remaining"),
        rate_limit.reset=?header("x-rate-limit-reset"),
        "http.response"
    );
    if raw_enabled() {
        let shown = &bytes[..bytes.len().min(RAW_MAX_BODY)];
        tracing::info!(
            target: "http.raw",
            %req_id,
            %status,
            body=%String::from_utf8_lossy(shown),
            truncated = bytes.len() > RAW_MAX_BODY,
            "response"
        );
    }
}

fn backoff(attempt: usize) -> Duration {
    Duration::from_millis(200u64.saturating_mul(1 << (attempt.saturating_sub(1)).min(10)))
}

/// First human-readable message in an error body.
///
/// Understands the Twitter envelope `{"errors":[{"message":..}]}` and flat
/// `{"message"|"error":..}` bodies; anything else is returned as a snippet.
fn extract_error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct Envelope {
        #[serde(default)]
        errors: Vec<Flat>,
        #[serde(flatten)]
        flat: Flat,
    }
    #[derive(Deserialize, Default)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Envelope>(body) {
        let found = env
            .errors
            .into_iter()
            .chain(std::iter::once(env.flat))
            .flat_map(|f| [f.message, f.error])
            .find(|m| !m.is_empty());
        if let Some(message) = found {
            return message;
        }
    }
    snip_body(body)
}

fn retry_after_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .trim()
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).into_owned();
    if snip.len() > SNIPPET_MAX {
        let mut cut = SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twitter_error_envelope_yields_first_message() {
        let body = br#"{"errors":[{"code":89,"message":"Invalid or expired token."}]}"#;
        assert_eq!(extract_error_message(body), "Invalid or expired token.");
    }

    #[test]
    fn flat_error_bodies_are_understood() {
        assert_eq!(extract_error_message(br#"{"error":"Not authorized."}"#), "Not authorized.");
    }

    #[test]
    fn unknown_error_bodies_fall_back_to_snippet() {
        assert_eq!(extract_error_message(b"upstream exploded"), "upstream exploded");
    }

    #[test]
    fn snippets_truncate_on_char_boundaries() {
        let body = "天".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn secret_query_values_are_redacted() {
        let shown = redact_query(&[("OAuth_Token", "abc"), ("cursor", "-1")]);
        assert_eq!(shown[0].1, "<redacted>");
        assert_eq!(shown[1].1, "-1");
    }

    #[test]
    fn auth_rejections_are_classified() {
        let err = HttpError::Api {
            status: StatusCode::UNAUTHORIZED,
            message: "Invalid or expired token.".into(),
            request_id: "-".into(),
        };
        assert!(err.is_auth_rejection());
        assert!(!HttpError::Network("reset".into()).is_auth_rejection());
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        assert_eq!(backoff(1), Duration::from_millis(200));
        assert_eq!(backoff(2), Duration::from_millis(400));
        assert_eq!(backoff(3), Duration::from_millis(800));
    }
}

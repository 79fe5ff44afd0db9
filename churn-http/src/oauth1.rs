//! OAuth 1.0a request signing (HMAC-SHA1) for user-context Twitter v1.1 calls.
//!
//! The signature covers the HTTP method, the normalised base URL, and every query
//! parameter plus the `oauth_*` protocol parameters. Bodies are never signed because
//! this client only sends parameters in the query string.
use crate::HttpError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use reqwest::{Method, Url};
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// Consumer + access token pair for a single account.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &"<redacted>")
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// Per-request values that must be unique (nonce) or current (timestamp).
#[derive(Debug, Clone)]
pub struct OAuth1Nonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl OAuth1Nonce {
    pub fn fresh() -> Self {
        Self {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

fn enc(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

fn base_url(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
        None => format!("{}://{}{}", url.scheme(), host, url.path()),
    }
}

fn protocol_params<'a>(
    creds: &'a OAuth1Credentials,
    nonce: &'a OAuth1Nonce,
    timestamp: &'a str,
) -> [(&'static str, &'a str); 6] {
    [
        ("oauth_consumer_key", creds.consumer_key.as_str()),
        ("oauth_nonce", nonce.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp),
        ("oauth_token", creds.access_token.as_str()),
        ("oauth_version", "1.0"),
    ]
}

/// Build the RFC 5849 signature base string.
pub fn signature_base_string(
    method: &Method,
    url: &Url,
    params: &[(&str, &str)],
    creds: &OAuth1Credentials,
    nonce: &OAuth1Nonce,
) -> String {
    let timestamp = nonce.timestamp.to_string();
    let mut encoded: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (enc(&k), enc(&v)))
        .chain(params.iter().map(|(k, v)| (enc(k), enc(v))))
        .chain(
            protocol_params(creds, nonce, &timestamp)
                .iter()
                .map(|(k, v)| (enc(k), enc(v))),
        )
        .collect();
    encoded.sort();

    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.as_str().to_ascii_uppercase(),
        enc(&base_url(url)),
        enc(&joined)
    )
}

/// HMAC-SHA1 over the base string, keyed by both secrets, base64 encoded.
pub fn sign(base: &str, creds: &OAuth1Credentials) -> Result<String, HttpError> {
    let key = format!(
        "{}&{}",
        enc(&creds.consumer_secret),
        enc(&creds.access_token_secret)
    );
    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| HttpError::Build(format!("oauth1 signing key rejected: {e}")))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Render the full `Authorization: OAuth ...` header value.
pub fn authorization_header(
    method: &Method,
    url: &Url,
    params: &[(&str, &str)],
    creds: &OAuth1Credentials,
    nonce: &OAuth1Nonce,
) -> Result<String, HttpError> {
    let base = signature_base_string(method, url, params, creds, nonce);
    let signature = sign(&base, creds)?;
    let timestamp = nonce.timestamp.to_string();

    let mut fields: Vec<(&str, &str)> = protocol_params(creds, nonce, &timestamp).to_vec();
    fields.push(("oauth_signature", signature.as_str()));
    fields.sort();

    let rendered = fields
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", enc(k), enc(v)))
        .collect::<Vec<_>>()
        .join(", ");
    Ok(format!("OAuth {rendered}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_creds() -> OAuth1Credentials {
        OAuth1Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".into(),
            consumer_secret: "kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw".into(),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".into(),
            access_token_secret: "LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE".into(),
        }
    }

    fn reference_nonce() -> OAuth1Nonce {
        OAuth1Nonce {
            nonce: "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg".into(),
            timestamp: 1318622958,
        }
    }

    #[test]
    fn matches_published_twitter_signature() {
        let url = Url::parse("https://api.twitter.com/1.1/statuses/update.json?include_entities=true")
            .unwrap();
        let params = [("status", "Hello Ladies + Gentlemen, a signed OAuth request!")];
        let base = signature_base_string(
            &Method::POST,
            &url,
            &params,
            &reference_creds(),
            &reference_nonce(),
        );
        assert!(base.starts_with(
            "POST&https%3A%2F%2Fapi.twitter.com%2F1.1%2Fstatuses%2Fupdate.json&include_entities%3Dtrue%26oauth_consumer_key"
        ));
        assert!(base.ends_with("status%3DHello%2520Ladies%2520%252B%2520Gentlemen%252C%2520a%2520signed%2520OAuth%2520request%2521"));
        assert_eq!(
            sign(&base, &reference_creds()).unwrap(),
            "hCtSmYh+iHYCEqBWrE7C7hYmtUk="
        );
    }

    #[test]
    fn header_lists_protocol_params_and_encoded_signature() {
        let url = Url::parse("https://api.twitter.com/1.1/statuses/update.json").unwrap();
        let header = authorization_header(
            &Method::POST,
            &url,
            &[
                ("include_entities", "true"),
                ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
            ],
            &reference_creds(),
            &reference_nonce(),
        )
        .unwrap();
        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_version=\"1.0\""));
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let rendered = format!("{:?}", reference_creds());
        assert!(!rendered.contains("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn non_default_ports_stay_in_the_base_url() {
        let url = Url::parse("http://127.0.0.1:8080/1.1/followers/ids.json").unwrap();
        assert_eq!(base_url(&url), "http://127.0.0.1:8080/1.1/followers/ids.json");
    }
}

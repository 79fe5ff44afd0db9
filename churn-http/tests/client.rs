use churn_http::{Auth, HttpClient, HttpError, OAuth1Credentials, RequestOpts};
use serde::Deserialize;
use std::borrow::Cow;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct Page {
    ids: Vec<String>,
    next_cursor_str: String,
}

fn creds() -> OAuth1Credentials {
    OAuth1Credentials {
        consumer_key: "ck".into(),
        consumer_secret: "cs".into(),
        access_token: "at".into(),
        access_token_secret: "ats".into(),
    }
}

#[tokio::test]
async fn get_json_sends_query_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/followers/ids.json"))
        .and(query_param("cursor", "-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ids": ["1", "2"],
            "next_cursor_str": "0"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let page: Page = client
        .get_json(
            "1.1/followers/ids.json",
            RequestOpts {
                query: Some(vec![("cursor", Cow::Borrowed("-1"))]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.ids, vec!["1", "2"]);
    assert_eq!(page.next_cursor_str, "0");
}

#[tokio::test]
async fn oauth1_requests_carry_a_signed_authorization_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/1.1/statuses/update.json"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id_str": "99"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let creds = creds();
    let _: serde_json::Value = client
        .post_json(
            "1.1/statuses/update.json",
            RequestOpts {
                auth: Some(Auth::OAuth1(&creds)),
                query: Some(vec![("status", Cow::Borrowed("hello"))]),
                retries: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let received: Vec<Request> = server.received_requests().await.unwrap();
    let header = received[0]
        .headers
        .get("authorization")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(header.starts_with("OAuth "));
    assert!(header.contains("oauth_consumer_key=\"ck\""));
    assert!(header.contains("oauth_signature="));
    assert!(!header.contains("\"cs\""));
}

#[tokio::test]
async fn server_errors_are_retried_before_succeeding() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap().with_retries(1);
    let got: serde_json::Value = client.get_json("flaky", RequestOpts::default()).await.unwrap();
    assert_eq!(got["ok"], true);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn auth_rejections_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/1.1/account/verify_credentials.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "errors": [{"code": 89, "message": "Invalid or expired token."}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap().with_retries(3);
    let err = client
        .get_json::<serde_json::Value>("1.1/account/verify_credentials.json", RequestOpts::default())
        .await
        .unwrap_err();

    assert!(err.is_auth_rejection());
    match err {
        HttpError::Api { message, .. } => assert_eq!(message, "Invalid or expired token."),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn undecodable_bodies_surface_as_decode_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/garbage"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
        .mount(&server)
        .await;

    let client = HttpClient::new(&server.uri()).unwrap();
    let err = client
        .get_json::<Page>("garbage", RequestOpts::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Decode(_, snippet) if snippet.contains("nope")));
}

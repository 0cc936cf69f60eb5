//! Single-request execution against a mock server.

use super::{init_test_env, session, session_with};
use apicli::executor::{ExecutionConfig, Executor, MAX_RESPONSE_SIZE};
use apicli::models::Warning;
use apicli::security::REDACTED;
use apicli::{
    parse_headers, Error, Headers, HttpMethod, RequestError, RequestOptions, StorageBackend,
};
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_history_entry_is_redacted_but_wire_is_not() {
    for backend in [StorageBackend::Sqlite, StorageBackend::Json] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .and(header("authorization", "Bearer t0k3n"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "sid=1")
                    .insert_header("X-Request-Id", "42")
                    .set_body_string("{\"name\":\"alice\"}"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let (_dir, session) = session(backend);
        let options =
            RequestOptions::default().with_headers(parse_headers(["Authorization: Bearer t0k3n"]));
        let outcome = session
            .execute_request(HttpMethod::GET, &format!("{}/me", server.uri()), &options)
            .await
            .unwrap();

        // The caller sees the live values.
        assert_eq!(outcome.response.status, "200 OK");
        assert_eq!(outcome.response.headers["set-cookie"], "sid=1");

        let history = session.list_history(10).unwrap();
        assert_eq!(history.len(), 1);
        let stored = &history[0];
        assert_eq!(stored.headers["Authorization"], REDACTED);
        let response = stored.response.as_ref().unwrap();
        assert_eq!(response.headers["set-cookie"], REDACTED);
        assert_eq!(response.headers["x-request-id"], "42");
        assert_eq!(response.body, "{\"name\":\"alice\"}");
    }
}

#[tokio::test]
async fn test_default_content_type_only_with_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("content-type", "application/json"))
        .and(body_string("{\"a\":1}"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/text"))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, session) = session(StorageBackend::Sqlite);

    let outcome = session
        .execute_request(
            HttpMethod::POST,
            &format!("{}/items", server.uri()),
            &RequestOptions::default().with_body("{\"a\":1}"),
        )
        .await
        .unwrap();
    assert_eq!(outcome.response.status_code, 201);
    assert_eq!(outcome.response.status, "201 Created");

    let outcome = session
        .execute_request(
            HttpMethod::POST,
            &format!("{}/text", server.uri()),
            &RequestOptions::default()
                .with_headers(parse_headers(["Content-Type: text/plain"]))
                .with_body("hello"),
        )
        .await
        .unwrap();
    assert_eq!(outcome.response.status_code, 202);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
}

#[tokio::test]
async fn test_get_without_body_has_no_content_type() {
    init_test_env();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let executor = Executor::new(ExecutionConfig::default()).unwrap();
    let url = url::Url::parse(&server.uri()).unwrap();
    executor
        .execute(HttpMethod::GET, &url, &Headers::new(), "")
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert!(received[0].headers.get("content-type").is_none());
}

#[tokio::test]
async fn test_error_statuses_are_responses() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let (_dir, session) = session(StorageBackend::Sqlite);
    let outcome = session
        .execute_request(
            HttpMethod::DELETE,
            &format!("{}/thing/1", server.uri()),
            &RequestOptions::default(),
        )
        .await
        .unwrap();
    assert!(outcome.response.is_client_error());
    assert_eq!(outcome.response.status, "404 Not Found");
    assert_eq!(session.list_history(10).unwrap().len(), 1);
}

#[tokio::test]
async fn test_local_plain_http_warns() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (_dir, session) = session(StorageBackend::Sqlite);
    let outcome = session
        .execute_request(HttpMethod::GET, &server.uri(), &RequestOptions::default())
        .await
        .unwrap();

    assert!(outcome.warnings.contains(&Warning::InsecureTransport));
    assert!(outcome
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::LoopbackHost(host) if host == "127.0.0.1")));
}

#[tokio::test]
async fn test_timeout_is_a_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let (_dir, session) = session(StorageBackend::Sqlite);
    let executor = Executor::new(ExecutionConfig::new(Duration::from_millis(200))).unwrap();
    let url = url::Url::parse(&server.uri()).unwrap();

    let err = executor
        .execute(HttpMethod::GET, &url, &Headers::new(), "")
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    // Through the session the failure leaves no history behind.
    let (_dir2, slow) = session_with(StorageBackend::Sqlite, |mut config| {
        config.timeout_secs = 1;
        config
    });
    let result = slow
        .execute_request(HttpMethod::GET, &server.uri(), &RequestOptions::default())
        .await;
    assert!(matches!(result, Err(Error::Network(RequestError::Timeout))));
    assert!(slow.list_history(10).unwrap().is_empty());
    assert!(session.list_history(10).unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_refused_is_a_network_error() {
    let (_dir, session) = session(StorageBackend::Sqlite);
    let result = session
        .execute_request(
            HttpMethod::GET,
            "http://127.0.0.1:1/",
            &RequestOptions::default(),
        )
        .await;
    assert!(matches!(result, Err(ref e) if e.is_network()));
}

#[tokio::test]
async fn test_oversized_body_is_truncated_not_failed() {
    const SIXTY_MIB: usize = 60 * 1024 * 1024;

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; SIXTY_MIB]))
        .mount(&server)
        .await;

    let (_dir, session) = session(StorageBackend::Sqlite);
    let outcome = session
        .execute_request(
            HttpMethod::GET,
            &format!("{}/big", server.uri()),
            &RequestOptions::default().without_history(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.response.body.len(), MAX_RESPONSE_SIZE);
    assert!(outcome.warnings.contains(&Warning::ResponseTruncated {
        limit: MAX_RESPONSE_SIZE
    }));
}

#[tokio::test]
async fn test_body_at_cap_is_not_truncated() {
    init_test_env();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'y'; 1024]))
        .mount(&server)
        .await;

    let executor =
        Executor::new(ExecutionConfig::default().with_max_body_bytes(1024)).unwrap();
    let url = url::Url::parse(&server.uri()).unwrap();
    let execution = executor
        .execute(HttpMethod::GET, &url, &Headers::new(), "")
        .await
        .unwrap();
    assert_eq!(execution.response.body.len(), 1024);
    assert!(!execution.truncated());
}

#[tokio::test]
async fn test_multibyte_body_cut_stays_within_cap() {
    init_test_env();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("€€€"))
        .mount(&server)
        .await;

    let executor = Executor::new(ExecutionConfig::default().with_max_body_bytes(4)).unwrap();
    let url = url::Url::parse(&server.uri()).unwrap();
    let execution = executor
        .execute(HttpMethod::GET, &url, &Headers::new(), "")
        .await
        .unwrap();

    assert!(execution.truncated());
    assert!(execution.response.body.len() <= 4);
    assert_eq!(execution.response.body, "€");
}

#[tokio::test]
async fn test_binary_body_stays_within_cap() {
    init_test_env();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF_u8; 60]))
        .mount(&server)
        .await;

    let executor = Executor::new(ExecutionConfig::default().with_max_body_bytes(64)).unwrap();
    let url = url::Url::parse(&server.uri()).unwrap();
    let execution = executor
        .execute(HttpMethod::GET, &url, &Headers::new(), "")
        .await
        .unwrap();

    assert!(execution.response.body.len() <= 64);
    assert!(execution.truncated());
}

#[tokio::test]
async fn test_no_history_skips_recording_and_body_advisory() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let (_dir, session) = session(StorageBackend::Json);
    let body = "{\"password\":\"hunter2\"}";

    let stored = session
        .execute_request(
            HttpMethod::POST,
            &server.uri(),
            &RequestOptions::default().with_body(body),
        )
        .await
        .unwrap();
    assert!(stored.warnings.contains(&Warning::SensitiveBody));

    let skipped = session
        .execute_request(
            HttpMethod::POST,
            &server.uri(),
            &RequestOptions::default().with_body(body).without_history(),
        )
        .await
        .unwrap();
    assert!(!skipped.warnings.contains(&Warning::SensitiveBody));

    let history = session.list_history(10).unwrap();
    assert_eq!(history.len(), 1);
    // The advisory never alters what is stored.
    assert_eq!(history[0].body, body);
}

#[tokio::test]
async fn test_alias_and_collection_save() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, session) = session(StorageBackend::Sqlite);
    session
        .create_alias("api", &format!("{}/v1/", server.uri()))
        .unwrap();

    let options = RequestOptions::default()
        .with_headers(parse_headers(["X-Api-Key: abc123", "Accept: application/json"]))
        .save_to("users");
    let outcome = session
        .execute_request(HttpMethod::GET, "api/users", &options)
        .await
        .unwrap();

    assert_eq!(outcome.url, format!("{}/v1/users", server.uri()));
    assert!(outcome
        .warnings
        .iter()
        .all(|w| !matches!(w, Warning::CollectionSaveFailed { .. })));

    let collection = session.get_collection("users").unwrap().unwrap();
    assert_eq!(collection.len(), 1);
    let saved = &collection.requests[0];
    assert_eq!(saved.name, "");
    assert_eq!(saved.url, outcome.url);
    assert_eq!(saved.headers["X-Api-Key"], REDACTED);
    assert_eq!(saved.headers["Accept"], "application/json");
}

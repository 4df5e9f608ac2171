use std::sync::Arc;
use std::time::Duration;

use recall_engine::{
    Credential, FailureKind, ReqwestRetriever, RetrieveSettings, Retriever, Source,
    StaticCredentialStore,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ENDPOINT: &str = "/api/memories/retrieve-answer/";

fn retriever(server: &MockServer, credential: Credential) -> ReqwestRetriever {
    let settings = RetrieveSettings {
        api_base_url: server.uri(),
        request_timeout: Duration::from_millis(500),
        ..RetrieveSettings::default()
    };
    ReqwestRetriever::new(settings, Arc::new(StaticCredentialStore::new(credential)))
        .expect("client builds")
}

#[tokio::test]
async fn sends_query_top_k_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .and(query_param("q", "Hello there"))
        .and(query_param("top_k", "5"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "answer": "We agreed on Friday.",
            "sources": ["standup notes", {"title": "Planning", "score": 0.8}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let answer = retriever(&server, Credential::valid("secret"))
        .retrieve("Hello there")
        .await
        .expect("retrieval succeeds");

    assert_eq!(answer.answer, "We agreed on Friday.");
    let labels: Vec<String> = answer.sources.iter().map(Source::label).collect();
    assert_eq!(labels, vec!["standup notes", "Planning"]);
}

#[tokio::test]
async fn missing_credential_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = retriever(&server, Credential::missing())
        .retrieve("Hello")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Unauthenticated);
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = retriever(&server, Credential::valid("t"))
        .retrieve("Hello")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(503));
    assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
}

#[tokio::test]
async fn malformed_body_is_a_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = retriever(&server, Credential::valid("t"))
        .retrieve("Hello")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Decode);
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ENDPOINT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"answer": "late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = retriever(&server, Credential::valid("t"))
        .retrieve("Hello")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    let settings = RetrieveSettings {
        api_base_url: "http://127.0.0.1:9".to_string(),
        connect_timeout: Duration::from_millis(500),
        request_timeout: Duration::from_secs(2),
        ..RetrieveSettings::default()
    };
    let retriever = ReqwestRetriever::new(
        settings,
        Arc::new(StaticCredentialStore::new(Credential::valid("t"))),
    )
    .unwrap();

    let err = retriever.retrieve("Hello").await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::Network | FailureKind::Timeout));
}

//! End-to-end checks of the HTTP surface, driven through the full router.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use report_autocomplete::api::{ApiServer, AppState, AutocompleteResponse, TRACE_ID_HEADER};
use report_autocomplete::auth::{generate_token, SharedSecretVerifier};
use report_autocomplete::{Config, Corpus};
use std::sync::Arc;
use tower::util::ServiceExt;

const SECRET: &str = "integration-secret";

fn app_with(corpus: Corpus) -> Router {
    let state = AppState {
        corpus,
        verifier: Arc::new(SharedSecretVerifier::new(SECRET, 0)),
    };
    ApiServer::build_router(&Config::default(), state).unwrap()
}

fn app() -> Router {
    app_with(Corpus::default())
}

fn authorized(uri: &str) -> Request<Body> {
    let token = generate_token("reader-1", Some("reader@example.com"), SECRET, chrono::Duration::minutes(10)).unwrap();
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn suggestions(app: Router, uri: &str) -> Vec<String> {
    let response = app.oneshot(authorized(uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: AutocompleteResponse = serde_json::from_slice(&body).unwrap();
    parsed.suggestions
}

#[tokio::test]
async fn prefix_matches_shortest_first() {
    let corpus = Corpus::new([
        "MRI LUMBO-SACRAL SPINE",
        "Marginal osteophytes are noted at multiple levels",
        "Fecalarthropathy noted with ligamentum flavum thickening of lower lumbar levels",
    ])
    .unwrap();

    assert_eq!(
        suggestions(app_with(corpus), "/autocomplete?query=m").await,
        vec![
            "MRI LUMBO-SACRAL SPINE".to_string(),
            "Marginal osteophytes are noted at multiple levels".to_string(),
        ]
    );
}

#[tokio::test]
async fn no_match_returns_empty_list() {
    assert!(suggestions(app(), "/autocomplete?query=zzz").await.is_empty());
}

#[tokio::test]
async fn empty_query_returns_empty_list() {
    assert!(suggestions(app(), "/autocomplete?query=").await.is_empty());
}

#[tokio::test]
async fn query_is_url_decoded() {
    assert_eq!(
        suggestions(app(), "/autocomplete?query=Coronal%20and").await,
        vec!["Coronal and Sagittal STIR sequences".to_string()]
    );
}

#[tokio::test]
async fn missing_token_is_challenged() {
    let request = Request::builder()
        .uri("/autocomplete?query=m")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    assert!(response.headers().contains_key(TRACE_ID_HEADER));
}

#[tokio::test]
async fn token_signed_with_other_secret_is_rejected() {
    let token = generate_token("intruder", None, "other-secret", chrono::Duration::minutes(10)).unwrap();
    let request = Request::builder()
        .uri("/autocomplete?query=m")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_needs_no_token() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], br#"{"status":"ok"}"#);
}

#[tokio::test]
async fn concurrent_requests_see_the_same_corpus() {
    let app = app();
    let mut tasks = Vec::new();
    for _ in 0..32 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            suggestions(app, "/autocomplete?query=s").await
        }));
    }

    let expected = vec![
        "Sagittal and Axial T1 and T2 W sequences".to_string(),
        "Screening sagittal T1W sequence through cervico-dorsal spine".to_string(),
    ];
    for task in tasks {
        assert_eq!(task.await.unwrap(), expected);
    }
}

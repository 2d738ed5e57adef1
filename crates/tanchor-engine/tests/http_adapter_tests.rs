//! HTTP collaborators against in-process axum servers

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tanchor_core::hash::Sentinel;
use tanchor_core::model::{Anchor, AnchorStatus, AnchorTarget, PublishResult, TargetType};
use tanchor_engine::audit::{AuditEvent, AuditSink, HttpAuditSink};
use tanchor_engine::publish::public_log::IDEMPOTENCY_HEADER;
use tanchor_engine::publish::{PublicLogPublisher, PublishRequest, Publisher};
use tanchor_engine::snapshot::{
    ChainHeadSource, HttpChainHeadSource, HttpRegistrySource, RegistrySource, SnapshotCollector,
    SourceError,
};
use tanchor_engine::{Engine, EngineConfig, HttpPolicy, RetryPolicy};
use tanchor_store::SqliteAnchorStore;
use tokio::net::TcpListener;

type Seen = Arc<Mutex<Vec<Value>>>;

async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn no_retry() -> HttpPolicy {
    HttpPolicy::new(Duration::from_secs(5), RetryPolicy::none()).unwrap()
}

fn anchor() -> Anchor {
    Anchor {
        id: 17,
        issuer_registry_root_hash: "1".repeat(64),
        wcaf_heads_root_hash: "2".repeat(64),
        combined_root_hash: "3".repeat(64),
        issuer_count: 1,
        wcaf_document_count: 1,
        snapshot_at: chrono::Utc::now(),
        status: AnchorStatus::Pending,
        anchor_target: None,
        anchor_ref: None,
        anchor_proof: None,
        anchored_at: None,
        created_at: chrono::Utc::now(),
    }
}

fn registry_app(seen_limit: Seen) -> Router {
    Router::new()
        .route(
            "/directory",
            get(
                |State(seen): State<Seen>, Query(q): Query<std::collections::HashMap<String, String>>| async move {
                    seen.lock().unwrap().push(json!(q.get("limit")));
                    Json(json!({"issuers": [
                        {"issuer_id": "iss-1", "current_status": "ACTIVE", "status_updated_at": null, "name": "One"}
                    ]}))
                },
            ),
        )
        .with_state(seen_limit)
}

#[tokio::test]
async fn test_registry_source_requests_page_limit() {
    let seen: Seen = Arc::default();
    let base = spawn(registry_app(seen.clone())).await;

    let issuers = HttpRegistrySource::new(no_retry(), &format!("{}/", base), 250)
        .fetch_issuers()
        .await
        .unwrap();

    assert_eq!(issuers.len(), 1);
    assert_eq!(issuers[0]["issuer_id"], json!("iss-1"));
    assert_eq!(seen.lock().unwrap()[0], json!("250"));
}

#[tokio::test]
async fn test_chain_heads_source_reads_heads() {
    let app = Router::new().route(
        "/chain-heads",
        get(|| async {
            Json(json!({"heads": [
                {"document_id": "d1", "head_event_hash": "f".repeat(64)}
            ]}))
        }),
    );
    let base = spawn(app).await;

    let heads = HttpChainHeadSource::new(no_retry(), &base)
        .fetch_heads()
        .await
        .unwrap();
    assert_eq!(heads.len(), 1);
}

#[tokio::test]
async fn test_missing_heads_endpoint_with_healthy_service_is_capability_missing() {
    let app = Router::new().route("/health", get(|| async { "ok" }));
    let base = spawn(app).await;

    let err = HttpChainHeadSource::new(no_retry(), &base)
        .fetch_heads()
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::CapabilityMissing(_)));
}

#[tokio::test]
async fn test_failing_service_without_health_is_unavailable() {
    let app = Router::new().route(
        "/chain-heads",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let base = spawn(app).await;

    let err = HttpChainHeadSource::new(no_retry(), &base)
        .fetch_heads()
        .await
        .unwrap_err();
    assert!(matches!(err, SourceError::Unavailable(_)));
}

#[tokio::test]
async fn test_collector_degrades_on_unreachable_services() {
    let http = no_retry();
    let collector = SnapshotCollector::new(
        Arc::new(HttpRegistrySource::new(http.clone(), "http://127.0.0.1:1", 10)),
        Arc::new(HttpChainHeadSource::new(http, "http://127.0.0.1:1")),
    );

    let snapshot = collector.create_snapshot().await;

    assert_eq!(
        snapshot.issuer_registry_root_hash,
        Sentinel::RegistryUnavailable.digest()
    );
    assert_eq!(
        snapshot.wcaf_heads_root_hash,
        Sentinel::ChainHeadsUnavailable.digest()
    );
    assert_eq!(snapshot.issuer_count, 0);
    assert_eq!(snapshot.wcaf_document_count, 0);
}

#[tokio::test]
async fn test_transient_status_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/chain-heads",
            get(|State(attempts): State<Arc<AtomicUsize>>| async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(StatusCode::SERVICE_UNAVAILABLE)
                } else {
                    Ok(Json(json!({"heads": []})))
                }
            }),
        )
        .with_state(attempts.clone());
    let base = spawn(app).await;

    let http = HttpPolicy::new(
        Duration::from_secs(5),
        RetryPolicy {
            max_retries: 2,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(20),
        },
    )
    .unwrap();
    let heads = HttpChainHeadSource::new(http, &base).fetch_heads().await.unwrap();

    assert!(heads.is_empty());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_audit_sink_posts_event() {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route(
            "/events",
            post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(body);
                StatusCode::CREATED
            }),
        )
        .with_state(seen.clone());
    let base = spawn(app).await;

    let event = AuditEvent::for_anchor("TRANSPARENCY_ANCHOR_CREATED", &anchor(), "anchor-9");
    HttpAuditSink::new(no_retry(), &base).emit(&event).await.unwrap();

    let bodies = seen.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["document_id"], json!("transparency:anchor-17"));
    assert_eq!(bodies[0]["actor"]["system"], json!("transparency-anchor"));
}

#[tokio::test]
async fn test_audit_sink_reports_rejection() {
    let app = Router::new().route("/events", post(|| async { StatusCode::BAD_REQUEST }));
    let base = spawn(app).await;

    let event = AuditEvent::for_anchor("TRANSPARENCY_ANCHOR_CREATED", &anchor(), "anchor-9");
    let err = HttpAuditSink::new(no_retry(), &base)
        .emit(&event)
        .await
        .unwrap_err();
    assert!(err.message().contains("400"));
}

fn log_app(seen: Seen) -> Router {
    Router::new()
        .route(
            "/entries",
            post(
                |State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let key = headers
                        .get(IDEMPOTENCY_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    seen.lock().unwrap().push(json!({"header": key, "body": body}));
                    Json(json!({
                        "entry_id": 7,
                        "entry_hash": "e".repeat(64),
                        "inclusion_proof": {"tree_size": 8}
                    }))
                },
            ),
        )
        .with_state(seen)
}

#[tokio::test]
async fn test_public_log_submission_and_receipt() {
    let seen: Seen = Arc::default();
    let base = spawn(log_app(seen.clone())).await;
    let target = AnchorTarget::new("rekor", TargetType::PublicLog, json!({"url": base}));
    let anchor = anchor();

    let result = PublicLogPublisher::new(no_retry(), None, "transparency-anchor")
        .publish(PublishRequest {
            anchor: &anchor,
            target: &target,
            idempotency_key: "idem-17",
        })
        .await;

    let PublishResult::Published { anchor_ref, proof } = result else {
        panic!("expected publish to succeed");
    };
    assert_eq!(anchor_ref, format!("{}/entries/7", base));
    assert_eq!(proof["type"], json!("public-log"));
    assert_eq!(proof["inclusion_proof"], json!({"tree_size": 8}));

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["header"], json!("idem-17"));
    assert_eq!(seen[0]["body"]["idempotency_key"], json!("idem-17"));
    assert_eq!(seen[0]["body"]["source_id"], json!(17));
    assert_eq!(seen[0]["body"]["source"], json!("transparency-anchor"));
    assert_eq!(seen[0]["body"]["combined_root_hash"], json!("3".repeat(64)));
}

#[tokio::test]
async fn test_public_log_error_status_is_failure() {
    let app = Router::new().route(
        "/entries",
        post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
    );
    let base = spawn(app).await;
    let target = AnchorTarget::new("rekor", TargetType::PublicLog, json!({}));
    let anchor = anchor();

    let result = PublicLogPublisher::new(no_retry(), Some(base), "transparency-anchor")
        .publish(PublishRequest {
            anchor: &anchor,
            target: &target,
            idempotency_key: "k",
        })
        .await;

    assert_eq!(result, PublishResult::failed("Log server returned 503"));
}

#[tokio::test]
async fn test_public_log_without_url_fails() {
    let target = AnchorTarget::new("rekor", TargetType::PublicLog, json!({}));
    let anchor = anchor();

    let result = PublicLogPublisher::new(no_retry(), None, "transparency-anchor")
        .publish(PublishRequest {
            anchor: &anchor,
            target: &target,
            idempotency_key: "k",
        })
        .await;

    assert_eq!(
        result.error(),
        Some("No log URL configured for target rekor")
    );
}

#[tokio::test]
async fn test_configured_engine_runs_end_to_end() {
    let registry_seen: Seen = Arc::default();
    let registry = spawn(registry_app(registry_seen)).await;
    let chain = spawn(Router::new().route(
        "/chain-heads",
        get(|| async {
            Json(json!({"heads": [{"document_id": "d1", "head_event_hash": "9".repeat(64)}]}))
        }),
    ))
    .await;
    let audit_seen: Seen = Arc::default();
    let audit = spawn(
        Router::new()
            .route(
                "/events",
                post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    StatusCode::OK
                }),
            )
            .with_state(audit_seen.clone()),
    )
    .await;
    let log_seen: Seen = Arc::default();
    let log = spawn(log_app(log_seen.clone())).await;

    let config = EngineConfig {
        registry_url: registry,
        chain_service_url: chain,
        audit_url: audit,
        public_log_url: Some(log.clone()),
        http_max_retries: 0,
        ..EngineConfig::default()
    };
    let repo = Arc::new(SqliteAnchorStore::open_in_memory().unwrap());
    let engine = Engine::from_config(&config, repo.clone()).unwrap();
    tanchor_core::AnchorRepository::upsert_target(
        repo.as_ref(),
        &AnchorTarget::new("rekor", TargetType::PublicLog, json!({})),
    )
    .unwrap();

    let outcome = engine.run(Some("rekor"), true).await.unwrap();

    assert!(outcome.is_success());
    assert_eq!(outcome.anchor.status, AnchorStatus::Anchored);
    assert_eq!(outcome.anchor.issuer_count, 1);
    assert_eq!(outcome.anchor.wcaf_document_count, 1);
    assert_eq!(
        outcome.anchor.anchor_ref.as_deref(),
        Some(format!("{}/entries/7", log).as_str())
    );
    assert_eq!(log_seen.lock().unwrap().len(), 1);

    engine.lifecycle().flush_audit().await;
    let types: Vec<Value> = audit_seen
        .lock()
        .unwrap()
        .iter()
        .map(|e| e["type"].clone())
        .collect();
    assert_eq!(
        types,
        vec![
            json!("TRANSPARENCY_ANCHOR_CREATED"),
            json!("TRANSPARENCY_ANCHOR_CONFIRMED")
        ]
    );

    let verification = engine
        .verifier()
        .verify(&outcome.anchor.combined_root_hash)
        .unwrap();
    assert!(verification.verified);
    assert_eq!(verification.anchor_id, Some(outcome.anchor.id));
}

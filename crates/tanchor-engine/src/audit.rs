//! Audit side channel for anchor lifecycle events
//!
//! Delivery is at-most-once: a single attempt bounded by the HTTP timeout,
//! no retry. Events are queued on an [`AuditDispatcher`] and handed to the
//! sink in order by a background task, so lifecycle operations never wait on
//! the sink. A failed emission is logged and dropped.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use serde::Serialize;
use tanchor_core::errors::{Result, TaError, TaErrorKind};
use tanchor_core::model::{Anchor, AnchorStatus};

use crate::http::{from_http, HttpPolicy};

pub const ACTOR_SYSTEM: &str = "transparency-anchor";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditActor {
    pub system: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditPayload {
    pub anchor_id: i64,
    pub combined_root_hash: String,
    pub issuer_registry_root_hash: String,
    pub wcaf_heads_root_hash: String,
    pub issuer_count: u64,
    pub wcaf_document_count: u64,
    pub anchor_target: Option<String>,
    pub anchor_ref: Option<String>,
    pub status: AnchorStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of `POST <audit>/events`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    pub document_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: AuditPayload,
    pub actor: AuditActor,
}

impl AuditEvent {
    pub fn for_anchor(event_type: &str, anchor: &Anchor, instance_id: &str) -> Self {
        Self {
            document_id: format!("transparency:anchor-{}", anchor.id),
            event_type: event_type.to_string(),
            payload: AuditPayload {
                anchor_id: anchor.id,
                combined_root_hash: anchor.combined_root_hash.clone(),
                issuer_registry_root_hash: anchor.issuer_registry_root_hash.clone(),
                wcaf_heads_root_hash: anchor.wcaf_heads_root_hash.clone(),
                issuer_count: anchor.issuer_count,
                wcaf_document_count: anchor.wcaf_document_count,
                anchor_target: anchor.anchor_target.clone(),
                anchor_ref: anchor.anchor_ref.clone(),
                status: anchor.status,
                reason: anchor.failure_reason().map(str::to_string),
            },
            actor: AuditActor {
                system: ACTOR_SYSTEM.to_string(),
                instance_id: instance_id.to_string(),
            },
        }
    }
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, event: &AuditEvent) -> Result<()>;
}

enum AuditMessage {
    Event(Box<AuditEvent>),
    Flush(oneshot::Sender<()>),
}

/// Non-blocking front of an [`AuditSink`]
///
/// The delivery task is spawned on the first dispatch, inside whichever
/// runtime the lifecycle runs on.
#[derive(Clone)]
pub struct AuditDispatcher {
    sink: Arc<dyn AuditSink>,
    queue: Arc<OnceLock<mpsc::UnboundedSender<AuditMessage>>>,
}

impl AuditDispatcher {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            queue: Arc::new(OnceLock::new()),
        }
    }

    fn queue(&self) -> &mpsc::UnboundedSender<AuditMessage> {
        self.queue.get_or_init(|| {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(deliver(Arc::clone(&self.sink), rx));
            tx
        })
    }

    /// Queue `event` and return immediately
    pub fn dispatch(&self, event: AuditEvent) {
        let anchor_id = event.payload.anchor_id;
        if self.queue().send(AuditMessage::Event(Box::new(event))).is_err() {
            tracing::warn!(anchor_id, "audit queue closed, event dropped");
        }
    }

    /// Wait until every event queued so far has been handed to the sink.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.queue().send(AuditMessage::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn deliver(sink: Arc<dyn AuditSink>, mut rx: mpsc::UnboundedReceiver<AuditMessage>) {
    while let Some(message) = rx.recv().await {
        match message {
            AuditMessage::Event(event) => {
                if let Err(err) = sink.emit(&event).await {
                    tracing::warn!(
                        anchor_id = event.payload.anchor_id,
                        audit_type = %event.event_type,
                        err.code = err.code(),
                        reason = %err,
                        "audit emission failed"
                    );
                }
            }
            AuditMessage::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
}

pub struct HttpAuditSink {
    http: HttpPolicy,
    events_url: String,
}

impl HttpAuditSink {
    pub fn new(http: HttpPolicy, base_url: &str) -> Self {
        Self {
            http,
            events_url: format!("{}/events", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl AuditSink for HttpAuditSink {
    async fn emit(&self, event: &AuditEvent) -> Result<()> {
        let response = self
            .http
            .client()
            .post(&self.events_url)
            .json(event)
            .send()
            .await
            .map_err(|e| from_http("audit_emit", &e))?;

        if !response.status().is_success() {
            return Err(TaError::new(TaErrorKind::ExternalService)
                .with_op("audit_emit")
                .with_message(format!(
                    "Audit sink returned {} for {}",
                    response.status().as_u16(),
                    event.event_type
                )));
        }
        Ok(())
    }
}

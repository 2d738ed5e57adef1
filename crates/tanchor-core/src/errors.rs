use tanchor_core_types::RequestId;
use thiserror::Error;

/// Result type alias using the canonical structured error
pub type Result<T> = std::result::Result<T, TaError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure that crosses a crate boundary is classified into one of
/// these kinds. Each kind maps to a stable error code used by the CLI, by
/// log assertions in tests, and by any API layer built on the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaErrorKind {
    // Validation
    InvalidInput,
    MissingField,
    InvalidDigest,

    // Lookup
    NotFound,
    TargetNotFound,

    // State machine
    IllegalTransition,

    // Upstream / publish
    /// Registry or chain-head fetch failed (recovered locally, logged only)
    UpstreamUnavailable,
    /// A publish target reported failure
    PublishFailed,
    NotImplemented,
    ExternalService,
    Timeout,

    // Internal
    Persistence,
    Serialization,
    Concurrency,
    Configuration,
    Internal,
}

impl TaErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            TaErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            TaErrorKind::MissingField => "ERR_MISSING_FIELD",
            TaErrorKind::InvalidDigest => "ERR_INVALID_DIGEST",
            TaErrorKind::NotFound => "ERR_NOT_FOUND",
            TaErrorKind::TargetNotFound => "ERR_TARGET_NOT_FOUND",
            TaErrorKind::IllegalTransition => "ERR_ILLEGAL_TRANSITION",
            TaErrorKind::UpstreamUnavailable => "ERR_UPSTREAM_UNAVAILABLE",
            TaErrorKind::PublishFailed => "ERR_PUBLISH_FAILED",
            TaErrorKind::NotImplemented => "ERR_NOT_IMPLEMENTED",
            TaErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            TaErrorKind::Timeout => "ERR_TIMEOUT",
            TaErrorKind::Persistence => "ERR_PERSISTENCE",
            TaErrorKind::Serialization => "ERR_SERIALIZATION",
            TaErrorKind::Concurrency => "ERR_CONCURRENCY",
            TaErrorKind::Configuration => "ERR_CONFIGURATION",
            TaErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether this kind belongs to the INTERNAL class.
    ///
    /// Internal failures are reported to external callers with a generic
    /// message; the full detail only goes to the logs.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            TaErrorKind::Persistence
                | TaErrorKind::Serialization
                | TaErrorKind::Concurrency
                | TaErrorKind::Configuration
                | TaErrorKind::Internal
        )
    }
}

/// Canonical structured error type
///
/// Carries the classification kind plus optional context for debugging.
#[derive(Debug, Clone)]
pub struct TaError {
    kind: TaErrorKind,
    op: Option<String>,
    anchor_id: Option<i64>,
    target_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl TaError {
    /// Create a new error with the specified kind
    pub fn new(kind: TaErrorKind) -> Self {
        Self {
            kind,
            op: None,
            anchor_id: None,
            target_id: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add anchor ID context
    pub fn with_anchor_id(mut self, anchor_id: i64) -> Self {
        self.anchor_id = Some(anchor_id);
        self
    }

    /// Add publish target context
    pub fn with_target_id(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> TaErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the anchor ID context, if any
    pub fn anchor_id(&self) -> Option<i64> {
        self.anchor_id
    }

    /// Get the target ID context, if any
    pub fn target_id(&self) -> Option<&str> {
        self.target_id.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this error is in the INTERNAL class
    pub fn is_internal(&self) -> bool {
        self.kind.is_internal()
    }

    /// Message safe to hand to an external caller.
    ///
    /// Internal failures collapse to a generic sentence; everything else
    /// keeps its message since it describes the caller's own input.
    pub fn public_message(&self) -> String {
        if self.is_internal() {
            "Internal server error".to_string()
        } else if self.message.is_empty() {
            self.kind.code().to_string()
        } else {
            self.message.clone()
        }
    }
}

impl std::fmt::Display for TaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(anchor_id) = self.anchor_id {
            write!(f, " (anchor_id: {})", anchor_id)?;
        }
        if let Some(target_id) = &self.target_id {
            write!(f, " (target_id: {})", target_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for TaError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for anchor operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnchorError {
    /// No anchor row with this id
    #[error("Anchor not found: {anchor_id}")]
    AnchorNotFound { anchor_id: i64 },

    /// No enabled target with this id
    #[error("Target not found or disabled: {target_id}")]
    TargetNotFound { target_id: String },

    /// A required input field was absent or blank
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// Input is not a 64-char lowercase hex digest
    #[error("Invalid digest: {value}")]
    InvalidDigest { value: String },

    /// Unknown status string read from input or storage
    #[error("Invalid anchor status: {value}")]
    InvalidStatus { value: String },

    /// Transition not permitted by the anchor state machine
    #[error("Illegal transition for anchor {anchor_id}: {from} -> {to}")]
    IllegalTransition {
        anchor_id: i64,
        from: String,
        to: String,
    },

    /// Serialization of a proof, config or canonical form failed
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Internal invariant broken
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<AnchorError> for TaError {
    fn from(err: AnchorError) -> Self {
        match err {
            AnchorError::AnchorNotFound { anchor_id } => TaError::new(TaErrorKind::NotFound)
                .with_anchor_id(anchor_id)
                .with_message("Anchor not found"),

            AnchorError::TargetNotFound { target_id } => {
                TaError::new(TaErrorKind::TargetNotFound)
                    .with_message(format!("Unknown or disabled target: {}", target_id))
                    .with_target_id(target_id)
            }

            AnchorError::MissingField { field } => TaError::new(TaErrorKind::MissingField)
                .with_message(format!("{} is required", field)),

            AnchorError::InvalidDigest { value } => TaError::new(TaErrorKind::InvalidDigest)
                .with_message(format!(
                    "Expected 64 lowercase hex characters, got {:?}",
                    value
                )),

            AnchorError::InvalidStatus { value } => TaError::new(TaErrorKind::InvalidInput)
                .with_message(format!("Invalid anchor status: {}", value)),

            AnchorError::IllegalTransition {
                anchor_id,
                from,
                to,
            } => TaError::new(TaErrorKind::IllegalTransition)
                .with_anchor_id(anchor_id)
                .with_message(format!("Anchor is {} and cannot move to {}", from, to)),

            AnchorError::Serialization { message } => {
                TaError::new(TaErrorKind::Serialization).with_message(message)
            }

            AnchorError::Internal { message } => {
                TaError::new(TaErrorKind::Internal).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for AnchorError {
    fn from(err: serde_json::Error) -> Self {
        AnchorError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TaError {
    fn from(err: serde_json::Error) -> Self {
        AnchorError::from(err).into()
    }
}

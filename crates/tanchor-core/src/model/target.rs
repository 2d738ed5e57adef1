use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Target id reserved for the local append-only log sink
pub const LOCAL_LOG_TARGET_ID: &str = "local-log";

/// Kind of external transparency target
///
/// Unknown strings read from configuration are kept verbatim in `Other` so
/// that the publish router can report them instead of failing to load.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetType {
    PublicLog,
    Notary,
    Blockchain,
    CertificateTransparency,
    Other(String),
}

impl TargetType {
    pub fn as_str(&self) -> &str {
        match self {
            TargetType::PublicLog => "PUBLIC_LOG",
            TargetType::Notary => "NOTARY",
            TargetType::Blockchain => "BLOCKCHAIN",
            TargetType::CertificateTransparency => "CERTIFICATE_TRANSPARENCY",
            TargetType::Other(raw) => raw,
        }
    }
}

impl From<&str> for TargetType {
    fn from(raw: &str) -> Self {
        match raw {
            "PUBLIC_LOG" => TargetType::PublicLog,
            "NOTARY" => TargetType::Notary,
            "BLOCKCHAIN" => TargetType::Blockchain,
            "CERTIFICATE_TRANSPARENCY" => TargetType::CertificateTransparency,
            other => TargetType::Other(other.to_string()),
        }
    }
}

impl From<String> for TargetType {
    fn from(raw: String) -> Self {
        TargetType::from(raw.as_str())
    }
}

impl From<TargetType> for String {
    fn from(value: TargetType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configured publish target (managed outside the lifecycle)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorTarget {
    pub target_id: String,
    pub target_type: TargetType,
    /// Per-type options, opaque to everything except the matching publisher
    #[serde(default)]
    pub config: Value,
    pub enabled: bool,
}

impl AnchorTarget {
    pub fn new(target_id: impl Into<String>, target_type: TargetType, config: Value) -> Self {
        Self {
            target_id: target_id.into(),
            target_type,
            config,
            enabled: true,
        }
    }

    /// String option from `config`, if present and non-empty
    pub fn config_str(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }
}

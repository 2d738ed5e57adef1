//! Domain model: anchors, targets, snapshots and publish outcomes.

pub mod anchor;
pub mod publish;
pub mod snapshot;
pub mod target;
pub mod verification;

pub use anchor::{Anchor, AnchorListQuery, AnchorStatus, Confirmation};
pub use publish::{PublishRecord, PublishResult};
pub use snapshot::{Degradation, Snapshot, SourceDigest};
pub use target::{AnchorTarget, TargetType, LOCAL_LOG_TARGET_ID};
pub use verification::Verification;

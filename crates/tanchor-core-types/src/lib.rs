//! Core types shared across the transparency-anchor crates
//!
//! - **Correlation types**: RequestId, RequestContext
//! - **Schema constants**: Canonical field keys and event names for
//!   structured logging

pub mod correlation;
pub mod schema;

pub use correlation::{RequestContext, RequestId};

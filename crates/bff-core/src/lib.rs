//! # bff-core: Foundational Types for the BFF Gateway
//!
//! Leaf crate of the workspace. Everything the gateway and the downstream
//! adapters share lives here, so neither side depends on the other.
//!
//! ## Contents
//!
//! - [`model`]: wire records for holders and holdings, the per-request
//!   [`CorrelationId`], and the joined [`AggregatedResult`].
//! - [`correlation`]: the task-local carrier that makes the current
//!   correlation id visible to every branch of a request's async fan-out.
//! - [`codec`]: the reversible opaque-identifier transform used to hide
//!   internal holder codes from external callers.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `bff-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Key material never appears in `Debug` output.

pub mod codec;
pub mod correlation;
pub mod model;

pub use codec::{DecodeError, EncodeError, IdentifierCodec, KeyError};
pub use correlation::{current_correlation_id, spawn_with_correlation, with_correlation_id};
pub use model::{AggregatedResult, CorrelationId, HolderRecord, HoldingRecord};

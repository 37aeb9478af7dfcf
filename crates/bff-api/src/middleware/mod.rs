//! # Middleware Modules
//!
//! Tower middleware layers for the gateway.

pub mod tracking;

//! # API Route Modules
//!
//! - `clientes`: the aggregation endpoint (`GET /api/clientes/{token}`) and
//!   the optional development encoder that issues opaque identifiers.

pub mod clientes;

//! # Gateway Data Model
//!
//! Wire records exchanged with the two downstream services and the joined
//! result rendered to callers. JSON keys follow the downstream services'
//! camelCase Spanish schema (`codigoUnico`, `saldo`, ...); the Rust field
//! names are English.
//!
//! Records are lenient on input: every field except the holder's code is
//! optional and unknown fields are ignored, so schema additions downstream
//! do not break the gateway. Absent optionals are omitted on output.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// -- CorrelationId ------------------------------------------------------------

/// Per-request correlation identifier (the `X-Tracking-Id` value).
///
/// Opaque to the gateway. Either supplied by the caller or generated as a
/// UUID v4 string when the caller sent none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Wrap a caller-supplied value verbatim.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Take the inbound header value if it carries anything, otherwise generate.
    ///
    /// Surrounding whitespace is trimmed; a blank value counts as absent.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self(v.to_string()),
            _ => Self::generate(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// -- Downstream records -------------------------------------------------------

/// Identity fields of one account holder, as served by the holder service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HolderRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Unique holder code (the plaintext behind an opaque identifier).
    #[serde(rename = "codigoUnico")]
    pub code: String,
    #[serde(rename = "nombres", default, skip_serializing_if = "Option::is_none")]
    pub given_names: Option<String>,
    #[serde(rename = "apellidos", default, skip_serializing_if = "Option::is_none")]
    pub surnames: Option<String>,
    #[serde(rename = "tipoDocumento", default, skip_serializing_if = "Option::is_none")]
    pub document_type: Option<String>,
    #[serde(rename = "numeroDocumento", default, skip_serializing_if = "Option::is_none")]
    pub document_number: Option<String>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// One financial holding (account, card, loan...) belonging to a holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HoldingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(rename = "codigoCliente", default, skip_serializing_if = "Option::is_none")]
    pub holder_code: Option<String>,
    #[serde(rename = "tipoProducto", default, skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,
    #[serde(rename = "nombre", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "saldo", default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<f64>)]
    pub balance: Option<Decimal>,
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

// -- AggregatedResult ---------------------------------------------------------

/// The joined view of one holder and all of their holdings.
///
/// Built once per request and never mutated. `count` is derived from the
/// holdings at construction, so it always equals `holdings().len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AggregatedResult {
    #[serde(rename = "trackingId")]
    #[schema(value_type = String)]
    correlation_id: CorrelationId,
    #[serde(rename = "cliente")]
    holder: HolderRecord,
    #[serde(rename = "productos")]
    holdings: Vec<HoldingRecord>,
    #[serde(rename = "cantidadProductos")]
    count: usize,
}

impl AggregatedResult {
    pub fn new(
        correlation_id: CorrelationId,
        holder: HolderRecord,
        holdings: Vec<HoldingRecord>,
    ) -> Self {
        let count = holdings.len();
        Self {
            correlation_id,
            holder,
            holdings,
            count,
        }
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    pub fn holder(&self) -> &HolderRecord {
        &self.holder
    }

    pub fn holdings(&self) -> &[HoldingRecord] {
        &self.holdings
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

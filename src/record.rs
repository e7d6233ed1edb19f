//! Render records and resource descriptors - the wire types.
//!
//! A [`RenderRecord`] is the payload for one render pass of one output
//! instance: created server-side, serialized once, consumed exactly once by
//! the client binding, then discarded. Validation happens at the
//! serialization boundary (`to_wire` / `from_wire`), not implicitly.
//!
//! The `resources` key is present on the wire if and only if the render pass
//! needs dynamic materialization - an unused dependency is never shipped.

use serde::{Deserialize, Serialize};

use crate::error::RecordError;

// =============================================================================
// Slots
// =============================================================================

/// Name of the title sub-slot.
pub const TITLE_SLOT: &str = "title";

/// Name of the value sub-slot.
pub const VALUE_SLOT: &str = "value";

/// The fixed set of named sub-slots, in markup order.
pub const SLOTS: [&str; 2] = [TITLE_SLOT, VALUE_SLOT];

/// Derive the child identifier for a sub-slot.
///
/// Deterministic: `slot_id("total", "value")` is always `"total-value"`.
/// Uniqueness across the page is the instance owner's responsibility.
pub fn slot_id(id: &str, slot: &str) -> String {
    format!("{id}-{slot}")
}

// =============================================================================
// Resource Descriptor
// =============================================================================

/// A named, versioned bundle of static client assets.
///
/// Identity is `(name, version)`: the delivery layer treats two descriptors
/// with the same identity as the same bundle and materializes only one, so
/// distinct resources must use distinct names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Bundle name, unique per resource.
    pub name: String,
    /// Bundle version.
    pub version: String,
    /// Script paths, relative to the asset root.
    pub scripts: Vec<String>,
    /// Stylesheet paths, relative to the asset root.
    pub styles: Vec<String>,
}

impl ResourceDescriptor {
    /// The content address the delivery layer dedups on.
    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            name: self.name.clone(),
            version: self.version.clone(),
        }
    }
}

/// Content address of a resource bundle: `(name, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    /// Bundle name.
    pub name: String,
    /// Bundle version.
    pub version: String,
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

// =============================================================================
// Render Record
// =============================================================================

/// The serialized payload for one render pass of one output instance.
///
/// Immutable once serialized. The optional `resources` field carries dynamic
/// descriptors and is omitted from the wire entirely when empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderRecord {
    /// Title text, written into the title slot.
    pub title: String,
    /// Numeric value, written into the value slot.
    pub value: f64,
    /// CSS color applied to the fragment root.
    pub color: String,
    /// Whether the value slot should take the animated path.
    pub animate: bool,
    /// Dynamic resource descriptors, present only when materialization is
    /// required for this pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<ResourceDescriptor>>,
}

impl RenderRecord {
    /// Check the record against the wire contract.
    ///
    /// Required fields must be populated and the value must be a finite
    /// number. Fails fast - a record that does not validate is never
    /// serialized.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.title.is_empty() {
            return Err(RecordError::MissingField(TITLE_SLOT));
        }
        if !self.value.is_finite() {
            return Err(RecordError::NonFinite);
        }
        if self.color.is_empty() {
            return Err(RecordError::MissingField("color"));
        }
        Ok(())
    }

    /// Serialize for transport.
    ///
    /// Validates first; a contract violation fails the render pass here,
    /// server-side, rather than surfacing as a broken fragment on the client.
    pub fn to_wire(&self) -> Result<String, RecordError> {
        self.validate()?;
        serde_json::to_string(self).map_err(|e| RecordError::Malformed(e.to_string()))
    }

    /// Parse an inbound wire payload.
    ///
    /// The client-side inverse of [`to_wire`](Self::to_wire): decode failures
    /// (missing fields, wrong types) and contract violations both surface as
    /// [`RecordError`] before any slot is touched.
    pub fn from_wire(wire: &str) -> Result<Self, RecordError> {
        let record: Self =
            serde_json::from_str(wire).map_err(|e| RecordError::Malformed(e.to_string()))?;
        record.validate()?;
        Ok(record)
    }

    /// Format the value the way the value slot displays it.
    ///
    /// Whole numbers drop the trailing `.0` so a count renders as `95`,
    /// not `95.0`.
    pub fn display_value(&self) -> String {
        if self.value.fract() == 0.0 && self.value.abs() < 1e15 {
            format!("{}", self.value as i64)
        } else {
            format!("{}", self.value)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

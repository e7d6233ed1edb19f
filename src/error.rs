//! Error types for the output binding protocol.
//!
//! One enum per failure family:
//! - [`RecordError`] - malformed render records, caught at the serialization boundary
//! - [`RenderError`] - failures of a single render pass (missing slots, unknown fragments)
//! - [`ResourceError`] - resource delivery failures (unknown keys, failed loads)

use thiserror::Error;

/// A render record that violates the wire contract.
///
/// Raised at the serialization boundary (`to_wire` / `from_wire`), never
/// mid-render. A malformed record fails the whole render pass; no partial
/// record is ever emitted.
#[derive(Debug, Error)]
pub enum RecordError {
    /// A required field is missing or empty.
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    /// The value is NaN or infinite and cannot be carried as a JSON number.
    #[error("value is not a finite number")]
    NonFinite,

    /// The payload could not be encoded or decoded.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// A failure of one render pass for one output instance.
///
/// Other instances are unaffected; the failing fragment is left in its
/// previous fully-consistent state (no partial commit).
#[derive(Debug, Error)]
pub enum RenderError {
    /// The inbound record failed boundary validation.
    #[error(transparent)]
    Malformed(#[from] RecordError),

    /// The fragment is structurally inconsistent with the record's slots.
    #[error("fragment `{id}` has no `{slot}` slot")]
    MissingSlot {
        /// Output instance identifier.
        id: String,
        /// The slot that could not be located.
        slot: &'static str,
    },

    /// A second element claimed an identifier already present in the document.
    ///
    /// Detection is best-effort: collisions with markup outside the document
    /// remain a caller contract.
    #[error("duplicate element identifier `{0}`")]
    DuplicateIdentifier(String),

    /// No handler is registered under this binding name.
    #[error("no binding registered under `{0}`")]
    UnknownBinding(String),

    /// No discovered fragment matches this output identifier.
    #[error("no fragment found for output `{0}`")]
    UnknownFragment(String),
}

/// A resource delivery failure.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Completion reported for a resource that was never registered.
    #[error("unknown resource `{name}@{version}`")]
    Unknown {
        /// Resource bundle name.
        name: String,
        /// Resource bundle version.
        version: String,
    },

    /// The asset could not be fetched or evaluated.
    #[error("failed to load resource `{name}`: {reason}")]
    LoadFailed {
        /// Resource bundle name.
        name: String,
        /// Loader-supplied failure description.
        reason: String,
    },
}

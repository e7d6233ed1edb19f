//! Markup generator - the static placeholder fragment and its baseline
//! resources.
//!
//! `generate` is deterministic: given the same instance id it always builds
//! the same fragment - a root carrying the discovery class plus one child
//! placeholder per named sub-slot, each with its derived `{id}-{slot}`
//! identifier. Baseline resources cover only what every instance needs
//! unconditionally (the binding runtime and its stylesheet); anything loaded
//! conditionally, like the animation library, is attached per render pass by
//! the server renderer instead.

use crate::dom::{Document, NodeId};
use crate::error::RenderError;
use crate::record::{ResourceDescriptor, SLOTS, slot_id};

/// Discovery marker carried by every fragment root of this output family.
pub const DISCOVERY_CLASS: &str = "spark-output-value";

/// Attribute that, when present, overrides the element id as the output
/// identifier.
pub const OVERRIDE_ATTR: &str = "data-output-id";

/// Slot-specific styling class, e.g. `spark-output-value__title`.
pub fn slot_class(slot: &str) -> String {
    format!("{DISCOVERY_CLASS}__{slot}")
}

/// Build the placeholder fragment for output instance `id`.
///
/// Appends the root under `parent` when given, otherwise as a document root.
/// Returns the root's node handle.
///
/// # Errors
///
/// [`RenderError::DuplicateIdentifier`] when `id` (or a derived slot id)
/// already exists in the document. Generating twice with the same id is a
/// caller error - both fragments would collide.
pub fn generate(
    doc: &mut Document,
    parent: Option<NodeId>,
    id: &str,
) -> Result<NodeId, RenderError> {
    let root = doc.create_element("div");
    doc.set_element_id(root, id)?;
    doc.add_class(root, DISCOVERY_CLASS);

    for slot in SLOTS {
        let child = doc.create_element("span");
        doc.set_element_id(child, &slot_id(id, slot))?;
        doc.add_class(child, &slot_class(slot));
        doc.append_child(root, child);
    }

    match parent {
        Some(parent) => doc.append_child(parent, root),
        None => doc.append_root(root),
    }
    Ok(root)
}

/// The always-needed resources for this output family.
///
/// Declared once at markup-generation time; the registry dedups by
/// name+version, so any number of instances share a single load. The
/// animation library is deliberately not here - it ships only inside render
/// records that ask for it.
pub fn baseline_resources() -> Vec<ResourceDescriptor> {
    vec![ResourceDescriptor {
        name: "spark-outputs".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        scripts: vec!["spark-outputs/output-value.js".to_string()],
        styles: vec!["spark-outputs/output-value.css".to_string()],
    }]
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{TITLE_SLOT, VALUE_SLOT};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_generate_builds_slots() {
        let mut doc = Document::new();
        let root = generate(&mut doc, None, "total").unwrap();

        assert_eq!(doc.get_by_id("total"), Some(root));
        assert!(doc.node(root).has_class(DISCOVERY_CLASS));

        let title = doc.get_by_id("total-title").unwrap();
        let value = doc.get_by_id("total-value").unwrap();
        assert!(doc.node(title).has_class(&slot_class(TITLE_SLOT)));
        assert!(doc.node(value).has_class(&slot_class(VALUE_SLOT)));
    }

    #[test]
    fn test_generate_is_discoverable() {
        let mut doc = Document::new();
        let a = generate(&mut doc, None, "a").unwrap();
        let b = generate(&mut doc, None, "b").unwrap();
        assert_eq!(doc.query_class(None, DISCOVERY_CLASS), vec![a, b]);
    }

    #[test]
    fn test_duplicate_id_is_a_caller_error() {
        let mut doc = Document::new();
        generate(&mut doc, None, "total").unwrap();
        assert!(matches!(
            generate(&mut doc, None, "total"),
            Err(RenderError::DuplicateIdentifier(_))
        ));
    }

    #[test]
    fn test_baseline_excludes_animation_library() {
        let baseline = baseline_resources();
        assert_eq!(baseline.len(), 1);
        assert_eq!(baseline[0].name, "spark-outputs");
        assert!(baseline.iter().all(|d| d.name != "countup"));
    }
}

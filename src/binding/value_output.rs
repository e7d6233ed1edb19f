//! The value output binding - the concrete handler for the
//! `spark-output-value` family.
//!
//! Render is a staged commit: every slot is resolved before anything is
//! written, so a structurally broken fragment fails with `MissingSlot` and
//! zero observable changes. Slots resolve against the fragment's own
//! structure - the element id it was generated under, falling back to the
//! slot class within the fragment - so an identifier override changes how
//! records are routed, never how slots are found. When the record carries
//! dynamic resources the binding registers them first and only takes the
//! animated path once every bundle is ready; a pending load downgrades this
//! pass to the plain path
//! and reports `AwaitingResources` so the session can schedule the
//! continuation, and a failed load falls back to plain text permanently
//! rather than leaving the slot empty.

use super::{OutputBinding, RenderOutcome};
use crate::dom::{Document, NodeId};
use crate::error::RenderError;
use crate::markup::{DISCOVERY_CLASS, OVERRIDE_ATTR, slot_class};
use crate::record::{RenderRecord, TITLE_SLOT, VALUE_SLOT, slot_id};
use crate::resource::{ResourceRegistry, ResourceState};

/// Globally unique registration name of this binding.
pub const VALUE_OUTPUT: &str = "spark.value-output";

/// Attribute marking the value slot as animating.
pub const COUNTUP_ATTR: &str = "data-countup";

/// Attribute carrying the animation's end value.
pub const COUNTUP_END_ATTR: &str = "data-countup-end";

/// Handler for the value output family. Stateless - per-instance state
/// (render sequences, parked continuations) belongs to the session.
#[derive(Debug, Default)]
pub struct ValueOutputBinding;

impl ValueOutputBinding {
    /// Boxed handler ready for registration.
    pub fn boxed() -> Box<Self> {
        Box::new(Self)
    }

    /// Resolve a named sub-slot inside `fragment`.
    ///
    /// Tries the deterministic `{element_id}-{slot}` identifier first, then
    /// falls back to the slot class within the fragment. The identifier
    /// override is deliberately not consulted here: it renames the output,
    /// not the markup.
    fn slot_node(&self, doc: &Document, fragment: NodeId, slot: &str) -> Option<NodeId> {
        if let Some(element_id) = &doc.node(fragment).element_id {
            if let Some(node) = doc.get_by_id(&slot_id(element_id, slot)) {
                return Some(node);
            }
        }
        doc.query_class(Some(fragment), &slot_class(slot))
            .into_iter()
            .next()
    }
}

impl OutputBinding for ValueOutputBinding {
    fn discover(&self, doc: &Document, scope: Option<NodeId>) -> Vec<NodeId> {
        doc.query_class(scope, DISCOVERY_CLASS)
    }

    fn identifier(&self, doc: &Document, fragment: NodeId) -> Option<String> {
        if let Some(over) = doc.attr(fragment, OVERRIDE_ATTR) {
            return Some(over.to_string());
        }
        doc.node(fragment).element_id.clone()
    }

    fn render(
        &self,
        doc: &mut Document,
        fragment: NodeId,
        record: &RenderRecord,
        resources: &mut ResourceRegistry,
    ) -> Result<RenderOutcome, RenderError> {
        let id = self
            .identifier(doc, fragment)
            .ok_or_else(|| RenderError::UnknownFragment("<anonymous fragment>".to_string()))?;

        // Resolve every slot before writing anything. A missing slot fails
        // this render call with the fragment untouched.
        let title_node =
            self.slot_node(doc, fragment, TITLE_SLOT)
                .ok_or_else(|| RenderError::MissingSlot {
                    id: id.clone(),
                    slot: TITLE_SLOT,
                })?;
        let value_node =
            self.slot_node(doc, fragment, VALUE_SLOT)
                .ok_or_else(|| RenderError::MissingSlot {
                    id: id.clone(),
                    slot: VALUE_SLOT,
                })?;

        // Register dynamic bundles and decide which value path applies.
        let mut pending = Vec::new();
        let mut failed = false;
        if let Some(descriptors) = &record.resources {
            for descriptor in descriptors {
                match resources.register(descriptor) {
                    ResourceState::Ready => {}
                    ResourceState::Loading => pending.push(descriptor.key()),
                    ResourceState::Failed => failed = true,
                }
            }
        }
        // The animated path requires the record to ask for it AND every
        // bundle to be materialized; anything less is the plain path.
        let animate = record.animate && record.resources.is_some() && pending.is_empty() && !failed;
        if failed {
            log::warn!("output `{id}`: animation resources unavailable, using plain text");
        }

        // Commit. Always replaces prior slot contents, never appends.
        doc.set_text(title_node, &record.title);
        doc.set_attr(fragment, "style", &format!("color: {};", record.color));
        let display = record.display_value();
        if animate {
            doc.set_attr(value_node, COUNTUP_ATTR, "true");
            doc.set_attr(value_node, COUNTUP_END_ATTR, &display);
        } else {
            // Never partially animate: a plain pass clears stale markers.
            doc.remove_attr(value_node, COUNTUP_ATTR);
            doc.remove_attr(value_node, COUNTUP_END_ATTR);
        }
        doc.set_text(value_node, &display);

        // A failed bundle never becomes ready, so nothing is parked for it:
        // the pass is complete on the fallback path.
        if failed || pending.is_empty() {
            Ok(RenderOutcome::Complete)
        } else {
            Ok(RenderOutcome::AwaitingResources(pending))
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

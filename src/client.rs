//! Client session - the single-threaded delivery mechanism.
//!
//! A [`Session`] owns the page document, the binding registry, the resource
//! registry, and the per-instance bookkeeping the protocol needs: render
//! sequence numbers and parked continuations. Inbound records are processed
//! one at a time per instance; records for different instances may arrive in
//! any order and nothing here assumes one.
//!
//! When a render pass suspends on pending resources, the continuation is
//! parked with the sequence number it was created under. A later record for
//! the same instance supersedes it - latest record wins - and completion of
//! the load re-renders only continuations that are still current.

use std::collections::HashMap;

use crate::binding::{BindingRegistry, OutputBinding, RenderOutcome, VALUE_OUTPUT, ValueOutputBinding};
use crate::dom::{Document, NodeId};
use crate::error::{RenderError, ResourceError};
use crate::markup;
use crate::record::{RenderRecord, ResourceKey};
use crate::resource::{ResourceLoader, ResourceRegistry};

// =============================================================================
// Session
// =============================================================================

/// A render pass suspended on resource materialization.
struct PendingRender {
    /// Sequence number the pass was delivered under; a mismatch at
    /// completion time means the pass was superseded.
    sequence: u64,
    binding: String,
    record: RenderRecord,
    awaiting: Vec<ResourceKey>,
}

/// One page session: document, bindings, resources, delivery bookkeeping.
pub struct Session {
    doc: Document,
    bindings: BindingRegistry,
    resources: ResourceRegistry,
    /// Monotonic render sequence per output instance.
    sequences: HashMap<String, u64>,
    /// Parked continuations, at most one per instance (latest wins).
    pending: HashMap<String, PendingRender>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session with the default (immediate) resource loader and the value
    /// output binding pre-registered.
    pub fn new() -> Self {
        Self::with_loader_registry(ResourceRegistry::default())
    }

    /// Session whose resources load through `loader`.
    pub fn with_loader(loader: Box<dyn ResourceLoader>) -> Self {
        Self::with_loader_registry(ResourceRegistry::new(loader))
    }

    fn with_loader_registry(resources: ResourceRegistry) -> Self {
        let mut bindings = BindingRegistry::new();
        bindings.register(VALUE_OUTPUT, ValueOutputBinding::boxed());
        Session {
            doc: Document::new(),
            bindings,
            resources,
            sequences: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    /// The page document.
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// Mutable page document, for host-side markup emission.
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// The resource registry.
    pub fn resources(&self) -> &ResourceRegistry {
        &self.resources
    }

    /// Register a binding (last registration wins).
    pub fn register_binding(&mut self, name: &str, binding: Box<dyn OutputBinding>) {
        self.bindings.register(name, binding);
    }

    /// Generate the placeholder fragment for `id` at document root and
    /// register its baseline resources (deduped across instances).
    pub fn install(&mut self, id: &str) -> Result<NodeId, RenderError> {
        let node = markup::generate(&mut self.doc, None, id)?;
        for descriptor in markup::baseline_resources() {
            self.resources.register(&descriptor);
        }
        Ok(node)
    }

    // =========================================================================
    // Delivery
    // =========================================================================

    /// Deliver one serialized record to output instance `id`.
    ///
    /// Parses at the boundary, bumps the instance's render sequence (which
    /// supersedes any parked continuation), then renders through the named
    /// binding. A failure here affects only this render call.
    pub fn deliver(&mut self, binding_name: &str, id: &str, wire: &str) -> Result<(), RenderError> {
        let record = RenderRecord::from_wire(wire)?;
        self.apply(binding_name, id, record)
    }

    /// Deliver an already-parsed record.
    pub fn apply(
        &mut self,
        binding_name: &str,
        id: &str,
        record: RenderRecord,
    ) -> Result<(), RenderError> {
        let sequence = {
            let entry = self.sequences.entry(id.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        // Latest record wins: any continuation parked for this instance is
        // superseded before the new pass runs.
        self.pending.remove(id);

        match self.render_now(binding_name, id, &record)? {
            RenderOutcome::Complete => {}
            RenderOutcome::AwaitingResources(awaiting) => {
                self.pending.insert(
                    id.to_string(),
                    PendingRender {
                        sequence,
                        binding: binding_name.to_string(),
                        record,
                        awaiting,
                    },
                );
            }
        }
        Ok(())
    }

    /// Report completion of a resource load.
    ///
    /// Flips the bundle's state, then re-renders every parked continuation
    /// that was waiting on it and is still current; superseded continuations
    /// are dropped without touching their fragments. On a failed load the
    /// re-render takes the plain-text fallback path inside the binding.
    pub fn resource_ready(
        &mut self,
        name: &str,
        version: &str,
        result: Result<(), String>,
    ) -> Result<(), ResourceError> {
        self.resources.complete(name, version, result)?;
        let key = ResourceKey {
            name: name.to_string(),
            version: version.to_string(),
        };

        let mut due = Vec::new();
        let ids: Vec<String> = self.pending.keys().cloned().collect();
        for id in ids {
            let Some(parked) = self.pending.get_mut(&id) else {
                continue;
            };
            parked.awaiting.retain(|k| k != &key);
            if parked.awaiting.is_empty() {
                if let Some(parked) = self.pending.remove(&id) {
                    due.push((id, parked));
                }
            }
        }

        for (id, parked) in due {
            // Sequence check: a continuation created under an older sequence
            // must never write into the fragment.
            if self.sequences.get(&id).copied() != Some(parked.sequence) {
                continue;
            }
            if let Err(e) = self.render_now(&parked.binding, &id, &parked.record) {
                log::warn!("output `{id}`: deferred render failed: {e}");
            }
        }
        Ok(())
    }

    /// Resolve the fragment for `id` through `binding_name` and render.
    fn render_now(
        &mut self,
        binding_name: &str,
        id: &str,
        record: &RenderRecord,
    ) -> Result<RenderOutcome, RenderError> {
        let binding = self
            .bindings
            .get(binding_name)
            .ok_or_else(|| RenderError::UnknownBinding(binding_name.to_string()))?;
        let fragment = binding
            .discover(&self.doc, None)
            .into_iter()
            .find(|f| binding.identifier(&self.doc, *f).as_deref() == Some(id))
            .ok_or_else(|| RenderError::UnknownFragment(id.to_string()))?;
        binding.render(&mut self.doc, fragment, record, &mut self.resources)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{COUNTUP_ATTR, COUNTUP_END_ATTR};
    use crate::resource::{DeferredLoader, ResourceState};
    use pretty_assertions::assert_eq;

    fn wire(title: &str, value: f64, animate: bool) -> String {
        let mut record = RenderRecord {
            title: title.to_string(),
            value,
            color: "#ef476f".to_string(),
            animate,
            resources: None,
        };
        if animate {
            record.resources = Some(vec![crate::server::animation_resource()]);
        }
        record.to_wire().unwrap()
    }

    #[test]
    fn test_deliver_plain() {
        let mut session = Session::new();
        session.install("total").unwrap();
        session
            .deliver(VALUE_OUTPUT, "total", &wire("Countries", 95.0, false))
            .unwrap();

        let title = session.doc().get_by_id("total-title").unwrap();
        assert_eq!(session.doc().text(title), "Countries");
    }

    #[test]
    fn test_deliver_unknown_binding() {
        let mut session = Session::new();
        session.install("total").unwrap();
        assert!(matches!(
            session.deliver("nope", "total", &wire("Countries", 95.0, false)),
            Err(RenderError::UnknownBinding(_))
        ));
    }

    #[test]
    fn test_deliver_unknown_fragment() {
        let mut session = Session::new();
        assert!(matches!(
            session.deliver(VALUE_OUTPUT, "total", &wire("Countries", 95.0, false)),
            Err(RenderError::UnknownFragment(_))
        ));
    }

    #[test]
    fn test_baseline_shared_across_installs() {
        let mut session = Session::new();
        session.install("a").unwrap();
        session.install("b").unwrap();
        assert_eq!(session.resources().load_count(), 1);
    }

    #[test]
    fn test_deferred_continuation_animates_when_ready() {
        let mut session = Session::with_loader(Box::new(DeferredLoader));
        session.install("total").unwrap();
        session
            .deliver(VALUE_OUTPUT, "total", &wire("Countries", 95.0, true))
            .unwrap();

        // Plain text visible while the bundle loads.
        let value = session.doc().get_by_id("total-value").unwrap();
        assert_eq!(session.doc().text(value), "95");
        assert_eq!(session.doc().attr(value, COUNTUP_ATTR), None);

        session.resource_ready("countup", "2.8.0", Ok(())).unwrap();
        assert_eq!(session.doc().attr(value, COUNTUP_ATTR), Some("true"));
        assert_eq!(session.doc().attr(value, COUNTUP_END_ATTR), Some("95"));
    }

    #[test]
    fn test_latest_record_wins_over_stale_continuation() {
        let mut session = Session::with_loader(Box::new(DeferredLoader));
        session.install("total").unwrap();

        session
            .deliver(VALUE_OUTPUT, "total", &wire("First", 1.0, true))
            .unwrap();
        session
            .deliver(VALUE_OUTPUT, "total", &wire("Second", 2.0, true))
            .unwrap();
        session.resource_ready("countup", "2.8.0", Ok(())).unwrap();

        let title = session.doc().get_by_id("total-title").unwrap();
        let value = session.doc().get_by_id("total-value").unwrap();
        assert_eq!(session.doc().text(title), "Second");
        assert_eq!(session.doc().text(value), "2");
        assert_eq!(session.doc().attr(value, COUNTUP_END_ATTR), Some("2"));
    }

    #[test]
    fn test_failed_load_falls_back_to_text() {
        let mut session = Session::with_loader(Box::new(DeferredLoader));
        session.install("total").unwrap();
        session
            .deliver(VALUE_OUTPUT, "total", &wire("Countries", 95.0, true))
            .unwrap();
        session
            .resource_ready("countup", "2.8.0", Err("unreachable".to_string()))
            .unwrap();

        let value = session.doc().get_by_id("total-value").unwrap();
        assert_eq!(session.doc().text(value), "95");
        assert_eq!(session.doc().attr(value, COUNTUP_ATTR), None);
        assert_eq!(
            session
                .resources()
                .state(&crate::server::animation_resource().key()),
            Some(ResourceState::Failed)
        );
    }

    #[test]
    fn test_deliver_to_overridden_fragment() {
        let mut session = Session::new();
        let root = session.install("total").unwrap();
        session
            .doc_mut()
            .set_attr(root, crate::markup::OVERRIDE_ATTR, "renamed");

        // Records are routed under the override; the intact fragment still
        // renders through its own markup.
        session
            .deliver(VALUE_OUTPUT, "renamed", &wire("Countries", 95.0, false))
            .unwrap();

        let title = session.doc().get_by_id("total-title").unwrap();
        let value = session.doc().get_by_id("total-value").unwrap();
        assert_eq!(session.doc().text(title), "Countries");
        assert_eq!(session.doc().text(value), "95");

        // The generate-time id no longer routes.
        assert!(matches!(
            session.deliver(VALUE_OUTPUT, "total", &wire("Countries", 95.0, false)),
            Err(RenderError::UnknownFragment(_))
        ));
    }

    #[test]
    fn test_instances_are_independent() {
        let mut session = Session::new();
        session.install("a").unwrap();
        session.install("b").unwrap();

        // Arbitrary interleaving across instances.
        session
            .deliver(VALUE_OUTPUT, "b", &wire("B", 2.0, false))
            .unwrap();
        session
            .deliver(VALUE_OUTPUT, "a", &wire("A", 1.0, false))
            .unwrap();

        let a = session.doc().get_by_id("a-title").unwrap();
        let b = session.doc().get_by_id("b-title").unwrap();
        assert_eq!(session.doc().text(a), "A");
        assert_eq!(session.doc().text(b), "B");
    }
}

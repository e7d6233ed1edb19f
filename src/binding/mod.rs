//! Output bindings - discovery, identification, and rendering of fragments.
//!
//! A binding is the client half of the protocol: it finds the placeholder
//! fragments of its output family, derives their identifiers, and renders
//! inbound records into them. Bindings register under a globally unique name
//! in an explicit [`BindingRegistry`] owned by the page session - no ambient
//! global table.

mod value_output;

pub use value_output::{COUNTUP_ATTR, COUNTUP_END_ATTR, VALUE_OUTPUT, ValueOutputBinding};

use std::collections::HashMap;

use crate::dom::{Document, NodeId};
use crate::error::RenderError;
use crate::record::{RenderRecord, ResourceKey};
use crate::resource::ResourceRegistry;

// =============================================================================
// Binding Contract
// =============================================================================

/// Result of one render call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The fragment reached its fully-consistent target state.
    Complete,
    /// Slots were written via the plain path, but the animated path is
    /// suspended on these bundles; the session schedules a continuation for
    /// when they become ready.
    AwaitingResources(Vec<ResourceKey>),
}

/// The registered handler for one output family.
pub trait OutputBinding {
    /// Every fragment under `scope` (or the whole document) bearing this
    /// binding's discovery marker, in document order. Idempotent and
    /// side-effect-free.
    fn discover(&self, doc: &Document, scope: Option<NodeId>) -> Vec<NodeId>;

    /// The fragment's output identifier: the override attribute when
    /// present, else the element id. Pure.
    fn identifier(&self, doc: &Document, fragment: NodeId) -> Option<String>;

    /// Render a freshly received record into a previously discovered
    /// fragment. Sub-slot writes are atomic from the caller's perspective:
    /// either the fragment reaches a fully-consistent state or none of its
    /// slots change.
    fn render(
        &self,
        doc: &mut Document,
        fragment: NodeId,
        record: &RenderRecord,
        resources: &mut ResourceRegistry,
    ) -> Result<RenderOutcome, RenderError>;
}

// =============================================================================
// Registry
// =============================================================================

/// Name → handler table for one page session.
///
/// Duplicate registration policy: last registration wins; the previous
/// handler is dropped and the overwrite is logged. Never an error.
#[derive(Default)]
pub struct BindingRegistry {
    bindings: HashMap<String, Box<dyn OutputBinding>>,
}

impl BindingRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `binding` under `name`, replacing any previous handler.
    pub fn register(&mut self, name: &str, binding: Box<dyn OutputBinding>) {
        if self.bindings.insert(name.to_string(), binding).is_some() {
            log::debug!("binding `{name}` re-registered; last registration wins");
        }
    }

    /// Look up a handler by name.
    pub fn get(&self, name: &str) -> Option<&dyn OutputBinding> {
        self.bindings.get(name).map(Box::as_ref)
    }

    /// Whether a handler is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    struct Inert(&'static str);

    impl OutputBinding for Inert {
        fn discover(&self, _doc: &Document, _scope: Option<NodeId>) -> Vec<NodeId> {
            Vec::new()
        }

        fn identifier(&self, _doc: &Document, _fragment: NodeId) -> Option<String> {
            Some(self.0.to_string())
        }

        fn render(
            &self,
            _doc: &mut Document,
            _fragment: NodeId,
            _record: &RenderRecord,
            _resources: &mut ResourceRegistry,
        ) -> Result<RenderOutcome, RenderError> {
            Ok(RenderOutcome::Complete)
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = BindingRegistry::new();
        registry.register("inert", Box::new(Inert("first")));
        assert!(registry.contains("inert"));
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = BindingRegistry::new();
        let doc = Document::new();
        let probe = {
            let mut d = Document::new();
            d.create_element("div")
        };

        registry.register("inert", Box::new(Inert("first")));
        registry.register("inert", Box::new(Inert("second")));

        let binding = registry.get("inert").unwrap();
        assert_eq!(binding.identifier(&doc, probe), Some("second".to_string()));
    }
}

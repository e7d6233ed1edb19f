//! Resource delivery - content-addressed registration and materialization.
//!
//! The registry dedups by `(name, version)`: the first registration of a
//! bundle hands it to the loader, every later registration of the same
//! identity is a no-op that reports the current state. Redundant attachment
//! across many output instances is therefore free.
//!
//! Materialization may be asynchronous. The [`ResourceLoader`] seam decides:
//! [`ImmediateLoader`] resolves at registration time (assets already on the
//! page), [`DeferredLoader`] leaves bundles `Loading` until the driver calls
//! [`ResourceRegistry::complete`] - the shape of a network fetch.

use std::collections::HashMap;

use crate::error::ResourceError;
use crate::record::{ResourceDescriptor, ResourceKey};

// =============================================================================
// Loader Seam
// =============================================================================

/// Materialization state of a registered bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Registered, assets not yet available.
    Loading,
    /// Assets available; capabilities may be used.
    Ready,
    /// Load failed; capabilities stay unavailable and callers must fall back.
    Failed,
}

/// Decides how a newly registered bundle is fetched.
pub trait ResourceLoader {
    /// Begin loading `descriptor`; returns the state it starts in.
    fn load(&mut self, descriptor: &ResourceDescriptor) -> ResourceState;
}

/// Loader for assets that are already on the page: every bundle is `Ready`
/// the moment it is registered.
#[derive(Debug, Default)]
pub struct ImmediateLoader;

impl ResourceLoader for ImmediateLoader {
    fn load(&mut self, _descriptor: &ResourceDescriptor) -> ResourceState {
        ResourceState::Ready
    }
}

/// Loader that models an asynchronous fetch: bundles stay `Loading` until
/// the driver reports completion through [`ResourceRegistry::complete`].
#[derive(Debug, Default)]
pub struct DeferredLoader;

impl ResourceLoader for DeferredLoader {
    fn load(&mut self, _descriptor: &ResourceDescriptor) -> ResourceState {
        ResourceState::Loading
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Content-addressed resource registry.
pub struct ResourceRegistry {
    loader: Box<dyn ResourceLoader>,
    states: HashMap<ResourceKey, ResourceState>,
    descriptors: HashMap<ResourceKey, ResourceDescriptor>,
    /// Registration order, for deterministic tag emission.
    order: Vec<ResourceKey>,
    loads: usize,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new(Box::new(ImmediateLoader))
    }
}

impl ResourceRegistry {
    /// Registry with the given loader behind the seam.
    pub fn new(loader: Box<dyn ResourceLoader>) -> Self {
        ResourceRegistry {
            loader,
            states: HashMap::new(),
            descriptors: HashMap::new(),
            order: Vec::new(),
            loads: 0,
        }
    }

    /// Register a bundle and return its materialization state.
    ///
    /// First registration of a `(name, version)` identity starts the load;
    /// every later registration is a dedup no-op reporting the current state.
    pub fn register(&mut self, descriptor: &ResourceDescriptor) -> ResourceState {
        let key = descriptor.key();
        if let Some(state) = self.states.get(&key) {
            return *state;
        }
        let state = self.loader.load(descriptor);
        log::debug!("registered resource {key} ({state:?})");
        self.loads += 1;
        self.states.insert(key.clone(), state);
        self.descriptors.insert(key.clone(), descriptor.clone());
        self.order.push(key);
        state
    }

    /// Current state of a bundle, if registered.
    pub fn state(&self, key: &ResourceKey) -> Option<ResourceState> {
        self.states.get(key).copied()
    }

    /// Report load completion for a pending bundle.
    ///
    /// Flips the bundle to `Ready` or `Failed` and returns the new state so
    /// the delivery layer can run parked continuations.
    ///
    /// # Errors
    ///
    /// [`ResourceError::Unknown`] when no such bundle was registered.
    pub fn complete(
        &mut self,
        name: &str,
        version: &str,
        result: Result<(), String>,
    ) -> Result<ResourceState, ResourceError> {
        let key = ResourceKey {
            name: name.to_string(),
            version: version.to_string(),
        };
        let Some(state) = self.states.get_mut(&key) else {
            return Err(ResourceError::Unknown {
                name: key.name,
                version: key.version,
            });
        };
        *state = match result {
            Ok(()) => ResourceState::Ready,
            Err(reason) => {
                log::warn!("resource {key} failed to load: {reason}");
                ResourceState::Failed
            }
        };
        Ok(*state)
    }

    /// How many distinct bundles have been handed to the loader.
    ///
    /// Dedup property: registering the same identity N times counts once.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    /// Script/style tags for every registered bundle, in registration order.
    ///
    /// This is what the page emitter inlines; dedup already happened at
    /// registration so each asset appears once.
    pub fn tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        for key in &self.order {
            let Some(descriptor) = self.descriptors.get(key) else {
                continue;
            };
            for style in &descriptor.styles {
                tags.push(format!(r#"<link rel="stylesheet" href="{style}">"#));
            }
            for script in &descriptor.scripts {
                tags.push(format!(r#"<script src="{script}"></script>"#));
            }
        }
        tags
    }
}

// =============================================================================
// Tests
// =============================================================================

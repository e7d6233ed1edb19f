//! # spark-outputs
//!
//! Reactive output binding protocol for server-driven UI fragments.
//!
//! Built on [spark-signals](https://github.com/RLabs-Inc/spark-signals) at the
//! host boundary for fine-grained reactivity.
//!
//! ## Architecture
//!
//! A server-side computation produces typed, styled records; a client-side
//! binding discovers placeholder fragments, renders records into their named
//! sub-slots, and materializes extra runtime resources on demand - only for
//! render passes that actually need them.
//!
//! ```text
//! Producer → wrap() → RenderFn → ReactiveHost effect → wire record
//!                                                          ↓
//! generate() fragment ← Session.deliver() ← transport ←────┘
//! ```
//!
//! ## Modules
//!
//! - [`producer`] - Value producer (aggregation, palette defaulting)
//! - [`server`] - Server renderer: `wrap`, outputs table, reactive host shim
//! - [`markup`] - Placeholder fragment generator + baseline resources
//! - [`binding`] - Client binding contract, registry, value output handler
//! - [`resource`] - Content-addressed resource registry and loader seam
//! - [`client`] - Page session: delivery, staleness, parked continuations
//! - [`dom`] - Arena document the client side renders into
//! - [`record`] - Wire types ([`RenderRecord`], [`ResourceDescriptor`])
//! - [`error`] - Protocol error types

pub mod binding;
pub mod client;
pub mod dom;
pub mod error;
pub mod markup;
pub mod producer;
pub mod record;
pub mod resource;
pub mod server;

// Re-export commonly used items
pub use binding::{BindingRegistry, OutputBinding, RenderOutcome, VALUE_OUTPUT, ValueOutputBinding};
pub use client::Session;
pub use dom::{Document, NodeId};
pub use error::{RecordError, RenderError, ResourceError};
pub use markup::{DISCOVERY_CLASS, baseline_resources, generate};
pub use producer::{Aggregate, OutputParams, Palette, Producer, ValueInput};
pub use record::{RenderRecord, ResourceDescriptor, ResourceKey, slot_id};
pub use resource::{
    DeferredLoader, ImmediateLoader, ResourceLoader, ResourceRegistry, ResourceState,
};
pub use server::{Outputs, ReactiveHost, RenderFn, animation_resource, wrap};

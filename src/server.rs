//! Server renderer - wraps computations into render functions and binds
//! them to a reactive host.
//!
//! [`wrap`] turns an arbitrary record-producing computation into a
//! `RenderFn` the host invokes once per re-evaluation. Each invocation
//! evaluates the computation exactly once, validates the record, and
//! conditionally attaches the animation bundle - records that do not
//! animate never carry it, so the dependency is never shipped for that
//! pass. Computation failures propagate unmodified: no retry, no default
//! record, no partial record.
//!
//! [`ReactiveHost`] is the interface-boundary shim to spark-signals: one
//! effect per served output re-runs the render function when its signal
//! dependencies change and pushes `(id, wire)` payloads into an outbox for
//! the transport to drain.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use spark_signals::effect;

use crate::error::{RecordError, RenderError};
use crate::record::{RenderRecord, ResourceDescriptor};

// =============================================================================
// Render Functions
// =============================================================================

/// A render function: invoked by the reactive host once per re-evaluation,
/// yields one fully-populated record ready for serialization.
pub type RenderFn = Box<dyn FnMut() -> Result<RenderRecord, RenderError>>;

/// Descriptor for the count-up animation library.
///
/// Attached dynamically, per render pass, only when the record animates.
pub fn animation_resource() -> ResourceDescriptor {
    ResourceDescriptor {
        name: "countup".to_string(),
        version: "2.8.0".to_string(),
        scripts: vec!["countup/countup.umd.js".to_string()],
        styles: vec![],
    }
}

/// Wrap a computation into a [`RenderFn`].
///
/// Per invocation:
/// 1. evaluate `computation` exactly once; a malformed record fails the
///    pass with [`RenderError::Malformed`];
/// 2. attach the animation descriptor under `resources` when the record
///    animates, otherwise leave the field out entirely.
///
/// `wrap` holds no shared mutable state across invocations; synchronizing a
/// computation's side effects is the computation owner's business.
pub fn wrap<C>(mut computation: C) -> RenderFn
where
    C: FnMut() -> Result<RenderRecord, RecordError> + 'static,
{
    Box::new(move || {
        let mut record = computation()?;
        record.validate()?;
        record.resources = if record.animate {
            Some(vec![animation_resource()])
        } else {
            None
        };
        Ok(record)
    })
}

// =============================================================================
// Outputs Table
// =============================================================================

/// The host's assignment point: `outputs.insert(id, render_fn)` is the
/// `outputs[id] = RenderFunction` of the host contract.
#[derive(Default)]
pub struct Outputs {
    table: HashMap<String, RenderFn>,
}

impl Outputs {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the render function for `id`, replacing any previous one.
    pub fn insert(&mut self, id: &str, render: RenderFn) {
        self.table.insert(id.to_string(), render);
    }

    /// Remove and return the render function for `id`.
    pub fn remove(&mut self, id: &str) -> Option<RenderFn> {
        self.table.remove(id)
    }

    /// Whether an output is assigned under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.table.contains_key(id)
    }

    /// Invoke the render function for `id` once.
    pub fn render(&mut self, id: &str) -> Option<Result<RenderRecord, RenderError>> {
        self.table.get_mut(id).map(|render| render())
    }

    /// Drain the table, yielding `(id, render_fn)` pairs for a host to serve.
    pub fn drain(&mut self) -> Vec<(String, RenderFn)> {
        self.table.drain().collect()
    }
}

// =============================================================================
// Reactive Host
// =============================================================================

/// Effect-driven host shim.
///
/// Serving an output creates one spark-signals effect that re-invokes the
/// render function whenever a signal it read changes, serializes the record,
/// and queues the payload. The transport drains the outbox and delivers each
/// payload to the client session under the same id.
pub struct ReactiveHost {
    outbox: Rc<RefCell<VecDeque<(String, String)>>>,
    errors: Rc<RefCell<VecDeque<(String, RenderError)>>>,
    stops: Vec<(String, Box<dyn FnOnce()>)>,
}

impl Default for ReactiveHost {
    fn default() -> Self {
        Self::new()
    }
}

impl ReactiveHost {
    /// Host with empty outboxes.
    pub fn new() -> Self {
        ReactiveHost {
            outbox: Rc::new(RefCell::new(VecDeque::new())),
            errors: Rc::new(RefCell::new(VecDeque::new())),
            stops: Vec::new(),
        }
    }

    /// Serve one output: re-render on dependency change, queue the payload.
    ///
    /// A failing pass queues nothing on the payload outbox; the failure is
    /// queued on the error outbox (and logged) so the host can observe it
    /// programmatically. It is not retried until its dependencies change
    /// again.
    pub fn serve(&mut self, id: &str, mut render: RenderFn) {
        let outbox = Rc::clone(&self.outbox);
        let errors = Rc::clone(&self.errors);
        let owned_id = id.to_string();
        let stop = effect(move || {
            let pass = render().and_then(|record| record.to_wire().map_err(RenderError::from));
            match pass {
                Ok(payload) => outbox.borrow_mut().push_back((owned_id.clone(), payload)),
                Err(e) => {
                    log::warn!("output `{owned_id}`: render pass failed: {e}");
                    errors.borrow_mut().push_back((owned_id.clone(), e));
                }
            }
        });
        self.stops.push((id.to_string(), Box::new(stop)));
    }

    /// Serve every output in the table.
    pub fn serve_all(&mut self, outputs: &mut Outputs) {
        for (id, render) in outputs.drain() {
            self.serve(&id, render);
        }
    }

    /// Take every queued `(id, wire)` payload, oldest first.
    pub fn drain(&mut self) -> Vec<(String, String)> {
        self.outbox.borrow_mut().drain(..).collect()
    }

    /// Take every queued `(id, error)` render failure, oldest first.
    pub fn drain_errors(&mut self) -> Vec<(String, RenderError)> {
        self.errors.borrow_mut().drain(..).collect()
    }

    /// Stop serving `id` (runs the effect's stop function).
    pub fn stop(&mut self, id: &str) {
        let stops = std::mem::take(&mut self.stops);
        for (name, stop) in stops {
            if name == id {
                stop();
            } else {
                self.stops.push((name, stop));
            }
        }
    }

    /// Stop serving everything.
    pub fn shutdown(mut self) {
        for (_, stop) in self.stops.drain(..) {
            stop();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Model lifecycle events
//!
//! Every lifecycle transition of a model is published to the [`EventSink`]
//! held by its [`Context`](crate::Context) under the hook name
//! `"{hook_prefix}/{object_type}/{event}"`. Events ending in `-ing` are
//! filters: any listener returning [`Outcome::Cancel`] aborts the operation.
//! The remaining events are actions whose outcome is ignored.
//!
//! Listeners only ever see a read-only [`EventContext`], so they cannot
//! re-enter `save` on the entity being saved.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::debug;

use crate::attributes::AttributeStore;
use crate::observers::{ModelObserver, ObserverRegistry};
use crate::value::Row;

/// Result of a cancellable event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Proceed,
    Cancel,
}

impl Outcome {
    pub fn is_cancel(self) -> bool {
        self == Outcome::Cancel
    }
}

impl From<bool> for Outcome {
    fn from(proceed: bool) -> Self {
        if proceed {
            Outcome::Proceed
        } else {
            Outcome::Cancel
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEvent {
    Booting,
    Booted,
    Retrieved,
    Saving,
    Saved,
    Creating,
    Created,
    Updating,
    Updated,
    Deleting,
    Deleted,
}

impl ModelEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelEvent::Booting => "booting",
            ModelEvent::Booted => "booted",
            ModelEvent::Retrieved => "retrieved",
            ModelEvent::Saving => "saving",
            ModelEvent::Saved => "saved",
            ModelEvent::Creating => "creating",
            ModelEvent::Created => "created",
            ModelEvent::Updating => "updating",
            ModelEvent::Updated => "updated",
            ModelEvent::Deleting => "deleting",
            ModelEvent::Deleted => "deleted",
        }
    }

    /// Whether listeners may cancel the operation this event precedes
    pub fn is_cancellable(&self) -> bool {
        matches!(
            self,
            ModelEvent::Saving | ModelEvent::Creating | ModelEvent::Updating | ModelEvent::Deleting
        )
    }
}

impl fmt::Display for ModelEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a hook name: `"{prefix}/{object_type}/{event}"`
pub fn hook_name(prefix: &str, object_type: &str, event: &str) -> String {
    format!("{}/{}/{}", prefix, object_type, event)
}

/// Read-only view of a model handed to listeners
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub event: ModelEvent,
    pub hook: &'a str,
    pub object_type: &'a str,
    /// Type name of the concrete model
    pub model: &'static str,
    /// Absent for the boot events, which fire before any instance exists
    pub attributes: Option<&'a AttributeStore>,
    pub exists: bool,
}

impl<'a> EventContext<'a> {
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.attributes.and_then(|attributes| attributes.get(key))
    }

    /// Changes committed by the update that fired this event
    pub fn changes(&self) -> Option<&'a Row> {
        self.attributes.map(AttributeStore::get_changes)
    }

    pub fn is_dirty(&self, keys: &[&str]) -> bool {
        self.attributes
            .map_or(false, |attributes| attributes.is_dirty(keys))
    }
}

/// Host of the hook system models publish to
pub trait EventSink: Send + Sync {
    /// Fire a non-cancellable event
    fn action(&self, event: &EventContext<'_>);

    /// Fire a cancellable event
    fn filter(&self, event: &EventContext<'_>) -> Outcome;

    /// Filter an attribute value before it is stored
    fn sanitize(&self, _hook: &str, _key: &str, value: Value) -> Value {
        value
    }
}

/// Sink that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn action(&self, _event: &EventContext<'_>) {}

    fn filter(&self, _event: &EventContext<'_>) -> Outcome {
        Outcome::Proceed
    }
}

type Listener = Arc<dyn Fn(&EventContext<'_>) -> Outcome + Send + Sync>;
type AttributeFilter = Arc<dyn Fn(&str, Value) -> Value + Send + Sync>;

/// In-process event sink with closures registered per hook name
#[derive(Default)]
pub struct Dispatcher {
    listeners: DashMap<String, Vec<Listener>>,
    sanitizers: DashMap<String, Vec<AttributeFilter>>,
    observers: ObserverRegistry,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.listeners.len())
            .field("sanitizers", &self.sanitizers.len())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener that may cancel filter events
    pub fn listen<F>(&self, hook: &str, listener: F) -> &Self
    where
        F: Fn(&EventContext<'_>) -> Outcome + Send + Sync + 'static,
    {
        self.listeners
            .entry(hook.to_string())
            .or_default()
            .push(Arc::new(listener));
        self
    }

    /// Register a listener that only observes
    pub fn on<F>(&self, hook: &str, listener: F) -> &Self
    where
        F: Fn(&EventContext<'_>) + Send + Sync + 'static,
    {
        self.listen(hook, move |event| {
            listener(event);
            Outcome::Proceed
        })
    }

    /// Register an attribute filter, applied in registration order
    pub fn add_sanitizer<F>(&self, hook: &str, sanitizer: F) -> &Self
    where
        F: Fn(&str, Value) -> Value + Send + Sync + 'static,
    {
        self.sanitizers
            .entry(hook.to_string())
            .or_default()
            .push(Arc::new(sanitizer));
        self
    }

    /// Register an observer for the model type `M`
    pub fn observe<M: 'static>(&self, observer: impl ModelObserver + 'static) -> &Self {
        self.observers.register_for::<M>(Arc::new(observer));
        self
    }

    pub fn observers(&self) -> &ObserverRegistry {
        &self.observers
    }

    pub fn listener_count(&self, hook: &str) -> usize {
        self.listeners.get(hook).map_or(0, |listeners| listeners.len())
    }

    /// Snapshot the listeners so none are held locked while they run
    fn listeners_for(&self, hook: &str) -> Vec<Listener> {
        self.listeners
            .get(hook)
            .map(|listeners| listeners.value().clone())
            .unwrap_or_default()
    }
}

impl EventSink for Dispatcher {
    fn action(&self, event: &EventContext<'_>) {
        for listener in self.listeners_for(event.hook) {
            listener(event);
        }

        self.observers.notify(event);
    }

    fn filter(&self, event: &EventContext<'_>) -> Outcome {
        for listener in self.listeners_for(event.hook) {
            if listener(event).is_cancel() {
                debug!(hook = event.hook, model = event.model, "Event cancelled by listener");
                return Outcome::Cancel;
            }
        }

        let outcome = self.observers.notify(event);
        if outcome.is_cancel() {
            debug!(hook = event.hook, model = event.model, "Event cancelled by observer");
        }
        outcome
    }

    fn sanitize(&self, hook: &str, key: &str, value: Value) -> Value {
        let sanitizers = self
            .sanitizers
            .get(hook)
            .map(|sanitizers| sanitizers.value().clone())
            .unwrap_or_default();

        sanitizers
            .iter()
            .fold(value, |value, sanitize| sanitize(key, value))
    }
}

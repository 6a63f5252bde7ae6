//! Per-model-type observers notified of lifecycle events

use std::any::type_name;
use std::sync::Arc;

use dashmap::DashMap;

use crate::events::{EventContext, ModelEvent, Outcome};

/// Typed listener for the lifecycle events of one model type.
///
/// The `-ing` hooks may return [`Outcome::Cancel`] to abort the operation.
pub trait ModelObserver: Send + Sync {
    fn retrieved(&self, _event: &EventContext<'_>) {}

    fn saving(&self, _event: &EventContext<'_>) -> Outcome {
        Outcome::Proceed
    }

    fn saved(&self, _event: &EventContext<'_>) {}

    fn creating(&self, _event: &EventContext<'_>) -> Outcome {
        Outcome::Proceed
    }

    fn created(&self, _event: &EventContext<'_>) {}

    fn updating(&self, _event: &EventContext<'_>) -> Outcome {
        Outcome::Proceed
    }

    fn updated(&self, _event: &EventContext<'_>) {}

    fn deleting(&self, _event: &EventContext<'_>) -> Outcome {
        Outcome::Proceed
    }

    fn deleted(&self, _event: &EventContext<'_>) {}
}

/// Observers grouped by the model type they watch
#[derive(Default)]
pub struct ObserverRegistry {
    observers: DashMap<&'static str, Vec<Arc<dyn ModelObserver>>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_for<M: 'static>(&self, observer: Arc<dyn ModelObserver>) {
        self.observers
            .entry(type_name::<M>())
            .or_default()
            .push(observer);
    }

    pub fn has_observers_for<M: 'static>(&self) -> bool {
        self.observer_count::<M>() > 0
    }

    pub fn observer_count<M: 'static>(&self) -> usize {
        self.observers
            .get(type_name::<M>())
            .map_or(0, |observers| observers.len())
    }

    /// Deliver an event to the observers of its model, in registration order.
    ///
    /// The first observer cancelling a cancellable event stops delivery.
    pub fn notify(&self, event: &EventContext<'_>) -> Outcome {
        let observers = match self.observers.get(event.model) {
            Some(observers) => observers.value().clone(),
            None => return Outcome::Proceed,
        };

        for observer in observers {
            let outcome = match event.event {
                ModelEvent::Saving => observer.saving(event),
                ModelEvent::Creating => observer.creating(event),
                ModelEvent::Updating => observer.updating(event),
                ModelEvent::Deleting => observer.deleting(event),
                ModelEvent::Retrieved => {
                    observer.retrieved(event);
                    Outcome::Proceed
                }
                ModelEvent::Saved => {
                    observer.saved(event);
                    Outcome::Proceed
                }
                ModelEvent::Created => {
                    observer.created(event);
                    Outcome::Proceed
                }
                ModelEvent::Updated => {
                    observer.updated(event);
                    Outcome::Proceed
                }
                ModelEvent::Deleted => {
                    observer.deleted(event);
                    Outcome::Proceed
                }
                ModelEvent::Booting | ModelEvent::Booted => Outcome::Proceed,
            };

            if outcome.is_cancel() {
                return Outcome::Cancel;
            }
        }

        Outcome::Proceed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeStore;
    use std::sync::Mutex;

    struct TestPost;
    struct TestTerm;

    #[derive(Clone)]
    struct EventTracker {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl EventTracker {
        fn new() -> Self {
            Self {
                events: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn track(&self, event: &str) {
            self.events.lock().unwrap().push(event.to_string());
        }

        fn get_events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    struct TrackingObserver {
        tracker: EventTracker,
        name: String,
    }

    impl TrackingObserver {
        fn new(name: &str, tracker: EventTracker) -> Self {
            Self {
                tracker,
                name: name.to_string(),
            }
        }
    }

    impl ModelObserver for TrackingObserver {
        fn creating(&self, event: &EventContext<'_>) -> Outcome {
            self.tracker.track(&format!("{}: creating {}", self.name, event.object_type));
            Outcome::Proceed
        }

        fn created(&self, event: &EventContext<'_>) {
            self.tracker.track(&format!("{}: created {}", self.name, event.object_type));
        }
    }

    struct VetoObserver;

    impl ModelObserver for VetoObserver {
        fn creating(&self, _event: &EventContext<'_>) -> Outcome {
            Outcome::Cancel
        }
    }

    fn event<'a>(event: ModelEvent, model: &'static str, attributes: &'a AttributeStore) -> EventContext<'a> {
        EventContext {
            event,
            hook: "wp/post/creating",
            object_type: "post",
            model,
            attributes: Some(attributes),
            exists: false,
        }
    }

    #[test]
    fn test_observer_registry_register() {
        let registry = ObserverRegistry::new();
        assert!(!registry.has_observers_for::<TestPost>());

        let tracker = EventTracker::new();
        registry.register_for::<TestPost>(Arc::new(TrackingObserver::new("observer1", tracker.clone())));
        registry.register_for::<TestPost>(Arc::new(TrackingObserver::new("observer2", tracker)));

        assert_eq!(registry.observer_count::<TestPost>(), 2);
        assert!(!registry.has_observers_for::<TestTerm>());
    }

    #[test]
    fn test_observer_registry_execution_order() {
        let registry = ObserverRegistry::new();
        let tracker = EventTracker::new();
        registry.register_for::<TestPost>(Arc::new(TrackingObserver::new("observer1", tracker.clone())));
        registry.register_for::<TestPost>(Arc::new(TrackingObserver::new("observer2", tracker.clone())));

        let attributes = AttributeStore::default();
        let outcome = registry.notify(&event(ModelEvent::Creating, type_name::<TestPost>(), &attributes));

        assert_eq!(outcome, Outcome::Proceed);
        assert_eq!(
            tracker.get_events(),
            vec!["observer1: creating post", "observer2: creating post"]
        );
    }

    #[test]
    fn test_cancel_stops_execution() {
        let registry = ObserverRegistry::new();
        let tracker = EventTracker::new();
        registry.register_for::<TestPost>(Arc::new(VetoObserver));
        registry.register_for::<TestPost>(Arc::new(TrackingObserver::new("observer2", tracker.clone())));

        let attributes = AttributeStore::default();
        let outcome = registry.notify(&event(ModelEvent::Creating, type_name::<TestPost>(), &attributes));

        assert_eq!(outcome, Outcome::Cancel);
        assert!(tracker.get_events().is_empty());
    }

    #[test]
    fn test_observers_are_scoped_to_model_type() {
        let registry = ObserverRegistry::new();
        let tracker = EventTracker::new();
        registry.register_for::<TestPost>(Arc::new(TrackingObserver::new("posts", tracker.clone())));

        let attributes = AttributeStore::default();
        registry.notify(&event(ModelEvent::Created, type_name::<TestTerm>(), &attributes));
        assert!(tracker.get_events().is_empty());

        registry.notify(&event(ModelEvent::Created, type_name::<TestPost>(), &attributes));
        assert_eq!(tracker.get_events(), vec!["posts: created post"]);
    }
}

//! Entity lifecycle events and listener registration.
//!
//! The persistence layer owns a [`LifecycleHub`] and calls
//! [`LifecycleHub::notify`] after each committed write. Listeners are
//! registered explicitly and awaited one after another, so by the time the
//! write call returns every listener has run.
//!
//! ```ignore
//! let mut hub = LifecycleHub::<Property>::new();
//! hub.subscribe(Arc::new(InvalidationListener::new(backend, config)));
//!
//! // inside the repository, after commit:
//! hub.notify(&LifecycleEvent::Updated { id: property.id }).await;
//! ```

use crate::entity::Entity;
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// A committed write to an entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent<Id> {
    Created { id: Id },
    Updated { id: Id },
    Deleted { id: Id },
}

impl<Id> LifecycleEvent<Id> {
    pub fn id(&self) -> &Id {
        match self {
            LifecycleEvent::Created { id }
            | LifecycleEvent::Updated { id }
            | LifecycleEvent::Deleted { id } => id,
        }
    }

    /// Past-tense verb for log lines.
    pub fn verb(&self) -> &'static str {
        match self {
            LifecycleEvent::Created { .. } => "created",
            LifecycleEvent::Updated { .. } => "updated",
            LifecycleEvent::Deleted { .. } => "deleted",
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, LifecycleEvent::Deleted { .. })
    }
}

impl<Id: fmt::Display> fmt::Display for LifecycleEvent<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id(), self.verb())
    }
}

/// Receiver of post-commit lifecycle events.
///
/// Listeners must not fail the write that triggered them, so `on_event`
/// has no error channel: a listener logs and absorbs its own failures.
pub trait LifecycleListener<T: Entity>: Send + Sync {
    fn on_event<'a>(&'a self, event: &'a LifecycleEvent<T::Id>) -> BoxFuture<'a, ()>;
}

/// Ordered set of listeners for one entity type.
pub struct LifecycleHub<T: Entity> {
    listeners: Vec<Arc<dyn LifecycleListener<T>>>,
}

impl<T: Entity> LifecycleHub<T> {
    pub fn new() -> Self {
        LifecycleHub {
            listeners: Vec::new(),
        }
    }

    /// Register a listener. Listeners run in registration order.
    pub fn subscribe(&mut self, listener: Arc<dyn LifecycleListener<T>>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Deliver an event to every listener, awaiting each in turn.
    pub async fn notify(&self, event: &LifecycleEvent<T::Id>) {
        debug!(
            "Dispatching {} {} to {} listener(s)",
            T::entity_name(),
            event,
            self.listeners.len()
        );
        for listener in &self.listeners {
            listener.on_event(event).await;
        }
    }
}

impl<T: Entity> Default for LifecycleHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Property;
    use futures::FutureExt;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl LifecycleListener<Property> for Recorder {
        fn on_event<'a>(&'a self, event: &'a LifecycleEvent<u64>) -> BoxFuture<'a, ()> {
            async move {
                self.seen
                    .lock()
                    .unwrap()
                    .push(format!("{}:{}", self.name, event));
            }
            .boxed()
        }
    }

    #[test]
    fn test_event_accessors() {
        let event = LifecycleEvent::Deleted { id: 9u64 };
        assert_eq!(*event.id(), 9);
        assert_eq!(event.verb(), "deleted");
        assert!(event.is_delete());
        assert_eq!(event.to_string(), "9 deleted");
        assert!(!LifecycleEvent::Created { id: 1u64 }.is_delete());
    }

    #[tokio::test]
    async fn test_hub_notifies_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut hub = LifecycleHub::<Property>::new();
        hub.subscribe(Arc::new(Recorder {
            name: "first",
            seen: seen.clone(),
        }));
        hub.subscribe(Arc::new(Recorder {
            name: "second",
            seen: seen.clone(),
        }));
        assert_eq!(hub.len(), 2);

        hub.notify(&LifecycleEvent::Updated { id: 3 }).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:3 updated".to_string(), "second:3 updated".to_string()]
        );
    }

    #[tokio::test]
    async fn test_empty_hub_is_noop() {
        let hub = LifecycleHub::<Property>::default();
        assert!(hub.is_empty());
        hub.notify(&LifecycleEvent::Created { id: 1 }).await;
    }
}

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Mutex, MutexGuard,
};

/// A persistent delivery callback.
pub type Listener<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Unique across every registry in the process, so an id handed to the
/// wrong channel matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Callbacks registered on one delivery channel.
///
/// Dispatch copies the listener list before calling anything, so a listener
/// may register or remove listeners (on any registry) while being invoked.
pub struct ListenerRegistry<T> {
    listeners: Mutex<Vec<(ListenerId, Listener<T>)>>,
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }
}

impl<T: Clone> ListenerRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, listener: Listener<T>) -> ListenerId {
        let id = ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, listener));
        id
    }

    /// Returns `false` when `id` was not registered here.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut guard = self.lock();
        let before = guard.len();
        guard.retain(|(existing, _)| *existing != id);
        guard.len() != before
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Current listeners in registration order.
    pub fn snapshot(&self) -> Vec<Listener<T>> {
        self.lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    /// Invokes every listener with its own clone of `value`. Returns how many were reached.
    pub fn dispatch(&self, value: T) -> usize {
        let listeners = self.snapshot();
        for listener in &listeners {
            listener(value.clone());
        }
        listeners.len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(ListenerId, Listener<T>)>> {
        match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collecting(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Listener<u64> {
        let log = Arc::clone(log);
        Arc::new(move |value: u64| log.lock().unwrap().push(format!("{tag}:{value}")))
    }

    #[test]
    fn dispatch_follows_registration_order() {
        let registry = ListenerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        registry.register(collecting(&log, "a"));
        registry.register(collecting(&log, "b"));

        assert_eq!(registry.dispatch(5), 2);
        assert_eq!(*log.lock().unwrap(), vec!["a:5", "b:5"]);
    }

    #[test]
    fn remove_only_drops_the_named_listener() {
        let registry = ListenerRegistry::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let first = registry.register(collecting(&log, "a"));
        registry.register(collecting(&log, "b"));

        assert!(registry.remove(first));
        assert!(!registry.remove(first));
        registry.dispatch(1);

        assert_eq!(*log.lock().unwrap(), vec!["b:1"]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ids_are_not_reused() {
        let registry: ListenerRegistry<u64> = ListenerRegistry::new();
        let a = registry.register(Arc::new(|_: u64| {}));
        registry.remove(a);
        let b = registry.register(Arc::new(|_: u64| {}));
        assert_ne!(a, b);
    }

    #[test]
    fn listener_can_deregister_itself_during_dispatch() {
        let registry: Arc<ListenerRegistry<u64>> = Arc::new(ListenerRegistry::new());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let inner = Arc::clone(&registry);
        let inner_slot = Arc::clone(&slot);
        let id = registry.register(Arc::new(move |_: u64| {
            if let Some(id) = inner_slot.lock().unwrap().take() {
                inner.remove(id);
            }
        }));
        *slot.lock().unwrap() = Some(id);

        assert_eq!(registry.dispatch(1), 1);
        assert!(registry.is_empty());
    }
}

use std::fmt;

/// Handle returned by [`Notifier::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

struct Listener<T> {
    id: ListenerId,
    once: bool,
    callback: Box<dyn FnMut(&T)>,
}

/// A named listener registry for one kind of notification.
pub struct Notifier<T> {
    name: &'static str,
    listeners: Vec<Listener<T>>,
    next_id: u64,
    emitted: u64,
}

impl<T> Notifier<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: Vec::new(),
            next_id: 0,
            emitted: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Register a listener called on every emission until unsubscribed.
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> ListenerId {
        self.push(callback, false)
    }

    /// Register a listener removed after its first delivery.
    pub fn subscribe_once(&mut self, callback: impl FnMut(&T) + 'static) -> ListenerId {
        self.push(callback, true)
    }

    /// Remove a listener. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        let removed = self.listeners.len() != before;
        if removed {
            tracing::trace!(notifier = self.name, ?id, "listener removed");
        }
        removed
    }

    /// Remove every listener.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    /// Fire `value` to every listener. Returns how many were called.
    pub fn emit(&mut self, value: &T) -> usize {
        self.emitted += 1;
        let delivered = self.listeners.len();
        for listener in &mut self.listeners {
            (listener.callback)(value);
        }
        self.listeners.retain(|l| !l.once);
        tracing::trace!(notifier = self.name, delivered, "emitted");
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_subscribed(&self, id: ListenerId) -> bool {
        self.listeners.iter().any(|l| l.id == id)
    }

    /// Number of emissions so far, with or without listeners.
    pub fn emit_count(&self) -> u64 {
        self.emitted
    }

    fn push(&mut self, callback: impl FnMut(&T) + 'static, once: bool) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener {
            id,
            once,
            callback: Box::new(callback),
        });
        id
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("name", &self.name)
            .field("listeners", &self.listeners.len())
            .field("emitted", &self.emitted)
            .finish()
    }
}

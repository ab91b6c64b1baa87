use std::sync::mpsc::{self, Receiver, Sender};

/// Channel-backed inbox owned by one component.
///
/// Listeners hold a cloned [`Sender`] and post messages; the owner drains
/// them in arrival order when it has `&mut self` access again.
#[derive(Debug)]
pub struct Mailbox<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<T> {
        self.tx.clone()
    }

    /// Take every queued message without blocking.
    pub fn drain(&self) -> Vec<T> {
        self.rx.try_iter().collect()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Notifier;

    #[test]
    fn drain_preserves_order() {
        let mailbox = Mailbox::new();
        let tx = mailbox.sender();
        tx.send(1).unwrap();
        tx.send(2).unwrap();
        assert_eq!(mailbox.drain(), vec![1, 2]);
        assert!(mailbox.drain().is_empty());
    }

    #[test]
    fn forwards_notifications() {
        let mailbox = Mailbox::new();
        let mut notifier = Notifier::new("resize");
        let tx = mailbox.sender();
        notifier.subscribe(move |v: &u32| {
            let _ = tx.send(*v * 2);
        });
        notifier.emit(&3);
        notifier.emit(&4);
        assert_eq!(mailbox.drain(), vec![6, 8]);
    }
}

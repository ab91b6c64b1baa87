//! Notifications: lightweight pub/sub signals between components.
//!
//! A [`Notifier`] fires a value to zero or more registered listeners. A
//! [`Mailbox`] is the other half of the pattern: a component that must react
//! to a notification with `&mut self` access subscribes a listener that only
//! posts a message, then drains its mailbox when it next has control.
//!
//! # Invariants
//! - Listeners run in subscription order.
//! - The listener set is fixed for the duration of one emission.
//! - A removed listener is never called again.

mod mailbox;
mod notifier;

pub use mailbox::Mailbox;
pub use notifier::{ListenerId, Notifier};

pub fn crate_info() -> &'static str {
    "experience-notify v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("notify"));
    }
}

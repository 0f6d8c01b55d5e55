use crate::event::InputEvent;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::{Rc, Weak};

type Listener = Box<dyn FnMut(&InputEvent)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
    /// Set while `emit` runs: listeners are temporarily moved out.
    emitting: bool,
    removed_while_emitting: HashSet<u64>,
}

/// Single-threaded event fan-out. Hosts `emit` events; consumers `subscribe`
/// and keep the returned [`Subscription`] alive for as long as they listen.
#[derive(Clone, Default)]
pub struct EventHub {
    registry: Rc<RefCell<Registry>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`. It is detached when the subscription drops.
    pub fn subscribe(&self, listener: impl FnMut(&InputEvent) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Box::new(listener)));
        tracing::trace!(id, "listener subscribed");
        Subscription {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    /// Deliver `event` to every listener in subscription order.
    ///
    /// Listeners may subscribe or drop subscriptions while being called.
    pub fn emit(&self, event: &InputEvent) {
        let mut active: Vec<(u64, Listener)> = {
            let mut registry = self.registry.borrow_mut();
            if registry.emitting {
                tracing::warn!("nested emit ignored");
                return;
            }
            registry.emitting = true;
            std::mem::take(&mut registry.listeners)
        };

        for (_, listener) in active.iter_mut() {
            listener(event);
        }

        let mut registry = self.registry.borrow_mut();
        registry.emitting = false;
        let removed = std::mem::take(&mut registry.removed_while_emitting);
        let (kept, detached): (Vec<_>, Vec<_>) = active
            .into_iter()
            .partition(|(id, _)| !removed.contains(id));
        let added = std::mem::take(&mut registry.listeners);
        registry.listeners = kept;
        registry.listeners.extend(added);
        drop(registry);
        // Listener captures may own subscriptions of their own.
        drop(detached);
    }

    pub fn listener_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

/// Guard for one registered listener.
#[must_use = "dropping a subscription detaches the listener"]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let detached = {
            let mut registry = registry.borrow_mut();
            if registry.emitting {
                registry.removed_while_emitting.insert(self.id);
            }
            let index = registry.listeners.iter().position(|(id, _)| *id == self.id);
            index.map(|i| registry.listeners.remove(i))
        };
        drop(detached);
        tracing::trace!(id = self.id, "listener detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Key;

    #[test]
    fn subscription_drop_detaches() {
        let hub = EventHub::new();
        let seen = Rc::new(RefCell::new(0));
        let counter = seen.clone();
        let sub = hub.subscribe(move |_| *counter.borrow_mut() += 1);
        assert_eq!(hub.listener_count(), 1);

        hub.emit(&InputEvent::KeyDown(Key::Shift));
        drop(sub);
        hub.emit(&InputEvent::KeyDown(Key::Shift));

        assert_eq!(*seen.borrow(), 1);
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn dropping_during_emit_is_honored() {
        let hub = EventHub::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let inner = slot.clone();
        let sub = hub.subscribe(move |_| {
            inner.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        hub.emit(&InputEvent::KeyUp(Key::Shift));
        assert_eq!(hub.listener_count(), 0);
    }

    #[test]
    fn subscription_outliving_hub_is_harmless() {
        let hub = EventHub::new();
        let sub = hub.subscribe(|_| {});
        drop(hub);
        drop(sub);
    }
}

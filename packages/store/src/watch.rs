//! Auth state change notifications.
//!
//! Backends keep an [`AuthListeners`] registry and call
//! [`notify`](AuthListeners::notify) whenever the signed-in account changes,
//! including changes nobody asked for (an expired refresh token, a deleted
//! account). Subscribers hold an [`AuthWatch`]; dropping it unsubscribes.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::models::AuthAccount;

type Listener = Rc<dyn Fn(Option<&AuthAccount>)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Listeners interested in sign-in and sign-out. Clones share the registry.
#[derive(Clone, Default)]
pub struct AuthListeners {
    registry: Rc<RefCell<Registry>>,
}

impl fmt::Debug for AuthListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthListeners")
            .field("count", &self.registry.borrow().listeners.len())
            .finish()
    }
}

impl AuthListeners {
    pub fn subscribe(&self, listener: impl Fn(Option<&AuthAccount>) + 'static) -> AuthWatch {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Rc::new(listener)));
        AuthWatch {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Call every listener with `account`. Listeners may (un)subscribe while
    /// being called.
    pub fn notify(&self, account: Option<&AuthAccount>) {
        let listeners: Vec<Listener> = self
            .registry
            .borrow()
            .listeners
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(account);
        }
    }
}

/// Subscription to an [`AuthListeners`] registry. Dropping it unsubscribes.
#[must_use = "dropping an AuthWatch unsubscribes immediately"]
pub struct AuthWatch {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for AuthWatch {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::task::JoinHandle;
use tracing::trace;

use super::storage::lock;

/// What happened to the favorites, delivered after the write completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FavoritesChange {
    /// An entry with this id was bookmarked
    Added(String),
    /// The entry with this id was removed
    Removed(String),
    /// All entries were removed
    Cleared,
    /// Another process changed the persisted favorites
    External,
}

/// Trait for consumers that display favorite-dependent state.
///
/// Implementations should re-read the store on every call rather than patch
/// a cached copy. Any `Fn(&FavoritesChange)` closure is a listener.
pub trait FavoritesListener: Send + Sync {
    fn favorites_changed(&self, change: &FavoritesChange);
}

impl<F> FavoritesListener for F
where
    F: Fn(&FavoritesChange) + Send + Sync,
{
    fn favorites_changed(&self, change: &FavoritesChange) {
        self(change)
    }
}

type SharedListener = Arc<dyn FavoritesListener>;

/// Registered listeners of one store
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, SharedListener)>>,
}

impl ListenerRegistry {
    pub(crate) fn register(&self, listener: SharedListener) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).push((id, listener));
        id
    }

    pub(crate) fn unregister(&self, id: u64) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Call every listener in registration order
    ///
    /// The list is copied first so listeners may subscribe, unsubscribe or
    /// read the store while being notified.
    pub(crate) fn notify(&self, change: &FavoritesChange) {
        let snapshot: Vec<SharedListener> = lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        trace!(?change, listeners = snapshot.len(), "Notifying favorites listeners");
        for listener in snapshot {
            listener.favorites_changed(change);
        }
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.listeners).len()
    }
}

/// Handle to a registered listener; dropping it unsubscribes
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
pub struct Subscription {
    registry: Weak<ListenerRegistry>,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(registry: &Arc<ListenerRegistry>, id: u64) -> Self {
        Self {
            registry: Arc::downgrade(registry),
            id,
        }
    }

    /// Stop receiving notifications
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
    }
}

/// Handle to a background poll for changes made by other processes
///
/// Dropping it stops the poll.
#[must_use = "dropping an ExternalWatch stops the poll immediately"]
pub struct ExternalWatch {
    task: JoinHandle<()>,
}

impl ExternalWatch {
    pub(crate) fn new(task: JoinHandle<()>) -> Self {
        Self { task }
    }

    /// False once the poll stopped, e.g. because its store is gone
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop polling
    pub fn stop(self) {}
}

impl Drop for ExternalWatch {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_reaches_all_listeners_in_order() {
        let registry = Arc::new(ListenerRegistry::default());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for name in ["first", "second"] {
            let seen = Arc::clone(&seen);
            registry.register(Arc::new(move |change: &FavoritesChange| {
                seen.lock().unwrap().push((name, change.clone()));
            }));
        }

        registry.notify(&FavoritesChange::Cleared);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("first", FavoritesChange::Cleared),
                ("second", FavoritesChange::Cleared)
            ]
        );
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let registry = Arc::new(ListenerRegistry::default());
        let id = registry.register(Arc::new(|_: &FavoritesChange| {}));
        let subscription = Subscription::new(&registry, id);

        assert_eq!(registry.len(), 1);
        drop(subscription);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let registry = Arc::new(ListenerRegistry::default());
        let id = registry.register(Arc::new(|_: &FavoritesChange| {}));
        let subscription = Subscription::new(&registry, id);

        drop(registry);
        subscription.unsubscribe();
    }

    #[test]
    fn listener_may_unsubscribe_others_during_notify() {
        let registry = Arc::new(ListenerRegistry::default());
        let victim = registry.register(Arc::new(|_: &FavoritesChange| {}));

        let handle = Arc::clone(&registry);
        registry.register(Arc::new(move |_: &FavoritesChange| {
            handle.unregister(victim);
        }));

        registry.notify(&FavoritesChange::External);
        assert_eq!(registry.len(), 1);
    }
}

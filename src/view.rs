// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::future::Future;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::store::lock;

/// Display state of data a view is waiting for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    Loading,
    Ready(T),
}

/// Identifies one load started on a [`ViewSlot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

struct SlotInner<T> {
    state: LoadState<T>,
    generation: u64,
    mounted: bool,
}

/// Holds the result of an in-flight catalog request for one view
///
/// Requests cannot be cancelled, so results are matched against the ticket
/// handed out when the load began. A result for an unmounted view, or one
/// overtaken by a newer load, is dropped. There is no timeout: a request
/// that never finishes leaves the slot `Loading`.
pub struct ViewSlot<T> {
    inner: Arc<Mutex<SlotInner<T>>>,
}

impl<T> Clone for ViewSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ViewSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ViewSlot<T> {
    /// A mounted slot that is loading
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotInner {
                state: LoadState::Loading,
                generation: 0,
                mounted: true,
            })),
        }
    }

    /// Start a new load, superseding any outstanding one
    pub fn begin(&self) -> LoadTicket {
        let mut inner = lock(&self.inner);
        inner.generation += 1;
        inner.state = LoadState::Loading;
        LoadTicket(inner.generation)
    }

    /// Apply a result if its ticket is still current; returns whether it was
    pub fn complete(&self, ticket: LoadTicket, value: T) -> bool {
        let mut inner = lock(&self.inner);
        if !inner.mounted || inner.generation != ticket.0 {
            debug!(ticket = ticket.0, current = inner.generation, "Discarding stale view result");
            return false;
        }
        inner.state = LoadState::Ready(value);
        true
    }

    /// Run `request` as a new load and apply its result if still wanted
    pub async fn load<F>(&self, request: F) -> bool
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin();
        let value = request.await;
        self.complete(ticket, value)
    }

    /// Tear the view down; outstanding results will be discarded
    pub fn unmount(&self) {
        let mut inner = lock(&self.inner);
        inner.mounted = false;
        inner.generation += 1;
    }

    pub fn is_mounted(&self) -> bool {
        lock(&self.inner).mounted
    }

    pub fn is_loading(&self) -> bool {
        matches!(lock(&self.inner).state, LoadState::Loading)
    }
}

impl<T: Clone> ViewSlot<T> {
    pub fn state(&self) -> LoadState<T> {
        lock(&self.inner).state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use async_trait::async_trait;
    use bytes::Bytes;
    use tokio::sync::oneshot;

    use crate::catalog::{CatalogClient, Podcast};
    use crate::http::HttpClient;

    /// Upstream that accepts the request and never answers
    struct HungHttpClient;

    #[async_trait]
    impl HttpClient for HungHttpClient {
        async fn get_bytes(&self, _url: &str) -> Result<Bytes, reqwest::Error> {
            futures::future::pending().await
        }
    }

    #[test]
    fn new_slot_is_loading_and_mounted() {
        let slot: ViewSlot<u32> = ViewSlot::new();
        assert!(slot.is_loading());
        assert!(slot.is_mounted());
    }

    #[test]
    fn current_ticket_applies() {
        let slot = ViewSlot::new();
        let ticket = slot.begin();

        assert!(slot.complete(ticket, vec![1, 2, 3]));
        assert_eq!(slot.state(), LoadState::Ready(vec![1, 2, 3]));
    }

    #[test]
    fn superseded_ticket_is_discarded() {
        let slot = ViewSlot::new();
        let first = slot.begin();
        let second = slot.begin();

        assert!(slot.complete(second, "newer"));
        assert!(!slot.complete(first, "older"));
        assert_eq!(slot.state(), LoadState::Ready("newer"));
    }

    #[tokio::test]
    async fn late_result_after_unmount_is_discarded() {
        let slot: ViewSlot<String> = ViewSlot::new();
        let (tx, rx) = oneshot::channel::<String>();

        let background = slot.clone();
        let task = tokio::spawn(async move {
            background
                .load(async move { rx.await.unwrap_or_default() })
                .await
        });

        tokio::task::yield_now().await;
        slot.unmount();
        tx.send("late".to_string()).unwrap();

        assert!(!task.await.unwrap());
        assert!(slot.is_loading());
    }

    #[tokio::test]
    async fn hung_request_leaves_slot_loading() {
        let slot: ViewSlot<Vec<Podcast>> = ViewSlot::new();
        let client = CatalogClient::new(HungHttpClient);

        let outcome = tokio::time::timeout(
            Duration::from_millis(50),
            slot.load(client.get_trending_podcasts(24)),
        )
        .await;

        assert!(outcome.is_err(), "request should still be pending");
        assert!(slot.is_loading());
    }
}

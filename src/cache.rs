use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::fetcher::{Bundle, FetchError, NamespaceFetcher};

/// One (locale, namespace) pair.
type PairKey = (String, String);

/// Result of an in-flight fetch, broadcast to every attached waiter.
#[derive(Clone)]
enum FetchState {
    Pending,
    Done(Result<Arc<Bundle>, FetchError>),
}

enum Slot {
    /// Bundle fetched and stored; lives for the cache's lifetime.
    Ready(Arc<Bundle>),
    /// A fetch for this pair is running; waiters subscribe to its channel.
    InFlight(watch::Receiver<FetchState>),
}

/// What the current pass over the slot table decided to do.
enum Action {
    Hit(Arc<Bundle>),
    Wait(watch::Receiver<FetchState>),
    Lead(watch::Sender<FetchState>),
}

/// Shared store of bundles keyed by (locale, namespace), with request
/// coalescing.
///
/// The first caller to miss on a pair becomes that pair's fetcher; everyone
/// else arriving before the fetch finishes attaches to the same in-flight
/// result instead of issuing a duplicate request. A failed fetch clears its
/// slot, so the next caller retries immediately rather than waiting out a
/// stale marker. Entries are never evicted.
pub struct NamespaceCache {
    fetcher: NamespaceFetcher,
    slots: Mutex<HashMap<PairKey, Slot>>,
}

impl NamespaceCache {
    pub fn new(fetcher: NamespaceFetcher) -> Self {
        Self {
            fetcher,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the full bundle for a (locale, namespace) pair.
    ///
    /// At most one backend fetch per pair is in flight at any time, and every
    /// concurrent caller for the same pair observes the same bundle or the
    /// same error.
    pub async fn resolve_namespace(
        &self,
        locale: &str,
        namespace: &str,
    ) -> Result<Arc<Bundle>, FetchError> {
        let key: PairKey = (locale.to_string(), namespace.to_string());

        loop {
            let action = {
                let mut slots = self.slots.lock().unwrap();
                match slots.entry(key.clone()) {
                    Entry::Occupied(entry) => match entry.get() {
                        Slot::Ready(bundle) => Action::Hit(Arc::clone(bundle)),
                        Slot::InFlight(rx) => Action::Wait(rx.clone()),
                    },
                    Entry::Vacant(entry) => {
                        let (tx, rx) = watch::channel(FetchState::Pending);
                        entry.insert(Slot::InFlight(rx));
                        Action::Lead(tx)
                    }
                }
            };

            match action {
                Action::Hit(bundle) => return Ok(bundle),
                Action::Wait(rx) => {
                    if let Some(result) = self.await_in_flight(rx, &key).await {
                        return result;
                    }
                    // The fetching task vanished; take another pass.
                }
                Action::Lead(tx) => return self.fetch_and_publish(&key, tx).await,
            }
        }
    }

    /// Wait for another caller's in-flight fetch to publish its result.
    ///
    /// Returns `None` if the fetching task was dropped before publishing,
    /// after clearing its dead slot so the caller can start over.
    async fn await_in_flight(
        &self,
        mut rx: watch::Receiver<FetchState>,
        key: &PairKey,
    ) -> Option<Result<Arc<Bundle>, FetchError>> {
        loop {
            let state = rx.borrow_and_update().clone();
            if let FetchState::Done(result) = state {
                return Some(result);
            }

            if rx.changed().await.is_err() {
                let mut slots = self.slots.lock().unwrap();
                if let Some(Slot::InFlight(current)) = slots.get(key) {
                    if current.same_channel(&rx) {
                        slots.remove(key);
                        warn!(
                            "Cleared abandoned fetch for namespace '{}' (locale '{}')",
                            key.1, key.0
                        );
                    }
                }
                return None;
            }
        }
    }

    /// Run the backend fetch as the pair's single fetcher and broadcast the
    /// outcome to every waiter.
    async fn fetch_and_publish(
        &self,
        key: &PairKey,
        tx: watch::Sender<FetchState>,
    ) -> Result<Arc<Bundle>, FetchError> {
        debug!("Fetching namespace '{}' for locale '{}'", key.1, key.0);

        let outcome = match self.fetcher.fetch_bundle(&key.0, &key.1).await {
            Ok(bundle) => {
                let bundle = Arc::new(bundle);
                let mut slots = self.slots.lock().unwrap();
                slots.insert(key.clone(), Slot::Ready(Arc::clone(&bundle)));
                Ok(bundle)
            }
            Err(e) => {
                warn!(
                    "Fetch for namespace '{}' (locale '{}') failed: {}",
                    key.1, key.0, e
                );
                // The slot stays ours until the sender drops.
                self.slots.lock().unwrap().remove(key);
                Err(e)
            }
        };

        let _ = tx.send(FetchState::Done(outcome.clone()));
        outcome
    }
}

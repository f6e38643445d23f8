//! Live collection subscriptions.
//!
//! A [`Live`] value is a standing subscription to one collection. A background
//! task fetches the full collection when the subscription starts and again on
//! every change notice for that collection, replacing the whole snapshot each
//! time (no diffs). Consumers read the latest [`Snapshot`] at any time or wait
//! for the next one.
//!
//! Change notices come from a [`ChangeFeed`], which relays the database's
//! `candela_changes` notifications and accepts local notices from the same
//! process.
//!
//! Dropping the last handle to a subscription (or calling
//! [`Live::unsubscribe`]) aborts its task.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use thiserror::Error;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::db::{CHANGE_CHANNEL, RepositoryError};

/// Pause before polling the listener again after a connection error.
const LISTENER_ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Buffered notices per receiver before slow subscribers start lagging.
const FEED_CAPACITY: usize = 64;

/// A document collection that can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Products,
    Categories,
    Subcategories,
    Settings,
}

impl Collection {
    pub const ALL: [Self; 4] = [
        Self::Products,
        Self::Categories,
        Self::Subcategories,
        Self::Settings,
    ];

    /// Name used as the notification payload.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Subcategories => "subcategories",
            Self::Settings => "settings",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = LiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| LiveError::UnknownCollection(s.to_owned()))
    }
}

/// Errors from the live subscription layer.
#[derive(Debug, Error)]
pub enum LiveError {
    /// The notification listener could not be set up.
    #[error("listener error: {0}")]
    Listener(#[from] sqlx::Error),

    /// A notification named a collection we don't know.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    /// The subscription task has stopped.
    #[error("subscription closed")]
    Closed,
}

/// Fan-out of change notices to every subscription in the process.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Collection>,
}

impl ChangeFeed {
    /// A feed with no database listener attached. Only local notices flow.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// A feed relaying `LISTEN candela_changes` from `pool`'s database.
    ///
    /// The returned task runs for the life of the process.
    ///
    /// # Errors
    ///
    /// Returns `LiveError::Listener` if the listening connection cannot be opened.
    pub async fn listen(pool: &PgPool) -> Result<(Self, JoinHandle<()>), LiveError> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let feed = Self::new();
        let relay = feed.clone();
        let handle = tokio::spawn(async move {
            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => match notification.payload().parse() {
                        Ok(collection) => relay.notify(collection),
                        Err(e) => tracing::warn!(error = %e, "Ignoring change notice"),
                    },
                    Ok(None) => {
                        // Notices sent while disconnected are lost; resync everything.
                        tracing::warn!("Change listener reconnected, refreshing all collections");
                        for collection in Collection::ALL {
                            relay.notify(collection);
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Change listener failed");
                        tokio::time::sleep(LISTENER_ERROR_PAUSE).await;
                    }
                }
            }
        });

        tracing::info!(channel = CHANGE_CHANNEL, "Listening for catalog changes");
        Ok((feed, handle))
    }

    /// Announce a change to local subscribers.
    pub fn notify(&self, collection: Collection) {
        // No receivers just means nobody is subscribed yet.
        let _ = self.tx.send(collection);
    }

    fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// The latest value delivered by a subscription.
#[derive(Debug)]
pub struct Snapshot<V> {
    pub data: Arc<V>,
    /// True until the first fetch completes (successfully or not).
    pub loading: bool,
}

impl<V> Clone for Snapshot<V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            loading: self.loading,
        }
    }
}

impl<V: Default> Snapshot<V> {
    fn initial() -> Self {
        Self {
            data: Arc::new(V::default()),
            loading: true,
        }
    }
}

/// Fetches a full copy of a collection.
pub type FetchFn<V> = Arc<dyn Fn() -> BoxFuture<'static, Result<V, RepositoryError>> + Send + Sync>;

/// Subscription to a whole collection.
pub type LiveCollection<T> = Live<Vec<T>>;

struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// A standing subscription. Cloning shares the same task and snapshot.
pub struct Live<V> {
    collection: Collection,
    rx: watch::Receiver<Snapshot<V>>,
    tx: Arc<watch::Sender<Snapshot<V>>>,
    fetch: FetchFn<V>,
    task: Arc<TaskGuard>,
}

impl<V> Clone for Live<V> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection,
            rx: self.rx.clone(),
            tx: Arc::clone(&self.tx),
            fetch: Arc::clone(&self.fetch),
            task: Arc::clone(&self.task),
        }
    }
}

/// Start a subscription to `collection`.
///
/// The first snapshot is `loading` with default contents until the initial
/// fetch finishes.
pub fn subscribe<V>(collection: Collection, feed: &ChangeFeed, fetch: FetchFn<V>) -> Live<V>
where
    V: Default + Send + Sync + 'static,
{
    let (tx, rx) = watch::channel(Snapshot::initial());
    let tx = Arc::new(tx);
    // Subscribe before the initial fetch so no notice can slip in between.
    let mut notices = feed.subscribe();

    let task = tokio::spawn({
        let tx = Arc::clone(&tx);
        let fetch = Arc::clone(&fetch);
        async move {
            load(collection, &tx, &fetch).await;
            loop {
                match notices.recv().await {
                    Ok(changed) if changed == collection => load(collection, &tx, &fetch).await,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%collection, skipped, "Subscription lagged, refetching");
                        load(collection, &tx, &fetch).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    });

    Live {
        collection,
        rx,
        tx,
        fetch,
        task: Arc::new(TaskGuard(task)),
    }
}

async fn load<V>(collection: Collection, tx: &watch::Sender<Snapshot<V>>, fetch: &FetchFn<V>) {
    match fetch().await {
        Ok(data) => {
            tx.send_replace(Snapshot {
                data: Arc::new(data),
                loading: false,
            });
            tracing::debug!(%collection, "Snapshot delivered");
        }
        Err(e) => {
            tracing::warn!(%collection, error = %e, "Snapshot fetch failed, keeping previous data");
            tx.send_if_modified(|snapshot| std::mem::replace(&mut snapshot.loading, false));
        }
    }
}

impl<V> Live<V> {
    #[must_use]
    pub const fn collection(&self) -> Collection {
        self.collection
    }

    /// The latest snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<V> {
        self.rx.borrow().clone()
    }

    /// The latest data, without the loading flag.
    #[must_use]
    pub fn data(&self) -> Arc<V> {
        Arc::clone(&self.rx.borrow().data)
    }

    /// Wait until a snapshot newer than the last one seen by this handle arrives.
    ///
    /// # Errors
    ///
    /// Returns `LiveError::Closed` if the subscription task has stopped.
    pub async fn changed(&mut self) -> Result<(), LiveError> {
        self.rx.changed().await.map_err(|_| LiveError::Closed)
    }

    /// A receiver for consumers that want to watch the snapshot themselves.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Snapshot<V>> {
        self.rx.clone()
    }

    /// Fetch now and publish the result before returning.
    ///
    /// Used after a write so the next page render sees the new data without
    /// waiting for the change notice to round-trip.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous snapshot is kept.
    pub async fn refresh(&self) -> Result<(), RepositoryError> {
        let data = (self.fetch)().await?;
        self.tx.send_replace(Snapshot {
            data: Arc::new(data),
            loading: false,
        });
        Ok(())
    }

    /// Stop the subscription now, even if other handles still exist.
    pub fn unsubscribe(self) {
        self.task.0.abort();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;

    use super::*;

    /// In-memory collection whose fetch counts calls and can be made to fail.
    #[derive(Clone, Default)]
    struct FakeSource {
        items: Arc<Mutex<Vec<u32>>>,
        fetches: Arc<AtomicUsize>,
        failing: Arc<Mutex<bool>>,
    }

    impl FakeSource {
        fn fetch(&self) -> FetchFn<Vec<u32>> {
            let source = self.clone();
            Arc::new(move || {
                let source = source.clone();
                async move {
                    source.fetches.fetch_add(1, Ordering::SeqCst);
                    if *source.failing.lock().unwrap() {
                        return Err(RepositoryError::NotFound);
                    }
                    Ok(source.items.lock().unwrap().clone())
                }
                .boxed()
            })
        }

        fn set(&self, items: Vec<u32>) {
            *self.items.lock().unwrap() = items;
        }

        fn fail(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_collection_names_roundtrip() {
        for collection in Collection::ALL {
            assert_eq!(collection.as_str().parse::<Collection>().unwrap(), collection);
        }
        assert!("orders".parse::<Collection>().is_err());
    }

    #[tokio::test]
    async fn test_first_snapshot_clears_loading() {
        let source = FakeSource::default();
        source.set(vec![1, 2]);
        let feed = ChangeFeed::new();

        let mut live = subscribe(Collection::Products, &feed, source.fetch());
        if live.snapshot().loading {
            live.changed().await.unwrap();
        }

        let snapshot = live.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(*snapshot.data, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_notice_replaces_whole_snapshot() {
        let source = FakeSource::default();
        source.set(vec![1, 2, 3]);
        let feed = ChangeFeed::new();
        let mut live = subscribe(Collection::Products, &feed, source.fetch());
        live.changed().await.unwrap();

        source.set(vec![9]);
        feed.notify(Collection::Products);
        live.changed().await.unwrap();

        assert_eq!(*live.data(), vec![9]);
        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_other_collections_are_ignored() {
        let source = FakeSource::default();
        let feed = ChangeFeed::new();
        let mut live = subscribe(Collection::Categories, &feed, source.fetch());
        live.changed().await.unwrap();

        feed.notify(Collection::Products);
        feed.notify(Collection::Settings);
        feed.notify(Collection::Categories);
        live.changed().await.unwrap();

        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_previous_snapshot() {
        let source = FakeSource::default();
        source.set(vec![4, 5]);
        let feed = ChangeFeed::new();
        let mut live = subscribe(Collection::Products, &feed, source.fetch());
        live.changed().await.unwrap();

        source.fail(true);
        feed.notify(Collection::Products);
        while source.fetches() < 2 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(*live.data(), vec![4, 5]);
        assert!(!live.snapshot().loading);
    }

    #[tokio::test]
    async fn test_failed_first_fetch_falls_back_to_default() {
        let source = FakeSource::default();
        source.fail(true);
        let feed = ChangeFeed::new();

        let mut live = subscribe(Collection::Settings, &feed, source.fetch());
        live.changed().await.unwrap();

        let snapshot = live.snapshot();
        assert!(!snapshot.loading);
        assert!(snapshot.data.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_publishes_before_returning() {
        let source = FakeSource::default();
        let feed = ChangeFeed::new();
        let mut live = subscribe(Collection::Products, &feed, source.fetch());
        live.changed().await.unwrap();

        source.set(vec![7]);
        live.refresh().await.unwrap();

        assert_eq!(*live.data(), vec![7]);
    }

    #[tokio::test]
    async fn test_refresh_error_is_returned() {
        let source = FakeSource::default();
        let feed = ChangeFeed::new();
        let live = subscribe(Collection::Products, &feed, source.fetch());

        source.fail(true);
        assert!(live.refresh().await.is_err());
    }

    #[tokio::test]
    async fn test_dropping_last_handle_stops_fetching() {
        let source = FakeSource::default();
        let feed = ChangeFeed::new();
        let mut live = subscribe(Collection::Products, &feed, source.fetch());
        live.changed().await.unwrap();
        let clone = live.clone();

        drop(live);
        feed.notify(Collection::Products);
        let mut watcher = clone.watch();
        watcher.changed().await.unwrap();
        assert_eq!(source.fetches(), 2);

        drop(watcher);
        drop(clone);
        tokio::time::sleep(Duration::from_millis(20)).await;
        feed.notify(Collection::Products);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(source.fetches(), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_shared_task() {
        let source = FakeSource::default();
        let feed = ChangeFeed::new();
        let mut live = subscribe(Collection::Products, &feed, source.fetch());
        live.changed().await.unwrap();
        let other = live.clone();

        live.unsubscribe();
        tokio::time::sleep(Duration::from_millis(20)).await;
        feed.notify(Collection::Products);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(source.fetches(), 1);
        assert!(!other.snapshot().loading);
    }
}

use super::keys::{QueryFilter, QueryKey};
use super::state::{CacheEvent, QuerySnapshot, QueryStatus};
use crate::shared::config::CacheConfig;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use lru::LruCache;
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info, trace, warn};

type CachedValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<CachedValue, AppError>>>;

const EVENT_CHANNEL_CAPACITY: usize = 256;

struct CacheEntry {
    data: Option<CachedValue>,
    error: Option<AppError>,
    invalidated: bool,
    /// data を書き込んだ取得の ID。古い取得の結果で上書きしないために使う
    data_fetch_id: u64,
    fetched_at: Option<Instant>,
    updated_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn empty() -> Self {
        Self {
            data: None,
            error: None,
            invalidated: false,
            data_fetch_id: 0,
            fetched_at: None,
            updated_at: None,
        }
    }

    fn is_stale(&self, stale_time: Option<Duration>) -> bool {
        if self.invalidated || self.data.is_none() || self.error.is_some() {
            return true;
        }
        match (stale_time, self.fetched_at) {
            (Some(limit), Some(fetched_at)) => fetched_at.elapsed() >= limit,
            _ => false,
        }
    }
}

struct InFlight {
    fetch_id: u64,
    future: SharedFetch,
}

struct StoreState {
    entries: LruCache<QueryKey, CacheEntry>,
    in_flight: HashMap<QueryKey, InFlight>,
    next_fetch_id: u64,
    /// `clear` 時点までに発行した取得 ID。これ以下の結果は書き込まない
    cleared_through: u64,
    /// `remove_query` したキーごとの同様の境界
    removed_through: HashMap<QueryKey, u64>,
}

impl StoreState {
    fn next_fetch_id(&mut self) -> u64 {
        self.next_fetch_id += 1;
        self.next_fetch_id
    }

    /// 新しいキーを入れる前に、溢れるエントリがあれば通知する
    fn make_room(&mut self, key: &QueryKey, events: &broadcast::Sender<CacheEvent>) {
        if self.entries.contains(key) || self.entries.len() < self.entries.cap().get() {
            return;
        }
        if let Some((evicted, _)) = self.entries.pop_lru() {
            debug!(key = %evicted, "query entry evicted");
            notify(events, CacheEvent::Evicted(evicted));
        }
    }

    fn entry_mut(
        &mut self,
        key: &QueryKey,
        events: &broadcast::Sender<CacheEvent>,
    ) -> &mut CacheEntry {
        self.make_room(key, events);
        self.entries.get_or_insert_mut(key.clone(), CacheEntry::empty)
    }

    /// 破棄されたエントリに向けた取得か
    fn is_discarded(&self, key: &QueryKey, fetch_id: u64) -> bool {
        fetch_id <= self.cleared_through
            || self
                .removed_through
                .get(key)
                .is_some_and(|&through| fetch_id <= through)
    }

    fn settle(
        &mut self,
        key: &QueryKey,
        fetch_id: u64,
        result: &Result<CachedValue, AppError>,
        events: &broadcast::Sender<CacheEvent>,
    ) {
        if self.is_discarded(key, fetch_id) {
            trace!(%key, fetch_id, "dropping result for a removed entry");
            return;
        }

        let is_current = self
            .in_flight
            .get(key)
            .is_some_and(|in_flight| in_flight.fetch_id == fetch_id);
        if is_current {
            self.in_flight.remove(key);
        }

        match result {
            Ok(value) => {
                let entry = self.entry_mut(key, events);
                if entry.data_fetch_id > fetch_id {
                    trace!(%key, fetch_id, "discarding result older than cached data");
                    return;
                }
                entry.data = Some(Arc::clone(value));
                entry.error = None;
                entry.data_fetch_id = fetch_id;
                // 取得中に無効化された結果は保存するが stale のままにする
                entry.invalidated = !is_current;
                entry.fetched_at = Some(Instant::now());
                entry.updated_at = Some(Utc::now());
                // これより古い取得はデータの fetch id で弾けるので境界はもう要らない
                self.removed_through.remove(key);
                debug!(%key, fetch_id, "query request settled");
                notify(events, CacheEvent::Updated(key.clone()));
            }
            Err(err) => {
                warn!(%key, fetch_id, error = %err, "query request failed");
                if is_current {
                    self.entry_mut(key, events).error = Some(err.clone());
                }
                notify(events, CacheEvent::Failed(key.clone()));
            }
        }
    }
}

fn notify(events: &broadcast::Sender<CacheEvent>, event: CacheEvent) {
    if events.send(event).is_err() {
        trace!("no subscribers for cache event");
    }
}

fn downcast<T>(key: &QueryKey, value: &CachedValue) -> Result<T, AppError>
where
    T: Clone + 'static,
{
    value.downcast_ref::<T>().cloned().ok_or_else(|| {
        AppError::Internal(format!(
            "cached value for {key} is not a {}",
            std::any::type_name::<T>()
        ))
    })
}

struct MutationGuard<'a>(&'a AtomicUsize);

impl<'a> MutationGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// キー付きのクエリキャッシュ。
///
/// - 最初の読み取りでエントリを作り、無効化されるか `stale_time` を過ぎるまでそのまま返す
/// - 同じキーへの同時読み取りは 1 つのリクエストを共有する
/// - 書き込みが成功したときだけ、宣言されたキーを無効化する
///
/// グローバルには持たず、`Arc<QueryStore>` として注入して使う。
pub struct QueryStore {
    state: Arc<Mutex<StoreState>>,
    stale_time: Option<Duration>,
    events: broadcast::Sender<CacheEvent>,
    mutations_in_flight: AtomicUsize,
}

impl QueryStore {
    pub fn new(config: &CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries).unwrap_or(NonZeroUsize::MIN);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(StoreState {
                entries: LruCache::new(capacity),
                in_flight: HashMap::new(),
                next_fetch_id: 0,
                cleared_through: 0,
                removed_through: HashMap::new(),
            })),
            stale_time: config.stale_time(),
            events,
            mutations_in_flight: AtomicUsize::new(0),
        }
    }

    /// キャッシュが fresh ならそれを返し、そうでなければ取得する。
    ///
    /// `fetcher` には現在キャッシュにある値（あれば）が渡される。
    pub async fn fetch_query<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Option<T>) -> Fut + Send,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        self.run(key, fetcher, false).await
    }

    /// キャッシュの鮮度に関係なく取得する（取得中なら相乗りする）
    pub async fn refetch_query<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Option<T>) -> Fut + Send,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        self.run(key, fetcher, true).await
    }

    async fn run<T, F, Fut>(&self, key: QueryKey, fetcher: F, force: bool) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce(Option<T>) -> Fut + Send,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let pending = {
            let mut state = self.state.lock().await;
            if !force {
                if let Some(entry) = state.entries.get(&key) {
                    if let (false, Some(value)) = (entry.is_stale(self.stale_time), &entry.data) {
                        trace!(%key, "query cache hit");
                        return downcast(&key, value);
                    }
                }
            }

            let joined = state
                .in_flight
                .get(&key)
                .map(|in_flight| (in_flight.fetch_id, in_flight.future.clone()));
            match joined {
                Some((fetch_id, future)) => {
                    debug!(%key, fetch_id, "joining in-flight request");
                    future
                }
                None => {
                    let previous = state
                        .entries
                        .peek(&key)
                        .and_then(|entry| entry.data.as_ref())
                        .and_then(|value| value.downcast_ref::<T>())
                        .cloned();
                    self.start_fetch(&mut state, key.clone(), fetcher(previous))
                }
            }
        };

        let value = pending.await?;
        downcast(&key, &value)
    }

    fn start_fetch<T, Fut>(&self, state: &mut StoreState, key: QueryKey, request: Fut) -> SharedFetch
    where
        T: Send + Sync + 'static,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        let fetch_id = state.next_fetch_id();
        let shared_state = Arc::clone(&self.state);
        let events = self.events.clone();
        let settle_key = key.clone();

        // 結果の書き込みは共有 future 自身が行う
        let future = async move {
            let result = request.await.map(|value| Arc::new(value) as CachedValue);
            shared_state
                .lock()
                .await
                .settle(&settle_key, fetch_id, &result, &events);
            result
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            key.clone(),
            InFlight {
                fetch_id,
                future: future.clone(),
            },
        );
        // 待っている呼び出し元が全員いなくなっても最後まで走らせる
        tokio::spawn(future.clone());
        debug!(%key, fetch_id, "query request started");
        notify(&self.events, CacheEvent::Fetching(key));
        future
    }

    /// フィルタに一致するエントリをすべて stale にする。戻り値は対象になったキーの数
    pub async fn invalidate(&self, filters: &[QueryFilter]) -> usize {
        if filters.is_empty() {
            return 0;
        }
        let matches = |key: &QueryKey| filters.iter().any(|filter| filter.matches(key));

        let keys = {
            let mut state = self.state.lock().await;
            let mut keys: Vec<QueryKey> = Vec::new();
            for (key, entry) in state.entries.iter_mut() {
                if matches(key) {
                    entry.invalidated = true;
                    keys.push(key.clone());
                }
            }
            // 取得中のリクエストは切り離し、次の読み取りで新しく取り直す
            let detached: Vec<QueryKey> = state
                .in_flight
                .keys()
                .filter(|key| matches(*key))
                .cloned()
                .collect();
            for key in detached {
                state.in_flight.remove(&key);
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
            keys
        };

        for key in &keys {
            debug!(%key, "query invalidated");
            notify(&self.events, CacheEvent::Invalidated(key.clone()));
        }
        keys.len()
    }

    /// 書き込みを実行し、成功したときだけ `invalidates` が返すキーを無効化する。
    pub async fn mutate<T, Fut, I>(
        &self,
        name: &'static str,
        request: Fut,
        invalidates: I,
    ) -> Result<T, AppError>
    where
        Fut: Future<Output = Result<T, AppError>>,
        I: FnOnce(&T) -> Vec<QueryFilter>,
    {
        let _guard = MutationGuard::new(&self.mutations_in_flight);
        match request.await {
            Ok(value) => {
                let filters = invalidates(&value);
                let invalidated = self.invalidate(&filters).await;
                info!(mutation = name, invalidated, "mutation succeeded");
                Ok(value)
            }
            Err(err) => {
                warn!(mutation = name, error = %err, "mutation failed");
                Err(err)
            }
        }
    }

    /// 実行中の書き込み数
    pub fn mutations_in_flight(&self) -> usize {
        self.mutations_in_flight.load(Ordering::SeqCst)
    }

    pub fn is_mutating(&self) -> bool {
        self.mutations_in_flight() > 0
    }

    /// エントリの現在の状態。LRU の順序は変えない
    pub async fn snapshot<T>(&self, key: &QueryKey) -> QuerySnapshot<T>
    where
        T: Clone + 'static,
    {
        let state = self.state.lock().await;
        let is_fetching = state.in_flight.contains_key(key);
        let Some(entry) = state.entries.peek(key) else {
            return QuerySnapshot::pending(is_fetching);
        };

        let data = entry
            .data
            .as_ref()
            .and_then(|value| value.downcast_ref::<T>())
            .cloned();
        let status = if entry.error.is_some() {
            QueryStatus::Error
        } else if data.is_some() {
            QueryStatus::Success
        } else {
            QueryStatus::Pending
        };

        QuerySnapshot {
            status,
            data,
            error: entry.error.clone(),
            is_fetching,
            is_stale: entry.is_stale(self.stale_time),
            updated_at: entry.updated_at,
        }
    }

    pub async fn get_query_data<T>(&self, key: &QueryKey) -> Option<T>
    where
        T: Clone + 'static,
    {
        self.snapshot(key).await.data
    }

    /// リクエストを出さずにエントリへ値を書き込む（fresh として扱う）
    pub async fn set_query_data<T>(&self, key: QueryKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        let mut state = self.state.lock().await;
        let fetch_id = state.next_fetch_id();
        let entry = state.entry_mut(&key, &self.events);
        entry.data = Some(Arc::new(value));
        entry.error = None;
        entry.invalidated = false;
        entry.data_fetch_id = fetch_id;
        entry.fetched_at = Some(Instant::now());
        entry.updated_at = Some(Utc::now());
        drop(state);
        notify(&self.events, CacheEvent::Updated(key));
    }

    pub async fn is_fetching(&self, key: &QueryKey) -> bool {
        self.state.lock().await.in_flight.contains_key(key)
    }

    /// エントリを破棄する。取得中のリクエストの結果も書き込まれない
    pub async fn remove_query(&self, key: &QueryKey) -> bool {
        let mut state = self.state.lock().await;
        let through = state.next_fetch_id;
        state.removed_through.insert(key.clone(), through);
        state.in_flight.remove(key);
        let removed = state.entries.pop(key).is_some();
        debug!(%key, removed, "query removed");
        removed
    }

    /// すべてのエントリと取得中リクエストを破棄する
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        state.cleared_through = state.next_fetch_id;
        state.removed_through.clear();
        state.entries.clear();
        state.in_flight.clear();
        debug!("query cache cleared");
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }
}

impl Default for QueryStore {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::query::keys::QueryTag;
    use crate::domain::value_objects::PostId;
    use tokio::time::sleep;

    fn post_key(id: &str) -> QueryKey {
        QueryKey::PostById(PostId::new(id).unwrap())
    }

    /// 呼ばれた回数を数えながら `value` を返す fetcher を作る
    fn counting(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce(Option<u32>) -> BoxFuture<'static, Result<u32, AppError>> + Send {
        let calls = Arc::clone(calls);
        move |_| {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_millis(20)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_first_read_populates_and_second_read_hits_cache() {
        let store = QueryStore::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let first: u32 = store
            .fetch_query(QueryKey::RecentPosts, counting(&calls, 7))
            .await
            .unwrap();
        let second: u32 = store
            .fetch_query(QueryKey::RecentPosts, counting(&calls, 8))
            .await
            .unwrap();

        assert_eq!((first, second), (7, 7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snapshot = store.snapshot::<u32>(&QueryKey::RecentPosts).await;
        assert_eq!(snapshot.status, QueryStatus::Success);
        assert!(!snapshot.is_stale);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_request() {
        let store = QueryStore::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            store.fetch_query(QueryKey::CurrentUser, counting(&calls, 1)),
            store.fetch_query(QueryKey::CurrentUser, counting(&calls, 2)),
            store.fetch_query(QueryKey::CurrentUser, counting(&calls, 3)),
        );

        assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (1, 1, 1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_keys_are_independent() {
        let store = QueryStore::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            store.fetch_query(post_key("p1"), counting(&calls, 1)),
            store.fetch_query(post_key("p2"), counting(&calls, 2)),
        );

        assert_eq!((a.unwrap(), b.unwrap()), (1, 2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_marks_only_matching_entries_stale() {
        let store = QueryStore::default();
        store.set_query_data(post_key("p1"), 1u32).await;
        store.set_query_data(post_key("p2"), 2u32).await;
        store.set_query_data(QueryKey::RecentPosts, 3u32).await;

        let count = store
            .invalidate(&[QueryFilter::Exact(post_key("p1"))])
            .await;

        assert_eq!(count, 1);
        assert!(store.snapshot::<u32>(&post_key("p1")).await.is_stale);
        assert!(!store.snapshot::<u32>(&post_key("p2")).await.is_stale);
        assert!(!store.snapshot::<u32>(&QueryKey::RecentPosts).await.is_stale);

        let calls = Arc::new(AtomicUsize::new(0));
        let refreshed: u32 = store
            .fetch_query(post_key("p1"), counting(&calls, 10))
            .await
            .unwrap();
        assert_eq!(refreshed, 10);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tag_filter_invalidates_every_parameter() {
        let store = QueryStore::default();
        store.set_query_data(post_key("p1"), 1u32).await;
        store.set_query_data(post_key("p2"), 2u32).await;
        store.set_query_data(QueryKey::CurrentUser, 3u32).await;

        let count = store
            .invalidate(&[QueryFilter::Tag(QueryTag::PostById)])
            .await;

        assert_eq!(count, 2);
        assert!(!store.snapshot::<u32>(&QueryKey::CurrentUser).await.is_stale);
    }

    #[tokio::test]
    async fn test_stale_entry_keeps_data_while_refetching() {
        let store = Arc::new(QueryStore::default());
        store.set_query_data(QueryKey::RecentPosts, 1u32).await;
        store
            .invalidate(&[QueryFilter::Exact(QueryKey::RecentPosts)])
            .await;

        let calls = Arc::new(AtomicUsize::new(0));
        let background = {
            let store = Arc::clone(&store);
            let fetcher = counting(&calls, 2);
            tokio::spawn(async move { store.fetch_query(QueryKey::RecentPosts, fetcher).await })
        };
        sleep(Duration::from_millis(5)).await;

        let during = store.snapshot::<u32>(&QueryKey::RecentPosts).await;
        assert!(during.is_fetching);
        assert_eq!(during.data, Some(1));

        assert_eq!(background.await.unwrap().unwrap(), 2);
        let after = store.snapshot::<u32>(&QueryKey::RecentPosts).await;
        assert!(!after.is_fetching);
        assert_eq!(after.data, Some(2));
    }

    #[tokio::test]
    async fn test_result_landing_after_invalidation_stays_stale() {
        let store = Arc::new(QueryStore::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let background = {
            let store = Arc::clone(&store);
            let fetcher = counting(&calls, 1);
            tokio::spawn(async move { store.fetch_query(QueryKey::CurrentUser, fetcher).await })
        };
        sleep(Duration::from_millis(5)).await;

        assert_eq!(
            store
                .invalidate(&[QueryFilter::Exact(QueryKey::CurrentUser)])
                .await,
            1
        );
        assert!(!store.is_fetching(&QueryKey::CurrentUser).await);
        assert_eq!(background.await.unwrap().unwrap(), 1);

        let snapshot = store.snapshot::<u32>(&QueryKey::CurrentUser).await;
        assert_eq!(snapshot.data, Some(1));
        assert!(snapshot.is_stale);
    }

    #[tokio::test]
    async fn test_result_lands_after_caller_is_dropped() {
        let store = QueryStore::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(5),
            store.fetch_query(QueryKey::CurrentUser, counting(&calls, 4)),
        )
        .await;
        assert!(abandoned.is_err());

        sleep(Duration::from_millis(60)).await;
        let snapshot = store.snapshot::<u32>(&QueryKey::CurrentUser).await;
        assert_eq!(snapshot.status, QueryStatus::Success);
        assert_eq!(snapshot.data, Some(4));
        assert!(!snapshot.is_fetching);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_clear_discards_results_of_running_requests() {
        let store = Arc::new(QueryStore::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let background = {
            let store = Arc::clone(&store);
            let fetcher = counting(&calls, 1);
            tokio::spawn(async move { store.fetch_query(QueryKey::CurrentUser, fetcher).await })
        };
        sleep(Duration::from_millis(5)).await;

        store.clear().await;
        // 呼び出し元には結果が返るが、キャッシュには戻らない
        assert_eq!(background.await.unwrap().unwrap(), 1);
        assert!(store.is_empty().await);

        // clear 後に始めた取得は通常どおり書き込まれる
        let fresh: u32 = store
            .fetch_query(QueryKey::CurrentUser, counting(&calls, 2))
            .await
            .unwrap();
        assert_eq!(fresh, 2);
        assert_eq!(store.get_query_data::<u32>(&QueryKey::CurrentUser).await, Some(2));
    }

    #[tokio::test]
    async fn test_remove_query_discards_only_that_key() {
        let store = Arc::new(QueryStore::default());
        store.set_query_data(post_key("p2"), 2u32).await;
        let calls = Arc::new(AtomicUsize::new(0));
        let background = {
            let store = Arc::clone(&store);
            let fetcher = counting(&calls, 1);
            tokio::spawn(async move { store.fetch_query(post_key("p1"), fetcher).await })
        };
        sleep(Duration::from_millis(5)).await;

        assert!(!store.remove_query(&post_key("p1")).await);
        assert!(!store.is_fetching(&post_key("p1")).await);
        background.await.unwrap().unwrap();

        assert!(store.get_query_data::<u32>(&post_key("p1")).await.is_none());
        assert!(store.remove_query(&post_key("p2")).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_read_reports_error_without_retry() {
        let store = QueryStore::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<u32, AppError> = store
            .fetch_query(QueryKey::RecentPosts, move |_| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Network("offline".into()))
            })
            .await;

        assert_eq!(result, Err(AppError::Network("offline".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let snapshot = store.snapshot::<u32>(&QueryKey::RecentPosts).await;
        assert_eq!(snapshot.status, QueryStatus::Error);
        assert!(snapshot.data.is_none());
    }

    #[tokio::test]
    async fn test_mutation_invalidates_only_on_success() {
        let store = QueryStore::default();
        store.set_query_data(QueryKey::RecentPosts, 1u32).await;

        let failed: Result<(), AppError> = store
            .mutate(
                "create_post",
                async { Err(AppError::Backend("rejected".into())) },
                |_| vec![QueryFilter::Exact(QueryKey::RecentPosts)],
            )
            .await;
        assert!(failed.is_err());
        assert!(!store.snapshot::<u32>(&QueryKey::RecentPosts).await.is_stale);

        store
            .mutate("create_post", async { Ok(()) }, |_| {
                vec![QueryFilter::Exact(QueryKey::RecentPosts)]
            })
            .await
            .unwrap();
        assert!(store.snapshot::<u32>(&QueryKey::RecentPosts).await.is_stale);
        assert!(!store.is_mutating());
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let store = QueryStore::new(&CacheConfig {
            max_entries: 2,
            stale_time_secs: None,
        });
        let mut events = store.subscribe();

        store.set_query_data(post_key("p1"), 1u32).await;
        store.set_query_data(post_key("p2"), 2u32).await;
        store.set_query_data(post_key("p3"), 3u32).await;

        assert_eq!(store.len().await, 2);
        assert!(store.get_query_data::<u32>(&post_key("p1")).await.is_none());

        let mut evicted = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let CacheEvent::Evicted(key) = event {
                evicted.push(key);
            }
        }
        assert_eq!(evicted, vec![post_key("p1")]);
    }

    #[tokio::test]
    async fn test_stale_time_expires_entries() {
        let store = QueryStore::new(&CacheConfig {
            max_entries: 8,
            stale_time_secs: Some(0),
        });
        store.set_query_data(QueryKey::RecentPosts, 1u32).await;
        assert!(store.snapshot::<u32>(&QueryKey::RecentPosts).await.is_stale);
    }

    #[tokio::test]
    async fn test_type_mismatch_is_an_internal_error() {
        let store = QueryStore::default();
        store.set_query_data(QueryKey::RecentPosts, 1u32).await;

        let result: Result<String, AppError> = store
            .fetch_query(QueryKey::RecentPosts, |_| async { Ok(String::new()) })
            .await;
        assert!(matches!(result, Err(AppError::Internal(_))));
        assert_eq!(
            store.get_query_data::<u32>(&QueryKey::RecentPosts).await,
            Some(1)
        );
    }
}

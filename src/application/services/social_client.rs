use super::{SocialMutations, SocialQueries};
use crate::application::ports::SocialBackend;
use crate::application::query::{CacheEvent, QueryStore};
use crate::shared::config::AppConfig;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// クライアント全体の状態。ストアとバックエンドを 1 組だけ持ち、
/// 読み取り・書き込みの両方に同じハンドルを渡す
#[derive(Clone)]
pub struct SocialClient {
    pub store: Arc<QueryStore>,
    pub backend: Arc<dyn SocialBackend>,
    pub queries: Arc<SocialQueries>,
    pub mutations: Arc<SocialMutations>,
    pub config: AppConfig,
}

impl SocialClient {
    pub fn new(config: AppConfig, backend: Arc<dyn SocialBackend>) -> Self {
        let store = Arc::new(QueryStore::new(&config.cache));
        info!(
            max_entries = config.cache.max_entries,
            stale_time_secs = ?config.cache.stale_time_secs,
            "social client initialized"
        );
        Self::with_store(config, store, backend)
    }

    /// 既存のストアを共有して組み立てる
    pub fn with_store(
        config: AppConfig,
        store: Arc<QueryStore>,
        backend: Arc<dyn SocialBackend>,
    ) -> Self {
        let queries = Arc::new(SocialQueries::new(Arc::clone(&store), Arc::clone(&backend)));
        let mutations = Arc::new(SocialMutations::new(
            Arc::clone(&store),
            Arc::clone(&backend),
        ));
        Self {
            store,
            backend,
            queries,
            mutations,
            config,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.store.subscribe()
    }

    /// キャッシュを破棄する（サインアウト後やアプリ終了時）
    pub async fn teardown(&self) {
        self.store.clear().await;
        info!("social client cache cleared");
    }
}

use crate::application::ports::SocialBackend;
use crate::application::query::{
    InfinitePosts, QueryKey, QueryResult, QuerySnapshot, QueryStore,
};
use crate::domain::entities::{Post, User};
use crate::domain::value_objects::{PostId, UserId};
use crate::shared::error::AppError;
use std::sync::Arc;
use tracing::debug;

/// 読み取り操作。すべて `QueryStore` 経由で取得し、キャッシュを共有する
pub struct SocialQueries {
    store: Arc<QueryStore>,
    backend: Arc<dyn SocialBackend>,
}

impl SocialQueries {
    pub fn new(store: Arc<QueryStore>, backend: Arc<dyn SocialBackend>) -> Self {
        Self { store, backend }
    }

    /// サインインしていなければ `Success(None)`
    pub async fn get_current_user(&self) -> QueryResult<Option<User>> {
        let backend = Arc::clone(&self.backend);
        self.store
            .fetch_query(QueryKey::CurrentUser, move |_| async move {
                backend.get_current_user().await
            })
            .await
            .into()
    }

    pub async fn get_recent_posts(&self) -> QueryResult<Vec<Post>> {
        let backend = Arc::clone(&self.backend);
        self.store
            .fetch_query(QueryKey::RecentPosts, move |_| async move {
                backend.get_recent_posts().await
            })
            .await
            .into()
    }

    /// 読み込み済みのページ列。
    ///
    /// 初回は先頭ページだけを取得する。無効化後の再取得では、以前に読み込んでいた
    /// ページ数まで先頭から取り直す（空ページが来たらそこで止める）。
    pub async fn get_infinite_posts(&self) -> QueryResult<InfinitePosts> {
        let backend = Arc::clone(&self.backend);
        self.store
            .fetch_query(
                QueryKey::InfinitePosts,
                move |previous: Option<InfinitePosts>| {
                    let pages = previous.map_or(1, |seq| seq.page_count().max(1));
                    load_pages(backend, pages)
                },
            )
            .await
            .into()
    }

    /// 次のページを取得してキャッシュ上のページ列に追加する。
    ///
    /// 終端（空ページ）に達していればリクエストを出さずに現在の列を返す。
    pub async fn fetch_next_page(&self) -> QueryResult<InfinitePosts> {
        let current = match self.get_infinite_posts().await {
            QueryResult::Success(seq) => seq,
            other => return other,
        };
        if !current.has_next_page() {
            debug!(pages = current.page_count(), "no more pages to fetch");
            return QueryResult::Success(current);
        }

        let backend = Arc::clone(&self.backend);
        self.store
            .refetch_query(
                QueryKey::InfinitePosts,
                move |previous: Option<InfinitePosts>| async move {
                    let mut seq = previous.unwrap_or(current);
                    if seq.has_next_page() {
                        let page = backend.get_infinite_posts(seq.next_cursor()).await?;
                        debug!(
                            page = seq.page_count() + 1,
                            documents = page.documents.len(),
                            "fetched next page"
                        );
                        seq.push_page(page);
                    }
                    Ok(seq)
                },
            )
            .await
            .into()
    }

    /// id が未指定・空なら `Disabled`（リクエストを出さない）
    pub async fn get_post_by_id(&self, post_id: Option<&str>) -> QueryResult<Post> {
        let Some(post_id) = PostId::from_optional(post_id) else {
            return QueryResult::Disabled;
        };
        let backend = Arc::clone(&self.backend);
        let key = QueryKey::PostById(post_id.clone());
        self.store
            .fetch_query(key, move |_| async move {
                backend.get_post_by_id(&post_id).await
            })
            .await
            .into()
    }

    /// 検索語が空なら `Disabled`
    pub async fn search_posts(&self, term: &str) -> QueryResult<Vec<Post>> {
        if term.is_empty() {
            return QueryResult::Disabled;
        }
        let backend = Arc::clone(&self.backend);
        let owned = term.to_string();
        self.store
            .fetch_query(QueryKey::SearchPosts(owned.clone()), move |_| async move {
                backend.search_posts(&owned).await
            })
            .await
            .into()
    }

    pub async fn get_user_by_id(&self, user_id: Option<&str>) -> QueryResult<User> {
        let Some(user_id) = UserId::from_optional(user_id) else {
            return QueryResult::Disabled;
        };
        let backend = Arc::clone(&self.backend);
        let key = QueryKey::UserById(user_id.clone());
        self.store
            .fetch_query(key, move |_| async move {
                backend.get_user_by_id(&user_id).await
            })
            .await
            .into()
    }

    pub async fn get_users(&self, limit: Option<usize>) -> QueryResult<Vec<User>> {
        let backend = Arc::clone(&self.backend);
        self.store
            .fetch_query(QueryKey::Users { limit }, move |_| async move {
                backend.get_users(limit).await
            })
            .await
            .into()
    }

    pub async fn current_user_snapshot(&self) -> QuerySnapshot<Option<User>> {
        self.store.snapshot(&QueryKey::CurrentUser).await
    }

    pub async fn recent_posts_snapshot(&self) -> QuerySnapshot<Vec<Post>> {
        self.store.snapshot(&QueryKey::RecentPosts).await
    }

    pub async fn infinite_posts_snapshot(&self) -> QuerySnapshot<InfinitePosts> {
        self.store.snapshot(&QueryKey::InfinitePosts).await
    }

    /// 読み込み済みページを 1 本の投稿列にしたもの（ホームフィードの無限スクロール用）
    pub async fn feed_posts_snapshot(&self) -> QuerySnapshot<Vec<Post>> {
        self.infinite_posts_snapshot()
            .await
            .map(|seq| seq.posts().cloned().collect())
    }

    pub async fn post_snapshot(&self, post_id: Option<&str>) -> QuerySnapshot<Post> {
        match PostId::from_optional(post_id) {
            Some(post_id) => self.store.snapshot(&QueryKey::PostById(post_id)).await,
            None => QuerySnapshot::disabled(),
        }
    }
}

async fn load_pages(
    backend: Arc<dyn SocialBackend>,
    pages: usize,
) -> Result<InfinitePosts, AppError> {
    let mut seq = InfinitePosts::new();
    while seq.page_count() < pages && seq.has_next_page() {
        let page = backend.get_infinite_posts(seq.next_cursor()).await?;
        seq.push_page(page);
    }
    debug!(pages = seq.page_count(), "loaded post pages");
    Ok(seq)
}

use crate::application::ports::SocialBackend;
use crate::application::query::{QueryFilter, QueryKey, QueryStore, QueryTag};
use crate::domain::entities::{
    NewPost, NewUser, Post, Save, Session, SignInCredentials, UpdatePost, UpdateUser, User,
};
use crate::domain::value_objects::{PostId, SaveId, UserId};
use crate::shared::error::AppError;
use std::sync::Arc;

/// 投稿に関わる一覧すべて（いいね・保存の反映先）
fn post_listings() -> Vec<QueryFilter> {
    vec![
        QueryFilter::Exact(QueryKey::RecentPosts),
        QueryFilter::Tag(QueryTag::InfinitePosts),
        QueryFilter::Exact(QueryKey::CurrentUser),
    ]
}

/// 書き込み操作。
///
/// リモートへの書き込みが成功したときだけ、操作ごとに宣言したキーを
/// 自分が保持している `QueryStore` 上で無効化する。失敗時はエラーを返すだけで
/// キャッシュには触れない。
pub struct SocialMutations {
    store: Arc<QueryStore>,
    backend: Arc<dyn SocialBackend>,
}

impl SocialMutations {
    pub fn new(store: Arc<QueryStore>, backend: Arc<dyn SocialBackend>) -> Self {
        Self { store, backend }
    }

    pub async fn create_user_account(&self, user: NewUser) -> Result<User, AppError> {
        self.store
            .mutate(
                "create_user_account",
                self.backend.create_user_account(user),
                |_| Vec::new(),
            )
            .await
    }

    pub async fn sign_in_account(
        &self,
        credentials: SignInCredentials,
    ) -> Result<Session, AppError> {
        self.store
            .mutate(
                "sign_in_account",
                self.backend.sign_in_account(credentials),
                |_| Vec::new(),
            )
            .await
    }

    pub async fn sign_out_account(&self) -> Result<(), AppError> {
        self.store
            .mutate("sign_out_account", self.backend.sign_out_account(), |_| {
                Vec::new()
            })
            .await
    }

    pub async fn create_post(&self, post: NewPost) -> Result<Post, AppError> {
        self.store
            .mutate("create_post", self.backend.create_post(post), |_| {
                vec![QueryFilter::Exact(QueryKey::RecentPosts)]
            })
            .await
    }

    pub async fn update_post(&self, post: UpdatePost) -> Result<Post, AppError> {
        self.store
            .mutate("update_post", self.backend.update_post(post), |updated| {
                vec![QueryFilter::Exact(QueryKey::PostById(updated.id.clone()))]
            })
            .await
    }

    pub async fn delete_post(&self, post_id: &PostId, image_id: &str) -> Result<(), AppError> {
        self.store
            .mutate(
                "delete_post",
                self.backend.delete_post(post_id, image_id),
                |_| vec![QueryFilter::Exact(QueryKey::RecentPosts)],
            )
            .await
    }

    /// いいね一覧を `likes` で置き換える
    pub async fn like_post(&self, post_id: &PostId, likes: Vec<UserId>) -> Result<Post, AppError> {
        self.store
            .mutate("like_post", self.backend.like_post(post_id, likes), |post| {
                let mut filters = vec![QueryFilter::Exact(QueryKey::PostById(post.id.clone()))];
                filters.extend(post_listings());
                filters
            })
            .await
    }

    /// `user_id` のいいねを付け外しする
    pub async fn toggle_like(&self, post: &Post, user_id: &UserId) -> Result<Post, AppError> {
        self.like_post(&post.id, post.toggled_likes(user_id)).await
    }

    pub async fn save_post(&self, user_id: &UserId, post_id: &PostId) -> Result<Save, AppError> {
        self.store
            .mutate(
                "save_post",
                self.backend.save_post(user_id, post_id),
                |_| post_listings(),
            )
            .await
    }

    pub async fn delete_saved_post(&self, save_id: &SaveId) -> Result<(), AppError> {
        self.store
            .mutate(
                "delete_saved_post",
                self.backend.delete_saved_post(save_id),
                |_| post_listings(),
            )
            .await
    }

    /// 保存済みなら保存を取り消し、未保存なら保存する。戻り値は操作後に保存されているか
    pub async fn toggle_save(&self, user: &User, post_id: &PostId) -> Result<bool, AppError> {
        match user.saved_record_for(post_id) {
            Some(save_id) => {
                self.delete_saved_post(save_id).await?;
                Ok(false)
            }
            None => {
                self.save_post(&user.id, post_id).await?;
                Ok(true)
            }
        }
    }

    pub async fn update_user(&self, user: UpdateUser) -> Result<User, AppError> {
        self.store
            .mutate("update_user", self.backend.update_user(user), |updated| {
                vec![
                    QueryFilter::Exact(QueryKey::CurrentUser),
                    QueryFilter::Exact(QueryKey::UserById(updated.id.clone())),
                ]
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::remote::InMemoryBackend;
    use crate::shared::config::BackendConfig;

    async fn seeded() -> (SocialMutations, Arc<QueryStore>, Arc<InMemoryBackend>, Post) {
        let backend = Arc::new(InMemoryBackend::new(&BackendConfig::default()));
        let author = backend.seed_user("Al", "al").await;
        let post = backend.seed_post(&author.id, "first light").await;
        let store = Arc::new(QueryStore::default());
        let mutations = SocialMutations::new(Arc::clone(&store), backend.clone());
        (mutations, store, backend, post)
    }

    #[tokio::test]
    async fn test_update_post_invalidates_only_that_post() {
        let (mutations, store, _backend, post) = seeded().await;
        let other = QueryKey::PostById(PostId::new("other").unwrap());
        store.set_query_data(QueryKey::PostById(post.id.clone()), post.clone()).await;
        store.set_query_data(other.clone(), post.clone()).await;
        store.set_query_data(QueryKey::RecentPosts, vec![post.clone()]).await;

        mutations
            .update_post(UpdatePost {
                post_id: post.id.clone(),
                caption: "edited caption".into(),
                image: None,
                location: "Tokyo".into(),
                tags: vec![],
            })
            .await
            .unwrap();

        assert!(store.snapshot::<Post>(&QueryKey::PostById(post.id.clone())).await.is_stale);
        assert!(!store.snapshot::<Post>(&other).await.is_stale);
        assert!(!store.snapshot::<Vec<Post>>(&QueryKey::RecentPosts).await.is_stale);
    }

    #[tokio::test]
    async fn test_toggle_like_adds_then_removes() {
        let (mutations, _store, _backend, post) = seeded().await;
        let liker = UserId::new("liker").unwrap();

        let liked = mutations.toggle_like(&post, &liker).await.unwrap();
        assert!(liked.is_liked_by(&liker));

        let unliked = mutations.toggle_like(&liked, &liker).await.unwrap();
        assert!(!unliked.is_liked_by(&liker));
    }

    #[tokio::test]
    async fn test_failed_delete_leaves_cache_untouched() {
        let (mutations, store, _backend, post) = seeded().await;
        store.set_query_data(QueryKey::RecentPosts, vec![post]).await;

        let result = mutations
            .delete_post(&PostId::new("missing").unwrap(), "img")
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert!(!store.snapshot::<Vec<Post>>(&QueryKey::RecentPosts).await.is_stale);
    }
}

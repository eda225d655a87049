use crate::application::ports::SocialBackend;
use crate::application::query::PostPage;
use crate::domain::entities::{
    Creator, NewPost, NewUser, Post, Save, Session, SignInCredentials, UpdatePost, UpdateUser,
    User,
};
use crate::domain::value_objects::{PageCursor, PostId, SaveId, UserId};
use crate::shared::config::BackendConfig;
use crate::shared::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

const OPERATIONS: [&str; 17] = [
    "create_user_account",
    "sign_in_account",
    "sign_out_account",
    "get_current_user",
    "create_post",
    "update_post",
    "delete_post",
    "get_recent_posts",
    "get_infinite_posts",
    "get_post_by_id",
    "search_posts",
    "like_post",
    "save_post",
    "delete_saved_post",
    "get_user_by_id",
    "get_users",
    "update_user",
];

/// デモ・テスト用の初期パスワード
pub const SEED_PASSWORD: &str = "password123";

#[derive(Debug, Clone)]
struct SaveRecord {
    id: SaveId,
    user_id: UserId,
    post_id: PostId,
    created_at: DateTime<Utc>,
}

#[derive(Default)]
struct BackendState {
    /// liked / saves は読み出し時に組み立てるので空のまま保持する
    users: Vec<User>,
    passwords: HashMap<String, String>,
    /// 作成順。一覧は末尾（新しい方）から返す
    posts: Vec<Post>,
    saves: Vec<SaveRecord>,
    session: Option<Session>,
}

impl BackendState {
    fn user(&self, user_id: &UserId) -> Result<&User, AppError> {
        self.users
            .iter()
            .find(|user| &user.id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))
    }

    fn post(&self, post_id: &PostId) -> Result<&Post, AppError> {
        self.posts
            .iter()
            .find(|post| &post.id == post_id)
            .ok_or_else(|| AppError::NotFound(format!("post {post_id}")))
    }

    fn post_mut(&mut self, post_id: &PostId) -> Result<&mut Post, AppError> {
        self.posts
            .iter_mut()
            .find(|post| &post.id == post_id)
            .ok_or_else(|| AppError::NotFound(format!("post {post_id}")))
    }

    fn newest_first(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter().rev()
    }

    /// いいね・保存の関連を展開したユーザードキュメント
    fn hydrate(&self, user: &User) -> User {
        let mut hydrated = user.clone();
        hydrated.liked = self
            .newest_first()
            .filter(|post| post.is_liked_by(&user.id))
            .cloned()
            .collect();
        hydrated.saves = self
            .saves
            .iter()
            .filter(|record| record.user_id == user.id)
            .filter_map(|record| {
                let post = self.post(&record.post_id).ok()?.clone();
                Some(Save {
                    id: record.id.clone(),
                    user_id: record.user_id.clone(),
                    post,
                    created_at: record.created_at,
                })
            })
            .collect();
        hydrated
    }
}

/// プロセス内で完結する `SocialBackend` 実装。
///
/// 永続化はしない。呼び出し回数を操作ごとに数え、任意の遅延を挟める。
pub struct InMemoryBackend {
    state: Arc<RwLock<BackendState>>,
    calls: HashMap<&'static str, AtomicUsize>,
    latency: Option<Duration>,
    page_size: usize,
    recent_limit: usize,
    avatar_base: String,
}

impl InMemoryBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            state: Arc::new(RwLock::new(BackendState::default())),
            calls: OPERATIONS
                .iter()
                .map(|name| (*name, AtomicUsize::new(0)))
                .collect(),
            latency: None,
            page_size: config.page_size.max(1),
            recent_limit: config.recent_limit.max(1),
            avatar_base: format!("{}/avatars/initials", config.endpoint.trim_end_matches('/')),
        }
    }

    /// 各操作の前に `latency` だけ待つ
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .get(operation)
            .map_or(0, |count| count.load(Ordering::SeqCst))
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .values()
            .map(|count| count.load(Ordering::SeqCst))
            .sum()
    }

    pub fn reset_calls(&self) {
        for count in self.calls.values() {
            count.store(0, Ordering::SeqCst);
        }
    }

    async fn enter(&self, operation: &'static str) {
        if let Some(count) = self.calls.get(operation) {
            count.fetch_add(1, Ordering::SeqCst);
        }
        debug!(operation, "in-memory backend call");
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn avatar_url(&self, name: &str) -> String {
        let name: String = name
            .chars()
            .map(|c| if c.is_whitespace() { '+' } else { c })
            .collect();
        format!("{}?name={name}", self.avatar_base)
    }

    /// 呼び出し回数に数えずにユーザーを登録する（パスワードは `SEED_PASSWORD`）
    pub async fn seed_user(&self, name: &str, username: &str) -> User {
        let mut user = User::new(
            name.to_string(),
            username.to_string(),
            format!("{username}@example.com"),
        );
        user.image_url = self.avatar_url(name);
        let mut state = self.state.write().await;
        state
            .passwords
            .insert(user.email.clone(), SEED_PASSWORD.to_string());
        state.users.push(user.clone());
        user
    }

    /// 呼び出し回数に数えずに投稿を登録する
    pub async fn seed_post(&self, creator: &UserId, caption: &str) -> Post {
        let mut state = self.state.write().await;
        let creator = match state.user(creator) {
            Ok(user) => user.creator(),
            Err(_) => Creator {
                id: creator.clone(),
                name: String::new(),
                username: String::new(),
                image_url: String::new(),
            },
        };
        let post = Post::new(creator, caption.to_string());
        state.posts.push(post.clone());
        post
    }

    /// 呼び出し回数に数えずにセッションを開始する
    pub async fn sign_in_as(&self, user_id: &UserId) -> Session {
        let session = Session {
            id: SaveId::random().to_string(),
            user_id: user_id.clone(),
            created_at: Utc::now(),
        };
        self.state.write().await.session = Some(session.clone());
        session
    }
}

#[async_trait]
impl SocialBackend for InMemoryBackend {
    async fn create_user_account(&self, user: NewUser) -> Result<User, AppError> {
        self.enter("create_user_account").await;
        let mut state = self.state.write().await;
        if state.passwords.contains_key(&user.email) {
            return Err(AppError::Backend(format!(
                "a user with email {} already exists",
                user.email
            )));
        }
        let mut created = User::new(user.name, user.username, user.email);
        created.image_url = self.avatar_url(&created.name);
        state.passwords.insert(created.email.clone(), user.password);
        state.users.push(created.clone());
        Ok(created)
    }

    async fn sign_in_account(&self, credentials: SignInCredentials) -> Result<Session, AppError> {
        self.enter("sign_in_account").await;
        let mut state = self.state.write().await;
        let accepted = state
            .passwords
            .get(&credentials.email)
            .is_some_and(|password| *password == credentials.password);
        if !accepted {
            return Err(AppError::Unauthorized("invalid credentials".to_string()));
        }
        let user_id = state
            .users
            .iter()
            .find(|user| user.email == credentials.email)
            .map(|user| user.id.clone())
            .ok_or_else(|| AppError::NotFound(format!("user {}", credentials.email)))?;
        let session = Session {
            id: SaveId::random().to_string(),
            user_id,
            created_at: Utc::now(),
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out_account(&self) -> Result<(), AppError> {
        self.enter("sign_out_account").await;
        self.state.write().await.session = None;
        Ok(())
    }

    async fn get_current_user(&self) -> Result<Option<User>, AppError> {
        self.enter("get_current_user").await;
        let state = self.state.read().await;
        let Some(session) = &state.session else {
            return Ok(None);
        };
        let user = state.user(&session.user_id)?;
        Ok(Some(state.hydrate(user)))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, AppError> {
        self.enter("create_post").await;
        let mut state = self.state.write().await;
        let creator = state.user(&post.creator)?.creator();
        let mut created = Post::new(creator, post.caption).with_tags(post.tags);
        created.location = post.location;
        created.image_id = post.image.image_id;
        created.image_url = post.image.image_url;
        state.posts.push(created.clone());
        Ok(created)
    }

    async fn update_post(&self, post: UpdatePost) -> Result<Post, AppError> {
        self.enter("update_post").await;
        let mut state = self.state.write().await;
        let stored = state.post_mut(&post.post_id)?;
        stored.apply_update(&post);
        Ok(stored.clone())
    }

    async fn delete_post(&self, post_id: &PostId, image_id: &str) -> Result<(), AppError> {
        self.enter("delete_post").await;
        let mut state = self.state.write().await;
        state.post(post_id)?;
        state.posts.retain(|post| &post.id != post_id);
        state.saves.retain(|record| &record.post_id != post_id);
        debug!(%post_id, image_id, "post deleted");
        Ok(())
    }

    async fn get_recent_posts(&self) -> Result<Vec<Post>, AppError> {
        self.enter("get_recent_posts").await;
        let state = self.state.read().await;
        Ok(state.newest_first().take(self.recent_limit).cloned().collect())
    }

    async fn get_infinite_posts(&self, cursor: Option<PageCursor>) -> Result<PostPage, AppError> {
        self.enter("get_infinite_posts").await;
        let state = self.state.read().await;
        let skip = match &cursor {
            None => 0,
            Some(cursor) => {
                let position = state
                    .newest_first()
                    .position(|post| &post.id == cursor.last_post_id())
                    .ok_or_else(|| AppError::NotFound(format!("cursor {cursor}")))?;
                position + 1
            }
        };
        let documents = state
            .newest_first()
            .skip(skip)
            .take(self.page_size)
            .cloned()
            .collect();
        Ok(PostPage::new(documents))
    }

    async fn get_post_by_id(&self, post_id: &PostId) -> Result<Post, AppError> {
        self.enter("get_post_by_id").await;
        let state = self.state.read().await;
        state.post(post_id).cloned()
    }

    async fn search_posts(&self, term: &str) -> Result<Vec<Post>, AppError> {
        self.enter("search_posts").await;
        let needle = term.to_lowercase();
        let state = self.state.read().await;
        Ok(state
            .newest_first()
            .filter(|post| post.caption.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn like_post(&self, post_id: &PostId, likes: Vec<UserId>) -> Result<Post, AppError> {
        self.enter("like_post").await;
        let mut state = self.state.write().await;
        let stored = state.post_mut(post_id)?;
        stored.likes = likes;
        Ok(stored.clone())
    }

    async fn save_post(&self, user_id: &UserId, post_id: &PostId) -> Result<Save, AppError> {
        self.enter("save_post").await;
        let mut state = self.state.write().await;
        state.user(user_id)?;
        let post = state.post(post_id)?.clone();
        let save = Save::new(user_id.clone(), post);
        state.saves.push(SaveRecord {
            id: save.id.clone(),
            user_id: save.user_id.clone(),
            post_id: post_id.clone(),
            created_at: save.created_at,
        });
        Ok(save)
    }

    async fn delete_saved_post(&self, save_id: &SaveId) -> Result<(), AppError> {
        self.enter("delete_saved_post").await;
        let mut state = self.state.write().await;
        let before = state.saves.len();
        state.saves.retain(|record| &record.id != save_id);
        if state.saves.len() == before {
            return Err(AppError::NotFound(format!("save {save_id}")));
        }
        Ok(())
    }

    async fn get_user_by_id(&self, user_id: &UserId) -> Result<User, AppError> {
        self.enter("get_user_by_id").await;
        let state = self.state.read().await;
        let user = state.user(user_id)?;
        Ok(state.hydrate(user))
    }

    async fn get_users(&self, limit: Option<usize>) -> Result<Vec<User>, AppError> {
        self.enter("get_users").await;
        let state = self.state.read().await;
        let newest = state.users.iter().rev();
        let users: Vec<User> = match limit {
            Some(limit) => newest.take(limit).map(|user| state.hydrate(user)).collect(),
            None => newest.map(|user| state.hydrate(user)).collect(),
        };
        Ok(users)
    }

    async fn update_user(&self, user: UpdateUser) -> Result<User, AppError> {
        self.enter("update_user").await;
        let mut state = self.state.write().await;
        let stored = state
            .users
            .iter_mut()
            .find(|stored| stored.id == user.user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user.user_id)))?;
        stored.apply_update(&user);
        let creator = stored.creator();
        for post in state.posts.iter_mut().filter(|post| post.creator.id == creator.id) {
            post.creator = creator.clone();
        }
        let updated = state.user(&user.user_id)?;
        Ok(state.hydrate(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend(page_size: usize) -> InMemoryBackend {
        InMemoryBackend::new(&BackendConfig {
            page_size,
            ..BackendConfig::default()
        })
    }

    #[tokio::test]
    async fn test_pages_follow_cursor_and_end_empty() {
        let backend = backend(2);
        let author = backend.seed_user("Al", "al").await;
        for n in 0..3 {
            backend.seed_post(&author.id, &format!("post {n}")).await;
        }

        let first = backend.get_infinite_posts(None).await.unwrap();
        assert_eq!(first.documents.len(), 2);
        assert_eq!(first.documents[0].caption, "post 2");

        let second = backend.get_infinite_posts(first.next_cursor()).await.unwrap();
        assert_eq!(second.documents.len(), 1);
        assert_eq!(second.documents[0].caption, "post 0");

        let third = backend.get_infinite_posts(second.next_cursor()).await.unwrap();
        assert!(third.is_empty());
        assert_eq!(backend.calls("get_infinite_posts"), 3);
    }

    #[tokio::test]
    async fn test_current_user_includes_likes_and_saves() {
        let backend = backend(9);
        let author = backend.seed_user("Al", "al").await;
        let post = backend.seed_post(&author.id, "sunrise").await;

        assert_eq!(backend.get_current_user().await.unwrap(), None);

        let session = backend
            .sign_in_account(SignInCredentials {
                email: author.email.clone(),
                password: SEED_PASSWORD.to_string(),
            })
            .await
            .unwrap();
        assert_eq!(session.user_id, author.id);

        backend
            .like_post(&post.id, vec![author.id.clone()])
            .await
            .unwrap();
        backend.save_post(&author.id, &post.id).await.unwrap();

        let current = backend.get_current_user().await.unwrap().unwrap();
        assert_eq!(current.liked.len(), 1);
        assert!(current.has_saved(&post.id));
    }

    #[tokio::test]
    async fn test_wrong_password_is_unauthorized() {
        let backend = backend(9);
        let author = backend.seed_user("Al", "al").await;

        let result = backend
            .sign_in_account(SignInCredentials {
                email: author.email,
                password: "nope".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let backend = backend(9);
        let author = backend.seed_user("Al", "al").await;
        backend.seed_post(&author.id, "Mountain Lake").await;
        backend.seed_post(&author.id, "city").await;

        let found = backend.search_posts("lake").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].caption, "Mountain Lake");
    }
}

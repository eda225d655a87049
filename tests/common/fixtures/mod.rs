use snapgram_lib::{
    AppConfig, BackendConfig, CacheConfig, Creator, InMemoryBackend, Post, PostId, SocialBackend,
    SocialClient, User, UserId,
};
use std::sync::Arc;
use std::time::Duration;

pub fn create_test_creator(id: &str) -> Creator {
    Creator {
        id: UserId::new(id).unwrap(),
        name: format!("Test User {id}"),
        username: format!("user_{id}"),
        image_url: format!("https://example.com/avatars/{id}.png"),
    }
}

pub fn create_test_post(id: &str, creator_id: &str) -> Post {
    let mut post = Post::new(create_test_creator(creator_id), format!("Test post content {id}"));
    post.id = PostId::new(id).unwrap();
    post.tags = vec!["test".into(), "fixture".into()];
    post
}

pub fn create_test_user(id: &str) -> User {
    let mut user = User::new(
        format!("Test User {id}"),
        format!("user_{id}"),
        format!("{id}@example.com"),
    );
    user.id = UserId::new(id).unwrap();
    user
}

pub fn test_config(page_size: usize) -> AppConfig {
    AppConfig {
        cache: CacheConfig::default(),
        backend: BackendConfig {
            page_size,
            ..BackendConfig::default()
        },
    }
}

/// インメモリのバックエンドとそれを使うクライアント
pub struct TestApp {
    pub backend: Arc<InMemoryBackend>,
    pub client: SocialClient,
}

impl TestApp {
    pub fn new(page_size: usize) -> Self {
        Self::build(InMemoryBackend::new(&test_config(page_size).backend), page_size)
    }

    /// すべてのバックエンド呼び出しに `latency` を挟む
    pub fn with_latency(page_size: usize, latency: Duration) -> Self {
        let backend = InMemoryBackend::new(&test_config(page_size).backend).with_latency(latency);
        Self::build(backend, page_size)
    }

    fn build(backend: InMemoryBackend, page_size: usize) -> Self {
        let backend = Arc::new(backend);
        let client = SocialClient::new(
            test_config(page_size),
            backend.clone() as Arc<dyn SocialBackend>,
        );
        Self { backend, client }
    }

    /// ユーザーと投稿を用意し、先頭のユーザーでサインインする。
    ///
    /// 投稿には作者が要るので、`users` が 0 なら投稿も作らない
    pub async fn seed(&self, users: usize, posts: usize) -> Vec<User> {
        let mut seeded = Vec::with_capacity(users);
        for n in 0..users {
            seeded.push(
                self.backend
                    .seed_user(&format!("Member {n}"), &format!("member{n}"))
                    .await,
            );
        }
        let post_count = if seeded.is_empty() { 0 } else { posts };
        for n in 0..post_count {
            let author = &seeded[n % seeded.len()];
            self.backend
                .seed_post(&author.id, &format!("caption {n}"))
                .await;
        }
        if let Some(first) = seeded.first() {
            self.backend.sign_in_as(&first.id).await;
        }
        self.backend.reset_calls();
        seeded
    }
}

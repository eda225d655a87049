pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;

pub use application::ports::SocialBackend;
pub use application::query::{
    CacheEvent, InfinitePosts, PostPage, QueryFilter, QueryKey, QueryResult, QuerySnapshot,
    QueryStatus, QueryStore, QueryTag,
};
pub use application::services::{SocialClient, SocialMutations, SocialQueries};
pub use domain::entities::{
    Creator, ImageRef, NewPost, NewUser, Post, Save, Session, SignInCredentials, UpdatePost,
    UpdateUser, User,
};
pub use domain::value_objects::{PageCursor, PostId, SaveId, UserId};
pub use infrastructure::remote::InMemoryBackend;
pub use presentation::views::{HomeFeedView, LikedPostsView, PageView, PostCard, SavedPostsView};
pub use shared::{AppConfig, AppError, BackendConfig, CacheConfig};

/// ログ設定の初期化。`RUST_LOG` が無ければ `snapgram=debug,info`
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    // テストなどで二重に初期化されても失敗扱いにしない
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "snapgram=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

use async_trait::async_trait;
use mockall::mock;

use snapgram_lib::application::ports::SocialBackend;
use snapgram_lib::application::query::PostPage;
use snapgram_lib::domain::entities::{
    NewPost, NewUser, Post, Save, Session, SignInCredentials, UpdatePost, UpdateUser, User,
};
use snapgram_lib::domain::value_objects::{PageCursor, PostId, SaveId, UserId};
use snapgram_lib::shared::error::AppError;

mock! {
    pub SocialBackendPort {}

    #[async_trait]
    impl SocialBackend for SocialBackendPort {
        async fn create_user_account(&self, user: NewUser) -> Result<User, AppError>;
        async fn sign_in_account(&self, credentials: SignInCredentials) -> Result<Session, AppError>;
        async fn sign_out_account(&self) -> Result<(), AppError>;
        async fn get_current_user(&self) -> Result<Option<User>, AppError>;
        async fn create_post(&self, post: NewPost) -> Result<Post, AppError>;
        async fn update_post(&self, post: UpdatePost) -> Result<Post, AppError>;
        async fn delete_post(&self, post_id: &PostId, image_id: &str) -> Result<(), AppError>;
        async fn get_recent_posts(&self) -> Result<Vec<Post>, AppError>;
        async fn get_infinite_posts(&self, cursor: Option<PageCursor>) -> Result<PostPage, AppError>;
        async fn get_post_by_id(&self, post_id: &PostId) -> Result<Post, AppError>;
        async fn search_posts(&self, term: &str) -> Result<Vec<Post>, AppError>;
        async fn like_post(&self, post_id: &PostId, likes: Vec<UserId>) -> Result<Post, AppError>;
        async fn save_post(&self, user_id: &UserId, post_id: &PostId) -> Result<Save, AppError>;
        async fn delete_saved_post(&self, save_id: &SaveId) -> Result<(), AppError>;
        async fn get_user_by_id(&self, user_id: &UserId) -> Result<User, AppError>;
        async fn get_users(&self, limit: Option<usize>) -> Result<Vec<User>, AppError>;
        async fn update_user(&self, user: UpdateUser) -> Result<User, AppError>;
    }
}

pub type MockSocialBackend = MockSocialBackendPort;

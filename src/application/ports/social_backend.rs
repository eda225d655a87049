use crate::application::query::PostPage;
use crate::domain::entities::{
    NewPost, NewUser, Post, Save, Session, SignInCredentials, UpdatePost, UpdateUser, User,
};
use crate::domain::value_objects::{PageCursor, PostId, SaveId, UserId};
use crate::shared::error::AppError;
use async_trait::async_trait;

/// リモートのバックエンド（認証・ドキュメント・ストレージ）へのポート。
///
/// 転送方式やスキーマは実装側の関心事で、このクレートは操作の形だけを決める。
#[async_trait]
pub trait SocialBackend: Send + Sync {
    // アカウント / セッション
    async fn create_user_account(&self, user: NewUser) -> Result<User, AppError>;
    async fn sign_in_account(&self, credentials: SignInCredentials) -> Result<Session, AppError>;
    async fn sign_out_account(&self) -> Result<(), AppError>;
    /// サインインしていなければ `Ok(None)`
    async fn get_current_user(&self) -> Result<Option<User>, AppError>;

    // 投稿
    async fn create_post(&self, post: NewPost) -> Result<Post, AppError>;
    async fn update_post(&self, post: UpdatePost) -> Result<Post, AppError>;
    async fn delete_post(&self, post_id: &PostId, image_id: &str) -> Result<(), AppError>;
    async fn get_recent_posts(&self) -> Result<Vec<Post>, AppError>;
    /// `cursor` の次から新しい順に 1 ページ分を返す。末尾を越えると空ページ
    async fn get_infinite_posts(&self, cursor: Option<PageCursor>) -> Result<PostPage, AppError>;
    async fn get_post_by_id(&self, post_id: &PostId) -> Result<Post, AppError>;
    async fn search_posts(&self, term: &str) -> Result<Vec<Post>, AppError>;

    // いいね / 保存
    /// いいね一覧を `likes` で置き換え、更新後の投稿を返す
    async fn like_post(&self, post_id: &PostId, likes: Vec<UserId>) -> Result<Post, AppError>;
    async fn save_post(&self, user_id: &UserId, post_id: &PostId) -> Result<Save, AppError>;
    async fn delete_saved_post(&self, save_id: &SaveId) -> Result<(), AppError>;

    // ユーザー
    async fn get_user_by_id(&self, user_id: &UserId) -> Result<User, AppError>;
    async fn get_users(&self, limit: Option<usize>) -> Result<Vec<User>, AppError>;
    async fn update_user(&self, user: UpdateUser) -> Result<User, AppError>;
}

//! 画面ごとの表示モデル。
//!
//! クエリのスナップショットを受け取り、描画側がそのまま使える `PageView` に変換する。
//! スタイルやルーティングはここでは扱わない。

pub mod home;
pub mod liked_posts;
pub mod saved;

pub use home::HomeFeedView;
pub use liked_posts::LikedPostsView;
pub use saved::SavedPostsView;

use crate::domain::entities::Post;
use crate::domain::value_objects::UserId;
use crate::shared::utils::time_ago_at;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// グリッドに並べる投稿 1 件
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PostCard {
    pub id: String,
    pub caption: String,
    pub image_url: String,
    pub location: String,
    pub tags: Vec<String>,
    pub creator_id: String,
    pub creator_name: String,
    pub creator_image_url: String,
    pub like_count: usize,
    /// 閲覧ユーザーがいいね済みか（閲覧ユーザー不明なら false）
    pub liked: bool,
    pub posted: String,
}

impl PostCard {
    pub fn from_post(post: &Post, viewer: Option<&UserId>, now: DateTime<Utc>) -> Self {
        Self {
            id: post.id.to_string(),
            caption: post.caption.clone(),
            image_url: post.image_url.clone(),
            location: post.location.clone(),
            tags: post.tags.clone(),
            creator_id: post.creator.id.to_string(),
            creator_name: post.creator.name.clone(),
            creator_image_url: post.creator.image_url.clone(),
            like_count: post.like_count(),
            liked: viewer.is_some_and(|id| post.is_liked_by(id)),
            posted: time_ago_at(&post.created_at.to_rfc3339(), now),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PageView {
    Loading,
    Failed { message: String },
    Empty { message: String },
    Grid {
        posts: Vec<PostCard>,
        /// いいね・保存の操作列を出すか
        show_stats: bool,
    },
}

impl PageView {
    pub fn is_loading(&self) -> bool {
        matches!(self, PageView::Loading)
    }

    pub fn posts(&self) -> &[PostCard] {
        match self {
            PageView::Grid { posts, .. } => posts,
            _ => &[],
        }
    }
}

use super::post::Post;
use crate::domain::value_objects::{SaveId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// ユーザーが投稿を保存（ブックマーク）した記録。
///
/// 参照先の投稿は展開済みで保持し、保存一覧画面でそのまま描画できるようにする。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Save {
    pub id: SaveId,
    pub user_id: UserId,
    pub post: Post,
    pub created_at: DateTime<Utc>,
}

impl Save {
    /// 現在時刻で新しい保存記録を作成する。
    pub fn new(user_id: UserId, post: Post) -> Self {
        Self {
            id: SaveId::random(),
            user_id,
            post,
            created_at: Utc::now(),
        }
    }
}

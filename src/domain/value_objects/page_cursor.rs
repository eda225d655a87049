use super::document_id::PostId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 無限スクロールのカーソル。前ページ最後の投稿 ID を持ち、その次から取得する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(PostId);

impl PageCursor {
    pub fn after(last_post: PostId) -> Self {
        Self(last_post)
    }

    pub fn parse(cursor: &str) -> Option<Self> {
        PostId::new(cursor.trim()).ok().map(Self)
    }

    pub fn last_post_id(&self) -> &PostId {
        &self.0
    }
}

impl fmt::Display for PageCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

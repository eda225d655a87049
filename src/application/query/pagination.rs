//! 投稿フィードのカーソルページング。
//!
//! リクエストは前ページ最後の投稿 ID をカーソルとして運び、空ページが返ったら終端とみなす。
//! 描画とは独立したプロトコルで、キャッシュには読み込み済みのページ列を保持する。

use crate::domain::entities::Post;
use crate::domain::value_objects::PageCursor;
use serde::{Deserialize, Serialize};

/// バックエンドが返す 1 ページ
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostPage {
    pub documents: Vec<Post>,
}

impl PostPage {
    pub fn new(documents: Vec<Post>) -> Self {
        Self { documents }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// 次ページのカーソル。空ページなら `None`（終端）
    pub fn next_cursor(&self) -> Option<PageCursor> {
        self.documents
            .last()
            .map(|post| PageCursor::after(post.id.clone()))
    }
}

/// 読み込み済みのページ列
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InfinitePosts {
    pages: Vec<PostPage>,
}

impl InfinitePosts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> &[PostPage] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn push_page(&mut self, page: PostPage) {
        self.pages.push(page);
    }

    /// 次に要求すべきカーソル。
    ///
    /// まだ 1 ページも無ければ `None` だが `has_next_page()` は true（先頭ページを取得する）。
    pub fn next_cursor(&self) -> Option<PageCursor> {
        self.pages.last().and_then(PostPage::next_cursor)
    }

    pub fn has_next_page(&self) -> bool {
        match self.pages.last() {
            None => true,
            Some(page) => !page.is_empty(),
        }
    }

    /// 全ページを平坦化した投稿一覧
    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.pages.iter().flat_map(|page| page.documents.iter())
    }
}

use crate::domain::value_objects::{PostId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// クエリの操作タグ。キーの先頭要素にあたり、タグ単位の無効化に使う
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryTag {
    CurrentUser,
    RecentPosts,
    InfinitePosts,
    PostById,
    SearchPosts,
    UserById,
    Users,
}

impl QueryTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryTag::CurrentUser => "getCurrentUser",
            QueryTag::RecentPosts => "getRecentPosts",
            QueryTag::InfinitePosts => "getInfinitePosts",
            QueryTag::PostById => "getPostById",
            QueryTag::SearchPosts => "searchPosts",
            QueryTag::UserById => "getUserById",
            QueryTag::Users => "getUsers",
        }
    }
}

impl fmt::Display for QueryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// キャッシュエントリのキー（操作タグ + 任意のパラメータ）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryKey {
    CurrentUser,
    RecentPosts,
    InfinitePosts,
    PostById(PostId),
    SearchPosts(String),
    UserById(UserId),
    Users { limit: Option<usize> },
}

impl QueryKey {
    pub fn tag(&self) -> QueryTag {
        match self {
            QueryKey::CurrentUser => QueryTag::CurrentUser,
            QueryKey::RecentPosts => QueryTag::RecentPosts,
            QueryKey::InfinitePosts => QueryTag::InfinitePosts,
            QueryKey::PostById(_) => QueryTag::PostById,
            QueryKey::SearchPosts(_) => QueryTag::SearchPosts,
            QueryKey::UserById(_) => QueryTag::UserById,
            QueryKey::Users { .. } => QueryTag::Users,
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::PostById(id) => write!(f, "{}:{}", self.tag(), id),
            QueryKey::SearchPosts(term) => write!(f, "{}:{}", self.tag(), term),
            QueryKey::UserById(id) => write!(f, "{}:{}", self.tag(), id),
            QueryKey::Users { limit: Some(limit) } => write!(f, "{}:{}", self.tag(), limit),
            _ => write!(f, "{}", self.tag()),
        }
    }
}

/// 無効化の対象指定
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryFilter {
    /// キーが完全一致するエントリだけ
    Exact(QueryKey),
    /// 同じタグを先頭に持つすべてのエントリ
    Tag(QueryTag),
}

impl QueryFilter {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            QueryFilter::Exact(expected) => expected == key,
            QueryFilter::Tag(tag) => key.tag() == *tag,
        }
    }
}

impl From<QueryKey> for QueryFilter {
    fn from(key: QueryKey) -> Self {
        QueryFilter::Exact(key)
    }
}

impl From<QueryTag> for QueryFilter {
    fn from(tag: QueryTag) -> Self {
        QueryFilter::Tag(tag)
    }
}

use super::keys::QueryKey;
use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// 外から観測できるクエリの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// 必須パラメータが無いためリクエストを出していない
    Disabled,
    /// まだデータが無い（取得中または未取得）
    Pending,
    /// 直近の取得が失敗した
    Error,
    /// データがある
    Success,
}

/// キャッシュエントリのある時点の写し。
///
/// 再取得中は `is_fetching` が立ったまま前回の `data` を返すので、
/// 呼び出し側は「古いデータを表示しつつ更新待ち」の状態を扱える。
#[derive(Debug, Clone)]
pub struct QuerySnapshot<T> {
    pub status: QueryStatus,
    pub data: Option<T>,
    pub error: Option<AppError>,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> QuerySnapshot<T> {
    pub fn disabled() -> Self {
        Self {
            status: QueryStatus::Disabled,
            data: None,
            error: None,
            is_fetching: false,
            is_stale: false,
            updated_at: None,
        }
    }

    pub(crate) fn pending(is_fetching: bool) -> Self {
        Self {
            status: QueryStatus::Pending,
            data: None,
            error: None,
            is_fetching,
            is_stale: true,
            updated_at: None,
        }
    }

    /// データが無く、取得を待っている
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Pending
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QuerySnapshot<U> {
        QuerySnapshot {
            status: self.status,
            data: self.data.map(f),
            error: self.error,
            is_fetching: self.is_fetching,
            is_stale: self.is_stale,
            updated_at: self.updated_at,
        }
    }
}

/// 読み取り操作の結果
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult<T> {
    Disabled,
    Success(T),
    Error(AppError),
}

impl<T> QueryResult<T> {
    pub fn is_disabled(&self) -> bool {
        matches!(self, QueryResult::Disabled)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            QueryResult::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            QueryResult::Error(err) => Some(err),
            _ => None,
        }
    }

    /// `Disabled` は `Ok(None)` になる
    pub fn into_result(self) -> Result<Option<T>, AppError> {
        match self {
            QueryResult::Disabled => Ok(None),
            QueryResult::Success(data) => Ok(Some(data)),
            QueryResult::Error(err) => Err(err),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> QueryResult<U> {
        match self {
            QueryResult::Disabled => QueryResult::Disabled,
            QueryResult::Success(data) => QueryResult::Success(f(data)),
            QueryResult::Error(err) => QueryResult::Error(err),
        }
    }
}

impl<T> From<Result<T, AppError>> for QueryResult<T> {
    fn from(result: Result<T, AppError>) -> Self {
        match result {
            Ok(data) => QueryResult::Success(data),
            Err(err) => QueryResult::Error(err),
        }
    }
}

/// ビュー層が購読するキャッシュの変化通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEvent {
    Fetching(QueryKey),
    Updated(QueryKey),
    Failed(QueryKey),
    Invalidated(QueryKey),
    Evicted(QueryKey),
}

impl CacheEvent {
    pub fn key(&self) -> &QueryKey {
        match self {
            CacheEvent::Fetching(key)
            | CacheEvent::Updated(key)
            | CacheEvent::Failed(key)
            | CacheEvent::Invalidated(key)
            | CacheEvent::Evicted(key) => key,
        }
    }
}

//! 画面で使う小さな純粋関数群

use super::error::AppError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::{Component, Path, PathBuf};
use url::Url;

const SECONDS_PER_YEAR: i64 = 31_536_000;
const SECONDS_PER_MONTH: i64 = 2_592_000;
const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;
const SECONDS_PER_MINUTE: i64 = 60;

const UNITS: [(i64, &str); 5] = [
    (SECONDS_PER_YEAR, "year(s)"),
    (SECONDS_PER_MONTH, "month(s)"),
    (SECONDS_PER_DAY, "day(s)"),
    (SECONDS_PER_HOUR, "hour(s)"),
    (SECONDS_PER_MINUTE, "minute(s)"),
];

/// 現在時刻からの経過時間を "3 day(s) ago" のような粗い表記にする。
pub fn time_ago(timestamp: &str) -> String {
    time_ago_at(timestamp, Utc::now())
}

/// `now` を基準にした [`time_ago`]。
///
/// 解釈できない入力は "NaN second(s) ago" になり、パニックはしない。
pub fn time_ago_at(timestamp: &str, now: DateTime<Utc>) -> String {
    match parse_timestamp(timestamp) {
        Some(date) => format_elapsed(elapsed_seconds(date, now)),
        None => "NaN second(s) ago".to_string(),
    }
}

fn elapsed_seconds(date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - date).num_milliseconds().div_euclid(1000)
}

fn format_elapsed(seconds: i64) -> String {
    for (unit_seconds, label) in UNITS {
        let interval = seconds.div_euclid(unit_seconds);
        if interval >= 1 {
            return format!("{interval} {label} ago");
        }
    }
    format!("{seconds} second(s) ago")
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// いいねしたユーザー一覧に `user_id` が含まれているか
pub fn check_is_liked<T>(like_list: &[T], user_id: &str) -> bool
where
    T: AsRef<str>,
{
    like_list.iter().any(|id| id.as_ref() == user_id)
}

/// ローカルファイルのパスをプレビュー用の `file://` URL に変換する。
///
/// 相対パスはカレントディレクトリ基準で解決し、`.` と `..` を畳み込んでから
/// パーセントエンコードする。
pub fn convert_file_to_url(path: impl AsRef<Path>) -> Result<String, AppError> {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return Err(AppError::InvalidInput("file path is empty".to_string()));
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    let normalized = normalize(&absolute);

    Url::from_file_path(&normalized)
        .map(String::from)
        .map_err(|()| {
            AppError::InvalidInput(format!(
                "cannot convert {} to a file URL",
                normalized.display()
            ))
        })
}

// ファイルシステムに触れずに畳み込む。ルートより上には出ない
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    pub cache: CacheConfig,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// LRU に保持するクエリエントリ数の上限
    pub max_entries: usize,
    /// 取得後に自動で stale 扱いにするまでの秒数。`None` なら無効化されるまで fresh
    pub stale_time_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackendConfig {
    pub endpoint: String,
    pub project_id: String,
    /// 無限スクロール 1 ページあたりの投稿数
    pub page_size: usize,
    /// 最新投稿一覧の件数
    pub recent_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            stale_time_secs: None,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://cloud.appwrite.io/v1".to_string(),
            project_id: String::new(),
            page_size: 9,
            recent_limit: 20,
        }
    }
}

impl CacheConfig {
    pub fn stale_time(&self) -> Option<Duration> {
        self.stale_time_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を組み立てる（テストでは環境変数を汚さずに使う）
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // 既定値
        let mut cfg = Self::default();

        if let Some(value) = lookup("SNAPGRAM_CACHE_MAX_ENTRIES").and_then(|v| parse_usize(&v)) {
            cfg.cache.max_entries = value.max(1);
        }
        if let Some(value) = lookup("SNAPGRAM_CACHE_STALE_SECS").and_then(|v| parse_u64(&v)) {
            cfg.cache.stale_time_secs = Some(value);
        }

        // バックエンド設定
        if let Some(v) = lookup("SNAPGRAM_BACKEND_ENDPOINT") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.backend.endpoint = trimmed.to_string();
            }
        }
        if let Some(v) = lookup("SNAPGRAM_BACKEND_PROJECT_ID") {
            cfg.backend.project_id = v.trim().to_string();
        }
        if let Some(value) = lookup("SNAPGRAM_PAGE_SIZE").and_then(|v| parse_usize(&v)) {
            cfg.backend.page_size = value.max(1);
        }
        if let Some(value) = lookup("SNAPGRAM_RECENT_LIMIT").and_then(|v| parse_usize(&v)) {
            cfg.backend.recent_limit = value.max(1);
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.cache.max_entries == 0 {
            return Err("Cache max_entries must be greater than 0".to_string());
        }
        if self.backend.page_size == 0 {
            return Err("Backend page_size must be greater than 0".to_string());
        }
        if self.backend.recent_limit == 0 {
            return Err("Backend recent_limit must be greater than 0".to_string());
        }
        if self.backend.endpoint.trim().is_empty() {
            return Err("Backend endpoint must not be empty".to_string());
        }
        Ok(())
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let cfg = AppConfig::from_lookup(|_| None);
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.cache.max_entries, 256);
        assert!(cfg.cache.stale_time().is_none());
        assert_eq!(cfg.backend.page_size, 9);
        assert_eq!(cfg.backend.recent_limit, 20);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("SNAPGRAM_CACHE_MAX_ENTRIES", "32"),
            ("SNAPGRAM_CACHE_STALE_SECS", "60"),
            ("SNAPGRAM_BACKEND_ENDPOINT", " http://localhost/v1 "),
            ("SNAPGRAM_BACKEND_PROJECT_ID", "snapgram"),
            ("SNAPGRAM_PAGE_SIZE", "3"),
        ]));
        assert_eq!(cfg.cache.max_entries, 32);
        assert_eq!(cfg.cache.stale_time(), Some(Duration::from_secs(60)));
        assert_eq!(cfg.backend.endpoint, "http://localhost/v1");
        assert_eq!(cfg.backend.project_id, "snapgram");
        assert_eq!(cfg.backend.page_size, 3);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("SNAPGRAM_CACHE_MAX_ENTRIES", "lots"),
            ("SNAPGRAM_PAGE_SIZE", "0"),
            ("SNAPGRAM_BACKEND_ENDPOINT", "   "),
        ]));
        assert_eq!(cfg.cache.max_entries, 256);
        // 0 は下限の 1 に丸める
        assert_eq!(cfg.backend.page_size, 1);
        assert_eq!(cfg.backend.endpoint, "https://cloud.appwrite.io/v1");
    }
}

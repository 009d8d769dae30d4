//! Pull-based remote sync. Viewers poll an admin-supplied URL and replace
//! their whole library with whatever it returns; admins export a JSON
//! snapshot and re-host it on any static file host. The two halves are not
//! linked: a successful export says nothing about remote availability.

use reqwest::Client;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::App;
use crate::error::Result;
use crate::models::{epoch_ms, Entry};

/// Download filename offered to the admin for re-hosting.
pub const EXPORT_FILE_NAME: &str = "cinelaunch_master_vault.json";

pub struct SyncClient {
    client: Client,
}

impl Default for SyncClient {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("CineLaunch/1.0")
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());
        SyncClient { client }
    }

    /// Fetches the remote collection. Any failure along the way (transport,
    /// non-2xx status, bad JSON, wrong shape) collapses to `None`; the
    /// caller keeps its previous state.
    pub async fn pull(&self, url: &str) -> Option<Vec<Entry>> {
        let busted = cache_busted(url, epoch_ms());
        let resp = match self.client.get(&busted).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url, error = %e, "sync pull failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            warn!(url, status = %resp.status(), "sync pull rejected");
            return None;
        }
        let value: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(url, error = %e, "sync payload is not JSON");
                return None;
            }
        };
        let entries = parse_collection(value);
        if entries.is_none() {
            warn!(url, "sync payload has an unexpected shape");
        }
        entries
    }
}

/// Appends a uniqueness token so intermediaries cannot serve a cached copy.
fn cache_busted(url: &str, token: i64) -> String {
    if url.contains('?') {
        format!("{}&t={}", url, token)
    } else {
        format!("{}?t={}", url, token)
    }
}

/// Accepts a top-level array, or an object whose `entries` (current) or
/// `movies` (legacy export) property holds the array.
fn parse_collection(value: Value) -> Option<Vec<Entry>> {
    let array = match value {
        Value::Array(_) => value,
        Value::Object(ref obj) => obj.get("entries").or_else(|| obj.get("movies"))?.clone(),
        _ => return None,
    };
    serde_json::from_value(array).ok()
}

/// Serializes the full collection as pretty-printed JSON for the admin to
/// manually re-host. Defaults to `Documents/CineLaunch/` when no target
/// path is given.
pub fn export(entries: &[Entry], target_path: Option<PathBuf>) -> Result<PathBuf> {
    let out_path = match target_path {
        Some(path) => path,
        None => default_export_dir().join(EXPORT_FILE_NAME),
    };
    if let Some(parent) = out_path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(entries)?;
    fs::write(&out_path, content)?;
    Ok(out_path)
}

fn default_export_dir() -> PathBuf {
    dirs::document_dir()
        .map(|d| d.join("CineLaunch"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Background pull loop: one pull right away, then one per configured
/// interval. Each tick runs as its own task, so a slow response does not
/// delay the next attempt; the app's sequence guard discards late stale
/// responses. The loop stops when the scheduler is dropped.
pub struct SyncScheduler {
    handle: JoinHandle<()>,
}

impl SyncScheduler {
    pub fn spawn(app: Arc<App>) -> Self {
        let handle = tokio::spawn(async move {
            let minutes = app.sync_interval_minutes().max(1);
            let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
            loop {
                ticker.tick().await;
                let app = app.clone();
                tokio::spawn(async move {
                    match app.sync_once().await {
                        Ok(true) => debug!("sync applied"),
                        Ok(false) => debug!("sync skipped"),
                        Err(e) => warn!(error = %e, "sync cycle failed"),
                    }
                });
            }
        });
        SyncScheduler { handle }
    }

    pub fn shutdown(self) {
        self.handle.abort();
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn entry(id: &str) -> Entry {
        Entry {
            id: id.to_string(),
            title: "Alpha".to_string(),
            external_link: "https://youtu.be/abc".to_string(),
            image_link: None,
            description: String::new(),
            language: Language::English,
            genre: "Action".to_string(),
            created_at: 1,
        }
    }

    #[test]
    fn cache_buster_respects_existing_query_strings() {
        assert_eq!(
            cache_busted("https://host/lib.json", 99),
            "https://host/lib.json?t=99"
        );
        assert_eq!(
            cache_busted("https://host/lib.json?v=2", 99),
            "https://host/lib.json?v=2&t=99"
        );
    }

    #[test]
    fn parse_accepts_array_and_known_wrappers() {
        let entries = vec![entry("a")];
        let as_array = serde_json::to_value(&entries).unwrap();

        assert_eq!(parse_collection(as_array.clone()).unwrap().len(), 1);
        assert_eq!(
            parse_collection(serde_json::json!({ "entries": as_array })).unwrap().len(),
            1
        );
        assert_eq!(
            parse_collection(serde_json::json!({ "movies": as_array })).unwrap().len(),
            1
        );
    }

    #[test]
    fn parse_rejects_unknown_shapes() {
        assert!(parse_collection(serde_json::json!("nope")).is_none());
        assert!(parse_collection(serde_json::json!({ "items": [] })).is_none());
        assert!(parse_collection(serde_json::json!([{ "id": "x" }])).is_none());
        assert!(parse_collection(serde_json::json!({ "entries": 42 })).is_none());
    }

    #[test]
    fn export_writes_json_that_pull_parsing_accepts() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("vault.json");
        let entries = vec![entry("a"), entry("b")];

        let written = export(&entries, Some(path.clone())).unwrap();
        assert_eq!(written, path);

        let content = fs::read_to_string(&path).unwrap();
        // Pretty-printed for hand inspection by the admin.
        assert!(content.contains('\n'));
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parse_collection(value).unwrap(), entries);
    }
}

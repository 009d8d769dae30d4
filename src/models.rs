use serde::{Deserialize, Serialize};

/// Poster shown when an entry has no usable image link.
pub const PLACEHOLDER_IMAGE: &str =
    "https://images.unsplash.com/photo-1536440136628-849c177e76a1?w=400&h=600&fit=crop";

/// Genre keys every library starts with. The vocabulary is grow-only:
/// custom genres introduced by the user or the AI are never removed.
pub const DEFAULT_GENRES: [&str; 8] = [
    "Action",
    "Comedy",
    "Drama",
    "Sci-Fi",
    "Horror",
    "Documentary",
    "Animation",
    "Other",
];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    #[serde(rename = "English")]
    English,
    #[serde(rename = "Chinese")]
    Chinese,
    #[serde(rename = "Malay")]
    Malay,
    #[serde(rename = "India")]
    India,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::Chinese,
        Language::Malay,
        Language::India,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Chinese => "Chinese",
            Language::Malay => "Malay",
            Language::India => "India",
        }
    }
}

/// One catalog item: an external video link plus its display metadata.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub external_link: String,
    pub image_link: Option<String>,
    #[serde(default)]
    pub description: String,
    pub language: Language,
    pub genre: String,
    pub created_at: i64,
}

impl Entry {
    pub fn image_or_placeholder(&self) -> &str {
        match self.image_link.as_deref() {
            Some(url) if !url.trim().is_empty() => url,
            _ => PLACEHOLDER_IMAGE,
        }
    }
}

/// Form input for a new or edited entry; id and createdAt are minted by the app.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub title: String,
    pub external_link: String,
    pub image_link: Option<String>,
    pub description: String,
    pub language: Option<Language>,
    pub genre: String,
}

/// Visible-subset parameters. `None` means "All" for language and genre;
/// the search term matches title and description, case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub language: Option<Language>,
    pub genre: Option<String>,
    pub search: String,
}

/// Process-wide sync settings. `remote_url` and `is_admin` are persisted
/// under their own storage keys; interval and last-sync are session-only.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub remote_url: Option<String>,
    pub is_admin: bool,
    pub sync_interval_minutes: u64,
    pub last_sync_epoch_ms: Option<i64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            remote_url: None,
            is_admin: false,
            sync_interval_minutes: 5,
            last_sync_epoch_ms: None,
        }
    }
}

/// Strictly validated AI metadata suggestion. A response that does not
/// match this shape is treated as "unavailable", never partially trusted.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataGuess {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub language: Option<Language>,
    pub genre: String,
}

pub fn epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

pub fn new_entry_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

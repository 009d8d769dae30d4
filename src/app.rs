//! Application state, passed explicitly instead of living in globals. The
//! UI shell constructs one `App`, renders from its reads, and routes every
//! event through its operations; all mutations are gated on the admin role.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::ai::{AiConfig, MetadataClient};
use crate::error::{Error, Result};
use crate::models::{
    epoch_ms, new_entry_id, Entry, EntryDraft, EntryFilter, Language, MetadataGuess, SyncConfig,
};
use crate::role::{Role, RoleGate};
use crate::storage::{Storage, KEY_SYNC_URL};
use crate::store::CatalogStore;
use crate::sync::{self, SyncClient, SyncScheduler};
use crate::taxonomy::Taxonomy;

pub struct App {
    storage: Arc<Storage>,
    store: CatalogStore,
    taxonomy: Taxonomy,
    role: RoleGate,
    sync: SyncClient,
    ai: Option<MetadataClient>,
    config: Mutex<SyncConfig>,
    pull_seq: AtomicU64,
    applied_seq: AtomicU64,
}

impl App {
    /// Opens the app against the platform data directory and picks up the
    /// AI collaborator from the environment when configured.
    pub fn open_default() -> Result<Arc<Self>> {
        Self::open(Storage::default_dir(), AiConfig::from_env())
    }

    pub fn open(dir: PathBuf, ai: Option<AiConfig>) -> Result<Arc<Self>> {
        let storage = Arc::new(Storage::new(dir)?);
        let store = CatalogStore::open(storage.clone());
        let taxonomy = Taxonomy::load(&storage);
        let role = RoleGate::open(storage.clone());

        let config = SyncConfig {
            remote_url: storage.load(KEY_SYNC_URL),
            is_admin: role.is_admin(),
            ..SyncConfig::default()
        };

        Ok(Arc::new(App {
            storage,
            store,
            taxonomy,
            role,
            sync: SyncClient::new(),
            ai: ai.map(MetadataClient::new),
            config: Mutex::new(config),
            pull_seq: AtomicU64::new(0),
            applied_seq: AtomicU64::new(0),
        }))
    }

    fn config(&self) -> Result<std::sync::MutexGuard<'_, SyncConfig>> {
        self.config.lock().map_err(|e| Error::Internal(e.to_string()))
    }

    // --- catalog reads ---

    pub fn entries(&self, filter: &EntryFilter) -> Result<Vec<Entry>> {
        self.store.filter(filter)
    }

    pub fn all_entries(&self) -> Result<Vec<Entry>> {
        self.store.all()
    }

    pub fn genres_for(&self, language: Language) -> Result<Vec<String>> {
        Ok(self.taxonomy.genres_for(language, &self.store.all()?))
    }

    pub fn genre_label(&self, language: Language, genre: &str) -> String {
        Taxonomy::label(language, genre)
    }

    /// URI handed off to the host platform's link opener.
    pub fn external_link(&self, id: &str) -> Result<Option<String>> {
        Ok(self.store.get(id)?.map(|e| e.external_link))
    }

    // --- catalog mutations (admin only) ---

    pub fn add_entry(&self, draft: EntryDraft) -> Result<Entry> {
        self.role.require_admin()?;
        let entry = Entry {
            id: new_entry_id(),
            created_at: epoch_ms(),
            title: draft.title.trim().to_string(),
            external_link: draft.external_link.trim().to_string(),
            image_link: draft.image_link.filter(|l| !l.trim().is_empty()),
            description: draft.description,
            language: draft
                .language
                .ok_or_else(|| Error::InvalidInput("Language is required.".to_string()))?,
            genre: normalize_genre(&draft.genre),
        };
        validate(&entry)?;
        self.store.upsert(entry.clone())?;
        Ok(entry)
    }

    pub fn update_entry(&self, mut entry: Entry) -> Result<Entry> {
        self.role.require_admin()?;
        entry.genre = normalize_genre(&entry.genre);
        validate(&entry)?;
        self.store.upsert(entry.clone())?;
        Ok(entry)
    }

    pub fn delete_entry(&self, id: &str) -> Result<()> {
        self.role.require_admin()?;
        self.store.remove(id)
    }

    // --- role gate ---

    pub fn unlock(&self, secret: &str) -> Result<Role> {
        let role = self.role.verify(secret)?;
        self.config()?.is_admin = role == Role::Admin;
        Ok(role)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    // --- sync ---

    pub fn sync_config(&self) -> Result<SyncConfig> {
        let mut snapshot = self.config()?.clone();
        snapshot.is_admin = self.role.is_admin();
        Ok(snapshot)
    }

    pub fn remote_url(&self) -> Result<Option<String>> {
        Ok(self.config()?.remote_url.clone())
    }

    /// Points the app at a sync package URL. Admin-gated: configuring the
    /// remote source is what enables periodic pulls on viewer devices.
    pub fn set_remote_url(&self, url: &str) -> Result<()> {
        self.role.require_admin()?;
        let url = url.trim();
        let parsed = reqwest::Url::parse(url)
            .map_err(|_| Error::InvalidInput("Malformed sync URL.".to_string()))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::InvalidInput("Sync URL must be http(s).".to_string()));
        }
        self.storage.save(KEY_SYNC_URL, &url)?;
        self.config()?.remote_url = Some(url.to_string());
        Ok(())
    }

    pub fn clear_remote_url(&self) -> Result<()> {
        self.role.require_admin()?;
        self.storage.remove(KEY_SYNC_URL)?;
        self.config()?.remote_url = None;
        Ok(())
    }

    /// Session-only; viewers tune how often the pull loop fires.
    pub fn set_sync_interval_minutes(&self, minutes: u64) -> Result<()> {
        self.config()?.sync_interval_minutes = minutes.max(1);
        Ok(())
    }

    pub fn sync_interval_minutes(&self) -> u64 {
        self.config()
            .map(|c| c.sync_interval_minutes)
            .unwrap_or_else(|_| SyncConfig::default().sync_interval_minutes)
    }

    pub fn last_sync_epoch_ms(&self) -> Result<Option<i64>> {
        Ok(self.config()?.last_sync_epoch_ms)
    }

    /// One pull cycle: fetch the configured URL and overwrite the local
    /// collection with the result. Returns whether a pull was applied.
    /// Admin instances are the sole writers and never pull over their own
    /// edits; failed pulls leave local state untouched.
    pub async fn sync_once(&self) -> Result<bool> {
        if self.role.is_admin() {
            return Ok(false);
        }
        let url = match self.remote_url()? {
            Some(url) => url,
            None => return Ok(false),
        };
        let seq = self.pull_seq.fetch_add(1, Ordering::SeqCst) + 1;
        match self.sync.pull(&url).await {
            Some(entries) => self.apply_pulled(seq, entries),
            None => Ok(false),
        }
    }

    /// Applies a pulled collection unless a later-issued pull already won;
    /// a slow stale response must not clobber newer remote data.
    pub(crate) fn apply_pulled(&self, seq: u64, entries: Vec<Entry>) -> Result<bool> {
        let prev = self.applied_seq.fetch_max(seq, Ordering::SeqCst);
        if prev >= seq {
            debug!(seq, prev, "discarding stale sync response");
            return Ok(false);
        }
        self.store.replace_all(entries)?;
        self.config()?.last_sync_epoch_ms = Some(epoch_ms());
        Ok(true)
    }

    /// Starts the background pull loop for this instance. Held by the shell
    /// for the lifetime of the main view; dropping it stops the loop.
    pub fn start_sync(self: &Arc<Self>) -> SyncScheduler {
        SyncScheduler::spawn(self.clone())
    }

    pub fn export(&self, target_path: Option<PathBuf>) -> Result<PathBuf> {
        self.role.require_admin()?;
        sync::export(&self.store.all()?, target_path)
    }

    // --- AI collaborator ---

    pub fn has_ai(&self) -> bool {
        self.ai.is_some()
    }

    /// Best-effort metadata guess for the entry form. `None` when the
    /// collaborator is unconfigured or fails; the form stays usable either
    /// way.
    pub async fn suggest_metadata(&self, input: &str) -> Result<Option<MetadataGuess>> {
        let client = match &self.ai {
            Some(client) => client,
            None => return Ok(None),
        };
        if input.trim().is_empty() {
            return Err(Error::InvalidInput(
                "Provide a link or title for the AI.".to_string(),
            ));
        }
        let known = self.known_genres()?;
        Ok(client.suggest(input, &known).await)
    }

    /// Current genre vocabulary across all languages, offered to the AI so
    /// it reuses existing genres before inventing new ones.
    fn known_genres(&self) -> Result<Vec<String>> {
        let entries = self.store.all()?;
        let mut genres: Vec<String> = crate::models::DEFAULT_GENRES
            .iter()
            .map(|g| g.to_string())
            .collect();
        for entry in &entries {
            if !genres.iter().any(|g| g == &entry.genre) {
                genres.push(entry.genre.clone());
            }
        }
        Ok(genres)
    }
}

fn normalize_genre(genre: &str) -> String {
    let trimmed = genre.trim();
    if trimmed.is_empty() {
        "Other".to_string()
    } else {
        trimmed.to_string()
    }
}

fn validate(entry: &Entry) -> Result<()> {
    if entry.title.trim().is_empty() {
        return Err(Error::InvalidInput("Title is required.".to_string()));
    }
    if entry.external_link.trim().is_empty() {
        return Err(Error::InvalidInput("Video link is required.".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "cinelaunch-master";

    fn app() -> (tempfile::TempDir, Arc<App>) {
        let tmp = tempfile::tempdir().unwrap();
        let app = App::open(tmp.path().to_path_buf(), None).unwrap();
        (tmp, app)
    }

    fn draft(title: &str) -> EntryDraft {
        EntryDraft {
            title: title.to_string(),
            external_link: "https://youtu.be/abc".to_string(),
            language: Some(Language::English),
            genre: "Action".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn viewer_mutations_have_no_effect() {
        let (_tmp, app) = app();
        assert!(matches!(app.add_entry(draft("Alpha")), Err(Error::ReadOnly)));
        assert!(matches!(app.delete_entry("x"), Err(Error::ReadOnly)));
        assert!(matches!(
            app.set_remote_url("https://host/lib.json"),
            Err(Error::ReadOnly)
        ));
        assert!(app.all_entries().unwrap().is_empty());
    }

    #[test]
    fn add_mints_id_and_created_at() {
        let (_tmp, app) = app();
        app.unlock(SECRET).unwrap();

        let a = app.add_entry(draft("Alpha")).unwrap();
        let b = app.add_entry(draft("Beta")).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.created_at > 0);
        // Newest first.
        assert_eq!(app.all_entries().unwrap()[0].id, b.id);
    }

    #[test]
    fn add_rejects_missing_title_or_link() {
        let (_tmp, app) = app();
        app.unlock(SECRET).unwrap();

        let mut no_title = draft("   ");
        no_title.genre = "Action".to_string();
        assert!(matches!(app.add_entry(no_title), Err(Error::InvalidInput(_))));

        let mut no_link = draft("Alpha");
        no_link.external_link = String::new();
        assert!(matches!(app.add_entry(no_link), Err(Error::InvalidInput(_))));

        assert!(app.all_entries().unwrap().is_empty());
    }

    #[test]
    fn empty_genre_defaults_to_other() {
        let (_tmp, app) = app();
        app.unlock(SECRET).unwrap();

        let mut d = draft("Alpha");
        d.genre = "  ".to_string();
        let entry = app.add_entry(d).unwrap();
        assert_eq!(entry.genre, "Other");
    }

    #[test]
    fn custom_genre_shows_up_in_its_language_list() {
        let (_tmp, app) = app();
        app.unlock(SECRET).unwrap();

        let mut d = draft("Alpha");
        d.language = Some(Language::Chinese);
        d.genre = "Wuxia".to_string();
        app.add_entry(d).unwrap();

        assert!(app.genres_for(Language::Chinese).unwrap().contains(&"Wuxia".to_string()));
        assert!(!app.genres_for(Language::English).unwrap().contains(&"Wuxia".to_string()));
    }

    #[test]
    fn update_keeps_id_and_position() {
        let (_tmp, app) = app();
        app.unlock(SECRET).unwrap();

        let a = app.add_entry(draft("Alpha")).unwrap();
        let _b = app.add_entry(draft("Beta")).unwrap();

        let mut edited = a.clone();
        edited.title = "Alpha Director's Cut".to_string();
        app.update_entry(edited).unwrap();

        let all = app.all_entries().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].id, a.id);
        assert_eq!(all[1].title, "Alpha Director's Cut");
        assert_eq!(all[1].created_at, a.created_at);
    }

    #[test]
    fn export_is_admin_gated_and_writes_the_snapshot() {
        let (_tmp, app) = app();
        assert!(matches!(app.export(None), Err(Error::ReadOnly)));

        app.unlock(SECRET).unwrap();
        app.add_entry(draft("Alpha")).unwrap();

        let out = tempfile::tempdir().unwrap();
        let path = out.path().join("vault.json");
        let written = app.export(Some(path.clone())).unwrap();
        assert_eq!(written, path);

        let exported: Vec<Entry> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(exported, app.all_entries().unwrap());
    }

    #[test]
    fn set_remote_url_validates_and_persists() {
        let (tmp, app) = app();
        app.unlock(SECRET).unwrap();

        assert!(matches!(
            app.set_remote_url("not a url"),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            app.set_remote_url("ftp://host/lib.json"),
            Err(Error::InvalidInput(_))
        ));

        app.set_remote_url("https://host/lib.json").unwrap();
        drop(app);

        let reopened = App::open(tmp.path().to_path_buf(), None).unwrap();
        assert_eq!(
            reopened.remote_url().unwrap().as_deref(),
            Some("https://host/lib.json")
        );
    }

    #[test]
    fn stale_pull_response_is_discarded() {
        let (_tmp, app) = app();

        let newer = vec![Entry {
            id: "new".to_string(),
            title: "Newer".to_string(),
            external_link: "https://youtu.be/n".to_string(),
            image_link: None,
            description: String::new(),
            language: Language::English,
            genre: "Action".to_string(),
            created_at: 2,
        }];
        let older = vec![Entry {
            id: "old".to_string(),
            title: "Older".to_string(),
            external_link: "https://youtu.be/o".to_string(),
            image_link: None,
            description: String::new(),
            language: Language::English,
            genre: "Action".to_string(),
            created_at: 1,
        }];

        // Second-issued pull returns first and wins.
        assert!(app.apply_pulled(2, newer).unwrap());
        // The slow first pull arrives late and is dropped.
        assert!(!app.apply_pulled(1, older).unwrap());

        let all = app.all_entries().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "new");
    }

    #[test]
    fn external_link_hand_off() {
        let (_tmp, app) = app();
        app.unlock(SECRET).unwrap();
        let entry = app.add_entry(draft("Alpha")).unwrap();

        assert_eq!(
            app.external_link(&entry.id).unwrap().as_deref(),
            Some("https://youtu.be/abc")
        );
        assert_eq!(app.external_link("missing").unwrap(), None);
    }

    #[tokio::test]
    async fn suggest_metadata_without_collaborator_is_none() {
        let (_tmp, app) = app();
        assert!(app.suggest_metadata("https://youtu.be/abc").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sync_once_without_url_is_a_noop() {
        let (_tmp, app) = app();
        assert!(!app.sync_once().await.unwrap());
    }
}

//! Two-level taxonomy: root language, then genre. Default genre keys are
//! fixed and language-invariant; the per-language genre list is derived at
//! read time from the entries, so custom genres survive as long as some
//! entry carries them.

use crate::models::{Entry, Language, DEFAULT_GENRES};
use crate::storage::{Storage, KEY_LEGACY_CATEGORIES};

pub struct Taxonomy {
    /// Custom genres recovered from the legacy flat category list. The
    /// legacy variant had no language axis; these seed the English list.
    legacy_genres: Vec<String>,
}

impl Taxonomy {
    pub fn load(storage: &Storage) -> Self {
        let legacy: Vec<String> = storage.load(KEY_LEGACY_CATEGORIES).unwrap_or_default();
        let legacy_genres = legacy
            .into_iter()
            .filter(|g| !DEFAULT_GENRES.contains(&g.as_str()))
            .collect();
        Taxonomy { legacy_genres }
    }

    /// Default keys first, then first-seen custom genres on entries of the
    /// given language. Order is stable, no duplicates.
    pub fn genres_for(&self, language: Language, entries: &[Entry]) -> Vec<String> {
        let mut genres: Vec<String> = DEFAULT_GENRES.iter().map(|g| g.to_string()).collect();
        if language == Language::English {
            for g in &self.legacy_genres {
                if !genres.iter().any(|existing| existing == g) {
                    genres.push(g.clone());
                }
            }
        }
        for entry in entries {
            if entry.language == language && !genres.iter().any(|g| g == &entry.genre) {
                genres.push(entry.genre.clone());
            }
        }
        genres
    }

    /// Localized display label for a genre key. Custom genres are stored in
    /// the working language and fall back to the raw key.
    pub fn label(language: Language, genre: &str) -> String {
        let localized = match language {
            Language::English => Some(genre).filter(|g| DEFAULT_GENRES.contains(g)),
            Language::Chinese => match genre {
                "Action" => Some("动作"),
                "Comedy" => Some("喜剧"),
                "Drama" => Some("剧情"),
                "Sci-Fi" => Some("科幻"),
                "Horror" => Some("恐怖"),
                "Documentary" => Some("纪录片"),
                "Animation" => Some("动画"),
                "Other" => Some("其他"),
                _ => None,
            },
            Language::Malay => match genre {
                "Action" => Some("Aksi"),
                "Comedy" => Some("Komedi"),
                "Drama" => Some("Drama"),
                "Sci-Fi" => Some("Fiksyen Sains"),
                "Horror" => Some("Seram"),
                "Documentary" => Some("Dokumentari"),
                "Animation" => Some("Animasi"),
                "Other" => Some("Lain-lain"),
                _ => None,
            },
            Language::India => match genre {
                "Action" => Some("एक्शन"),
                "Comedy" => Some("कॉमेडी"),
                "Drama" => Some("ड्रामा"),
                "Sci-Fi" => Some("साइंस-फ़ाई"),
                "Horror" => Some("हॉरर"),
                "Documentary" => Some("डॉक्यूमेंट्री"),
                "Animation" => Some("एनीमेशन"),
                "Other" => Some("अन्य"),
                _ => None,
            },
        };
        localized.unwrap_or(genre).to_string()
    }
}

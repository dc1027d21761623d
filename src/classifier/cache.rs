//! Classification cache
//!
//! Keyed by a SHA-256 of the oracle identity, the description and the
//! allowed labels, so re-running an unchanged workbook skips the oracle.
//! Only real oracle answers are stored; failures are retried next run.

use super::{Classification, Outcome};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const CACHE_FILE_NAME: &str = ".classification-cache.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationCache {
    /// Compatibility check
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub description: String,
    pub tag: String,
    /// Off-list raw answer, if the tag is the fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_answer: Option<String>,
    pub classified_at: String,
}

impl ClassificationCache {
    const CURRENT_VERSION: u32 = 1;

    pub fn cache_path(folder: &Path) -> PathBuf {
        folder.join(CACHE_FILE_NAME)
    }

    /// Load the cache in `folder`. Missing, corrupt or outdated files give an empty cache.
    pub fn load(folder: &Path) -> Self {
        let cache_path = Self::cache_path(folder);
        if !cache_path.exists() {
            return Self::default();
        }

        let file = match File::open(&cache_path) {
            Ok(f) => f,
            Err(_) => return Self::default(),
        };

        match serde_json::from_reader::<_, ClassificationCache>(BufReader::new(file)) {
            Ok(cache) if cache.version == Self::CURRENT_VERSION => cache,
            Ok(_) => {
                tracing::warn!("cache version mismatch, starting a new cache");
                Self::default()
            }
            Err(e) => {
                tracing::warn!("unreadable cache {}: {}", cache_path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, folder: &Path) -> Result<()> {
        std::fs::create_dir_all(folder)?;
        let mut writer = BufWriter::new(File::create(Self::cache_path(folder))?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Remove the cache file. `Ok(false)` when there was none.
    pub fn clear(folder: &Path) -> Result<bool> {
        let cache_path = Self::cache_path(folder);
        if cache_path.exists() {
            std::fs::remove_file(cache_path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Cached classification, if any
    pub fn get(&self, key: &str) -> Option<Classification> {
        self.entries.get(key).map(|entry| Classification {
            tag: entry.tag.clone(),
            outcome: match &entry.raw_answer {
                Some(raw) => Outcome::OffList(raw.clone()),
                None => Outcome::Accepted,
            },
        })
    }

    /// Store an oracle answer. Failed classifications are ignored.
    pub fn insert(&mut self, key: String, description: &str, classification: &Classification) {
        let raw_answer = match &classification.outcome {
            Outcome::Accepted => None,
            Outcome::OffList(raw) => Some(raw.clone()),
            Outcome::Failed(_) => return,
        };

        self.entries.insert(
            key,
            CacheEntry {
                description: description.to_string(),
                tag: classification.tag.clone(),
                raw_answer,
                classified_at: chrono::Local::now().to_rfc3339(),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
        }
    }
}

/// Cache key for one oracle question
pub fn cache_key(identity: &str, description: &str, allowed: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    hasher.update([0u8]);
    hasher.update(description.as_bytes());
    for label in allowed {
        hasher.update([0u8]);
        hasher.update(label.as_bytes());
    }
    hex::encode(hasher.finalize())
}

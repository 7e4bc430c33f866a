//! Sync manifest: what the last successful run stored for a product.
//!
//! Every sync run replaces the product's content store wholesale, so the
//! manifest is not used to skip work. It records, per stored document, the
//! SHA-256 of the written text plus its source and canonical paths. The next
//! run compares its own documents against it to report what changed upstream.
//!
//! ## Storage
//!
//! `<content_root>/<product>/.sync-manifest.json`. The leading dot keeps it out
//! of the validator's markdown walk and the renderer's collection.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::Path;

/// Name of the manifest file within a product's store directory.
pub const MANIFEST_FILENAME: &str = ".sync-manifest.json";

/// Version of the manifest format. A manifest with another version is ignored.
const MANIFEST_VERSION: u32 = 1;

/// One stored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManifestEntry {
    pub source_path: String,
    pub canonical: String,
    pub content_hash: String,
}

/// On-disk manifest mapping store-relative paths to their entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncManifest {
    pub version: u32,
    pub product: String,
    pub repo: String,
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl SyncManifest {
    pub fn new(product: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            product: product.into(),
            repo: repo.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load from a product's store directory.
    ///
    /// Returns `None` if the file is missing, unreadable, or a different version.
    pub fn load(store_dir: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(store_dir.join(MANIFEST_FILENAME)).ok()?;
        let manifest: Self = serde_json::from_str(&content).ok()?;
        (manifest.version == MANIFEST_VERSION).then_some(manifest)
    }

    pub fn save(&self, store_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(store_dir.join(MANIFEST_FILENAME), json)
    }

    pub fn insert(&mut self, local_path: String, source_path: String, canonical: String, text: &str) {
        self.entries.insert(
            local_path,
            ManifestEntry {
                source_path,
                canonical,
                content_hash: hash_text(text),
            },
        );
    }

    /// Compare this run's manifest against the previous one.
    pub fn diff(&self, previous: Option<&SyncManifest>) -> ChangeStats {
        let Some(previous) = previous else {
            return ChangeStats {
                added: self.entries.len(),
                ..ChangeStats::default()
            };
        };

        let mut stats = ChangeStats::default();
        for (path, entry) in &self.entries {
            match previous.entries.get(path) {
                None => stats.added += 1,
                Some(old) if old.content_hash == entry.content_hash => stats.unchanged += 1,
                Some(_) => stats.changed += 1,
            }
        }
        stats.removed = previous
            .entries
            .keys()
            .filter(|path| !self.entries.contains_key(*path))
            .count();
        stats
    }
}

/// Document counts relative to the previous successful run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChangeStats {
    pub added: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl fmt::Display for ChangeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} changed, {} unchanged, {} removed",
            self.added, self.changed, self.unchanged, self.removed
        )
    }
}

/// SHA-256 of document text, as lowercase hex.
pub fn hash_text(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

//! Shared test utilities for the docmirror test suite.
//!
//! Provides an in-memory [`RemoteSource`] and content-store builders so sync,
//! validation and navigation tests can run without `gh` or the network.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let source = MemorySource::new()
//!     .file("docs/content/concepts/01-sandboxing.md", "---\ntitle: Sandboxing\n---\n");
//! let store = TempDir::new().unwrap();
//! write_doc(store.path(), "moat/concepts/01-sandboxing.md", "---\ntitle: Sandboxing\n---\n");
//! ```

use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::config::Product;
use crate::remote::{RemoteError, RemoteSource};
use crate::types::{EntryKind, RemoteEntry};

// =========================================================================
// In-memory remote
// =========================================================================

/// A remote repository held in memory, keyed by repo-relative file path.
///
/// Directories are implied by file paths. Listings are sorted by name, like
/// the GitHub contents API.
#[derive(Default)]
pub struct MemorySource {
    files: BTreeMap<String, Vec<u8>>,
    fail_reads: BTreeSet<String>,
    fail_all: bool,
    reads: Cell<usize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, content: impl AsRef<[u8]>) -> Self {
        self.files
            .insert(path.to_string(), content.as_ref().to_vec());
        self
    }

    /// Make reading `path` fail with a rate-limit error.
    pub fn failing_read(mut self, path: &str) -> Self {
        self.fail_reads.insert(path.to_string());
        self
    }

    /// Make every call fail, as if the remote were unreachable.
    pub fn unreachable() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl RemoteSource for MemorySource {
    fn list_dir(&self, _repo: &str, path: &str) -> Result<Vec<RemoteEntry>, RemoteError> {
        if self.fail_all {
            return Err(RemoteError::Failed {
                endpoint: path.to_string(),
                detail: "network unreachable".to_string(),
            });
        }
        let prefix = format!("{}/", path.trim_matches('/'));
        let mut entries: BTreeMap<String, RemoteEntry> = BTreeMap::new();
        for file in self.files.keys() {
            let Some(rest) = file.strip_prefix(&prefix) else {
                continue;
            };
            let (name, kind) = match rest.split_once('/') {
                Some((dir, _)) => (dir, EntryKind::Directory),
                None => (rest, EntryKind::File),
            };
            entries.entry(name.to_string()).or_insert(RemoteEntry {
                name: name.to_string(),
                path: format!("{prefix}{name}"),
                kind,
            });
        }
        if entries.is_empty() {
            return Err(RemoteError::NotFound {
                endpoint: path.to_string(),
            });
        }
        Ok(entries.into_values().collect())
    }

    fn read_file(&self, _repo: &str, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.reads.set(self.reads.get() + 1);
        if self.fail_all || self.fail_reads.contains(path) {
            return Err(RemoteError::RateLimited);
        }
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                endpoint: path.to_string(),
            })
    }
}

// =========================================================================
// Fixtures
// =========================================================================

/// The stock product, pointed at `docs/content` in `majorcontext/moat`.
pub fn moat_product() -> Product {
    crate::config::SiteConfig::default()
        .products
        .remove("moat")
        .expect("stock config has moat")
}

/// Write a document into a content store, creating parent directories.
pub fn write_doc(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Frontmatter-prefixed document body.
pub fn doc(title: &str, body: &str) -> String {
    format!("---\ntitle: \"{title}\"\n---\n\n{body}")
}

/// Read a stored file as text. Panics with the path on failure.
pub fn read_doc(root: &Path, relative: &str) -> String {
    let path = root.join(relative);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
}

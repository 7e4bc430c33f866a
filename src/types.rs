//! Shared types used across the sync, validation and navigation stages.

use crate::canonical::CanonicalPath;
use crate::frontmatter::Frontmatter;
use serde::Serialize;
use std::path::PathBuf;

/// Kind of a node in the remote documentation tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry returned by listing a remote directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    /// Repo-relative path, usable for the next listing or read.
    pub path: String,
    pub kind: EntryKind,
}

/// A markdown document accepted into the content store during a sync run.
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    /// Repo-relative path the document was fetched from.
    pub source_path: String,
    /// Path relative to the product's directory in the content store.
    pub local_path: PathBuf,
    /// Site path the document will be served at.
    pub canonical: CanonicalPath,
    /// Normalized text as written to disk.
    pub text: String,
    pub frontmatter: Frontmatter,
    /// Whether the frontmatter block was synthesized from the filename.
    pub synthesized_frontmatter: bool,
}

/// An internal link found in a stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReference {
    pub document: PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// The full markdown link as written, e.g. `[Setup](/moat/guides/setup)`.
    pub raw_link: String,
    pub target: String,
}

/// A navigation group: one per top-level category.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NavSection {
    pub title: String,
    pub items: Vec<NavItem>,
}

/// A single navigation entry pointing at a document.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NavItem {
    pub href: String,
    /// Two-digit ordering number from the filename, empty when unnumbered.
    pub number: String,
    pub label: String,
}

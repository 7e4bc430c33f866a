//! Sidebar navigation derived from a product's content store.
//!
//! Each top-level category directory becomes a [`NavSection`] and each
//! markdown file directly inside it a [`NavItem`]. Both are ordered by their
//! `NN-` prefix; entries without one sort after numbered entries, by name.
//!
//! ```text
//! moat/
//! ├── 01-getting-started/        → "Getting Started"
//! │   ├── 01-introduction.md     → 01 Introduction  /moat/01-getting-started/introduction
//! │   └── 02-installation.md     → 02 Installation
//! └── concepts/                  → "Concepts"
//!     └── 01-sandboxing.md       → 01 Sandboxing    /moat/concepts/sandboxing
//! ```
//!
//! Labels come from each document's frontmatter `title`, not its filename.

use crate::canonical;
use crate::frontmatter::{Frontmatter, FrontmatterError};
use crate::naming::{self, ParsedName};
use crate::types::{NavItem, NavSection};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid frontmatter in {}: {source}", .path.display())]
    Frontmatter {
        path: PathBuf,
        source: FrontmatterError,
    },
    #[error("Content store {} does not exist (run `docmirror sync` first)", .0.display())]
    MissingStore(PathBuf),
}

/// Build the navigation sections for the store at `store_dir`.
pub fn build_navigation(store_dir: &Path, product_id: &str) -> Result<Vec<NavSection>, NavError> {
    if !store_dir.is_dir() {
        return Err(NavError::MissingStore(store_dir.to_path_buf()));
    }

    let mut sections = Vec::new();
    for (dir, parsed) in sorted_entries(store_dir, |p| p.is_dir())? {
        let mut items = Vec::new();
        for (file, parsed_file) in sorted_entries(&dir, is_markdown)? {
            let text = fs::read_to_string(&file)?;
            let frontmatter = Frontmatter::parse(&text, "").map_err(|source| NavError::Frontmatter {
                path: file.clone(),
                source,
            })?;
            let relative = file.strip_prefix(store_dir).unwrap_or(&file);
            items.push(NavItem {
                href: canonical::document_path(product_id, relative).into_string(),
                number: parsed_file
                    .number
                    .map(|n| format!("{n:02}"))
                    .unwrap_or_default(),
                label: frontmatter.title,
            });
        }
        if items.is_empty() {
            continue;
        }
        sections.push(NavSection {
            title: naming::title_case(&parsed.slug),
            items,
        });
    }
    Ok(sections)
}

fn is_markdown(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "md")
}

/// Non-hidden children of `dir` accepted by `keep`, in navigation order.
fn sorted_entries(
    dir: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<(PathBuf, ParsedName)>, NavError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if name.starts_with('.') || !keep(&path) {
            continue;
        }
        let parsed = naming::parse_entry_name(&name);
        entries.push((name, path, parsed));
    }
    entries.sort_by(|(a_name, _, a), (b_name, _, b)| {
        (a.number.is_none(), a.number, a_name).cmp(&(b.number.is_none(), b.number, b_name))
    });
    Ok(entries
        .into_iter()
        .map(|(_, path, parsed)| (path, parsed))
        .collect())
}

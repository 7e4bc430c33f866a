//! Link validation over the synced content store.
//!
//! Runs in two passes per product:
//!
//! 1. Walk every `*.md` file under `<content_root>/<product>` and derive its
//!    canonical path from its location. These form the set of valid pages.
//! 2. Scan each document line by line for links already in canonical form,
//!    `[text](/{product}/...)`, and record every target missing from the set.
//!
//! Only canonical-form links are checked, so this validates post-sync output.
//! Relative links that survived rewriting are not seen here.

use crate::canonical;
use crate::config::SiteConfig;
use crate::types::LinkReference;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ValidateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to walk content store: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Content store {} does not exist (run `docmirror sync` first)", .0.display())]
    MissingStore(PathBuf),
}

/// Result of validating one product's store.
#[derive(Debug)]
pub struct ValidationReport {
    pub product: String,
    pub valid_paths: BTreeSet<String>,
    pub links_checked: usize,
    pub broken: Vec<LinkReference>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.broken.is_empty()
    }
}

/// Validate every configured product's store, in id order.
pub fn validate_store(
    config: &SiteConfig,
    project_root: &Path,
) -> Result<Vec<ValidationReport>, ValidateError> {
    let content_root = config.content_dir(project_root);
    config
        .products
        .keys()
        .map(|id| validate_product(&content_root, id))
        .collect()
}

/// Validate the store at `<content_root>/<product_id>`.
pub fn validate_product(
    content_root: &Path,
    product_id: &str,
) -> Result<ValidationReport, ValidateError> {
    let store = content_root.join(product_id);
    if !store.is_dir() {
        return Err(ValidateError::MissingStore(store));
    }

    let files = markdown_files(&store)?;
    let valid_paths: BTreeSet<String> = files
        .iter()
        .filter_map(|file| file.strip_prefix(&store).ok())
        .map(|relative| canonical::document_path(product_id, relative).into_string())
        .collect();

    let pattern = internal_link_pattern(product_id);
    let mut links_checked = 0;
    let mut broken = Vec::new();
    for file in &files {
        let content = std::fs::read_to_string(file)?;
        for link in find_internal_links(&pattern, &content, file, product_id) {
            links_checked += 1;
            if !valid_paths.contains(lookup_key(&link.target)) {
                broken.push(link);
            }
        }
    }

    Ok(ValidationReport {
        product: product_id.to_string(),
        valid_paths,
        links_checked,
        broken,
    })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn markdown_files(store: &Path) -> Result<Vec<PathBuf>, ValidateError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(store)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == "md")
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// `[text](/{product}/path "title")`. The title and optional angle brackets
/// are not part of the target.
fn internal_link_pattern(product_id: &str) -> Regex {
    let pattern = format!(
        r#"\[([^\]]+)\]\(<?/{}/([^)\s>]+)>?(?:\s+(?:"[^"]*"|'[^']*'))?\)"#,
        regex::escape(product_id)
    );
    Regex::new(&pattern).expect("escaped product id forms a valid pattern")
}

/// Links of the form `[text](/{product}/...)` with 1-based line numbers.
fn find_internal_links(
    pattern: &Regex,
    content: &str,
    file: &Path,
    product_id: &str,
) -> Vec<LinkReference> {
    content
        .lines()
        .enumerate()
        .flat_map(|(index, line)| {
            pattern.captures_iter(line).map(move |caps| LinkReference {
                document: file.to_path_buf(),
                line: index + 1,
                raw_link: caps[0].to_string(),
                target: format!("/{product_id}/{}", &caps[2]),
            })
        })
        .collect()
}

/// Target without `#fragment` or trailing slash.
fn lookup_key(target: &str) -> &str {
    let without_fragment = target.split_once('#').map_or(target, |(path, _)| path);
    without_fragment.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn store() -> TempDir {
        let tmp = TempDir::new().unwrap();
        write_doc(
            tmp.path(),
            "moat/getting-started/01-introduction.md",
            &doc(
                "Introduction",
                "Read [Installation](/moat/getting-started/installation).\n\nAlso [Sandboxing](/moat/concepts/sandboxing#how).\n",
            ),
        );
        write_doc(
            tmp.path(),
            "moat/getting-started/02-installation.md",
            &doc("Installation", "Back to [intro](/moat/getting-started/introduction/).\n"),
        );
        write_doc(
            tmp.path(),
            "moat/concepts/01-sandboxing.md",
            &doc("Sandboxing", "Nothing here.\n"),
        );
        tmp
    }

    #[test]
    fn clean_store_validates() {
        let tmp = store();
        let report = validate_product(tmp.path(), "moat").unwrap();
        assert!(report.is_clean(), "unexpected broken links: {:?}", report.broken);
        assert_eq!(report.links_checked, 3);
        assert_eq!(
            report.valid_paths.iter().map(String::as_str).collect::<Vec<_>>(),
            vec![
                "/moat/concepts/sandboxing",
                "/moat/getting-started/installation",
                "/moat/getting-started/introduction",
            ]
        );
    }

    #[test]
    fn reports_broken_link_with_file_and_line() {
        let tmp = store();
        write_doc(
            tmp.path(),
            "moat/concepts/02-networking.md",
            &doc("Networking", "Intro line.\n\nSee [proxies](/moat/reference/proxies).\n"),
        );

        let report = validate_product(tmp.path(), "moat").unwrap();
        assert_eq!(report.broken.len(), 1);
        let broken = &report.broken[0];
        assert!(broken.document.ends_with("moat/concepts/02-networking.md"));
        // Frontmatter takes lines 1-3, blank line 4, body starts at 5.
        assert_eq!(broken.line, 7);
        assert_eq!(broken.raw_link, "[proxies](/moat/reference/proxies)");
        assert_eq!(broken.target, "/moat/reference/proxies");
    }

    #[test]
    fn multiple_links_on_one_line() {
        let pattern = internal_link_pattern("moat");
        let links = find_internal_links(
            &pattern,
            "[a](/moat/x/a) and [b](/moat/x/b)\n[c](https://example.com)",
            Path::new("doc.md"),
            "moat",
        );
        let targets: Vec<_> = links.iter().map(|l| (l.line, l.target.as_str())).collect();
        assert_eq!(targets, vec![(1, "/moat/x/a"), (1, "/moat/x/b")]);
    }

    #[test]
    fn link_title_is_not_part_of_target() {
        let pattern = internal_link_pattern("moat");
        let links = find_internal_links(
            &pattern,
            r#"[a](/moat/x/a "Title") [b](</moat/x/b>) [c](/moat/x/c 'Other')"#,
            Path::new("doc.md"),
            "moat",
        );
        let targets: Vec<_> = links.iter().map(|l| l.target.as_str()).collect();
        assert_eq!(targets, vec!["/moat/x/a", "/moat/x/b", "/moat/x/c"]);
    }

    #[test]
    fn titled_links_from_sync_validate_clean() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::new()
            .file(
                "docs/content/guides/01-a.md",
                doc("A", "See [b](02-b.md \"Bee\").\n"),
            )
            .file("docs/content/guides/02-b.md", doc("B", ""));
        crate::sync::sync_product(&source, &moat_product(), tmp.path()).unwrap();

        assert!(read_doc(tmp.path(), "moat/guides/01-a.md").contains(r#"[b](/moat/guides/b "Bee")"#));
        let report = validate_product(tmp.path(), "moat").unwrap();
        assert!(report.broken.is_empty(), "{:?}", report.broken);
        assert_eq!(report.links_checked, 1);
    }

    #[test]
    fn other_products_links_are_ignored() {
        let pattern = internal_link_pattern("moat");
        let links = find_internal_links(&pattern, "[x](/other/a/b)", Path::new("d.md"), "moat");
        assert!(links.is_empty());
    }

    #[test]
    fn hidden_entries_are_skipped() {
        let tmp = store();
        write_doc(tmp.path(), "moat/.cache/01-ghost.md", &doc("Ghost", ""));
        let report = validate_product(tmp.path(), "moat").unwrap();
        assert!(!report.valid_paths.contains("/moat/.cache/ghost"));
        assert_eq!(report.valid_paths.len(), 3);
    }

    #[test]
    fn missing_store_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = validate_product(tmp.path(), "moat").unwrap_err();
        assert!(matches!(err, ValidateError::MissingStore(_)));
    }

    #[test]
    fn lookup_key_strips_fragment_and_slash() {
        assert_eq!(lookup_key("/moat/a/b#c"), "/moat/a/b");
        assert_eq!(lookup_key("/moat/a/b/"), "/moat/a/b");
        assert_eq!(lookup_key("/moat/a/b"), "/moat/a/b");
    }
}

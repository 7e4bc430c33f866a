//! Sync pipeline: mirror a product's docs tree into the local content store.
//!
//! For each product the remote docs directory is walked depth-first and every
//! file is passed through the same steps:
//!
//! ```text
//! read → null-byte guard → ensure frontmatter → parse frontmatter
//!      → rewrite links → canonical collision check → write
//! ```
//!
//! ## Staging
//!
//! A run writes into `<content_root>/.<product>.staging`. Only after every
//! file succeeded is the old `<content_root>/<product>` moved aside to
//! `.<product>.previous`, the staging directory renamed into place and the
//! old copy deleted. A failed run discards staging, so the store either holds
//! the previous complete mirror or nothing at all.
//!
//! ## Stale fallback
//!
//! When a run fails and the store already holds content from an earlier run,
//! the failure is logged and the run reports [`SyncOutcome::Stale`]. The build
//! continues with the old content. With no prior content the error propagates.

use crate::canonical::{self, CanonicalPath};
use crate::config::{ConfigError, Product, SiteConfig};
use crate::frontmatter::{self, Frontmatter, FrontmatterError};
use crate::manifest::{ChangeStats, SyncManifest};
use crate::remote::{RemoteError, RemoteSource};
use crate::rewrite;
use crate::types::{DocumentRecord, EntryKind, RemoteEntry};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Remote(#[from] RemoteError),
    #[error("Refusing to store binary file {path} (contains null bytes)")]
    Binary { path: String },
    #[error("File {path} is not valid UTF-8 text")]
    NotUtf8 { path: String },
    #[error("Invalid frontmatter in {path}: {source}")]
    Frontmatter {
        path: String,
        source: FrontmatterError,
    },
    #[error("Canonical path {canonical} is produced by both {first} and {second}")]
    Collision {
        canonical: CanonicalPath,
        first: String,
        second: String,
    },
    #[error("Unsafe remote entry name: {name:?}")]
    UnsafeName { name: String },
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// What a product sync ended with.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The store now holds a fresh mirror.
    Synced(SyncReport),
    /// The run failed but the store kept the content of an earlier run.
    Stale { product: String, error: SyncError },
}

/// Summary of a successful product sync.
#[derive(Debug)]
pub struct SyncReport {
    pub product: String,
    pub documents: Vec<DocumentRecord>,
    pub synthesized: usize,
    pub links_rewritten: usize,
    pub changes: ChangeStats,
}

/// Store directory for a product.
pub fn store_dir(content_root: &Path, product_id: &str) -> PathBuf {
    content_root.join(product_id)
}

fn staging_dir(content_root: &Path, product_id: &str) -> PathBuf {
    content_root.join(format!(".{product_id}.staging"))
}

/// Sync the configured products, or only `only` when given, in id order.
///
/// Stops at the first product whose sync fails without a stale fallback.
pub fn sync_products(
    source: &dyn RemoteSource,
    config: &SiteConfig,
    project_root: &Path,
    only: Option<&str>,
) -> Result<Vec<SyncOutcome>, SyncError> {
    let products: Vec<&Product> = match only {
        Some(id) => vec![config.product(id)?],
        None => config.products.values().collect(),
    };
    let content_root = config.content_dir(project_root);
    products
        .into_iter()
        .map(|product| sync_product(source, product, &content_root))
        .collect()
}

/// Sync one product into `<content_root>/<product.id>`.
pub fn sync_product(
    source: &dyn RemoteSource,
    product: &Product,
    content_root: &Path,
) -> Result<SyncOutcome, SyncError> {
    let store = store_dir(content_root, &product.id);
    let staging = staging_dir(content_root, &product.id);

    info!(
        product = %product.id,
        repo = %product.docs_repo,
        "Syncing {} documentation from {}/{}",
        product.name,
        product.docs_repo,
        product.docs_path
    );

    let result = mirror_into(source, product, &store, &staging)
        .and_then(|report| commit(&staging, &store).map(|()| report));

    match result {
        Ok(report) => Ok(SyncOutcome::Synced(report)),
        Err(err) => {
            discard(&staging);
            if has_prior_content(&store) {
                error!(product = %product.id, "✗ Error fetching documentation: {err}");
                warn!(
                    product = %product.id,
                    "⚠ Using cached {} documentation from previous build",
                    product.name
                );
                Ok(SyncOutcome::Stale {
                    product: product.id.clone(),
                    error: err,
                })
            } else {
                error!(
                    product = %product.id,
                    "No cached content available for {}, build cannot continue",
                    product.name
                );
                Err(err)
            }
        }
    }
}

fn mirror_into(
    source: &dyn RemoteSource,
    product: &Product,
    store: &Path,
    staging: &Path,
) -> Result<SyncReport, SyncError> {
    if staging.exists() {
        fs::remove_dir_all(staging)?;
    }
    fs::create_dir_all(staging)?;

    let mut report = SyncReport {
        product: product.id.clone(),
        documents: Vec::new(),
        synthesized: 0,
        links_rewritten: 0,
        changes: ChangeStats::default(),
    };
    let mut manifest = SyncManifest::new(&product.id, &product.docs_repo);
    let mut claimed: HashMap<CanonicalPath, String> = HashMap::new();

    // (remote directory, store-relative directory)
    let mut pending = vec![(product.docs_path.clone(), PathBuf::new())];
    while let Some((remote_dir, local_dir)) = pending.pop() {
        info!("Syncing {remote_dir}...");
        fs::create_dir_all(staging.join(&local_dir))?;

        let mut subdirs = Vec::new();
        for entry in source.list_dir(&product.docs_repo, &remote_dir)? {
            check_entry_name(&entry.name)?;
            let local_path = local_dir.join(&entry.name);
            match entry.kind {
                EntryKind::Directory => subdirs.push((entry.path, local_path)),
                EntryKind::File => {
                    info!("  Downloading {}...", entry.name);
                    let (doc, links) = fetch_document(source, product, &entry, local_path)?;
                    report.links_rewritten += links;

                    if let Some(first) = claimed.get(&doc.canonical) {
                        return Err(SyncError::Collision {
                            canonical: doc.canonical.clone(),
                            first: first.clone(),
                            second: doc.source_path.clone(),
                        });
                    }
                    claimed.insert(doc.canonical.clone(), doc.source_path.clone());

                    fs::write(staging.join(&doc.local_path), &doc.text)?;
                    manifest.insert(
                        manifest_key(&doc.local_path),
                        doc.source_path.clone(),
                        doc.canonical.to_string(),
                        &doc.text,
                    );
                    if doc.synthesized_frontmatter {
                        report.synthesized += 1;
                    }
                    report.documents.push(doc);
                }
            }
        }
        // Reversed so the stack pops subdirectories in listing order.
        pending.extend(subdirs.into_iter().rev());
    }

    manifest.save(staging)?;
    report.changes = manifest.diff(SyncManifest::load(store).as_ref());
    Ok(report)
}

fn fetch_document(
    source: &dyn RemoteSource,
    product: &Product,
    entry: &RemoteEntry,
    local_path: PathBuf,
) -> Result<(DocumentRecord, usize), SyncError> {
    let bytes = source.read_file(&product.docs_repo, &entry.path)?;
    if bytes.contains(&0) {
        return Err(SyncError::Binary {
            path: entry.path.clone(),
        });
    }
    let text = String::from_utf8(bytes).map_err(|_| SyncError::NotUtf8 {
        path: entry.path.clone(),
    })?;

    let (text, synthesized) = frontmatter::ensure(&text, &entry.name);
    if synthesized {
        warn!("⚠ Warning: {} missing frontmatter, adding default", entry.path);
    }
    let frontmatter = Frontmatter::parse(&text, &product.default_description).map_err(|source| {
        SyncError::Frontmatter {
            path: entry.path.clone(),
            source,
        }
    })?;

    // Links resolve against the document's place in the store, not upstream.
    let rewritten = rewrite::rewrite_links(&text, &manifest_key(&local_path), &product.id);
    if rewritten.rewritten > 0 {
        debug!("  Rewrote {} link(s) in {}", rewritten.rewritten, entry.name);
    }

    let doc = DocumentRecord {
        source_path: entry.path.clone(),
        canonical: canonical::document_path(&product.id, &local_path),
        local_path,
        text: rewritten.content,
        frontmatter,
        synthesized_frontmatter: synthesized,
    };
    Ok((doc, rewritten.rewritten))
}

/// Remote names become path components in the store; reject anything else.
fn check_entry_name(name: &str) -> Result<(), SyncError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(SyncError::UnsafeName {
            name: name.to_string(),
        }),
    }
}

fn manifest_key(local_path: &Path) -> String {
    local_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Swap staging into place. The old store is moved aside first and only
/// deleted once the new one is in place; if the swap fails it is moved back.
fn commit(staging: &Path, store: &Path) -> Result<(), SyncError> {
    if !store.exists() {
        fs::rename(staging, store)?;
        return Ok(());
    }

    let previous = previous_dir(store);
    if previous.exists() {
        fs::remove_dir_all(&previous)?;
    }
    fs::rename(store, &previous)?;
    if let Err(e) = fs::rename(staging, store) {
        if let Err(restore) = fs::rename(&previous, store) {
            error!(
                "Could not restore {} from {}: {restore}",
                store.display(),
                previous.display()
            );
        }
        return Err(e.into());
    }
    if let Err(e) = fs::remove_dir_all(&previous) {
        warn!("Could not remove previous store {}: {e}", previous.display());
    }
    Ok(())
}

fn previous_dir(store: &Path) -> PathBuf {
    let name = store
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    store.with_file_name(format!(".{name}.previous"))
}

fn discard(staging: &Path) {
    if staging.exists()
        && let Err(e) = fs::remove_dir_all(staging)
    {
        warn!("Could not remove staging directory {}: {e}", staging.display());
    }
}

fn has_prior_content(store: &Path) -> bool {
    fs::read_dir(store)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::MANIFEST_FILENAME;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn upstream() -> MemorySource {
        MemorySource::new()
            .file(
                "docs/content/getting-started/01-introduction.md",
                doc(
                    "Introduction",
                    "See [install](./02-installation.md) and [sandboxing](../concepts/01-sandboxing.md).\n",
                ),
            )
            .file(
                "docs/content/getting-started/02-installation.md",
                doc("Installation", "Run it.\n"),
            )
            .file(
                "docs/content/concepts/01-sandboxing.md",
                doc("Sandboxing", "[Agents](02-agents.md)\n"),
            )
    }

    fn synced(outcome: SyncOutcome) -> SyncReport {
        match outcome {
            SyncOutcome::Synced(report) => report,
            SyncOutcome::Stale { error, .. } => panic!("expected fresh sync, got stale: {error}"),
        }
    }

    #[test]
    fn mirrors_tree_and_rewrites_links() {
        let tmp = TempDir::new().unwrap();
        let report = synced(sync_product(&upstream(), &moat_product(), tmp.path()).unwrap());

        assert_eq!(report.documents.len(), 3);
        assert_eq!(report.changes.added, 3);
        assert_eq!(report.links_rewritten, 3);
        let intro = read_doc(tmp.path(), "moat/getting-started/01-introduction.md");
        assert!(intro.contains("[install](/moat/getting-started/installation)"));
        assert!(intro.contains("[sandboxing](/moat/concepts/sandboxing)"));
        let sandboxing = read_doc(tmp.path(), "moat/concepts/01-sandboxing.md");
        assert!(sandboxing.contains("[Agents](/moat/concepts/agents)"));
    }

    #[test]
    fn failed_swap_restores_previous_store() {
        let tmp = TempDir::new().unwrap();
        let store = store_dir(tmp.path(), "moat");
        write_doc(&store, "concepts/01-a.md", &doc("A", "old"));

        let err = commit(&staging_dir(tmp.path(), "moat"), &store).unwrap_err();

        assert!(matches!(err, SyncError::Io(_)));
        assert!(read_doc(&store, "concepts/01-a.md").contains("old"));
        assert!(!tmp.path().join(".moat.previous").exists());
    }

    #[test]
    fn swap_replaces_store_and_drops_previous() {
        let tmp = TempDir::new().unwrap();
        let store = store_dir(tmp.path(), "moat");
        let staging = staging_dir(tmp.path(), "moat");
        write_doc(&store, "concepts/01-a.md", &doc("A", "old"));
        write_doc(&staging, "concepts/01-b.md", &doc("B", "new"));

        commit(&staging, &store).unwrap();

        assert!(read_doc(&store, "concepts/01-b.md").contains("new"));
        assert!(!store.join("concepts/01-a.md").exists());
        assert!(!staging.exists());
        assert!(!tmp.path().join(".moat.previous").exists());
    }

    #[test]
    fn root_documents_link_without_category() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::new()
            .file("docs/content/01-overview.md", doc("Overview", "[next](./02-next.md)\n"))
            .file("docs/content/02-next.md", doc("Next", ""));
        synced(sync_product(&source, &moat_product(), tmp.path()).unwrap());

        assert!(read_doc(tmp.path(), "moat/01-overview.md").contains("[next](/moat/next)"));
        let report = crate::validate::validate_product(tmp.path(), "moat").unwrap();
        assert!(report.is_clean(), "{:?}", report.broken);
    }

    #[test]
    fn records_canonical_paths() {
        let tmp = TempDir::new().unwrap();
        let report = synced(sync_product(&upstream(), &moat_product(), tmp.path()).unwrap());
        let mut canonicals: Vec<String> =
            report.documents.iter().map(|d| d.canonical.to_string()).collect();
        canonicals.sort();
        assert_eq!(
            canonicals,
            vec![
                "/moat/concepts/sandboxing",
                "/moat/getting-started/installation",
                "/moat/getting-started/introduction",
            ]
        );
    }

    #[test]
    fn synthesizes_missing_frontmatter() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::new().file(
            "docs/content/guides/03-my_topic.md",
            "# My topic\n\nBody.\n",
        );
        let report = synced(sync_product(&source, &moat_product(), tmp.path()).unwrap());

        assert_eq!(report.synthesized, 1);
        assert_eq!(report.documents[0].frontmatter.title, "My Topic");
        assert_eq!(report.documents[0].frontmatter.description, "Documentation");
        let stored = read_doc(tmp.path(), "moat/guides/03-my_topic.md");
        assert!(stored.starts_with("---\ntitle: \"My Topic\"\n---\n\n# My topic"));
    }

    #[test]
    fn fallback_keeps_previous_store_unchanged() {
        let tmp = TempDir::new().unwrap();
        synced(sync_product(&upstream(), &moat_product(), tmp.path()).unwrap());
        let before = read_doc(tmp.path(), "moat/getting-started/01-introduction.md");

        let outcome = sync_product(&MemorySource::unreachable(), &moat_product(), tmp.path()).unwrap();

        assert!(matches!(outcome, SyncOutcome::Stale { ref product, .. } if product == "moat"));
        assert_eq!(
            read_doc(tmp.path(), "moat/getting-started/01-introduction.md"),
            before
        );
        assert!(tmp.path().join("moat/concepts/01-sandboxing.md").exists());
        assert!(!tmp.path().join(".moat.staging").exists());
    }

    #[test]
    fn partial_failure_does_not_touch_store() {
        let tmp = TempDir::new().unwrap();
        synced(sync_product(&upstream(), &moat_product(), tmp.path()).unwrap());

        let failing = upstream()
            .file("docs/content/concepts/02-agents.md", doc("Agents", "new\n"))
            .failing_read("docs/content/getting-started/02-installation.md");
        let outcome = sync_product(&failing, &moat_product(), tmp.path()).unwrap();

        assert!(matches!(
            outcome,
            SyncOutcome::Stale {
                error: SyncError::Remote(RemoteError::RateLimited),
                ..
            }
        ));
        assert!(!tmp.path().join("moat/concepts/02-agents.md").exists());
    }

    #[test]
    fn cold_start_failure_propagates() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::unreachable();
        let err = sync_product(&source, &moat_product(), tmp.path()).unwrap_err();

        assert!(matches!(err, SyncError::Remote(RemoteError::Failed { .. })));
        assert_eq!(source.reads(), 0);
        assert!(!tmp.path().join("moat").exists());
        assert!(!tmp.path().join(".moat.staging").exists());
    }

    #[test]
    fn rejects_binary_content() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::new().file("docs/content/assets/logo.md", b"PNG\0\x01\x02");
        let err = sync_product(&source, &moat_product(), tmp.path()).unwrap_err();
        assert!(matches!(err, SyncError::Binary { ref path } if path == "docs/content/assets/logo.md"));
        assert!(!tmp.path().join("moat").exists());
    }

    #[test]
    fn canonical_collision_fails_loudly() {
        let tmp = TempDir::new().unwrap();
        let source = MemorySource::new()
            .file("docs/content/guides/01-setup.md", doc("Setup", ""))
            .file("docs/content/guides/02-setup.md", doc("Setup again", ""));
        let err = sync_product(&source, &moat_product(), tmp.path()).unwrap_err();

        match err {
            SyncError::Collision {
                canonical,
                first,
                second,
            } => {
                assert_eq!(canonical.as_str(), "/moat/guides/setup");
                assert_eq!(first, "docs/content/guides/01-setup.md");
                assert_eq!(second, "docs/content/guides/02-setup.md");
            }
            other => panic!("expected collision, got {other}"),
        }
    }

    #[test]
    fn empty_title_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let source =
            MemorySource::new().file("docs/content/guides/01-a.md", "---\ntitle: \"\"\n---\nx\n");
        let err = sync_product(&source, &moat_product(), tmp.path()).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Frontmatter {
                source: FrontmatterError::EmptyTitle,
                ..
            }
        ));
    }

    #[test]
    fn unsafe_names_are_rejected() {
        assert!(check_entry_name("01-intro.md").is_ok());
        assert!(check_entry_name("concepts").is_ok());
        for name in ["..", ".", "", "a/b", "/etc", "a\\b"] {
            assert!(
                matches!(check_entry_name(name), Err(SyncError::UnsafeName { .. })),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn resync_replaces_store_and_reports_changes() {
        let tmp = TempDir::new().unwrap();
        synced(sync_product(&upstream(), &moat_product(), tmp.path()).unwrap());

        let next = MemorySource::new()
            .file(
                "docs/content/getting-started/01-introduction.md",
                doc("Introduction", "Rewritten intro.\n"),
            )
            .file(
                "docs/content/getting-started/02-installation.md",
                doc("Installation", "Run it.\n"),
            );
        let report = synced(sync_product(&next, &moat_product(), tmp.path()).unwrap());

        assert_eq!(
            report.changes,
            ChangeStats {
                added: 0,
                changed: 1,
                unchanged: 1,
                removed: 1,
            }
        );
        assert!(!tmp.path().join("moat/concepts").exists());
        assert!(tmp.path().join("moat").join(MANIFEST_FILENAME).exists());
    }

    #[test]
    fn sync_products_rejects_unknown_product() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default();
        let err = sync_products(&upstream(), &config, tmp.path(), Some("nope")).unwrap_err();
        assert!(matches!(err, SyncError::Config(ConfigError::UnknownProduct { .. })));
    }

    #[test]
    fn sync_products_writes_under_content_root() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default();
        let outcomes = sync_products(&upstream(), &config, tmp.path(), None).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert!(
            tmp.path()
                .join("src/content/moat/concepts/01-sandboxing.md")
                .exists()
        );
    }
}

//! URL canonicalization for documentation links.
//!
//! Every document in the content store is served at a canonical site path:
//!
//! ```text
//! /{product}/{category}/{slug}
//! ```
//!
//! where `category` is the top-level directory under the docs root and `slug`
//! is the filename with its ordering prefix and `.md` extension removed. The
//! path is derived from position in the tree only, never from frontmatter.
//!
//! Three call sites depend on this module and must agree exactly: the batch
//! rewriter run during sync ([`crate::rewrite`]), the render-time rewriter
//! ([`crate::render`]), and the link validator ([`crate::validate`]), which
//! derives the set of valid targets with [`document_path`].
//!
//! ## Link Shapes
//!
//! | Link | Referencing doc | Result |
//! |------|-----------------|--------|
//! | `../concepts/01-sandboxing.md` | any | `/moat/concepts/sandboxing` |
//! | `concepts/01-sandboxing.md` | any | `/moat/concepts/sandboxing` |
//! | `./02-installation.md` | `getting-started/01-introduction.md` | `/moat/getting-started/installation` |
//!
//! Canonicalization is total: odd input degrades to a best-effort path
//! instead of an error, and the validator reports whatever does not resolve.

use crate::naming;
use std::fmt;
use std::path::{Component, Path};

/// A normalized site-relative document path such as `/moat/concepts/sandboxing`.
///
/// Always starts with `/`, never ends with `/` or `.md`, and never contains
/// empty segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// Join non-empty segments into a rooted path.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut path = String::new();
        for segment in segments {
            let segment = segment.trim_matches('/');
            if segment.is_empty() {
                continue;
            }
            path.push('/');
            path.push_str(segment);
        }
        if path.is_empty() {
            path.push('/');
        }
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a link target is a relative markdown reference this module rewrites.
///
/// Absolute URLs (anything with a scheme), protocol-relative and site-rooted
/// links, pure anchors, and targets not ending in `.md` are left alone. Since
/// canonical paths are site-rooted and extensionless, rewriting is a no-op on
/// its own output.
pub fn is_relative_markdown_link(link: &str) -> bool {
    !link.is_empty()
        && !link.starts_with('/')
        && !link.starts_with('#')
        && !has_scheme(link)
        && link.ends_with(".md")
}

fn has_scheme(link: &str) -> bool {
    let Some((scheme, _)) = link.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Resolve a relative `.md` link found in `referencing_doc` to its canonical path.
///
/// `referencing_doc` may be repo-relative (`docs/content/guides/01-x.md`) or a
/// content-store path; only its parent directory name is consulted, and only
/// for same-category links.
pub fn canonicalize(raw_link: &str, referencing_doc: &str, product_id: &str) -> CanonicalPath {
    let segments: Vec<&str> = raw_link
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let traversal = segments
        .iter()
        .take_while(|s| matches!(**s, "." | ".."))
        .count();
    let rest = &segments[traversal..];

    let filename = rest.last().copied().unwrap_or_default();
    let slug = naming::slug_from_filename(filename);

    let category = if rest.len() >= 2 {
        rest[0].to_string()
    } else {
        parent_directory_name(referencing_doc)
    };

    CanonicalPath::from_segments([product_id, category.as_str(), slug.as_str()])
}

/// Name of the directory directly containing `doc_path`, or empty at the root.
fn parent_directory_name(doc_path: &str) -> String {
    let normalized = doc_path.replace('\\', "/");
    Path::new(&normalized)
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Canonical path of a stored document from its location under the product root.
///
/// Directory components are kept as written and the filename is reduced to
/// its slug: `concepts/01-sandboxing.md` → `/moat/concepts/sandboxing`.
pub fn document_path(product_id: &str, relative: &Path) -> CanonicalPath {
    let names: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    let Some((filename, dirs)) = names.split_last() else {
        return CanonicalPath::from_segments([product_id]);
    };
    let slug = naming::slug_from_filename(filename);

    CanonicalPath::from_segments(
        std::iter::once(product_id)
            .chain(dirs.iter().map(String::as_str))
            .chain(std::iter::once(slug.as_str())),
    )
}

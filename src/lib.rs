//! # docmirror
//!
//! Mirrors product documentation from GitHub repositories into a local
//! content store, rewriting relative markdown links into canonical site URLs,
//! and checks the result for dangling internal links.
//!
//! # Architecture: Sync, Then Validate
//!
//! ```text
//! 1. Sync       owner/repo:docs/  →  src/content/<product>/   (fetch + rewrite)
//! 2. Validate   src/content/      →  report                   (dangling links)
//! ```
//!
//! Rendering happens later in the site build; [`render`] applies the same link
//! rules to each link node so content edited after sync still resolves.
//!
//! # Canonical URLs
//!
//! Every document lives at `/{product}/{category}/{slug}`, where the slug is
//! the filename without its `NN-` ordering prefix and `.md` extension. One
//! function, [`canonical::canonicalize`], turns a relative markdown link into
//! such a URL. The sync rewriter, the render-time rewriter and the validator's
//! path derivation all go through [`canonical`], so they cannot drift apart.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`sync`] | Walks a product's remote docs tree into a staging directory and swaps it in |
//! | [`validate`] | Finds `[text](/{product}/...)` links whose target page does not exist |
//! | [`canonical`] | Canonical path derivation for link targets and stored documents |
//! | [`rewrite`] | Text-level rewriting of relative `.md` links during sync |
//! | [`render`] | Event-level rewriting during markdown rendering |
//! | [`frontmatter`] | Frontmatter detection, synthesis and validation |
//! | [`remote`] | Remote source trait, `gh` CLI bridge, local mirror |
//! | [`manifest`] | Per-product record of stored content hashes |
//! | [`navigation`] | Sidebar sections built from the store |
//! | [`assets`] | Required static asset check |
//! | [`config`] | `docmirror.toml` loading and the product registry |
//! | [`naming`] | `NN-name` filename convention |
//! | [`types`] | Shared data types |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Failure Model
//!
//! A sync run either replaces a product's store completely or leaves it as it
//! was. When the remote is unavailable and an earlier mirror exists, that
//! mirror is kept and the run reports a stale outcome instead of failing the
//! build. Without an earlier mirror the error is fatal.

pub mod assets;
pub mod canonical;
pub mod config;
pub mod frontmatter;
pub mod logging;
pub mod manifest;
pub mod naming;
pub mod navigation;
pub mod output;
pub mod remote;
pub mod render;
pub mod rewrite;
pub mod sync;
pub mod types;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;

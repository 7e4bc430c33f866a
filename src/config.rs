//! Project configuration module.
//!
//! Handles loading, validating, and merging `docmirror.toml`. Stock defaults
//! are the base layer; a `docmirror.toml` in the project root overrides them.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! content_root = "src/content"  # Content store root, relative to the project root
//!
//! [remote]
//! gh_binary = "gh"              # GitHub CLI used to reach the contents API
//! timeout_secs = 30             # Bounded wait for every remote call
//!
//! [assets]
//! required = ["public/logo.svg", "public/favicon.svg"]
//!
//! [products.moat]
//! name = "Moat"
//! display_name = "MOAT"
//! tagline = "Let agents break things safely"
//! github_url = "https://github.com/majorcontext/moat"
//! color = "sky"
//! docs_repo = "majorcontext/moat"
//! docs_path = "docs/content"
//! default_description = "Documentation"
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse. Tables are merged key by key, so overriding one
//! value keeps every other default:
//!
//! ```toml
//! [remote]
//! timeout_secs = 60
//! ```
//!
//! The product registry is the exception: a file that defines any
//! `[products.*]` table replaces the stock registry entirely.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the config file looked up in the project root.
pub const CONFIG_FILENAME: &str = "docmirror.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Product \"{id}\" not found\nAvailable products: {available}")]
    UnknownProduct { id: String, available: String },
}

/// Project configuration loaded from `docmirror.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Content store root, relative to the project root.
    pub content_root: PathBuf,
    /// Remote source settings.
    pub remote: RemoteConfig,
    /// Static assets that must exist for the site to build.
    pub assets: AssetsConfig,
    /// Product registry keyed by product id.
    pub products: BTreeMap<String, Product>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let mut products = BTreeMap::new();
        products.insert("moat".to_string(), Product::moat());
        Self {
            content_root: PathBuf::from("src/content"),
            remote: RemoteConfig::default(),
            assets: AssetsConfig::default(),
            products,
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.products.is_empty() {
            return Err(ConfigError::Validation(
                "at least one product must be configured".into(),
            ));
        }
        if self.remote.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "remote.timeout_secs must be greater than zero".into(),
            ));
        }
        for (id, product) in &self.products {
            if id.is_empty()
                || !id
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(ConfigError::Validation(format!(
                    "product id \"{id}\" must be lowercase letters, digits or '-'"
                )));
            }
            let repo_ok = product
                .docs_repo
                .split_once('/')
                .is_some_and(|(owner, name)| {
                    !owner.is_empty() && !name.is_empty() && !name.contains('/')
                });
            if !repo_ok {
                return Err(ConfigError::Validation(format!(
                    "products.{id}.docs_repo must be \"owner/name\", got \"{}\"",
                    product.docs_repo
                )));
            }
        }
        Ok(())
    }

    /// Look up a product by id, listing the valid ids on a miss.
    pub fn product(&self, id: &str) -> Result<&Product, ConfigError> {
        self.products
            .get(id)
            .ok_or_else(|| ConfigError::UnknownProduct {
                id: id.to_string(),
                available: self.product_ids().join(", "),
            })
    }

    /// Configured product ids in sorted order.
    pub fn product_ids(&self) -> Vec<&str> {
        self.products.keys().map(String::as_str).collect()
    }

    /// Absolute-or-relative content store path under `project_root`.
    pub fn content_dir(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.content_root)
    }
}

/// Remote source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
    /// GitHub CLI binary used as the authenticated bridge.
    pub gh_binary: String,
    /// Maximum seconds to wait for a single remote call.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            gh_binary: "gh".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Required static assets, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    pub required: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            required: vec![
                "public/logo.svg".to_string(),
                "public/favicon.svg".to_string(),
            ],
        }
    }
}

/// A documented product whose docs are mirrored from its own repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Product {
    /// Registry key; filled in after loading.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub github_url: String,
    /// Accent color name used by the site theme.
    #[serde(default)]
    pub color: String,
    /// GitHub repository holding the docs, `owner/name`.
    pub docs_repo: String,
    /// Docs root inside the repository.
    pub docs_path: String,
    /// Description used when a document's frontmatter has none.
    #[serde(default = "default_description")]
    pub default_description: String,
}

fn default_description() -> String {
    "Documentation".to_string()
}

impl Product {
    fn moat() -> Self {
        Self {
            id: "moat".to_string(),
            name: "Moat".to_string(),
            display_name: "MOAT".to_string(),
            tagline: "Let agents break things safely".to_string(),
            github_url: "https://github.com/majorcontext/moat".to_string(),
            color: "sky".to_string(),
            docs_repo: "majorcontext/moat".to_string(),
            docs_path: "docs/content".to_string(),
            default_description: default_description(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `docmirror.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => {
            let mut base = base;
            if let (toml::Value::Table(base_table), Some(_)) = (&mut base, ov.get("products")) {
                base_table.remove("products");
            }
            merge_toml(base, ov)
        }
        None => base,
    };
    let mut config: SiteConfig = merged.try_into()?;
    for (id, product) in config.products.iter_mut() {
        product.id = id.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Load config from `docmirror.toml` in the given project root.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `docmirror.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# docmirror configuration
# =======================
# Place this file at the project root as docmirror.toml.
# All options are optional; omitted keys keep the defaults shown here.
# Unknown keys will cause an error.

# Content store root, relative to the project root. Each product's docs are
# mirrored into <content_root>/<product id>/.
content_root = "src/content"

# ---------------------------------------------------------------------------
# Remote source
# ---------------------------------------------------------------------------
[remote]
# GitHub CLI binary. It must be installed and authenticated (gh auth login,
# or GH_TOKEN in the environment).
gh_binary = "gh"
# Seconds to wait for any single remote call before treating it as failed.
timeout_secs = 30

# ---------------------------------------------------------------------------
# Static assets checked by `docmirror check-assets`
# ---------------------------------------------------------------------------
[assets]
required = ["public/logo.svg", "public/favicon.svg"]

# ---------------------------------------------------------------------------
# Products
# ---------------------------------------------------------------------------
# One table per product; the key is the product id and the URL namespace
# (/<id>/<category>/<slug>). Defining any product here replaces the stock
# registry.
[products.moat]
name = "Moat"
display_name = "MOAT"
tagline = "Let agents break things safely"
github_url = "https://github.com/majorcontext/moat"
color = "sky"
# Repository and directory the docs are mirrored from.
docs_repo = "majorcontext/moat"
docs_path = "docs/content"
# Used when a document's frontmatter has no description.
default_description = "Documentation"
"##
}

//! Frontmatter detection, synthesis and parsing.
//!
//! Every stored document starts with a YAML block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: "Installation"
//! description: "Install the CLI"
//! keywords: [install, setup]
//! ---
//! ```
//!
//! `title` is required and must be non-empty. `description` falls back to the
//! product's placeholder and `keywords` to an empty list. Documents arriving
//! without any frontmatter get a minimal block synthesized from their filename.

use crate::naming;
use serde::Deserialize;
use thiserror::Error;

const DELIMITER: &str = "---";

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("frontmatter block is not terminated by `---`")]
    Unterminated,
    #[error("frontmatter YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("`title` must be a non-empty string")]
    EmptyTitle,
}

/// Validated document metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub last_updated: Option<String>,
    pub category: Option<String>,
}

#[derive(Deserialize)]
struct RawFrontmatter {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default, alias = "lastUpdated")]
    last_updated: Option<serde_yaml::Value>,
    #[serde(default)]
    category: Option<String>,
}

/// Whether the text opens with a frontmatter delimiter (a byte-order mark and
/// leading whitespace ignored).
pub fn has_frontmatter(text: &str) -> bool {
    strip_bom(text).trim_start().starts_with(DELIMITER)
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{feff}').unwrap_or(text)
}

/// Minimal frontmatter block for a document that has none.
pub fn synthesize(filename: &str) -> String {
    let title = naming::title_from_filename(filename);
    format!("{DELIMITER}\ntitle: \"{}\"\n{DELIMITER}\n\n", escape_yaml(&title))
}

fn escape_yaml(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Prepend synthesized frontmatter when missing.
///
/// Returns the (possibly new) text and whether synthesis happened. A leading
/// byte-order mark is dropped either way.
pub fn ensure(text: &str, filename: &str) -> (String, bool) {
    let text = strip_bom(text);
    if has_frontmatter(text) {
        (text.to_string(), false)
    } else {
        (format!("{}{}", synthesize(filename), text), true)
    }
}

/// Split a document into its YAML block and body.
///
/// Returns `Ok(None)` when the text has no frontmatter at all.
pub fn split(text: &str) -> Result<Option<(&str, &str)>, FrontmatterError> {
    let trimmed = strip_bom(text).trim_start();
    let Some(after_open) = trimmed.strip_prefix(DELIMITER) else {
        return Ok(None);
    };
    let Some(newline) = after_open.find('\n') else {
        return Err(FrontmatterError::Unterminated);
    };
    let rest = &after_open[newline + 1..];

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(Some((yaml, body)));
        }
        offset += line.len();
    }
    Err(FrontmatterError::Unterminated)
}

/// Text after the frontmatter block, or the whole text when there is none.
pub fn body(text: &str) -> &str {
    match split(text) {
        Ok(Some((_, body))) => body,
        _ => text,
    }
}

impl Frontmatter {
    /// Parse and validate the frontmatter of a document.
    ///
    /// `default_description` is used when the block has no `description`.
    pub fn parse(text: &str, default_description: &str) -> Result<Self, FrontmatterError> {
        let yaml = match split(text)? {
            Some((yaml, _)) => yaml,
            None => "",
        };
        let raw: RawFrontmatter = if yaml.trim().is_empty() {
            RawFrontmatter {
                title: None,
                description: None,
                keywords: Vec::new(),
                last_updated: None,
                category: None,
            }
        } else {
            serde_yaml::from_str(yaml)?
        };

        let title = raw
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(FrontmatterError::EmptyTitle)?;

        Ok(Self {
            title,
            description: raw
                .description
                .unwrap_or_else(|| default_description.to_string()),
            keywords: raw.keywords,
            last_updated: raw.last_updated.and_then(|v| match v {
                serde_yaml::Value::String(s) => Some(s),
                serde_yaml::Value::Null => None,
                other => serde_yaml::to_string(&other)
                    .ok()
                    .map(|s| s.trim().to_string()),
            }),
            category: raw.category,
        })
    }
}

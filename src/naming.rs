//! Centralized filename parsing for the `NN-name` convention.
//!
//! Documentation files and category directories share one naming pattern: an
//! optional numeric ordering prefix (`NN-`) followed by a name. The prefix
//! controls ordering in navigation and never appears in a URL.
//!
//! ## Derived Forms
//!
//! - **Slug**: the name with the prefix and `.md` extension removed.
//!   `02-installation.md` → `installation`
//! - **Display title**: the slug with `-`/`_` turned into spaces and every word
//!   capitalized. `03-my_topic.md` → `My Topic`
//!
//! Stripping is purely positional: `01-intro.md` and `1-intro.md` produce the
//! same slug. Collisions are caught later by the sync stage.

/// Result of parsing an entry name like `02-installation.md`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Ordering number if the name has a digit prefix that fits a `u32`.
    pub number: Option<u32>,
    /// Name with the prefix and `.md` extension stripped.
    pub slug: String,
}

/// Remove a leading run of ASCII digits followed by a single `-`.
///
/// Names without that shape are returned unchanged:
/// - `"02-installation"` → `"installation"`
/// - `"installation"` → `"installation"`
/// - `"2024"` → `"2024"` (no dash, no prefix)
/// - `"-draft"` → `"-draft"` (dash without digits)
pub fn strip_numeric_prefix(name: &str) -> &str {
    let digits = name.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 && name.as_bytes().get(digits) == Some(&b'-') {
        &name[digits + 1..]
    } else {
        name
    }
}

/// Remove a trailing `.md` extension, if present.
pub fn strip_md_extension(name: &str) -> &str {
    name.strip_suffix(".md").unwrap_or(name)
}

/// Slug for a markdown filename: extension first, then ordering prefix.
pub fn slug_from_filename(filename: &str) -> String {
    strip_numeric_prefix(strip_md_extension(filename)).to_string()
}

/// Parse a file or directory name following the `NN-name` convention.
pub fn parse_entry_name(name: &str) -> ParsedName {
    let stem = strip_md_extension(name);
    let slug = strip_numeric_prefix(stem);
    let number = if slug.len() < stem.len() {
        stem[..stem.len() - slug.len() - 1].parse().ok()
    } else {
        None
    };
    ParsedName {
        number,
        slug: slug.to_string(),
    }
}

/// Convert a name to title case: split on `-` and `_`, capitalize each word.
pub fn title_case(name: &str) -> String {
    name.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display title for a markdown filename (`03-my_topic.md` → `My Topic`).
pub fn title_from_filename(filename: &str) -> String {
    title_case(&slug_from_filename(filename))
}

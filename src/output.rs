//! Operator-facing output for every command.
//!
//! # Information-First Display
//!
//! Documents are shown by their semantic identity (position and title), with
//! the upstream source and the canonical URL as indented context lines. Paths
//! on disk appear only where the operator has to act on them, as in broken
//! link locations.
//!
//! # Output Format
//!
//! ## Sync
//!
//! ```text
//! moat → src/content/moat
//!     001 Introduction
//!         Source: docs/content/getting-started/01-introduction.md
//!         URL: /moat/getting-started/introduction
//!     002 My Topic (frontmatter added)
//!         Source: docs/content/guides/03-my_topic.md
//!         URL: /moat/guides/my_topic
//! ✓ Synced 2 documents (2 added, 0 changed, 0 unchanged, 0 removed), 3 links rewritten
//! ```
//!
//! A run that fell back to the previous mirror prints:
//!
//! ```text
//! ⚠ moat: using cached documentation from previous build
//!     Cause: ✗ GitHub API rate limit exceeded.
//! ```
//!
//! ## Validate
//!
//! ```text
//! Found 2 valid pages:
//!
//!   /moat/concepts/sandboxing
//!   /moat/getting-started/introduction
//!
//! ✗ Found 1 broken link(s):
//!
//!   src/content/moat/concepts/01-sandboxing.md:7
//!     Link: [proxies](/moat/reference/proxies)
//!     Target: /moat/reference/proxies (not found)
//! ```
//!
//! ## Check assets
//!
//! ```text
//! ✓ public/logo.svg
//! ✗ public/favicon.svg (missing)
//!
//! Missing 1 required asset(s):
//!   - public/favicon.svg
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout or stderr.
//! Format functions are pure: no I/O, no side effects.

use crate::assets::AssetReport;
use crate::sync::{SyncOutcome, SyncReport};
use crate::validate::ValidationReport;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Show `path` relative to `root` when it lies beneath it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Sync
// ============================================================================

fn format_sync_report(report: &SyncReport, store_label: &str) -> Vec<String> {
    let mut lines = vec![format!("{} \u{2192} {}", report.product, store_label)];

    for (i, doc) in report.documents.iter().enumerate() {
        let marker = if doc.synthesized_frontmatter {
            " (frontmatter added)"
        } else {
            ""
        };
        lines.push(format!(
            "{}{} {}{}",
            indent(1),
            format_index(i + 1),
            doc.frontmatter.title,
            marker
        ));
        lines.push(format!("{}Source: {}", indent(2), doc.source_path));
        lines.push(format!("{}URL: {}", indent(2), doc.canonical));
    }

    lines.push(format!(
        "\u{2713} Synced {} documents ({}), {} links rewritten",
        report.documents.len(),
        report.changes,
        report.links_rewritten
    ));
    if report.synthesized > 0 {
        lines.push(format!(
            "\u{26a0} {} document(s) had no frontmatter; defaults were added",
            report.synthesized
        ));
    }
    lines
}

/// Format the result of syncing one product.
///
/// `store_label` is the store directory as the operator should see it.
pub fn format_sync_outcome(outcome: &SyncOutcome, store_label: &str) -> Vec<String> {
    match outcome {
        SyncOutcome::Synced(report) => format_sync_report(report, store_label),
        SyncOutcome::Stale { product, error } => {
            let mut lines = vec![format!(
                "\u{26a0} {product}: using cached documentation from previous build"
            )];
            let mut cause = error.to_string().lines().map(str::to_string).collect::<Vec<_>>();
            if let Some(first) = cause.first_mut() {
                *first = format!("Cause: {first}");
            }
            lines.extend(cause.into_iter().map(|l| format!("{}{}", indent(1), l)));
            lines
        }
    }
}

/// Print sync results to stdout.
pub fn print_sync_outcome(outcome: &SyncOutcome, store_label: &str) {
    for line in format_sync_outcome(outcome, store_label) {
        println!("{}", line);
    }
}

// ============================================================================
// Validate
// ============================================================================

/// Listing of every page the validator considers a valid link target.
pub fn format_valid_pages(report: &ValidationReport) -> Vec<String> {
    let mut lines = vec![
        format!("Found {} valid pages:", report.valid_paths.len()),
        String::new(),
    ];
    lines.extend(report.valid_paths.iter().map(|p| format!("  {p}")));
    lines.push(String::new());
    lines
}

/// Verdict lines: a success line, or every broken link with its location.
///
/// Document paths are shown relative to `project_root`.
pub fn format_link_verdict(report: &ValidationReport, project_root: &Path) -> Vec<String> {
    if report.is_clean() {
        return vec!["\u{2713} All internal links are valid!".to_string()];
    }

    let mut lines = vec![
        format!("\u{2717} Found {} broken link(s):", report.broken.len()),
        String::new(),
    ];
    for broken in &report.broken {
        lines.push(format!(
            "  {}:{}",
            display_path(&broken.document, project_root),
            broken.line
        ));
        lines.push(format!("    Link: {}", broken.raw_link));
        lines.push(format!("    Target: {} (not found)", broken.target));
        lines.push(String::new());
    }
    lines
}

/// Print a validation report: pages to stdout, broken links to stderr.
pub fn print_validation_report(report: &ValidationReport, project_root: &Path) {
    for line in format_valid_pages(report) {
        println!("{}", line);
    }
    let verdict = format_link_verdict(report, project_root);
    if report.is_clean() {
        verdict.iter().for_each(|line| println!("{}", line));
    } else {
        verdict.iter().for_each(|line| eprintln!("{}", line));
    }
}

// ============================================================================
// Assets
// ============================================================================

pub fn format_asset_report(report: &AssetReport, required: &[String]) -> Vec<String> {
    let mut lines: Vec<String> = required
        .iter()
        .map(|asset| {
            if report.missing.contains(asset) {
                format!("\u{2717} {asset} (missing)")
            } else {
                format!("\u{2713} {asset}")
            }
        })
        .collect();
    lines.push(String::new());

    if report.is_complete() {
        lines.push("All required assets are present!".to_string());
    } else {
        lines.push(format!(
            "Missing {} required asset(s):",
            report.missing.len()
        ));
        lines.extend(report.missing.iter().map(|a| format!("  - {a}")));
    }
    lines
}

pub fn print_asset_report(report: &AssetReport, required: &[String]) {
    for line in format_asset_report(report, required) {
        if report.is_complete() {
            println!("{}", line);
        } else {
            eprintln!("{}", line);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

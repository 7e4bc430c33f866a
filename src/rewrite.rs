//! Batch link rewriting applied to every document during sync.
//!
//! Parses the markdown with the same options as the renderer and replaces the
//! raw destination of each inline link and reference definition whose target
//! is a relative `.md` file. Link text, titles and every other byte of the
//! document are preserved. Links inside code are not links and stay as they are.
//!
//! The decision for a single destination lives in [`rewrite_target`], which
//! the render-time rewriter in [`crate::render`] also calls. Both see the
//! destination after markdown unescaping, so they produce identical URLs for
//! the same link and containing document.

use crate::canonical;
use pulldown_cmark::{Event, LinkType, Options, Parser, Tag, TagEnd};
use std::ops::Range;

/// Parser options shared by the batch and render-time rewriters.
pub fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

/// Autolinks and email links carry a literal address, never a document path.
pub fn is_rewritable(link_type: LinkType) -> bool {
    !matches!(link_type, LinkType::Autolink | LinkType::Email)
}

/// Result of rewriting one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewritten {
    pub content: String,
    /// Number of link destinations that were replaced.
    pub rewritten: usize,
}

/// Canonical replacement for a single link destination, if it needs one.
pub fn rewrite_target(target: &str, referencing_doc: &str, product_id: &str) -> Option<String> {
    canonical::is_relative_markdown_link(target)
        .then(|| canonical::canonicalize(target, referencing_doc, product_id).into_string())
}

/// Rewrite every relative markdown link in `content`.
///
/// `referencing_doc` is the store-relative path of the document being
/// rewritten; only its parent directory name matters.
pub fn rewrite_links(content: &str, referencing_doc: &str, product_id: &str) -> Rewritten {
    let parser = Parser::new_ext(content, markdown_options()).into_offset_iter();

    let mut edits: Vec<(Range<usize>, String)> = parser
        .reference_definitions()
        .iter()
        .filter_map(|(_, def)| {
            let url = rewrite_target(&def.dest, referencing_doc, product_id)?;
            Some((definition_destination(content, &def.span)?, url))
        })
        .collect();

    // (whole link span, replacement, end of the link text seen so far)
    let mut open: Option<(Range<usize>, String, usize)> = None;
    for (event, range) in parser {
        match event {
            Event::Start(Tag::Link {
                link_type: LinkType::Inline,
                dest_url,
                ..
            }) => {
                open = rewrite_target(&dest_url, referencing_doc, product_id)
                    .map(|url| (range.clone(), url, range.start + 1));
            }
            Event::End(TagEnd::Link) => {
                if let Some((link, url, text_end)) = open.take()
                    && let Some(span) = inline_destination(content, &link, text_end)
                {
                    edits.push((span, url));
                }
            }
            _ => {
                if let Some((_, _, text_end)) = open.as_mut() {
                    *text_end = (*text_end).max(range.end);
                }
            }
        }
    }

    edits.sort_by_key(|(span, _)| span.start);
    let mut out = String::with_capacity(content.len());
    let mut cursor = 0;
    for (span, url) in &edits {
        out.push_str(&content[cursor..span.start]);
        out.push_str(&destination_text(url));
        cursor = span.end;
    }
    out.push_str(&content[cursor..]);

    Rewritten {
        content: out,
        rewritten: edits.len(),
    }
}

/// Raw destination of an inline link: after the `](` that closes its text.
fn inline_destination(source: &str, link: &Range<usize>, text_end: usize) -> Option<Range<usize>> {
    let open = text_end + source.get(text_end..link.end)?.find("](")? + 2;
    destination_span(source, skip_whitespace(source, open, link.end), link.end)
}

/// Raw destination of a `[label]: dest "title"` definition.
fn definition_destination(source: &str, def: &Range<usize>) -> Option<Range<usize>> {
    let colon = def.start + source.get(def.clone())?.find("]:")? + 2;
    destination_span(source, skip_whitespace(source, colon, def.end), def.end)
}

fn skip_whitespace(source: &str, from: usize, limit: usize) -> usize {
    let rest = &source[from..limit];
    from + rest.len() - rest.trim_start().len()
}

/// `<...>` including the brackets, or a run without whitespace and with
/// balanced, unescaped parentheses.
fn destination_span(source: &str, start: usize, limit: usize) -> Option<Range<usize>> {
    let raw = source.get(start..limit)?;
    if raw.starts_with('<') {
        let close = raw.find('>')?;
        return Some(start..start + close + 1);
    }
    let mut depth = 0usize;
    let mut escaped = false;
    for (i, c) in raw.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' if depth == 0 => return Some(start..start + i),
            ')' => depth -= 1,
            c if c.is_whitespace() => return Some(start..start + i),
            _ => {}
        }
    }
    Some(start..limit)
}

fn destination_text(url: &str) -> String {
    if url.contains(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>')) {
        format!("<{url}>")
    } else {
        url.to_string()
    }
}

//! Render-time link rewriting over the markdown event stream.
//!
//! Synced documents have already been rewritten, but the renderer applies the
//! same rules again to each link node so content edited after sync still
//! resolves. Destinations go through [`rewrite::rewrite_target`] after the
//! same parsing as the batch pass, so both produce identical URLs.

use crate::frontmatter;
use crate::rewrite::{self, markdown_options};
use pulldown_cmark::{CowStr, Event, Parser, Tag, html as md_html};

/// Rewrite the destination of every link event in place.
pub fn rewrite_events<'a, 'b>(
    events: impl Iterator<Item = Event<'a>>,
    doc_path: &'b str,
    product_id: &'b str,
) -> impl Iterator<Item = Event<'a>> {
    events.map(move |event| match event {
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) if rewrite::is_rewritable(link_type) => {
            let dest_url = match rewrite::rewrite_target(&dest_url, doc_path, product_id) {
                Some(url) => CowStr::from(url),
                None => dest_url,
            };
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                title,
                id,
            })
        }
        other => other,
    })
}

/// Link destinations of a markdown body after render-time rewriting.
pub fn link_destinations(markdown: &str, doc_path: &str, product_id: &str) -> Vec<String> {
    let parser = Parser::new_ext(markdown, markdown_options());
    rewrite_events(parser, doc_path, product_id)
        .filter_map(|event| match event {
            Event::Start(Tag::Link { dest_url, .. }) => Some(dest_url.to_string()),
            _ => None,
        })
        .collect()
}

/// Render a stored document to HTML, dropping its frontmatter block.
pub fn render_document(text: &str, doc_path: &str, product_id: &str) -> String {
    let body = frontmatter::body(text);
    let parser = Parser::new_ext(body, markdown_options());
    let mut html = String::new();
    md_html::push_html(&mut html, rewrite_events(parser, doc_path, product_id));
    html
}

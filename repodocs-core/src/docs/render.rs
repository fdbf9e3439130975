//! HTML page composition for documentation runs
//!
//! Chunks arrive pre-rendered and trusted; they are emitted verbatim, in
//! the order given, with a separator between consecutive chunks. Header
//! values (repository name, URL) are the only untrusted strings on the
//! page and get escaped.

use crate::format::format_generated_at;
use crate::types::{DocChunk, DocumentationView};

/// Shown when a documentation run has no chunks
pub const EMPTY_MESSAGE: &str = "No documentation content available.";

const PAGE_STYLE: &str = r#"
body { font-family: -apple-system, 'Segoe UI', sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; line-height: 1.6; color: #1f2328; }
header { border-bottom: 1px solid #d1d9e0; padding-bottom: 1rem; margin-bottom: 1.5rem; }
header h1 { margin-bottom: 0.25rem; }
header .meta { color: #59636e; font-size: 0.9rem; }
main hr { border: none; border-top: 1px solid #d1d9e0; margin: 2rem 0; }
p.empty { color: #59636e; font-style: italic; }
pre { background: #f6f8fa; padding: 0.75rem; border-radius: 6px; overflow-x: auto; }
"#;

/// Render a complete HTML page for a documentation run.
///
/// The chunk slice must already be in render order; callers get it from
/// [`crate::db::Database::list_chunks`], which orders by chunk_index.
pub fn documentation_page(view: &DocumentationView, chunks: &[DocChunk]) -> String {
    let title = format!("{} Documentation", view.repo_name);

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&title)));
    html.push_str(&format!("<style>{}</style>\n", PAGE_STYLE));
    html.push_str("</head>\n<body>\n");

    // Header: repository context for the run
    html.push_str("<header>\n");
    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&title)));
    html.push_str(&format!(
        "<p class=\"meta\">Generated on {}</p>\n",
        format_generated_at(view.generated_at)
    ));
    if let Some(url) = &view.repo_url {
        html.push_str(&format!(
            "<p class=\"meta\"><a href=\"{}\">View repository</a></p>\n",
            escape_html(url)
        ));
    }
    html.push_str("</header>\n");

    // Body: chunks verbatim, separated; explicit empty state otherwise
    html.push_str("<main>\n");
    if chunks.is_empty() {
        html.push_str(&format!("<p class=\"empty\">{}</p>\n", EMPTY_MESSAGE));
    } else {
        for (i, chunk) in chunks.iter().enumerate() {
            if i > 0 {
                html.push_str("<hr class=\"chunk-separator\">\n");
            }
            html.push_str(&chunk.content);
            html.push('\n');
        }
    }
    html.push_str("</main>\n");

    html.push_str("</body>\n</html>\n");
    html
}

/// Escape a string for use in HTML text or attribute values.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_view(name: &str) -> DocumentationView {
        DocumentationView {
            id: 1,
            repo_id: 7,
            generated_at: Utc::now(),
            repo_name: name.to_string(),
            repo_url: Some("https://github.com/acme/demo".to_string()),
        }
    }

    fn chunk(index: i64, content: &str) -> DocChunk {
        DocChunk {
            id: index + 1,
            documentation_id: 1,
            chunk_index: index,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_chunks_rendered_verbatim_in_order() {
        let chunks = vec![
            chunk(0, "<h2>Install</h2><p>cargo install demo</p>"),
            chunk(1, "<h2>Usage</h2>"),
        ];
        let page = documentation_page(&sample_view("demo"), &chunks);

        let install = page.find("<h2>Install</h2>").unwrap();
        let usage = page.find("<h2>Usage</h2>").unwrap();
        assert!(install < usage, "chunks must keep their given order");

        // Chunk HTML is trusted and must not be escaped
        assert!(page.contains("<p>cargo install demo</p>"));
    }

    #[test]
    fn test_separator_between_consecutive_chunks_only() {
        let two = documentation_page(
            &sample_view("demo"),
            &[chunk(0, "<p>a</p>"), chunk(1, "<p>b</p>")],
        );
        assert_eq!(two.matches("<hr class=\"chunk-separator\">").count(), 1);

        let three = documentation_page(
            &sample_view("demo"),
            &[chunk(0, "<p>a</p>"), chunk(1, "<p>b</p>"), chunk(2, "<p>c</p>")],
        );
        assert_eq!(three.matches("<hr class=\"chunk-separator\">").count(), 2);

        let one = documentation_page(&sample_view("demo"), &[chunk(0, "<p>a</p>")]);
        assert!(!one.contains("chunk-separator"));
    }

    #[test]
    fn test_empty_run_gets_explicit_message() {
        let page = documentation_page(&sample_view("demo"), &[]);
        assert!(page.contains(EMPTY_MESSAGE));
        assert!(!page.contains("chunk-separator"));
    }

    #[test]
    fn test_header_values_are_escaped() {
        let page = documentation_page(&sample_view("<b>sneaky</b>"), &[]);
        assert!(page.contains("&lt;b&gt;sneaky&lt;/b&gt; Documentation"));
        assert!(!page.contains("<b>sneaky</b>"));
    }
}

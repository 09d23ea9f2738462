//! Best-effort HTML to Markdown conversion for inbound Note content.
//!
//! Remote servers deliver `content` as sanitized HTML. Only three shapes
//! matter for round-tripping: anchors become `[text](href)`, paragraphs
//! become blank-line breaks, `<br>` becomes a newline. Every other tag is
//! descended transparently and dropped.

/// Convert an HTML fragment to Markdown-ish plain text.
#[must_use]
pub fn html_to_markdown(input: &str) -> String {
    let mut out = String::new();
    // hrefs of currently-open anchors
    let mut anchors: Vec<String> = Vec::new();

    let mut i = 0;
    while i < input.len() {
        if input[i..].starts_with('<') {
            let Some(end) = input[i..].find('>') else {
                out.push_str(&unescape(&input[i..]));
                break;
            };
            let tag = &input[i + 1..i + end];
            i += end + 1;
            handle_tag(tag, &mut out, &mut anchors);
        } else {
            let next = input[i..].find('<').map_or(input.len(), |p| i + p);
            out.push_str(&unescape(&input[i..next]));
            i = next;
        }
    }

    out
}

fn handle_tag(tag: &str, out: &mut String, anchors: &mut Vec<String>) {
    let tag = tag.trim();
    if tag.starts_with('!') || tag.starts_with('?') {
        return;
    }

    let (closing, tag) = match tag.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, tag),
    };

    let name: String = tag
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase();
    let attrs = &tag[name.len()..];

    match (name.as_str(), closing) {
        ("a", false) => {
            anchors.push(attr_value(attrs, "href").unwrap_or_default());
            out.push('[');
        }
        ("a", true) => {
            if let Some(href) = anchors.pop() {
                out.push_str("](");
                out.push_str(&href);
                out.push(')');
            }
        }
        ("p", false) => out.push_str("\n\n"),
        ("br", false) => out.push('\n'),
        _ => {}
    }
}

/// Extract a named attribute value from the attribute section of a tag.
fn attr_value(attrs: &str, name: &str) -> Option<String> {
    let mut rest = attrs;
    while let Some(pos) = rest.find(name) {
        let before_ok = rest[..pos]
            .chars()
            .next_back()
            .is_none_or(|c| c.is_whitespace());
        let after = &rest[pos + name.len()..];
        if !before_ok {
            rest = after;
            continue;
        }

        let after = after.trim_start();
        let Some(after) = after.strip_prefix('=') else {
            rest = &rest[pos + name.len()..];
            continue;
        };
        let after = after.trim_start();

        if let Some(stripped) = after.strip_prefix('"') {
            return Some(stripped.split('"').next().unwrap_or_default().to_string());
        }
        if let Some(stripped) = after.strip_prefix('\'') {
            return Some(stripped.split('\'').next().unwrap_or_default().to_string());
        }
        return Some(
            after
                .split(|c: char| c.is_whitespace())
                .next()
                .unwrap_or_default()
                .to_string(),
        );
    }
    None
}

/// Decode the entities sanitized HTML actually contains.
fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_and_anchor() {
        let html = r#"<p>hi <a href="x">link</a></p>"#;
        assert_eq!(html_to_markdown(html), "\n\nhi [link](x)");
        assert_eq!(html_to_markdown(html).trim_matches('\n'), "hi [link](x)");
    }

    #[test]
    fn test_br_and_multiple_paragraphs() {
        let html = "<p>one<br>two</p><p>three</p>";
        assert_eq!(html_to_markdown(html), "\n\none\ntwo\n\nthree");
    }

    #[test]
    fn test_unknown_tags_descend_transparently() {
        let html = "<p><span class=\"x\">styled <strong>bold</strong></span></p>";
        assert_eq!(html_to_markdown(html), "\n\nstyled bold");
    }

    #[test]
    fn test_nested_anchor_text() {
        let html = r#"<a href="https://r/u"><span>@bob</span></a>"#;
        assert_eq!(html_to_markdown(html), "[@bob](https://r/u)");
    }

    #[test]
    fn test_anchor_without_href() {
        assert_eq!(html_to_markdown("<a>plain</a>"), "[plain]()");
    }

    #[test]
    fn test_entities() {
        assert_eq!(html_to_markdown("a &amp; b &lt;c&gt;"), "a & b <c>");
    }

    #[test]
    fn test_single_quoted_and_unquoted_attrs() {
        assert_eq!(html_to_markdown("<a href='x y'>t</a>"), "[t](x y)");
        assert_eq!(html_to_markdown("<a href=x>t</a>"), "[t](x)");
        assert_eq!(
            html_to_markdown(r#"<a rel="nofollow" href="u">t</a>"#),
            "[t](u)"
        );
    }

    #[test]
    fn test_unterminated_tag_falls_back_to_text() {
        assert_eq!(html_to_markdown("ok <broken"), "ok <broken");
    }

    #[test]
    fn test_comment_is_dropped() {
        assert_eq!(html_to_markdown("a<!-- hidden -->b"), "ab");
    }
}

//! Minimal XML handling for the management API.
//!
//! Responses are flat `<response>` documents or `<error>` envelopes, so a
//! few anchored regexes are enough.

use std::sync::LazyLock;

use regex::Regex;

static OK_RESPONSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*(<\?xml[^>]*\?>)?\s*<response>\s*OK\s*</response>\s*$")
        .expect("static regex")
});

static CSRF_META: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta\s+name="csrf_token"\s+content="([^"]*)""#).expect("static regex")
});

/// Text of the first `<tag>...</tag>` element, trimmed. `<tag/>` is empty.
pub fn tag_text(body: &str, tag: &str) -> Option<String> {
    let tag = regex::escape(tag);
    let re = Regex::new(&format!(r"(?s)<{tag}>(.*?)</{tag}>|<{tag}\s*/>")).ok()?;
    let caps = re.captures(body)?;
    Some(
        caps.get(1)
            .map(|m| unescape(m.as_str().trim()))
            .unwrap_or_default(),
    )
}

/// Whether the body is exactly `<response>OK</response>`.
pub fn is_ok_response(body: &str) -> bool {
    OK_RESPONSE.is_match(body)
}

/// Code and message of an `<error>` envelope.
pub fn error_envelope(body: &str) -> Option<(u32, String)> {
    let error = tag_text(body, "error")?;
    let code = tag_text(&error, "code")?.parse().ok()?;
    let message = tag_text(&error, "message").unwrap_or_default();
    Some((code, message))
}

/// `<request>` document with one element per field, in order.
pub fn request_body(fields: &[(&str, &str)]) -> String {
    let mut body = String::from(r#"<?xml version="1.0" encoding="UTF-8"?><request>"#);
    for (name, value) in fields {
        body.push_str(&format!("<{name}>{}</{name}>", escape(value)));
    }
    body.push_str("</request>");
    body
}

/// Verification tokens embedded in the web UI's home page.
pub fn csrf_tokens_from_html(html: &str) -> Vec<String> {
    CSRF_META
        .captures_iter(html)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .filter(|t| !t.is_empty())
        .collect()
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

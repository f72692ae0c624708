/// Escapes string values written to cleaned output.
pub trait Escaper: Send + Sync {
    fn escape(&self, input: &str) -> String;
}

/// Replaces the characters significant in HTML text and attribute values.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEscaper;

impl Escaper for HtmlEscaper {
    fn escape(&self, input: &str) -> String {
        input
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;")
            .replace('\'', "&#x27;")
            .replace('`', "&#x60;")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            HtmlEscaper.escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#x27;Jerry&#x27;&lt;/a&gt;"
        );
        assert_eq!(HtmlEscaper.escape("&amp;"), "&amp;amp;");
        assert_eq!(HtmlEscaper.escape("plain"), "plain");
    }
}

// DynamicSuite
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Placeholder substitution for the page template

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{{title}}</title>
    <meta name="description" content="{{meta_description}}">
    {{styles}}
</head>
<body>
    <!-- Client data consumed by the front end -->
    <script>window.dynamicsuite = {{client_data}};</script>
    <div id="dynamicsuite">{{body}}</div>
    {{scripts}}
</body>
</html>
"#;

/// Placeholder values for one document, keyed by name without braces
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    values: BTreeMap<String, String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, placeholder: &str, value: impl Into<String>) -> Self {
        self.values.insert(placeholder.to_string(), value.into());
        self
    }

    pub fn get(&self, placeholder: &str) -> Option<&str> {
        self.values.get(placeholder).map(String::as_str)
    }

    pub fn placeholders(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Default for Template {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl Template {
    /// Comments and inter-tag whitespace are stripped from `source` here,
    /// never from the values substituted into it.
    pub fn new(source: impl AsRef<str>) -> Self {
        Self {
            source: minify(&strip_comments(source.as_ref())),
        }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(Self::new(fs::read_to_string(path)?))
    }

    /// Substitute every `{{name}}`. Placeholders without a value become empty.
    pub fn render(&self, document: &Document) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = self.source.as_str();

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            match after.find("}}") {
                Some(end) => {
                    let name = after[..end].trim();
                    out.push_str(document.get(name).unwrap_or_default());
                    rest = &after[end + 2..];
                }
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Remove `<!-- ... -->` comments; an unterminated one is left in place
fn strip_comments(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut rest = html;
    while let Some(start) = rest.find("<!--") {
        let Some(end) = rest[start..].find("-->") else {
            break;
        };
        out.push_str(&rest[..start]);
        rest = &rest[start + end + 3..];
    }
    out.push_str(rest);
    out
}

/// Drop line breaks between tags and placeholders and trim each line
fn minify(html: &str) -> String {
    let joined: String = html.lines().map(str::trim).filter(|l| !l.is_empty()).collect::<Vec<_>>().join("\n");

    let mut out = String::with_capacity(joined.len());
    for (i, c) in joined.char_indices() {
        let next = &joined[i + 1..];
        if c == '\n' && (out.ends_with('>') || out.ends_with("}}")) && (next.starts_with('<') || next.starts_with("{{")) {
            continue;
        }
        out.push(c);
    }
    out
}

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

    #[test]
    fn test_substitution_and_stripping() {
        let template = Template::new("<html>\n  <!-- note -->\n  <title>{{ title }}</title>\n  <p>{{body}}{{missing}}</p>\n</html>");
        let document = Document::new().set("title", "Home").set("body", "Hello");
        assert_eq!(template.render(&document), "<html><title>Home</title><p>Hello</p></html>");
    }

    #[test]
    fn test_unterminated_placeholder_left_alone() {
        let template = Template::new("<p>{{body</p>");
        assert_eq!(template.render(&Document::new()), "<p>{{body</p>");
    }

    #[test]
    fn test_substituted_values_are_not_rewritten() {
        let template = Template::new("<body>\n  <div>{{body}}</div>\n  {{scripts}}\n</body>");
        let document = Document::new()
            .set("body", "<p>a <!-- b</p>\n<pre>  two\n   lines</pre>")
            .set("scripts", "<script src=\"app.js\"></script>");
        assert_eq!(
            template.render(&document),
            "<body><div><p>a <!-- b</p>\n<pre>  two\n   lines</pre></div><script src=\"app.js\"></script></body>"
        );
    }

    #[test]
    fn test_unterminated_comment_in_template_kept() {
        assert_eq!(strip_comments("<p>a<!-- x -->b<!-- c</p>"), "<p>ab<!-- c</p>");
    }

    #[test]
    fn test_default_template_has_every_placeholder() {
        let source = Template::default().source;
        for name in ["title", "meta_description", "styles", "client_data", "body", "scripts"] {
            assert!(source.contains(&format!("{{{{{}}}}}", name)), "missing {}", name);
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;");
    }
}

//! Code block highlighting with line numbers

use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{styled_line_to_highlighted_html, IncludeBackground};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::markdown::{Element, ElementRenderer};
use crate::config::HighlightConfig;
use crate::helpers::html_escape;

const FALLBACK_THEME: &str = "base16-ocean.dark";

/// Renders fenced code as a `<pre>` with one row per line
///
/// Each row carries its line number and the token spans syntect produced
/// for that line, so no span crosses a line boundary.
pub struct CodeHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
    line_numbers: bool,
}

impl CodeHighlighter {
    /// Create a highlighter using one of syntect's bundled themes
    pub fn new(theme_name: &str, line_numbers: bool) -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = match themes.remove(theme_name) {
            Some(theme) => theme,
            None => {
                tracing::warn!(
                    "Unknown highlight theme {:?}, falling back to {}",
                    theme_name,
                    FALLBACK_THEME
                );
                themes.remove(FALLBACK_THEME).unwrap_or_default()
            }
        };

        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
            line_numbers,
        }
    }

    pub fn from_config(config: &HighlightConfig) -> Self {
        Self::new(&config.theme, config.line_number)
    }

    fn find_syntax(&self, lang: &str) -> &SyntaxReference {
        self.syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlight a code block
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let lang = lang.unwrap_or("text");
        let code = code.trim();
        let mut highlighter = HighlightLines::new(self.find_syntax(lang), &self.theme);

        let mut rows = String::new();
        for (i, line) in LinesWithEndings::from(code).enumerate() {
            let markup = match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(regions) => {
                    let regions: Vec<_> = regions
                        .into_iter()
                        .map(|(style, text)| (style, text.trim_end_matches(['\n', '\r'])))
                        .collect();
                    styled_line_to_highlighted_html(&regions, IncludeBackground::No)
                        .unwrap_or_else(|_| html_escape(line.trim_end_matches(['\n', '\r'])))
                }
                Err(e) => {
                    tracing::debug!("Highlighting failed for {} code: {}", lang, e);
                    html_escape(line.trim_end_matches(['\n', '\r']))
                }
            };

            rows.push_str(r#"<div class="line">"#);
            if self.line_numbers {
                rows.push_str(&format!(r#"<span class="line-number">{}</span>"#, i + 1));
            }
            rows.push_str(&format!(r#"<span class="line-content">{}</span></div>"#, markup));
        }

        let style = self
            .theme
            .settings
            .background
            .map(|c| format!(r#" style="background-color:#{:02x}{:02x}{:02x};""#, c.r, c.g, c.b))
            .unwrap_or_default();

        format!(
            "<pre class=\"highlight language-{}\"{}>{}</pre>\n",
            html_escape(lang),
            style,
            rows
        )
    }
}

impl ElementRenderer for CodeHighlighter {
    fn render(&self, element: &Element<'_>) -> String {
        match element {
            Element::CodeBlock { lang, code } => self.highlight(code, *lang),
            // Only registered for code blocks; a component mapped here keeps its children
            Element::Component { children, .. } => children.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_every_line() {
        let highlighter = CodeHighlighter::new("base16-ocean.dark", true);
        let html = highlighter.highlight("fn main() {\n    println!(\"hi\");\n}\n", Some("rust"));

        assert!(html.starts_with(r#"<pre class="highlight language-rust""#));
        assert_eq!(html.matches(r#"<div class="line">"#).count(), 3);
        assert!(html.contains(r#"<span class="line-number">1</span>"#));
        assert!(html.contains(r#"<span class="line-number">3</span>"#));
        assert!(!html.contains(r#"<span class="line-number">4</span>"#));
        // Token-level styling
        assert!(html.contains("<span style=\"color:"));
    }

    #[test]
    fn test_trims_surrounding_blank_lines() {
        let highlighter = CodeHighlighter::new("base16-ocean.dark", true);
        let html = highlighter.highlight("\n\nlet x = 1;\n\n", Some("js"));
        assert_eq!(html.matches(r#"<div class="line">"#).count(), 1);
    }

    #[test]
    fn test_without_line_numbers() {
        let highlighter = CodeHighlighter::new("InspiredGitHub", false);
        let html = highlighter.highlight("a\nb", None);
        assert!(html.contains("language-text"));
        assert!(!html.contains("line-number"));
        assert_eq!(html.matches(r#"<span class="line-content">"#).count(), 2);
    }

    #[test]
    fn test_component_passes_children_through() {
        let highlighter = CodeHighlighter::new("InspiredGitHub", true);
        let props = std::collections::BTreeMap::new();
        let html = highlighter.render(&Element::Component {
            name: "Note",
            props: &props,
            children: "<p>kept</p>",
        });
        assert_eq!(html, "<p>kept</p>");
    }

    #[test]
    fn test_unknown_language_and_theme() {
        let highlighter = CodeHighlighter::new("no-such-theme", true);
        let html = highlighter.highlight("<b>&</b>", Some("not-a-language"));
        assert!(html.contains("language-not-a-language"));
        assert!(html.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
    }
}

//! Front-matter parsing

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::helpers::parse_date;

/// A front-matter block that was recognised but could not be read
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontMatterError {
    #[error("{format} front-matter block is never closed")]
    Unterminated { format: &'static str },

    #[error("malformed {format} front-matter: {message}")]
    Malformed {
        format: &'static str,
        message: String,
    },
}

/// Custom deserializer that handles both a single string and a list of strings
fn string_or_vec<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::{self, SeqAccess, Visitor};
    use std::fmt;

    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Option<Vec<String>>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(vec![value.to_string()]))
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<Self::Value, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let mut vec = Vec::new();
            while let Some(item) = seq.next_element::<String>()? {
                vec.push(item);
            }
            Ok(Some(vec))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}

/// Metadata block from the top of a post
///
/// Every field is optional here; [`PostMetadata`](super::PostMetadata)
/// decides which ones a published post must carry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    /// Absent means unpublished
    pub published: bool,
    #[serde(deserialize_with = "string_or_vec", skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
    pub slug: Option<String>,

    /// Additional custom fields, in source order
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    ///
    /// Recognised blocks, after leading whitespace:
    /// - `---` ... `---` holding YAML (`---yaml` and `---json` select the
    ///   language explicitly)
    /// - `;;;` ... `;;;` holding JSON
    ///
    /// Text without a block yields empty (unpublished) metadata.
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let content = content.trim_start_matches('\u{feff}').trim_start();
        let (first_line, rest) = split_line(content);
        let first_line = first_line.trim_end();

        if let Some(lang) = first_line.strip_prefix("---") {
            return match lang.trim() {
                "" => Self::parse_yaml(content, rest, false),
                "yaml" | "yml" => Self::parse_yaml(content, rest, true),
                "json" => Self::parse_json(rest, "---"),
                // A longer dash run is a markdown thematic break
                other if other.starts_with('-') => Ok((FrontMatter::default(), content)),
                other => Err(FrontMatterError::Malformed {
                    format: "front-matter",
                    message: format!("unsupported language `{}`", other),
                }),
            };
        }

        if first_line == ";;;" {
            return Self::parse_json(rest, ";;;");
        }

        Ok((FrontMatter::default(), content))
    }

    fn parse_yaml<'a>(
        content: &'a str,
        rest: &'a str,
        explicit: bool,
    ) -> Result<(Self, &'a str), FrontMatterError> {
        // No closing fence: the opening `---` was a thematic break
        let Some((yaml, remaining)) = find_closing(rest, "---") else {
            if explicit {
                return Err(FrontMatterError::Unterminated { format: "YAML" });
            }
            return Ok((FrontMatter::default(), content));
        };

        if yaml.trim().is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        // Markdown that happens to sit between two `---` rules is not metadata
        if !explicit && !looks_like_yaml(yaml) {
            return Ok((FrontMatter::default(), content));
        }

        let fm = serde_yaml::from_str::<FrontMatter>(yaml).map_err(|e| {
            FrontMatterError::Malformed {
                format: "YAML",
                message: e.to_string(),
            }
        })?;
        Ok((fm, remaining))
    }

    fn parse_json<'a>(rest: &'a str, fence: &str) -> Result<(Self, &'a str), FrontMatterError> {
        let (json, remaining) =
            find_closing(rest, fence).ok_or(FrontMatterError::Unterminated { format: "JSON" })?;

        let json = json.trim();
        if json.is_empty() {
            return Ok((FrontMatter::default(), remaining));
        }

        // Hexo-style blocks omit the surrounding braces
        let parsed = if json.starts_with('{') {
            serde_json::from_str::<FrontMatter>(json)
        } else {
            serde_json::from_str::<FrontMatter>(&format!("{{{}}}", json))
        };

        let fm = parsed.map_err(|e| FrontMatterError::Malformed {
            format: "JSON",
            message: e.to_string(),
        })?;
        Ok((fm, remaining))
    }

    /// Parse the date string into a NaiveDateTime
    pub fn parse_date(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_date)
    }
}

/// Split off the first line, dropping its `\n`
fn split_line(s: &str) -> (&str, &str) {
    match s.find('\n') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => (s, ""),
    }
}

/// Find the line consisting of `fence` alone.
/// Returns (text before it, text after it).
fn find_closing<'a>(rest: &'a str, fence: &str) -> Option<(&'a str, &'a str)> {
    let mut offset = 0;
    let mut remaining = rest;

    while !remaining.is_empty() {
        let (line, next) = split_line(remaining);
        if line.trim_end() == fence {
            let after = next.trim_start_matches(['\n', '\r']);
            return Some((&rest[..offset], after));
        }
        offset += remaining.len() - next.len();
        remaining = next;
    }

    None
}

/// Valid YAML front-matter has at least one `key: value` line whose key is a
/// plain identifier (so `https://...` in prose does not count)
fn looks_like_yaml(block: &str) -> bool {
    block.lines().any(|line| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return false;
        }

        let Some(colon_pos) = trimmed.find(':') else {
            return false;
        };
        let key = &trimmed[..colon_pos];
        let is_valid_key = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            && !matches!(key, "http" | "https" | "ftp");

        let after_colon = &trimmed[colon_pos + 1..];
        is_valid_key && (after_colon.is_empty() || after_colon.starts_with(' '))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2021-01-01
published: true
description: First post
slug: hello-world
tags:
  - rust
  - mdx
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Hello World"));
        assert_eq!(fm.date.as_deref(), Some("2021-01-01"));
        assert!(fm.published);
        assert_eq!(fm.slug.as_deref(), Some("hello-world"));
        assert_eq!(fm.tags, Some(vec!["rust".to_string(), "mdx".to_string()]));
        assert_eq!(remaining, "This is the content.\n");
    }

    #[test]
    fn test_missing_published_is_false() {
        let (fm, _) = FrontMatter::parse("---\ntitle: Draft\n---\nbody").unwrap();
        assert!(!fm.published);
        assert_eq!(fm.tags, None);
    }

    #[test]
    fn test_no_frontmatter() {
        let (fm, remaining) = FrontMatter::parse("# Just markdown\n").unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert_eq!(remaining, "# Just markdown\n");
    }

    #[test]
    fn test_parse_single_string_tags() {
        let (fm, _) = FrontMatter::parse("---\ntitle: One\ntags: Notes\n---\n").unwrap();
        assert_eq!(fm.tags, Some(vec!["Notes".to_string()]));

        let (fm, _) = FrontMatter::parse("---\ntitle: One\ntags:\n---\n").unwrap();
        assert_eq!(fm.tags, None);
    }

    #[test]
    fn test_extra_fields_keep_order() {
        let (fm, _) =
            FrontMatter::parse("---\ntitle: T\nzeta: 1\ncover: a.png\nalpha: x\n---\n").unwrap();
        let keys: Vec<_> = fm.extra.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "cover", "alpha"]);
    }

    #[test]
    fn test_parse_json_frontmatter() {
        let content = ";;;\n{\"title\": \"Test Post\", \"published\": true, \"tags\": [\"a\", \"b\"]}\n;;;\n\nThis is content.\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Test Post"));
        assert!(fm.published);
        assert_eq!(remaining, "This is content.\n");

        // Hexo style, without braces
        let content = ";;;\n\"title\": \"Bare\",\n\"slug\": \"bare\"\n;;;\nbody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.slug.as_deref(), Some("bare"));
        assert_eq!(remaining, "body");
    }

    #[test]
    fn test_explicit_json_language() {
        let content = "---json\n{\"title\": \"Json\", \"published\": true}\n---\nbody";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Json"));
        assert_eq!(remaining, "body");
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let content = "---\ntitle: \"unclosed\npublished: true\n---\nbody";
        let err = FrontMatter::parse(content).unwrap_err();
        assert!(matches!(err, FrontMatterError::Malformed { format: "YAML", .. }));
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let content = "---\ntitle: T\npublished: maybe\n---\nbody";
        assert!(matches!(
            FrontMatter::parse(content),
            Err(FrontMatterError::Malformed { .. })
        ));
    }

    #[test]
    fn test_unterminated_json_is_an_error() {
        assert_eq!(
            FrontMatter::parse(";;;\n{\"title\": \"x\"}\nbody").unwrap_err(),
            FrontMatterError::Unterminated { format: "JSON" }
        );
    }

    #[test]
    fn test_unsupported_language() {
        assert!(matches!(
            FrontMatter::parse("---toml\ntitle = \"x\"\n---\n"),
            Err(FrontMatterError::Malformed { .. })
        ));
    }

    #[test]
    fn test_markdown_separator_not_yaml() {
        let content = r#"
---

Some random text with markdown lists:
- Item 1
- Item 2

---
More content here.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert!(remaining.contains("Some random text"));
        assert!(remaining.starts_with("---"));
    }

    #[test]
    fn test_content_with_url_not_yaml() {
        let content = "---\n\nCheck out https://example.com/path\n\n---\nMore content.\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title, None);
        assert!(remaining.contains("https://example.com"));
    }

    #[test]
    fn test_unclosed_rule_is_content() {
        let (fm, remaining) = FrontMatter::parse("---\n\nA post that opens with a rule").unwrap();
        assert_eq!(fm, FrontMatter::default());
        assert!(remaining.contains("opens with a rule"));

        let (_, remaining) = FrontMatter::parse("-----\ntitle: x\n-----\n").unwrap();
        assert!(remaining.starts_with("-----"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "---\r\ntitle: Windows\r\npublished: true\r\n---\r\nbody\r\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(fm.title.as_deref(), Some("Windows"));
        assert!(fm.published);
        assert_eq!(remaining, "body\r\n");
    }

    #[test]
    fn test_parse_date() {
        let fm = FrontMatter {
            date: Some("2024-01-15 10:30:00".to_string()),
            ..Default::default()
        };
        let dt = fm.parse_date().unwrap();
        assert_eq!(dt.format("%Y-%m-%d").to_string(), "2024-01-15");
    }
}

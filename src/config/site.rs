//! Site configuration (_config.yml)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub subtitle: String,
    pub description: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub posts_dir: String,
    pub public_dir: String,

    // Content
    /// File extensions treated as posts, without the leading dot
    pub extensions: Vec<String>,
    /// Sort the listing newest-first by front-matter date instead of
    /// reverse directory order
    pub sort_by_date: bool,
    #[serde(default)]
    pub highlight: HighlightConfig,

    // Date format (Moment.js style)
    pub date_format: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Couch Dev".to_string(),
            subtitle: "Prerecorded from my couch, it's a dev making sense of dev things!"
                .to_string(),
            description: String::new(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            posts_dir: "posts".to_string(),
            public_dir: "public".to_string(),

            extensions: vec!["md".to_string(), "mdx".to_string()],
            sort_by_date: false,
            highlight: HighlightConfig::default(),

            date_format: "MMMM DD, YYYY".to_string(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file. An empty file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

/// Code block highlighting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Name of a syntect default theme
    pub theme: String,
    pub line_number: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: "base16-ocean.dark".to_string(),
            line_number: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "Couch Dev");
        assert_eq!(config.posts_dir, "posts");
        assert_eq!(config.extensions, vec!["md", "mdx"]);
        assert!(!config.sort_by_date);
        assert!(config.highlight.line_number);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
posts_dir: content/posts
sort_by_date: true
highlight:
  theme: InspiredGitHub
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.posts_dir, "content/posts");
        assert!(config.sort_by_date);
        assert_eq!(config.highlight.theme, "InspiredGitHub");
        // Unset nested fields keep their defaults
        assert!(config.highlight.line_number);
        assert_eq!(config.public_dir, "public");
    }

    #[test]
    fn test_load_empty_and_invalid() {
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.yml");
        fs::write(&empty, "\n").unwrap();
        assert_eq!(SiteConfig::load(&empty).unwrap().title, "Couch Dev");

        let invalid = dir.path().join("invalid.yml");
        fs::write(&invalid, "title: [unclosed").unwrap();
        assert!(matches!(
            SiteConfig::load(&invalid),
            Err(Error::Config { .. })
        ));

        assert!(SiteConfig::load(dir.path().join("missing.yml"))
            .unwrap_err()
            .is_io());
    }
}

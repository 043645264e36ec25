//! Post model

use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::FrontMatter;
use crate::helpers::parse_date;

/// Why a published file's metadata cannot become a [`Post`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("date `{0}` is not a recognised ISO date")]
    InvalidDate(String),

    #[error("slug `{0}` must be a single path segment")]
    InvalidSlug(String),
}

/// Validated metadata of a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub title: String,
    /// ISO date exactly as written in the front-matter
    pub date: String,
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub description: String,
    pub slug: String,

    /// Custom front-matter fields, passed through to the API
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

impl PostMetadata {
    /// Check the required fields of parsed front-matter
    ///
    /// `title`, `date` and `slug` must be present and non-blank, `date`
    /// must parse and `slug` must be usable as one URL path segment. A
    /// missing `description` becomes the empty string.
    pub fn from_front_matter(fm: FrontMatter) -> Result<Self, MetadataError> {
        let title = required(fm.title, "title")?;
        let date = required(fm.date, "date")?;
        let slug = required(fm.slug, "slug")?;

        if parse_date(&date).is_none() {
            return Err(MetadataError::InvalidDate(date));
        }
        if slug.contains(['/', '\\']) || slug == "." || slug == ".." {
            return Err(MetadataError::InvalidSlug(slug));
        }

        Ok(Self {
            title,
            date,
            published: fm.published,
            tags: fm.tags,
            description: fm.description.unwrap_or_default(),
            slug,
            extra: fm.extra,
        })
    }

    /// Parsed publish date
    pub fn parsed_date(&self) -> Option<NaiveDateTime> {
        parse_date(&self.date)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, MetadataError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(MetadataError::MissingField(field)),
    }
}

/// A published blog post
///
/// Built from one file on every listing; never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Where the post was read from. Not stable across machines.
    pub file_path: String,

    /// Raw markdown/MDX body, surrounding whitespace trimmed
    pub content: String,

    pub data: PostMetadata,
}

impl Post {
    pub fn new(file_path: &Path, content: &str, data: PostMetadata) -> Self {
        Self {
            file_path: file_path.to_string_lossy().into_owned(),
            content: content.trim().to_string(),
            data,
        }
    }

    pub fn slug(&self) -> &str {
        &self.data.slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_matter() -> FrontMatter {
        FrontMatter {
            title: Some("A".to_string()),
            date: Some("2021-01-01".to_string()),
            published: true,
            description: Some("d".to_string()),
            slug: Some("a".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_from_front_matter() {
        let data = PostMetadata::from_front_matter(front_matter()).unwrap();
        assert_eq!(data.title, "A");
        assert_eq!(data.slug, "a");
        assert_eq!(data.description, "d");
        assert!(data.published);
        assert_eq!(data.parsed_date().unwrap().format("%Y").to_string(), "2021");
    }

    #[test]
    fn test_required_fields() {
        let fm = FrontMatter {
            slug: None,
            ..front_matter()
        };
        assert_eq!(
            PostMetadata::from_front_matter(fm),
            Err(MetadataError::MissingField("slug"))
        );

        let fm = FrontMatter {
            title: Some("   ".to_string()),
            ..front_matter()
        };
        assert_eq!(
            PostMetadata::from_front_matter(fm),
            Err(MetadataError::MissingField("title"))
        );

        let fm = FrontMatter {
            description: None,
            ..front_matter()
        };
        assert_eq!(PostMetadata::from_front_matter(fm).unwrap().description, "");
    }

    #[test]
    fn test_invalid_date() {
        let fm = FrontMatter {
            date: Some("last tuesday".to_string()),
            ..front_matter()
        };
        assert_eq!(
            PostMetadata::from_front_matter(fm),
            Err(MetadataError::InvalidDate("last tuesday".to_string()))
        );
    }

    #[test]
    fn test_slug_must_be_one_segment() {
        for slug in ["../escape", "a/b", "a\\b", ".."] {
            let fm = FrontMatter {
                slug: Some(slug.to_string()),
                ..front_matter()
            };
            assert_eq!(
                PostMetadata::from_front_matter(fm),
                Err(MetadataError::InvalidSlug(slug.to_string()))
            );
        }

        let fm = FrontMatter {
            slug: Some("hello world".to_string()),
            ..front_matter()
        };
        assert!(PostMetadata::from_front_matter(fm).is_ok());
    }

    #[test]
    fn test_post_json_shape() {
        let data = PostMetadata::from_front_matter(front_matter()).unwrap();
        let post = Post::new(Path::new("posts/a.mdx"), "\nhello\n", data);
        assert_eq!(post.content, "hello");

        let json = serde_json::to_value(&post).unwrap();
        assert_eq!(json["filePath"], "posts/a.mdx");
        assert_eq!(json["content"], "hello");
        assert_eq!(json["data"]["slug"], "a");
        assert_eq!(json["data"]["published"], true);
        assert!(json["data"].get("tags").is_none());
    }

    #[test]
    fn test_extra_fields_pass_through() {
        let mut fm = front_matter();
        fm.extra
            .insert("cover".to_string(), serde_yaml::Value::from("cover.png"));
        let data = PostMetadata::from_front_matter(fm).unwrap();
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["cover"], "cover.png");
    }
}

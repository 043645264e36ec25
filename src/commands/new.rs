//! Create a new post

use anyhow::{Context, Result};
use indexmap::IndexMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::content::PostMetadata;
use crate::Blog;

/// Write an unpublished post skeleton and return its path
///
/// The slug defaults to the slugified title and also names the file.
/// Existing files are never overwritten.
pub fn run(blog: &Blog, title: &str, slug: Option<&str>) -> Result<PathBuf> {
    let slug = match slug {
        Some(s) => slug::slugify(s),
        None => slug::slugify(title),
    };
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a slug from {:?}; pass one with --slug", title);
    }

    let metadata = PostMetadata {
        title: title.to_string(),
        date: chrono::Local::now().format("%Y-%m-%d").to_string(),
        published: false,
        tags: None,
        description: String::new(),
        slug: slug.clone(),
        extra: IndexMap::new(),
    };
    let front_matter = serde_yaml::to_string(&metadata)?;

    let extension = blog
        .config
        .extensions
        .first()
        .map(|e| e.trim_start_matches('.'))
        .unwrap_or("md");

    std::fs::create_dir_all(&blog.posts_dir)
        .with_context(|| format!("Failed to create {:?}", blog.posts_dir))?;
    let file_path = blog.posts_dir.join(format!("{}.{}", slug, extension));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&file_path)
        .with_context(|| format!("Failed to create {:?}", file_path))?;
    write!(file, "---\n{}---\n\n", front_matter)?;

    println!("Created: {:?}", file_path);
    Ok(file_path)
}

//! couch-dev: a small markdown/MDX blog
//!
//! Posts live as markdown/MDX files with front-matter in a posts directory.
//! This crate lists the published ones, renders them to static pages with
//! Tera templates and serves those pages next to a JSON API.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;

use std::path::{Path, PathBuf};

pub use error::{Error, Result};

/// A blog rooted at one directory
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory the posts are read from
    pub posts_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Open the blog in `base_dir`, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        Ok(Self::with_config(base_dir, config))
    }

    /// Blog with an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let posts_dir = base_dir.join(&config.posts_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            posts_dir,
            public_dir,
        }
    }

    /// Repository over this blog's posts
    pub fn repository(&self) -> content::PostRepository {
        content::PostRepository::from_blog(self)
    }

    /// Generate the static pages, returning how many post pages were written
    pub async fn generate(&self) -> Result<usize> {
        generator::Generator::new(self)?.generate().await
    }

    /// Clean the public directory
    pub fn clean(&self) -> anyhow::Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post file and return its path
    pub fn new_post(&self, title: &str, slug: Option<&str>) -> anyhow::Result<PathBuf> {
        commands::new::run(self, title, slug)
    }
}

//! Post repository - lists and looks up published posts

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{discover, FrontMatter, FrontMatterError, MetadataError, Post, PostMetadata};
use crate::error::{Error, Result};
use crate::Blog;

/// Something wrong with a post file that the listing silently works around
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// The front-matter block could not be read, so the file is skipped
    #[error("{0}")]
    FrontMatter(FrontMatterError),

    /// The file is published but its metadata is incomplete
    #[error("{0}")]
    Metadata(MetadataError),

    /// Another published post already uses this slug and owns its route
    #[error("slug `{slug}` is already used by {first:?}")]
    DuplicateSlug { slug: String, first: PathBuf },
}

/// A problem found in one post file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub kind: DiagnosticKind,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}

/// What one file turned out to be
enum Entry {
    Published(Post),
    Draft,
    Invalid(DiagnosticKind),
}

/// Published posts of one posts directory
///
/// Holds no state besides its settings: every call re-reads the directory,
/// so edits show up on the next listing.
#[derive(Debug, Clone)]
pub struct PostRepository {
    posts_dir: PathBuf,
    extensions: Vec<String>,
    sort_by_date: bool,
}

impl PostRepository {
    /// Repository over `posts_dir` with the default `md`/`mdx` extensions
    pub fn new(posts_dir: impl Into<PathBuf>) -> Self {
        Self {
            posts_dir: posts_dir.into(),
            extensions: vec!["md".to_string(), "mdx".to_string()],
            sort_by_date: false,
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Sort listings newest-first by front-matter date
    pub fn with_sort_by_date(mut self, sort_by_date: bool) -> Self {
        self.sort_by_date = sort_by_date;
        self
    }

    /// Repository configured from the site's `_config.yml`
    pub fn from_blog(blog: &Blog) -> Self {
        Self::new(&blog.posts_dir)
            .with_extensions(blog.config.extensions.clone())
            .with_sort_by_date(blog.config.sort_by_date)
    }

    pub fn posts_dir(&self) -> &Path {
        &self.posts_dir
    }

    /// All published posts
    ///
    /// Files with unreadable front-matter, and published files with
    /// incomplete metadata, are left out with a warning. Posts sharing a slug
    /// are all returned. Without `sort_by_date` the order is reverse
    /// directory order, which is not chronological.
    pub async fn list_posts(&self) -> Result<Vec<Post>> {
        let (posts, diagnostics) = self.load().await?;
        for diagnostic in &diagnostics {
            tracing::warn!("Skipping {}", diagnostic);
        }
        Ok(posts)
    }

    /// The first published post with the given slug, in listing order
    ///
    /// Re-reads the whole directory per lookup, so cost grows linearly with
    /// the number of posts.
    pub async fn get_post(&self, slug: &str) -> Result<Option<Post>> {
        let posts = self.list_posts().await?;
        Ok(posts.into_iter().find(|post| post.slug() == slug))
    }

    /// Files the listing skips, plus posts whose slug is shadowed by an
    /// earlier post
    pub async fn check_posts(&self) -> Result<Vec<Diagnostic>> {
        let (posts, mut diagnostics) = self.load().await?;

        let mut owners: HashMap<&str, &Path> = HashMap::new();
        for post in &posts {
            let path = Path::new(&post.file_path);
            match owners.get(post.slug()) {
                Some(first) => diagnostics.push(Diagnostic {
                    path: path.to_path_buf(),
                    kind: DiagnosticKind::DuplicateSlug {
                        slug: post.slug().to_string(),
                        first: first.to_path_buf(),
                    },
                }),
                None => {
                    owners.insert(post.slug(), path);
                }
            }
        }

        Ok(diagnostics)
    }

    async fn load(&self) -> Result<(Vec<Post>, Vec<Diagnostic>)> {
        let files = discover(&self.posts_dir, &self.extensions)?;

        let mut posts = Vec::new();
        let mut diagnostics = Vec::new();
        for path in files {
            match read_entry(&path).await? {
                Entry::Published(post) => posts.push(post),
                Entry::Draft => tracing::debug!("Not published: {:?}", path),
                Entry::Invalid(kind) => diagnostics.push(Diagnostic { path, kind }),
            }
        }

        if self.sort_by_date {
            // Stable, so equal dates keep discovery order
            posts.sort_by(|a, b| b.data.parsed_date().cmp(&a.data.parsed_date()));
        }

        tracing::debug!(
            "Loaded {} published posts from {:?}",
            posts.len(),
            self.posts_dir
        );
        Ok((posts, diagnostics))
    }
}

/// Read and classify one post file. Only I/O failures are errors.
async fn read_entry(path: &Path) -> Result<Entry> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::io(path, e))?;
    // Stray non-UTF-8 bytes become U+FFFD instead of failing the listing
    let raw = String::from_utf8_lossy(&bytes);

    let (fm, body) = match FrontMatter::parse(&raw) {
        Ok(parsed) => parsed,
        Err(e) => return Ok(Entry::Invalid(DiagnosticKind::FrontMatter(e))),
    };

    if !fm.published {
        return Ok(Entry::Draft);
    }

    match PostMetadata::from_front_matter(fm) {
        Ok(data) => Ok(Entry::Published(Post::new(path, body, data))),
        Err(e) => Ok(Entry::Invalid(DiagnosticKind::Metadata(e))),
    }
}

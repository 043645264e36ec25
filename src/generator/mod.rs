//! Generator module - writes the listing and post pages using the built-in Tera templates

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use crate::content::{Components, MarkdownRenderer, Post, PostRepository};
use crate::error::{Error, Result};
use crate::templates::{PostView, SiteView, TemplateRenderer};
use crate::Blog;

/// Static page generator
///
/// Writes `index.html` and one `posts/{slug}/index.html` per published slug
/// into the public directory. Every page is rendered before anything is
/// written, so a post that fails to render leaves the previous output alone.
pub struct Generator {
    blog: Blog,
    repository: PostRepository,
    markdown: MarkdownRenderer,
    components: Components,
    templates: TemplateRenderer,
}

impl Generator {
    /// Create a new generator with the standard element renderers
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            repository: blog.repository(),
            markdown: MarkdownRenderer::new(),
            components: Components::standard(&blog.config.highlight),
            templates: TemplateRenderer::new()?,
        })
    }

    /// Replace the element renderer mapping, e.g. to register components
    pub fn with_components(mut self, components: Components) -> Self {
        self.components = components;
        self
    }

    /// Generate the site, returning the number of post pages written
    pub async fn generate(&self) -> Result<usize> {
        let start = Instant::now();
        let config = &self.blog.config;

        let posts = self.repository.list_posts().await?;
        tracing::info!("Loaded {} published posts", posts.len());

        let site = SiteView::new(config);
        let views: Vec<PostView> = posts.iter().map(|p| PostView::new(p, config)).collect();

        let posts_root = self.blog.public_dir.join("posts");
        let mut pages: Vec<(PathBuf, String)> = vec![(
            self.blog.public_dir.join("index.html"),
            self.templates.render_index(&site, &views)?,
        )];

        let mut routed = HashSet::new();
        for (post, view) in posts.iter().zip(&views) {
            if !routed.insert(post.slug()) {
                tracing::warn!(
                    "Duplicate slug {:?} in {}; the page belongs to the earlier post",
                    post.slug(),
                    post.file_path
                );
                continue;
            }

            let content = self.render_content(post)?;
            let html = self.templates.render_post(&site, view, &content)?;
            pages.push((posts_root.join(post.slug()).join("index.html"), html));
        }

        // Pages of posts that are gone or unpublished must not linger
        if posts_root.exists() {
            tokio::fs::remove_dir_all(&posts_root)
                .await
                .map_err(|e| Error::io(&posts_root, e))?;
        }

        for (path, html) in &pages {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Error::io(parent, e))?;
            }
            tokio::fs::write(path, html)
                .await
                .map_err(|e| Error::io(path, e))?;
            tracing::debug!("Generated: {:?}", path);
        }

        let written = pages.len() - 1;
        tracing::info!(
            "Generated {} post pages in {:.2}s",
            written,
            start.elapsed().as_secs_f64()
        );
        Ok(written)
    }

    /// Compile and hydrate one post body
    fn render_content(&self, post: &Post) -> Result<String> {
        self.markdown
            .render(&post.content, &self.components)
            .map_err(|source| Error::Render {
                path: post.file_path.clone(),
                source,
            })
    }
}

//! Built-in page templates using the Tera template engine
//!
//! The layout, the post summary and the post detail page are embedded in
//! the binary. HTML autoescaping stays on; only rendered post content and
//! already-encoded URLs are marked safe.

use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::Post;
use crate::error::Result;
use crate::helpers::{format_date, parse_date, post_url, url_for};

/// Template renderer with the embedded blog templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("couch/layout.html")),
            ("index.html", include_str!("couch/index.html")),
            ("post.html", include_str!("couch/post.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("couch/partials/header.html"),
            ),
            (
                "partials/summary.html",
                include_str!("couch/partials/summary.html"),
            ),
        ])?;

        tera.register_filter("date_format", date_format_filter);

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// The listing page: one summary per post, in the given order
    pub fn render_index(&self, site: &SiteView, posts: &[PostView]) -> Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("posts", posts);
        self.render("index.html", &context)
    }

    /// The detail page of one post around its rendered content
    pub fn render_post(&self, site: &SiteView, post: &PostView, content: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("post", post);
        context.insert("content", content);
        self.render("post.html", &context)
    }
}

/// Tera filter: format an ISO date string with a Moment.js-style format
///
/// Strings that are not dates pass through unchanged.
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "MMMM DD, YYYY".to_string(),
    };

    match parse_date(&s) {
        Some(date) => Ok(tera::Value::String(format_date(&date, &format))),
        None => Ok(tera::Value::String(s)),
    }
}

/// Site-wide values used by the layout
#[derive(Debug, Clone, Serialize)]
pub struct SiteView {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    /// Scheme and host, without a trailing slash
    pub url: String,
    pub home: String,
    pub favicon: String,
    pub date_format: String,
}

impl SiteView {
    pub fn new(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            description: config.description.clone(),
            url: config.url.trim_end_matches('/').to_string(),
            home: url_for(config, ""),
            favicon: url_for(config, "favicon.ico"),
            date_format: config.date_format.clone(),
        }
    }
}

/// What the summary and detail templates know about a post
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub title: String,
    pub date: String,
    pub description: String,
    pub slug: String,
    /// Link to the detail page, slug percent-encoded
    pub url: String,
}

impl PostView {
    pub fn new(post: &Post, config: &SiteConfig) -> Self {
        Self {
            title: post.data.title.clone(),
            date: post.data.date.clone(),
            description: post.data.description.clone(),
            slug: post.data.slug.clone(),
            url: post_url(config, &post.data.slug),
        }
    }
}

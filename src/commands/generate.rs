//! Generate the static pages

use anyhow::{Context, Result};
use std::time::Instant;

use crate::Blog;

/// Generate the listing and post pages into the public directory
pub async fn run(blog: &Blog) -> Result<usize> {
    let start = Instant::now();

    let count = blog
        .generate()
        .await
        .with_context(|| format!("Failed to generate site in {:?}", blog.public_dir))?;

    tracing::info!(
        "Wrote {} post pages to {:?} in {:.2}s",
        count,
        blog.public_dir,
        start.elapsed().as_secs_f64()
    );
    Ok(count)
}

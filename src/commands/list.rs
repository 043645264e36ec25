//! List published posts

use anyhow::{Context, Result};

use crate::Blog;

/// Print the published posts in listing order, and with `check` every
/// problem found in the posts directory
pub async fn run(blog: &Blog, check: bool) -> Result<()> {
    let repository = blog.repository();
    let posts = repository
        .list_posts()
        .await
        .with_context(|| format!("Failed to list posts in {:?}", blog.posts_dir))?;

    println!("Posts ({}):", posts.len());
    for post in &posts {
        println!(
            "  {} - {} ({}) [{}]",
            post.data.date, post.data.title, post.data.slug, post.file_path
        );
    }

    if check {
        let diagnostics = repository.check_posts().await?;
        if diagnostics.is_empty() {
            println!("No problems found.");
        } else {
            println!("Problems ({}):", diagnostics.len());
            for diagnostic in &diagnostics {
                println!("  {}", diagnostic);
            }
        }
    }

    Ok(())
}

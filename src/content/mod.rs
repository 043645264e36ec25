//! Content module - post discovery, parsing and rendering

mod discovery;
mod frontmatter;
mod highlight;
mod markdown;
mod post;
mod repository;

pub use discovery::discover;
pub use frontmatter::{FrontMatter, FrontMatterError};
pub use highlight::CodeHighlighter;
pub use markdown::{
    CompiledContent, Components, Element, ElementKind, ElementRenderer, MarkdownRenderer, Node,
    RenderError,
};
pub use post::{MetadataError, Post, PostMetadata};
pub use repository::{Diagnostic, DiagnosticKind, PostRepository};

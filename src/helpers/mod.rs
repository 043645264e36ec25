//! Helper functions shared by the content pipeline, templates and server
//!
//! Date parsing and Moment.js-style formatting, URL building for post
//! routes, and HTML escaping.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;

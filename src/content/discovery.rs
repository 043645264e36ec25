//! Post file discovery

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// List the post files directly inside `dir`
///
/// Keeps regular files whose extension is one of `extensions` and returns
/// them in reverse directory-read order. That order comes from the
/// filesystem and is not chronological; callers that need dates must sort.
pub fn discover(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let metadata = fs::metadata(dir).map_err(|e| Error::io(dir, e))?;
    if !metadata.is_dir() {
        return Err(Error::io(
            dir,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            Error::io(path, io::Error::from(e))
        })?;

        let path = entry.path();
        if entry.file_type().is_file() && has_extension(path, extensions) {
            files.push(path.to_path_buf());
        }
    }

    files.reverse();
    tracing::debug!("Discovered {} post files in {:?}", files.len(), dir);

    Ok(files)
}

/// Check if a file has one of the given extensions (case-sensitive)
fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| extensions.iter().any(|e| e.trim_start_matches('.') == ext))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_extensions() -> Vec<String> {
        vec!["md".to_string(), "mdx".to_string()]
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_discover_filters_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.md", "b.mdx", "c.txt", "d.MD", "e.md.bak", "mdx"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.md")).unwrap();
        fs::write(dir.path().join("nested.md").join("inner.md"), "x").unwrap();

        let mut found = names(&discover(dir.path(), &default_extensions()).unwrap());
        found.sort();
        assert_eq!(found, vec!["a.md", "b.mdx"]);
    }

    #[test]
    fn test_discover_reverses_listing_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["one.md", "two.md", "three.mdx", "four.md"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        let mut listing: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        listing.reverse();

        let found = names(&discover(dir.path(), &default_extensions()).unwrap());
        assert_eq!(found, listing);
    }

    #[test]
    fn test_discover_custom_extensions() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "x").unwrap();
        fs::write(dir.path().join("b.markdown"), "x").unwrap();

        let found = discover(dir.path(), &[".markdown".to_string()]).unwrap();
        assert_eq!(names(&found), vec!["b.markdown"]);
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path(), &default_extensions())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = discover(&missing, &default_extensions()).unwrap_err();
        match err {
            Error::Io { path, source } => {
                assert_eq!(path, missing);
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_discover_file_instead_of_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("posts");
        fs::write(&file, "x").unwrap();
        assert!(discover(&file, &default_extensions()).unwrap_err().is_io());
    }
}

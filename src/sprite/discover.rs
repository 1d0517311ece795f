//! Icon file discovery.
//!
//! Resolves a glob pattern against a base directory and returns every
//! matching file sorted by the bytes of its full path, so `a-b/x.svg`
//! precedes `a/x.svg`. The assembled sprite and its hash depend on this order.
//!
//! ```text
//! base    = /app/src
//! pattern = /../icons/**/*.svg
//!
//! walk root = /app/src/../icons      (literal prefix joined onto base)
//! glob      = **/*.svg               (matched relative to the walk root)
//! ```

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use jwalk::WalkDir;

use super::error::{Result, SpriteError};

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Discover icon files matching `pattern` under `base` (blocking).
///
/// Returns an empty list when nothing matches. A missing or unreadable
/// walk root is an error.
pub fn discover(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let (prefix, glob) = split_pattern(pattern);
    let root = base.join(prefix);
    let root = root
        .canonicalize()
        .map_err(|e| SpriteError::fs(&root, e))?;

    // Pattern without wildcards names a single file
    let Some(glob) = glob else {
        return if root.is_file() {
            Ok(vec![root])
        } else {
            Err(SpriteError::fs(
                &root,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
            ))
        };
    };

    if !root.is_dir() {
        return Err(SpriteError::fs(
            &root,
            std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        ));
    }

    let matcher = compile_glob(&glob)?;
    let mut files = Vec::new();

    for entry in WalkDir::new(&root).skip_hidden(false) {
        let entry =
            entry.map_err(|e| SpriteError::fs(&root, std::io::Error::other(e.to_string())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_str().unwrap_or_default();
        if IGNORED_FILES.contains(&name) {
            continue;
        }
        let path = entry.path();
        let rel = path.strip_prefix(&root).unwrap_or(&path);
        if matcher.is_match(rel) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    Ok(files)
}

/// Discover icon files without blocking the async runtime.
pub async fn discover_async(base: PathBuf, pattern: String) -> Result<Vec<PathBuf>> {
    tokio::task::spawn_blocking(move || discover(&base, &pattern))
        .await
        .map_err(|e| SpriteError::Worker(e.to_string()))?
}

/// Split a pattern into its literal directory prefix and glob remainder.
///
/// Returns `None` for the glob when the pattern has no metacharacters.
fn split_pattern(pattern: &str) -> (PathBuf, Option<String>) {
    let trimmed = pattern.trim_start_matches(['/', '\\']);
    let mut prefix = PathBuf::new();
    let mut rest: Vec<&str> = Vec::new();

    for part in trimmed.split(['/', '\\']).filter(|p| !p.is_empty()) {
        if rest.is_empty() && !has_glob_meta(part) {
            prefix.push(part);
        } else {
            rest.push(part);
        }
    }

    if rest.is_empty() {
        (prefix, None)
    } else {
        (prefix, Some(rest.join("/")))
    }
}

fn has_glob_meta(part: &str) -> bool {
    part.contains(['*', '?', '[', '{'])
}

fn compile_glob(glob: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(glob)
        .literal_separator(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|source| SpriteError::Pattern {
            pattern: glob.to_string(),
            source,
        })
}

/// Render a discovered path relative to `base` for log output.
pub fn display_relative(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

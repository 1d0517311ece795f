//! Sprite pipeline error types.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T, E = SpriteError> = std::result::Result<T, E>;

/// Errors raised while discovering, normalizing, assembling or naming a sprite.
#[derive(Debug, Error)]
pub enum SpriteError {
    /// Discovery base or an icon file is missing or unreadable.
    #[error("cannot read `{}`", path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern `{pattern}`")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    /// Icon content is not well-formed svg markup.
    #[error("malformed svg `{}`: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("optimizer failed on `{}`: {message}", path.display())]
    Optimize { path: PathBuf, message: String },

    #[error("layout template `{}`: {message}", path.display())]
    Template { path: PathBuf, message: String },

    /// A background worker died before producing a result.
    #[error("sprite worker failed: {0}")]
    Worker(String),
}

impl SpriteError {
    pub(crate) fn fs(path: &Path, source: std::io::Error) -> Self {
        Self::FileSystem {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn parse(path: &Path, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    /// Whether this error comes from malformed icon content.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_fs_error_names_path() {
        let err = SpriteError::fs(
            Path::new("/icons/missing"),
            Error::new(ErrorKind::NotFound, "not found"),
        );
        assert!(err.to_string().contains("/icons/missing"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_parse_error_display() {
        let err = SpriteError::parse(Path::new("home.svg"), "unexpected end of document");
        assert!(err.is_parse());
        let display = err.to_string();
        assert!(display.contains("home.svg"));
        assert!(display.contains("unexpected end of document"));
    }
}

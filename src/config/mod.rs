//! Sprite configuration management for `svgstore.toml`.
//!
//! Every field is optional; values from the file are merged over the
//! defaults. The `[svg]` table merges key by key, and an empty value
//! removes a default root attribute.
//!
//! # Example
//!
//! ```toml
//! prefix = "icon-"               # symbol id prefix
//! name = "sprite.[hash].svg"     # default naming pattern
//! template = "layout.svg"        # optional layout with {{ attributes }} / {{ symbols }}
//! on_parse_error = "abort"       # abort | skip
//! concurrency = 8                # parallel sprites during reconciliation
//!
//! [svg]
//! style = ""                     # drop the default hidden-positioning style
//! class = "sprite"
//!
//! [optimize]
//! enabled = true
//! dpi = 96.0
//! ```

mod error;
mod util;

pub use error::ConfigError;
pub use util::find_config_file;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::log;
use crate::sprite::{OptimizeOptions, RootAttributes};

/// Default config file name.
pub const CONFIG_FILE: &str = "svgstore.toml";

/// Root attributes every sprite starts from.
pub fn default_root_attributes() -> RootAttributes {
    RootAttributes::from([
        ("xmlns".to_string(), "http://www.w3.org/2000/svg".to_string()),
        (
            "xmlns:xlink".to_string(),
            "http://www.w3.org/1999/xlink".to_string(),
        ),
        (
            "style".to_string(),
            "position:absolute; width: 0; height: 0".to_string(),
        ),
    ])
}

/// What to do with an icon whose markup cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseErrorPolicy {
    /// Fail the whole sprite.
    #[default]
    Abort,
    /// Leave the icon out and warn.
    Skip,
}

/// Root configuration structure representing `svgstore.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    /// Project root - parent of the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Prefix prepended to every symbol id.
    pub prefix: String,

    /// Naming pattern for sprites requested without one.
    pub name: String,

    /// Layout template, relative to the project root.
    pub template: Option<PathBuf>,

    pub on_parse_error: ParseErrorPolicy,

    /// Maximum number of sprites reconciled at once.
    pub concurrency: usize,

    /// Root element attributes.
    #[serde(deserialize_with = "merge_root_attributes")]
    pub svg: RootAttributes,

    /// Optimizer options.
    pub optimize: OptimizeOptions,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            prefix: "icon-".to_string(),
            name: "sprite.[hash].svg".to_string(),
            template: None,
            on_parse_error: ParseErrorPolicy::default(),
            concurrency: std::thread::available_parallelism().map_or(4, |n| n.get()),
            svg: default_root_attributes(),
            optimize: OptimizeOptions::default(),
        }
    }
}

/// Merge user attributes over the defaults; empty values delete.
fn merge_root_attributes<'de, D>(deserializer: D) -> Result<RootAttributes, D::Error>
where
    D: Deserializer<'de>,
{
    let user = BTreeMap::<String, String>::deserialize(deserializer)?;
    let mut merged = default_root_attributes();
    for (key, value) in user {
        if value.is_empty() {
            merged.remove(&key);
        } else {
            merged.insert(key, value);
        }
    }
    Ok(merged)
}

impl SpriteConfig {
    /// Load the config file, or defaults rooted at the cwd when there is none.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(path) if path.exists() => Some(path.to_path_buf()),
            Some(path) => {
                return Err(ConfigError::Io(
                    path.to_path_buf(),
                    std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
                ));
            }
            None => find_config_file(Path::new(CONFIG_FILE)),
        };

        let mut config = match &path {
            Some(path) => Self::from_path(path)?,
            None => Self::default(),
        };

        let root = match &path {
            Some(path) => path.parent().map(Path::to_path_buf).unwrap_or_default(),
            None => std::env::current_dir().map_err(|e| ConfigError::Io(PathBuf::from("."), e))?,
        };
        config.root = root;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}, ignoring:", path.display());
            for field in &ignored {
                eprintln!("- {field}");
            }
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Check field values that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(first) = self.prefix.chars().next()
            && !(first.is_alphabetic() || first == '_' || first == ':')
        {
            return Err(ConfigError::Validation(format!(
                "prefix `{}` must start with a letter, `_` or `:`",
                self.prefix
            )));
        }
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation("name must not be empty".into()));
        }
        if self.name.contains(['/', '\\']) {
            return Err(ConfigError::Validation(format!(
                "name `{}` must be a file name, not a path",
                self.name
            )));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::Validation(
                "concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Absolute path of the layout template, if configured.
    pub fn template_path(&self) -> Option<PathBuf> {
        self.template.as_ref().map(|t| self.root.join(t))
    }
}

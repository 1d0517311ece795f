//! The sprite pipeline: discover → normalize → assemble → hash.
//!
//! One implementation, two entry points: [`SpriteEngine::build`] blocks,
//! [`SpriteEngine::build_async`] runs the same code on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::FxHashMap;

use super::assemble::{BuiltinLayout, FileLayout, Renderer};
use super::discover::{discover, display_relative};
use super::error::{Result, SpriteError};
use super::hash::hash_name;
use super::normalize::{Fragment, normalize};
use super::optimize::{Optimizer, UsvgOptimizer};
use crate::config::{ParseErrorPolicy, SpriteConfig};
use crate::{debug, log};

/// Default glob for requests that do not name one.
pub const DEFAULT_PATTERN: &str = "/**/*.svg";

/// Where to find the icons of one sprite and how to name it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteRequest {
    /// Directory the pattern is resolved against.
    pub base: PathBuf,
    /// Shell-style glob.
    pub pattern: String,
    /// Naming pattern with `[hash]` placeholders.
    pub name: String,
}

impl SpriteRequest {
    pub fn new(
        base: impl Into<PathBuf>,
        pattern: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            base: base.into(),
            pattern: pattern.into(),
            name: name.into(),
        }
    }
}

/// Several icons that normalized to the same symbol id.
///
/// Only the last path (in discovery order) ends up in the sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierCollision {
    pub id: String,
    pub paths: Vec<PathBuf>,
}

/// A fully assembled sprite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    pub name: String,
    pub content: String,
    /// Symbol ids in document order.
    pub ids: Vec<String>,
    pub collisions: Vec<IdentifierCollision>,
    /// Icons left out under [`ParseErrorPolicy::Skip`].
    pub skipped: Vec<PathBuf>,
}

/// Shared, immutable pipeline configuration plus its collaborators.
#[derive(Clone)]
pub struct SpriteEngine {
    config: Arc<SpriteConfig>,
    renderer: Arc<dyn Renderer>,
    optimizer: Option<Arc<dyn Optimizer>>,
}

impl std::fmt::Debug for SpriteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriteEngine")
            .field("config", &self.config)
            .field("optimizer", &self.optimizer.is_some())
            .finish_non_exhaustive()
    }
}

impl SpriteEngine {
    /// Build an engine from config: loads the layout template (once) and
    /// enables the usvg optimizer when `[optimize].enabled` is set.
    pub fn new(config: SpriteConfig) -> Result<Self> {
        let renderer: Arc<dyn Renderer> = match config.template_path() {
            Some(path) => Arc::new(FileLayout::load(&path)?),
            None => Arc::new(BuiltinLayout),
        };
        let optimizer: Option<Arc<dyn Optimizer>> = if config.optimize.enabled {
            Some(Arc::new(UsvgOptimizer))
        } else {
            None
        };

        Ok(Self {
            config: Arc::new(config),
            renderer,
            optimizer,
        })
    }

    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    pub fn with_optimizer(mut self, optimizer: impl Optimizer + 'static) -> Self {
        self.optimizer = Some(Arc::new(optimizer));
        self
    }

    pub fn config(&self) -> &SpriteConfig {
        &self.config
    }

    /// Request rooted at `base` using the configured naming pattern.
    pub fn request(&self, base: impl Into<PathBuf>, pattern: Option<&str>) -> SpriteRequest {
        SpriteRequest::new(base, pattern.unwrap_or(DEFAULT_PATTERN), self.config.name.as_str())
    }

    /// Run the whole pipeline for one request (blocking).
    pub fn build(&self, request: &SpriteRequest) -> Result<Sprite> {
        let files = discover(&request.base, &request.pattern)?;
        debug!("sprite"; "{} icons for {}{}", files.len(), request.base.display(), request.pattern);

        let (fragments, skipped) = self.normalize_all(&files)?;
        let (fragments, collisions) = resolve_collisions(fragments, &files);
        for collision in &collisions {
            warn_collision(collision, &request.base);
        }

        let content = self.renderer.render(&fragments, &self.config.svg)?;
        let name = hash_name(&request.name, content.as_bytes());

        Ok(Sprite {
            name,
            content,
            ids: fragments.into_iter().map(|f| f.id).collect(),
            collisions,
            skipped,
        })
    }

    /// Run the whole pipeline for one request on the blocking pool.
    pub async fn build_async(&self, request: SpriteRequest) -> Result<Sprite> {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || engine.build(&request))
            .await
            .map_err(|e| SpriteError::Worker(e.to_string()))?
    }

    /// Normalize every file, keeping discovery order.
    ///
    /// Returns the fragments paired with their source index, plus the
    /// paths skipped under [`ParseErrorPolicy::Skip`].
    fn normalize_all(&self, files: &[PathBuf]) -> Result<(Vec<(usize, Fragment)>, Vec<PathBuf>)> {
        let results: Vec<Result<Fragment>> = files
            .par_iter()
            .map(|path| self.normalize_file(path))
            .collect();

        let mut fragments = Vec::with_capacity(results.len());
        let mut skipped = Vec::new();
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(fragment) => fragments.push((index, fragment)),
                Err(e) if e.is_parse() && self.config.on_parse_error == ParseErrorPolicy::Skip => {
                    log!("warning"; "skipping icon: {}", e);
                    skipped.push(files[index].clone());
                }
                Err(e) => return Err(e),
            }
        }
        Ok((fragments, skipped))
    }

    fn normalize_file(&self, path: &Path) -> Result<Fragment> {
        let content = std::fs::read_to_string(path).map_err(|e| SpriteError::fs(path, e))?;
        let optimizer = self
            .optimizer
            .as_deref()
            .map(|o| (o, &self.config.optimize));
        normalize(&content, &self.config.prefix, path, optimizer)
    }
}

/// Keep the last fragment for every id and report the duplicates.
fn resolve_collisions(
    fragments: Vec<(usize, Fragment)>,
    files: &[PathBuf],
) -> (Vec<Fragment>, Vec<IdentifierCollision>) {
    let mut last: FxHashMap<&str, usize> = FxHashMap::default();
    let mut sources: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    let mut order: Vec<&str> = Vec::new();

    for (pos, (index, fragment)) in fragments.iter().enumerate() {
        let id = fragment.id.as_str();
        last.insert(id, pos);
        let entry = sources.entry(id).or_default();
        if entry.is_empty() {
            order.push(id);
        }
        entry.push(*index);
    }

    let collisions: Vec<IdentifierCollision> = order
        .into_iter()
        .filter_map(|id| {
            let indices = &sources[id];
            (indices.len() > 1).then(|| IdentifierCollision {
                id: id.to_string(),
                paths: indices.iter().map(|&i| files[i].clone()).collect(),
            })
        })
        .collect();

    let keep: Vec<usize> = {
        let mut keep: Vec<usize> = last.into_values().collect();
        keep.sort_unstable();
        keep
    };

    let mut kept = Vec::with_capacity(keep.len());
    let mut keep = keep.into_iter().peekable();
    for (pos, (_, fragment)) in fragments.into_iter().enumerate() {
        if keep.peek() == Some(&pos) {
            keep.next();
            kept.push(fragment);
        }
    }
    (kept, collisions)
}

fn warn_collision(collision: &IdentifierCollision, base: &Path) {
    let paths: Vec<String> = collision
        .paths
        .iter()
        .map(|p| display_relative(p, base))
        .collect();
    log!(
        "warning";
        "duplicate symbol id `{}` from {} (keeping the last)",
        collision.id,
        paths.join(", ")
    );
}

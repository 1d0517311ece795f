//! One build cycle over a set of source files.
//!
//! Phases:
//! - **Register** - find `__svg__` markers, build each sprite once, rewrite sources
//! - **Reconcile** - rebuild every sprite against the current icons (concurrent)
//! - **Emit** - write sprites into the output directory
//! - **Clear** - drop the registry so nothing leaks into the next cycle

use anyhow::{Context, Result, bail};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use super::BuildArgs;
use crate::host::{SpriteAsset, find_markers, is_contained_name, rewrite};
use crate::logger::ProgressLine;
use crate::registry::TaskRegistry;
use crate::sprite::{SpriteEngine, SpriteRequest};
use crate::utils::plural_count;
use crate::{debug, log};

/// Outcome of a build cycle.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Rewritten source files, relative to the output directory.
    pub sources: Vec<PathBuf>,
    /// Emitted sprite names.
    pub sprites: Vec<String>,
}

/// Run one complete build cycle.
pub fn build_sources(engine: SpriteEngine, args: &BuildArgs, root: &Path) -> Result<BuildSummary> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let mut registry = TaskRegistry::new(engine);
    let result = runtime.block_on(run_cycle(&mut registry, args, root));
    registry.clear();
    result
}

/// Register → reconcile → emit against an existing registry.
pub async fn run_cycle(
    registry: &mut TaskRegistry,
    args: &BuildArgs,
    root: &Path,
) -> Result<BuildSummary> {
    fs::create_dir_all(&args.out)
        .with_context(|| format!("Failed to create {}", args.out.display()))?;

    let mut summary = BuildSummary::default();
    for source in &args.sources {
        if let Some(rel) = register_source(registry, source, root, &args.out)? {
            summary.sources.push(rel);
        }
    }
    log!(
        "build";
        "{} in {}",
        plural_count(registry.len(), "sprite"),
        plural_count(summary.sources.len(), "source")
    );

    if registry.is_empty() {
        return Ok(summary);
    }

    let progress = ProgressLine::new("emit", registry.len());
    let mut write_errors = Vec::new();
    let report = registry
        .reconcile_all(|asset| {
            match write_asset(&args.out, asset) {
                Ok(()) => summary.sprites.push(asset.name().to_string()),
                Err(e) => write_errors.push(e),
            }
            progress.inc();
        })
        .await;
    progress.finish();

    if let Some(e) = write_errors.into_iter().next() {
        return Err(e);
    }
    if !report.is_success() {
        bail!(
            "{} failed to build",
            plural_count(report.failures.len(), "sprite")
        );
    }
    summary.sprites.sort();
    summary.sprites.dedup();
    Ok(summary)
}

/// Register every marker of one source and write its rewritten copy.
///
/// Returns the output path relative to `out`, or `None` without markers.
fn register_source(
    registry: &mut TaskRegistry,
    source: &Path,
    root: &Path,
    out: &Path,
) -> Result<Option<PathBuf>> {
    let source = source
        .canonicalize()
        .with_context(|| format!("Failed to read {}", source.display()))?;
    let text = fs::read_to_string(&source)
        .with_context(|| format!("Failed to read {}", source.display()))?;

    let markers = find_markers(&text);
    if markers.is_empty() {
        debug!("build"; "no sprite markers in {}", source.display());
        return Ok(None);
    }

    let base = source.parent().unwrap_or(root).to_path_buf();
    let mut replacements: Vec<(Range<usize>, String)> = Vec::with_capacity(markers.len());
    for marker in markers {
        if !is_contained_name(&marker.name) {
            bail!(
                "Sprite name `{}` in {} must be a relative path inside the output directory",
                marker.name,
                source.display()
            );
        }
        let request = SpriteRequest::new(&base, marker.path, marker.name);
        let name = registry
            .register(&source, request)
            .with_context(|| format!("Failed to build sprite for {}", source.display()))?;
        replacements.push((marker.range, name));
    }

    let rel = relative_to(&source, root);
    let dest = out.join(&rel);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&dest, rewrite(&text, &replacements))
        .with_context(|| format!("Failed to write {}", dest.display()))?;
    Ok(Some(rel))
}

fn write_asset(out: &Path, asset: &SpriteAsset) -> Result<()> {
    let path = out.join(asset.name());
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, asset.source())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!("emit"; "{} ({} bytes)", asset.name(), asset.size());
    Ok(())
}

/// Path of `source` below `root`, or just its file name outside of it.
fn relative_to(source: &Path, root: &Path) -> PathBuf {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    match source.strip_prefix(&root) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| source.to_path_buf()),
    }
}

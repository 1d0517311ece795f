//! Task registry bridging the two phases of a build.
//!
//! ```text
//!   register ──► Registered ──► reconcile_all ──► Reconciled ──► emit ──► Emitted
//!                                      │                                    │
//!                                      └──────────► Failed                  ▼
//!                                                                        clear()
//! ```
//!
//! Registration runs the pipeline inline because the caller needs the
//! sprite name to rewrite its source. Reconciliation re-runs every task
//! against the current file system, concurrently across tasks (bounded by
//! `concurrency`), and hands each fresh asset to the emit callback. One
//! task failing never prevents the others from being emitted.

mod task;

pub use task::{Task, TaskState};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};

use crate::host::SpriteAsset;
use crate::sprite::{Result, Sprite, SpriteEngine, SpriteError, SpriteRequest};
use crate::{debug, log};

/// A task that could not be reconciled.
#[derive(Debug)]
pub struct TaskFailure {
    pub source: PathBuf,
    pub request: SpriteRequest,
    pub error: SpriteError,
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// Number of assets handed to the emit callback.
    pub emitted: usize,
    /// Tasks whose sprite name differs from the registered one.
    pub renamed: usize,
    pub failures: Vec<TaskFailure>,
}

impl ReconcileReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Owns every task registered during one build.
#[derive(Debug)]
pub struct TaskRegistry {
    engine: Arc<SpriteEngine>,
    tasks: FxHashMap<PathBuf, Vec<Task>>,
    concurrency: usize,
}

impl TaskRegistry {
    pub fn new(engine: SpriteEngine) -> Self {
        let concurrency = engine.config().concurrency.max(1);
        Self {
            engine: Arc::new(engine),
            tasks: FxHashMap::default(),
            concurrency,
        }
    }

    /// Override the reconciliation concurrency bound.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Build the sprite for `request` now and record it under `source`.
    ///
    /// Returns the sprite name. Errors propagate: the caller cannot
    /// rewrite its source without a name.
    pub fn register(
        &mut self,
        source: impl Into<PathBuf>,
        request: SpriteRequest,
    ) -> Result<String> {
        let source = source.into();
        let sprite = self.engine.build(&request)?;
        let name = sprite.name.clone();

        debug!("register"; "{} -> {} ({} icons)", source.display(), name, sprite.ids.len());
        self.tasks
            .entry(source)
            .or_default()
            .push(Task::registered(request, sprite.name, sprite.content));
        Ok(name)
    }

    /// Re-run every task and emit the fresh assets.
    ///
    /// Tasks run concurrently; within a task the pipeline steps stay
    /// sequential. `emit` is called from this future, one asset at a time.
    pub async fn reconcile_all<F>(&mut self, mut emit: F) -> ReconcileReport
    where
        F: FnMut(&SpriteAsset),
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut set = JoinSet::new();
        let mut slots: FxHashMap<Id, (PathBuf, usize)> = FxHashMap::default();

        for (source, tasks) in &self.tasks {
            for (index, task) in tasks.iter().enumerate() {
                let engine = Arc::clone(&self.engine);
                let semaphore = Arc::clone(&semaphore);
                let request = task.request.clone();
                let handle = set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    engine.build_async(request).await
                });
                slots.insert(handle.id(), (source.clone(), index));
            }
        }

        let mut report = ReconcileReport::default();
        while let Some(joined) = set.join_next_with_id().await {
            let (id, result) = settle(joined);
            let Some((source, index)) = slots.remove(&id) else {
                continue;
            };
            let Some(task) = self.tasks.get_mut(&source).and_then(|t| t.get_mut(index)) else {
                continue;
            };

            match result {
                Ok(sprite) => {
                    if task.reconcile(sprite.name, sprite.content) {
                        report.renamed += 1;
                        log!("sprite"; "{} changed since registration", display_source(&source));
                    }
                    if let Some(asset) = task.asset() {
                        emit(&asset);
                        task.mark_emitted();
                        report.emitted += 1;
                    }
                }
                Err(error) => {
                    log!("error"; "{}: {}", display_source(&source), error);
                    task.mark_failed();
                    report.failures.push(TaskFailure {
                        source: source.clone(),
                        request: task.request.clone(),
                        error,
                    });
                }
            }
        }
        report
    }

    /// Drop every task. Call once per finished build.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Number of recorded tasks across all sources.
    pub fn len(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tasks recorded for one source.
    pub fn tasks_for(&self, source: &Path) -> &[Task] {
        self.tasks
            .get(source)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn sources(&self) -> impl Iterator<Item = &Path> {
        self.tasks.keys().map(PathBuf::as_path)
    }
}

/// Turn a panicked or cancelled task into a failure of its slot.
fn settle(
    joined: std::result::Result<(Id, Result<Sprite>), JoinError>,
) -> (Id, Result<Sprite>) {
    match joined {
        Ok(done) => done,
        Err(e) => (e.id(), Err(SpriteError::Worker(e.to_string()))),
    }
}

fn display_source(source: &Path) -> String {
    source
        .file_name()
        .map_or_else(|| source.display().to_string(), |n| n.to_string_lossy().into_owned())
}

//! A recorded unit of sprite work.

use crate::host::SpriteAsset;
use crate::sprite::SpriteRequest;

/// Lifecycle of a task within one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    /// Built once during registration.
    Registered,
    /// Rebuilt against the current file system.
    Reconciled,
    /// Handed to the output sink.
    Emitted,
    /// Rebuild failed; nothing was emitted.
    Failed,
}

/// One sprite request and its latest result.
#[derive(Debug, Clone)]
pub struct Task {
    pub request: SpriteRequest,
    pub name: String,
    pub content: String,
    pub state: TaskState,
}

impl Task {
    pub(super) fn registered(request: SpriteRequest, name: String, content: String) -> Self {
        Self {
            request,
            name,
            content,
            state: TaskState::Registered,
        }
    }

    /// Store a fresh result. Returns whether the name changed.
    pub(super) fn reconcile(&mut self, name: String, content: String) -> bool {
        let renamed = self.name != name;
        self.name = name;
        self.content = content;
        self.state = TaskState::Reconciled;
        renamed
    }

    /// The asset to emit, only once reconciled.
    pub(super) fn asset(&self) -> Option<SpriteAsset> {
        (self.state == TaskState::Reconciled)
            .then(|| SpriteAsset::new(self.name.clone(), self.content.clone()))
    }

    pub(super) fn mark_emitted(&mut self) {
        self.state = TaskState::Emitted;
    }

    pub(super) fn mark_failed(&mut self) {
        self.state = TaskState::Failed;
    }
}

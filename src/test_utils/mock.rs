//! In-memory provider that records every write it receives.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::{GroupId, GroupTree};
use crate::error::{GroveError, Result};
use crate::storage::StorageProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Save(GroupTree),
    Delete(GroupId),
    Reset,
}

#[derive(Debug, Default)]
struct MockState {
    roots: Vec<GroupTree>,
    calls: Vec<ProviderCall>,
    fail_loads: bool,
    fail_saves: bool,
}

/// Provider returning preset roots and recording saves, deletes and resets.
///
/// The provider is moved into a manager; keep a [`CallLog`] from
/// [`RecordingProvider::calls`] to inspect it afterwards.
#[derive(Debug)]
pub struct RecordingProvider {
    id: String,
    state: Arc<Mutex<MockState>>,
}

impl RecordingProvider {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Arc::default(),
        }
    }

    #[must_use]
    pub fn with_roots(self, roots: Vec<GroupTree>) -> Self {
        lock(&self.state).roots = roots;
        self
    }

    #[must_use]
    pub fn failing_loads(self) -> Self {
        lock(&self.state).fail_loads = true;
        self
    }

    #[must_use]
    pub fn failing_saves(self) -> Self {
        lock(&self.state).fail_saves = true;
        self
    }

    #[must_use]
    pub fn calls(&self) -> CallLog {
        CallLog {
            state: Arc::clone(&self.state),
        }
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl StorageProvider for RecordingProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn load_root_nodes(&mut self) -> Result<Vec<GroupTree>> {
        let state = lock(&self.state);
        if state.fail_loads {
            return Err(GroveError::Io(std::io::Error::other("load refused")));
        }
        Ok(state.roots.clone())
    }

    fn save_group(&mut self, group: &GroupTree) -> Result<()> {
        let mut state = lock(&self.state);
        if state.fail_saves {
            return Err(GroveError::Io(std::io::Error::other("save refused")));
        }
        state.calls.push(ProviderCall::Save(group.clone()));
        Ok(())
    }

    fn delete_group_id(&mut self, id: &GroupId) -> Result<()> {
        lock(&self.state).calls.push(ProviderCall::Delete(id.clone()));
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        lock(&self.state).calls.push(ProviderCall::Reset);
        Ok(())
    }
}

/// Shared view of a [`RecordingProvider`]'s calls and preset roots.
#[derive(Debug, Clone)]
pub struct CallLog {
    state: Arc<Mutex<MockState>>,
}

impl CallLog {
    #[must_use]
    pub fn all(&self) -> Vec<ProviderCall> {
        lock(&self.state).calls.clone()
    }

    #[must_use]
    pub fn deleted(&self) -> Vec<GroupId> {
        self.all()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn saved(&self) -> Vec<GroupTree> {
        self.all()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::Save(tree) => Some(tree),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn saved_names(&self) -> Vec<String> {
        self.saved().into_iter().map(|tree| tree.name).collect()
    }

    #[must_use]
    pub fn last_saved(&self) -> Option<GroupTree> {
        self.saved().pop()
    }

    /// Replace what the next load returns.
    pub fn set_roots(&self, roots: Vec<GroupTree>) {
        lock(&self.state).roots = roots;
    }

    pub fn clear(&self) {
        lock(&self.state).calls.clear();
    }
}

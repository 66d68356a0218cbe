use std::path::{Component, Path, PathBuf};

use crate::document::{DocumentError, DocumentHandle};

/// 以路徑為鍵管理已開啟的文件，確保每個路徑只有一個分頁。 /
/// Open documents keyed by absolute path; at most one handle per path.
///
/// Insertion order is kept for tab display only.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    handles: Vec<DocumentHandle>,
    active: Option<usize>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 開啟或重新選取文件。 / Opens `path`, or re-selects it when it is already open.
    ///
    /// Directories are ignored and yield `Ok(None)`. Read and decode failures
    /// leave the registry untouched.
    pub fn open(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Option<&DocumentHandle>, DocumentError> {
        let path = normalise(path.as_ref());
        if path.is_dir() {
            tracing::debug!(path = %path.display(), "ignoring open request for directory");
            return Ok(None);
        }
        if let Some(index) = self.position(&path) {
            tracing::debug!(path = %path.display(), "re-selecting open document");
            self.active = Some(index);
            return Ok(self.handles.get(index));
        }

        let handle = DocumentHandle::open(&path)?;
        tracing::debug!(path = %path.display(), "document opened");
        self.handles.push(handle);
        let index = self.handles.len() - 1;
        self.active = Some(index);
        Ok(self.handles.get(index))
    }

    /// 關閉文件；不存在時不做任何事。 / Closes `path`; a no-op when it is not open.
    pub fn close(&mut self, path: impl AsRef<Path>) -> Option<DocumentHandle> {
        let path = normalise(path.as_ref());
        let index = self.position(&path)?;
        let removed = self.handles.remove(index);
        self.active = match self.active {
            _ if self.handles.is_empty() => None,
            Some(active) if active > index => Some(active - 1),
            Some(active) if active == index => Some(index.min(self.handles.len() - 1)),
            other => other,
        };
        tracing::debug!(path = %path.display(), "document closed");
        Some(removed)
    }

    /// 關閉所有文件（切換專案時使用）。 / Drops every handle, as on a project switch.
    pub fn close_all(&mut self) {
        if !self.handles.is_empty() {
            tracing::debug!(count = self.handles.len(), "closing all documents");
        }
        self.handles.clear();
        self.active = None;
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&DocumentHandle> {
        let path = normalise(path.as_ref());
        self.position(&path).and_then(|index| self.handles.get(index))
    }

    pub fn get_mut(&mut self, path: impl AsRef<Path>) -> Option<&mut DocumentHandle> {
        let path = normalise(path.as_ref());
        self.position(&path)
            .and_then(move |index| self.handles.get_mut(index))
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.get(path).is_some()
    }

    /// 目前選取的分頁。 / The currently selected tab, if any.
    pub fn active(&self) -> Option<&DocumentHandle> {
        self.active.and_then(|index| self.handles.get(index))
    }

    /// Handles in tab order.
    pub fn iter(&self) -> impl Iterator<Item = &DocumentHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.handles.iter().position(|handle| handle.path() == path)
    }
}

/// Absolute, with `.` and `..` folded lexically so spellings of one file share a key.
fn normalise(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut folded = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(folded.components().next_back(), Some(Component::Normal(_))) {
                    folded.pop();
                } else if !folded.has_root() {
                    folded.push(component);
                }
            }
            other => folded.push(other),
        }
    }
    folded
}

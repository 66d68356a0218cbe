use std::path::{Path, PathBuf};

/// Console line reported when a project has no entry page.
pub const MISSING_INDEX_LINE: &str = "Error: 'src/index.html' not found.";

/// Renders a page given its absolute path. Implemented by the host's web view.
/// （宿主的網頁預覽元件；給定絕對路徑即可呈現。）
pub trait PreviewHost {
    fn render(&mut self, page: &Path);
}

/// Remembers every page it was asked to render, newest last.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreviewHistory {
    pub pages: Vec<PathBuf>,
}

impl PreviewHistory {
    pub fn last(&self) -> Option<&Path> {
        self.pages.last().map(PathBuf::as_path)
    }
}

impl PreviewHost for PreviewHistory {
    fn render(&mut self, page: &Path) {
        self.pages.push(page.to_path_buf());
    }
}

/// Result of a Play request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    /// The entry page was handed to the preview.
    Rendered(PathBuf),
    /// The entry page does not exist; nothing was rendered.
    MissingIndex(PathBuf),
}

impl PreviewOutcome {
    pub fn page(&self) -> &Path {
        match self {
            PreviewOutcome::Rendered(page) | PreviewOutcome::MissingIndex(page) => page,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, PreviewOutcome::Rendered(_))
    }
}

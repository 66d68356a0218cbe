use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use sitestudio_core::{DocumentError, DocumentHandle, DocumentRegistry};
use sitestudio_highlight::{HighlightPalette, HighlightSpan, SyntaxHighlighter};
use sitestudio_project::{Project, ProjectError, ProjectTree};
use sitestudio_runexec::{
    BuildError, BuildEvent, BuildJob, BuildRunner, BuildState, ConsoleBuffer, OutputSink,
    ProcessLauncher, RunSpec,
};

use crate::preview::{PreviewHistory, PreviewHost, PreviewOutcome, MISSING_INDEX_LINE};

pub const APP_TITLE: &str = "Basic Website Studio";

/// Errors surfaced synchronously by session operations.
/// （工作階段操作同步回報的錯誤。）
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("no project is loaded")]
    NoProject,
    #[error("document is not open: {}", .0.display())]
    NotOpen(PathBuf),
}

/// Which toolbar actions a front end should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionStates {
    pub play: bool,
    pub build: bool,
}

/// 單一視窗的工作階段狀態。 / State of one studio window.
///
/// Owned by the front end and touched only from its interactive thread. The
/// build worker reaches this state solely through [`Session::poll_build`] and
/// [`Session::wait_for_build`].
pub struct Session<S = ConsoleBuffer, P = PreviewHistory> {
    project: Option<Project>,
    documents: DocumentRegistry,
    builds: BuildRunner,
    highlighter: SyntaxHighlighter,
    console: S,
    preview: P,
}

impl Session {
    /// Session with an in-memory console, a recording preview and `npm run build`.
    pub fn new() -> Self {
        Self::with_parts(RunSpec::default(), ConsoleBuffer::default(), PreviewHistory::default())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: OutputSink, P: PreviewHost> Session<S, P> {
    pub fn with_parts(build: RunSpec, console: S, preview: P) -> Self {
        Self {
            project: None,
            documents: DocumentRegistry::new(),
            builds: BuildRunner::new(build),
            highlighter: SyntaxHighlighter::default(),
            console,
            preview,
        }
    }

    /// Replaces how build processes are started. Only valid before the first build.
    pub fn with_launcher(mut self, launcher: Arc<dyn ProcessLauncher>) -> Self {
        self.builds = BuildRunner::with_launcher(self.builds.spec().clone(), launcher);
        self
    }

    pub fn with_palette(mut self, palette: HighlightPalette) -> Self {
        self.highlighter = SyntaxHighlighter::new(palette);
        self
    }

    // ----- project -----

    /// 建立新專案並立即載入。 / Creates `<parent>/<name>` and loads it.
    pub fn create_project(
        &mut self,
        name: &str,
        parent: impl AsRef<Path>,
    ) -> Result<&Project, SessionError> {
        let project = Project::create(name, parent)?;
        Ok(self.load(project))
    }

    /// 開啟既有專案。 / Opens an existing project.
    ///
    /// On failure the session keeps its previous project and documents.
    pub fn open_project(&mut self, path: impl AsRef<Path>) -> Result<&Project, SessionError> {
        let project = Project::open(path)?;
        Ok(self.load(project))
    }

    fn load(&mut self, project: Project) -> &Project {
        self.documents.close_all();
        tracing::info!(root = %project.root().display(), "project loaded");
        let project = self.project.insert(project);
        // Loading always shows a preview.
        show_preview(project, &mut self.console, &mut self.preview);
        project
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Rescans the loaded project's directory.
    pub fn refresh_tree(&mut self) -> Result<&ProjectTree, SessionError> {
        let project = self.project.as_mut().ok_or(SessionError::NoProject)?;
        Ok(project.refresh_tree()?)
    }

    /// Window title, e.g. `Basic Website Studio - Demo`.
    pub fn title(&self) -> String {
        match &self.project {
            Some(project) => format!("{APP_TITLE} - {}", project.display_name()),
            None => APP_TITLE.to_string(),
        }
    }

    pub fn actions(&self) -> ActionStates {
        let loaded = self.project.is_some();
        ActionStates {
            play: loaded,
            build: loaded && !self.builds.is_running(),
        }
    }

    // ----- documents -----

    /// Opens a file from the tree, or re-selects its tab. Directories yield `Ok(None)`.
    pub fn open_document(
        &mut self,
        path: impl AsRef<Path>,
    ) -> Result<Option<&DocumentHandle>, SessionError> {
        Ok(self.documents.open(path)?)
    }

    /// Closes a tab. Returns `false` when it was not open.
    pub fn close_document(&mut self, path: impl AsRef<Path>) -> bool {
        self.documents.close(path).is_some()
    }

    pub fn documents(&self) -> &DocumentRegistry {
        &self.documents
    }

    /// 同步編輯器緩衝區並重新上色。 / Stores the editor's new buffer and returns a fresh full pass.
    pub fn edit_document(
        &mut self,
        path: impl AsRef<Path>,
        text: impl Into<String>,
    ) -> Result<Vec<HighlightSpan>, SessionError> {
        let path = path.as_ref();
        let handle = self
            .documents
            .get_mut(path)
            .ok_or_else(|| SessionError::NotOpen(path.to_path_buf()))?;
        handle.replace_content(text);
        Ok(self.highlighter.highlight(handle.content()))
    }

    /// Highlight pass over the active tab; empty when no tab is open.
    pub fn highlight_active(&self) -> Vec<HighlightSpan> {
        self.documents
            .active()
            .map(|handle| self.highlighter.highlight(handle.content()))
            .unwrap_or_default()
    }

    pub fn highlighter(&self) -> &SyntaxHighlighter {
        &self.highlighter
    }

    // ----- preview -----

    /// Hands `src/index.html` to the preview, or logs that it is missing.
    /// （將 `src/index.html` 交給預覽；不存在時寫入主控台。）
    pub fn play(&mut self) -> Result<PreviewOutcome, SessionError> {
        let project = self.project.as_ref().ok_or(SessionError::NoProject)?;
        Ok(show_preview(project, &mut self.console, &mut self.preview))
    }

    pub fn preview(&self) -> &P {
        &self.preview
    }

    // ----- build -----

    /// Starts the project build; returns as soon as the worker is running.
    pub fn build(&mut self) -> Result<(), SessionError> {
        let root = self.project.as_ref().map(Project::root);
        self.builds.start(root, &mut self.console)?;
        Ok(())
    }

    /// Applies build output that has arrived so far. Call from the event loop.
    pub fn poll_build(&mut self) -> Vec<BuildEvent> {
        self.builds.poll(&mut self.console)
    }

    /// Blocks until the running build (if any) finishes.
    pub fn wait_for_build(&mut self) -> BuildState {
        self.builds.wait(&mut self.console)
    }

    pub fn wait_for_build_timeout(&mut self, timeout: Duration) -> Option<BuildState> {
        self.builds.wait_timeout(&mut self.console, timeout)
    }

    pub fn build_job(&self) -> &BuildJob {
        self.builds.job()
    }

    pub fn console(&self) -> &S {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut S {
        &mut self.console
    }
}

fn show_preview(
    project: &Project,
    console: &mut dyn OutputSink,
    preview: &mut dyn PreviewHost,
) -> PreviewOutcome {
    let page = project.index_path();
    if page.is_file() {
        tracing::debug!(page = %page.display(), "rendering preview");
        preview.render(&page);
        PreviewOutcome::Rendered(page)
    } else {
        console.append_line(MISSING_INDEX_LINE);
        PreviewOutcome::MissingIndex(page)
    }
}

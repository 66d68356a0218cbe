//! Workspace session: one loaded project, its open documents and its build.
//! 工作階段：一個已載入的專案、開啟中的文件與建置工作。

mod preview;
mod session;

pub use preview::{PreviewHistory, PreviewHost, PreviewOutcome, MISSING_INDEX_LINE};
pub use session::{ActionStates, Session, SessionError, APP_TITLE};

pub use sitestudio_core::{DocumentError, DocumentHandle, DocumentRegistry};
pub use sitestudio_highlight::{HighlightKind, HighlightPalette, HighlightSpan, SyntaxHighlighter};
pub use sitestudio_project::{Project, ProjectConfig, ProjectError, ProjectNode, ProjectTree};
pub use sitestudio_runexec::{
    BuildError, BuildEvent, BuildFailure, BuildJob, BuildState, ConsoleBuffer, OutputSink,
    ProcessLauncher, RunSpec,
};

//! External build execution with streamed output.
//! （以串流方式回報輸出的外部建置執行模組。）
//!
//! A [`RunSpec`] describes the command; a [`ProcessLauncher`] turns it into a
//! running process whose merged stdout/stderr is read on a worker thread; the
//! [`BuildRunner`] owns the job state and only changes it when the interactive
//! side drains the worker's messages.
//! [`RunSpec`] 描述指令，[`ProcessLauncher`] 啟動進程，工作執行緒讀取合併後的輸出，
//! [`BuildRunner`] 只在互動端取出訊息時更新建置狀態。

mod process;
mod runner;

pub use process::{BuildProcess, ProcessLauncher, SystemLauncher};
pub use runner::{
    BuildError, BuildEvent, BuildFailure, BuildJob, BuildRunner, BuildState, ConsoleBuffer,
    OutputSink,
};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that may surface while launching or supervising a command.
/// （啟動或監控指令時可能發生的錯誤。）
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to create output pipe: {0}")]
    Pipe(io::Error),
    #[error("failed to read process output: {0}")]
    Output(io::Error),
    #[error("failed to wait for process: {0}")]
    Wait(io::Error),
}

impl RunError {
    /// `true` when the executable itself could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RunError::Launch { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Build command configuration: what to run, where, and with which environment.
/// （建置指令設定：執行的程式、工作目錄與環境變數。）
///
/// The working directory is filled in by [`BuildRunner`] from the project root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub clear_env: bool,
}

impl RunSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            clear_env: false,
        }
    }

    /// `npm run build`, the studio's site build.
    /// （工作室的網站建置：`npm run build`。）
    pub fn npm_build() -> Self {
        Self::new("npm").with_args(["run", "build"])
    }

    pub fn push_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self.args.push(arg.into());
        }
        self
    }

    /// Sets one variable for the child; the parent environment is inherited
    /// unless [`RunSpec::clear_env`] was called.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn clear_env(mut self) -> Self {
        self.clear_env = true;
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Shell-like rendering for logs, e.g. `npm run build`.
    pub fn display_command(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(arg);
        }
        rendered
    }
}

impl Default for RunSpec {
    fn default() -> Self {
        Self::npm_build()
    }
}

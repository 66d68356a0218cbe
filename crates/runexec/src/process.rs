use std::io::{self, PipeReader, Read};
use std::process::{Child, Command, Stdio};

use crate::{RunError, RunSpec};

/// A launched build process.
/// （已啟動的建置進程。）
///
/// The worker thread owns the value for the whole run, so `kill` is the seam
/// through which cancellation would be added.
pub trait BuildProcess: Send {
    /// Hands out the merged stdout/stderr stream; `None` after the first call.
    fn take_output(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Blocks until exit. `Ok(None)` means no exit code (e.g. killed by a signal).
    fn wait(&mut self) -> io::Result<Option<i32>>;

    fn kill(&mut self) -> io::Result<()>;
}

/// Starts processes for a [`RunSpec`].
pub trait ProcessLauncher: Send + Sync {
    fn launch(&self, spec: &RunSpec) -> Result<Box<dyn BuildProcess>, RunError>;
}

/// Launches real OS processes with stdout and stderr sharing one pipe.
/// （以單一管線合併標準輸出與錯誤輸出的系統進程啟動器。）
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn launch(&self, spec: &RunSpec) -> Result<Box<dyn BuildProcess>, RunError> {
        let (reader, writer) = io::pipe().map_err(RunError::Pipe)?;
        let stderr_writer = writer.try_clone().map_err(RunError::Pipe)?;

        let mut command = Command::new(&spec.program);
        command.args(&spec.args);
        command.stdin(Stdio::null());
        command.stdout(writer);
        command.stderr(stderr_writer);

        if spec.clear_env {
            command.env_clear();
        }

        for (key, value) in &spec.env {
            command.env(key, value);
        }

        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        let child = command.spawn().map_err(|source| RunError::Launch {
            program: spec.program.clone(),
            source,
        })?;
        // The command still holds the parent's write ends; the reader only sees
        // EOF once they are gone.
        drop(command);

        Ok(Box::new(SystemProcess {
            child,
            output: Some(reader),
        }))
    }
}

struct SystemProcess {
    child: Child,
    output: Option<PipeReader>,
}

impl BuildProcess for SystemProcess {
    fn take_output(&mut self) -> Option<Box<dyn Read + Send>> {
        self.output
            .take()
            .map(|reader| Box::new(reader) as Box<dyn Read + Send>)
    }

    fn wait(&mut self) -> io::Result<Option<i32>> {
        self.child.wait().map(|status| status.code())
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.kill()
    }
}

//! Fixed starter layout written when a project is created.
//! 建立新專案時寫入的固定初始結構。

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::{encode_config, ProjectConfig, CONFIG_FILE_NAME};
use crate::project::ProjectError;

const STYLE_CSS: &str =
    "body {\n    font-family: sans-serif;\n    background-color: #f0f0f0;\n    color: #111;\n}";

const MAIN_JS: &str = "console.log('Project loaded successfully!');";

fn index_html(project_name: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n    <meta charset=\"UTF-8\">\n    <title>{project_name}</title>\n    <link rel=\"stylesheet\" href=\"css/style.css\">\n</head>\n<body>\n    <h1>Welcome to {project_name}</h1>\n    <script src=\"js/main.js\"></script>\n</body>\n</html>"
    )
}

#[derive(Debug)]
enum Step {
    CreatedDir(PathBuf),
    CreatedFile(PathBuf),
    Overwrote { path: PathBuf, previous: Vec<u8> },
}

/// Records every filesystem change so a failed scaffold can be undone.
/// （記錄每一個檔案系統變更，以便在失敗時還原。）
///
/// Directories that already existed are reused and never removed; files that
/// already existed get their previous bytes restored.
#[derive(Debug)]
pub struct ScaffoldWriter {
    root: PathBuf,
    steps: Vec<Step>,
}

impl ScaffoldWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            steps: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates `relative` and any missing ancestors, recording each new directory.
    pub fn create_dir_all(&mut self, relative: impl AsRef<Path>) -> Result<(), ProjectError> {
        let target = self.root.join(relative);
        let mut missing = Vec::new();
        let mut cursor = Some(target.as_path());
        while let Some(dir) = cursor {
            if dir.as_os_str().is_empty() || dir.is_dir() {
                break;
            }
            missing.push(dir.to_path_buf());
            cursor = dir.parent();
        }
        for dir in missing.into_iter().rev() {
            fs::create_dir(&dir).map_err(|source| ProjectError::Io {
                path: dir.clone(),
                source,
            })?;
            self.steps.push(Step::CreatedDir(dir));
        }
        Ok(())
    }

    /// Writes `contents` to `relative`, remembering what was there before.
    pub fn write_file(
        &mut self,
        relative: impl AsRef<Path>,
        contents: impl AsRef<[u8]>,
    ) -> Result<(), ProjectError> {
        self.write_with(relative, |file| file.write_all(contents.as_ref()))
    }

    /// Creates or truncates `relative` and hands the open file to `fill`.
    ///
    /// The step is recorded as soon as the file is touched, so a write that
    /// fails halfway is still undone by [`ScaffoldWriter::rollback`].
    fn write_with(
        &mut self,
        relative: impl AsRef<Path>,
        fill: impl FnOnce(&mut File) -> io::Result<()>,
    ) -> Result<(), ProjectError> {
        let path = self.root.join(relative);
        // Absent, unreadable or a directory: `File::create` reports real failures.
        let previous = fs::read(&path).ok();
        let io_error = |source| ProjectError::Io {
            path: path.clone(),
            source,
        };
        let mut file = File::create(&path).map_err(io_error)?;
        self.steps.push(match previous {
            Some(previous) => Step::Overwrote {
                path: path.clone(),
                previous,
            },
            None => Step::CreatedFile(path.clone()),
        });
        fill(&mut file).and_then(|()| file.sync_all()).map_err(io_error)
    }

    /// Undoes every recorded step, newest first. Best effort: failures are logged.
    pub fn rollback(mut self) {
        while let Some(step) = self.steps.pop() {
            let result = match &step {
                Step::CreatedDir(path) => fs::remove_dir(path),
                Step::CreatedFile(path) => fs::remove_file(path),
                Step::Overwrote { path, previous } => fs::write(path, previous),
            };
            if let Err(err) = result {
                tracing::warn!(?step, error = %err, "scaffold rollback step failed");
            }
        }
    }

    /// Keeps every change; the writer is consumed.
    pub fn commit(self) {
        tracing::debug!(root = %self.root.display(), steps = self.steps.len(), "scaffold committed");
    }
}

/// Writes the starter site and its `project.bws` under `root`.
/// （在 `root` 下寫入初始網站與 `project.bws`。）
///
/// Either every file is written or everything this call created is removed
/// again before the error is returned.
pub fn write_scaffold(root: &Path, config: &ProjectConfig) -> Result<(), ProjectError> {
    write_scaffold_then(root, config, || Ok(()))
}

/// Like [`write_scaffold`], but `finish` runs before the scaffold is kept; an
/// error from it rolls the scaffold back as well.
pub(crate) fn write_scaffold_then<T>(
    root: &Path,
    config: &ProjectConfig,
    finish: impl FnOnce() -> Result<T, ProjectError>,
) -> Result<T, ProjectError> {
    let mut writer = ScaffoldWriter::new(root);
    match populate(&mut writer, config).and_then(|()| finish()) {
        Ok(value) => {
            writer.commit();
            Ok(value)
        }
        Err(err) => {
            tracing::warn!(root = %root.display(), error = %err, "scaffold failed, rolling back");
            writer.rollback();
            Err(err)
        }
    }
}

fn populate(writer: &mut ScaffoldWriter, config: &ProjectConfig) -> Result<(), ProjectError> {
    writer.create_dir_all("src/js")?;
    writer.create_dir_all("src/css")?;
    writer.create_dir_all("assets/images")?;

    writer.write_file("src/index.html", index_html(&config.name))?;
    writer.write_file("src/css/style.css", STYLE_CSS)?;
    writer.write_file("src/js/main.js", MAIN_JS)?;

    let payload = encode_config(writer.root(), config)?;
    writer.write_file(CONFIG_FILE_NAME, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_full_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Demo");
        write_scaffold(&root, &ProjectConfig::new("Demo")).unwrap();

        assert!(root.join("assets/images").is_dir());
        assert_eq!(
            fs::read_to_string(root.join("src/js/main.js")).unwrap(),
            MAIN_JS
        );
        assert_eq!(
            fs::read_to_string(root.join("src/css/style.css")).unwrap(),
            STYLE_CSS
        );
        let html = fs::read_to_string(root.join("src/index.html")).unwrap();
        assert!(html.contains("<title>Demo</title>"));
        assert!(html.contains("Welcome to Demo"));
    }

    #[test]
    fn failure_removes_only_what_was_created() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Broken");
        // A directory where the index file should go makes the first write fail.
        fs::create_dir_all(root.join("src/index.html")).unwrap();

        let err = write_scaffold(&root, &ProjectConfig::new("Broken")).unwrap_err();
        assert!(matches!(err, ProjectError::Io { .. }));

        assert!(root.join("src/index.html").is_dir());
        assert!(!root.join("src/js").exists());
        assert!(!root.join("src/css").exists());
        assert!(!root.join("assets").exists());
        assert!(!root.join(CONFIG_FILE_NAME).exists());
    }

    #[test]
    fn write_failing_after_create_is_rolled_back() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Full");
        let mut writer = ScaffoldWriter::new(&root);
        writer.create_dir_all("src").unwrap();

        let err = writer
            .write_with("src/index.html", |file| {
                file.write_all(b"<!DOCTYPE")?;
                Err(io::Error::other("no space left on device"))
            })
            .unwrap_err();
        assert!(matches!(err, ProjectError::Io { .. }));
        assert!(root.join("src/index.html").is_file());

        writer.rollback();
        assert!(!root.exists());
    }

    #[test]
    fn failing_finish_step_removes_the_scaffold() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("Late");

        let err = write_scaffold_then(&root, &ProjectConfig::new("Late"), || {
            Err::<(), _>(ProjectError::InvalidProject(root.clone()))
        })
        .unwrap_err();
        assert!(matches!(err, ProjectError::InvalidProject(_)));
        assert!(!root.exists());
    }

    #[test]
    fn rollback_restores_overwritten_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("keep.txt"), "original").unwrap();

        let mut writer = ScaffoldWriter::new(dir.path());
        writer.create_dir_all("nested/deeper").unwrap();
        writer.write_file("keep.txt", "replaced").unwrap();
        writer.write_file("nested/new.txt", "fresh").unwrap();
        writer.rollback();

        assert_eq!(
            fs::read_to_string(dir.path().join("keep.txt")).unwrap(),
            "original"
        );
        assert!(!dir.path().join("nested").exists());
    }
}

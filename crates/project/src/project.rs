use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::config::{load_config, ProjectConfig, CONFIG_FILE_NAME};
use crate::scaffold::write_scaffold_then;
use crate::tree::ProjectTree;

/// Errors raised while creating, opening or scanning a project.
/// （建立、開啟或掃描專案時的錯誤。）
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not a valid project folder (project.bws is missing): {}", .0.display())]
    InvalidProject(PathBuf),
    #[error("invalid project config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("project name must be one folder name and location cannot be empty")]
    InvalidName,
}

/// A loaded project: absolute root, its config and a mirror of its files.
/// （已載入的專案：絕對根目錄、設定與檔案樹鏡像。）
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    tree: ProjectTree,
}

impl Project {
    /// Creates `<parent>/<name>` with the starter scaffold and loads it.
    /// （在 `<parent>/<name>` 建立初始骨架並載入。）
    ///
    /// Existing directories are reused. If any step fails, everything this call
    /// wrote is removed before the error is returned. The name must be a single
    /// path component, so the project always lands directly under `parent`.
    pub fn create(name: &str, parent: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let name = name.trim();
        let parent = parent.as_ref();
        if !is_folder_name(name) || parent.as_os_str().is_empty() {
            return Err(ProjectError::InvalidName);
        }
        let root = absolute(&parent.join(name))?;
        let config = ProjectConfig::new(name);
        let tree = write_scaffold_then(&root, &config, || ProjectTree::scan(&root))?;
        tracing::info!(root = %root.display(), name, "project created");
        Ok(Self { root, config, tree })
    }

    /// Opens the project rooted at `path`.
    /// （開啟位於 `path` 的專案。）
    ///
    /// Fails with [`ProjectError::InvalidProject`] when `project.bws` is absent
    /// and with [`ProjectError::Parse`] when it is not valid JSON.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = absolute(path.as_ref())?;
        if !root.join(CONFIG_FILE_NAME).is_file() {
            return Err(ProjectError::InvalidProject(root));
        }
        let config = load_config(&root)?;
        tracing::info!(root = %root.display(), name = %config.name, "project opened");
        Self::load(root, config)
    }

    /// Returns `true` when `path` directly contains a project sidecar.
    pub fn is_project_dir(path: impl AsRef<Path>) -> bool {
        path.as_ref().join(CONFIG_FILE_NAME).is_file()
    }

    fn load(root: PathBuf, config: ProjectConfig) -> Result<Self, ProjectError> {
        let tree = ProjectTree::scan(&root)?;
        Ok(Self { root, config, tree })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    /// Directory name of the root, as shown in window titles.
    pub fn display_name(&self) -> String {
        self.root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.root.display().to_string())
    }

    /// Entry page handed to the preview.
    pub fn index_path(&self) -> PathBuf {
        self.root.join("src").join("index.html")
    }

    /// Rescans the root directory into a fresh tree.
    pub fn refresh_tree(&mut self) -> Result<&ProjectTree, ProjectError> {
        self.tree = ProjectTree::scan(&self.root)?;
        Ok(&self.tree)
    }
}

fn is_folder_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn absolute(path: &Path) -> Result<PathBuf, ProjectError> {
    std::path::absolute(path).map_err(|source| ProjectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

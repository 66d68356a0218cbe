use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::project::ProjectError;
use crate::serde_path;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier assigned to each node in the project tree.
/// 專案樹中每個節點的唯一識別碼。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectNodeId(u64);

impl ProjectNodeId {
    pub fn new() -> Self {
        Self(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ProjectNodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProjectNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectNodeKind {
    Folder,
    File,
}

/// One entry of the explorer: a folder or a file with its absolute path.
/// 檔案總管中的一個項目：資料夾或檔案，附帶絕對路徑。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectNode {
    pub id: ProjectNodeId,
    pub name: String,
    pub kind: ProjectNodeKind,
    #[serde(with = "serde_path")]
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProjectNode>,
}

impl ProjectNode {
    fn new(name: String, kind: ProjectNodeKind, path: PathBuf) -> Self {
        Self {
            id: ProjectNodeId::new(),
            name,
            kind,
            path,
            children: Vec::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ProjectNodeKind::Folder
    }
}

/// Snapshot of the project directory, children sorted by file name.
/// 專案資料夾的快照，子項依檔名排序。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectTree {
    pub root: ProjectNode,
}

impl ProjectTree {
    /// Walks `root` recursively. Symlinks are listed but not followed.
    /// 遞迴走訪 `root`；符號連結只列出不追蹤。
    ///
    /// Only an unreadable `root` is an error. Entries below it that cannot be
    /// read are logged and left out, so one locked folder does not hide the
    /// rest of the project.
    pub fn scan(root: &Path) -> Result<Self, ProjectError> {
        let root_name = root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        let mut stack = vec![ProjectNode::new(
            root_name,
            ProjectNodeKind::Folder,
            root.to_path_buf(),
        )];

        for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(ProjectError::Io {
                        path: err.path().unwrap_or(root).to_path_buf(),
                        source: err.into(),
                    })
                }
                Err(err) => {
                    tracing::warn!(
                        path = %err.path().unwrap_or(root).display(),
                        error = %err,
                        "skipping unreadable project entry"
                    );
                    continue;
                }
            };
            // The parent of a node at depth `d` sits at stack index `d - 1`.
            while stack.len() > entry.depth() {
                fold_top(&mut stack);
            }
            let kind = if entry.file_type().is_dir() {
                ProjectNodeKind::Folder
            } else {
                ProjectNodeKind::File
            };
            let node = ProjectNode::new(
                entry.file_name().to_string_lossy().into_owned(),
                kind,
                entry.into_path(),
            );
            match kind {
                ProjectNodeKind::Folder => stack.push(node),
                ProjectNodeKind::File => {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
            }
        }

        while stack.len() > 1 {
            fold_top(&mut stack);
        }
        let root = stack
            .pop()
            .unwrap_or_else(|| ProjectNode::new(String::new(), ProjectNodeKind::Folder, root.to_path_buf()));
        Ok(Self { root })
    }

    /// Returns the identifier of the root node.
    /// 取得根節點的識別碼。
    pub fn root_id(&self) -> ProjectNodeId {
        self.root.id
    }

    /// Finds a node by identifier.
    /// 依識別碼尋找節點。
    pub fn find(&self, id: ProjectNodeId) -> Option<&ProjectNode> {
        find_recursive(&self.root, &|node| node.id == id)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<&ProjectNode> {
        find_recursive(&self.root, &|node| node.path == path)
    }

    /// Every file path in display order.
    pub fn files(&self) -> Vec<&Path> {
        let mut files = Vec::new();
        collect_files(&self.root, &mut files);
        files
    }
}

fn fold_top(stack: &mut Vec<ProjectNode>) {
    if let Some(done) = stack.pop() {
        if let Some(parent) = stack.last_mut() {
            parent.children.push(done);
        }
    }
}

fn find_recursive<'a>(
    node: &'a ProjectNode,
    predicate: &dyn Fn(&ProjectNode) -> bool,
) -> Option<&'a ProjectNode> {
    if predicate(node) {
        return Some(node);
    }
    node.children
        .iter()
        .find_map(|child| find_recursive(child, predicate))
}

fn collect_files<'a>(node: &'a ProjectNode, out: &mut Vec<&'a Path>) {
    for child in &node.children {
        match child.kind {
            ProjectNodeKind::File => out.push(&child.path),
            ProjectNodeKind::Folder => collect_files(child, out),
        }
    }
}

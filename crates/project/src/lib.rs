//! Project model for Site Studio: config sidecar, scaffold and file tree.
//! Site Studio 的專案模型：設定檔、初始骨架與檔案樹。

mod serde_path;

pub mod config;
pub mod project;
pub mod scaffold;
pub mod tree;

pub use config::{load_config, save_config, ProjectConfig, CONFIG_FILE_NAME};
pub use project::{Project, ProjectError};
pub use scaffold::{write_scaffold, ScaffoldWriter};
pub use tree::{ProjectNode, ProjectNodeId, ProjectNodeKind, ProjectTree};

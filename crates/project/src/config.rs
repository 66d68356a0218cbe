use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::project::ProjectError;

/// Name of the sidecar file marking a directory as a project.
/// （標示資料夾為專案的設定檔名稱。）
pub const CONFIG_FILE_NAME: &str = "project.bws";

/// Version recorded for freshly created projects.
pub const DEFAULT_PROJECT_VERSION: &str = "1.0.0";

/// Persisted project settings stored in `project.bws`.
/// （儲存在 `project.bws` 的專案設定。）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    pub version: String,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: DEFAULT_PROJECT_VERSION.to_string(),
        }
    }

    /// Pretty JSON with a four-space indent.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut buffer = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        self.serialize(&mut serializer)?;
        Ok(buffer)
    }
}

/// Reads the config sidecar of the project rooted at `root`.
/// （讀取位於 `root` 的專案設定檔。）
///
/// A missing sidecar is [`ProjectError::InvalidProject`]; malformed JSON is
/// [`ProjectError::Parse`]. Fields beyond `name`/`version` are ignored.
pub fn load_config(root: &Path) -> Result<ProjectConfig, ProjectError> {
    let path = root.join(CONFIG_FILE_NAME);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return Err(ProjectError::InvalidProject(root.to_path_buf()))
        }
        Err(source) => return Err(ProjectError::Io { path, source }),
    };
    serde_json::from_str(&contents).map_err(|source| ProjectError::Parse { path, source })
}

/// Writes `config` as the sidecar of `root`, replacing any existing one.
pub fn save_config(root: &Path, config: &ProjectConfig) -> Result<(), ProjectError> {
    let payload = encode_config(root, config)?;
    let path = root.join(CONFIG_FILE_NAME);
    fs::write(&path, payload).map_err(|source| ProjectError::Io { path, source })
}

/// Serialises the sidecar for `root`. Failing to encode is a write failure,
/// never a [`ProjectError::Parse`].
pub(crate) fn encode_config(root: &Path, config: &ProjectConfig) -> Result<Vec<u8>, ProjectError> {
    config
        .to_json()
        .map_err(|err| encode_error(root.join(CONFIG_FILE_NAME), err))
}

fn encode_error(path: PathBuf, err: serde_json::Error) -> ProjectError {
    ProjectError::Io {
        path,
        source: io::Error::from(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn config_is_written_with_four_space_indent() {
        let dir = tempdir().unwrap();
        save_config(dir.path(), &ProjectConfig::new("Demo")).unwrap();

        let written = fs::read_to_string(dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(
            written,
            "{\n    \"name\": \"Demo\",\n    \"version\": \"1.0.0\"\n}"
        );
    }

    #[test]
    fn load_round_trips_and_ignores_extra_fields() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{"name":"Site","version":"2.1.0","theme":"dark"}"#,
        )
        .unwrap();

        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.name, "Site");
        assert_eq!(config.version, "2.1.0");
    }

    #[test]
    fn missing_sidecar_is_invalid_project() {
        let dir = tempdir().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ProjectError::InvalidProject(path) if path == dir.path()));
    }

    #[test]
    fn encoding_failures_are_write_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let cause = serde_json::from_str::<serde_json::Value>("x").unwrap_err();

        match encode_error(path.clone(), cause) {
            ProjectError::Io { path: at, source } => {
                assert_eq!(at, path);
                assert_eq!(source.kind(), ErrorKind::InvalidData);
            }
            other => panic!("expected an io error, got {other:?}"),
        }
        assert_eq!(
            encode_config(dir.path(), &ProjectConfig::new("Demo")).unwrap(),
            ProjectConfig::new("Demo").to_json().unwrap()
        );
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ name: ").unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ProjectError::Parse { .. }));
    }
}

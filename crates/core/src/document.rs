use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};
use thiserror::Error;

/// 開啟文件時可能發生的錯誤。 / Errors that can occur while opening a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("could not open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not decode {} as {encoding} text", .path.display())]
    InvalidEncoding {
        path: PathBuf,
        encoding: &'static str,
    },
}

impl DocumentError {
    pub fn path(&self) -> &Path {
        match self {
            DocumentError::Io { path, .. } | DocumentError::InvalidEncoding { path, .. } => path,
        }
    }
}

/// 代表一個已開啟文件（分頁）的記憶體紀錄。 / In-memory record of one open document (one editor tab).
///
/// The buffer is loaded once on open. Edits made by the host text widget are
/// mirrored back through [`DocumentHandle::replace_content`]; dirty tracking is
/// left to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHandle {
    path: PathBuf,
    content: String,
    encoding: &'static Encoding,
    has_bom: bool,
}

impl DocumentHandle {
    /// 從磁碟讀取並解碼文件。 / Reads and decodes a document from disk.
    ///
    /// A UTF-8 or UTF-16 byte-order mark selects the decoder; without one the
    /// bytes must be valid UTF-8.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (encoding, bom_len) = Encoding::for_bom(&bytes).unwrap_or((UTF_8, 0));
        let content = encoding
            .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            .ok_or_else(|| DocumentError::InvalidEncoding {
                path: path.to_path_buf(),
                encoding: encoding.name(),
            })?
            .into_owned();
        Ok(Self {
            path: path.to_path_buf(),
            content,
            encoding,
            has_bom: bom_len > 0,
        })
    }

    /// 取得文件的絕對路徑。 / Absolute path keying this handle.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 分頁標題（檔名）。 / Tab title: the file name.
    pub fn title(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// 以編輯器目前的緩衝區取代內容。 / Stores the host editor's current buffer.
    pub fn replace_content(&mut self, text: impl Into<String>) {
        self.content = text.into();
    }

    pub fn encoding_name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn has_bom(&self) -> bool {
        self.has_bom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn open_reads_utf8_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<h1>Hi ✓</h1>").unwrap();

        let handle = DocumentHandle::open(&path).unwrap();
        assert_eq!(handle.content(), "<h1>Hi ✓</h1>");
        assert_eq!(handle.title(), "index.html");
        assert_eq!(handle.encoding_name(), "UTF-8");
        assert!(!handle.has_bom());
    }

    #[test]
    fn open_strips_byte_order_marks() {
        let dir = tempdir().unwrap();
        let utf8 = dir.path().join("bom8.css");
        fs::write(&utf8, b"\xEF\xBB\xBFbody {}").unwrap();
        let handle = DocumentHandle::open(&utf8).unwrap();
        assert_eq!(handle.content(), "body {}");
        assert!(handle.has_bom());

        let utf16 = dir.path().join("bom16.js");
        fs::write(&utf16, b"\xFF\xFEo\x00k\x00").unwrap();
        let handle = DocumentHandle::open(&utf16).unwrap();
        assert_eq!(handle.content(), "ok");
        assert_eq!(handle.encoding_name(), "UTF-16LE");
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("image.png");
        fs::write(&path, [0x89, b'P', b'N', b'G', 0xFF, 0xFE, 0xFD]).unwrap();

        let err = DocumentHandle::open(&path).unwrap_err();
        assert!(matches!(err, DocumentError::InvalidEncoding { .. }));
        assert_eq!(err.path(), path);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = DocumentHandle::open(dir.path().join("absent.html")).unwrap_err();
        match err {
            DocumentError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::NotFound)
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn replace_content_overwrites_buffer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("main.js");
        fs::write(&path, "a").unwrap();
        let mut handle = DocumentHandle::open(&path).unwrap();
        handle.replace_content("b");
        assert_eq!(handle.content(), "b");
        assert_eq!(fs::read_to_string(&path).unwrap(), "a");
    }
}

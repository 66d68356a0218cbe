//! Open documents for the studio editor: decoded buffers keyed by path.
//! 編輯器中開啟的文件：以路徑為鍵的已解碼緩衝區。

pub mod document;
pub mod registry;

pub use document::{DocumentError, DocumentHandle};
pub use registry::DocumentRegistry;

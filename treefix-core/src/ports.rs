//! Port traits abstracting all I/O away from the project driver.

use camino::{Utf8Path, Utf8PathBuf};

/// Source of documents to analyze.
pub trait DocumentSource {
    /// Document paths in a deterministic order.
    fn list_documents(&self) -> anyhow::Result<Vec<Utf8PathBuf>>;
    fn read_document(&self, path: &Utf8Path) -> anyhow::Result<String>;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
}

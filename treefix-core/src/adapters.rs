//! Default filesystem-backed port implementations.

use crate::ports::{DocumentSource, WritePort};
use anyhow::{Context, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

pub const DEFAULT_INCLUDE: &str = "**/*.ml";

/// Documents under `root` matching the include globs, or the explicitly named `paths`.
///
/// A named directory is scanned with the same globs; a named file is taken as-is.
#[derive(Debug, Clone)]
pub struct FsDocumentSource {
    pub root: Utf8PathBuf,
    pub include: Vec<String>,
    pub paths: Vec<Utf8PathBuf>,
}

impl FsDocumentSource {
    pub fn new(root: Utf8PathBuf, include: Vec<String>) -> Self {
        let include = if include.is_empty() {
            vec![DEFAULT_INCLUDE.to_string()]
        } else {
            include
        };
        Self {
            root,
            include,
            paths: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_paths(mut self, paths: Vec<Utf8PathBuf>) -> Self {
        self.paths = paths;
        self
    }

    fn scan(&self, dir: &Utf8Path, out: &mut BTreeSet<Utf8PathBuf>) -> anyhow::Result<()> {
        for pattern in &self.include {
            let full = dir.join(pattern);
            let entries =
                glob::glob(full.as_str()).with_context(|| format!("invalid include glob {}", full))?;
            for entry in entries {
                let path = entry.context("read glob entry")?;
                let path = Utf8PathBuf::from_path_buf(path)
                    .map_err(|p| anyhow!("non-utf8 path {}", p.display()))?;
                if path.is_file() {
                    out.insert(path);
                }
            }
        }
        Ok(())
    }
}

impl DocumentSource for FsDocumentSource {
    fn list_documents(&self) -> anyhow::Result<Vec<Utf8PathBuf>> {
        let mut out = BTreeSet::new();
        if self.paths.is_empty() {
            self.scan(&self.root, &mut out)?;
        }
        for path in &self.paths {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                self.root.join(path)
            };
            if path.is_dir() {
                self.scan(&path, &mut out)?;
            } else {
                out.insert(path);
            }
        }
        debug!(root = %self.root, documents = out.len(), "listed documents");
        Ok(out.into_iter().collect())
    }

    fn read_document(&self, path: &Utf8Path) -> anyhow::Result<String> {
        fs::read_to_string(path).with_context(|| format!("read {}", path))
    }
}

/// In-memory document source for embedding and testing.
///
/// Documents are listed in path order, matching `FsDocumentSource`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentSource {
    documents: BTreeMap<Utf8PathBuf, String>,
}

impl InMemoryDocumentSource {
    pub fn new<I, P, S>(documents: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<Utf8PathBuf>,
        S: Into<String>,
    {
        Self {
            documents: documents
                .into_iter()
                .map(|(p, s)| (p.into(), s.into()))
                .collect(),
        }
    }
}

impl DocumentSource for InMemoryDocumentSource {
    fn list_documents(&self) -> anyhow::Result<Vec<Utf8PathBuf>> {
        Ok(self.documents.keys().cloned().collect())
    }

    fn read_document(&self, path: &Utf8Path) -> anyhow::Result<String> {
        self.documents
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow!("no such document: {}", path))
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create parent dir for {}", path))?;
        }
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_root() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        (temp, root)
    }

    #[test]
    fn fs_source_scans_include_globs_in_path_order() {
        let (_temp, root) = temp_root();
        std::fs::create_dir_all(root.join("src/nested")).expect("mkdir");
        std::fs::write(root.join("src/b.ml"), "b;").expect("write");
        std::fs::write(root.join("src/nested/a.ml"), "a;").expect("write");
        std::fs::write(root.join("src/notes.txt"), "x").expect("write");

        let source = FsDocumentSource::new(root.clone(), vec![]);
        let docs = source.list_documents().expect("list");
        assert_eq!(
            docs,
            vec![root.join("src/b.ml"), root.join("src/nested/a.ml")]
        );
        assert_eq!(source.read_document(&docs[0]).expect("read"), "b;");
    }

    #[test]
    fn fs_source_takes_named_files_and_scans_named_dirs() {
        let (_temp, root) = temp_root();
        std::fs::create_dir_all(root.join("lib")).expect("mkdir");
        std::fs::write(root.join("lib/x.ml"), "x;").expect("write");
        std::fs::write(root.join("top.txt"), "y;").expect("write");
        std::fs::write(root.join("skipped.ml"), "z;").expect("write");

        let source = FsDocumentSource::new(root.clone(), vec![])
            .with_paths(vec![Utf8PathBuf::from("lib"), Utf8PathBuf::from("top.txt")]);
        let docs = source.list_documents().expect("list");
        assert_eq!(docs, vec![root.join("lib/x.ml"), root.join("top.txt")]);
    }

    #[test]
    fn fs_source_read_error_names_the_path() {
        let (_temp, root) = temp_root();
        let source = FsDocumentSource::new(root.clone(), vec![]);
        let err = source
            .read_document(&root.join("missing.ml"))
            .expect_err("missing file");
        assert!(format!("{err:#}").contains("missing.ml"));
    }

    #[test]
    fn in_memory_lists_sorted_and_reports_missing() {
        let source = InMemoryDocumentSource::new([("z.ml", "z;"), ("a.ml", "a;")]);
        let docs = source.list_documents().expect("list");
        assert_eq!(docs, vec![Utf8PathBuf::from("a.ml"), Utf8PathBuf::from("z.ml")]);
        assert!(source.read_document(Utf8Path::new("nope.ml")).is_err());
    }

    #[test]
    fn fs_write_port_writes_and_creates_dirs() {
        let (_temp, root) = temp_root();
        let target = root.join("nested").join("file.ml");

        FsWritePort.write_file(&target, b"x;").expect("write");

        let contents = std::fs::read_to_string(&target).expect("read");
        assert_eq!(contents, "x;");
    }
}

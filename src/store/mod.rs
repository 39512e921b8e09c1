//! Local storage of converted papers.
//!
//! Each downloaded paper lives as `<storage>/<file stem>.md`, where the
//! stem is the arXiv id with `/` replaced by `_`.

use chrono::{DateTime, Utc};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::models::PaperId;
use crate::utils::{extract_text_from_bytes, PdfExtractError};

const EXTENSION: &str = "md";

/// Errors from the paper store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Extract(#[from] PdfExtractError),

    #[error("Storage task failed: {0}")]
    Task(String),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A paper present in storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPaper {
    pub id: PaperId,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Directory of converted papers
#[derive(Debug, Clone)]
pub struct PaperStore {
    root: PathBuf,
}

impl PaperStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Where the text of `id` is (or would be) stored
    pub fn path_for(&self, id: &PaperId) -> PathBuf {
        self.root.join(format!("{}.{}", id.file_stem(), EXTENSION))
    }

    pub async fn contains(&self, id: &PaperId) -> Result<bool, StoreError> {
        let path = self.path_for(id);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))
    }

    /// Stored text of a paper, `None` when it was never downloaded
    pub async fn read(&self, id: &PaperId) -> Result<Option<String>, StoreError> {
        let path = self.path_for(id);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&path, e)),
        }
    }

    /// Write already-extracted text for a paper. Concurrent writers of
    /// the same id each stage their own file; the last rename wins.
    pub async fn write(&self, id: &PaperId, text: &str) -> Result<StoredPaper, StoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;

        let path = self.path_for(id);
        let root = self.root.clone();
        let target = path.clone();
        let prefix = format!(".{}.", id.file_stem());
        let text = text.to_string();
        tokio::task::spawn_blocking(move || persist(&root, &prefix, &target, text.as_bytes()))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))??;

        tracing::info!("Stored paper {} at {}", id, path.display());
        self.stat(id.clone(), path).await
    }

    /// Convert a PDF to text on the blocking pool and store it
    pub async fn save_pdf(&self, id: &PaperId, pdf: Vec<u8>) -> Result<StoredPaper, StoreError> {
        let size = pdf.len();
        let text = tokio::task::spawn_blocking(move || extract_text_from_bytes(&pdf))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))??;

        tracing::debug!(
            "Extracted {} characters from {} byte PDF for {}",
            text.len(),
            size,
            id
        );
        self.write(id, &text).await
    }

    /// All stored papers, sorted by id. Files that do not name a paper
    /// are skipped; a missing storage directory means no papers.
    pub async fn list(&self) -> Result<Vec<StoredPaper>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::io(&self.root, e)),
        };

        let mut papers = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(PaperId::from_file_stem)
            else {
                tracing::debug!("Skipping unrecognized file {}", path.display());
                continue;
            };
            papers.push(self.stat(id, path).await?);
        }

        papers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(papers)
    }

    async fn stat(&self, id: PaperId, path: PathBuf) -> Result<StoredPaper, StoreError> {
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| StoreError::io(&path, e))?;
        Ok(StoredPaper {
            id,
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            path,
        })
    }
}

/// Stage `bytes` in a uniquely named file under `root` and rename it onto
/// `target`. The staging file is removed when any step fails.
fn persist(root: &Path, prefix: &str, target: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut staged = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(".part")
        .tempfile_in(root)
        .map_err(|e| StoreError::io(root, e))?;
    let staged_path = staged.path().to_path_buf();

    staged
        .write_all(bytes)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| StoreError::io(&staged_path, e))?;
    staged
        .persist(target)
        .map_err(|e| StoreError::io(target, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> PaperId {
        PaperId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_write_read_and_contains() {
        let dir = tempfile::tempdir().unwrap();
        let store = PaperStore::new(dir.path().join("papers"));
        let paper = id("2301.12345");

        assert!(!store.contains(&paper).await.unwrap());
        assert_eq!(store.read(&paper).await.unwrap(), None);

        let stored = store.write(&paper, "# Paper\n\nBody").await.unwrap();
        assert_eq!(stored.path, dir.path().join("papers/2301.12345.md"));
        assert_eq!(stored.size_bytes, 13);

        assert!(store.contains(&paper).await.unwrap());
        assert_eq!(store.read(&paper).await.unwrap().as_deref(), Some("# Paper\n\nBody"));
    }

    #[tokio::test]
    async fn test_list_skips_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = PaperStore::new(dir.path());

        store.write(&id("2302.00002"), "b").await.unwrap();
        store.write(&id("2301.00001v2"), "a").await.unwrap();
        store.write(&id("math.GT/0104020"), "c").await.unwrap();
        std::fs::write(dir.path().join("notes.md"), "x").unwrap();
        std::fs::write(dir.path().join("2303.00003.pdf"), "x").unwrap();

        let listed: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id.to_string())
            .collect();
        assert_eq!(listed, vec!["2301.00001v2", "2302.00002", "math.GT/0104020"]);
    }

    #[tokio::test]
    async fn test_list_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PaperStore::new(dir.path().join("does-not-exist"));
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_pdf_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let store = PaperStore::new(dir.path());
        let err = store
            .save_pdf(&id("2301.12345"), b"not a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Extract(PdfExtractError::InvalidFile(_))));
        assert!(!store.contains(&id("2301.12345")).await.unwrap());
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_of_same_paper() {
        let dir = tempfile::tempdir().unwrap();
        let store = PaperStore::new(dir.path());
        let paper = id("2301.12345");

        for round in 0..20 {
            let writers: Vec<_> = (0..8)
                .map(|n| {
                    let store = store.clone();
                    let paper = paper.clone();
                    tokio::spawn(async move {
                        store.write(&paper, &format!("round {} writer {}", round, n)).await
                    })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }
        }

        let text = store.read(&paper).await.unwrap().unwrap();
        assert!(text.starts_with("round 19 writer "));
        assert_eq!(dir_entries(dir.path()), vec!["2301.12345.md"]);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PaperStore::new(dir.path());
        let paper = id("2301.12345");
        std::fs::create_dir(store.path_for(&paper)).unwrap();
        std::fs::write(store.path_for(&paper).join("occupied"), "x").unwrap();

        let err = store.write(&paper, "text").await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
        assert_eq!(dir_entries(dir.path()), vec!["2301.12345.md"]);
    }
}

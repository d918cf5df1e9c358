//! Policy corpus ingestion
//!
//! A [`DocumentSource`] yields raw document text to the index builder.
//! The shipped implementation scans a folder for PDF, text and markdown
//! files; a file that fails extraction is logged and skipped, never fatal.

use std::fs;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::{DeskError, Result};

/// One raw policy document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDocument {
    /// Document identity (file name)
    pub source_id: String,

    /// Extracted full text
    pub text: String,
}

/// Supplies raw documents for index construction
pub trait DocumentSource: Send + Sync {
    fn load_all(&self) -> Result<Vec<PolicyDocument>>;
}

/// Loads every supported file from one folder
pub struct DirectorySource {
    folder: PathBuf,
}

impl DirectorySource {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }
}

impl DocumentSource for DirectorySource {
    fn load_all(&self) -> Result<Vec<PolicyDocument>> {
        if !self.folder.is_dir() {
            return Err(DeskError::CorpusError(format!(
                "corpus folder not found: {}",
                self.folder.display()
            )));
        }

        let mut entries: Vec<_> = fs::read_dir(&self.folder)?
            .collect::<std::io::Result<Vec<_>>>()?;
        // Deterministic corpus order regardless of directory iteration order
        entries.sort_by_key(|e| e.file_name());

        let mut documents = Vec::new();
        for entry in entries {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let source_id = entry.file_name().to_string_lossy().into_owned();

            let text = match extension.to_ascii_lowercase().as_str() {
                "pdf" => match pdf_extract::extract_text(&path) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(file = %source_id, error = %e, "skipping unreadable PDF");
                        continue;
                    }
                },
                "txt" | "md" => match fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(file = %source_id, error = %e, "skipping unreadable file");
                        continue;
                    }
                },
                _ => continue,
            };

            if text.trim().is_empty() {
                warn!(file = %source_id, "skipping document with no extractable text");
                continue;
            }

            documents.push(PolicyDocument { source_id, text });
        }

        info!(
            folder = %self.folder.display(),
            documents = documents.len(),
            "policy corpus loaded"
        );
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_missing_folder_is_an_error() {
        let source = DirectorySource::new("/nonexistent/policies");
        assert!(matches!(
            source.load_all(),
            Err(DeskError::CorpusError(_))
        ));
    }

    #[test]
    fn test_loads_text_and_markdown_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_viagens.txt"), "política de viagens").unwrap();
        fs::write(dir.path().join("a_ferias.md"), "política de férias").unwrap();
        fs::write(dir.path().join("notes.xlsx"), "ignored").unwrap();

        let documents = DirectorySource::new(dir.path()).load_all().unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].source_id, "a_ferias.md");
        assert_eq!(documents[1].source_id, "b_viagens.txt");
    }

    #[test]
    fn test_unreadable_pdf_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut broken = fs::File::create(dir.path().join("broken.pdf")).unwrap();
        broken.write_all(b"this is not a pdf").unwrap();
        fs::write(dir.path().join("ok.txt"), "conteúdo válido").unwrap();

        let documents = DirectorySource::new(dir.path()).load_all().unwrap();
        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].source_id, "ok.txt");
    }

    #[test]
    fn test_empty_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("empty.txt"), "   \n").unwrap();

        let documents = DirectorySource::new(dir.path()).load_all().unwrap();
        assert!(documents.is_empty());
    }
}

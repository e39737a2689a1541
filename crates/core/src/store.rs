use crate::error::IndexError;
use crate::models::{Document, EmbeddingState, Index};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const INDEX_FILE_NAME: &str = ".sem-grep.index";
pub const FORMAT_VERSION: u32 = 1;

/// On-disk envelope. The version tag and embedding dimension let an
/// incompatible file be detected deterministically instead of surfacing as
/// an obscure deserialization failure.
#[derive(Debug, Serialize, Deserialize)]
struct IndexFile {
    format_version: u32,
    dimensions: usize,
    generated_at: DateTime<Utc>,
    documents: Vec<Document>,
}

/// Persists the index for one indexed root directory.
///
/// Concurrent processes writing the same index file are unsupported; the
/// atomic rename on save only guarantees a reader never sees a torn file.
pub struct IndexStore {
    path: PathBuf,
}

impl IndexStore {
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(INDEX_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Writes to a sibling temporary file, then renames into place, so an
    /// interrupted save leaves the previous good index untouched.
    pub fn save(&self, index: &Index, dimensions: usize) -> Result<(), IndexError> {
        let file = IndexFile {
            format_version: FORMAT_VERSION,
            dimensions,
            generated_at: Utc::now(),
            documents: index.documents().to_vec(),
        };

        let body = serde_json::to_vec(&file)?;
        let staging = self.path.with_file_name(format!("{INDEX_FILE_NAME}.tmp"));
        fs::write(&staging, &body)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }

    /// Loads the persisted index, failing explicitly: a missing file is
    /// `Missing`, anything unreadable as the current format is `Corrupt`,
    /// and version or dimension disagreement gets its own variant so the
    /// caller can log the rebuild it triggers.
    pub fn load(&self, expected_dimensions: usize) -> Result<Index, IndexError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                return Err(IndexError::Missing(self.path.clone()))
            }
            Err(error) => return Err(error.into()),
        };

        let file: IndexFile =
            serde_json::from_slice(&bytes).map_err(|error| IndexError::Corrupt {
                path: self.path.clone(),
                details: error.to_string(),
            })?;

        if file.format_version != FORMAT_VERSION {
            return Err(IndexError::VersionMismatch {
                found: file.format_version,
                expected: FORMAT_VERSION,
            });
        }
        if file.dimensions != expected_dimensions {
            return Err(IndexError::DimensionMismatch {
                found: file.dimensions,
                expected: expected_dimensions,
            });
        }

        for document in &file.documents {
            if let EmbeddingState::Embedded(vectors) = &document.embeddings {
                if vectors.len() != document.chapters.len() {
                    return Err(IndexError::Corrupt {
                        path: self.path.clone(),
                        details: format!(
                            "{} has {} chapters but {} embeddings",
                            document.path.display(),
                            document.chapters.len(),
                            vectors.len()
                        ),
                    });
                }
                if let Some(bad) = vectors
                    .iter()
                    .find(|embedding| embedding.vector.len() != file.dimensions)
                {
                    return Err(IndexError::Corrupt {
                        path: self.path.clone(),
                        details: format!(
                            "{} holds a {}-dimensional vector in a {}-dimensional index",
                            document.path.display(),
                            bad.vector.len(),
                            file.dimensions
                        ),
                    });
                }
            }
        }

        Ok(Index::from_documents(file.documents))
    }
}

use crate::hashing::hash_bytes;
use crate::models::{Chapter, Document, EmbeddingState, Index, ScanOptions};
use crate::splitter::split_into_chapters;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Files the scan could not read, reported instead of failing the run.
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

pub struct ScanReport {
    /// Skeleton index: hashed and split, every document pending.
    pub index: Index,
    pub skipped_files: Vec<SkippedFile>,
}

/// Recursively finds indexable files under `root`, sorted so the scan order
/// (and with it the index order) is deterministic.
pub fn discover_documents(root: &Path, options: &ScanOptions) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|item| item.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }

        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&options.extension));

        if matches {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Builds the skeleton index for one tree: raw bytes hashed for identity,
/// lossy-UTF-8 text split into chapters, embeddings left pending. Unreadable
/// files are skipped and reported, never fatal.
pub fn scan_tree(root: &Path, options: &ScanOptions) -> ScanReport {
    let mut index = Index::new();
    let mut skipped_files = Vec::new();

    for path in discover_documents(root, options) {
        match fs::read(&path) {
            Ok(bytes) => {
                let content_hash = hash_bytes(&bytes);
                let text = String::from_utf8_lossy(&bytes);
                let chapters = split_into_chapters(&text, options.heading_marker)
                    .into_iter()
                    .map(|text| Chapter { text })
                    .collect();

                index.insert(Document {
                    path,
                    content_hash,
                    chapters,
                    embeddings: EmbeddingState::Pending,
                });
            }
            Err(error) => skipped_files.push(SkippedFile {
                path,
                reason: error.to_string(),
            }),
        }
    }

    ScanReport {
        index,
        skipped_files,
    }
}

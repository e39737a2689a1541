use crate::embeddings::{ChapterEmbedder, EmbeddingProvider};
use crate::error::{EmbedError, IndexError, UpdateError};
use crate::models::{ContentHash, EmbeddingState, Index, ScanOptions, SearchHit};
use crate::reconcile::reconcile;
use crate::scan::{scan_tree, ScanReport, SkippedFile};
use crate::search::search_text;
use crate::store::IndexStore;
use rayon::prelude::*;
use std::path::Path;

/// How the previous index was obtained on startup.
pub enum IndexStatus {
    Loaded,
    /// No index file yet; a full build is required.
    Missing,
    /// The file exists but is corrupt or incompatible; a full rebuild is
    /// required and the caller should log the reason, never swallow it.
    Invalid { reason: String },
}

pub struct UpdateReport {
    /// Documents in the fresh scan.
    pub indexed: usize,
    /// Documents whose vectors were recovered from the previous index.
    pub reused: usize,
    /// Documents embedded during this run.
    pub embedded: usize,
    pub skipped_files: Vec<SkippedFile>,
}

/// Sequences one run: load or rebuild, scan, reconcile, embed, save, search.
///
/// The provider is injected and shared by reference for the whole run; its
/// lifecycle belongs to the caller.
pub struct Indexer<'a, P: EmbeddingProvider + ?Sized> {
    provider: &'a P,
    store: IndexStore,
}

impl<'a, P: EmbeddingProvider + ?Sized> Indexer<'a, P> {
    pub fn new(provider: &'a P, root: &Path) -> Self {
        Self {
            provider,
            store: IndexStore::new(root),
        }
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    /// Loads the persisted index. An unusable file degrades to an empty
    /// previous index so the run falls back to a full rebuild; the status
    /// tells the caller which case it was.
    pub fn load_previous(&self) -> (Index, IndexStatus) {
        match self.store.load(self.provider.dimensions()) {
            Ok(index) => (index, IndexStatus::Loaded),
            Err(IndexError::Missing(_)) => (Index::new(), IndexStatus::Missing),
            Err(error) => (
                Index::new(),
                IndexStatus::Invalid {
                    reason: error.to_string(),
                },
            ),
        }
    }

    /// Rebuilds the index from the live file set, carrying cached vectors
    /// over by content hash, embedding what remains, and persisting the
    /// result. On a provider failure the run aborts without saving, so the
    /// previous good index file stays untouched and the failing documents
    /// remain pending for the next run.
    pub fn update(
        &self,
        root: &Path,
        previous: &Index,
        options: &ScanOptions,
    ) -> Result<(Index, UpdateReport), UpdateError> {
        let ScanReport {
            index: fresh,
            skipped_files,
        } = scan_tree(root, options);

        let indexed = fresh.len();
        let mut merged = reconcile(previous, fresh);
        let reused = merged.embedded_count();

        let embedded = self.embed_pending(&mut merged)?;
        self.store.save(&merged, self.provider.dimensions())?;

        Ok((
            merged,
            UpdateReport {
                indexed,
                reused,
                embedded,
                skipped_files,
            },
        ))
    }

    pub fn search(
        &self,
        index: &Index,
        query: &str,
        n: usize,
    ) -> Result<Vec<SearchHit>, EmbedError> {
        search_text(index, self.provider, query, n)
    }

    /// Embeds every pending document. Documents are independent, so the
    /// provider calls fan out over rayon; each document is all-or-nothing.
    /// The first failure is returned after the successes are applied.
    fn embed_pending(&self, index: &mut Index) -> Result<usize, EmbedError> {
        let embedder = ChapterEmbedder::new(self.provider);

        let results: Vec<(ContentHash, Result<EmbeddingState, EmbedError>)> = index
            .documents()
            .par_iter()
            .filter(|document| !document.is_embedded())
            .map(|document| {
                let outcome = embedder
                    .embed_document(&document.chapters)
                    .map(EmbeddingState::Embedded);
                (document.content_hash, outcome)
            })
            .collect();

        let mut embedded = 0usize;
        let mut failure = None;

        for (hash, outcome) in results {
            match outcome {
                Ok(state) => {
                    index.set_embeddings(&hash, state);
                    embedded += 1;
                }
                Err(error) => {
                    if failure.is_none() {
                        failure = Some(error);
                    }
                }
            }
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(embedded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashedNgramProvider;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Wraps the real provider and counts batch calls, to prove cache hits
    /// never reach the embedding pipeline.
    struct CountingProvider {
        inner: HashedNgramProvider,
        calls: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                inner: HashedNgramProvider { dimensions: 16 },
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl EmbeddingProvider for CountingProvider {
        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.embed(texts)
        }
    }

    struct FailingProvider;

    impl EmbeddingProvider for FailingProvider {
        fn dimensions(&self) -> usize {
            16
        }

        fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
            Err(EmbedError::Provider("model unavailable".to_string()))
        }
    }

    #[test]
    fn full_cycle_builds_searches_and_persists() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("ships.md"),
            "# sailing\nboats on the open water. wind in the sails\n# cooking\nrecipes and kitchens",
        )?;

        let provider = HashedNgramProvider { dimensions: 32 };
        let indexer = Indexer::new(&provider, dir.path());
        let options = ScanOptions::default();

        let (index, report) = indexer.update(dir.path(), &Index::new(), &options)?;
        assert_eq!(report.indexed, 1);
        assert_eq!(report.embedded, 1);
        assert_eq!(report.reused, 0);
        assert_eq!(index.pending_count(), 0);

        let hits = indexer.search(&index, "boats on the open water", 1)?;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chapter_index, 0);

        let (reloaded, status) = indexer.load_previous();
        assert!(matches!(status, IndexStatus::Loaded));
        assert_eq!(reloaded, index);
        Ok(())
    }

    #[test]
    fn rename_is_a_zero_cost_cache_hit() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.md"), "# topic\nstable content here")?;

        let provider = CountingProvider::new();
        let indexer = Indexer::new(&provider, dir.path());
        let options = ScanOptions::default();

        let (first, _) = indexer.update(dir.path(), &Index::new(), &options)?;
        let calls_after_build = provider.calls();
        assert!(calls_after_build > 0);

        fs::rename(dir.path().join("a.md"), dir.path().join("b.md"))?;
        let (second, report) = indexer.update(dir.path(), &first, &options)?;

        assert_eq!(provider.calls(), calls_after_build);
        assert_eq!(report.reused, 1);
        assert_eq!(report.embedded, 0);
        assert_eq!(
            second.documents()[0].path.file_name().and_then(|n| n.to_str()),
            Some("b.md")
        );
        assert_eq!(
            second.documents()[0].embedded_chapters(),
            first.documents()[0].embedded_chapters()
        );
        Ok(())
    }

    #[test]
    fn editing_one_file_re_embeds_only_that_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.md"), "# alpha\nuntouched text")?;
        fs::write(dir.path().join("b.md"), "# beta\ntext that will change")?;

        let provider = CountingProvider::new();
        let indexer = Indexer::new(&provider, dir.path());
        let options = ScanOptions::default();

        let (first, _) = indexer.update(dir.path(), &Index::new(), &options)?;
        let untouched = first.documents()[0].embedded_chapters().unwrap().to_vec();

        fs::write(dir.path().join("b.md"), "# beta\ntext that has changed")?;
        let (second, report) = indexer.update(dir.path(), &first, &options)?;

        assert_eq!(report.reused, 1);
        assert_eq!(report.embedded, 1);
        assert_eq!(
            second.documents()[0].embedded_chapters().unwrap(),
            untouched.as_slice()
        );
        Ok(())
    }

    #[test]
    fn provider_failure_leaves_previous_index_on_disk() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.md"), "# stable\ncontent")?;

        let good = HashedNgramProvider { dimensions: 16 };
        let indexer = Indexer::new(&good, dir.path());
        let options = ScanOptions::default();
        let (index, _) = indexer.update(dir.path(), &Index::new(), &options)?;
        let saved = fs::read(indexer.store().path())?;

        fs::write(dir.path().join("new.md"), "# fresh\nneeds embedding")?;
        let failing = Indexer::new(&FailingProvider, dir.path());
        let result = failing.update(dir.path(), &index, &options);

        assert!(matches!(
            result,
            Err(UpdateError::Embed(EmbedError::Provider(_)))
        ));
        assert_eq!(fs::read(indexer.store().path())?, saved);
        Ok(())
    }

    #[test]
    fn corrupt_index_degrades_to_full_rebuild() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let provider = HashedNgramProvider { dimensions: 16 };
        let indexer = Indexer::new(&provider, dir.path());
        fs::write(indexer.store().path(), b"zzz")?;

        let (previous, status) = indexer.load_previous();
        assert!(previous.is_empty());
        assert!(matches!(status, IndexStatus::Invalid { .. }));
        Ok(())
    }
}

use crate::models::{EmbeddingState, Index};

/// Merges a fresh scan skeleton with the previously persisted index.
///
/// Cache coherence is keyed by content identity: a document whose bytes are
/// unchanged gets its cached vectors back even if its path changed, while a
/// single edited byte invalidates only that document. Hashes no longer in
/// the fresh scan are dropped outright, no tombstones. The result depends
/// only on the two inputs, not on iteration order.
pub fn reconcile(previous: &Index, fresh: Index) -> Index {
    let mut merged = Index::new();

    for mut document in fresh.into_documents() {
        if let Some(cached) = previous.get(&document.content_hash) {
            if let EmbeddingState::Embedded(vectors) = &cached.embeddings {
                document.embeddings = EmbeddingState::Embedded(vectors.clone());
            }
        }
        merged.insert(document);
    }

    merged
}

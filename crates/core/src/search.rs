use crate::embeddings::{ChapterEmbedder, EmbeddingProvider};
use crate::error::EmbedError;
use crate::models::{Document, EmbeddingState, Index, SearchHit};
use rayon::prelude::*;

/// Cosine of the angle between two vectors, magnitude-independent.
/// Defined as 0.0 when either vector has zero norm, so a degenerate query
/// or a zero-vector chapter can never produce NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0f32;
    let mut norm_a = 0f32;
    let mut norm_b = 0f32;

    for (left, right) in a.iter().zip(b) {
        dot += left * right;
        norm_a += left * left;
        norm_b += right * right;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Ranks documents by the similarity of their best-matching chapter.
///
/// Scoring each document is independent, so it runs as a rayon parallel map;
/// the collected hits keep index order, and the stable descending sort keeps
/// equal scores in that order rather than re-sorting them. Scores are raw
/// cosine similarities, passed through unclamped.
pub fn search(index: &Index, query_vector: &[f32], n: usize) -> Vec<SearchHit> {
    if n == 0 || query_vector.is_empty() {
        return Vec::new();
    }

    let mut hits: Vec<SearchHit> = index
        .documents()
        .par_iter()
        .filter_map(|document| best_chapter(document, query_vector))
        .collect();

    hits.sort_by(|left, right| right.score.total_cmp(&left.score));
    hits.truncate(n);
    hits
}

/// Embeds the query text and delegates to [`search`]. A blank query yields
/// an empty result rather than an error.
pub fn search_text<P: EmbeddingProvider + ?Sized>(
    index: &Index,
    provider: &P,
    query: &str,
    n: usize,
) -> Result<Vec<SearchHit>, EmbedError> {
    if query.trim().is_empty() {
        return Ok(Vec::new());
    }

    let query_vector = ChapterEmbedder::new(provider).embed_query(query)?;
    Ok(search(index, &query_vector, n))
}

fn best_chapter(document: &Document, query_vector: &[f32]) -> Option<SearchHit> {
    let vectors = match &document.embeddings {
        EmbeddingState::Embedded(vectors) if !vectors.is_empty() => vectors,
        _ => return None,
    };

    let mut best_score = 0f32;
    let mut best_index = 0usize;

    for (chapter_index, embedding) in vectors.iter().enumerate() {
        if embedding.low_confidence {
            continue;
        }
        let score = cosine_similarity(query_vector, &embedding.vector);
        // Strict improvement only: a tie keeps the earliest chapter.
        if score > best_score {
            best_score = score;
            best_index = chapter_index;
        }
    }

    Some(SearchHit {
        path: document.path.clone(),
        chapter_index: best_index,
        score: best_score,
        chapter_text: document
            .chapters
            .get(best_index)
            .map(|chapter| chapter.text.clone())
            .unwrap_or_default(),
    })
}

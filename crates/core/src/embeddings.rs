use crate::error::EmbedError;
use crate::models::{Chapter, ChapterEmbedding};
use crate::splitter::split_into_sentences;

const DEFAULT: usize = 128;

pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = DEFAULT;

/// The embedding capability boundary.
///
/// Implementations map a batch of texts to fixed-dimension vectors, same
/// length and order as the input, deterministically for a fixed provider.
/// Calls may block for a long time; providers own their timeout policy and
/// surface failures as [`EmbedError::Provider`]. The provider is injected
/// by the caller, never constructed as global state.
pub trait EmbeddingProvider: Send + Sync {
    fn dimensions(&self) -> usize;
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Deterministic local provider over hashed character trigrams.
///
/// Not a substitute for a real sentence encoder, but stable across runs,
/// dependency-free, and good enough to exercise the whole pipeline.
#[derive(Debug, Clone, Copy)]
pub struct HashedNgramProvider {
    pub dimensions: usize,
}

impl Default for HashedNgramProvider {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

impl HashedNgramProvider {
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0f32; self.dimensions.max(1)];
        let lowered = text.to_lowercase();
        let chars: Vec<char> = lowered.chars().collect();

        if chars.is_empty() {
            return vector;
        }

        for window in chars.windows(3) {
            let token = window.iter().collect::<String>();
            let mut hash = 1469598103934665603u64;
            for byte in token.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(1099511628211);
            }
            let bucket = (hash % vector.len() as u64) as usize;
            vector[bucket] += 1.0;
        }

        let magnitude = vector.iter().map(|value| value * value).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for value in &mut vector {
                *value /= magnitude;
            }
        }

        vector
    }
}

impl EmbeddingProvider for HashedNgramProvider {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

/// Turns chapter text into one vector: sentence-split, one batched provider
/// call per chapter, arithmetic-mean pooling across the sentence vectors.
pub struct ChapterEmbedder<'a, P: EmbeddingProvider + ?Sized> {
    provider: &'a P,
}

impl<'a, P: EmbeddingProvider + ?Sized> ChapterEmbedder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self { provider }
    }

    pub fn embed_chapter(&self, text: &str) -> Result<ChapterEmbedding, EmbedError> {
        let sentences = split_into_sentences(text);

        // Pooling zero vectors is undefined; assign a zero vector and flag
        // the chapter so ranking skips it instead of seeing NaN.
        if sentences.is_empty() {
            return Ok(ChapterEmbedding {
                vector: vec![0f32; self.provider.dimensions()],
                low_confidence: true,
            });
        }

        let vectors = self.provider.embed(&sentences)?;
        if vectors.len() != sentences.len() {
            return Err(EmbedError::BatchShape {
                expected: sentences.len(),
                got: vectors.len(),
            });
        }

        let dimensions = self.provider.dimensions();
        let mut pooled = vec![0f32; dimensions];
        for vector in &vectors {
            if vector.len() != dimensions {
                return Err(EmbedError::WrongDimensions {
                    expected: dimensions,
                    got: vector.len(),
                });
            }
            for (slot, value) in pooled.iter_mut().zip(vector) {
                *slot += value;
            }
        }

        let count = vectors.len() as f32;
        for slot in &mut pooled {
            *slot /= count;
        }

        Ok(ChapterEmbedding {
            vector: pooled,
            low_confidence: false,
        })
    }

    /// Embeds every chapter of one document. All-or-nothing: a provider
    /// failure leaves the whole document pending.
    pub fn embed_document(&self, chapters: &[Chapter]) -> Result<Vec<ChapterEmbedding>, EmbedError> {
        chapters
            .iter()
            .map(|chapter| self.embed_chapter(&chapter.text))
            .collect()
    }

    /// Embeds a query as a single-element batch, without sentence pooling.
    pub fn embed_query(&self, query: &str) -> Result<Vec<f32>, EmbedError> {
        let batch = vec![query.to_string()];
        let mut vectors = self.provider.embed(&batch)?;
        if vectors.len() != 1 {
            return Err(EmbedError::BatchShape {
                expected: 1,
                got: vectors.len(),
            });
        }
        Ok(vectors.remove(0))
    }
}

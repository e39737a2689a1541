pub mod embeddings;
pub mod error;
pub mod hashing;
pub mod models;
pub mod orchestrator;
pub mod reconcile;
pub mod scan;
pub mod search;
pub mod splitter;
pub mod store;

pub use embeddings::{
    ChapterEmbedder, EmbeddingProvider, HashedNgramProvider, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{EmbedError, IndexError, UpdateError};
pub use hashing::hash_bytes;
pub use models::{
    Chapter, ChapterEmbedding, ContentHash, Document, EmbeddingState, Index, ScanOptions,
    SearchHit,
};
pub use orchestrator::{IndexStatus, Indexer, UpdateReport};
pub use reconcile::reconcile;
pub use scan::{discover_documents, scan_tree, ScanReport, SkippedFile};
pub use search::{cosine_similarity, search, search_text};
pub use splitter::{split_into_chapters, split_into_sentences};
pub use store::{IndexStore, FORMAT_VERSION, INDEX_FILE_NAME};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

pub const CONTENT_HASH_BYTES: usize = 32;

/// SHA-256 digest of a document's raw bytes, the identity key of the index.
///
/// Serialized as a lowercase hex string. Digest collisions are treated as
/// identical content; this is an accepted risk, not actively mitigated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; CONTENT_HASH_BYTES]);

impl ContentHash {
    pub fn from_bytes(bytes: [u8; CONTENT_HASH_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; CONTENT_HASH_BYTES] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(CONTENT_HASH_BYTES * 2);
        for byte in self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }

    pub fn from_hex(text: &str) -> Result<Self, InvalidHash> {
        if text.len() != CONTENT_HASH_BYTES * 2 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidHash(text.to_string()));
        }

        let mut bytes = [0u8; CONTENT_HASH_BYTES];
        for (slot, pair) in bytes.iter_mut().zip(text.as_bytes().chunks(2)) {
            let pair = std::str::from_utf8(pair).map_err(|_| InvalidHash(text.to_string()))?;
            *slot = u8::from_str_radix(pair, 16).map_err(|_| InvalidHash(text.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_hex(&text).map_err(D::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("not a valid content hash: {0:?}")]
pub struct InvalidHash(String);

/// A contiguous span of document text between two heading markers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chapter {
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChapterEmbedding {
    pub vector: Vec<f32>,
    /// Set when the chapter had no sentences and received a zero vector.
    /// Low-confidence chapters never participate in scoring.
    pub low_confidence: bool,
}

/// Per-document embedding state. A document is either fully embedded or
/// fully pending; no partially embedded document ever persists.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum EmbeddingState {
    Pending,
    Embedded(Vec<ChapterEmbedding>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    pub path: PathBuf,
    pub content_hash: ContentHash,
    pub chapters: Vec<Chapter>,
    pub embeddings: EmbeddingState,
}

impl Document {
    pub fn is_embedded(&self) -> bool {
        matches!(self.embeddings, EmbeddingState::Embedded(_))
    }

    pub fn embedded_chapters(&self) -> Option<&[ChapterEmbedding]> {
        match &self.embeddings {
            EmbeddingState::Embedded(vectors) => Some(vectors),
            EmbeddingState::Pending => None,
        }
    }
}

/// Content-addressed document collection.
///
/// Keys are content hashes, so two files with identical bytes share one
/// entry and one cached embedding set regardless of path. Iteration follows
/// insertion order, which is what keeps ranking ties deterministic.
#[derive(Debug, Clone, Default)]
pub struct Index {
    documents: Vec<Document>,
    positions: HashMap<ContentHash, usize>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(documents: Vec<Document>) -> Self {
        let mut index = Self::new();
        for document in documents {
            index.insert(document);
        }
        index
    }

    /// Inserts a document. A duplicate hash replaces the existing entry in
    /// place, keeping its position in the iteration order.
    pub fn insert(&mut self, document: Document) {
        match self.positions.get(&document.content_hash) {
            Some(&position) => self.documents[position] = document,
            None => {
                self.positions
                    .insert(document.content_hash, self.documents.len());
                self.documents.push(document);
            }
        }
    }

    pub fn get(&self, hash: &ContentHash) -> Option<&Document> {
        self.positions
            .get(hash)
            .map(|&position| &self.documents[position])
    }

    pub fn contains(&self, hash: &ContentHash) -> bool {
        self.positions.contains_key(hash)
    }

    pub fn set_embeddings(&mut self, hash: &ContentHash, state: EmbeddingState) -> bool {
        match self.positions.get(hash) {
            Some(&position) => {
                self.documents[position].embeddings = state;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn embedded_count(&self) -> usize {
        self.documents.iter().filter(|d| d.is_embedded()).count()
    }

    pub fn pending_count(&self) -> usize {
        self.documents.iter().filter(|d| !d.is_embedded()).count()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn into_documents(self) -> Vec<Document> {
        self.documents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }
}

impl PartialEq for Index {
    fn eq(&self, other: &Self) -> bool {
        self.documents == other.documents
    }
}

/// Knobs for the scan pass.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// File extension to index, compared case-insensitively.
    pub extension: String,
    /// A line starting with this character opens a new chapter.
    pub heading_marker: char,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            extension: "md".to_string(),
            heading_marker: '#',
        }
    }
}

/// One ranked search result: a document and its best-matching chapter.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchHit {
    pub path: PathBuf,
    pub chapter_index: usize,
    pub score: f32,
    pub chapter_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hash(fill: u8) -> ContentHash {
        ContentHash::from_bytes([fill; CONTENT_HASH_BYTES])
    }

    fn sample_document(fill: u8, path: &str) -> Document {
        Document {
            path: PathBuf::from(path),
            content_hash: sample_hash(fill),
            chapters: vec![Chapter {
                text: "# one".to_string(),
            }],
            embeddings: EmbeddingState::Pending,
        }
    }

    #[test]
    fn hex_round_trips() {
        let hash = sample_hash(0xab);
        let parsed = ContentHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(ContentHash::from_hex("abc").is_err());
        assert!(ContentHash::from_hex(&"zz".repeat(CONTENT_HASH_BYTES)).is_err());
    }

    #[test]
    fn hash_serializes_as_hex_string() {
        let hash = sample_hash(0x01);
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(CONTENT_HASH_BYTES)));

        let back: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn duplicate_hash_replaces_entry_in_place() {
        let mut index = Index::new();
        index.insert(sample_document(1, "a.md"));
        index.insert(sample_document(2, "b.md"));
        index.insert(sample_document(1, "copy-of-a.md"));

        assert_eq!(index.len(), 2);
        assert_eq!(index.documents()[0].path, PathBuf::from("copy-of-a.md"));
        assert_eq!(index.documents()[1].path, PathBuf::from("b.md"));
    }

    #[test]
    fn lookup_is_by_content_hash() {
        let mut index = Index::new();
        index.insert(sample_document(7, "doc.md"));

        assert!(index.contains(&sample_hash(7)));
        assert!(index.get(&sample_hash(8)).is_none());
    }
}

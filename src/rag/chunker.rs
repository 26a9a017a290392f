//! Hierarchical document chunking.
//!
//! Markdown text is split at header boundaries (levels 1-3) into parent
//! sections, and each parent is re-split into size-bounded child chunks with
//! configurable overlap. Children are what the indexes hold; parents exist to
//! expand retrieved children into fuller context.
//!
//! A secondary semantic-boundary mode handles header-less prose by grouping
//! sentences until the cosine similarity between consecutive sentence
//! embeddings drops below a threshold.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::ChunkingConfig;
use crate::index::cosine_similarity;
use crate::rag::embedder::Embedder;
use crate::types::{Chunk, ChunkLevel, Result};

/// Separators tried in order of preference when cutting child chunks. The
/// final fallback is a plain character-boundary cut.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Provenance seed for one document: the filename plus an ingest timestamp.
/// Callers with richer provenance (source system, document version) can build
/// their own map instead.
pub fn base_metadata(filename: &str) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    metadata.insert("filename".to_string(), filename.to_string());
    metadata.insert(
        "ingested_at".to_string(),
        chrono::Utc::now().to_rfc3339(),
    );
    metadata
}

/// Splits documents into a two-level parent/child hierarchy.
#[derive(Debug, Clone)]
pub struct HierarchicalChunker {
    config: ChunkingConfig,
}

impl HierarchicalChunker {
    /// Create a chunker with the given configuration.
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Split markdown into parent and child chunks.
    ///
    /// Each header-delimited section becomes one parent chunk carrying
    /// `base_metadata` plus its header path (`header_1`..`header_3`). Child
    /// chunks carry the same metadata plus `chunk_index` and `offset` (byte
    /// position within the parent). Parent ids hash the section content, so
    /// re-ingesting identical documents is idempotent.
    pub fn chunk_markdown(
        &self,
        markdown: &str,
        base_metadata: &BTreeMap<String, String>,
    ) -> Vec<Chunk> {
        let document_id = base_metadata
            .get("filename")
            .map(|f| sanitize_id(f))
            .unwrap_or_else(|| "doc".to_string());

        let mut chunks = Vec::new();

        for section in split_by_headers(markdown) {
            if section.content.trim().is_empty() {
                continue;
            }

            let mut parent_metadata = base_metadata.clone();
            for (level, title) in &section.header_path {
                parent_metadata.insert(format!("header_{}", level), title.clone());
            }

            let parent_id = format!("{}-{}", document_id, content_hash(&section.content));
            chunks.push(Chunk {
                id: parent_id.clone(),
                content: section.content.clone(),
                level: ChunkLevel::Parent,
                parent_id: None,
                metadata: parent_metadata.clone(),
                embedding: None,
            });

            for (index, piece) in self.split_section(&section.content).into_iter().enumerate() {
                let mut child_metadata = parent_metadata.clone();
                child_metadata.insert("chunk_index".to_string(), index.to_string());
                child_metadata.insert("offset".to_string(), piece.offset.to_string());

                chunks.push(Chunk {
                    id: format!("{}-c{}", parent_id, index),
                    content: piece.text,
                    level: ChunkLevel::Child,
                    parent_id: Some(parent_id.clone()),
                    metadata: child_metadata,
                    embedding: None,
                });
            }
        }

        debug!(chunks = chunks.len(), "chunked document");
        chunks
    }

    /// Cut one section into child pieces of at most `chunk_size` bytes,
    /// preferring paragraph, line, and word boundaries, with `chunk_overlap`
    /// bytes carried between consecutive pieces.
    ///
    /// A section that already fits the budget yields a single piece equal to
    /// the section content. Content with no usable separator is cut at a
    /// character boundary rather than rejected.
    fn split_section(&self, text: &str) -> Vec<Piece> {
        let size = self.config.chunk_size;
        let overlap = self.config.chunk_overlap;

        if text.len() <= size {
            return vec![Piece {
                offset: 0,
                text: text.to_string(),
            }];
        }

        let mut pieces = Vec::new();
        let mut start = 0usize;

        while start < text.len() {
            let remaining = &text[start..];
            if remaining.len() <= size {
                pieces.push(Piece {
                    offset: start,
                    text: remaining.to_string(),
                });
                break;
            }

            let window_end = floor_char_boundary(text, start + size);
            let window = &text[start..window_end];

            // Prefer the latest separator that still guarantees forward
            // progress once the overlap is subtracted.
            let mut cut = window_end;
            for sep in SEPARATORS {
                if let Some(pos) = window.rfind(sep) {
                    let candidate = start + pos + sep.len();
                    if candidate > start + overlap {
                        cut = candidate;
                        break;
                    }
                }
            }

            pieces.push(Piece {
                offset: start,
                text: text[start..cut].to_string(),
            });

            let mut next = floor_char_boundary(text, cut.saturating_sub(overlap));
            if next <= start {
                next = cut;
            }
            start = next;
        }

        pieces
    }

    /// Group header-less prose into chunks at semantic boundaries.
    ///
    /// Sentences are accumulated greedily; a new chunk starts whenever the
    /// cosine similarity between consecutive sentence embeddings falls below
    /// the configured threshold. Output is flat (no parent/child hierarchy).
    pub async fn semantic_chunks(
        &self,
        text: &str,
        embedder: &dyn Embedder,
    ) -> Result<Vec<String>> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(Vec::new());
        }
        if sentences.len() == 1 {
            return Ok(vec![sentences.into_iter().next().unwrap_or_default()]);
        }

        let embeddings = embedder.embed_batch(&sentences).await?;

        let threshold = self.config.semantic_similarity_threshold;
        let mut chunks = Vec::new();
        let mut current = vec![sentences[0].clone()];

        for i in 1..sentences.len() {
            let sim = cosine_similarity(&embeddings[i - 1], &embeddings[i]);
            if sim >= threshold {
                current.push(sentences[i].clone());
            } else {
                chunks.push(current.join(" "));
                current = vec![sentences[i].clone()];
            }
        }
        chunks.push(current.join(" "));

        Ok(chunks)
    }
}

/// A child slice of a parent section.
struct Piece {
    offset: usize,
    text: String,
}

struct Section {
    header_path: Vec<(u8, String)>,
    content: String,
}

/// Split markdown at level 1-3 headers. Header lines themselves move into the
/// section's header path; deeper headers stay in the body.
fn split_by_headers(markdown: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut header_path: Vec<(u8, String)> = Vec::new();
    let mut body: Vec<&str> = Vec::new();

    let flush = |header_path: &[(u8, String)], body: &mut Vec<&str>, out: &mut Vec<Section>| {
        let content = body.join("\n").trim().to_string();
        if !content.is_empty() {
            out.push(Section {
                header_path: header_path.to_vec(),
                content,
            });
        }
        body.clear();
    };

    for line in markdown.lines() {
        match parse_header(line) {
            Some((level, title)) => {
                flush(&header_path, &mut body, &mut sections);
                header_path.retain(|(l, _)| *l < level);
                header_path.push((level, title));
            }
            None => body.push(line),
        }
    }
    flush(&header_path, &mut body, &mut sections);

    sections
}

/// Parse a markdown header of level 1-3, returning `(level, title)`.
fn parse_header(line: &str) -> Option<(u8, String)> {
    let trimmed = line.trim_start();
    let hashes = trimmed.bytes().take_while(|&b| b == b'#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    Some((hashes as u8, rest.trim().to_string()))
}

/// Split prose into sentences at `.`/`!`/`?` followed by whitespace.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut prev_terminal = false;

    for (idx, ch) in text.char_indices() {
        if prev_terminal && ch.is_whitespace() {
            let sentence = text[start..idx].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = idx;
        }
        prev_terminal = matches!(ch, '.' | '!' | '?');
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Largest char boundary at or below `idx`.
fn floor_char_boundary(text: &str, idx: usize) -> usize {
    if idx >= text.len() {
        return text.len();
    }
    let mut i = idx;
    while i > 0 && !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// First 12 hex chars of the SHA-256 of `content`.
fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex[..12].to_string()
}

/// Keep ids filesystem- and log-friendly.
fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

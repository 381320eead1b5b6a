//! Core data types that flow through the ingestion and chat pipeline.

use serde::{Deserialize, Serialize};

/// Raw text extracted from one source file, before splitting.
#[derive(Debug, Clone)]
pub struct DocumentText {
    /// Plain UTF-8 body extracted from the file.
    pub text: String,
    /// Originating file name, carried into every chunk as metadata.
    pub source: String,
}

/// A bounded segment of a document's text, the unit of retrieval.
///
/// Chunk text has newlines collapsed to spaces so embedding input stays
/// well-formed. `hash` is a SHA-256 of the text, stored in the docstore
/// for staleness checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub chunk_index: usize,
    pub hash: String,
}

/// One completed question/answer exchange, supplied by the caller as
/// history. The core never stores or mutates these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub answer: String,
}

impl ChatTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// Final output of the retrieval chain: the generated answer plus the
/// retrieved chunks that grounded it, in rank order.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(rename = "sourceDocuments")]
    pub source_documents: Vec<Chunk>,
}

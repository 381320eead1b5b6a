//! Shared test doubles: offline embedder/generator and a minimal PDF
//! builder, so integration tests never touch the network.

#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use pdfchat::config::Config;
use pdfchat::embedding::Embedder;
use pdfchat::error::{ChatError, Result};
use pdfchat::generation::Generator;

/// Deterministic embedder. Known texts can be pinned to fixed vectors;
/// everything else gets a hash-derived vector, stable across calls.
pub struct MockEmbedder {
    dims: usize,
    fixed: HashMap<String, Vec<f32>>,
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<String>>,
}

impl MockEmbedder {
    pub fn new(dims: usize) -> Self {
        Self {
            dims,
            fixed: HashMap::new(),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Pin `text` to a fixed vector, for tests that need controlled ranking.
    pub fn with_fixed(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.fixed.insert(text.to_string(), vector);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(v) = self.fixed.get(text) {
            return v.clone();
        }
        (0..self.dims)
            .map(|i| {
                let mut h = DefaultHasher::new();
                (text, i).hash(&mut h);
                (h.finish() % 1000) as f32 / 1000.0
            })
            .collect()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().extend(texts.iter().cloned());
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }

    fn dims(&self) -> usize {
        self.dims
    }
}

/// Embedder that always fails, for failure-isolation tests.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(ChatError::Upstream("embedding service down".to_string()))
    }

    fn dims(&self) -> usize {
        3
    }
}

/// Generator that records every prompt and answers from canned strings:
/// condense prompts get `condensed`, everything else gets `answer`.
pub struct MockGenerator {
    pub condensed: String,
    pub answer: String,
    pub prompts: Mutex<Vec<String>>,
}

impl MockGenerator {
    pub fn new(condensed: &str, answer: &str) -> Self {
        Self {
            condensed: condensed.to_string(),
            answer: answer.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.contains("Standalone question:") {
            Ok(self.condensed.clone())
        } else {
            Ok(self.answer.clone())
        }
    }
}

/// Config pointing at test directories, with small chunks so short
/// documents still split.
pub fn test_config(source_dir: &Path, index_dir: &Path) -> Config {
    let toml_str = format!(
        r#"
[paths]
source_dir = "{}"
index_dir = "{}"

[chunking]
chunk_size = 200
chunk_overlap = 40

[retrieval]
top_k = 4
"#,
        source_dir.display(),
        index_dir.display()
    );
    toml::from_str(&toml_str).unwrap()
}

/// Minimal single-page PDF containing `phrase`, with byte offsets computed
/// so `pdf-extract` can parse it.
pub fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET\n", phrase);

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!("4 0 obj << /Length {} >> stream\n{}endstream endobj\n", stream.len(), stream)
            .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(
        b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n",
    );
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

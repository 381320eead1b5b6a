//! Per-resource vector index: build, search, save, load.
//!
//! Each resource persists as two artifacts in its own directory:
//!
//! | File | Contents |
//! |------|----------|
//! | `vectors.bin` | all vectors concatenated, little-endian f32 |
//! | `docstore.json` | dims + the parallel chunk/metadata array |
//!
//! A resource is complete only when both files exist and agree on entry
//! count. Saves stage both artifacts in a temporary sibling directory and
//! commit with directory renames, so a reader sees the old pair, no
//! directory at all, or the new pair — never one artifact from each
//! generation. A crash mid-commit leaves the resource unavailable, not
//! corrupt.
//!
//! Search is brute-force cosine similarity over all entries, descending,
//! with ties broken by insertion order (stable sort).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex as StdMutex};

use crate::embedding::{blob_to_vec, cosine_similarity, vec_to_blob};
use crate::error::{ChatError, Result};
use crate::models::Chunk;

pub const VECTORS_FILE: &str = "vectors.bin";
pub const DOCSTORE_FILE: &str = "docstore.json";

/// Suffix of the staging directory a save writes into before committing.
const STAGING_SUFFIX: &str = ".tmp";
/// Suffix the previous generation is parked under while a rebuild commits.
const BACKUP_SUFFIX: &str = ".old";

/// In-memory similarity index over (vector, chunk) entries.
///
/// Read-only after construction; concurrent searches need no locking.
#[derive(Debug)]
pub struct VectorIndex {
    dims: usize,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<Chunk>,
}

#[derive(Serialize, Deserialize)]
struct Docstore {
    dims: usize,
    chunks: Vec<Chunk>,
}

impl VectorIndex {
    /// Construct a fresh index from parallel (chunk, vector) entries.
    ///
    /// Fails on empty input or inconsistent vector dimensionality.
    pub fn build(entries: Vec<(Chunk, Vec<f32>)>) -> Result<Self> {
        let Some(dims) = entries.first().map(|(_, v)| v.len()) else {
            return Err(ChatError::IndexBuild(
                "cannot build an index from zero entries".to_string(),
            ));
        };
        if dims == 0 {
            return Err(ChatError::IndexBuild(
                "vectors must have non-zero dimensionality".to_string(),
            ));
        }

        let mut vectors = Vec::with_capacity(entries.len());
        let mut chunks = Vec::with_capacity(entries.len());
        for (i, (chunk, vector)) in entries.into_iter().enumerate() {
            if vector.len() != dims {
                return Err(ChatError::IndexBuild(format!(
                    "entry {} has {} dims, expected {}",
                    i,
                    vector.len(),
                    dims
                )));
            }
            vectors.push(vector);
            chunks.push(chunk);
        }

        Ok(Self {
            dims,
            vectors,
            chunks,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    /// Return up to `k` entries ranked by descending cosine similarity to
    /// `query`. If `k` exceeds the entry count, all entries are returned.
    ///
    /// A query whose dimensionality differs from the index is rejected;
    /// scoring it would rank every entry at zero and present arbitrary
    /// chunks as grounding.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>> {
        if query.len() != self.dims {
            return Err(ChatError::InvalidRequest(format!(
                "query vector has {} dims but the index has {}",
                query.len(),
                self.dims
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .map(|v| cosine_similarity(query, v))
            .enumerate()
            .collect();

        // Stable sort keeps insertion order for equal scores.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| (self.chunks[i].clone(), score))
            .collect())
    }

    /// Persist both artifacts under `dir`.
    ///
    /// Both files are written into a staging directory next to `dir` and
    /// committed with directory renames. A rebuild parks the previous
    /// generation aside first, so a concurrent load sees the old pair,
    /// `ResourceNotFound`, or the new pair — never the new vectors with
    /// the old docstore.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let dir_name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| ChatError::IndexBuild("index path has no directory name".to_string()))?;
        let parent = dir.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let mut blob = Vec::with_capacity(self.len() * self.dims * 4);
        for v in &self.vectors {
            blob.extend_from_slice(&vec_to_blob(v));
        }

        let docstore = Docstore {
            dims: self.dims,
            chunks: self.chunks.clone(),
        };
        let docstore_json = serde_json::to_vec_pretty(&docstore)
            .map_err(|e| ChatError::IndexBuild(format!("docstore serialization: {}", e)))?;

        // Stage the complete artifact pair outside the live directory.
        // Staging/backup names contain a dot, which sanitized resource
        // names never do, so the catalog ignores them.
        let staging = parent.join(format!("{}{}", dir_name, STAGING_SUFFIX));
        let backup = parent.join(format!("{}{}", dir_name, BACKUP_SUFFIX));
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }
        std::fs::create_dir_all(&staging)?;
        std::fs::write(staging.join(VECTORS_FILE), &blob)?;
        std::fs::write(staging.join(DOCSTORE_FILE), &docstore_json)?;

        if dir.exists() {
            if backup.exists() {
                std::fs::remove_dir_all(&backup)?;
            }
            std::fs::rename(dir, &backup)?;
            std::fs::rename(&staging, dir)?;
            std::fs::remove_dir_all(&backup)?;
        } else {
            std::fs::rename(&staging, dir)?;
        }

        Ok(())
    }

    /// Load a resource's index from `dir`.
    ///
    /// Returns `ResourceNotFound` when either artifact is missing and
    /// `CorruptIndex` when the artifacts disagree.
    pub fn load(dir: &Path) -> Result<Self> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| dir.display().to_string());

        let vectors_path = dir.join(VECTORS_FILE);
        let docstore_path = dir.join(DOCSTORE_FILE);
        if !vectors_path.is_file() || !docstore_path.is_file() {
            return Err(ChatError::ResourceNotFound(name));
        }

        let docstore_bytes = std::fs::read(&docstore_path)?;
        let docstore: Docstore =
            serde_json::from_slice(&docstore_bytes).map_err(|e| ChatError::CorruptIndex {
                name: name.clone(),
                reason: format!("unreadable docstore: {}", e),
            })?;

        if docstore.dims == 0 {
            return Err(ChatError::CorruptIndex {
                name,
                reason: "docstore reports zero dims".to_string(),
            });
        }

        let blob = std::fs::read(&vectors_path)?;
        let stride = docstore.dims * 4;
        if blob.len() % stride != 0 {
            return Err(ChatError::CorruptIndex {
                name,
                reason: format!(
                    "vector blob length {} is not a multiple of {} bytes",
                    blob.len(),
                    stride
                ),
            });
        }

        let entry_count = blob.len() / stride;
        if entry_count != docstore.chunks.len() {
            return Err(ChatError::CorruptIndex {
                name,
                reason: format!(
                    "{} vectors but {} docstore entries",
                    entry_count,
                    docstore.chunks.len()
                ),
            });
        }

        let vectors = blob.chunks_exact(stride).map(blob_to_vec).collect();

        Ok(Self {
            dims: docstore.dims,
            vectors,
            chunks: docstore.chunks,
        })
    }
}

/// Named-mutex map guarding build+save per resource.
///
/// At most one in-flight rebuild per resource name; searches on already
/// loaded indexes never touch these locks.
#[derive(Clone, Default)]
pub struct ResourceLocks {
    inner: Arc<StdMutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl ResourceLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or create) the lock for `name`. Callers hold the returned
    /// mutex for the duration of build+save.
    pub fn for_resource(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut map = self.inner.lock().expect("lock map poisoned");
        map.entry(name.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

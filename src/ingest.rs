//! Batch ingestion: source PDFs → per-resource vector indexes.
//!
//! For each eligible source file: derive the resource name, skip it when a
//! complete index already exists (re-running on an unchanged corpus does no
//! work), otherwise extract → split → embed → build → save. Files are
//! processed independently — one failure is recorded and the batch
//! continues — while each resource's index is all-or-nothing thanks to the
//! atomic save in [`crate::index`].

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::catalog;
use crate::chunk::make_chunks;
use crate::config::{Config, UnknownFilePolicy};
use crate::embedding::Embedder;
use crate::error::{ChatError, Result};
use crate::extract;
use crate::index::{ResourceLocks, VectorIndex};

/// Outcome of one ingestion run, per file.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Resources newly indexed this run.
    pub indexed: Vec<String>,
    /// Resources skipped because a complete index already existed.
    pub skipped: Vec<String>,
    /// Non-PDF files skipped under the warn policy. The ignore policy
    /// drops them without recording; the error policy aborts the run.
    pub ignored: Vec<String>,
    /// Per-file failures: (file name, error message).
    pub failed: Vec<(String, String)>,
}

impl IngestReport {
    pub fn files_seen(&self) -> usize {
        self.indexed.len() + self.skipped.len() + self.ignored.len() + self.failed.len()
    }
}

/// Run the ingestion pipeline over `paths.source_dir`, writing indexes
/// under `paths.index_dir`.
///
/// Returns an error only for setup problems (missing source directory) or
/// an unknown file type under the `error` policy; per-file extraction,
/// embedding, and save failures land in the report instead.
pub async fn run_ingest(config: &Config, embedder: &dyn Embedder) -> Result<IngestReport> {
    let source_dir = &config.paths.source_dir;
    if !source_dir.is_dir() {
        return Err(ChatError::InvalidRequest(format!(
            "source directory does not exist: {}",
            source_dir.display()
        )));
    }

    let locks = ResourceLocks::new();
    let mut report = IngestReport::default();

    for path in enumerate_files(source_dir, config.ingest.recursive) {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        if !is_pdf(&path) {
            match config.ingest.unknown_file_policy {
                UnknownFilePolicy::Ignore => {}
                UnknownFilePolicy::Warn => {
                    println!("warning: unknown file type: {}", file_name);
                    report.ignored.push(file_name);
                }
                UnknownFilePolicy::Error => {
                    return Err(ChatError::InvalidRequest(format!(
                        "unknown file type: {}",
                        file_name
                    )));
                }
            }
            continue;
        }

        let Some(name) = catalog::resource_name(&file_name) else {
            report
                .failed
                .push((file_name, "file name yields no usable resource name".into()));
            continue;
        };

        if catalog::is_complete(&config.paths.index_dir, &name) {
            report.skipped.push(name);
            continue;
        }

        match ingest_file(config, embedder, &locks, &path, &name).await {
            Ok(entry_count) => {
                println!("indexed {} ({} chunks)", name, entry_count);
                report.indexed.push(name);
            }
            Err(e) => {
                println!("warning: failed to ingest {}: {}", file_name, e);
                report.failed.push((file_name, e.to_string()));
            }
        }
    }

    print_summary(source_dir, &report);
    Ok(report)
}

/// Build and persist one resource's index. All-or-nothing: any error here
/// leaves no artifacts behind for the resource.
async fn ingest_file(
    config: &Config,
    embedder: &dyn Embedder,
    locks: &ResourceLocks,
    path: &Path,
    name: &str,
) -> Result<usize> {
    let doc = extract::load_pdf(path)?;
    let chunks = make_chunks(
        &doc,
        config.chunking.chunk_size,
        config.chunking.chunk_overlap,
    );
    if chunks.is_empty() {
        return Err(ChatError::InvalidRequest(
            "document produced no text chunks".to_string(),
        ));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
    let vectors = embedder.embed(&texts).await?;

    let entries: Vec<_> = chunks.into_iter().zip(vectors).collect();
    let entry_count = entries.len();

    // Exclusive build+save per resource; embedding above runs outside the
    // lock so unrelated resources are never blocked on network calls.
    let lock = locks.for_resource(name);
    let _guard = lock.lock().await;

    let index = VectorIndex::build(entries)?;
    index.save(&config.paths.index_dir.join(name))?;

    Ok(entry_count)
}

fn enumerate_files(source_dir: &Path, recursive: bool) -> Vec<PathBuf> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let mut files: Vec<PathBuf> = WalkDir::new(source_dir)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    // Deterministic processing order.
    files.sort();
    files
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn print_summary(source_dir: &Path, report: &IngestReport) {
    println!("ingest {}", source_dir.display());
    println!("  files seen: {}", report.files_seen());
    println!("  indexed: {}", report.indexed.len());
    println!("  skipped (already indexed): {}", report.skipped.len());
    println!("  ignored: {}", report.ignored.len());
    println!("  failed: {}", report.failed.len());
    for (file, err) in &report.failed {
        println!("    {}: {}", file, err);
    }
    println!("ok");
}

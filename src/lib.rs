//! # pdfchat
//!
//! Chat with your PDF documents through retrieval-augmented generation.
//!
//! pdfchat ingests a directory of PDFs into per-resource vector indexes
//! (one index per source document), then answers questions against a
//! chosen resource: follow-up questions are condensed into standalone
//! queries using the chat history, the query is embedded, the most similar
//! chunks are retrieved, and a generation model produces an answer grounded
//! in — and cited against — those chunks.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────────────┐   ┌───────────────────┐
//! │ PDFs     │──▶│ Ingest            │──▶│ index_dir/<name>/ │
//! │ (source) │   │ chunk+embed+build │   │ vectors.bin       │
//! └──────────┘   └───────────────────┘   │ docstore.json     │
//!                                        └─────────┬─────────┘
//!                            ┌─────────────────────┤
//!                            ▼                     ▼
//!                      ┌──────────┐          ┌──────────┐
//!                      │   CLI    │          │   HTTP   │
//!                      │ (pdfchat)│          │  (axum)  │
//!                      └──────────┘          └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pdfchat ingest                  # index every PDF in [paths].source_dir
//! pdfchat resources               # list resources ready for chat
//! pdfchat ask contract "What is the termination clause?"
//! pdfchat serve                   # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`error`] | Typed error kinds |
//! | [`extract`] | PDF text extraction |
//! | [`chunk`] | Overlapping text splitting |
//! | [`embedding`] | Embedding client and vector utilities |
//! | [`generation`] | Generation client |
//! | [`index`] | Per-resource vector index store |
//! | [`catalog`] | Complete-resource discovery |
//! | [`ingest`] | Batch ingestion pipeline |
//! | [`chain`] | Conversational retrieval chain |
//! | [`server`] | HTTP API |

pub mod catalog;
pub mod chain;
pub mod chunk;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod generation;
pub mod index;
pub mod ingest;
pub mod models;
pub mod server;

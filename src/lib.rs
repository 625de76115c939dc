//! # llm-relay
//!
//! A small library for relaying word-bounded chunks of text files to an LLM
//! completion endpoint.
//!
//! ## Features
//!
//! - Word-count chunking that preserves the input's word sequence
//! - Continuation and summarization prompt templates
//! - Order-preserving parallel dispatch over a bounded worker pool
//! - File and directory pipelines with atomic output writes
//! - Interactive REPL mode
//! - Dry-run cost estimation with zero network calls
//!
//! ## Quick Start
//!
//! ```no_run
//! use llm_relay::{HttpCompletionClient, JobSpec, Mode, Pipeline, Settings};
//!
//! # fn main() -> anyhow::Result<()> {
//! let settings = Settings::load(None)?;
//! let client = HttpCompletionClient::from_settings(&settings)?;
//!
//! let job = JobSpec {
//!     model: settings.models.model_for("en")?.to_string(),
//!     chunk_size: 1500,
//!     temperature: 0.5,
//!     mode: Mode::Summarization,
//! };
//!
//! let pipeline = Pipeline::new(client, job, settings.worker_count(), settings.colors.clone())?;
//! pipeline.process_file("input.txt".as_ref(), "output.txt".as_ref())?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Chunker**: splits a document into word-bounded chunks
//! 2. **Dispatcher**: fans chunks out to the completion client, in order
//! 3. **Client**: one blocking JSON request per chunk
//! 4. **Pipeline**: composes the stages and writes the output

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod chunker;
mod client;
mod config;
mod dispatch;
mod error;
mod estimator;
mod pipeline;
mod session;

pub use chunker::{split, word_count};
pub use client::{CompletionBackend, CompletionRequest, HttpCompletionClient, Mode};
pub use config::{ColorPalette, ModelRegistry, Settings};
pub use dispatch::{default_workers, map_concurrently};
pub use error::{Error, Result};
pub use estimator::{CostEstimator, CostMetric, DryRunReport, dry_run};
pub use pipeline::{FileStats, JobSpec, Pipeline, SweepStats};
pub use session::InteractiveSession;

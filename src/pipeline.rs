use crate::{
    chunker,
    client::{CompletionBackend, CompletionRequest, Mode},
    config::ColorPalette,
    dispatch,
    error::{Error, Result},
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Per-invocation parameters shared by every chunk of a run.
#[derive(Debug, Clone)]
pub struct JobSpec {
    /// Model identifier resolved from the language registry
    pub model: String,
    /// Words per chunk
    pub chunk_size: usize,
    /// Sampling temperature in [0, 2]
    pub temperature: f32,
    /// Prompt template kind
    pub mode: Mode,
}

/// Statistics for one processed file.
#[derive(Debug, Clone)]
pub struct FileStats {
    /// Number of chunks dispatched
    pub chunks: usize,
    /// Wall-clock time for the file
    pub duration: Duration,
}

/// Statistics for one directory sweep.
#[derive(Debug, Clone)]
pub struct SweepStats {
    /// Files processed successfully
    pub files_processed: usize,
    /// Files that failed
    pub files_failed: usize,
    /// Chunks dispatched across all successful files
    pub total_chunks: usize,
    /// Wall-clock time for the sweep
    pub duration: Duration,
}

/// Composes the chunker, dispatcher, and output writer over a completion
/// backend.
///
/// Generic over [`CompletionBackend`] so tests can run the full pipeline
/// against scripted fakes.
pub struct Pipeline<B> {
    backend: B,
    job: JobSpec,
    max_workers: usize,
    colors: ColorPalette,
}

impl<B: CompletionBackend> Pipeline<B> {
    /// Creates a pipeline for one invocation.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk size or temperature is invalid; both
    /// are rejected here, before any file or network work starts.
    pub fn new(backend: B, job: JobSpec, max_workers: usize, colors: ColorPalette) -> Result<Self> {
        if job.chunk_size == 0 {
            return Err(Error::InvalidChunkSize { size: 0 });
        }

        // Reuses the request validation so the range check lives in one place.
        CompletionRequest::new("", &job.model, job.temperature, job.mode)?;

        Ok(Self {
            backend,
            job,
            max_workers: max_workers.max(1),
            colors,
        })
    }

    /// Processes one input file into one output file.
    ///
    /// Loads the document, splits it into word-bounded chunks, fans the
    /// chunks out across the worker pool, and writes one response line per
    /// chunk, in chunk order. The output file is written atomically after
    /// all chunks resolve; a failed chunk aborts the file and leaves no
    /// partial output.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read, any chunk's completion
    /// fails (carrying the chunk index), or the output cannot be written.
    #[instrument(skip(self), fields(input = %input.display()))]
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<FileStats> {
        let start = Instant::now();

        let text = fs::read_to_string(input).map_err(|e| Error::io(input, e))?;
        let chunks = chunker::split(&text, self.job.chunk_size)?;

        if chunks.is_empty() {
            warn!("Input contains no words, writing empty output");
        }

        let requests = chunks
            .into_iter()
            .map(|chunk| {
                CompletionRequest::new(chunk, &self.job.model, self.job.temperature, self.job.mode)
            })
            .collect::<Result<Vec<_>>>()?;

        info!(
            chunks = requests.len(),
            workers = self.max_workers,
            "Dispatching completion batch"
        );

        let outcomes = dispatch::map_concurrently(&requests, self.max_workers, |request| {
            self.backend.complete(request)
        });

        let mut responses = Vec::with_capacity(outcomes.len());
        for (index, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(response) => responses.push(response),
                Err(e) => return Err(Error::completion(index, &e)),
            }
        }

        write_lines_atomic(output, &responses)?;

        let stats = FileStats {
            chunks: responses.len(),
            duration: start.elapsed(),
        };

        debug!(
            chunks = stats.chunks,
            secs = stats.duration.as_secs_f64(),
            "File complete"
        );

        Ok(stats)
    }

    /// Processes every regular file directly inside `input_dir` into a
    /// same-named file inside `output_dir`.
    ///
    /// Non-recursive: subdirectories and non-file entries are silently
    /// skipped. Files are processed one at a time, in sorted filename order
    /// for reproducibility. A failing file does not halt the sweep; all
    /// failures are combined into one error after every file has been
    /// attempted.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be read or created, or,
    /// once the sweep finishes, a [`Error::Multiple`] covering every file
    /// that failed.
    #[instrument(skip(self), fields(input_dir = %input_dir.display()))]
    pub fn process_directory(&self, input_dir: &Path, output_dir: &Path) -> Result<SweepStats> {
        let start = Instant::now();

        fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

        let files = list_regular_files(input_dir)?;
        if files.is_empty() {
            warn!("No regular files found in {}", input_dir.display());
        }

        let mut stats = SweepStats {
            files_processed: 0,
            files_failed: 0,
            total_chunks: 0,
            duration: Duration::ZERO,
        };
        let mut failures = Vec::new();

        for input in files {
            // file_name is always present for read_dir entries
            let Some(name) = input.file_name() else {
                continue;
            };
            let output = output_dir.join(name);

            match self.process_file(&input, &output) {
                Ok(file_stats) => {
                    stats.files_processed += 1;
                    stats.total_chunks += file_stats.chunks;
                    println!(
                        "{}",
                        self.colors.paint(
                            "info",
                            &format!("Processed {} -> {}", input.display(), output.display()),
                        )
                    );
                }
                Err(e) => {
                    stats.files_failed += 1;
                    error!("Failed to process {}: {}", input.display(), e);
                    println!(
                        "{}",
                        self.colors
                            .paint("error", &format!("Failed {}: {}", input.display(), e)),
                    );
                    failures.push(e);
                }
            }
        }

        stats.duration = start.elapsed();
        info!(
            processed = stats.files_processed,
            failed = stats.files_failed,
            chunks = stats.total_chunks,
            "Directory sweep complete"
        );

        if failures.is_empty() {
            Ok(stats)
        } else {
            Err(Error::multiple(failures))
        }
    }
}

/// Lists regular files directly inside a directory, sorted by filename.
fn list_regular_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;

        if file_type.is_file() {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}

/// Writes one line per response, atomically (temp file + rename).
fn write_lines_atomic(path: &Path, lines: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
    }

    let mut content = String::new();
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }

    let temp_path = path.with_extension("tmp");
    let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    drop(temp_file);

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    Ok(())
}

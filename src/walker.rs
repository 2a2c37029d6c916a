use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::Path;

use ignore::WalkBuilder;
use reqwest::Client;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::{Config, MatchMode};
use crate::models::{Job, RunStats, SkipReason};
use crate::persist::{self, PersistError, PersistSummary};
use crate::upload::{self, UploadError};

// ── Constants ────────────────────────────────────────────────────────────────

pub const SUPPORTED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".pptx"];

// ── Error types ──────────────────────────────────────────────────────────────

/// Fatal setup failures; these end the run.
#[derive(Debug, thiserror::Error)]
pub enum WalkError {
    #[error("source directory {0} does not exist or is not a directory")]
    SourceDir(String),
    #[error("failed to list result directory {path}: {source}")]
    ResultDir {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] UploadError),
}

/// Failure of a single document; the batch moves on.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

enum Gate {
    Skip(SkipReason),
    Run(Job),
}

// ── Public API ───────────────────────────────────────────────────────────────

pub async fn run_batch(config: &Config) -> Result<RunStats, WalkError> {
    if !config.source_dir.is_dir() {
        return Err(WalkError::SourceDir(config.source_dir.display().to_string()));
    }
    let client = upload::build_client(config)?;
    let outputs =
        existing_outputs(&config.result_dir).map_err(|source| WalkError::ResultDir {
            path: config.result_dir.display().to_string(),
            source,
        })?;

    info!(
        source = %config.source_dir.display(),
        result = %config.result_dir.display(),
        url = %config.url,
        existing = outputs.len(),
        "starting batch"
    );

    let mut stats = RunStats::default();
    let walk = WalkBuilder::new(&config.source_dir)
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    for entry in walk {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let job = match gate(path, &outputs, config) {
            Ok(Gate::Run(job)) => job,
            Ok(Gate::Skip(reason)) => {
                debug!(path = %path.display(), reason = reason.as_str(), "skipping file");
                stats.record_skip(reason);
                continue;
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to process file");
                stats.failed += 1;
                continue;
            }
        };

        info!(path = %job.source.display(), "start processing file");
        match process_job(&client, &config.url, &job).await {
            Ok(summary) => {
                info!(
                    path = %job.source.display(),
                    markdown = %summary.markdown.display(),
                    images = summary.images,
                    "markdown and images saved"
                );
                stats.processed += 1;
            }
            Err(e) => {
                error!(path = %job.source.display(), error = %e, "failed to process file");
                stats.failed += 1;
            }
        }
        info!(path = %job.source.display(), "processed file");
    }

    info!(
        attempted = stats.attempted(),
        processed = stats.processed,
        failed = stats.failed,
        skipped_unsupported = stats.skipped_unsupported,
        skipped_processed = stats.skipped_processed,
        skipped_too_large = stats.skipped_too_large,
        "batch finished"
    );
    Ok(stats)
}

pub async fn process_job(
    client: &Client,
    url: &Url,
    job: &Job,
) -> Result<PersistSummary, JobError> {
    let result = upload::upload_document(client, url, &job.source).await?;
    Ok(persist::save_result(&result, &job.output_dir).await?)
}

// ── Gates ────────────────────────────────────────────────────────────────────

/// Suffix check on the raw name, so names that are not UTF-8 still qualify.
pub fn is_eligible(file_name: &OsStr) -> bool {
    let raw = file_name.as_encoded_bytes();
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| raw.ends_with(ext.as_bytes()))
}

/// Names of the immediate subdirectories of `result_root`.
pub fn existing_outputs(result_root: &Path) -> std::io::Result<Vec<String>> {
    let entries = match std::fs::read_dir(result_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

pub fn is_already_processed(stem: &str, outputs: &[String], mode: MatchMode) -> bool {
    match mode {
        MatchMode::Substring => outputs.iter().any(|name| name.contains(stem)),
        MatchMode::Exact => outputs.iter().any(|name| name == stem),
    }
}

fn gate(path: &Path, outputs: &[String], config: &Config) -> std::io::Result<Gate> {
    let eligible = path.file_name().is_some_and(is_eligible);
    let job = match Job::new(path, &config.result_dir) {
        Some(job) if eligible => job,
        _ => return Ok(Gate::Skip(SkipReason::UnsupportedExtension)),
    };

    if is_already_processed(&job.stem.to_string_lossy(), outputs, config.match_mode) {
        return Ok(Gate::Skip(SkipReason::AlreadyProcessed));
    }

    if std::fs::metadata(path)?.len() > config.max_size {
        return Ok(Gate::Skip(SkipReason::TooLarge));
    }

    Ok(Gate::Run(job))
}

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Decoded body of a successful parse response.
#[derive(Debug, Default, Deserialize)]
pub struct ParseResult {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageEntry {
    /// Base64-encoded image bytes.
    pub image: String,
    pub image_name: String,
}

/// One source document and the folder its results go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: PathBuf,
    /// File name with the last extension stripped; names the output folder.
    pub stem: OsString,
    pub output_dir: PathBuf,
}

impl Job {
    /// Returns `None` when the source has no usable file stem.
    pub fn new(source: &Path, result_root: &Path) -> Option<Self> {
        let stem = source.file_stem()?.to_os_string();
        Some(Self {
            source: source.to_path_buf(),
            output_dir: result_root.join(&stem),
            stem,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedExtension,
    AlreadyProcessed,
    TooLarge,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::UnsupportedExtension => "unsupported_extension",
            SkipReason::AlreadyProcessed => "already_processed",
            SkipReason::TooLarge => "too_large",
        }
    }
}

/// Counters for a single batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub processed: usize,
    pub failed: usize,
    pub skipped_unsupported: usize,
    pub skipped_processed: usize,
    pub skipped_too_large: usize,
}

impl RunStats {
    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::UnsupportedExtension => self.skipped_unsupported += 1,
            SkipReason::AlreadyProcessed => self.skipped_processed += 1,
            SkipReason::TooLarge => self.skipped_too_large += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.processed + self.failed
    }
}

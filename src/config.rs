use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use url::Url;

pub const DEFAULT_URL: &str = "http://localhost:5200/parse_document/docs";
pub const DEFAULT_MAX_SIZE: u64 = 15 * 1024 * 1024;

/// How a source file stem is compared against existing output folder names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchMode {
    /// Skip when the stem appears anywhere inside a folder name.
    Substring,
    /// Skip only when a folder is named exactly like the stem.
    Exact,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "docparse-batch")]
#[command(about = "Send PDF/DOCX/PPTX files to a parsing service and save the markdown and images it returns")]
#[command(version)]
pub struct Config {
    /// Parsing endpoint that accepts a multipart `file` upload
    #[arg(long, env = "DOCPARSE_URL", default_value = DEFAULT_URL, value_parser = parse_endpoint)]
    pub url: Url,

    /// Directory scanned recursively for documents
    #[arg(long, env = "DOCPARSE_SOURCE_DIR", default_value = "SI_Documents")]
    pub source_dir: PathBuf,

    /// Directory that receives one subfolder per document
    #[arg(long, env = "DOCPARSE_RESULT_DIR", default_value = "result_folder")]
    pub result_dir: PathBuf,

    /// Rule for treating a document as already processed
    #[arg(long, env = "DOCPARSE_MATCH_MODE", value_enum, default_value_t = MatchMode::Substring)]
    pub match_mode: MatchMode,

    /// Largest file size in bytes that is still uploaded
    #[arg(long, env = "DOCPARSE_MAX_SIZE", default_value_t = DEFAULT_MAX_SIZE)]
    pub max_size: u64,

    /// Whole-request timeout in seconds (0 disables it)
    #[arg(long, env = "DOCPARSE_TIMEOUT_SECS", default_value_t = 300)]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[arg(long, env = "DOCPARSE_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    pub connect_timeout_secs: u64,
}

fn parse_endpoint(raw: &str) -> Result<Url, String> {
    let parsed = Url::parse(raw).map_err(|e| format!("invalid URL: {}", e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(format!("unsupported URL scheme: {}", other)),
    }
}

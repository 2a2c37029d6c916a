use std::path::{Component, Path, PathBuf};

use base64::Engine;
use tracing::debug;

use crate::models::ParseResult;

pub const MARKDOWN_FILE: &str = "output.md";

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("image {name} is not valid base64: {source}")]
    Decode {
        name: String,
        source: base64::DecodeError,
    },
    #[error("refusing to write image with unsafe name {0:?}")]
    UnsafeImageName(String),
}

#[derive(Debug)]
pub struct PersistSummary {
    pub markdown: PathBuf,
    pub images: usize,
}

/// Writes the markdown text and every image of `result` into `output_dir`.
///
/// Images are written one at a time, so a bad entry leaves the earlier ones
/// on disk.
pub async fn save_result(
    result: &ParseResult,
    output_dir: &Path,
) -> Result<PersistSummary, PersistError> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| io_error(output_dir, source))?;

    let markdown = output_dir.join(MARKDOWN_FILE);
    let text = result.text.as_deref().unwrap_or("");
    tokio::fs::write(&markdown, text)
        .await
        .map_err(|source| io_error(&markdown, source))?;

    for entry in &result.images {
        if !is_safe_image_name(&entry.image_name) {
            return Err(PersistError::UnsafeImageName(entry.image_name.clone()));
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&entry.image)
            .map_err(|source| PersistError::Decode {
                name: entry.image_name.clone(),
                source,
            })?;

        let target = output_dir.join(&entry.image_name);
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|source| io_error(&target, source))?;
        debug!(path = %target.display(), bytes = bytes.len(), "wrote image");
    }

    Ok(PersistSummary {
        markdown,
        images: result.images.len(),
    })
}

/// A name must stay a single plain file name inside the output folder.
fn is_safe_image_name(name: &str) -> bool {
    if name.is_empty() || name.contains(['/', '\\']) {
        return false;
    }
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

fn io_error(path: &Path, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.display().to_string(),
        source,
    }
}

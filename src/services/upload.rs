use crate::error::{AppError, Result};
use crate::services::mp3::is_valid_mp3;
use anyhow::Context;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use unicode_normalization::UnicodeNormalization;

const RESERVED_WINDOWS_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Reduce an uploaded name to a plain, safe file name.
///
/// Accented letters fold to their ASCII base (`é` to `e`) and other
/// non-ASCII text is dropped. Path separators become word breaks, whitespace
/// runs become `_`, anything outside `[A-Za-z0-9_.-]` is dropped and
/// leading/trailing `.`/`_` trimmed. The result may be empty.
pub fn sanitize_filename(name: &str) -> String {
    let ascii: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    let cleaned: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let mut sanitized = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();

    let stem = sanitized.split('.').next().unwrap_or_default();
    if RESERVED_WINDOWS_NAMES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
    {
        sanitized.insert(0, '_');
    }

    sanitized
}

fn has_mp3_extension(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".mp3")
}

/// Writes uploads into the library root.
pub struct UploadHandler {
    root: PathBuf,
}

impl UploadHandler {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Check, store and validate one upload; returns the stored file name.
    pub async fn store(&self, filename: Option<&str>, data: Bytes) -> Result<String> {
        let filename = match filename {
            None => return Err(AppError::InvalidInput("No file provided".to_string())),
            Some("") => return Err(AppError::InvalidInput("No file selected".to_string())),
            Some(name) => name,
        };

        if !has_mp3_extension(filename) {
            return Err(AppError::InvalidInput(
                "Only MP3 files are allowed".to_string(),
            ));
        }

        let name = sanitize_filename(filename);
        if name.is_empty() || !has_mp3_extension(&name) {
            return Err(AppError::InvalidInput("Invalid file name".to_string()));
        }

        let dest = self.root.join(&name);
        let exists = fs::try_exists(&dest)
            .await
            .with_context(|| format!("Upload failed: cannot check {}", dest.display()))?;
        if exists {
            return Err(AppError::Conflict("File already exists".to_string()));
        }

        let mut file = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&dest)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AppError::Conflict("File already exists".to_string()));
            }
            Err(e) => return Err(anyhow::Error::new(e).context("Upload failed").into()),
        };

        let written = async {
            file.write_all(&data).await?;
            file.sync_all().await?;
            Ok::<_, std::io::Error>(())
        }
        .await;
        drop(file);

        let valid = match written {
            Ok(()) => {
                let path = dest.clone();
                tokio::task::spawn_blocking(move || is_valid_mp3(&path))
                    .await
                    .context("MP3 validation task failed")
            }
            Err(e) => Err(anyhow::Error::new(e)),
        };

        match valid {
            Ok(true) => {
                info!("Stored upload {} ({} bytes)", name, data.len());
                Ok(name)
            }
            Ok(false) => {
                remove_quietly(&dest).await;
                warn!("Rejected upload {}: not an MP3", name);
                Err(AppError::InvalidInput("Invalid MP3 file".to_string()))
            }
            Err(e) => {
                remove_quietly(&dest).await;
                Err(e.context("Upload failed").into())
            }
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

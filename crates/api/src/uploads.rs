//! Storage for uploaded design images.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// URL prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Largest accepted upload request.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Writes uploads to a directory as `design-{unix_millis}.{ext}`.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Saves a design and returns the public path it is served under.
    ///
    /// The extension is taken from the client's file name. Names never
    /// collide: a taken millisecond moves on to the next one.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub async fn save_design(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let ext = original_name.and_then(extension);
        let mut millis = Utc::now().timestamp_millis();
        loop {
            let name = match &ext {
                Some(ext) => format!("design-{millis}.{ext}"),
                None => format!("design-{millis}"),
            };
            let path = self.dir.join(&name);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(bytes).await?;
                    file.flush().await?;
                    tracing::info!(file = %name, "design stored");
                    return Ok(format!("{PUBLIC_PREFIX}/{name}"));
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => millis += 1,
                Err(err) => return Err(err),
            }
        }
    }
}

fn extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?;
    (!ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| ext.to_ascii_lowercase())
}

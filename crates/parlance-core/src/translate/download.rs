//! Fetch MarianMT ONNX exports from a Hugging Face compatible hub.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;

use super::marian::{CONFIG_FILE, DECODER_FILE, ENCODER_FILE, TOKENIZER_FILE};
use crate::error::LoadError;

/// `(remote path inside the repo, local file name)` for each model file.
const REMOTE_FILES: [(&str, &str); 4] = [
    ("config.json", CONFIG_FILE),
    ("tokenizer.json", TOKENIZER_FILE),
    ("onnx/encoder_model.onnx", ENCODER_FILE),
    ("onnx/decoder_model.onnx", DECODER_FILE),
];

/// Downloads model repositories file by file, skipping files already on disk.
#[derive(Clone)]
pub struct ModelDownloader {
    hub_endpoint: String,
    client: reqwest::Client,
}

impl ModelDownloader {
    pub fn new(hub_endpoint: &str) -> Self {
        Self {
            hub_endpoint: hub_endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Download every missing file of `repo` into `dest_dir`.
    ///
    /// A 404 for any file means the hub has no model for this language pair.
    pub async fn fetch_model(
        &self,
        repo: &str,
        language_key: &str,
        dest_dir: &Path,
    ) -> Result<(), LoadError> {
        tokio::fs::create_dir_all(dest_dir).await.map_err(|e| {
            LoadError::resource(language_key, format!("Failed to create {dest_dir:?}: {e}"))
        })?;

        for (remote, local) in REMOTE_FILES {
            let dest = dest_dir.join(local);
            if dest.exists() {
                tracing::debug!("{local} already present at {:?}", dest);
                continue;
            }

            let url = format!("{}/{}/resolve/main/{}", self.hub_endpoint, repo, remote);
            tracing::info!("Downloading {repo}/{remote}");
            tracing::debug!("  Source: {url}");
            tracing::debug!("  Destination: {:?}", dest);

            let bytes = match self.download_file(&url, &dest, language_key).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    // Only succeeds when nothing was downloaded yet
                    let _ = tokio::fs::remove_dir(dest_dir).await;
                    return Err(e);
                }
            };
            tracing::info!(
                "  {local} complete ({:.1} MB)",
                bytes as f64 / (1024.0 * 1024.0)
            );
        }

        Ok(())
    }

    /// Stream `url` to `dest` via a `.part` file, renaming once complete.
    async fn download_file(
        &self,
        url: &str,
        dest: &Path,
        language_key: &str,
    ) -> Result<u64, LoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoadError::resource(language_key, format!("Download failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LoadError::unsupported(
                language_key,
                format!("{url} not found on hub"),
            ));
        }
        if !status.is_success() {
            return Err(LoadError::resource(
                language_key,
                format!("Download of {url} failed with HTTP {status}"),
            ));
        }

        let total_size = response.content_length();
        let part = part_path(dest);
        let io_err = |e: std::io::Error| {
            LoadError::resource(language_key, format!("Failed writing {part:?}: {e}"))
        };

        let mut file = tokio::fs::File::create(&part).await.map_err(io_err)?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                LoadError::resource(language_key, format!("Download interrupted: {e}"))
            })?;
            file.write_all(&chunk).await.map_err(io_err)?;
            downloaded += chunk.len() as u64;

            if let Some(total) = total_size {
                if downloaded % (50 * 1024 * 1024) < chunk.len() as u64 {
                    tracing::info!(
                        "  Progress: {:.0}%",
                        downloaded as f64 / total as f64 * 100.0
                    );
                }
            }
        }

        file.flush().await.map_err(io_err)?;
        drop(file);
        tokio::fs::rename(&part, dest).await.map_err(io_err)?;

        Ok(downloaded)
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

//! On-device model registry, download and management.

use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::LocalAIError;
use crate::paths;

/// Model registry entry.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    /// Catalog id of the model (e.g. "qwen3-0.6").
    pub id: String,
    /// Display name of the model.
    pub display_name: String,
    /// Filename on disk.
    pub filename: String,
    /// Download URL.
    pub url: String,
    /// Expected SHA256 checksum (optional).
    pub sha256: Option<String>,
    /// Size in bytes, used for progress when the server omits Content-Length.
    pub size_bytes: Option<u64>,
}

/// Manager for downloading and managing on-device models.
pub struct ModelManager {
    client: reqwest::Client,
    models_dir: PathBuf,
}

impl ModelManager {
    /// Create a model manager rooted at `~/.aurora/models`.
    pub fn new() -> Self {
        Self::with_models_dir(paths::models_dir())
    }

    /// Create a model manager rooted at a custom directory.
    pub fn with_models_dir(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            client: reqwest::Client::new(),
            models_dir: models_dir.into(),
        }
    }

    /// Directory models are stored in.
    pub fn models_dir(&self) -> &PathBuf {
        &self.models_dir
    }

    /// Models Aurora knows how to run on-device, fastest first.
    pub fn registry() -> Vec<ModelInfo> {
        vec![
            ModelInfo {
                id: "smollm2-360m".to_string(),
                display_name: "SmolLM2".to_string(),
                filename: "smollm2-360m-instruct-q8_0.gguf".to_string(),
                url: "https://huggingface.co/HuggingFaceTB/SmolLM2-360M-Instruct-GGUF/resolve/main/smollm2-360m-instruct-q8_0.gguf".to_string(),
                sha256: None,
                size_bytes: Some(386_404_992),
            },
            ModelInfo {
                id: "qwen3-0.6".to_string(),
                display_name: "Qwen 3".to_string(),
                filename: "Qwen3-0.6B-Q8_0.gguf".to_string(),
                url: "https://huggingface.co/Qwen/Qwen3-0.6B-GGUF/resolve/main/Qwen3-0.6B-Q8_0.gguf".to_string(),
                sha256: None,
                size_bytes: Some(639_446_688),
            },
        ]
    }

    /// Look up a registry entry by model id.
    pub fn find(id: &str) -> Result<ModelInfo, LocalAIError> {
        Self::registry()
            .into_iter()
            .find(|m| m.id == id)
            .ok_or_else(|| LocalAIError::UnknownModel(id.to_string()))
    }

    /// Path a model is (or would be) installed at.
    pub fn model_path(&self, model: &ModelInfo) -> PathBuf {
        self.models_dir.join(&model.filename)
    }

    /// Check if a model is installed.
    pub fn is_installed(&self, model: &ModelInfo) -> bool {
        self.model_path(model).exists()
    }

    /// List the filenames (without extension) of all installed models.
    pub fn list_installed(&self) -> Result<Vec<String>, LocalAIError> {
        if !self.models_dir.exists() {
            return Ok(vec![]);
        }

        let models = fs::read_dir(&self.models_dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .map(|ext| ext == "gguf")
                    .unwrap_or(false)
            })
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|s| s.trim_end_matches(".gguf").to_string())
            })
            .collect();

        Ok(models)
    }

    /// Download a model, reporting progress as a fraction in `0.0..=1.0`.
    ///
    /// The file is written to a `.part` sibling and renamed once complete, so
    /// an interrupted download never looks installed.
    pub async fn download(
        &self,
        model: &ModelInfo,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<PathBuf, LocalAIError> {
        tokio::fs::create_dir_all(&self.models_dir).await?;

        let dest_path = self.model_path(model);
        let part_path = dest_path.with_extension("gguf.part");

        info!("Downloading model '{}' to {:?}", model.id, dest_path);

        let response = self
            .client
            .get(&model.url)
            .send()
            .await
            .map_err(|e| LocalAIError::DownloadFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocalAIError::DownloadFailed(format!(
                "HTTP {}: {}",
                response.status(),
                model.url
            )));
        }

        let total_size = response.content_length().or(model.size_bytes);

        let mut file = tokio::fs::File::create(&part_path).await?;
        let mut hasher = Sha256::new();
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        on_progress(0.0);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| LocalAIError::DownloadFailed(e.to_string()))?;
            file.write_all(&chunk).await?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;
            if let Some(total) = total_size.filter(|t| *t > 0) {
                on_progress((downloaded as f64 / total as f64).min(1.0));
            }
        }
        file.flush().await?;
        drop(file);

        if let Some(expected) = &model.sha256 {
            let actual = hex::encode(hasher.finalize());
            if !actual.eq_ignore_ascii_case(expected) {
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(LocalAIError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual,
                });
            }
            debug!("Checksum verified: {}", actual);
        }

        tokio::fs::rename(&part_path, &dest_path).await?;
        on_progress(1.0);

        info!("Model '{}' downloaded ({} bytes)", model.id, downloaded);
        Ok(dest_path)
    }

    /// Remove an installed model.
    pub fn remove(&self, model: &ModelInfo) -> Result<(), LocalAIError> {
        let path = self.model_path(model);
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Removed model: {}", model.id);
        }
        Ok(())
    }
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::handle::ModelHandle;
use crate::config::RecognizerConfig;
use crate::log;
use crate::paths::{get_models_dir, get_user_models_dir, MODEL_FILE_NAME};

/// Places the artifact is looked for, in order.
pub fn candidate_paths(config: &RecognizerConfig) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = &config.model_path {
        paths.push(path.clone());
    }
    paths.push(get_models_dir().join(MODEL_FILE_NAME));
    paths.push(get_user_models_dir().join(MODEL_FILE_NAME));
    paths
}

/// Ensures the classifier artifact is available. Downloads it if necessary.
pub fn ensure_model(config: &RecognizerConfig) -> Result<PathBuf> {
    let candidates = candidate_paths(config);

    // An explicitly configured path is authoritative.
    if let Some(path) = &config.model_path {
        if path.exists() {
            log(&format!("Model found at: {}", path.display()));
            return Ok(path.clone());
        }
        if config.model_url.is_none() {
            return Err(anyhow!("Configured model not found: {}", path.display()));
        }
    } else if let Some(path) = candidates.iter().find(|p| p.exists()) {
        log(&format!("Model found at: {}", path.display()));
        return Ok(path.clone());
    }

    let Some(url) = &config.model_url else {
        let searched = candidates
            .iter()
            .map(|p| format!("  {}", p.display()))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(anyhow!(
            "Classifier model not found. Searched:\n{}\n\
             Place {} in one of these locations or set model_path / model_url in config.json",
            searched,
            MODEL_FILE_NAME
        ));
    };

    let destination = config
        .model_path
        .clone()
        .unwrap_or_else(|| get_user_models_dir().join(MODEL_FILE_NAME));

    log("Model not found locally, downloading...");
    download_model(url, &destination)?;
    Ok(destination)
}

/// Downloads the artifact to `destination`, writing through a temporary
/// sibling so a partial download is never mistaken for a model.
fn download_model(url: &str, destination: &Path) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(url)
        .header("User-Agent", "digit-ocr")
        .send()
        .with_context(|| format!("Failed to download model from {}", url))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download model: HTTP {}",
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    let partial = destination.with_extension("json.part");
    let mut file = fs::File::create(&partial)
        .with_context(|| format!("Failed to create {}", partial.display()))?;
    file.write_all(&bytes)?;
    drop(file);
    fs::rename(&partial, destination)
        .with_context(|| format!("Failed to move model into {}", destination.display()))?;

    log(&format!(
        "Downloaded model ({} bytes) to {}",
        bytes.len(),
        destination.display()
    ));

    Ok(())
}

/// Locates the artifact and returns a handle checked against the configured
/// glyph shape. The handle is not loaded yet.
pub fn open_model(config: &RecognizerConfig) -> Result<ModelHandle> {
    let path = ensure_model(config)?;
    Ok(ModelHandle::new(path).with_shape(config.glyph_shape()))
}

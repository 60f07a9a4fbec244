//! Model management commands.

use aurora_local_ai::{paths, DEFAULT_MODEL_NAME};
use aurora_router::ModelManager;
use indicatif::{ProgressBar, ProgressStyle};

const BAR_LENGTH: u64 = 1000;

/// Pull/download an on-device model.
pub(crate) async fn pull(id: Option<&str>) -> miette::Result<()> {
    let id = id.unwrap_or(DEFAULT_MODEL_NAME);
    let model = ModelManager::find(id).map_err(|e| miette::miette!("{}", e))?;
    let manager = ModelManager::new();

    // Ensure directories exist
    paths::ensure_dirs()
        .map_err(|e| miette::miette!("Failed to create data directories: {}", e))?;

    if manager.is_installed(&model) {
        println!("Model '{}' is already installed.", model.display_name);
        return Ok(());
    }

    println!("Downloading model: {} ({})", model.display_name, model.filename);
    println!("This may take a while depending on your connection...");
    println!();

    let pb = ProgressBar::new(BAR_LENGTH);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% ({eta})")
            .map_err(|e| miette::miette!("Invalid progress bar template: {}", e))?
            .progress_chars("#>-"),
    );

    let mut on_progress = |fraction: f64| {
        pb.set_position((fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64) as u64);
    };
    let result = manager.download(&model, &mut on_progress).await;

    match result {
        Ok(path) => {
            pb.finish_and_clear();
            println!("Model downloaded successfully!");
            println!("Location: {}", path.display());
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            Err(miette::miette!("Failed to download model: {}", e))
        }
    }
}

/// Delete a downloaded model file.
pub(crate) fn remove(id: &str) -> miette::Result<()> {
    let model = ModelManager::find(id).map_err(|e| miette::miette!("{}", e))?;
    let manager = ModelManager::new();

    if !manager.is_installed(&model) {
        println!("Model '{}' is not installed.", model.display_name);
        return Ok(());
    }

    manager
        .remove(&model)
        .map_err(|e| miette::miette!("Failed to remove model: {}", e))?;
    println!("Removed {}.", model.display_name);

    Ok(())
}

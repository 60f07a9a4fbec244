//! Path utilities for Aurora data directories.

use std::path::PathBuf;

/// Get the Aurora data directory (~/.aurora/).
///
/// Falls back to `./.aurora` when no home directory can be determined.
pub fn aurora_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".aurora")
}

/// Get the models directory (~/.aurora/models/).
pub fn models_dir() -> PathBuf {
    aurora_data_dir().join("models")
}

/// Get the bin directory (~/.aurora/bin/).
pub fn bin_dir() -> PathBuf {
    aurora_data_dir().join("bin")
}

/// Get the path to the llama-server binary.
pub fn llama_server_path() -> PathBuf {
    let binary_name = if cfg!(target_os = "windows") {
        "llama-server.exe"
    } else {
        "llama-server"
    };
    bin_dir().join(binary_name)
}

/// Get the path to a model file.
pub fn model_path(filename: &str) -> PathBuf {
    models_dir().join(filename)
}

/// Ensure the Aurora data directories exist.
pub fn ensure_dirs() -> std::io::Result<()> {
    std::fs::create_dir_all(models_dir())?;
    std::fs::create_dir_all(bin_dir())?;
    Ok(())
}

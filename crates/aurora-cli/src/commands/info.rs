//! Info command - show configuration and data paths.

use aurora_local_ai::paths;
use aurora_router::{ModelCatalog, ModelManager, RouterConfig};

pub(crate) fn run() -> miette::Result<()> {
    let config = RouterConfig::from_env();

    println!("Aurora");
    println!("======");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Routing:");
    println!(
        "  Selection service: {} ({})",
        config.selection_url,
        configured(config.has_selection_service())
    );
    println!(
        "  Anthropic API:     {} ({})",
        config.anthropic_url,
        configured(config.has_cloud_access())
    );
    println!("  Router model:      {}", config.router_model);
    println!("  Cost bias:         {}", config.cost_bias);
    println!("  Primary timeout:   {:?}", config.primary_timeout);
    println!();

    println!("Data directory:   {}", paths::aurora_data_dir().display());
    println!("Models directory: {}", paths::models_dir().display());
    println!("Binaries:         {}", paths::bin_dir().display());
    println!();
    println!("Server binary:    {}", paths::llama_server_path().display());
    println!("  Exists: {}", paths::llama_server_path().exists());
    println!("Local port:       {}", config.local_port);
    println!();

    let manager = ModelManager::new();
    println!("On-device models:");
    for model in ModelCatalog::aurora().models().iter().filter(|m| m.is_local()) {
        let installed = ModelManager::find(&model.id)
            .map(|info| manager.is_installed(&info))
            .unwrap_or(false);
        println!("  {:<14} installed: {}", model.id, installed);
    }
    println!();

    let files = manager
        .list_installed()
        .map_err(|e| miette::miette!("Failed to list models: {}", e))?;
    if files.is_empty() {
        println!("No model files in {}", manager.models_dir().display());
    } else {
        println!("Model files:");
        for file in files {
            println!("  - {}", file);
        }
    }

    Ok(())
}

fn configured(yes: bool) -> &'static str {
    if yes {
        "configured"
    } else {
        "no API key"
    }
}

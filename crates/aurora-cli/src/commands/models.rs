//! Models command - list the routing catalog.

use aurora_router::{ModelCatalog, ModelManager};

pub(crate) fn run() -> miette::Result<()> {
    let catalog = ModelCatalog::aurora();
    let manager = ModelManager::new();

    println!("Aurora models (cheapest first):");
    for model in catalog.models() {
        let status = if model.is_local() {
            match ModelManager::find(&model.id) {
                Ok(info) if manager.is_installed(&info) => "installed".to_string(),
                Ok(_) => format!("not downloaded (aurora model pull {})", model.id),
                Err(_) => "no download available".to_string(),
            }
        } else {
            model.dispatch_name().to_string()
        };

        println!(
            "  {:<18} {:<10} {:<6} {}",
            model.id, model.display_name, model.capability, status
        );
    }

    println!();
    println!("Default cloud model: {}", catalog.default_cloud().display_name);
    println!("High-capability model: {}", catalog.high_capability().display_name);

    Ok(())
}

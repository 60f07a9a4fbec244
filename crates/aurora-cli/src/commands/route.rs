//! Route command - show the routing decision for a prompt.

use aurora_router::RouterConfig;

pub(crate) async fn run(prompt: &str, json: bool) -> miette::Result<()> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(miette::miette!("Prompt is empty"));
    }

    let config = RouterConfig::from_env();
    let router = super::build_router(&config)?;
    let decision = router.route(prompt).await;

    if json {
        let output = serde_json::to_string_pretty(&decision)
            .map_err(|e| miette::miette!("Failed to serialize decision: {}", e))?;
        println!("{}", output);
        return Ok(());
    }

    println!("Model:      {} ({})", decision.display_name(), decision.model_id());
    println!("Runs on:    {}", decision.capability());
    println!("Backend:    {}", decision.backend_model_name());
    println!("Decided by: {}", decision.source());
    println!("Rationale:  {}", decision.rationale());

    Ok(())
}

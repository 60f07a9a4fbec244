//! Ask command - answer one prompt and exit.

use aurora_router::RouterConfig;

use crate::render::submit_and_render;

pub(crate) async fn run(prompt: &str) -> miette::Result<()> {
    if prompt.trim().is_empty() {
        return Err(miette::miette!("Prompt is empty"));
    }

    let config = RouterConfig::from_env();
    let session = super::build_session(&config)?;

    submit_and_render(&session, prompt).await;
    Ok(())
}

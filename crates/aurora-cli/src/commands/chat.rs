//! Chat command - interactive conversation.

use aurora_router::RouterConfig;
use std::io::{BufRead, Write};

use crate::render::submit_and_render;

pub(crate) async fn run() -> miette::Result<()> {
    let config = RouterConfig::from_env();
    let session = super::build_session(&config)?;

    println!("Aurora - type a message, or /quit to exit.");
    println!();

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        line.clear();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| miette::miette!("Failed to read input: {}", e))?;
        if read == 0 {
            break;
        }

        let prompt = line.trim();
        if prompt == "/quit" || prompt == "/exit" {
            break;
        }
        if prompt.is_empty() {
            continue;
        }

        submit_and_render(&session, prompt).await;
        println!();
    }

    Ok(())
}

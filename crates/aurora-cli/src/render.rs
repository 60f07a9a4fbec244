//! Terminal rendering of conversation updates.

use aurora_router::{ChatSession, Conversation, Role, RoutingDecision};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Prints assistant turns incrementally as the conversation grows.
struct TurnPrinter {
    next: usize,
    offset: usize,
    header_done: bool,
    spinner: Option<ProgressBar>,
}

impl TurnPrinter {
    fn new(start: usize) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message("Thinking...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        Self {
            next: start,
            offset: 0,
            header_done: false,
            spinner: Some(spinner),
        }
    }

    fn render(&mut self, conversation: &Conversation) {
        let turns = conversation.turns();
        let mut stdout = std::io::stdout();

        while let Some(turn) = turns.get(self.next) {
            if turn.role() == Role::User {
                self.next += 1;
                continue;
            }

            if !self.header_done {
                self.stop_spinner();
                if let Some(rationale) = turn.rationale() {
                    println!("{}", rationale);
                }
                self.header_done = true;
                self.offset = 0;
            }

            let text = turn.text();
            if text.len() > self.offset {
                print!("{}", &text[self.offset..]);
                stdout.flush().ok();
                self.offset = text.len();
            }

            if turn.is_streaming() {
                break;
            }

            println!();
            self.next += 1;
            self.header_done = false;
        }
    }

    fn stop_spinner(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Submit `prompt` and print the answer while it streams in.
pub(crate) async fn submit_and_render(
    session: &ChatSession,
    prompt: &str,
) -> Option<RoutingDecision> {
    let mut rx = session.subscribe();
    let start = rx.borrow_and_update().turns().len();
    let mut printer = TurnPrinter::new(start);

    let submit = session.submit(prompt);
    tokio::pin!(submit);

    let decision = loop {
        tokio::select! {
            decision = &mut submit => break decision,
            Ok(()) = rx.changed() => {
                printer.render(&rx.borrow_and_update());
            }
        }
    };

    printer.render(&session.snapshot());
    printer.stop_spinner();
    decision
}

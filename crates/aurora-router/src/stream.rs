//! Token-stream contract and the simulated-streaming adapter.

use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

/// Consumer side of a dispatch: tokens in arrival order, then one completion.
pub trait TokenSink: Send {
    fn on_token(&mut self, chunk: &str);
    fn on_complete(&mut self);
}

fn think_block() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?is)<think>.*?</think>").expect("think-block pattern is valid")
    })
}

/// Remove every `<think>...</think>` block (markers included) and trim.
pub fn strip_thinking(text: &str) -> String {
    think_block().replace_all(text, "").trim().to_string()
}

/// Split on single spaces, keeping the space on every chunk but the last.
///
/// Concatenating the chunks gives back `text` exactly.
pub fn word_chunks(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(' ')
}

/// Replay a complete response through `sink` one word at a time, pausing
/// `delay` between chunks. Does not signal completion.
pub async fn replay_words(text: &str, delay: Duration, sink: &mut dyn TokenSink) {
    let mut chunks = word_chunks(text).peekable();
    while let Some(chunk) = chunks.next() {
        sink.on_token(chunk);
        if chunks.peek().is_some() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

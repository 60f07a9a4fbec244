//! Scripted engines shared by unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use aurora_local_ai::{LocalAIError, LocalInferenceEngine};

use crate::client::{CloudError, CloudInferenceEngine};
use crate::stream::TokenSink;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub model: String,
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: u32,
}

/// Cloud engine with one canned outcome.
pub(crate) struct ScriptedCloud {
    reply: Result<String, (u16, String)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCloud {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16, message: &str) -> Self {
        Self {
            reply: Err((status, message.to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CloudInferenceEngine for ScriptedCloud {
    async fn complete_raw(
        &self,
        backend_model_name: &str,
        system: Option<&str>,
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, CloudError> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: backend_model_name.to_string(),
            system: system.map(str::to_string),
            prompt: prompt.to_string(),
            max_tokens: max_output_tokens,
        });
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err((status, message)) => Err(CloudError::Api {
                status: *status,
                message: message.clone(),
            }),
        }
    }
}

/// Local engine that emits fixed tokens, or fails after emitting them.
pub(crate) struct ScriptedLocal {
    ready: bool,
    tokens: Vec<String>,
    fail: bool,
    completions: AtomicUsize,
}

impl ScriptedLocal {
    pub fn ready(tokens: &[&str]) -> Self {
        Self {
            ready: true,
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            fail: false,
            completions: AtomicUsize::new(0),
        }
    }

    pub fn not_downloaded() -> Self {
        Self {
            ready: false,
            ..Self::ready(&[])
        }
    }

    pub fn crashing(tokens: &[&str]) -> Self {
        Self {
            fail: true,
            ..Self::ready(tokens)
        }
    }

    pub fn completions(&self) -> usize {
        self.completions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LocalInferenceEngine for ScriptedLocal {
    fn is_ready(&self) -> bool {
        self.ready
    }

    async fn download(
        &self,
        on_progress: &mut (dyn FnMut(f64) + Send),
    ) -> Result<(), LocalAIError> {
        on_progress(1.0);
        Ok(())
    }

    async fn complete(
        &self,
        _prompt: &str,
        on_token: &mut (dyn for<'t> FnMut(&'t str) + Send),
    ) -> Result<(), LocalAIError> {
        self.completions.fetch_add(1, Ordering::SeqCst);
        for token in &self.tokens {
            on_token(token);
            tokio::task::yield_now().await;
        }
        if self.fail {
            return Err(LocalAIError::Api("context overflow".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event {
    Token(String),
    Complete,
}

/// Sink that records every callback in order.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub events: Vec<Event>,
}

impl Recorder {
    pub fn tokens(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Token(t) => Some(t.clone()),
                Event::Complete => None,
            })
            .collect()
    }

    pub fn completions(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Complete).count()
    }
}

impl TokenSink for Recorder {
    fn on_token(&mut self, chunk: &str) {
        self.events.push(Event::Token(chunk.to_string()));
    }

    fn on_complete(&mut self) {
        self.events.push(Event::Complete);
    }
}

//! On-device inference backend for Aurora using llama.cpp.
//!
//! This crate provides the local half of Aurora's model lineup: small models
//! that run on the user's machine through a managed llama-server process.
//! The router only sees the [`LocalInferenceEngine`] trait; download and
//! process lifecycle stay with the surrounding application.

mod client;
mod engine;
mod error;
mod model;
pub mod paths;
mod server;

pub use client::LlamaCppClient;
pub use engine::{LlamaCppEngine, LocalInferenceEngine};
pub use error::LocalAIError;
pub use model::{ModelInfo, ModelManager};
pub use server::LlamaCppServer;

/// Default port for the local llama-server instance.
pub const DEFAULT_PORT: u16 = 11436;

/// Default on-device model id.
pub const DEFAULT_MODEL_NAME: &str = "qwen3-0.6";

/// Context window passed to llama-server.
pub const DEFAULT_CONTEXT_SIZE: u32 = 2048;

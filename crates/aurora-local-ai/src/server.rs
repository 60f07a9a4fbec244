//! Process manager for llama-server.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client::LlamaCppClient;
use crate::error::LocalAIError;
use crate::paths::llama_server_path;
use crate::{DEFAULT_CONTEXT_SIZE, DEFAULT_PORT};

/// Manager for one llama-server process serving one model file.
pub struct LlamaCppServer {
    binary: PathBuf,
    model_path: PathBuf,
    port: u16,
    process: Option<Child>,
}

impl LlamaCppServer {
    /// Create a server manager for a model file, using the installed binary.
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            binary: llama_server_path(),
            model_path: model_path.into(),
            port: DEFAULT_PORT,
            process: None,
        }
    }

    /// Set a custom port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Use a llama-server binary other than `~/.aurora/bin/llama-server`.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Get the port this server is configured to use.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Start the llama-server process.
    pub fn start(&mut self) -> Result<(), LocalAIError> {
        if !self.binary.exists() {
            return Err(LocalAIError::ServerBinaryNotFound(
                self.binary.display().to_string(),
            ));
        }

        if !self.model_path.exists() {
            return Err(LocalAIError::ModelNotFound(
                self.model_path.display().to_string(),
            ));
        }

        info!(
            "Starting llama-server on port {} with model {:?}",
            self.port, self.model_path
        );

        let child = Command::new(&self.binary)
            .arg("--model")
            .arg(&self.model_path)
            .arg("--host")
            .arg("127.0.0.1")
            .arg("--port")
            .arg(self.port.to_string())
            .arg("--ctx-size")
            .arg(DEFAULT_CONTEXT_SIZE.to_string())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LocalAIError::ServerStartFailed(e.to_string()))?;

        debug!("llama-server process started with PID: {}", child.id());
        self.process = Some(child);

        Ok(())
    }

    /// Wait for the server to become ready.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<(), LocalAIError> {
        let client = self.client();
        let start = std::time::Instant::now();
        let check_interval = Duration::from_millis(500);

        info!("Waiting for llama-server to become ready...");

        while start.elapsed() < timeout {
            match client.check_health().await {
                Ok(()) => {
                    info!("llama-server is ready");
                    return Ok(());
                }
                Err(_) => sleep(check_interval).await,
            }
        }

        Err(LocalAIError::ServerStartTimeout)
    }

    /// Stop the server process.
    pub fn stop(&mut self) -> Result<(), LocalAIError> {
        if let Some(mut child) = self.process.take() {
            info!("Stopping llama-server (PID: {})", child.id());

            // Try graceful shutdown first
            #[cfg(unix)]
            {
                unsafe {
                    libc::kill(child.id() as i32, libc::SIGTERM);
                }
                std::thread::sleep(Duration::from_millis(500));
            }

            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!("Server exited with status: {:?}", status);
                }
                Ok(None) => {
                    warn!("Server didn't exit gracefully, killing...");
                    let _ = child.kill();
                    let _ = child.wait();
                }
                Err(e) => {
                    warn!("Error checking server status: {}", e);
                    let _ = child.kill();
                }
            }
        }
        Ok(())
    }

    /// Check if the server process is running.
    pub fn is_running(&mut self) -> bool {
        match self.process.as_mut().map(|child| child.try_wait()) {
            Some(Ok(None)) => true,
            Some(_) => {
                self.process = None;
                false
            }
            None => false,
        }
    }

    /// Get a client connected to this server.
    pub fn client(&self) -> LlamaCppClient {
        LlamaCppClient::with_port(self.port)
    }
}

impl Drop for LlamaCppServer {
    fn drop(&mut self) {
        if self.process.is_some() {
            let _ = self.stop();
        }
    }
}

//! Manual device name entry.
//!
//! When detection fails the resolver asks a [`NamePrompt`]. Interactive
//! programs use [`StdinPrompt`]; services inject [`FixedPrompt`] or
//! [`NoPrompt`] instead of blocking on a console that isn't there.

use crate::error::{DeviceError, DeviceResult};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Message shown when the device name has to be entered by hand.
pub const MANUAL_ENTRY_MESSAGE: &str =
    "Could not detect device name. Please enter your device name manually: ";

/// Source of a manually entered device name.
#[async_trait]
pub trait NamePrompt: Send + Sync {
    /// Asks for a device name, showing `message`.
    async fn ask(&self, message: &str) -> DeviceResult<String>;
}

/// Reads the name from standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinPrompt;

#[async_trait]
impl NamePrompt for StdinPrompt {
    async fn ask(&self, message: &str) -> DeviceResult<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(message.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        if read == 0 {
            return Err(DeviceError::Prompt("standard input closed".to_string()));
        }
        Ok(line)
    }
}

/// Always answers with the same name.
#[derive(Debug, Clone)]
pub struct FixedPrompt(pub String);

#[async_trait]
impl NamePrompt for FixedPrompt {
    async fn ask(&self, _message: &str) -> DeviceResult<String> {
        Ok(self.0.clone())
    }
}

/// Refuses to prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrompt;

#[async_trait]
impl NamePrompt for NoPrompt {
    async fn ask(&self, _message: &str) -> DeviceResult<String> {
        Err(DeviceError::Prompt("interactive input is not available".to_string()))
    }
}

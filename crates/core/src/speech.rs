//! Speech capabilities supplied by the host platform.

use anyhow::Result;
use async_trait::async_trait;

/// Voice preferred for spoken responses.
pub const SPEECH_VOICE: &str = "Google UK English Male";

/// Speech-to-text: captures one utterance.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn capture(&self) -> Result<String>;
}

/// Text-to-speech for response text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
}

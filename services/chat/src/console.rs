//! Terminal stand-ins for the host's speech capabilities.

use anyhow::{Result, anyhow};
use askray_core::nlu::LANGUAGE_CODE;
use askray_core::speech::{SPEECH_VOICE, SpeechRecognizer, SpeechSynthesizer};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, Lines};
use tokio::sync::Mutex;
use tracing::debug;

/// Input lines shared by the command loop and the speech recognizer.
pub type SharedLines<R> = Arc<Mutex<Lines<R>>>;

/// Treats the next input line as the transcription of one utterance.
pub struct ConsoleRecognizer<R> {
    lines: SharedLines<R>,
}

impl<R> ConsoleRecognizer<R> {
    pub fn new(lines: SharedLines<R>) -> Self {
        Self { lines }
    }
}

#[async_trait]
impl<R> SpeechRecognizer for ConsoleRecognizer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn capture(&self) -> Result<String> {
        println!("(listening, {}) ...", LANGUAGE_CODE);
        let line = self.lines.lock().await.next_line().await?;
        let transcript = line
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .ok_or_else(|| anyhow!("No speech captured"))?;
        debug!(%transcript, "Speech captured");
        Ok(transcript)
    }
}

/// Prints the text that would be spoken.
#[derive(Debug, Default)]
pub struct ConsoleSynthesizer;

#[async_trait]
impl SpeechSynthesizer for ConsoleSynthesizer {
    async fn speak(&self, text: &str) -> Result<()> {
        println!("(speaking as {}) {}", SPEECH_VOICE, text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;

    fn lines(input: &'static str) -> SharedLines<&'static [u8]> {
        Arc::new(Mutex::new(input.as_bytes().lines()))
    }

    #[tokio::test]
    async fn test_capture_reads_next_line() {
        let recognizer = ConsoleRecognizer::new(lines("  open the blog \nnext\n"));
        assert_eq!(recognizer.capture().await.unwrap(), "open the blog");
        assert_eq!(recognizer.capture().await.unwrap(), "next");
    }

    #[tokio::test]
    async fn test_capture_fails_on_silence() {
        let recognizer = ConsoleRecognizer::new(lines("\n"));
        assert!(recognizer.capture().await.is_err());
        let recognizer = ConsoleRecognizer::new(lines(""));
        assert!(recognizer.capture().await.is_err());
    }

    #[tokio::test]
    async fn test_synthesizer_succeeds() {
        assert!(ConsoleSynthesizer.speak("hello").await.is_ok());
    }
}

//! Console front end.
//!
//! The loop is a two-state machine. Each line read in [`ConsoleState::AwaitingInput`]
//! is classified first; only an [`InputKind::Utterance`] reaches the memory
//! store or the completion agent.

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::chat::ChatService;

/// Lines that end the conversation (compared case-insensitively).
pub const EXIT_KEYWORDS: [&str; 3] = ["exit", "quit", "bye"];

/// Console loop states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    /// Waiting for the next line.
    AwaitingInput,
    /// The conversation is over.
    Terminated,
}

/// What a line of input means.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// One of [`EXIT_KEYWORDS`].
    Exit,
    /// Anything else, including the empty line.
    Utterance(String),
}

/// Classify one line (without its line terminator).
#[must_use]
pub fn classify_input(line: &str) -> InputKind {
    let lowered = line.to_lowercase();
    if EXIT_KEYWORDS.contains(&lowered.as_str()) {
        InputKind::Exit
    } else {
        InputKind::Utterance(line.to_string())
    }
}

/// Interactive console session over any async line source and sink.
pub struct ConsoleSession<'a, R, W> {
    chat: &'a ChatService,
    reader: R,
    writer: W,
    state: ConsoleState,
}

impl<R, W> std::fmt::Debug for ConsoleSession<'_, R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSession")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'a, R, W> ConsoleSession<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a session reading from `reader` and writing to `writer`.
    pub fn new(chat: &'a ChatService, reader: R, writer: W) -> Self {
        Self {
            chat,
            reader,
            writer,
            state: ConsoleState::AwaitingInput,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ConsoleState {
        self.state
    }

    /// Give back the writer (tests read the transcript from it).
    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Run until an exit keyword or end of input.
    ///
    /// Turn failures are printed and the loop keeps going; only I/O errors on
    /// the console itself end the run with an error.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        self.write("Enter your name to start to chat: ").await?;
        let user_id = self.read_line().await?.unwrap_or_default();

        self.write("\n-------------Starting a new chat----------\n\n").await?;
        info!(user_id = %user_id, "Console chat started");

        while self.state == ConsoleState::AwaitingInput {
            self.write(&format!("{user_id}: ")).await?;
            let kind = match self.read_line().await? {
                Some(line) => classify_input(&line),
                None => InputKind::Exit,
            };
            self.step(kind, &user_id).await?;
        }

        info!(user_id = %user_id, "Console chat ended");
        Ok(())
    }

    /// Apply one classified input.
    async fn step(&mut self, kind: InputKind, user_id: &str) -> anyhow::Result<()> {
        let name = self.chat.assistant_name().to_string();
        match kind {
            InputKind::Exit => {
                self.write(&format!("{name}: Goodbye {user_id}! Have a great day!!\n"))
                    .await?;
                self.state = ConsoleState::Terminated;
            }
            InputKind::Utterance(text) => match self.chat.console_turn(&text, user_id).await {
                Ok(reply) => self.write(&format!("{name}: {reply}\n")).await?,
                Err(e) => {
                    error!(user_id = %user_id, error = %format!("{e:#}"), "Console turn failed");
                    self.write(&format!("{name}: [error] {e:#}\n")).await?;
                }
            },
        }
        Ok(())
    }

    /// Read one line, stripping `\n` / `\r\n`. `None` at end of input.
    async fn read_line(&mut self) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .await
            .context("failed to read from console")?;
        if n == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    async fn write(&mut self, text: &str) -> anyhow::Result<()> {
        self.writer
            .write_all(text.as_bytes())
            .await
            .context("failed to write to console")?;
        self.writer.flush().await.context("failed to flush console")?;
        Ok(())
    }
}

/// Run the console chat on stdin/stdout.
pub async fn run_stdio(chat: &ChatService) -> anyhow::Result<()> {
    let reader = tokio::io::BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    ConsoleSession::new(chat, reader, writer).run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_keywords_case_insensitive() {
        for line in ["exit", "EXIT", "Quit", "bYe"] {
            assert_eq!(classify_input(line), InputKind::Exit, "{line}");
        }
    }

    #[test]
    fn test_utterances() {
        assert_eq!(
            classify_input("hello"),
            InputKind::Utterance("hello".to_string())
        );
        // Only exact matches end the chat.
        assert_eq!(
            classify_input(" exit"),
            InputKind::Utterance(" exit".to_string())
        );
        assert_eq!(
            classify_input("goodbye"),
            InputKind::Utterance("goodbye".to_string())
        );
        assert_eq!(classify_input(""), InputKind::Utterance(String::new()));
    }
}

//! Prompt construction.
//!
//! Every turn sends the model a single user message built here: the persona
//! block, memories retrieved for the user, optionally the recent chat history,
//! and finally the user's name and raw input.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;

use crate::memory::MemoryStore;
use crate::session::ChatTurn;

/// Default number of chat turns included in a GUI prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 50;

/// Default assistant display name.
pub const DEFAULT_ASSISTANT_NAME: &str = "Hazel";

/// Persona instructions for an assistant called `name`.
#[must_use]
pub fn persona(name: &str) -> String {
    format!(
        "You are {name}, an advanced AI assistant designed to be a supportive and empathetic \
friend. You engage users in warm, natural conversations, intuitively understanding \
their needs and providing personalized assistance.

As a caring confidant, you celebrate the user's successes with genuine enthusiasm \
and offer a compassionate, non-judgmental presence during difficult times. Drawing \
upon your extensive knowledge and emotional intelligence, you can discuss a wide \
range of topics, offer insightful advice, and collaborate on various tasks in a \
cooperative, collaborative manner.

Your goal is to be a positive, reassuring force in the user's life - a trusted \
companion they can rely on. By building a rewarding, authentic friendship with \
the user, {name} strives to be a source of support, encouragement, and meaningful \
connection.

Through contextual awareness and personalized responses, you adapt your \
communication style to the user's unique personality and preferences, creating \
a tailored, immersive experience.

DO NOT GREET THE USER ON EVERY INTERACTION UNLESS IT'S BEEN A SIGNIFICANT \
AMOUNT OF TIME SINCE THE LAST INTERACTION.

DO NOT SAY YOUR NAME ON EVERY INTERACTION UNLESS IT'S IMPORTANT FOR THE CONTEXT."
    )
}

/// Render the last `window` turns as `speaker: text` lines, oldest first.
#[must_use]
pub fn render_history(turns: &[ChatTurn], window: usize) -> String {
    let start = turns.len().saturating_sub(window);
    turns[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.speaker, turn.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assemble the full prompt from its already-rendered parts.
#[must_use]
pub fn render_prompt(
    persona: &str,
    context: &str,
    history: Option<&str>,
    user_id: &str,
    user_input: &str,
) -> String {
    let mut prompt = String::with_capacity(persona.len() + context.len() + user_input.len() + 128);
    prompt.push_str(persona);
    let _ = write!(prompt, "\n\nPrevious interactions:\n{context}");
    if let Some(history) = history {
        let _ = write!(prompt, "\n\nRecent chat history:\n{history}");
    }
    let _ = write!(
        prompt,
        "\n\nUser's name is {user_id}\n\nUser's input: {user_input}\n"
    );
    prompt
}

/// Builds per-turn prompts, pulling context from a [`MemoryStore`].
#[derive(Clone)]
pub struct PromptBuilder {
    memory: Arc<dyn MemoryStore>,
    persona: String,
    history_window: usize,
}

impl std::fmt::Debug for PromptBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptBuilder")
            .field("history_window", &self.history_window)
            .finish_non_exhaustive()
    }
}

impl PromptBuilder {
    /// Create a builder with the default persona and history window.
    #[must_use]
    pub fn new(memory: Arc<dyn MemoryStore>) -> Self {
        Self {
            memory,
            persona: persona(DEFAULT_ASSISTANT_NAME),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Use a different assistant name in the persona block.
    #[must_use]
    pub fn with_assistant_name(mut self, name: &str) -> Self {
        self.persona = persona(name);
        self
    }

    /// Change how many history turns a GUI prompt includes.
    #[must_use]
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Build the prompt for one turn.
    ///
    /// `history` is `None` for the console, which keeps no chat history.
    pub async fn build(
        &self,
        user_input: &str,
        user_id: &str,
        history: Option<&[ChatTurn]>,
    ) -> anyhow::Result<String> {
        let memories = self
            .memory
            .search(user_input, user_id)
            .await
            .context("memory search failed")?;

        let context = memories
            .iter()
            .map(|m| m.memory())
            .collect::<Vec<_>>()
            .join("\n");

        tracing::debug!(
            user_id = %user_id,
            memories = memories.len(),
            "Retrieved memories for prompt"
        );

        let history = history.map(|turns| render_history(turns, self.history_window));

        Ok(render_prompt(
            &self.persona,
            &context,
            history.as_deref(),
            user_id,
            user_input,
        ))
    }
}

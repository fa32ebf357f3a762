//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hazel::chat::ChatService;
use hazel::llm::{AgentError, CompletionAgent, Message, Reply};
use hazel::memory::{Embedder, MemoryError, MemoryMatch, MemoryRecord, MemoryStore};

/// Ordered record of collaborator calls, shared between fakes.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Memory store that logs calls and returns canned search results.
#[derive(Debug, Default)]
pub struct RecordingMemory {
    log: CallLog,
    results: Vec<String>,
    fail_search: bool,
    adds: Mutex<Vec<(String, String)>>,
}

impl RecordingMemory {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn with_results(mut self, results: &[&str]) -> Self {
        self.results = results.iter().map(|s| (*s).to_string()).collect();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// `(text, user_id)` pairs passed to `add`, in call order.
    pub fn adds(&self) -> Vec<(String, String)> {
        self.adds.lock().unwrap().clone()
    }
}

#[async_trait]
impl MemoryStore for RecordingMemory {
    async fn search(&self, query: &str, user_id: &str) -> Result<Vec<MemoryMatch>, MemoryError> {
        self.log.push(format!("search:{user_id}:{query}"));
        if self.fail_search {
            return Err(MemoryError::Embedding("index unavailable".to_string()));
        }
        Ok(self
            .results
            .iter()
            .map(|memory| MemoryMatch {
                record: MemoryRecord {
                    memory: memory.clone(),
                    user_id: user_id.to_string(),
                    created_at: "2024-01-01T00:00:00Z".to_string(),
                },
                score: 1.0,
            })
            .collect())
    }

    async fn add(&self, text: &str, user_id: &str) -> Result<(), MemoryError> {
        self.log.push(format!("add:{user_id}:{text}"));
        self.adds
            .lock()
            .unwrap()
            .push((text.to_string(), user_id.to_string()));
        Ok(())
    }
}

/// Completion agent that returns a fixed reply (or fails) and keeps every request.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    log: CallLog,
    reply: String,
    fail: bool,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedAgent {
    pub fn new(log: CallLog, reply: &str) -> Self {
        Self {
            log,
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn failing(log: CallLog) -> Self {
        Self {
            log,
            fail: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionAgent for ScriptedAgent {
    async fn generate_reply(&self, messages: Vec<Message>) -> Result<Reply, AgentError> {
        self.log.push("complete");
        self.requests.lock().unwrap().push(messages);
        if self.fail {
            return Err(AgentError::Api {
                status: 503,
                body: "model overloaded".to_string(),
            });
        }
        Ok(Reply {
            content: self.reply.clone(),
        })
    }
}

/// Fakes wired into a [`ChatService`].
pub struct Harness {
    pub log: CallLog,
    pub memory: Arc<RecordingMemory>,
    pub agent: Arc<ScriptedAgent>,
    pub chat: ChatService,
}

impl Harness {
    pub fn new(memory: RecordingMemory, agent: ScriptedAgent, log: CallLog) -> Self {
        let memory = Arc::new(memory);
        let agent = Arc::new(agent);
        let chat = ChatService::new(memory.clone(), agent.clone());
        Self {
            log,
            memory,
            agent,
            chat,
        }
    }

    /// No memories, fixed reply.
    pub fn replying(reply: &str) -> Self {
        let log = CallLog::default();
        Self::new(
            RecordingMemory::new(log.clone()),
            ScriptedAgent::new(log.clone(), reply),
            log,
        )
    }

    /// The single user message of the n-th completion request.
    pub fn prompt(&self, n: usize) -> String {
        let requests = self.agent.requests();
        assert_eq!(requests[n].len(), 1, "expected a single message");
        requests[n][0].content.clone()
    }
}

/// Deterministic bag-of-words embedder: each lowercase word bumps one of 64 buckets.
#[derive(Debug, Default)]
pub struct HashingEmbedder;

impl HashingEmbedder {
    fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; 64];
        for word in text.split_whitespace() {
            let word = word
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if word.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            v[(hasher.finish() % 64) as usize] += 1.0;
        }
        v
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, MemoryError> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

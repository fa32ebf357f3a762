//! Command line and layered configuration.

use std::env;
use std::path::Path;
use std::time::Duration;

use clap::{Parser, Subcommand};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

use crate::llm::{LlmSettings, Provider};
use crate::memory::VectorMemoryOptions;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Chat in the terminal (the default)
    Chat,
    /// Serve the web GUI
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },
}

impl Cli {
    /// The selected subcommand, `chat` when none was given.
    #[must_use]
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HazelConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Idle GUI sessions are dropped after this many seconds.
    pub session_timeout_secs: u64,
}

#[derive(Deserialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub system_message: String,
    pub assistant_name: String,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("system_message", &self.system_message)
            .field("assistant_name", &self.assistant_name)
            .finish()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MemoryConfig {
    /// `SurrealDB` endpoint, e.g. `surrealkv://hazel_db` or `mem://`.
    pub path: String,
    pub collection: String,
    pub search_limit: usize,
    pub min_score: f32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Most recent chat turns included in GUI prompts.
    pub history_window: usize,
}

impl HazelConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args).map_err(|e| ConfigError::Message(e.to_string()))?;
        Self::load(&cli)
    }

    /// Build the configuration for already parsed command line arguments.
    ///
    /// Priority, highest first: CLI flags, `GROQ_API_KEY`, `HAZEL__*`
    /// variables, the config file, defaults.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 7860)?
            .set_default("server.session_timeout_secs", 1800)?
            .set_default("llm.base_url", "https://api.groq.com/openai")?
            .set_default("llm.model", "llama-3.1-8b-instant")?
            .set_default("llm.system_message", "You are a an AI friend chatbot")?
            .set_default("llm.assistant_name", "Hazel")?
            .set_default("memory.path", "surrealkv://hazel_db")?
            .set_default("memory.collection", "ai_friend_chatbot_memory")?
            .set_default("memory.search_limit", 100)?
            .set_default("memory.min_score", 0.0)?
            .set_default("chat.history_window", 50)?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(Path::new(path)).required(true)),
            None => builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false)),
        };

        // E.g. HAZEL__SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("HAZEL")
                .separator("__")
                .try_parsing(true),
        );

        if let Ok(key) = env::var("GROQ_API_KEY") {
            if !key.trim().is_empty() {
                builder = builder.set_override("llm.api_key", key)?;
            }
        }

        if let Some(Command::Serve { host, port }) = &cli.command {
            if let Some(host) = host {
                builder = builder.set_override("server.host", host.as_str())?;
            }
            if let Some(port) = port {
                builder = builder.set_override("server.port", i64::from(*port))?;
            }
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.base_url.trim().is_empty() {
            return Err(ConfigError::Message("llm.base_url cannot be empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Message("llm.model cannot be empty".to_string()));
        }
        if self.memory.collection.trim().is_empty() {
            return Err(ConfigError::Message(
                "memory.collection cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings for the completion agent; the provider is detected from the base URL.
    #[must_use]
    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            base_url: self.llm.base_url.clone(),
            api_key: self.llm.api_key.clone(),
            model: self.llm.model.clone(),
            provider: Provider::detect_from_url(&self.llm.base_url),
            system_message: self.llm.system_message.clone(),
        }
    }

    #[must_use]
    pub fn memory_options(&self) -> VectorMemoryOptions {
        VectorMemoryOptions {
            collection: self.memory.collection.clone(),
            search_limit: self.memory.search_limit,
            min_score: self.memory.min_score,
        }
    }

    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.server.session_timeout_secs)
    }
}

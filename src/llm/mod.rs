pub mod agents;

use std::time::Duration;

use async_trait::async_trait;

use crate::classify::Classifier;
use crate::error::{Error, Result};
use crate::storage::repository;
use crate::storage::Database;

pub const DEFAULT_PROVIDER: &str = "bedrock";
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// A remote text-generation engine: prompt in, raw text out.
#[async_trait(?Send)]
pub trait CompletionEngine {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait(?Send)]
impl CompletionEngine for mixtape_core::Agent {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self
            .run(prompt)
            .await
            .map_err(|e| Error::Llm(e.to_string()))?;
        Ok(response.text().trim().to_string())
    }
}

/// LLM settings read from `app_config`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub provider: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmSettings {
    pub async fn load(db: &Database) -> Result<Self> {
        let (provider, model, timeout) = db
            .reader()
            .call(|conn| {
                let provider = repository::get_config(conn, "llm_provider")?;
                let model = repository::get_config(conn, "llm_model")?;
                let timeout = repository::get_config(conn, "llm_timeout_secs")?;
                Ok::<_, rusqlite::Error>((provider, model, timeout))
            })
            .await?;

        let timeout_secs = match timeout {
            Some(t) => t.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("llm_timeout_secs must be a whole number, got {t:?}"))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            provider: provider.unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn is_disabled(&self) -> bool {
        self.provider == "none"
    }
}

/// Build the classifier from config. Falls back to keyword rules alone when
/// the LLM is disabled, misconfigured, or the agent cannot be constructed.
/// Only a failure to read the store is an error.
pub async fn create_classifier(db: &Database) -> Result<Classifier> {
    let settings = match LlmSettings::load(db).await {
        Ok(settings) => settings,
        Err(Error::Config(msg)) => {
            log::warn!("Ignoring LLM settings ({msg}); using keyword rules");
            return Ok(Classifier::keywords_only());
        }
        Err(e) => return Err(e),
    };
    if settings.is_disabled() {
        log::info!("LLM classification disabled; using keyword rules");
        return Ok(Classifier::keywords_only());
    }

    match build_agent(&settings.provider, &settings.model).await {
        Ok(agent) => {
            let suggester = agents::classify::LlmSuggester::new(Box::new(agent), settings.timeout);
            Ok(Classifier::new(Box::new(suggester)))
        }
        Err(e) => {
            log::warn!("Could not create LLM agent ({e}); using keyword rules");
            Ok(Classifier::keywords_only())
        }
    }
}

async fn build_agent(provider: &str, model_name: &str) -> Result<mixtape_core::Agent> {
    // Each combination needs its own builder call since the model types are different.
    match (provider, model_name) {
        ("bedrock", "claude-sonnet-4-5" | "sonnet") => mixtape_core::Agent::builder()
            .bedrock(mixtape_core::ClaudeSonnet4_5)
            .build()
            .await
            .map_err(|e| Error::Llm(e.to_string())),
        ("bedrock", _) => mixtape_core::Agent::builder()
            .bedrock(mixtape_core::ClaudeHaiku4_5)
            .build()
            .await
            .map_err(|e| Error::Llm(e.to_string())),
        ("anthropic", "claude-sonnet-4-5" | "sonnet") => mixtape_core::Agent::builder()
            .anthropic_from_env(mixtape_core::ClaudeSonnet4_5)
            .build()
            .await
            .map_err(|e| Error::Llm(e.to_string())),
        ("anthropic", _) => mixtape_core::Agent::builder()
            .anthropic_from_env(mixtape_core::ClaudeHaiku4_5)
            .build()
            .await
            .map_err(|e| Error::Llm(e.to_string())),
        (other, _) => Err(Error::Config(format!("unknown llm_provider: {other}"))),
    }
}

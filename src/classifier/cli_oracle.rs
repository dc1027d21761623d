//! AI CLI oracle
//!
//! Runs a local AI CLI (claude / codex / gemini) once per description in
//! non-interactive mode and returns its text answer.

use super::Classifier;
use crate::ai_provider::AiProvider;
use crate::config::Config;
use crate::error::{BoqError, Result};
use boq_tagger_common::build_classification_prompt;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Clone)]
pub struct CliClassifier {
    provider: AiProvider,
    model: Option<String>,
    timeout: Duration,
}

impl CliClassifier {
    pub fn new(provider: AiProvider, model: Option<String>, timeout: Duration) -> Self {
        Self { provider, model, timeout }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.provider, config.model.clone(), config.timeout())
    }

    async fn run_cli(&self, prompt: &str) -> Result<String> {
        let args = self.provider.prompt_args(prompt, self.model.as_deref());

        // Windows resolves the CLI shims through cmd
        #[cfg(windows)]
        let mut command = {
            let mut c = Command::new("cmd");
            c.arg("/c").arg(self.provider.command_name()).args(&args);
            c
        };

        #[cfg(not(windows))]
        let mut command = {
            let mut c = Command::new(self.provider.command_name());
            c.args(&args);
            c
        };

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| BoqError::OracleTimeout(self.timeout.as_secs()))?
            .map_err(|e| {
                BoqError::Oracle(format!("{} could not be started: {}", self.provider, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BoqError::Oracle(format!(
                "{} failed (code {:?}): {}",
                self.provider,
                output.status.code(),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Classifier for CliClassifier {
    async fn classify(&self, description: &str, allowed: &[String]) -> Result<String> {
        // Single-line prompt
        let prompt = build_classification_prompt(description, allowed).replace('\n', " ");
        let response = self.run_cli(&prompt).await?;
        parse_answer(&response)
    }

    fn cache_identity(&self) -> String {
        format!("{}:{}", self.provider, self.model.as_deref().unwrap_or_default())
    }
}

/// Trimmed answer text; an empty answer is an oracle failure
fn parse_answer(response: &str) -> Result<String> {
    let answer = response.trim();
    if answer.is_empty() {
        return Err(BoqError::Oracle("empty response".into()));
    }
    Ok(answer.to_string())
}

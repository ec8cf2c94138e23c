//! HTTP scoring oracle.
//!
//! Talks to an OpenAI-compatible chat-completions endpoint. The prompt
//! embeds the objective, a page-text excerpt and the indexed candidate
//! list; the model is asked for a JSON array of candidate indices.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;
use webscout_core_types::Candidate;

use crate::errors::OracleError;
use crate::ScoringOracle;

#[derive(Clone, Debug)]
pub struct HttpOracleConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// How many candidates the oracle is asked to keep.
    pub max_results: usize,
    pub timeout: Duration,
}

impl HttpOracleConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: api_key.into(),
            model: "gpt-4o-mini".to_string(),
            max_results: 8,
            timeout: Duration::from_secs(30),
        }
    }
}

pub struct HttpOracle {
    client: reqwest::Client,
    config: HttpOracleConfig,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl HttpOracle {
    pub fn new(config: HttpOracleConfig) -> Result<Self, OracleError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| OracleError::NotConfigured(err.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ScoringOracle for HttpOracle {
    async fn score(
        &self,
        candidates: &[Candidate],
        page_text: &str,
        objective: &str,
    ) -> Result<Vec<usize>, OracleError> {
        let prompt = build_prompt(candidates, page_text, objective, self.config.max_results);

        let body = json!({
            "model": self.config.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0,
        });

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or(OracleError::EmptyChoice)?;

        let indices = parse_index_list(content, candidates.len())?;
        debug!(kept = indices.len(), "oracle ranked candidates");
        Ok(indices)
    }
}

fn build_prompt(
    candidates: &[Candidate],
    page_text: &str,
    objective: &str,
    max_results: usize,
) -> String {
    let listing: String = candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| {
            format!(
                "{index}. {} (\"{}\")\n",
                candidate.reference,
                candidate.text.as_deref().unwrap_or_default()
            )
        })
        .collect();

    format!(
        "You are an expert web crawler. Based on the following page text and the \
user's objective, identify the top {max_results} most important calls-to-action \
(CTAs) from the provided list of candidates.\n\n\
Objective: \"{objective}\"\n\n\
Page text:\n```\n{page_text}\n```\n\n\
Candidate references (with their visible text):\n{listing}\n\
Respond with a JSON array of the integer indices corresponding to the best CTAs \
from the list above. For example: [0, 5, 12]"
    )
}

/// Parse the model's index array, tolerating markdown code fences.
/// Indices outside the candidate range are discarded.
fn parse_index_list(content: &str, candidate_count: usize) -> Result<Vec<usize>, OracleError> {
    let cleaned = content
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string();

    let raw: Vec<i64> = serde_json::from_str(&cleaned)
        .map_err(|err| OracleError::Malformed(format!("{err}: {cleaned}")))?;

    Ok(raw
        .into_iter()
        .filter(|&index| index >= 0 && (index as usize) < candidate_count)
        .map(|index| index as usize)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_candidates_with_indices() {
        let candidates = vec![
            Candidate::with_text("#pay", "Pay now"),
            Candidate::new("#skip"),
        ];
        let prompt = build_prompt(&candidates, "body", "explore payments", 8);

        assert!(prompt.contains("Objective: \"explore payments\""));
        assert!(prompt.contains("0. #pay (\"Pay now\")"));
        assert!(prompt.contains("1. #skip (\"\")"));
    }

    #[test]
    fn index_list_parses_with_and_without_fences() {
        assert_eq!(parse_index_list("[0, 2]", 3).expect("plain"), vec![0, 2]);
        assert_eq!(
            parse_index_list("```json\n[1, 0]\n```", 3).expect("fenced"),
            vec![1, 0]
        );
    }

    #[test]
    fn out_of_range_indices_are_discarded() {
        assert_eq!(
            parse_index_list("[0, 7, -1, 2]", 3).expect("parse"),
            vec![0, 2]
        );
    }

    #[test]
    fn garbage_content_is_malformed() {
        assert!(matches!(
            parse_index_list("pick the first one", 3),
            Err(OracleError::Malformed(_))
        ));
    }
}

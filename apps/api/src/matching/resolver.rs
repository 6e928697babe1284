//! Match Resolver — the swappable seam in front of the external model.
//!
//! `AppState` holds an `Arc<dyn MatchResolver>`; the server wires `LlmMatchResolver`.

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::{LlmClient, LlmError};
use crate::matching::prompts::{MATCH_PROMPT_TEMPLATE, MATCH_SYSTEM};
use crate::matching::{parse_match_response, MatchResult};
use crate::models::profile::ProfileInventory;

/// Decides which profile items fit a job description.
///
/// Implementations make at most one external call per invocation and never retry.
/// A response that violates the match contract is `AppError::MatchContract`.
#[async_trait]
pub trait MatchResolver: Send + Sync {
    async fn resolve(
        &self,
        inventory: &ProfileInventory,
        job_description: &str,
    ) -> Result<MatchResult, AppError>;
}

/// Resolver backed by the Anthropic Messages API.
pub struct LlmMatchResolver {
    llm: LlmClient,
}

impl LlmMatchResolver {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl MatchResolver for LlmMatchResolver {
    async fn resolve(
        &self,
        inventory: &ProfileInventory,
        job_description: &str,
    ) -> Result<MatchResult, AppError> {
        let prompt = build_match_prompt(inventory, job_description)?;

        info!(
            "Resolving matches with {}: {} skills, {} projects, {} experiences",
            self.llm.model(),
            inventory.skills.len(),
            inventory.projects.len(),
            inventory.experiences.len()
        );

        let text = self
            .llm
            .call_text(&prompt, MATCH_SYSTEM)
            .await
            .map_err(|e| match e {
                LlmError::EmptyContent => {
                    AppError::MatchContract("model returned no text".to_string())
                }
                other => AppError::Llm(format!("Match resolution failed: {other}")),
            })?;

        parse_match_response(&text)
    }
}

/// Fills the match template with the serialized collections and the job text.
pub fn build_match_prompt(
    inventory: &ProfileInventory,
    job_description: &str,
) -> Result<String, AppError> {
    let serialize = |value: serde_json::Value, what: &str| {
        serde_json::to_string_pretty(&value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to serialize {what}: {e}")))
    };

    let skills = serialize(
        json!(inventory
            .skills
            .iter()
            .map(|s| json!({"id": s.id, "name": s.name}))
            .collect::<Vec<_>>()),
        "skills",
    )?;
    let projects = serialize(
        json!(inventory
            .projects
            .iter()
            .map(|p| json!({"id": p.id, "name": p.name, "description": p.description}))
            .collect::<Vec<_>>()),
        "projects",
    )?;
    let experiences = serialize(
        json!(inventory
            .experiences
            .iter()
            .map(|e| json!({
                "id": e.id,
                "position": e.position,
                "company": e.company,
                "duration": e.duration,
                "description": e.description,
            }))
            .collect::<Vec<_>>()),
        "experiences",
    )?;

    Ok(fill_template(
        MATCH_PROMPT_TEMPLATE,
        &[
            ("{skills}", skills.as_str()),
            ("{projects}", projects.as_str()),
            ("{experiences}", experiences.as_str()),
            ("{job_description}", job_description),
        ],
    ))
}

/// Substitutes placeholders in one left-to-right pass over `template`. Inserted values
/// are never scanned again, so user text that looks like a placeholder stays as written.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut filled = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter_map(|&(placeholder, value)| {
                rest.find(placeholder).map(|at| (at, placeholder, value))
            })
            .min_by_key(|&(at, _, _)| at);

        match next {
            Some((at, placeholder, value)) => {
                filled.push_str(&rest[..at]);
                filled.push_str(value);
                rest = &rest[at + placeholder.len()..];
            }
            None => {
                filled.push_str(rest);
                return filled;
            }
        }
    }
}

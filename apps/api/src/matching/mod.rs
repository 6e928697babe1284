//! Job-to-profile matching: the response contract of the external model, the
//! resolver seam, and match-set persistence.
//!
//! Flow: `resolver.resolve()` → `MatchResult::restricted_to()` → `apply_matches()`.

pub mod persistence;
pub mod prompts;
pub mod resolver;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::AppError;
use crate::llm_client::strip_json_fences;
use crate::models::job::{ExperienceMatch, MatchSet, ProjectMatch, SkillMatch};
use crate::models::profile::ProfileInventory;

pub use persistence::apply_matches;
pub use resolver::{LlmMatchResolver, MatchResolver};

/// Which profile items fit a job, plus job-specific rewrites of item descriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub matched_skill_ids: Vec<i64>,
    pub matched_project_ids: Vec<i64>,
    pub matched_experience_ids: Vec<i64>,
    /// Keyed by project or experience id.
    pub improved_descriptions: BTreeMap<i64, String>,
}

/// Wire shape of the model's answer. The three id arrays are mandatory.
#[derive(Debug, Deserialize)]
struct RawMatchResponse {
    matched_skill_ids: Vec<RawId>,
    matched_project_ids: Vec<RawId>,
    matched_experience_ids: Vec<RawId>,
    #[serde(default)]
    improved_descriptions: Option<HashMap<String, Option<String>>>,
}

/// Models quote ids about as often as they don't.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_id(self, field: &str) -> Result<i64, AppError> {
        match self {
            RawId::Number(id) => Ok(id),
            RawId::Text(text) => text.trim().parse::<i64>().map_err(|_| {
                AppError::MatchContract(format!("{field} contains non-numeric id {text:?}"))
            }),
        }
    }
}

fn convert_ids(raw: Vec<RawId>, field: &str) -> Result<Vec<i64>, AppError> {
    raw.into_iter().map(|id| id.into_id(field)).collect()
}

/// Parses the model's text answer into a `MatchResult`.
///
/// Fenced or bare JSON is accepted. Anything that is not a JSON object carrying the
/// three `matched_*_ids` arrays is a contract violation; there is no partial result.
pub fn parse_match_response(text: &str) -> Result<MatchResult, AppError> {
    let json = strip_json_fences(text);
    let raw: RawMatchResponse = serde_json::from_str(json)
        .map_err(|e| AppError::MatchContract(format!("response is not a match object: {e}")))?;

    let mut improved_descriptions = BTreeMap::new();
    for (key, text) in raw.improved_descriptions.unwrap_or_default() {
        let Some(text) = text else {
            continue;
        };
        // Rewrites are optional: a bad key costs only its own entry.
        match key.trim().parse::<i64>() {
            Ok(id) => {
                improved_descriptions.insert(id, text);
            }
            Err(_) => warn!("Dropping improved_descriptions entry with non-numeric key {key:?}"),
        }
    }

    Ok(MatchResult {
        matched_skill_ids: convert_ids(raw.matched_skill_ids, "matched_skill_ids")?,
        matched_project_ids: convert_ids(raw.matched_project_ids, "matched_project_ids")?,
        matched_experience_ids: convert_ids(raw.matched_experience_ids, "matched_experience_ids")?,
        improved_descriptions,
    })
}

/// Keeps ids that exist in `known`, in first-seen order, without duplicates.
fn retain_known(ids: &[i64], known: &HashSet<i64>, field: &str) -> Vec<i64> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(ids.len());
    for &id in ids {
        if !known.contains(&id) {
            warn!("Dropping {field} id {id}: not in the submitted profile");
            continue;
        }
        if seen.insert(id) {
            kept.push(id);
        }
    }
    kept
}

impl MatchResult {
    /// Drops ids that are not part of `inventory` and rewrites that do not belong to a
    /// matched project or experience. Blank rewrites are discarded.
    pub fn restricted_to(self, inventory: &ProfileInventory) -> MatchResult {
        let skill_ids: HashSet<i64> = inventory.skills.iter().map(|s| s.id).collect();
        let project_ids: HashSet<i64> = inventory.projects.iter().map(|p| p.id).collect();
        let experience_ids: HashSet<i64> = inventory.experiences.iter().map(|e| e.id).collect();

        let matched_skill_ids = retain_known(&self.matched_skill_ids, &skill_ids, "skill");
        let matched_project_ids =
            retain_known(&self.matched_project_ids, &project_ids, "project");
        let matched_experience_ids =
            retain_known(&self.matched_experience_ids, &experience_ids, "experience");

        let rewritable: HashSet<i64> = matched_project_ids
            .iter()
            .chain(matched_experience_ids.iter())
            .copied()
            .collect();
        let improved_descriptions = self
            .improved_descriptions
            .into_iter()
            .filter(|(id, text)| rewritable.contains(id) && !text.trim().is_empty())
            .collect();

        MatchResult {
            matched_skill_ids,
            matched_project_ids,
            matched_experience_ids,
            improved_descriptions,
        }
    }

    /// Join rows for `job_id`.
    pub fn to_match_set(&self, job_id: i64) -> MatchSet {
        MatchSet {
            skills: self
                .matched_skill_ids
                .iter()
                .map(|&skill_id| SkillMatch { job_id, skill_id })
                .collect(),
            projects: self
                .matched_project_ids
                .iter()
                .map(|&project_id| ProjectMatch {
                    job_id,
                    project_id,
                    improved_description: self.improved_descriptions.get(&project_id).cloned(),
                })
                .collect(),
            experiences: self
                .matched_experience_ids
                .iter()
                .map(|&experience_id| ExperienceMatch {
                    job_id,
                    experience_id,
                    improved_description: self.improved_descriptions.get(&experience_id).cloned(),
                })
                .collect(),
        }
    }
}

//! Resume State Reconciler. Decides what the editor shows for a (profile, job) pair.
//!
//! Precedence:
//! 1. the saved snapshot, verbatim (job title/company only fill gaps in its header);
//! 2. the profile's items narrowed to the job's match set, with rewritten descriptions;
//! 3. when the job has no match rows at all, every item unfiltered.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::job::{Job, MatchSet};
use crate::models::profile::{ProfileInventory, Project, Skill, UserProfile, WorkExperience};
use crate::models::resume::{PersonalInfo, ResumeSnapshot, ResumeState};
use crate::profile::service::load_inventory;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewSource {
    /// Explicitly saved by the user.
    Snapshot,
    /// Narrowed by the job's match set.
    Matched,
    /// No match rows: the full inventory.
    Unfiltered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeView {
    pub job_id: i64,
    pub source: ViewSource,
    #[serde(flatten)]
    pub resume: ResumeState,
    /// Set when the view comes from a snapshot.
    pub saved_at: Option<DateTime<Utc>>,
}

/// Profile items selected by a match set, rewrites applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchedItems {
    pub skills: Vec<Skill>,
    pub projects: Vec<Project>,
    pub experiences: Vec<WorkExperience>,
}

fn with_override(stored: &str, improved: Option<&Option<String>>) -> String {
    match improved {
        Some(Some(text)) if !text.trim().is_empty() => text.clone(),
        _ => stored.to_string(),
    }
}

/// Intersects the inventory with `matches`. Items keep inventory order; the inventory
/// itself is not modified.
pub fn matched_items(inventory: &ProfileInventory, matches: &MatchSet) -> MatchedItems {
    let skill_ids: HashSet<i64> = matches.skills.iter().map(|m| m.skill_id).collect();
    let project_overrides: HashMap<i64, Option<String>> = matches
        .projects
        .iter()
        .map(|m| (m.project_id, m.improved_description.clone()))
        .collect();
    let experience_overrides: HashMap<i64, Option<String>> = matches
        .experiences
        .iter()
        .map(|m| (m.experience_id, m.improved_description.clone()))
        .collect();

    MatchedItems {
        skills: inventory
            .skills
            .iter()
            .filter(|s| skill_ids.contains(&s.id))
            .cloned()
            .collect(),
        projects: inventory
            .projects
            .iter()
            .filter(|p| project_overrides.contains_key(&p.id))
            .map(|p| Project {
                description: with_override(&p.description, project_overrides.get(&p.id)),
                ..p.clone()
            })
            .collect(),
        experiences: inventory
            .experiences
            .iter()
            .filter(|e| experience_overrides.contains_key(&e.id))
            .map(|e| WorkExperience {
                description: with_override(&e.description, experience_overrides.get(&e.id)),
                ..e.clone()
            })
            .collect(),
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Header for an unsaved view: profile contact details plus the target job.
pub fn personal_block(profile: Option<&UserProfile>, job: &Job) -> PersonalInfo {
    PersonalInfo {
        name: profile.map(|p| p.name.clone()).unwrap_or_default(),
        email: profile.map(|p| p.email.clone()).unwrap_or_default(),
        phone: profile.and_then(|p| p.phone.clone()),
        title: Some(job.title.clone()),
        company: Some(job.company.clone()),
    }
}

/// A saved snapshot as a view. Only a missing title/company is taken from the job.
pub fn snapshot_view(job: &Job, snapshot: ResumeSnapshot) -> ResumeView {
    let mut resume = snapshot.state;
    if is_blank(&resume.personal.title) {
        resume.personal.title = Some(job.title.clone());
    }
    if is_blank(&resume.personal.company) {
        resume.personal.company = Some(job.company.clone());
    }
    ResumeView {
        job_id: job.id,
        source: ViewSource::Snapshot,
        resume,
        saved_at: Some(snapshot.updated_at),
    }
}

/// A view computed from live profile data. Education is never narrowed.
pub fn unsaved_view(
    job: &Job,
    profile: Option<&UserProfile>,
    inventory: ProfileInventory,
    matches: &MatchSet,
) -> ResumeView {
    let personal = personal_block(profile, job);

    if matches.is_empty() {
        return ResumeView {
            job_id: job.id,
            source: ViewSource::Unfiltered,
            resume: ResumeState {
                personal,
                skills: inventory.skills,
                experiences: inventory.experiences,
                projects: inventory.projects,
                education: inventory.education,
            },
            saved_at: None,
        };
    }

    let matched = matched_items(&inventory, matches);
    ResumeView {
        job_id: job.id,
        source: ViewSource::Matched,
        resume: ResumeState {
            personal,
            skills: matched.skills,
            experiences: matched.experiences,
            projects: matched.projects,
            education: inventory.education,
        },
        saved_at: None,
    }
}

/// `loadResumeView`: the resume a (profile, job) pair should currently show.
pub async fn load_resume_view<S>(
    store: &S,
    profile_id: &str,
    job_id: i64,
) -> Result<ResumeView, AppError>
where
    S: Store + ?Sized,
{
    let job = store
        .get_job(profile_id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    if let Some(snapshot) = store.get_snapshot(job_id, profile_id).await? {
        return Ok(snapshot_view(&job, snapshot));
    }

    let (profile, inventory, matches) = tokio::try_join!(
        store.get_profile(profile_id),
        load_inventory(store, profile_id),
        store.get_matches(job_id),
    )?;

    Ok(unsaved_view(&job, profile.as_ref(), inventory, &matches))
}

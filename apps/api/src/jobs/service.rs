//! Job lifecycle. Creating a job with a description runs the resolver and persists
//! the job together with its match set; a resolver failure creates nothing.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{required_text, AppError};
use crate::matching::{apply_matches, MatchResolver, MatchResult};
use crate::models::job::{Job, JobUpdate, NewJob};
use crate::profile::service::load_inventory;
use crate::store::{JobRepository, Store};

#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedJob {
    #[serde(flatten)]
    pub job: Job,
    /// `None` for a job created without a description.
    pub matches: Option<MatchResult>,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Combines the text of an uploaded PDF with pasted text. At least one must be present.
pub fn upload_description(
    pdf_text: Option<&str>,
    pasted_text: Option<&str>,
) -> Result<String, AppError> {
    match (non_blank(pdf_text), non_blank(pasted_text)) {
        (Some(pdf), Some(pasted)) => Ok(format!("{pdf}\n\n{pasted}")),
        (Some(text), None) | (None, Some(text)) => Ok(text),
        (None, None) => Err(AppError::Validation(
            "Provide a job PDF or job text".to_string(),
        )),
    }
}

/// Validates a create request. A blank description counts as absent.
pub fn validate_new_job(
    profile_id: &str,
    request: &CreateJobRequest,
    source_document_key: Option<String>,
) -> Result<NewJob, AppError> {
    Ok(NewJob {
        profile_id: profile_id.to_string(),
        title: required_text("title", &request.title)?,
        company: required_text("company", &request.company)?,
        raw_description: non_blank(request.description.as_deref()),
        source_document_key,
    })
}

/// `createJob`: stores the job and, when it has a description, its match set.
///
/// The resolver runs before anything is written, so a model or contract failure
/// leaves neither a job nor match rows behind.
pub async fn create_job<S>(
    store: &S,
    resolver: &dyn MatchResolver,
    new: NewJob,
) -> Result<CreatedJob, AppError>
where
    S: Store + ?Sized,
{
    let matches = match new.raw_description.as_deref() {
        Some(description) => {
            let inventory = load_inventory(store, &new.profile_id).await?;
            let result = resolver
                .resolve(&inventory, description)
                .await?
                .restricted_to(&inventory);
            Some(result)
        }
        None => None,
    };

    let job = store.create_job(&new, matches.as_ref()).await?;
    match &matches {
        Some(m) => info!(
            "Created job {} for {}: {} skills, {} projects, {} experiences matched",
            job.id,
            job.profile_id,
            m.matched_skill_ids.len(),
            m.matched_project_ids.len(),
            m.matched_experience_ids.len()
        ),
        None => info!("Created job {} for {} without a description", job.id, job.profile_id),
    }

    Ok(CreatedJob { job, matches })
}

/// Looks up a job owned by `profile_id`.
pub async fn require_job<S>(store: &S, profile_id: &str, job_id: i64) -> Result<Job, AppError>
where
    S: JobRepository + ?Sized,
{
    store
        .get_job(profile_id, job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

/// Re-runs matching for an existing job and replaces its match set.
/// A saved snapshot is left untouched.
pub async fn rematch_job<S>(
    store: &S,
    resolver: &dyn MatchResolver,
    profile_id: &str,
    job_id: i64,
) -> Result<MatchResult, AppError>
where
    S: Store + ?Sized,
{
    let job = require_job(store, profile_id, job_id).await?;
    let description = non_blank(job.raw_description.as_deref()).ok_or_else(|| {
        AppError::Validation(format!("Job {job_id} has no description to match against"))
    })?;

    let inventory = load_inventory(store, profile_id).await?;
    let result = resolver
        .resolve(&inventory, &description)
        .await?
        .restricted_to(&inventory);
    apply_matches(store, job_id, &result).await?;
    Ok(result)
}

/// Replaces title, company and description. Existing matches are kept.
pub async fn update_job<S>(
    store: &S,
    profile_id: &str,
    job_id: i64,
    update: &JobUpdate,
) -> Result<Job, AppError>
where
    S: JobRepository + ?Sized,
{
    let update = JobUpdate {
        title: required_text("title", &update.title)?,
        company: required_text("company", &update.company)?,
        raw_description: required_text("raw_description", &update.raw_description)?,
    };
    store
        .update_job(profile_id, job_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

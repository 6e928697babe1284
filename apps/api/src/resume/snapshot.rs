//! Snapshot Store write path. Reads go through the reconciler.

use tracing::info;

use crate::errors::AppError;
use crate::models::resume::{ResumeSnapshot, ResumeState};
use crate::store::Store;

/// `saveSnapshot`: stores `state` as the resume of (job, profile), replacing any
/// earlier save. The job must belong to the profile.
pub async fn save_snapshot<S>(
    store: &S,
    profile_id: &str,
    job_id: i64,
    state: &ResumeState,
) -> Result<ResumeSnapshot, AppError>
where
    S: Store + ?Sized,
{
    if store.get_job(profile_id, job_id).await?.is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let snapshot = store.upsert_snapshot(job_id, profile_id, state).await?;
    info!(
        "Saved resume snapshot for job {job_id}: {} skills, {} experiences, {} projects, {} education",
        state.skills.len(),
        state.experiences.len(),
        state.projects.len(),
        state.education.len()
    );
    Ok(snapshot)
}

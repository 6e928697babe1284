//! Match Persistence: replaces a job's match set.

use tracing::info;

use crate::errors::AppError;
use crate::matching::MatchResult;
use crate::models::job::MatchSet;
use crate::store::MatchRepository;

/// Replaces every match row of `job_id` with the rows of `result`.
///
/// Delete-then-insert inside one storage transaction: replaying the same result leaves
/// the same rows, and a failure leaves the previous set in place.
pub async fn apply_matches<S>(
    store: &S,
    job_id: i64,
    result: &MatchResult,
) -> Result<MatchSet, AppError>
where
    S: MatchRepository + ?Sized,
{
    let set = store.replace_matches(job_id, result).await?;
    info!(
        "Stored {} match rows for job {job_id}: {} skills, {} projects, {} experiences",
        set.len(),
        set.skills.len(),
        set.projects.len(),
        set.experiences.len()
    );
    Ok(set)
}

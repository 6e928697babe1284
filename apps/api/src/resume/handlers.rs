//! Axum route handlers for per-job resumes.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::auth::AuthProfile;
use crate::errors::AppError;
use crate::models::resume::{ResumeSnapshot, ResumeState};
use crate::resume::export::render_resume_md;
use crate::resume::reconciler::{load_resume_view, ResumeView};
use crate::resume::snapshot::save_snapshot;
use crate::state::AppState;

/// GET /api/v1/resumes/:job_id
/// Saved snapshot if one exists, otherwise the match-filtered profile.
pub async fn handle_get_resume(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(job_id): Path<i64>,
) -> Result<Json<ResumeView>, AppError> {
    let view = load_resume_view(state.store.as_ref(), &profile_id, job_id).await?;
    Ok(Json(view))
}

/// PUT /api/v1/resumes/:job_id
pub async fn handle_save_resume(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(job_id): Path<i64>,
    Json(resume): Json<ResumeState>,
) -> Result<Json<ResumeSnapshot>, AppError> {
    let snapshot = save_snapshot(state.store.as_ref(), &profile_id, job_id, &resume).await?;
    Ok(Json(snapshot))
}

/// GET /api/v1/resumes/:job_id/export
/// The current view as a markdown document.
pub async fn handle_export_resume(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(job_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let view = load_resume_view(state.store.as_ref(), &profile_id, job_id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_resume_md(&view),
    ))
}

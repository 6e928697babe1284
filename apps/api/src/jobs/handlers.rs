//! Axum route handlers for jobs and their match sets.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;

use crate::auth::AuthProfile;
use crate::errors::AppError;
use crate::jobs::documents::{archive_job_pdf, discard_job_pdf, extract_pdf_text};
use crate::jobs::service::{
    create_job, rematch_job, require_job, update_job, upload_description, validate_new_job,
    CreateJobRequest, CreatedJob,
};
use crate::matching::MatchResult;
use crate::models::job::{Job, JobSummary, JobUpdate};
use crate::profile::service::load_inventory;
use crate::resume::reconciler::{matched_items, MatchedItems};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct JobMatchesResponse {
    pub job: Job,
    #[serde(flatten)]
    pub items: MatchedItems,
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
) -> Result<Json<Vec<JobSummary>>, AppError> {
    Ok(Json(state.store.list_jobs(&profile_id).await?))
}

/// POST /api/v1/jobs
/// Runs matching before responding when a description is given.
pub async fn handle_create_job(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<CreatedJob>), AppError> {
    let new = validate_new_job(&profile_id, &req, None)?;
    let created = create_job(state.store.as_ref(), state.resolver.as_ref(), new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Default)]
struct JobUpload {
    title: String,
    company: String,
    job_text: Option<String>,
    job_pdf: Option<Bytes>,
}

async fn read_upload(mut multipart: Multipart, max_bytes: usize) -> Result<JobUpload, AppError> {
    let mut upload = JobUpload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
    {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("job_pdf") => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Read error: {e}")))?;
                if data.len() > max_bytes {
                    return Err(AppError::Validation(format!(
                        "job_pdf exceeds the {max_bytes} byte limit"
                    )));
                }
                if !data.is_empty() {
                    upload.job_pdf = Some(data);
                }
            }
            Some(name @ ("title" | "company" | "job_text")) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Read error: {e}")))?;
                match name {
                    "title" => upload.title = text,
                    "company" => upload.company = text,
                    _ => upload.job_text = Some(text),
                }
            }
            _ => {}
        }
    }

    Ok(upload)
}

/// POST /api/v1/jobs/upload
/// Multipart: `title`, `company`, and `job_pdf` and/or `job_text`.
/// The PDF is archived in S3; its key is stored on the job.
pub async fn handle_upload_job(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedJob>), AppError> {
    let upload = read_upload(multipart, state.config.max_upload_bytes).await?;

    let mut new = validate_new_job(
        &profile_id,
        &CreateJobRequest {
            title: upload.title,
            company: upload.company,
            description: None,
        },
        None,
    )?;

    let pdf_text = match &upload.job_pdf {
        Some(pdf) => Some(extract_pdf_text(pdf.clone()).await?),
        None => None,
    };
    new.raw_description = Some(upload_description(
        pdf_text.as_deref(),
        upload.job_text.as_deref(),
    )?);

    if let Some(pdf) = upload.job_pdf {
        new.source_document_key =
            Some(archive_job_pdf(&state.s3, &state.config.s3_bucket, &profile_id, pdf).await?);
    }
    let document_key = new.source_document_key.clone();

    match create_job(state.store.as_ref(), state.resolver.as_ref(), new).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(e) => {
            if let Some(key) = document_key {
                discard_job_pdf(&state.s3, &state.config.s3_bucket, &key).await;
            }
            Err(e)
        }
    }
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(job_id): Path<i64>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(
        require_job(state.store.as_ref(), &profile_id, job_id).await?,
    ))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(job_id): Path<i64>,
    Json(req): Json<JobUpdate>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(
        update_job(state.store.as_ref(), &profile_id, job_id, &req).await?,
    ))
}

/// DELETE /api/v1/jobs/:id
/// Match rows and the saved snapshot go with the job.
pub async fn handle_delete_job(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(job_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let job = require_job(state.store.as_ref(), &profile_id, job_id).await?;
    if !state.store.delete_job(&profile_id, job_id).await? {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }
    if let Some(key) = job.source_document_key {
        discard_job_pdf(&state.s3, &state.config.s3_bucket, &key).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/jobs/:id/match
pub async fn handle_rematch_job(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(job_id): Path<i64>,
) -> Result<Json<MatchResult>, AppError> {
    let result = rematch_job(
        state.store.as_ref(),
        state.resolver.as_ref(),
        &profile_id,
        job_id,
    )
    .await?;
    Ok(Json(result))
}

/// GET /api/v1/jobs/:id/matches
/// Only the matched items, rewritten descriptions applied.
pub async fn handle_get_job_matches(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(job_id): Path<i64>,
) -> Result<Json<JobMatchesResponse>, AppError> {
    let store = state.store.as_ref();
    let job = require_job(store, &profile_id, job_id).await?;
    let (inventory, matches) = tokio::try_join!(
        load_inventory(store, &profile_id),
        store.get_matches(job_id),
    )?;
    Ok(Json(JobMatchesResponse {
        job,
        items: matched_items(&inventory, &matches),
    }))
}

//! Axum route handlers for the profile and its collections.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthProfile;
use crate::errors::{required_text, AppError};
use crate::models::profile::{
    Education, NewEducation, NewExperience, NewProject, ProfileInventory, Project, Skill,
    UserProfile, WorkExperience,
};
use crate::profile::service::{
    load_inventory, save_manual_entry, validate_education, validate_experience,
    validate_project, ManualEntryRequest, ManualEntryResponse,
};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: Option<UserProfile>,
    #[serde(flatten)]
    pub inventory: ProfileInventory,
}

#[derive(Debug, Deserialize)]
pub struct PersonalRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NewSkillRequest {
    pub name: String,
}

fn deleted(found: bool, what: &str, id: i64) -> Result<StatusCode, AppError> {
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("{what} {id} not found")))
    }
}

/// GET /api/v1/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
) -> Result<Json<ProfileResponse>, AppError> {
    let store = state.store.as_ref();
    let (profile, inventory) = tokio::try_join!(
        store.get_profile(&profile_id),
        load_inventory(store, &profile_id),
    )?;
    Ok(Json(ProfileResponse { profile, inventory }))
}

/// PUT /api/v1/profile
pub async fn handle_put_profile(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Json(req): Json<PersonalRequest>,
) -> Result<Json<UserProfile>, AppError> {
    let profile = UserProfile {
        profile_id,
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        phone: req
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from),
    };
    Ok(Json(state.store.upsert_profile(&profile).await?))
}

/// POST /api/v1/profile/manual-entry
pub async fn handle_manual_entry(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Json(req): Json<ManualEntryRequest>,
) -> Result<Json<ManualEntryResponse>, AppError> {
    let response = save_manual_entry(state.store.as_ref(), &profile_id, &req).await?;
    Ok(Json(response))
}

// ── Skills ──────────────────────────────────────────────────────────────────

/// GET /api/v1/profile/skills
pub async fn handle_list_skills(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
) -> Result<Json<Vec<Skill>>, AppError> {
    Ok(Json(state.store.list_skills(&profile_id).await?))
}

/// POST /api/v1/profile/skills
pub async fn handle_add_skill(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Json(req): Json<NewSkillRequest>,
) -> Result<(StatusCode, Json<Skill>), AppError> {
    let name = required_text("name", &req.name)?;
    let skill = state.store.add_skill(&profile_id, &name).await?;
    Ok((StatusCode::CREATED, Json(skill)))
}

/// DELETE /api/v1/profile/skills/:id
pub async fn handle_delete_skill(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(state.store.delete_skill(&profile_id, id).await?, "Skill", id)
}

// ── Projects ────────────────────────────────────────────────────────────────

/// GET /api/v1/profile/projects
pub async fn handle_list_projects(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
) -> Result<Json<Vec<Project>>, AppError> {
    Ok(Json(state.store.list_projects(&profile_id).await?))
}

/// POST /api/v1/profile/projects
pub async fn handle_create_project(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Json(req): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), AppError> {
    let new = validate_project(&req)?;
    let project = state.store.create_project(&profile_id, &new).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/v1/profile/projects/:id
pub async fn handle_update_project(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(id): Path<i64>,
    Json(req): Json<NewProject>,
) -> Result<Json<Project>, AppError> {
    let update = validate_project(&req)?;
    state
        .store
        .update_project(&profile_id, id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Project {id} not found")))
}

/// DELETE /api/v1/profile/projects/:id
pub async fn handle_delete_project(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(state.store.delete_project(&profile_id, id).await?, "Project", id)
}

// ── Work experience ─────────────────────────────────────────────────────────

/// GET /api/v1/profile/experiences
pub async fn handle_list_experiences(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
) -> Result<Json<Vec<WorkExperience>>, AppError> {
    Ok(Json(state.store.list_experiences(&profile_id).await?))
}

/// POST /api/v1/profile/experiences
pub async fn handle_create_experience(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Json(req): Json<NewExperience>,
) -> Result<(StatusCode, Json<WorkExperience>), AppError> {
    let new = validate_experience(&req)?;
    let experience = state.store.create_experience(&profile_id, &new).await?;
    Ok((StatusCode::CREATED, Json(experience)))
}

/// PUT /api/v1/profile/experiences/:id
pub async fn handle_update_experience(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(id): Path<i64>,
    Json(req): Json<NewExperience>,
) -> Result<Json<WorkExperience>, AppError> {
    let update = validate_experience(&req)?;
    state
        .store
        .update_experience(&profile_id, id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Experience {id} not found")))
}

/// DELETE /api/v1/profile/experiences/:id
pub async fn handle_delete_experience(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(
        state.store.delete_experience(&profile_id, id).await?,
        "Experience",
        id,
    )
}

// ── Education ───────────────────────────────────────────────────────────────

/// GET /api/v1/profile/education
pub async fn handle_list_education(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
) -> Result<Json<Vec<Education>>, AppError> {
    Ok(Json(state.store.list_education(&profile_id).await?))
}

/// POST /api/v1/profile/education
pub async fn handle_create_education(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Json(req): Json<NewEducation>,
) -> Result<(StatusCode, Json<Education>), AppError> {
    let new = validate_education(&req)?;
    let education = state.store.create_education(&profile_id, &new).await?;
    Ok((StatusCode::CREATED, Json(education)))
}

/// PUT /api/v1/profile/education/:id
pub async fn handle_update_education(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(id): Path<i64>,
    Json(req): Json<NewEducation>,
) -> Result<Json<Education>, AppError> {
    let update = validate_education(&req)?;
    state
        .store
        .update_education(&profile_id, id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Education {id} not found")))
}

/// DELETE /api/v1/profile/education/:id
pub async fn handle_delete_education(
    State(state): State<AppState>,
    AuthProfile(profile_id): AuthProfile,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    deleted(
        state.store.delete_education(&profile_id, id).await?,
        "Education",
        id,
    )
}

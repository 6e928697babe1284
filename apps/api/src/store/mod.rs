//! Storage seam. Every component reads and writes through these traits; the server
//! runs on `PgStore` and the tests on `MemoryStore`.
//!
//! `AppState` carries one `Arc<dyn Store>` built at startup.

use async_trait::async_trait;

use crate::errors::AppError;
use crate::matching::MatchResult;
use crate::models::job::{Job, JobSummary, JobUpdate, MatchSet, NewJob};
use crate::models::profile::{
    Education, NewEducation, NewExperience, NewProject, Project, Skill, UserProfile,
    WorkExperience,
};
use crate::models::resume::{ResumeSnapshot, ResumeState};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[cfg(test)]
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Profile block and the four owned collections.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get_profile(&self, profile_id: &str) -> Result<Option<UserProfile>, AppError>;

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError>;

    async fn list_skills(&self, profile_id: &str) -> Result<Vec<Skill>, AppError>;

    /// Adds a skill; an existing skill with the same name is returned instead.
    async fn add_skill(&self, profile_id: &str, name: &str) -> Result<Skill, AppError>;

    async fn delete_skill(&self, profile_id: &str, skill_id: i64) -> Result<bool, AppError>;

    async fn list_projects(&self, profile_id: &str) -> Result<Vec<Project>, AppError>;

    async fn create_project(&self, profile_id: &str, new: &NewProject)
        -> Result<Project, AppError>;

    async fn update_project(
        &self,
        profile_id: &str,
        project_id: i64,
        update: &NewProject,
    ) -> Result<Option<Project>, AppError>;

    async fn delete_project(&self, profile_id: &str, project_id: i64) -> Result<bool, AppError>;

    async fn list_experiences(&self, profile_id: &str) -> Result<Vec<WorkExperience>, AppError>;

    async fn create_experience(
        &self,
        profile_id: &str,
        new: &NewExperience,
    ) -> Result<WorkExperience, AppError>;

    async fn update_experience(
        &self,
        profile_id: &str,
        experience_id: i64,
        update: &NewExperience,
    ) -> Result<Option<WorkExperience>, AppError>;

    async fn delete_experience(&self, profile_id: &str, experience_id: i64)
        -> Result<bool, AppError>;

    async fn list_education(&self, profile_id: &str) -> Result<Vec<Education>, AppError>;

    async fn create_education(
        &self,
        profile_id: &str,
        new: &NewEducation,
    ) -> Result<Education, AppError>;

    async fn update_education(
        &self,
        profile_id: &str,
        education_id: i64,
        update: &NewEducation,
    ) -> Result<Option<Education>, AppError>;

    async fn delete_education(&self, profile_id: &str, education_id: i64)
        -> Result<bool, AppError>;
}

/// Job records. Lookups are always scoped to the owning profile.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Newest first.
    async fn list_jobs(&self, profile_id: &str) -> Result<Vec<JobSummary>, AppError>;

    async fn get_job(&self, profile_id: &str, job_id: i64) -> Result<Option<Job>, AppError>;

    /// Inserts the job and, when given, its match rows in one transaction.
    async fn create_job(&self, new: &NewJob, matches: Option<&MatchResult>)
        -> Result<Job, AppError>;

    async fn update_job(
        &self,
        profile_id: &str,
        job_id: i64,
        update: &JobUpdate,
    ) -> Result<Option<Job>, AppError>;

    /// Deletes the job together with its match rows and snapshot.
    async fn delete_job(&self, profile_id: &str, job_id: i64) -> Result<bool, AppError>;
}

/// Skill/project/experience match relations of a job.
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Clears every match row of the job and inserts the rows of `result`,
    /// all or nothing.
    async fn replace_matches(&self, job_id: i64, result: &MatchResult)
        -> Result<MatchSet, AppError>;

    async fn get_matches(&self, job_id: i64) -> Result<MatchSet, AppError>;
}

/// Saved resume state, one row per (job, profile).
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn get_snapshot(
        &self,
        job_id: i64,
        profile_id: &str,
    ) -> Result<Option<ResumeSnapshot>, AppError>;

    async fn upsert_snapshot(
        &self,
        job_id: i64,
        profile_id: &str,
        state: &ResumeState,
    ) -> Result<ResumeSnapshot, AppError>;
}

pub trait Store: ProfileRepository + JobRepository + MatchRepository + SnapshotRepository {}

impl<T> Store for T where
    T: ProfileRepository + JobRepository + MatchRepository + SnapshotRepository
{
}

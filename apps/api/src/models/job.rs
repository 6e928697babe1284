use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One tailoring attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub profile_id: String,
    pub title: String,
    pub company: String,
    pub raw_description: Option<String>,
    /// S3 key of the uploaded job PDF, when the description came from a file.
    pub source_document_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Dashboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct JobSummary {
    pub id: i64,
    pub title: String,
    pub company: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewJob {
    pub profile_id: String,
    pub title: String,
    pub company: String,
    pub raw_description: Option<String>,
    pub source_document_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobUpdate {
    pub title: String,
    pub company: String,
    pub raw_description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct SkillMatch {
    pub job_id: i64,
    pub skill_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ProjectMatch {
    pub job_id: i64,
    pub project_id: i64,
    pub improved_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExperienceMatch {
    pub job_id: i64,
    pub experience_id: i64,
    pub improved_description: Option<String>,
}

/// The materialized match relations of a single job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSet {
    pub skills: Vec<SkillMatch>,
    pub projects: Vec<ProjectMatch>,
    pub experiences: Vec<ExperienceMatch>,
}

impl MatchSet {
    /// True when matching never ran (or matched nothing) for the job.
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.projects.is_empty() && self.experiences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.skills.len() + self.projects.len() + self.experiences.len()
    }
}

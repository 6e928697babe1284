use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::debug;

use crate::errors::AppError;
use crate::matching::MatchResult;
use crate::models::job::{
    ExperienceMatch, Job, JobSummary, JobUpdate, MatchSet, NewJob, ProjectMatch, SkillMatch,
};
use crate::models::profile::{
    Education, NewEducation, NewExperience, NewProject, Project, Skill, UserProfile,
    WorkExperience,
};
use crate::models::resume::{PersonalInfo, ResumeSnapshot, ResumeState};
use crate::store::{JobRepository, MatchRepository, ProfileRepository, SnapshotRepository};

const JOB_COLUMNS: &str =
    "id, profile_id, title, company, raw_description, source_document_key, created_at, updated_at";

/// PostgreSQL implementation of every repository trait, sharing one pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SnapshotRecord {
    job_id: i64,
    profile_id: String,
    personal: Json<PersonalInfo>,
    skills: Json<Vec<Skill>>,
    experiences: Json<Vec<WorkExperience>>,
    projects: Json<Vec<Project>>,
    education: Json<Vec<Education>>,
    updated_at: DateTime<Utc>,
}

impl From<SnapshotRecord> for ResumeSnapshot {
    fn from(record: SnapshotRecord) -> Self {
        ResumeSnapshot {
            job_id: record.job_id,
            profile_id: record.profile_id,
            state: ResumeState {
                personal: record.personal.0,
                skills: record.skills.0,
                experiences: record.experiences.0,
                projects: record.projects.0,
                education: record.education.0,
            },
            updated_at: record.updated_at,
        }
    }
}

/// Writes the rows of `set` inside an open transaction. Callers clear old rows first.
async fn insert_match_rows(
    tx: &mut Transaction<'_, Postgres>,
    set: &MatchSet,
) -> Result<(), sqlx::Error> {
    for row in &set.skills {
        sqlx::query("INSERT INTO skill_matches (job_id, skill_id) VALUES ($1, $2)")
            .bind(row.job_id)
            .bind(row.skill_id)
            .execute(&mut **tx)
            .await?;
    }
    for row in &set.projects {
        sqlx::query(
            "INSERT INTO project_matches (job_id, project_id, improved_description) VALUES ($1, $2, $3)",
        )
        .bind(row.job_id)
        .bind(row.project_id)
        .bind(&row.improved_description)
        .execute(&mut **tx)
        .await?;
    }
    for row in &set.experiences {
        sqlx::query(
            "INSERT INTO experience_matches (job_id, experience_id, improved_description) VALUES ($1, $2, $3)",
        )
        .bind(row.job_id)
        .bind(row.experience_id)
        .bind(&row.improved_description)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn get_profile(&self, profile_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(sqlx::query_as::<_, UserProfile>(
            "SELECT profile_id, name, email, phone FROM user_profiles WHERE profile_id = $1",
        )
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        Ok(sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (profile_id, name, email, phone)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (profile_id) DO UPDATE
                SET name = EXCLUDED.name, email = EXCLUDED.email, phone = EXCLUDED.phone
            RETURNING profile_id, name, email, phone
            "#,
        )
        .bind(&profile.profile_id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn list_skills(&self, profile_id: &str) -> Result<Vec<Skill>, AppError> {
        Ok(sqlx::query_as::<_, Skill>(
            "SELECT id, name FROM skills WHERE profile_id = $1 ORDER BY id",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn add_skill(&self, profile_id: &str, name: &str) -> Result<Skill, AppError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        Ok(sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (profile_id, name) VALUES ($1, $2)
            ON CONFLICT (profile_id, name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name
            "#,
        )
        .bind(profile_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_skill(&self, profile_id: &str, skill_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM skills WHERE id = $1 AND profile_id = $2")
            .bind(skill_id)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(&self, profile_id: &str) -> Result<Vec<Project>, AppError> {
        Ok(sqlx::query_as::<_, Project>(
            "SELECT id, name, description, link FROM projects WHERE profile_id = $1 ORDER BY id",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_project(
        &self,
        profile_id: &str,
        new: &NewProject,
    ) -> Result<Project, AppError> {
        Ok(sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (profile_id, name, description, link)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, link
            "#,
        )
        .bind(profile_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.link)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_project(
        &self,
        profile_id: &str,
        project_id: i64,
        update: &NewProject,
    ) -> Result<Option<Project>, AppError> {
        Ok(sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects SET name = $3, description = $4, link = $5
            WHERE id = $1 AND profile_id = $2
            RETURNING id, name, description, link
            "#,
        )
        .bind(project_id)
        .bind(profile_id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.link)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_project(&self, profile_id: &str, project_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND profile_id = $2")
            .bind(project_id)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_experiences(&self, profile_id: &str) -> Result<Vec<WorkExperience>, AppError> {
        Ok(sqlx::query_as::<_, WorkExperience>(
            r#"
            SELECT id, position, company, duration, description
            FROM work_experiences WHERE profile_id = $1 ORDER BY id
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_experience(
        &self,
        profile_id: &str,
        new: &NewExperience,
    ) -> Result<WorkExperience, AppError> {
        Ok(sqlx::query_as::<_, WorkExperience>(
            r#"
            INSERT INTO work_experiences (profile_id, position, company, duration, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, position, company, duration, description
            "#,
        )
        .bind(profile_id)
        .bind(&new.position)
        .bind(&new.company)
        .bind(&new.duration)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_experience(
        &self,
        profile_id: &str,
        experience_id: i64,
        update: &NewExperience,
    ) -> Result<Option<WorkExperience>, AppError> {
        Ok(sqlx::query_as::<_, WorkExperience>(
            r#"
            UPDATE work_experiences
            SET position = $3, company = $4, duration = $5, description = $6
            WHERE id = $1 AND profile_id = $2
            RETURNING id, position, company, duration, description
            "#,
        )
        .bind(experience_id)
        .bind(profile_id)
        .bind(&update.position)
        .bind(&update.company)
        .bind(&update.duration)
        .bind(&update.description)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_experience(
        &self,
        profile_id: &str,
        experience_id: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM work_experiences WHERE id = $1 AND profile_id = $2")
            .bind(experience_id)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_education(&self, profile_id: &str) -> Result<Vec<Education>, AppError> {
        Ok(sqlx::query_as::<_, Education>(
            "SELECT id, degree, institution, year FROM education WHERE profile_id = $1 ORDER BY id",
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_education(
        &self,
        profile_id: &str,
        new: &NewEducation,
    ) -> Result<Education, AppError> {
        Ok(sqlx::query_as::<_, Education>(
            r#"
            INSERT INTO education (profile_id, degree, institution, year)
            VALUES ($1, $2, $3, $4)
            RETURNING id, degree, institution, year
            "#,
        )
        .bind(profile_id)
        .bind(&new.degree)
        .bind(&new.institution)
        .bind(&new.year)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_education(
        &self,
        profile_id: &str,
        education_id: i64,
        update: &NewEducation,
    ) -> Result<Option<Education>, AppError> {
        Ok(sqlx::query_as::<_, Education>(
            r#"
            UPDATE education SET degree = $3, institution = $4, year = $5
            WHERE id = $1 AND profile_id = $2
            RETURNING id, degree, institution, year
            "#,
        )
        .bind(education_id)
        .bind(profile_id)
        .bind(&update.degree)
        .bind(&update.institution)
        .bind(&update.year)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_education(
        &self,
        profile_id: &str,
        education_id: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM education WHERE id = $1 AND profile_id = $2")
            .bind(education_id)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl JobRepository for PgStore {
    async fn list_jobs(&self, profile_id: &str) -> Result<Vec<JobSummary>, AppError> {
        Ok(sqlx::query_as::<_, JobSummary>(
            r#"
            SELECT id, title, company, created_at
            FROM job_descriptions
            WHERE profile_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_job(&self, profile_id: &str, job_id: i64) -> Result<Option<Job>, AppError> {
        Ok(sqlx::query_as::<_, Job>(&format!(
            "SELECT {JOB_COLUMNS} FROM job_descriptions WHERE id = $1 AND profile_id = $2"
        ))
        .bind(job_id)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_job(
        &self,
        new: &NewJob,
        matches: Option<&MatchResult>,
    ) -> Result<Job, AppError> {
        let mut tx = self.pool.begin().await?;

        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO job_descriptions
                (profile_id, title, company, raw_description, source_document_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(&new.profile_id)
        .bind(&new.title)
        .bind(&new.company)
        .bind(&new.raw_description)
        .bind(&new.source_document_key)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(result) = matches {
            insert_match_rows(&mut tx, &result.to_match_set(job.id)).await?;
        }

        tx.commit().await?;
        Ok(job)
    }

    async fn update_job(
        &self,
        profile_id: &str,
        job_id: i64,
        update: &JobUpdate,
    ) -> Result<Option<Job>, AppError> {
        Ok(sqlx::query_as::<_, Job>(&format!(
            r#"
            UPDATE job_descriptions
            SET title = $3, company = $4, raw_description = $5, updated_at = now()
            WHERE id = $1 AND profile_id = $2
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(job_id)
        .bind(profile_id)
        .bind(&update.title)
        .bind(&update.company)
        .bind(&update.raw_description)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_job(&self, profile_id: &str, job_id: i64) -> Result<bool, AppError> {
        // Match rows and the snapshot go with it (ON DELETE CASCADE).
        let result = sqlx::query("DELETE FROM job_descriptions WHERE id = $1 AND profile_id = $2")
            .bind(job_id)
            .bind(profile_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl MatchRepository for PgStore {
    async fn replace_matches(
        &self,
        job_id: i64,
        result: &MatchResult,
    ) -> Result<MatchSet, AppError> {
        let set = result.to_match_set(job_id);
        let mut tx = self.pool.begin().await?;

        for table in ["skill_matches", "project_matches", "experience_matches"] {
            let cleared = sqlx::query(&format!("DELETE FROM {table} WHERE job_id = $1"))
                .bind(job_id)
                .execute(&mut *tx)
                .await?;
            debug!(
                "Cleared {} rows from {table} for job {job_id}",
                cleared.rows_affected()
            );
        }

        insert_match_rows(&mut tx, &set).await?;
        tx.commit().await?;

        Ok(set)
    }

    async fn get_matches(&self, job_id: i64) -> Result<MatchSet, AppError> {
        let (skills, projects, experiences) = tokio::try_join!(
            sqlx::query_as::<_, SkillMatch>(
                "SELECT job_id, skill_id FROM skill_matches WHERE job_id = $1 ORDER BY skill_id",
            )
            .bind(job_id)
            .fetch_all(&self.pool),
            sqlx::query_as::<_, ProjectMatch>(
                r#"
                SELECT job_id, project_id, improved_description
                FROM project_matches WHERE job_id = $1 ORDER BY project_id
                "#,
            )
            .bind(job_id)
            .fetch_all(&self.pool),
            sqlx::query_as::<_, ExperienceMatch>(
                r#"
                SELECT job_id, experience_id, improved_description
                FROM experience_matches WHERE job_id = $1 ORDER BY experience_id
                "#,
            )
            .bind(job_id)
            .fetch_all(&self.pool),
        )?;

        Ok(MatchSet {
            skills,
            projects,
            experiences,
        })
    }
}

#[async_trait]
impl SnapshotRepository for PgStore {
    async fn get_snapshot(
        &self,
        job_id: i64,
        profile_id: &str,
    ) -> Result<Option<ResumeSnapshot>, AppError> {
        let record = sqlx::query_as::<_, SnapshotRecord>(
            r#"
            SELECT job_id, profile_id, personal, skills, experiences, projects, education, updated_at
            FROM resume_snapshots
            WHERE job_id = $1 AND profile_id = $2
            "#,
        )
        .bind(job_id)
        .bind(profile_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(ResumeSnapshot::from))
    }

    async fn upsert_snapshot(
        &self,
        job_id: i64,
        profile_id: &str,
        state: &ResumeState,
    ) -> Result<ResumeSnapshot, AppError> {
        // Single statement against the (job_id, profile_id) primary key, so concurrent
        // saves cannot produce a second row.
        let record = sqlx::query_as::<_, SnapshotRecord>(
            r#"
            INSERT INTO resume_snapshots
                (job_id, profile_id, personal, skills, experiences, projects, education, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now())
            ON CONFLICT (job_id, profile_id) DO UPDATE SET
                personal = EXCLUDED.personal,
                skills = EXCLUDED.skills,
                experiences = EXCLUDED.experiences,
                projects = EXCLUDED.projects,
                education = EXCLUDED.education,
                updated_at = now()
            RETURNING job_id, profile_id, personal, skills, experiences, projects, education, updated_at
            "#,
        )
        .bind(job_id)
        .bind(profile_id)
        .bind(Json(&state.personal))
        .bind(Json(&state.skills))
        .bind(Json(&state.experiences))
        .bind(Json(&state.projects))
        .bind(Json(&state.education))
        .fetch_one(&self.pool)
        .await?;

        Ok(record.into())
    }
}

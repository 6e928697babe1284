//! In-process store mirroring the Postgres schema's keys and cascades.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::errors::AppError;
use crate::matching::MatchResult;
use crate::models::job::{Job, JobSummary, JobUpdate, MatchSet, NewJob};
use crate::models::profile::{
    Education, NewEducation, NewExperience, NewProject, Project, Skill, UserProfile,
    WorkExperience,
};
use crate::models::resume::{ResumeSnapshot, ResumeState};
use crate::store::{JobRepository, MatchRepository, ProfileRepository, SnapshotRepository};

#[derive(Default)]
struct Tables {
    next_id: i64,
    profiles: BTreeMap<String, UserProfile>,
    skills: BTreeMap<i64, (String, Skill)>,
    projects: BTreeMap<i64, (String, Project)>,
    experiences: BTreeMap<i64, (String, WorkExperience)>,
    education: BTreeMap<i64, (String, Education)>,
    jobs: BTreeMap<i64, Job>,
    matches: BTreeMap<i64, MatchSet>,
    snapshots: BTreeMap<(i64, String), ResumeSnapshot>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn drop_item_matches(&mut self, item_id: i64) {
        for set in self.matches.values_mut() {
            set.skills.retain(|m| m.skill_id != item_id);
            set.projects.retain(|m| m.project_id != item_id);
            set.experiences.retain(|m| m.experience_id != item_id);
        }
    }
}

fn owned<T: Clone>(rows: &BTreeMap<i64, (String, T)>, profile_id: &str) -> Vec<T> {
    rows.values()
        .filter(|(owner, _)| owner == profile_id)
        .map(|(_, row)| row.clone())
        .collect()
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot_count(&self) -> usize {
        self.lock().snapshots.len()
    }

    pub fn job_count(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn match_row_count(&self) -> usize {
        self.lock().matches.values().map(MatchSet::len).sum()
    }
}

#[async_trait]
impl ProfileRepository for MemoryStore {
    async fn get_profile(&self, profile_id: &str) -> Result<Option<UserProfile>, AppError> {
        Ok(self.lock().profiles.get(profile_id).cloned())
    }

    async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, AppError> {
        self.lock()
            .profiles
            .insert(profile.profile_id.clone(), profile.clone());
        Ok(profile.clone())
    }

    async fn list_skills(&self, profile_id: &str) -> Result<Vec<Skill>, AppError> {
        Ok(owned(&self.lock().skills, profile_id))
    }

    async fn add_skill(&self, profile_id: &str, name: &str) -> Result<Skill, AppError> {
        let mut tables = self.lock();
        if let Some((_, existing)) = tables
            .skills
            .values()
            .find(|(owner, skill)| owner == profile_id && skill.name == name)
        {
            return Ok(existing.clone());
        }
        let skill = Skill {
            id: tables.next_id(),
            name: name.to_string(),
        };
        tables
            .skills
            .insert(skill.id, (profile_id.to_string(), skill.clone()));
        Ok(skill)
    }

    async fn delete_skill(&self, profile_id: &str, skill_id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock();
        match tables.skills.get(&skill_id) {
            Some((owner, _)) if owner == profile_id => {
                tables.skills.remove(&skill_id);
                tables.drop_item_matches(skill_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_projects(&self, profile_id: &str) -> Result<Vec<Project>, AppError> {
        Ok(owned(&self.lock().projects, profile_id))
    }

    async fn create_project(
        &self,
        profile_id: &str,
        new: &NewProject,
    ) -> Result<Project, AppError> {
        let mut tables = self.lock();
        let project = Project {
            id: tables.next_id(),
            name: new.name.clone(),
            description: new.description.clone(),
            link: new.link.clone(),
        };
        tables
            .projects
            .insert(project.id, (profile_id.to_string(), project.clone()));
        Ok(project)
    }

    async fn update_project(
        &self,
        profile_id: &str,
        project_id: i64,
        update: &NewProject,
    ) -> Result<Option<Project>, AppError> {
        let mut tables = self.lock();
        Ok(match tables.projects.get_mut(&project_id) {
            Some((owner, project)) if owner == profile_id => {
                project.name = update.name.clone();
                project.description = update.description.clone();
                project.link = update.link.clone();
                Some(project.clone())
            }
            _ => None,
        })
    }

    async fn delete_project(&self, profile_id: &str, project_id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock();
        match tables.projects.get(&project_id) {
            Some((owner, _)) if owner == profile_id => {
                tables.projects.remove(&project_id);
                tables.drop_item_matches(project_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_experiences(&self, profile_id: &str) -> Result<Vec<WorkExperience>, AppError> {
        Ok(owned(&self.lock().experiences, profile_id))
    }

    async fn create_experience(
        &self,
        profile_id: &str,
        new: &NewExperience,
    ) -> Result<WorkExperience, AppError> {
        let mut tables = self.lock();
        let experience = WorkExperience {
            id: tables.next_id(),
            position: new.position.clone(),
            company: new.company.clone(),
            duration: new.duration.clone(),
            description: new.description.clone(),
        };
        tables
            .experiences
            .insert(experience.id, (profile_id.to_string(), experience.clone()));
        Ok(experience)
    }

    async fn update_experience(
        &self,
        profile_id: &str,
        experience_id: i64,
        update: &NewExperience,
    ) -> Result<Option<WorkExperience>, AppError> {
        let mut tables = self.lock();
        Ok(match tables.experiences.get_mut(&experience_id) {
            Some((owner, experience)) if owner == profile_id => {
                experience.position = update.position.clone();
                experience.company = update.company.clone();
                experience.duration = update.duration.clone();
                experience.description = update.description.clone();
                Some(experience.clone())
            }
            _ => None,
        })
    }

    async fn delete_experience(
        &self,
        profile_id: &str,
        experience_id: i64,
    ) -> Result<bool, AppError> {
        let mut tables = self.lock();
        match tables.experiences.get(&experience_id) {
            Some((owner, _)) if owner == profile_id => {
                tables.experiences.remove(&experience_id);
                tables.drop_item_matches(experience_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_education(&self, profile_id: &str) -> Result<Vec<Education>, AppError> {
        Ok(owned(&self.lock().education, profile_id))
    }

    async fn create_education(
        &self,
        profile_id: &str,
        new: &NewEducation,
    ) -> Result<Education, AppError> {
        let mut tables = self.lock();
        let education = Education {
            id: tables.next_id(),
            degree: new.degree.clone(),
            institution: new.institution.clone(),
            year: new.year.clone(),
        };
        tables
            .education
            .insert(education.id, (profile_id.to_string(), education.clone()));
        Ok(education)
    }

    async fn update_education(
        &self,
        profile_id: &str,
        education_id: i64,
        update: &NewEducation,
    ) -> Result<Option<Education>, AppError> {
        let mut tables = self.lock();
        Ok(match tables.education.get_mut(&education_id) {
            Some((owner, education)) if owner == profile_id => {
                education.degree = update.degree.clone();
                education.institution = update.institution.clone();
                education.year = update.year.clone();
                Some(education.clone())
            }
            _ => None,
        })
    }

    async fn delete_education(
        &self,
        profile_id: &str,
        education_id: i64,
    ) -> Result<bool, AppError> {
        let mut tables = self.lock();
        match tables.education.get(&education_id) {
            Some((owner, _)) if owner == profile_id => {
                tables.education.remove(&education_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl JobRepository for MemoryStore {
    async fn list_jobs(&self, profile_id: &str) -> Result<Vec<JobSummary>, AppError> {
        let tables = self.lock();
        let mut jobs: Vec<JobSummary> = tables
            .jobs
            .values()
            .filter(|job| job.profile_id == profile_id)
            .map(|job| JobSummary {
                id: job.id,
                title: job.title.clone(),
                company: job.company.clone(),
                created_at: job.created_at,
            })
            .collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(jobs)
    }

    async fn get_job(&self, profile_id: &str, job_id: i64) -> Result<Option<Job>, AppError> {
        Ok(self
            .lock()
            .jobs
            .get(&job_id)
            .filter(|job| job.profile_id == profile_id)
            .cloned())
    }

    async fn create_job(
        &self,
        new: &NewJob,
        matches: Option<&MatchResult>,
    ) -> Result<Job, AppError> {
        let mut tables = self.lock();
        let id = tables.next_id();
        let job = Job {
            id,
            profile_id: new.profile_id.clone(),
            title: new.title.clone(),
            company: new.company.clone(),
            raw_description: new.raw_description.clone(),
            source_document_key: new.source_document_key.clone(),
            // Ids are monotonic, so offsetting by id keeps creation order strict.
            created_at: Utc::now() + Duration::milliseconds(id),
            updated_at: None,
        };
        tables.jobs.insert(id, job.clone());
        if let Some(result) = matches {
            tables.matches.insert(id, result.to_match_set(id));
        }
        Ok(job)
    }

    async fn update_job(
        &self,
        profile_id: &str,
        job_id: i64,
        update: &JobUpdate,
    ) -> Result<Option<Job>, AppError> {
        let mut tables = self.lock();
        Ok(match tables.jobs.get_mut(&job_id) {
            Some(job) if job.profile_id == profile_id => {
                job.title = update.title.clone();
                job.company = update.company.clone();
                job.raw_description = Some(update.raw_description.clone());
                job.updated_at = Some(Utc::now());
                Some(job.clone())
            }
            _ => None,
        })
    }

    async fn delete_job(&self, profile_id: &str, job_id: i64) -> Result<bool, AppError> {
        let mut tables = self.lock();
        match tables.jobs.get(&job_id) {
            Some(job) if job.profile_id == profile_id => {
                tables.jobs.remove(&job_id);
                tables.matches.remove(&job_id);
                tables.snapshots.retain(|(snap_job, _), _| *snap_job != job_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl MatchRepository for MemoryStore {
    async fn replace_matches(
        &self,
        job_id: i64,
        result: &MatchResult,
    ) -> Result<MatchSet, AppError> {
        let mut tables = self.lock();
        if !tables.jobs.contains_key(&job_id) {
            return Err(AppError::NotFound(format!("Job {job_id} not found")));
        }
        let set = result.to_match_set(job_id);
        tables.matches.insert(job_id, set.clone());
        Ok(set)
    }

    async fn get_matches(&self, job_id: i64) -> Result<MatchSet, AppError> {
        Ok(self
            .lock()
            .matches
            .get(&job_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl SnapshotRepository for MemoryStore {
    async fn get_snapshot(
        &self,
        job_id: i64,
        profile_id: &str,
    ) -> Result<Option<ResumeSnapshot>, AppError> {
        Ok(self
            .lock()
            .snapshots
            .get(&(job_id, profile_id.to_string()))
            .cloned())
    }

    async fn upsert_snapshot(
        &self,
        job_id: i64,
        profile_id: &str,
        state: &ResumeState,
    ) -> Result<ResumeSnapshot, AppError> {
        let snapshot = ResumeSnapshot {
            job_id,
            profile_id: profile_id.to_string(),
            state: state.clone(),
            updated_at: Utc::now(),
        };
        self.lock()
            .snapshots
            .insert((job_id, profile_id.to_string()), snapshot.clone());
        Ok(snapshot)
    }
}

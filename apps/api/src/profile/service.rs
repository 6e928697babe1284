use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::{required_text, AppError};
use crate::models::profile::{NewEducation, NewExperience, NewProject, ProfileInventory};
use crate::store::ProfileRepository;

/// Loads the four collections of a profile concurrently.
pub async fn load_inventory<S>(store: &S, profile_id: &str) -> Result<ProfileInventory, AppError>
where
    S: ProfileRepository + ?Sized,
{
    let (skills, projects, experiences, education) = tokio::try_join!(
        store.list_skills(profile_id),
        store.list_projects(profile_id),
        store.list_experiences(profile_id),
        store.list_education(profile_id),
    )?;

    Ok(ProfileInventory {
        skills,
        projects,
        experiences,
        education,
    })
}

pub fn validate_project(new: &NewProject) -> Result<NewProject, AppError> {
    Ok(NewProject {
        name: required_text("name", &new.name)?,
        description: new.description.trim().to_string(),
        link: new
            .link
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from),
    })
}

pub fn validate_experience(new: &NewExperience) -> Result<NewExperience, AppError> {
    Ok(NewExperience {
        position: required_text("position", &new.position)?,
        company: required_text("company", &new.company)?,
        duration: new.duration.trim().to_string(),
        description: new.description.trim().to_string(),
    })
}

pub fn validate_education(new: &NewEducation) -> Result<NewEducation, AppError> {
    Ok(NewEducation {
        degree: required_text("degree", &new.degree)?,
        institution: required_text("institution", &new.institution)?,
        year: new.year.trim().to_string(),
    })
}

/// Bulk profile import from the manual-entry screen.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ManualEntryRequest {
    #[serde(default)]
    pub projects: Vec<NewProject>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub education: Vec<NewEducation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManualEntryResponse {
    pub skills_added: usize,
    pub projects_added: usize,
    pub education_added: usize,
    pub inventory: ProfileInventory,
}

/// Adds whatever in `request` the profile does not already hold.
///
/// Duplicate keys: skills by name, projects by (name, description), education by
/// (degree, institution, year). Every item is validated before anything is written.
pub async fn save_manual_entry<S>(
    store: &S,
    profile_id: &str,
    request: &ManualEntryRequest,
) -> Result<ManualEntryResponse, AppError>
where
    S: ProfileRepository + ?Sized,
{
    let skills = request
        .skills
        .iter()
        .map(|name| required_text("skill", name))
        .collect::<Result<Vec<_>, _>>()?;
    let projects = request
        .projects
        .iter()
        .map(validate_project)
        .collect::<Result<Vec<_>, _>>()?;
    let education = request
        .education
        .iter()
        .map(validate_education)
        .collect::<Result<Vec<_>, _>>()?;

    let mut existing = load_inventory(store, profile_id).await?;

    let mut skills_added = 0;
    for name in skills {
        if existing.skills.iter().any(|s| s.name == name) {
            continue;
        }
        existing.skills.push(store.add_skill(profile_id, &name).await?);
        skills_added += 1;
    }

    let mut projects_added = 0;
    for project in projects {
        if existing
            .projects
            .iter()
            .any(|p| p.name == project.name && p.description == project.description)
        {
            continue;
        }
        existing
            .projects
            .push(store.create_project(profile_id, &project).await?);
        projects_added += 1;
    }

    let mut education_added = 0;
    for entry in education {
        if existing.education.iter().any(|e| {
            e.degree == entry.degree && e.institution == entry.institution && e.year == entry.year
        }) {
            continue;
        }
        existing
            .education
            .push(store.create_education(profile_id, &entry).await?);
        education_added += 1;
    }

    info!(
        "Manual entry for {profile_id}: +{skills_added} skills, +{projects_added} projects, +{education_added} education"
    );

    Ok(ManualEntryResponse {
        skills_added,
        projects_added,
        education_added,
        inventory: existing,
    })
}

use crate::resume::reconciler::ResumeView;

fn push_section(md: &mut String, title: &str, lines: Vec<String>) {
    if lines.is_empty() {
        return;
    }
    md.push_str(&format!("## {title}\n\n"));
    for line in lines {
        md.push_str(&line);
        md.push('\n');
    }
    md.push('\n');
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Renders a resume view as a markdown document. Empty sections are left out.
pub fn render_resume_md(view: &ResumeView) -> String {
    let resume = &view.resume;
    let personal = &resume.personal;

    let name = personal.name.trim();
    let mut md = if name.is_empty() {
        "# Resume\n\n".to_string()
    } else {
        format!("# {name}\n\n")
    };

    let contact: Vec<&str> = [Some(personal.email.trim()), non_blank(&personal.phone)]
        .into_iter()
        .flatten()
        .filter(|v| !v.is_empty())
        .collect();
    if !contact.is_empty() {
        md.push_str(&format!("{}\n\n", contact.join(" | ")));
    }

    match (non_blank(&personal.title), non_blank(&personal.company)) {
        (Some(title), Some(company)) => md.push_str(&format!("**{title}** at {company}\n\n")),
        (Some(title), None) => md.push_str(&format!("**{title}**\n\n")),
        (None, Some(company)) => md.push_str(&format!("{company}\n\n")),
        (None, None) => {}
    }

    if !resume.skills.is_empty() {
        let names: Vec<&str> = resume.skills.iter().map(|s| s.name.as_str()).collect();
        push_section(&mut md, "Skills", vec![names.join(", ")]);
    }

    let mut experience = Vec::new();
    for e in &resume.experiences {
        let mut heading = format!("### {} — {}", e.position, e.company);
        if !e.duration.trim().is_empty() {
            heading.push_str(&format!(" ({})", e.duration.trim()));
        }
        experience.push(heading);
        if !e.description.trim().is_empty() {
            experience.push(e.description.trim().to_string());
        }
        experience.push(String::new());
    }
    push_section(&mut md, "Experience", trim_trailing(experience));

    let mut projects = Vec::new();
    for p in &resume.projects {
        match non_blank(&p.link) {
            Some(link) => projects.push(format!("### [{}]({link})", p.name)),
            None => projects.push(format!("### {}", p.name)),
        }
        if !p.description.trim().is_empty() {
            projects.push(p.description.trim().to_string());
        }
        projects.push(String::new());
    }
    push_section(&mut md, "Projects", trim_trailing(projects));

    let education = resume
        .education
        .iter()
        .map(|e| {
            if e.year.trim().is_empty() {
                format!("- **{}**, {}", e.degree, e.institution)
            } else {
                format!("- **{}**, {} ({})", e.degree, e.institution, e.year.trim())
            }
        })
        .collect();
    push_section(&mut md, "Education", education);

    md.truncate(md.trim_end().len());
    md.push('\n');
    md
}

fn trim_trailing(mut lines: Vec<String>) -> Vec<String> {
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{Education, Project, Skill, WorkExperience};
    use crate::models::resume::{PersonalInfo, ResumeState};
    use crate::resume::reconciler::ViewSource;

    fn view(resume: ResumeState) -> ResumeView {
        ResumeView {
            job_id: 1,
            source: ViewSource::Matched,
            resume,
            saved_at: None,
        }
    }

    #[test]
    fn test_renders_all_sections_in_order() {
        let md = render_resume_md(&view(ResumeState {
            personal: PersonalInfo {
                name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                phone: Some("555-0100".into()),
                title: Some("Go Developer".into()),
                company: Some("Initech".into()),
            },
            skills: vec![
                Skill {
                    id: 1,
                    name: "Go".into(),
                },
                Skill {
                    id: 2,
                    name: "SQL".into(),
                },
            ],
            experiences: vec![WorkExperience {
                id: 3,
                position: "Engineer".into(),
                company: "Acme".into(),
                duration: "2021-2023".into(),
                description: "Shipped billing".into(),
            }],
            projects: vec![Project {
                id: 4,
                name: "API".into(),
                description: "Built scalable APIs in Go".into(),
                link: Some("https://example.com/api".into()),
            }],
            education: vec![Education {
                id: 5,
                degree: "BSc".into(),
                institution: "State University".into(),
                year: "2019".into(),
            }],
        }));

        assert!(md.starts_with("# Ada Lovelace\n\nada@example.com | 555-0100\n\n"));
        assert!(md.contains("**Go Developer** at Initech"));
        assert!(md.contains("## Skills\n\nGo, SQL\n"));
        assert!(md.contains("### Engineer — Acme (2021-2023)\nShipped billing"));
        assert!(md.contains("### [API](https://example.com/api)\nBuilt scalable APIs in Go"));
        assert!(md.contains("- **BSc**, State University (2019)"));

        let skills = md.find("## Skills").unwrap();
        let experience = md.find("## Experience").unwrap();
        let projects = md.find("## Projects").unwrap();
        let education = md.find("## Education").unwrap();
        assert!(skills < experience && experience < projects && projects < education);
        assert!(md.ends_with("(2019)\n"));
    }

    #[test]
    fn test_empty_sections_are_omitted() {
        let md = render_resume_md(&view(ResumeState {
            personal: PersonalInfo {
                name: "Ada".into(),
                ..Default::default()
            },
            ..Default::default()
        }));

        assert_eq!(md, "# Ada\n");
    }
}

// Prompt text for the match resolver. Wording and model are deployment concerns;
// only the JSON shape requested here is load-bearing.

pub const MATCH_SYSTEM: &str = "\
You are an expert resume matcher. \
You MUST respond with valid JSON only. \
Do NOT include any text outside the JSON object. \
Do NOT use markdown code fences. \
Do NOT include explanations or apologies.";

/// Replace `{skills}`, `{projects}`, `{experiences}` and `{job_description}` before sending.
pub const MATCH_PROMPT_TEMPLATE: &str = r#"Here is a candidate's profile.

SKILLS:
{skills}

PROJECTS:
{projects}

WORK EXPERIENCE:
{experiences}

JOB DESCRIPTION:
{job_description}

Choose the combination of skills, projects and work experience that best fits this job
and company. Reference items ONLY by the ids given above.

Return a JSON object with this EXACT schema:
{
  "matched_skill_ids": [1, 2],
  "matched_project_ids": [10],
  "matched_experience_ids": [20],
  "improved_descriptions": {
    "10": "Rewritten description of project 10"
  }
}

Rules for improved_descriptions:
- Only for matched projects and matched work experience, keyed by id.
- Follow the XYZ format: what was done, what it achieved, how it was done.
- Be concise and concrete but natural. Separate lines with \n.
- Never invent facts that are not in the original description."#;

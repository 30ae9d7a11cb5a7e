// Assist prompt templates. All prompts for the assist module live here.
// Register is fixed: simple vocabulary, encouraging tone, written for an
// elementary-to-intermediate (A2/B1) English learner.

/// System instruction for every assist call.
pub const ASSIST_SYSTEM: &str = "You are a helpful CV assistant for A2-level ESL students. \
    Keep answers simple, professional, and encouraging.";

/// System instruction for structured tasks — enforces JSON-only output.
pub const ASSIST_SYSTEM_JSON: &str = "You are a helpful CV assistant for A2-level ESL students. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

const PERSONAL_INFO_TEMPLATE: &str = "Check this JSON of CV contact details for spelling and \
capitalization errors. Fix errors only; do not invent facts. Return ONLY valid JSON with the \
same keys. Input: {info}";

const DRAFT_OBJECTIVE_PROMPT: &str = "The student is an A2-level English learner. Suggest a \
simple 3-sentence career objective for a college student with limited experience. Use very \
simple vocabulary.";

const IMPROVE_OBJECTIVE_TEMPLATE: &str = "Review and correct the following career objective \
for an A2-level ESL student CV. Fix spelling, capitalization, and formatting only. Do not \
invent facts.\n\nText to check:\n{text}";

const EDUCATION_LINE_TEMPLATE: &str =
    "Write 1 simple CV line describing this education: {program} at {institution}. Use A2/B1 English.";

const EXPERIENCE_BULLETS_TEMPLATE: &str = "The student has limited experience. Turn these notes \
into 2-3 simple bullet points using past tense and action verbs: \"{description}\". Keep \
language A2/B1.";

const EXPERIENCE_POLISH_TEMPLATE: &str =
    "Rewrite this experience description to be more professional but simple English: \"{description}\"";

const PROJECT_SUMMARY_TEMPLATE: &str = "Write 2-3 bullet points describing this project: \
\"{details}\" and role. Focus on teamwork and responsibility. Simple English.";

const SKILL_BULLETS_TEMPLATE: &str = "Create 3-5 bullet points describing the student's \
technical skills: {skills}. Use simple language like 'Able to use...'.";

const SOFT_SKILL_EXAMPLES_TEMPLATE: &str = "For these soft skills: {skills}, write 1 simple \
example sentence for each showing how a student uses them.";

const ACHIEVEMENT_LINES_TEMPLATE: &str = "Rewrite these achievements as professional CV bullet \
points using verbs like 'Achieved', 'Received'. A2/B1 level: {achievements}";

const LANGUAGE_SUMMARY_TEMPLATE: &str = "Format this language list for a CV. Native: {native}. \
English: {level}. Other: {other}. Return a simple summary string.";

const HOBBY_DESCRIPTION_TEMPLATE: &str = "Write 2-3 short sentences to describe this student's \
hobbies: {hobbies}. Professional but friendly.";

const WRITE_STRENGTHS_TEMPLATE: &str = "Create a 'Key Strengths' section with bullet points \
based on: {strengths}. Simple, one line each, positive tone.";

const REVIEW_FEEDBACK_TEMPLATE: &str = "You are a CV editor for A2/B1 ESL students. Review this \
CV data. Provide a list of 3-5 specific, encouraging improvements. Do not rewrite the whole \
thing, just give advice.\nData: {record}";

pub fn personal_info_prompt(info_json: &str) -> String {
    PERSONAL_INFO_TEMPLATE.replace("{info}", info_json)
}

pub fn draft_objective_prompt() -> String {
    DRAFT_OBJECTIVE_PROMPT.to_string()
}

pub fn improve_objective_prompt(text: &str) -> String {
    IMPROVE_OBJECTIVE_TEMPLATE.replace("{text}", text)
}

pub fn education_line_prompt(program: &str, institution: &str) -> String {
    EDUCATION_LINE_TEMPLATE
        .replace("{program}", program)
        .replace("{institution}", institution)
}

pub fn experience_bullets_prompt(description: &str) -> String {
    EXPERIENCE_BULLETS_TEMPLATE.replace("{description}", description)
}

pub fn experience_polish_prompt(description: &str) -> String {
    EXPERIENCE_POLISH_TEMPLATE.replace("{description}", description)
}

pub fn project_summary_prompt(details: &str) -> String {
    PROJECT_SUMMARY_TEMPLATE.replace("{details}", details)
}

pub fn skill_bullets_prompt(skills: &[String]) -> String {
    SKILL_BULLETS_TEMPLATE.replace("{skills}", &skills.join(", "))
}

pub fn soft_skill_examples_prompt(skills: &[String]) -> String {
    SOFT_SKILL_EXAMPLES_TEMPLATE.replace("{skills}", &skills.join(", "))
}

pub fn achievement_lines_prompt(achievements: &[String]) -> String {
    ACHIEVEMENT_LINES_TEMPLATE.replace("{achievements}", &achievements.join("; "))
}

pub fn language_summary_prompt(native: &str, level: &str, other: &str) -> String {
    LANGUAGE_SUMMARY_TEMPLATE
        .replace("{native}", native)
        .replace("{level}", level)
        .replace("{other}", other)
}

pub fn hobby_description_prompt(hobbies: &[String]) -> String {
    HOBBY_DESCRIPTION_TEMPLATE.replace("{hobbies}", &hobbies.join(", "))
}

pub fn write_strengths_prompt(strengths: &[String]) -> String {
    WRITE_STRENGTHS_TEMPLATE.replace("{strengths}", &strengths.join(", "))
}

pub fn review_feedback_prompt(record_json: &str) -> String {
    REVIEW_FEEDBACK_TEMPLATE.replace("{record}", record_json)
}

//! Assist invoker — builds prompts from the current record, calls the
//! generative-text collaborator, and merges cleaned results back through the
//! wizard's single update path.
//!
//! Post-processing is narrow and per-task: structured tasks get a
//! schema-checked JSON parse, list tasks get line splitting with bullet
//! markers stripped, everything else is used verbatim. The external response
//! shape is never trusted without that step. The photo never leaves the
//! process: prompts are built from [`CvRecord::external_json`].
//!
//! Single-flight per target is advisory — a second request for a busy
//! target is rejected, not queued.

pub mod handlers;
pub mod prompts;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::llm_client::{strip_code_fences, TextGenerator};
use crate::models::record::CvRecord;
use crate::wizard::RecordStore;

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("assist service unavailable: {0}")]
    Unavailable(String),

    #[error("assist response failed to parse: {0}")]
    MalformedResponse(String),

    #[error("assist already in flight for {0}")]
    Busy(String),

    #[error("assist target not found: {0}")]
    UnknownTarget(String),
}

/// One variant per assist action the wizard offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistKind {
    CheckPersonalInfo,
    DraftObjective,
    ImproveObjective,
    EducationLine,
    ExperienceBullets,
    ExperiencePolish,
    ProjectSummary,
    SkillBullets,
    SoftSkillExamples,
    AchievementLines,
    LanguageSummary,
    HobbyDescription,
    WriteStrengths,
    ReviewFeedback,
}

impl AssistKind {
    /// Whether this kind targets an identifier-keyed entry.
    fn needs_target(&self) -> bool {
        matches!(
            self,
            AssistKind::EducationLine
                | AssistKind::ExperienceBullets
                | AssistKind::ExperiencePolish
                | AssistKind::ProjectSummary
        )
    }

    /// Scope key for the advisory single-flight rule.
    fn target_key(&self, target_id: Option<Uuid>) -> String {
        if let Some(id) = target_id {
            return id.to_string();
        }
        match self {
            AssistKind::CheckPersonalInfo => "personalInfo",
            AssistKind::DraftObjective | AssistKind::ImproveObjective => "objective",
            AssistKind::SkillBullets | AssistKind::SoftSkillExamples => "skills",
            AssistKind::AchievementLines => "achievements",
            AssistKind::LanguageSummary => "languages",
            AssistKind::HobbyDescription => "hobbies",
            AssistKind::WriteStrengths => "strengths",
            _ => "record",
        }
        .to_string()
    }
}

#[derive(Debug, Deserialize)]
pub struct AssistRequest {
    pub kind: AssistKind,
    #[serde(default)]
    pub target_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AssistOutcome {
    pub text: String,
    /// False when the result was returned to the caller without touching
    /// the record (review feedback, or a target that vanished mid-flight).
    pub applied: bool,
}

/// Corrected contact fields coming back from a structured check.
/// Every field optional; unknown keys (including any photo echo) ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonalInfoFix {
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    city: Option<String>,
    linkedin: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Advisory single-flight registry
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InFlight {
    targets: Mutex<HashSet<String>>,
}

impl InFlight {
    fn begin(self: &Arc<Self>, key: String) -> Result<FlightGuard, AssistError> {
        let mut targets = self.targets.lock().unwrap_or_else(|p| p.into_inner());
        if !targets.insert(key.clone()) {
            return Err(AssistError::Busy(key));
        }
        Ok(FlightGuard {
            registry: Arc::clone(self),
            key,
        })
    }
}

struct FlightGuard {
    registry: Arc<InFlight>,
    key: String,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        let mut targets = self
            .registry
            .targets
            .lock()
            .unwrap_or_else(|p| p.into_inner());
        targets.remove(&self.key);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Invocation
// ────────────────────────────────────────────────────────────────────────────

/// Runs one assist invocation end to end: prompt, call, post-process, merge.
pub async fn run_assist(
    store: &RecordStore,
    llm: &dyn TextGenerator,
    flights: &Arc<InFlight>,
    request: AssistRequest,
) -> Result<AssistOutcome, AssistError> {
    if request.kind.needs_target() && request.target_id.is_none() {
        return Err(AssistError::UnknownTarget(format!(
            "{:?} requires a target_id",
            request.kind
        )));
    }
    let _flight = flights.begin(request.kind.target_key(request.target_id))?;

    let record = store.record();
    let (prompt, system) = build_prompt(&record, request.kind, request.target_id)?;

    let text = llm
        .generate(&prompt, system)
        .await
        .map_err(|e| AssistError::Unavailable(e.to_string()))?;

    merge_response(store, request.kind, request.target_id, text)
}

/// Builds the prompt and system instruction for a kind against the current
/// record. Fails early if an entry target no longer exists.
fn build_prompt(
    record: &CvRecord,
    kind: AssistKind,
    target_id: Option<Uuid>,
) -> Result<(String, &'static str), AssistError> {
    let prompt = match kind {
        AssistKind::CheckPersonalInfo => {
            let info = record.external_json()["personalInfo"].to_string();
            return Ok((prompts::personal_info_prompt(&info), prompts::ASSIST_SYSTEM_JSON));
        }
        AssistKind::DraftObjective => prompts::draft_objective_prompt(),
        AssistKind::ImproveObjective => prompts::improve_objective_prompt(&record.objective),
        AssistKind::EducationLine => {
            let entry = find_education(record, target_id)?;
            prompts::education_line_prompt(&entry.program, &entry.institution)
        }
        AssistKind::ExperienceBullets => {
            let entry = find_experience(record, target_id)?;
            prompts::experience_bullets_prompt(&entry.description)
        }
        AssistKind::ExperiencePolish => {
            let entry = find_experience(record, target_id)?;
            prompts::experience_polish_prompt(&entry.description)
        }
        AssistKind::ProjectSummary => {
            let entry = find_project(record, target_id)?;
            prompts::project_summary_prompt(&entry.details)
        }
        AssistKind::SkillBullets => prompts::skill_bullets_prompt(&record.skills.technical),
        AssistKind::SoftSkillExamples => {
            prompts::soft_skill_examples_prompt(&record.skills.soft)
        }
        AssistKind::AchievementLines => prompts::achievement_lines_prompt(&record.achievements),
        AssistKind::LanguageSummary => prompts::language_summary_prompt(
            &record.languages.native,
            record.languages.english_level.as_str(),
            &record.languages.other,
        ),
        AssistKind::HobbyDescription => prompts::hobby_description_prompt(&record.hobbies.selected),
        AssistKind::WriteStrengths => prompts::write_strengths_prompt(&record.strengths),
        AssistKind::ReviewFeedback => {
            let blob = serde_json::to_string_pretty(&record.external_json())
                .unwrap_or_else(|_| record.external_json().to_string());
            prompts::review_feedback_prompt(&blob)
        }
    };
    Ok((prompt, prompts::ASSIST_SYSTEM))
}

/// Post-processes the raw reply and merges it through the store.
/// Entry targets are re-checked at merge time: a target removed while the
/// call was in flight drops the result instead of resurrecting it.
fn merge_response(
    store: &RecordStore,
    kind: AssistKind,
    target_id: Option<Uuid>,
    text: String,
) -> Result<AssistOutcome, AssistError> {
    let applied = match kind {
        AssistKind::CheckPersonalInfo => {
            let cleaned = strip_code_fences(&text);
            let fix: PersonalInfoFix = serde_json::from_str(cleaned)
                .map_err(|e| AssistError::MalformedResponse(e.to_string()))?;
            store.mutate(|record| {
                let info = &mut record.personal_info;
                if let Some(v) = fix.first_name {
                    info.first_name = v;
                }
                if let Some(v) = fix.last_name {
                    info.last_name = v;
                }
                if let Some(v) = fix.phone {
                    info.phone = v;
                }
                if let Some(v) = fix.email {
                    info.email = v;
                }
                if let Some(v) = fix.city {
                    info.city = v;
                }
                if let Some(v) = fix.linkedin {
                    info.linkedin = v;
                }
            });
            true
        }
        AssistKind::DraftObjective | AssistKind::ImproveObjective => {
            let value = text.clone();
            store.mutate(|record| record.objective = value);
            true
        }
        AssistKind::EducationLine => {
            let id = target_id.unwrap_or_default();
            let value = text.clone();
            store.mutate(|record| {
                match record.education.iter_mut().find(|e| e.id == id) {
                    Some(entry) => {
                        entry.courses = value;
                        true
                    }
                    None => false,
                }
            })
        }
        AssistKind::ExperienceBullets | AssistKind::ExperiencePolish => {
            let id = target_id.unwrap_or_default();
            let value = text.clone();
            store.mutate(|record| {
                let entry = record
                    .work_experience
                    .iter_mut()
                    .chain(record.volunteer_experience.iter_mut())
                    .find(|e| e.id == id);
                match entry {
                    Some(entry) => {
                        entry.description = value;
                        true
                    }
                    None => false,
                }
            })
        }
        AssistKind::ProjectSummary => {
            let id = target_id.unwrap_or_default();
            let value = text.clone();
            store.mutate(|record| {
                match record.projects.iter_mut().find(|p| p.id == id) {
                    Some(entry) => {
                        entry.description = value;
                        true
                    }
                    None => false,
                }
            })
        }
        AssistKind::SkillBullets | AssistKind::SoftSkillExamples => {
            let value = text.clone();
            store.mutate(|record| {
                let other = &mut record.skills.other;
                if other.is_empty() {
                    *other = value;
                } else {
                    other.push_str("\n\n");
                    other.push_str(&value);
                }
            });
            true
        }
        AssistKind::AchievementLines => {
            let lines = split_list(&text);
            store.mutate(|record| record.achievements = lines);
            true
        }
        AssistKind::LanguageSummary => {
            let value = text.clone();
            store.mutate(|record| record.languages.other = value);
            true
        }
        AssistKind::HobbyDescription => {
            let value = text.clone();
            store.mutate(|record| record.hobbies.description = value);
            true
        }
        AssistKind::WriteStrengths => {
            let lines = split_list(&text);
            store.mutate(|record| record.strengths = lines);
            true
        }
        AssistKind::ReviewFeedback => false,
    };

    Ok(AssistOutcome { text, applied })
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Splits a list-shaped reply into non-empty lines, stripping leading
/// bullet markers.
pub fn split_list(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("- ")
                .or_else(|| line.strip_prefix("* "))
                .or_else(|| line.strip_prefix("• "))
                .unwrap_or(line)
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn find_education<'a>(
    record: &'a CvRecord,
    target_id: Option<Uuid>,
) -> Result<&'a crate::models::record::Education, AssistError> {
    let id = target_id.unwrap_or_default();
    record
        .education
        .iter()
        .find(|e| e.id == id)
        .ok_or_else(|| AssistError::UnknownTarget(id.to_string()))
}

fn find_experience<'a>(
    record: &'a CvRecord,
    target_id: Option<Uuid>,
) -> Result<&'a crate::models::record::Experience, AssistError> {
    let id = target_id.unwrap_or_default();
    record
        .work_experience
        .iter()
        .chain(record.volunteer_experience.iter())
        .find(|e| e.id == id)
        .ok_or_else(|| AssistError::UnknownTarget(id.to_string()))
}

fn find_project<'a>(
    record: &'a CvRecord,
    target_id: Option<Uuid>,
) -> Result<&'a crate::models::record::Project, AssistError> {
    let id = target_id.unwrap_or_default();
    record
        .projects
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| AssistError::UnknownTarget(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::models::record::{Education, Experience, RecordPatch};
    use crate::storage::FileStore;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct MockGenerator {
        reply: Option<String>,
        last_prompt: Mutex<Option<String>>,
    }

    impl MockGenerator {
        fn replying(text: &str) -> Self {
            MockGenerator {
                reply: Some(text.to_string()),
                last_prompt: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            MockGenerator {
                reply: None,
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for MockGenerator {
        async fn generate(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            match &self.reply {
                Some(text) => Ok(text.clone()),
                None => Err(LlmError::EmptyContent),
            }
        }
    }

    fn test_store(dir: &tempfile::TempDir) -> Arc<RecordStore> {
        RecordStore::new(None, FileStore::new(dir.path()))
    }

    #[tokio::test]
    async fn test_draft_objective_merges_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let llm = MockGenerator::replying("I am a motivated student.");
        let flights = Arc::new(InFlight::default());

        let outcome = run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::DraftObjective,
                target_id: None,
            },
        )
        .await
        .unwrap();

        assert!(outcome.applied);
        assert_eq!(store.record().objective, "I am a motivated student.");
    }

    #[tokio::test]
    async fn test_failure_leaves_field_intact_and_wizard_usable() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        store.apply_patch(RecordPatch {
            objective: Some("my own words".to_string()),
            ..Default::default()
        });
        let llm = MockGenerator::failing();
        let flights = Arc::new(InFlight::default());

        let err = run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::ImproveObjective,
                target_id: None,
            },
        )
        .await
        .expect_err("mock fails");

        assert!(matches!(err, AssistError::Unavailable(_)));
        assert_eq!(store.record().objective, "my own words");
        // navigation still works after the failure
        assert_eq!(store.go_next().step_index, 1);
    }

    #[tokio::test]
    async fn test_structured_fix_parses_fenced_json_and_keeps_photo() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        store.mutate(|r| {
            r.personal_info.first_name = "ahmed".to_string();
            r.personal_info.photo = Some("data:image/png;base64,AAAA".to_string());
        });
        let llm =
            MockGenerator::replying("```json\n{\"firstName\": \"Ahmed\", \"city\": \"Abu Dhabi\"}\n```");
        let flights = Arc::new(InFlight::default());

        run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::CheckPersonalInfo,
                target_id: None,
            },
        )
        .await
        .unwrap();

        let info = store.record().personal_info;
        assert_eq!(info.first_name, "Ahmed");
        assert_eq!(info.city, "Abu Dhabi");
        assert_eq!(info.photo.as_deref(), Some("data:image/png;base64,AAAA"));

        // photo must not have been serialized into the prompt
        let prompt = llm.last_prompt.lock().unwrap().clone().unwrap();
        assert!(!prompt.contains("base64,AAAA"));
    }

    #[tokio::test]
    async fn test_malformed_structured_reply_mutates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        store.mutate(|r| r.personal_info.first_name = "ahmed".to_string());
        let before = store.record();
        let llm = MockGenerator::replying("Sorry, I cannot help with that.");
        let flights = Arc::new(InFlight::default());

        let err = run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::CheckPersonalInfo,
                target_id: None,
            },
        )
        .await
        .expect_err("not JSON");

        assert!(matches!(err, AssistError::MalformedResponse(_)));
        assert_eq!(store.record(), before);
    }

    #[tokio::test]
    async fn test_list_reply_split_and_markers_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        store.apply_patch(RecordPatch {
            achievements: Some(vec!["won award".to_string()]),
            ..Default::default()
        });
        let llm = MockGenerator::replying("- Received the Dean's Award\n\n* Achieved perfect attendance\nCompleted a first-aid course");
        let flights = Arc::new(InFlight::default());

        run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::AchievementLines,
                target_id: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            store.record().achievements,
            vec![
                "Received the Dean's Award".to_string(),
                "Achieved perfect attendance".to_string(),
                "Completed a first-aid course".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_entry_target_resolved_for_experience() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let entry = store.add_experience(
            crate::models::record::ExperienceCategory::Volunteer,
            Experience::empty(crate::models::record::ExperienceCategory::Volunteer),
        );
        let llm = MockGenerator::replying("- Helped organize the school charity run");
        let flights = Arc::new(InFlight::default());

        run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::ExperienceBullets,
                target_id: Some(entry.id),
            },
        )
        .await
        .unwrap();

        assert_eq!(
            store.record().volunteer_experience[0].description,
            "- Helped organize the school charity run"
        );
    }

    #[tokio::test]
    async fn test_unknown_entry_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let llm = MockGenerator::replying("anything");
        let flights = Arc::new(InFlight::default());

        let err = run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::EducationLine,
                target_id: Some(Uuid::new_v4()),
            },
        )
        .await
        .expect_err("no such entry");
        assert!(matches!(err, AssistError::UnknownTarget(_)));

        let err = run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::EducationLine,
                target_id: None,
            },
        )
        .await
        .expect_err("target required");
        assert!(matches!(err, AssistError::UnknownTarget(_)));
    }

    #[tokio::test]
    async fn test_second_request_for_busy_target_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        store.add_education(Education::default());
        let llm = MockGenerator::replying("text");
        let flights = Arc::new(InFlight::default());

        let _held = flights.begin("objective".to_string()).unwrap();
        let err = run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::DraftObjective,
                target_id: None,
            },
        )
        .await
        .expect_err("target busy");
        assert!(matches!(err, AssistError::Busy(_)));
    }

    #[tokio::test]
    async fn test_flight_released_after_completion() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        let llm = MockGenerator::replying("text");
        let flights = Arc::new(InFlight::default());

        for _ in 0..2 {
            run_assist(
                &store,
                &llm,
                &flights,
                AssistRequest {
                    kind: AssistKind::DraftObjective,
                    target_id: None,
                },
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_review_feedback_returns_text_without_merging() {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store(&dir);
        store.mutate(|r| {
            r.personal_info.first_name = "Mariam".to_string();
            r.personal_info.photo = Some("data:image/png;base64,ZZZZ".to_string());
        });
        let before = store.record();
        let llm = MockGenerator::replying("1. Add more detail to your objective.");
        let flights = Arc::new(InFlight::default());

        let outcome = run_assist(
            &store,
            &llm,
            &flights,
            AssistRequest {
                kind: AssistKind::ReviewFeedback,
                target_id: None,
            },
        )
        .await
        .unwrap();

        assert!(!outcome.applied);
        assert_eq!(outcome.text, "1. Add more detail to your objective.");
        assert_eq!(store.record(), before);

        let prompt = llm.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("Mariam"));
        assert!(!prompt.contains("base64,ZZZZ"));
    }

    #[test]
    fn test_split_list_handles_mixed_markers_and_blanks() {
        let lines = split_list("- one\n* two\n• three\n\n  four  \n");
        assert_eq!(lines, vec!["one", "two", "three", "four"]);
    }
}

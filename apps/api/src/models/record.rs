//! The CV record — the single aggregate all wizard steps read and write.
//!
//! Serialized field names are camelCase: the record round-trips through the
//! persisted session blob and the browser client in that shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// CEFR English proficiency level. Closed set — no free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnglishLevel {
    #[serde(rename = "A2")]
    A2,
    #[serde(rename = "A2+")]
    A2Plus,
    #[serde(rename = "B1")]
    B1,
    #[serde(rename = "B2")]
    B2,
}

impl Default for EnglishLevel {
    fn default() -> Self {
        EnglishLevel::A2
    }
}

impl EnglishLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnglishLevel::A2 => "A2",
            EnglishLevel::A2Plus => "A2+",
            EnglishLevel::B1 => "B1",
            EnglishLevel::B2 => "B2",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub linkedin: String,
    /// Base64 data URL, capped at 2 MiB of image bytes at ingestion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub id: Uuid,
    pub institution: String,
    pub program: String,
    pub graduation_year: String,
    pub courses: String,
}

impl Education {
    pub fn with_id(mut self) -> Self {
        self.id = Uuid::new_v4();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceCategory {
    Work,
    Volunteer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: Uuid,
    pub role: String,
    pub organization: String,
    pub dates: String,
    pub description: String,
    #[serde(rename = "type")]
    pub category: ExperienceCategory,
}

impl Experience {
    pub fn empty(category: ExperienceCategory) -> Self {
        Experience {
            id: Uuid::new_v4(),
            role: String::new(),
            organization: String::new(),
            dates: String::new(),
            description: String::new(),
            category,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub course: String,
    /// Rough notes the student typed in.
    pub details: String,
    /// The polished description that ends up on the CV.
    pub description: String,
}

impl Project {
    pub fn with_id(mut self) -> Self {
        self.id = Uuid::new_v4();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Skills {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
    pub other: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Languages {
    pub native: String,
    pub english_level: EnglishLevel,
    pub other: String,
}

impl Default for Languages {
    fn default() -> Self {
        Languages {
            native: "Arabic".to_string(),
            english_level: EnglishLevel::A2,
            other: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hobbies {
    pub selected: Vec<String>,
    pub other: String,
    pub description: String,
}

/// The full record collected by the wizard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvRecord {
    pub personal_info: PersonalInfo,
    pub objective: String,
    pub education: Vec<Education>,
    pub skills: Skills,
    pub work_experience: Vec<Experience>,
    pub volunteer_experience: Vec<Experience>,
    pub projects: Vec<Project>,
    pub achievements: Vec<String>,
    pub languages: Languages,
    pub hobbies: Hobbies,
    pub strengths: Vec<String>,
}

impl CvRecord {
    /// Heuristic used on session restore: a record counts as "in progress"
    /// when a first name or any education entry is present.
    pub fn is_resumable(&self) -> bool {
        !self.personal_info.first_name.is_empty() || !self.education.is_empty()
    }

    /// Applies a partial update. Sections present in the patch replace the
    /// current value wholesale; absent sections are left untouched.
    pub fn apply(&mut self, patch: RecordPatch) {
        if let Some(v) = patch.personal_info {
            self.personal_info = v;
        }
        if let Some(v) = patch.objective {
            self.objective = v;
        }
        if let Some(v) = patch.education {
            self.education = v;
        }
        if let Some(v) = patch.skills {
            self.skills = v;
        }
        if let Some(v) = patch.work_experience {
            self.work_experience = v;
        }
        if let Some(v) = patch.volunteer_experience {
            self.volunteer_experience = v;
        }
        if let Some(v) = patch.projects {
            self.projects = v;
        }
        if let Some(v) = patch.achievements {
            self.achievements = v;
        }
        if let Some(v) = patch.languages {
            self.languages = v;
        }
        if let Some(v) = patch.hobbies {
            self.hobbies = v;
        }
        if let Some(v) = patch.strengths {
            self.strengths = v;
        }
    }

    /// JSON view of the record with the photo removed. This is the only
    /// serialization that may leave the process via the assist prompts.
    pub fn external_json(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Some(info) = value.get_mut("personalInfo").and_then(Value::as_object_mut) {
            info.remove("photo");
        }
        value
    }
}

/// Shallow partial update of [`CvRecord`] — one optional slot per section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordPatch {
    pub personal_info: Option<PersonalInfo>,
    pub objective: Option<String>,
    pub education: Option<Vec<Education>>,
    pub skills: Option<Skills>,
    pub work_experience: Option<Vec<Experience>>,
    pub volunteer_experience: Option<Vec<Experience>>,
    pub projects: Option<Vec<Project>>,
    pub achievements: Option<Vec<String>>,
    pub languages: Option<Languages>,
    pub hobbies: Option<Hobbies>,
    pub strengths: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_record_is_empty_but_for_language_defaults() {
        let record = CvRecord::default();
        assert!(record.personal_info.first_name.is_empty());
        assert!(record.education.is_empty());
        assert_eq!(record.languages.native, "Arabic");
        assert_eq!(record.languages.english_level, EnglishLevel::A2);
        assert!(!record.is_resumable());
    }

    #[test]
    fn test_patch_replaces_only_present_sections() {
        let mut record = CvRecord::default();
        record.education.push(Education::default().with_id());
        record.apply(RecordPatch {
            objective: Some("I am a student.".to_string()),
            ..Default::default()
        });
        assert_eq!(record.objective, "I am a student.");
        assert_eq!(record.education.len(), 1, "sibling section must survive");
    }

    #[test]
    fn test_sequential_patches_equal_their_merge() {
        let mut record = CvRecord::default();
        record.apply(RecordPatch {
            objective: Some("first".to_string()),
            strengths: Some(vec!["I am punctual.".to_string()]),
            ..Default::default()
        });
        record.apply(RecordPatch {
            objective: Some("second".to_string()),
            ..Default::default()
        });
        assert_eq!(record.objective, "second");
        assert_eq!(record.strengths, vec!["I am punctual.".to_string()]);
    }

    #[test]
    fn test_english_level_serializes_to_cefr_labels() {
        assert_eq!(
            serde_json::to_value(EnglishLevel::A2Plus).unwrap(),
            serde_json::json!("A2+")
        );
        let level: EnglishLevel = serde_json::from_str("\"B1\"").unwrap();
        assert_eq!(level, EnglishLevel::B1);
    }

    #[test]
    fn test_english_level_rejects_free_text() {
        assert!(serde_json::from_str::<EnglishLevel>("\"fluent\"").is_err());
    }

    #[test]
    fn test_external_json_strips_photo() {
        let mut record = CvRecord::default();
        record.personal_info.photo = Some("data:image/png;base64,AAAA".to_string());
        record.personal_info.first_name = "Ahmed".to_string();
        let external = record.external_json();
        assert!(external["personalInfo"].get("photo").is_none());
        assert_eq!(external["personalInfo"]["firstName"], "Ahmed");
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let mut record = CvRecord::default();
        record.personal_info.first_name = "Mariam".to_string();
        record
            .work_experience
            .push(Experience::empty(ExperienceCategory::Work));
        record
            .volunteer_experience
            .push(Experience::empty(ExperienceCategory::Volunteer));
        let blob = serde_json::to_string(&record).unwrap();
        let parsed: CvRecord = serde_json::from_str(&blob).unwrap();
        assert_eq!(parsed, record);
    }
}

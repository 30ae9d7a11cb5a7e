//! Deterministic `CvRecord` -> `Document` projection.
//!
//! The same `Document` backs the JSON preview endpoint and the PDF export,
//! so both always agree on section order and content. Empty sections are
//! omitted entirely.

use serde::Serialize;

use crate::models::record::{CvRecord, Education, Experience, Project};

/// Text role, mapped to a font size and weight by the paginator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockStyle {
    Name,
    Contact,
    SubHeading,
    Body,
    Bullet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub style: BlockStyle,
    pub text: String,
}

impl Block {
    fn new(style: BlockStyle, text: impl Into<String>) -> Self {
        Block {
            style,
            text: text.into(),
        }
    }
}

/// One titled slice of the document. The header section has no title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub sections: Vec<Section>,
    pub has_photo: bool,
}

/// Builds the document in its fixed order: header, Objective, Education,
/// Experience (work entries then volunteer entries), Projects, Achievements,
/// Skills, Strengths. Languages and hobbies stay wizard-only.
pub fn build_document(record: &CvRecord) -> Document {
    let mut sections = Vec::new();

    sections.push(header_section(record));

    if !record.objective.trim().is_empty() {
        sections.push(Section {
            title: Some("OBJECTIVE".to_string()),
            blocks: vec![Block::new(BlockStyle::Body, record.objective.trim())],
        });
    }

    if !record.education.is_empty() {
        sections.push(Section {
            title: Some("EDUCATION".to_string()),
            blocks: record.education.iter().flat_map(education_blocks).collect(),
        });
    }

    if !record.work_experience.is_empty() || !record.volunteer_experience.is_empty() {
        let blocks = record
            .work_experience
            .iter()
            .chain(record.volunteer_experience.iter())
            .flat_map(experience_blocks)
            .collect();
        sections.push(Section {
            title: Some("EXPERIENCE".to_string()),
            blocks,
        });
    }

    if !record.projects.is_empty() {
        sections.push(Section {
            title: Some("PROJECTS".to_string()),
            blocks: record.projects.iter().flat_map(project_blocks).collect(),
        });
    }

    if !record.achievements.is_empty() {
        sections.push(Section {
            title: Some("ACHIEVEMENTS".to_string()),
            blocks: record
                .achievements
                .iter()
                .map(|a| Block::new(BlockStyle::Bullet, a.as_str()))
                .collect(),
        });
    }

    if let Some(section) = skills_section(record) {
        sections.push(section);
    }

    if !record.strengths.is_empty() {
        sections.push(Section {
            title: Some("STRENGTHS".to_string()),
            blocks: record
                .strengths
                .iter()
                .map(|s| Block::new(BlockStyle::Bullet, s.as_str()))
                .collect(),
        });
    }

    Document {
        sections,
        has_photo: record.personal_info.photo.is_some(),
    }
}

fn header_section(record: &CvRecord) -> Section {
    let info = &record.personal_info;
    let mut blocks = Vec::new();

    let name = format!("{} {}", info.first_name.trim(), info.last_name.trim());
    let name = name.trim();
    if !name.is_empty() {
        blocks.push(Block::new(BlockStyle::Name, name));
    }

    let contact: Vec<&str> = [info.city.as_str(), info.phone.as_str(), info.email.as_str()]
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    if !contact.is_empty() {
        blocks.push(Block::new(BlockStyle::Contact, contact.join(" | ")));
    }
    if !info.linkedin.trim().is_empty() {
        blocks.push(Block::new(BlockStyle::Contact, info.linkedin.trim()));
    }

    Section {
        title: None,
        blocks,
    }
}

fn education_blocks(entry: &Education) -> Vec<Block> {
    let mut line = entry.institution.trim().to_string();
    if !entry.program.trim().is_empty() {
        if !line.is_empty() {
            line.push_str(", ");
        }
        line.push_str(entry.program.trim());
    }
    if !entry.graduation_year.trim().is_empty() {
        line.push_str(&format!(" ({})", entry.graduation_year.trim()));
    }

    let mut blocks = Vec::new();
    if !line.is_empty() {
        blocks.push(Block::new(BlockStyle::SubHeading, line));
    }
    if !entry.courses.trim().is_empty() {
        blocks.push(Block::new(BlockStyle::Body, entry.courses.trim()));
    }
    blocks
}

fn experience_blocks(entry: &Experience) -> Vec<Block> {
    let mut line = entry.role.trim().to_string();
    if !entry.organization.trim().is_empty() {
        if !line.is_empty() {
            line.push_str(" at ");
        }
        line.push_str(entry.organization.trim());
    }
    if !entry.dates.trim().is_empty() {
        if !line.is_empty() {
            line.push_str(" | ");
        }
        line.push_str(entry.dates.trim());
    }

    let mut blocks = Vec::new();
    if !line.is_empty() {
        blocks.push(Block::new(BlockStyle::SubHeading, line));
    }
    if !entry.description.trim().is_empty() {
        blocks.push(Block::new(BlockStyle::Body, entry.description.trim()));
    }
    blocks
}

fn project_blocks(entry: &Project) -> Vec<Block> {
    let mut line = entry.title.trim().to_string();
    if !entry.course.trim().is_empty() {
        if !line.is_empty() {
            line.push_str(" — ");
        }
        line.push_str(entry.course.trim());
    }

    // Prefer the polished description; fall back to the raw notes.
    let body = if entry.description.trim().is_empty() {
        entry.details.trim()
    } else {
        entry.description.trim()
    };

    let mut blocks = Vec::new();
    if !line.is_empty() {
        blocks.push(Block::new(BlockStyle::SubHeading, line));
    }
    if !body.is_empty() {
        blocks.push(Block::new(BlockStyle::Body, body));
    }
    blocks
}

fn skills_section(record: &CvRecord) -> Option<Section> {
    let skills = &record.skills;
    let mut blocks = Vec::new();
    if !skills.technical.is_empty() {
        blocks.push(Block::new(
            BlockStyle::Body,
            format!("Technical: {}", skills.technical.join(", ")),
        ));
    }
    if !skills.soft.is_empty() {
        blocks.push(Block::new(
            BlockStyle::Body,
            format!("Soft Skills: {}", skills.soft.join(", ")),
        ));
    }
    if !skills.other.trim().is_empty() {
        blocks.push(Block::new(BlockStyle::Body, skills.other.trim()));
    }
    if blocks.is_empty() {
        return None;
    }
    Some(Section {
        title: Some("SKILLS".to_string()),
        blocks,
    })
}

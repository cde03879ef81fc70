//! Block model shared by both output surfaces.
//!
//! The composer turns a [`ProfileRecord`] into two ordered block lists, one per
//! panel. Section order and the "no content, no section" rule live here, so the
//! page and the flowing document cannot disagree about them.

use serde::Serialize;

use crate::layout::theme::Theme;
use crate::profile::models::ProfileRecord;
use crate::profile::proficiency;
use crate::render::portrait::{self, Portrait};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Contact,
    Personal,
    Languages,
    Skills,
    Education,
    WorkExperience,
    Certificates,
    Interests,
}

impl SectionKind {
    pub const SIDEBAR_ORDER: [SectionKind; 4] = [
        SectionKind::Contact,
        SectionKind::Personal,
        SectionKind::Languages,
        SectionKind::Skills,
    ];

    /// Follows the name line and the objective paragraph.
    pub const MAIN_ORDER: [SectionKind; 4] = [
        SectionKind::Education,
        SectionKind::WorkExperience,
        SectionKind::Certificates,
        SectionKind::Interests,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            SectionKind::Contact => "CONTACT",
            SectionKind::Personal => "PERSONAL",
            SectionKind::Languages => "LANGUAGES",
            SectionKind::Skills => "SKILLS",
            SectionKind::Education => "EDUCATION",
            SectionKind::WorkExperience => "WORK EXPERIENCE",
            SectionKind::Certificates => "CERTIFICATES",
            SectionKind::Interests => "INTERESTS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Placeholder for the document's single [`Portrait`]; surfaces look it up in the plan.
    Portrait,
    SectionHeader(SectionKind),
    ContactLine {
        prefix: Option<&'static str>,
        value: String,
    },
    LabelValue {
        label: String,
        value: String,
    },
    Language {
        name: String,
        level: String,
        rank: u8,
    },
    SkillGroup {
        category: String,
        skills: String,
    },
    Name(String),
    Paragraph(String),
    Entry {
        title: String,
        right: Option<String>,
        subtitle: Option<String>,
        detail: Option<String>,
    },
    Bullets(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PanelContent {
    blocks: Vec<Block>,
}

impl PanelContent {
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Appends a header plus `body`, or nothing at all when `body` is empty.
    pub fn push_section(&mut self, kind: SectionKind, body: Vec<Block>) {
        if body.is_empty() {
            return;
        }
        self.blocks.push(Block::SectionHeader(kind));
        self.blocks.extend(body);
    }

    /// Section headers in emission order.
    pub fn sections(&self) -> Vec<SectionKind> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::SectionHeader(kind) => Some(*kind),
                _ => None,
            })
            .collect()
    }
}

/// Everything a surface needs to write one document.
#[derive(Debug, Clone)]
pub struct DocumentPlan {
    pub sidebar: PanelContent,
    pub main: PanelContent,
    pub portrait: Portrait,
    pub display_name: String,
}

/// Builds both panels and resolves the portrait once.
pub fn plan_document(profile: &ProfileRecord, theme: &Theme) -> DocumentPlan {
    let portrait = portrait::render(
        profile.photo.as_deref(),
        &profile.initials(),
        theme.palette.accent,
    );
    let display_name = profile.display_name();

    let mut sidebar = PanelContent::default();
    sidebar.push(Block::Portrait);
    for kind in SectionKind::SIDEBAR_ORDER {
        sidebar.push_section(kind, section_body(kind, profile));
    }

    let mut main = PanelContent::default();
    if !display_name.is_empty() {
        main.push(Block::Name(display_name.clone()));
    }
    if let Some(objective) = &profile.objective {
        main.push(Block::Paragraph(objective.clone()));
    }
    for kind in SectionKind::MAIN_ORDER {
        main.push_section(kind, section_body(kind, profile));
    }

    DocumentPlan {
        sidebar,
        main,
        portrait,
        display_name,
    }
}

fn section_body(kind: SectionKind, profile: &ProfileRecord) -> Vec<Block> {
    match kind {
        SectionKind::Contact => [
            (None, &profile.email),
            (None, &profile.phone),
            (None, &profile.address),
            (Some("in"), &profile.linkedin),
            (Some("gh"), &profile.github),
            (Some("web"), &profile.website),
        ]
        .into_iter()
        .filter_map(|(prefix, value)| {
            value.as_ref().map(|v| Block::ContactLine {
                prefix,
                value: v.clone(),
            })
        })
        .collect(),

        SectionKind::Personal => [
            ("DATE OF BIRTH", &profile.date_of_birth),
            ("NATIONALITY", &profile.nationality),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value.as_ref().map(|v| Block::LabelValue {
                label: label.to_string(),
                value: v.clone(),
            })
        })
        .collect(),

        SectionKind::Languages => profile
            .languages
            .iter()
            .map(|l| Block::Language {
                name: l.language.clone(),
                level: l.level.clone(),
                rank: proficiency::rank(&l.level),
            })
            .collect(),

        SectionKind::Skills => profile
            .skills
            .iter()
            .map(|s| Block::SkillGroup {
                category: s.category.clone(),
                skills: s.skills.clone(),
            })
            .collect(),

        SectionKind::Education => profile
            .education
            .iter()
            .map(|e| Block::Entry {
                title: e.degree.clone(),
                right: Some(e.years.clone()),
                subtitle: Some(e.institution.clone()),
                detail: e.gpa.as_ref().map(|gpa| format!("GPA: {gpa}")),
            })
            .collect(),

        SectionKind::WorkExperience => profile
            .work
            .iter()
            .flat_map(|w| {
                let entry = Block::Entry {
                    title: w.position.clone(),
                    right: Some(w.years.clone()),
                    subtitle: Some(w.company.clone()),
                    detail: None,
                };
                let bullets = w.bullets();
                std::iter::once(entry)
                    .chain((!bullets.is_empty()).then_some(Block::Bullets(bullets)))
            })
            .collect(),

        SectionKind::Certificates => profile
            .certificates
            .iter()
            .map(|c| Block::Entry {
                title: match &c.organization {
                    Some(org) => format!("{} – {org}", c.name),
                    None => c.name.clone(),
                },
                right: c.year.clone(),
                subtitle: None,
                detail: None,
            })
            .collect(),

        SectionKind::Interests => profile
            .hobbies
            .iter()
            .map(|h| Block::Paragraph(h.clone()))
            .collect(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

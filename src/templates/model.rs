use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::TemplateError;

/// Submitted form values keyed by field id.
pub type FormData = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Nepali,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Nepali => "nepali",
        }
    }

    /// Suffix used in exported filenames.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Language::English => "_EN",
            Language::Nepali => "_NP",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = TemplateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "nepali" | "np" | "ne" => Ok(Language::Nepali),
            other => Err(TemplateError::UnknownLanguage(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Number,
    Date,
    Textarea,
    Richtext,
    Select,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FieldSpec {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// Piece of inline content inside a paragraph or line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Segment {
    Literal(String),
    Field {
        field: String,
        #[serde(default)]
        placeholder: String,
    },
    Strong {
        strong: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum LayoutBlock {
    Heading {
        segments: Vec<Segment>,
    },
    Paragraph {
        segments: Vec<Segment>,
    },
    /// Consecutive short lines, e.g. an address block.
    Lines {
        lines: Vec<Vec<Segment>>,
    },
    RichText {
        field: String,
        #[serde(default)]
        placeholder: String,
    },
    Section {
        title: String,
        blocks: Vec<LayoutBlock>,
    },
    Spacer,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateDescriptor {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub supported_languages: Vec<Language>,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub layouts: BTreeMap<Language, Vec<LayoutBlock>>,
}

impl TemplateDescriptor {
    pub fn supports(&self, language: Language) -> bool {
        self.supported_languages.contains(&language)
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// Listing entry without layouts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TemplateSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub supported_languages: Vec<Language>,
    pub field_count: usize,
}

impl From<&TemplateDescriptor> for TemplateSummary {
    fn from(template: &TemplateDescriptor) -> Self {
        Self {
            id: template.id.clone(),
            title: template.title.clone(),
            description: template.description.clone(),
            category: template.category.clone(),
            supported_languages: template.supported_languages.clone(),
            field_count: template.fields.len(),
        }
    }
}

//! Built-in template descriptors, embedded at compile time from
//! `static/templates/*.json`.

use std::collections::{BTreeMap, BTreeSet};

use super::model::{TemplateDescriptor, TemplateSummary};
use super::TemplateError;

const BUILTIN_TEMPLATES: [(&str, &str); 8] = [
    (
        "leave-application",
        include_str!("../../static/templates/leave-application.json"),
    ),
    (
        "cv-resume",
        include_str!("../../static/templates/cv-resume.json"),
    ),
    (
        "marriage-affidavit",
        include_str!("../../static/templates/marriage-affidavit.json"),
    ),
    (
        "rent-agreement",
        include_str!("../../static/templates/rent-agreement.json"),
    ),
    (
        "character-certificate",
        include_str!("../../static/templates/character-certificate.json"),
    ),
    (
        "rti-application",
        include_str!("../../static/templates/rti-application.json"),
    ),
    (
        "recommendation-letter",
        include_str!("../../static/templates/recommendation-letter.json"),
    ),
    (
        "job-application-letter",
        include_str!("../../static/templates/job-application-letter.json"),
    ),
];

#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: Vec<TemplateDescriptor>,
}

impl TemplateRegistry {
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut templates = Vec::with_capacity(BUILTIN_TEMPLATES.len());
        for (id, source) in BUILTIN_TEMPLATES {
            let template: TemplateDescriptor =
                serde_json::from_str(source).map_err(|source| TemplateError::Descriptor {
                    id: id.to_string(),
                    source,
                })?;
            if template.id != id {
                return Err(TemplateError::IdMismatch {
                    expected: id.to_string(),
                    found: template.id,
                });
            }
            templates.push(template);
        }
        log::info!("Loaded {} built-in templates", templates.len());
        Ok(Self { templates })
    }

    pub fn from_templates(templates: Vec<TemplateDescriptor>) -> Self {
        Self { templates }
    }

    pub fn get(&self, id: &str) -> Option<&TemplateDescriptor> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&TemplateDescriptor, TemplateError> {
        self.get(id)
            .ok_or_else(|| TemplateError::NotFound(id.to_string()))
    }

    pub fn list(&self) -> &[TemplateDescriptor] {
        &self.templates
    }

    pub fn summaries(&self) -> Vec<TemplateSummary> {
        self.templates.iter().map(TemplateSummary::from).collect()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.templates
            .iter()
            .filter(|t| seen.insert(t.category.clone()))
            .map(|t| t.category.clone())
            .collect()
    }

    /// Templates whose title or description contains `search`
    /// (case-insensitive) within `category`, most used first. A missing
    /// category or "All" matches every template; ties keep registry order.
    pub fn search(
        &self,
        search: Option<&str>,
        category: Option<&str>,
        usage: &BTreeMap<String, i64>,
    ) -> Vec<&TemplateDescriptor> {
        let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
        let category = category.filter(|c| !c.is_empty() && *c != "All");

        let mut matches: Vec<&TemplateDescriptor> = self
            .templates
            .iter()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .filter(|t| {
                needle.is_empty()
                    || t.title.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
            })
            .collect();
        matches.sort_by_key(|t| std::cmp::Reverse(usage.get(&t.id).copied().unwrap_or(0)));
        matches
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::model::{Language, LayoutBlock, Segment};

    fn registry() -> TemplateRegistry {
        TemplateRegistry::builtin().expect("built-in templates parse")
    }

    #[test]
    fn loads_all_builtin_templates() {
        let registry = registry();
        assert_eq!(registry.len(), 8);
        assert!(registry.get("rti-application").is_some());
        assert!(registry.get("unknown").is_none());
        assert!(matches!(
            registry.require("unknown"),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn categories_are_distinct_and_ordered() {
        assert_eq!(
            registry().categories(),
            vec!["Employment", "Personal", "Legal", "Applications", "Letters"]
        );
    }

    #[test]
    fn search_filters_and_ranks_by_usage() {
        let registry = registry();
        let none = BTreeMap::new();

        fn ids<'a>(found: Vec<&'a TemplateDescriptor>) -> Vec<&'a str> {
            found.into_iter().map(|t| t.id.as_str()).collect()
        }

        assert_eq!(
            ids(registry.search(Some("LETTER"), None, &none)),
            vec!["recommendation-letter", "job-application-letter"]
        );
        assert_eq!(
            ids(registry.search(None, Some("Legal"), &none)),
            vec!["marriage-affidavit", "rent-agreement"]
        );
        assert_eq!(registry.search(None, Some("All"), &none).len(), 8);
        assert!(registry.search(Some("zzz"), None, &none).is_empty());

        let usage = BTreeMap::from([("rent-agreement".to_string(), 3)]);
        assert_eq!(
            ids(registry.search(None, Some("Legal"), &usage)),
            vec!["rent-agreement", "marriage-affidavit"]
        );
    }

    #[test]
    fn marriage_affidavit_is_english_only() {
        let registry = registry();
        let template = registry.get("marriage-affidavit").unwrap();
        assert!(template.supports(Language::English));
        assert!(!template.supports(Language::Nepali));
    }

    /// Every field a layout references must exist on its template.
    #[test]
    fn layouts_reference_declared_fields() {
        fn check(template: &crate::templates::TemplateDescriptor, blocks: &[LayoutBlock]) {
            let check_segments = |segments: &[Segment]| {
                for segment in segments {
                    if let Segment::Field { field, .. } = segment {
                        assert!(
                            template.field(field).is_some(),
                            "{} references unknown field {}",
                            template.id,
                            field
                        );
                    }
                }
            };
            for block in blocks {
                match block {
                    LayoutBlock::Heading { segments } | LayoutBlock::Paragraph { segments } => {
                        check_segments(segments)
                    }
                    LayoutBlock::Lines { lines } => lines.iter().for_each(|l| check_segments(l)),
                    LayoutBlock::RichText { field, .. } => {
                        assert!(template.field(field).is_some(), "{}: {}", template.id, field)
                    }
                    LayoutBlock::Section { blocks, .. } => check(template, blocks),
                    LayoutBlock::Spacer => {}
                }
            }
        }

        for template in registry().list() {
            for (language, blocks) in &template.layouts {
                assert!(template.supports(*language), "{} {}", template.id, language);
                check(template, blocks);
            }
        }
    }
}

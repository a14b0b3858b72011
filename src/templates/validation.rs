//! Form validation against a template's field list.

use std::fmt;

use super::model::{FieldKind, FormData, TemplateDescriptor};

/// A single rejected field.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub label: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            label: label.into(),
            message: message.into(),
        }
    }

    pub fn empty_field(field: &str, label: &str) -> Self {
        Self::new(field, label, format!("{} is required", label))
    }

    pub fn invalid_option(field: &str, label: &str, value: &str) -> Self {
        Self::new(field, label, format!("'{}' is not a valid choice for {}", value, label))
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Default)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn labels(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.label.clone()).collect()
    }

    /// "Please fill in the following fields: A, B"
    pub fn summary(&self) -> String {
        format!(
            "Please fill in the following fields: {}",
            self.labels().join(", ")
        )
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}. {}", i + 1, error)?;
        }
        Ok(())
    }
}

/// Record an error when `value` is absent or blank.
pub fn validate_required(
    value: Option<&str>,
    field: &str,
    label: &str,
    errors: &mut ValidationErrors,
) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        errors.add(ValidationError::empty_field(field, label));
    }
}

/// Labels of required fields whose value is absent or blank, in field order.
pub fn missing_required_fields(template: &TemplateDescriptor, form: &FormData) -> Vec<String> {
    let mut errors = ValidationErrors::new();
    for field in template.fields.iter().filter(|f| f.required) {
        validate_required(
            form.get(&field.id).map(String::as_str),
            &field.id,
            &field.label,
            &mut errors,
        );
    }
    errors.labels()
}

/// Full check used before export: required fields first, then select options.
pub fn validate_form(template: &TemplateDescriptor, form: &FormData) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    for field in &template.fields {
        let value = form.get(&field.id).map(String::as_str);
        if field.required {
            validate_required(value, &field.id, &field.label, &mut errors);
        }
    }
    for field in template.fields.iter().filter(|f| f.kind == FieldKind::Select) {
        let Some(value) = form.get(&field.id).map(|v| v.trim()) else {
            continue;
        };
        if !value.is_empty() && !field.options.is_empty() && !field.options.iter().any(|o| o == value) {
            errors.add(ValidationError::invalid_option(&field.id, &field.label, value));
        }
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::model::{FieldSpec, Language};
    use std::collections::BTreeMap;

    fn field(id: &str, label: &str, required: bool) -> FieldSpec {
        FieldSpec {
            id: id.into(),
            label: label.into(),
            kind: FieldKind::Text,
            required,
            rows: None,
            placeholder: None,
            options: Vec::new(),
        }
    }

    fn template(fields: Vec<FieldSpec>) -> TemplateDescriptor {
        TemplateDescriptor {
            id: "t".into(),
            title: "Test Template".into(),
            description: String::new(),
            category: "Test".into(),
            supported_languages: vec![Language::English],
            fields,
            layouts: BTreeMap::new(),
        }
    }

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn reports_only_missing_required_labels() {
        let template = template(vec![
            field("a", "A", true),
            field("b", "B", false),
            field("c", "C", true),
        ]);
        let missing = missing_required_fields(&template, &form(&[("c", "x")]));
        assert_eq!(missing, vec!["A".to_string()]);
    }

    #[test]
    fn blank_values_count_as_missing() {
        let template = template(vec![field("a", "A", true), field("b", "B", true)]);
        let missing = missing_required_fields(&template, &form(&[("a", ""), ("b", "  \n")]));
        assert_eq!(missing, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn complete_form_has_no_missing_fields() {
        let template = template(vec![field("a", "A", true)]);
        assert!(missing_required_fields(&template, &form(&[("a", "v")])).is_empty());
        assert!(validate_form(&template, &form(&[("a", "v")])).is_ok());
    }

    #[test]
    fn select_values_must_be_listed_options() {
        let mut select = field("m", "Method", false);
        select.kind = FieldKind::Select;
        select.options = vec!["Post".into(), "Email".into()];
        let template = template(vec![select]);

        assert!(validate_form(&template, &form(&[("m", "Email")])).is_ok());
        let errors = validate_form(&template, &form(&[("m", "Pigeon")])).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.to_string(),
            "1. [m] 'Pigeon' is not a valid choice for Method"
        );
    }

    #[test]
    fn summary_lists_labels() {
        let template = template(vec![field("a", "Name", true), field("b", "Date", true)]);
        let errors = validate_form(&template, &FormData::new()).unwrap_err();
        assert_eq!(
            errors.summary(),
            "Please fill in the following fields: Name, Date"
        );
    }
}

use super::model::{FormData, TemplateDescriptor};

const NAME_FIELDS: [&str; 3] = ["applicantName", "fullName", "husbandName"];

/// Title for a saved document: the custom title when given, otherwise
/// "<first word of the template title> - <person named in the form>".
pub fn document_title(
    custom: Option<&str>,
    template: &TemplateDescriptor,
    form: &FormData,
) -> String {
    if let Some(title) = custom.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    let name = NAME_FIELDS
        .iter()
        .filter_map(|id| form.get(*id))
        .map(|v| v.trim())
        .find(|v| !v.is_empty())
        .unwrap_or("Document");
    let prefix = template.title.split_whitespace().next().unwrap_or_default();
    format!("{} - {}", prefix, name)
}

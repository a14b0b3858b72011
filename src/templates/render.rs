//! Layout-driven preview rendering.
//!
//! One renderer serves every template: blocks come from the descriptor's
//! layout for the requested language, text values are escaped and rich-text
//! values go through the sanitizer.

use crate::richtext::dom::escape_text;
use crate::richtext::sanitize_html;

use super::model::{FieldKind, FormData, Language, LayoutBlock, Segment, TemplateDescriptor};
use super::TemplateError;

pub const NOT_PROVIDED: &str = "[Not provided]";

/// Root element of every preview; the PDF snapshot styles it.
pub const PREVIEW_CLASS: &str = "document-preview";
/// Class carried by containers of user-authored rich content.
pub const RICH_CONTENT_CLASS: &str = "rich-content";

pub fn render_preview(
    template: &TemplateDescriptor,
    language: Language,
    form: &FormData,
) -> Result<String, TemplateError> {
    if !template.supports(language) {
        return Err(TemplateError::UnsupportedLanguage {
            template: template.id.clone(),
            language,
        });
    }

    let mut out = format!(r#"<div class="{PREVIEW_CLASS}" lang="{language}">"#);
    match template.layouts.get(&language) {
        Some(blocks) => {
            let renderer = Renderer { template, form };
            for block in blocks {
                renderer.block(block, &mut out);
            }
        }
        None => {
            log::debug!("no {} layout for {}, using field listing", language, template.id);
            render_listing(template, form, &mut out);
        }
    }
    out.push_str("</div>");
    Ok(out)
}

fn render_listing(template: &TemplateDescriptor, form: &FormData, out: &mut String) {
    out.push_str(&format!(
        r#"<h2 style="text-align:center">{}</h2>"#,
        escape_text(&template.title.to_uppercase())
    ));
    for field in &template.fields {
        let value = form
            .get(&field.id)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty());
        let rendered = match (value, field.kind) {
            (Some(v), FieldKind::Richtext) => sanitize_html(v),
            (Some(v), _) => escape_text(v),
            (None, _) => NOT_PROVIDED.to_string(),
        };
        out.push_str(&format!(
            "<p><strong>{}:</strong> {}</p>",
            escape_text(&field.label),
            rendered
        ));
    }
}

struct Renderer<'a> {
    template: &'a TemplateDescriptor,
    form: &'a FormData,
}

impl Renderer<'_> {
    fn value(&self, field: &str) -> Option<&str> {
        self.form
            .get(field)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    fn is_rich(&self, field: &str) -> bool {
        self.template
            .field(field)
            .is_some_and(|f| f.kind == FieldKind::Richtext)
    }

    fn block(&self, block: &LayoutBlock, out: &mut String) {
        match block {
            LayoutBlock::Heading { segments } => {
                out.push_str(r#"<h2 style="text-align:center">"#);
                self.segments(segments, out);
                out.push_str("</h2>");
            }
            LayoutBlock::Paragraph { segments } => {
                out.push_str("<p>");
                self.segments(segments, out);
                out.push_str("</p>");
            }
            LayoutBlock::Lines { lines } => {
                out.push_str("<p>");
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        out.push_str("<br>");
                    }
                    self.segments(line, out);
                }
                out.push_str("</p>");
            }
            LayoutBlock::RichText { field, placeholder } => {
                out.push_str(&format!(r#"<div class="{RICH_CONTENT_CLASS}">"#));
                match self.value(field) {
                    Some(value) => out.push_str(&sanitize_html(value)),
                    None => out.push_str(&escape_text(placeholder)),
                }
                out.push_str("</div>");
            }
            LayoutBlock::Section { title, blocks } => {
                out.push_str(r#"<div class="section">"#);
                out.push_str(&format!("<h3>{}</h3>", escape_text(title)));
                for inner in blocks {
                    self.block(inner, out);
                }
                out.push_str("</div>");
            }
            LayoutBlock::Spacer => out.push_str(r#"<div class="spacer"></div>"#),
        }
    }

    fn segments(&self, segments: &[Segment], out: &mut String) {
        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(&escape_text(text)),
                Segment::Strong { strong } => {
                    out.push_str(&format!("<strong>{}</strong>", escape_text(strong)))
                }
                Segment::Field { field, placeholder } => match self.value(field) {
                    Some(value) if self.is_rich(field) => out.push_str(&sanitize_html(value)),
                    Some(value) => out.push_str(&escape_multiline(value)),
                    None => out.push_str(&escape_text(placeholder)),
                },
            }
        }
    }
}

/// Escape a plain value and keep its line breaks.
fn escape_multiline(value: &str) -> String {
    value
        .lines()
        .map(escape_text)
        .collect::<Vec<_>>()
        .join("<br>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::TemplateRegistry;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fills_fields_and_placeholders() {
        let registry = TemplateRegistry::builtin().unwrap();
        let template = registry.get("leave-application").unwrap();
        let html = render_preview(
            template,
            Language::English,
            &form(&[("applicantName", "Sita <Sharma>"), ("position", "  ")]),
        )
        .unwrap();
        assert!(html.starts_with(r#"<div class="document-preview" lang="english">"#));
        assert!(html.contains("I am Sita &lt;Sharma&gt;, holding the position of Your Position."));
        assert!(html.contains("LEAVE APPLICATION"));
    }

    #[test]
    fn rich_text_values_are_sanitized() {
        let registry = TemplateRegistry::builtin().unwrap();
        let template = registry.get("leave-application").unwrap();
        let html = render_preview(
            template,
            Language::Nepali,
            &form(&[("leaveReason", r#"<p onclick="x()">ill<script>1</script></p>"#)]),
        )
        .unwrap();
        assert!(html.contains(r#"<div class="rich-content"><p>ill</p></div>"#));
        assert!(!html.contains("script"));
        assert!(!html.contains("onclick"));
    }

    #[test]
    fn textarea_line_breaks_are_kept() {
        let registry = TemplateRegistry::builtin().unwrap();
        let template = registry.get("rent-agreement").unwrap();
        let html = render_preview(
            template,
            Language::English,
            &form(&[("propertyAddress", "Ward 4\nKathmandu")]),
        )
        .unwrap();
        assert!(html.contains("Ward 4<br>Kathmandu"));
    }

    #[test]
    fn missing_layout_falls_back_to_listing() {
        let registry = TemplateRegistry::builtin().unwrap();
        let template = registry.get("cv-resume").unwrap();
        let html =
            render_preview(template, Language::Nepali, &form(&[("fullName", "Ram")])).unwrap();
        assert!(html.contains("<h2 style=\"text-align:center\">CV/RESUME GENERATOR</h2>"));
        assert!(html.contains("<p><strong>Full Name:</strong> Ram</p>"));
        assert!(html.contains("<p><strong>Email Address:</strong> [Not provided]</p>"));
    }

    #[test]
    fn unsupported_language_is_an_error() {
        let registry = TemplateRegistry::builtin().unwrap();
        let template = registry.get("marriage-affidavit").unwrap();
        let err = render_preview(template, Language::Nepali, &FormData::new()).unwrap_err();
        assert!(matches!(err, TemplateError::UnsupportedLanguage { .. }));
    }
}

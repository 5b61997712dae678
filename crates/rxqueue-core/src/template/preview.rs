//! Live letterhead preview.

use serde::Serialize;

use crate::models::PrescriptionTemplate;

const FALLBACK_HOSPITAL_NAME: &str = "Medical Center";
const FALLBACK_ADDRESS: &str = "Hospital Address";
const FALLBACK_PHONE: &str = "+91 XXXXXXXXXX";
const FALLBACK_EMAIL: &str = "email@hospital.com";

/// What the preview pane shows for a template. Empty fields show
/// placeholder text so the layout is visible before anything is typed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePreview {
    pub hospital_name: String,
    pub address: String,
    /// `<phone> | <email>`
    pub contact_line: String,
    pub header_text: String,
    pub footer_text: String,
    pub show_header: bool,
    /// Body font size in px
    pub font_size_px: u32,
    /// Hospital name, section titles and header rule
    pub primary_color: String,
    pub secondary_color: String,
    pub show_watermark: bool,
    pub watermark_text: String,
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

impl TemplatePreview {
    /// Compute the preview for a template.
    pub fn render(template: &PrescriptionTemplate) -> Self {
        let phone = or_placeholder(&template.hospital_phone, FALLBACK_PHONE);
        let email = or_placeholder(&template.hospital_email, FALLBACK_EMAIL);

        Self {
            hospital_name: or_placeholder(&template.hospital_name, FALLBACK_HOSPITAL_NAME),
            address: or_placeholder(&template.hospital_address, FALLBACK_ADDRESS),
            contact_line: format!("{} | {}", phone, email),
            header_text: template.header_text.clone(),
            footer_text: template.footer_text.clone(),
            show_header: template.show_letterhead,
            font_size_px: template.font_size,
            primary_color: template.primary_color.clone(),
            secondary_color: template.secondary_color.clone(),
            show_watermark: template.show_watermark,
            watermark_text: template.watermark_text.clone(),
        }
    }

    /// CSS length for the body font size.
    pub fn font_size_css(&self) -> String {
        format!("{}px", self.font_size_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_for_empty_template() {
        let preview = TemplatePreview::render(&PrescriptionTemplate::default());

        assert_eq!(preview.hospital_name, "Medical Center");
        assert_eq!(preview.address, "Hospital Address");
        assert_eq!(preview.contact_line, "+91 XXXXXXXXXX | email@hospital.com");
        assert!(preview.show_header);
        assert_eq!(preview.font_size_css(), "12px");
        assert_eq!(preview.primary_color, "#0EA5E9");
    }

    #[test]
    fn test_filled_template() {
        let mut template = PrescriptionTemplate::default();
        template.hospital_name = "City Hospital".into();
        template.hospital_phone = "+91 9876543210".into();
        template.header_text = "Dr. Rao, MBBS".into();
        template.show_letterhead = false;
        template.font_size = 14;

        let preview = TemplatePreview::render(&template);
        assert_eq!(preview.hospital_name, "City Hospital");
        assert_eq!(preview.contact_line, "+91 9876543210 | email@hospital.com");
        assert_eq!(preview.header_text, "Dr. Rao, MBBS");
        assert!(!preview.show_header);
        assert_eq!(preview.font_size_px, 14);
    }
}

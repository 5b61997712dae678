//! Prescription letterhead template.

use serde::{Deserialize, Serialize};

/// Default primary (brand) color.
pub const DEFAULT_PRIMARY_COLOR: &str = "#0EA5E9";
/// Default secondary color.
pub const DEFAULT_SECONDARY_COLOR: &str = "#666666";
/// Default body font size in px.
pub const DEFAULT_FONT_SIZE: u32 = 12;
/// Default page margin in points.
pub const DEFAULT_MARGIN: u32 = 50;
/// Doctor name placement sent with every save.
pub const DOCTOR_NAME_POSITION: &str = "top-left";

/// Paper size for generated prescriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaperSize {
    #[default]
    A4,
    A5,
    Letter,
}

impl PaperSize {
    /// Parse a paper size name, ignoring case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "A4" => Some(PaperSize::A4),
            "A5" => Some(PaperSize::A5),
            "LETTER" => Some(PaperSize::Letter),
            _ => None,
        }
    }
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: DEFAULT_MARGIN,
            bottom: DEFAULT_MARGIN,
            left: DEFAULT_MARGIN,
            right: DEFAULT_MARGIN,
        }
    }
}

/// Hospital letterhead settings used when rendering prescription PDFs.
///
/// Reads tolerate missing, null and empty values (they fall back to the
/// defaults below) and the backend's `0/1` integer flags. Writes always
/// produce the full payload the backend expects, flags as `0/1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TemplateWire", into = "TemplatePayload")]
pub struct PrescriptionTemplate {
    pub template_name: String,
    pub hospital_name: String,
    pub hospital_address: String,
    pub hospital_phone: String,
    pub hospital_email: String,
    pub header_text: String,
    pub footer_text: String,
    pub font_size: u32,
    pub paper_size: PaperSize,
    pub primary_color: String,
    pub secondary_color: String,
    pub margins: Margins,
    pub show_letterhead: bool,
    pub show_watermark: bool,
    pub watermark_text: String,
}

impl Default for PrescriptionTemplate {
    fn default() -> Self {
        Self {
            template_name: "Default Template".into(),
            hospital_name: String::new(),
            hospital_address: String::new(),
            hospital_phone: String::new(),
            hospital_email: String::new(),
            header_text: String::new(),
            footer_text: String::new(),
            font_size: DEFAULT_FONT_SIZE,
            paper_size: PaperSize::default(),
            primary_color: DEFAULT_PRIMARY_COLOR.into(),
            secondary_color: DEFAULT_SECONDARY_COLOR.into(),
            margins: Margins::default(),
            show_letterhead: true,
            show_watermark: false,
            watermark_text: String::new(),
        }
    }
}

impl PrescriptionTemplate {
    /// Whether the watermark text input should be shown.
    pub fn watermark_field_visible(&self) -> bool {
        self.show_watermark
    }
}

/// Check for a `#RRGGBB` color value.
pub fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// Template as stored by the backend. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateWire {
    template_name: Option<String>,
    hospital_name: Option<String>,
    hospital_address: Option<String>,
    hospital_phone: Option<String>,
    hospital_email: Option<String>,
    header_text: Option<String>,
    footer_text: Option<String>,
    font_size: Option<u32>,
    paper_size: Option<String>,
    primary_color: Option<String>,
    secondary_color: Option<String>,
    margin_top: Option<u32>,
    margin_bottom: Option<u32>,
    margin_left: Option<u32>,
    margin_right: Option<u32>,
    show_letterhead: Option<serde_json::Value>,
    show_watermark: Option<serde_json::Value>,
    watermark_text: Option<String>,
}

/// Empty strings count as missing.
fn text_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

/// Zero counts as missing.
fn number_or(value: Option<u32>, fallback: u32) -> u32 {
    value.filter(|n| *n != 0).unwrap_or(fallback)
}

fn wire_int(value: &Option<serde_json::Value>) -> Option<i64> {
    value.as_ref().and_then(serde_json::Value::as_i64)
}

/// Letterhead is on unless the stored flag is exactly `0`.
fn letterhead_flag(value: Option<serde_json::Value>) -> bool {
    wire_int(&value) != Some(0)
}

/// Watermark is on only when the stored flag is exactly `1`.
fn watermark_flag(value: Option<serde_json::Value>) -> bool {
    wire_int(&value) == Some(1)
}

impl From<TemplateWire> for PrescriptionTemplate {
    fn from(wire: TemplateWire) -> Self {
        let defaults = PrescriptionTemplate::default();
        Self {
            template_name: text_or(wire.template_name, &defaults.template_name),
            hospital_name: wire.hospital_name.unwrap_or_default(),
            hospital_address: wire.hospital_address.unwrap_or_default(),
            hospital_phone: wire.hospital_phone.unwrap_or_default(),
            hospital_email: wire.hospital_email.unwrap_or_default(),
            header_text: wire.header_text.unwrap_or_default(),
            footer_text: wire.footer_text.unwrap_or_default(),
            font_size: number_or(wire.font_size, DEFAULT_FONT_SIZE),
            paper_size: wire
                .paper_size
                .and_then(|s| PaperSize::parse(&s))
                .unwrap_or_default(),
            primary_color: text_or(wire.primary_color, DEFAULT_PRIMARY_COLOR),
            secondary_color: text_or(wire.secondary_color, DEFAULT_SECONDARY_COLOR),
            margins: Margins {
                top: number_or(wire.margin_top, DEFAULT_MARGIN),
                bottom: number_or(wire.margin_bottom, DEFAULT_MARGIN),
                left: number_or(wire.margin_left, DEFAULT_MARGIN),
                right: number_or(wire.margin_right, DEFAULT_MARGIN),
            },
            show_letterhead: letterhead_flag(wire.show_letterhead),
            show_watermark: watermark_flag(wire.show_watermark),
            watermark_text: wire.watermark_text.unwrap_or_default(),
        }
    }
}

/// Save payload posted to the backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplatePayload {
    template_name: String,
    hospital_name: String,
    hospital_address: String,
    hospital_phone: String,
    hospital_email: String,
    header_text: String,
    footer_text: String,
    font_size: u32,
    paper_size: PaperSize,
    primary_color: String,
    secondary_color: String,
    margin_top: u32,
    margin_bottom: u32,
    margin_left: u32,
    margin_right: u32,
    show_letterhead: u8,
    show_watermark: u8,
    watermark_text: String,
    doctor_name_position: &'static str,
}

impl From<PrescriptionTemplate> for TemplatePayload {
    fn from(t: PrescriptionTemplate) -> Self {
        Self {
            template_name: t.template_name,
            hospital_name: t.hospital_name,
            hospital_address: t.hospital_address,
            hospital_phone: t.hospital_phone,
            hospital_email: t.hospital_email,
            header_text: t.header_text,
            footer_text: t.footer_text,
            font_size: t.font_size,
            paper_size: t.paper_size,
            primary_color: t.primary_color,
            secondary_color: t.secondary_color,
            margin_top: t.margins.top,
            margin_bottom: t.margins.bottom,
            margin_left: t.margins.left,
            margin_right: t.margins.right,
            show_letterhead: u8::from(t.show_letterhead),
            show_watermark: u8::from(t.show_watermark),
            watermark_text: t.watermark_text,
            doctor_name_position: DOCTOR_NAME_POSITION,
        }
    }
}

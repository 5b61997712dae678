//! Prescription template settings editor.

mod preview;

pub use preview::*;

use thiserror::Error;

use crate::backend::{BackendError, TemplateBackend};
use crate::models::{is_hex_color, PrescriptionTemplate};

/// Template editor errors.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Failed to save template: {0}")]
    SaveFailed(String),

    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

pub type TemplateResult<T> = Result<T, TemplateError>;

/// Form state of the template settings page.
pub struct TemplateEditor<B> {
    backend: B,
    template: PrescriptionTemplate,
}

impl<B: TemplateBackend> TemplateEditor<B> {
    /// Create an editor showing the default template.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            template: PrescriptionTemplate::default(),
        }
    }

    /// Load the stored template into the form. Returns `false` when the
    /// backend has none, leaving the form as it was.
    pub fn load(&mut self) -> TemplateResult<bool> {
        match self.backend.fetch_template()? {
            Some(template) => {
                tracing::debug!(name = %template.template_name, "loaded prescription template");
                self.template = template;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn template(&self) -> &PrescriptionTemplate {
        &self.template
    }

    /// Direct access to the form fields.
    pub fn template_mut(&mut self) -> &mut PrescriptionTemplate {
        &mut self.template
    }

    /// Set the primary color from either the picker or its text box.
    pub fn set_primary_color(&mut self, color: &str) -> TemplateResult<()> {
        self.template.primary_color = validated_color(color)?;
        Ok(())
    }

    /// Set the secondary color from either the picker or its text box.
    pub fn set_secondary_color(&mut self, color: &str) -> TemplateResult<()> {
        self.template.secondary_color = validated_color(color)?;
        Ok(())
    }

    /// Current live preview.
    pub fn preview(&self) -> TemplatePreview {
        TemplatePreview::render(&self.template)
    }

    /// Post the form to the backend and reload what it stored.
    pub fn save(&mut self) -> TemplateResult<()> {
        let response = self.backend.save_template(&self.template)?;
        if !response.success {
            let reason = response.error.unwrap_or_else(|| "Unknown error".into());
            tracing::warn!(%reason, "template save rejected");
            return Err(TemplateError::SaveFailed(reason));
        }

        tracing::info!(name = %self.template.template_name, "saved prescription template");
        self.load()?;
        Ok(())
    }
}

fn validated_color(color: &str) -> TemplateResult<String> {
    let color = color.trim();
    if is_hex_color(color) {
        Ok(color.to_string())
    } else {
        Err(TemplateError::InvalidColor(color.to_string()))
    }
}

//! PDF rendering for lab slips.
//!
//! Produces a single-page US Letter prescription the front office can
//! print and send with the case: practice and lab address blocks, patient
//! and procedure details, wrapped special instructions, and a footer with
//! the generation time and slip ID prefix. Rendering never touches the
//! store; it works from whatever [`LabSlip`] value it is handed.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Utc;
use printpdf::*;
use thiserror::Error;

use crate::config::PracticeInfo;
use crate::models::LabSlip;

/// Errors from document rendering.
#[derive(Error, Debug)]
pub enum RenderError {
    /// PDF assembly failure.
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Filesystem failure writing the document out.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders lab slips as printable PDFs.
pub struct SlipRenderer {
    practice: PracticeInfo,
}

impl SlipRenderer {
    /// Create a renderer with the practice letterhead details.
    pub fn new(practice: PracticeInfo) -> Self {
        Self { practice }
    }

    /// Render a slip to PDF bytes.
    pub fn render(&self, slip: &LabSlip) -> Result<Vec<u8>, RenderError> {
        // US Letter
        let (doc, page1, layer1) = PdfDocument::new(
            "Dental Laboratory Prescription",
            Mm(215.9),
            Mm(279.4),
            "Layer 1",
        );
        let layer = doc.get_page(page1).get_layer(layer1);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| RenderError::Pdf(format!("font error: {e}")))?;

        let left = Mm(25.4);
        let indent = Mm(31.0);
        let mut y = Mm(254.0);

        // Header
        layer.use_text("DENTAL LABORATORY PRESCRIPTION", 18.0, Mm(39.0), y, &bold);
        y -= Mm(4.0);
        layer.use_text("_".repeat(88), 9.0, left, y, &font);
        y -= Mm(12.0);

        // Practice block
        layer.use_text("FROM:", 11.0, left, y, &bold);
        y -= Mm(6.0);
        for line in [
            self.practice.name.as_str(),
            self.practice.address.as_str(),
            self.practice.city_state_zip.as_str(),
        ] {
            layer.use_text(line, 10.0, indent, y, &font);
            y -= Mm(5.0);
        }
        layer.use_text(format!("Phone: {}", self.practice.phone), 10.0, indent, y, &font);
        y -= Mm(9.0);

        // Lab block
        let lab_name = slip
            .lab
            .as_ref()
            .map(|lab| lab.name.as_str())
            .unwrap_or("Laboratory");
        layer.use_text("TO:", 11.0, left, y, &bold);
        y -= Mm(6.0);
        layer.use_text(lab_name, 10.0, indent, y, &font);
        y -= Mm(5.0);
        if let Some(lab) = &slip.lab {
            for line in [&lab.contact, &lab.email].into_iter().flatten() {
                layer.use_text(line, 10.0, indent, y, &font);
                y -= Mm(5.0);
            }
        }
        y -= Mm(4.0);

        // Patient block
        let patient = if slip.patient_name.is_empty() {
            "Unknown Patient"
        } else {
            slip.patient_name.as_str()
        };
        layer.use_text("PATIENT INFORMATION", 11.0, left, y, &bold);
        y -= Mm(6.0);
        layer.use_text(format!("Patient: {}", patient), 10.0, indent, y, &font);
        y -= Mm(5.0);
        if let Some(dob) = &slip.patient_dob {
            layer.use_text(format!("Date of Birth: {}", dob), 10.0, indent, y, &font);
            y -= Mm(5.0);
        }
        y -= Mm(4.0);

        // Procedure block
        layer.use_text("PROCEDURE INFORMATION", 11.0, left, y, &bold);
        y -= Mm(6.0);
        let procedure_line = match &slip.procedure_description {
            Some(description) => format!("{} - {}", slip.procedure_code, description),
            None => format!("Procedure Code: {}", slip.procedure_code),
        };
        layer.use_text(procedure_line, 10.0, indent, y, &font);
        y -= Mm(5.0);
        if let Some(tooth) = &slip.tooth_number {
            layer.use_text(format!("Tooth Number: {}", tooth), 10.0, indent, y, &font);
            y -= Mm(5.0);
        }
        if let Some(shade) = &slip.shade {
            layer.use_text(format!("Shade: {}", shade), 10.0, indent, y, &font);
            y -= Mm(5.0);
        }
        layer.use_text(format!("Due Date: {}", slip.due_date), 10.0, indent, y, &font);
        y -= Mm(9.0);

        // Special instructions, only when the slip has any
        if let Some(instructions) = slip
            .special_instructions
            .as_deref()
            .filter(|s| !s.is_empty())
        {
            layer.use_text("SPECIAL INSTRUCTIONS", 11.0, left, y, &bold);
            y -= Mm(6.0);
            for line in wrap_text(instructions, 80) {
                layer.use_text(&line, 9.0, indent, y, &font);
                y -= Mm(4.5);
            }
        }

        // Footer at a fixed position
        let id_prefix = slip.id.get(..8).unwrap_or(&slip.id);
        layer.use_text("_".repeat(88), 8.0, left, Mm(24.0), &font);
        layer.use_text(
            format!("Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S")),
            8.0,
            left,
            Mm(20.0),
            &font,
        );
        layer.use_text(format!("Lab Slip ID: {}", id_prefix), 8.0, left, Mm(15.5), &font);

        let mut buf = BufWriter::new(Vec::new());
        doc.save(&mut buf)
            .map_err(|e| RenderError::Pdf(format!("save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| RenderError::Pdf(format!("buffer error: {e}")))
    }

    /// Render a slip and write it under `dir`.
    ///
    /// The filename carries the patient name (non-alphanumerics replaced)
    /// and a second-resolution timestamp, so repeated renders of the same
    /// slip do not clobber each other.
    pub fn write_pdf(&self, slip: &LabSlip, dir: &Path) -> Result<PathBuf, RenderError> {
        let bytes = self.render(slip)?;
        let filename = format!(
            "lab_slip_{}_{}.pdf",
            sanitize_for_filename(&slip.patient_name),
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let path = dir.join(filename);
        std::fs::write(&path, bytes)?;
        tracing::info!("Wrote lab slip PDF to {}", path.display());
        Ok(path)
    }
}

fn sanitize_for_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

use super::{markdown::render, pdf::write_pdf};
use crate::{error::Result, types::trip::TripRequest};
use std::path::{Path, PathBuf};
use tracing::info;

/// Running header printed on every PDF page
pub fn document_header(destination_summary: &str) -> String {
    format!("Travel Plan – {}", destination_summary)
}

/// File name stem shared by the text and PDF exports, e.g.
/// `travel_plan_New_York_20250501-20250505`.
pub fn export_file_stem(trip: &TripRequest) -> String {
    let destinations = trip
        .destinations
        .iter()
        .map(|d| sanitize(d.trim()))
        .collect::<Vec<_>>()
        .join("_");
    format!(
        "travel_plan_{}_{}-{}",
        destinations,
        trip.start_date.format("%Y%m%d"),
        trip.end_date.format("%Y%m%d")
    )
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Plain-text export: the plan text verbatim as UTF-8
pub fn text_export(plan_text: &str) -> Vec<u8> {
    plan_text.as_bytes().to_vec()
}

/// Render `plan_text` and encode it as a paginated PDF
pub fn pdf_export(plan_text: &str, destination_summary: &str) -> Result<Vec<u8>> {
    let document = render(plan_text, &document_header(destination_summary));
    write_pdf(&document, &document_header(destination_summary))
}

/// Paths written by [`save_exports`]
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub text: PathBuf,
    pub pdf: PathBuf,
}

/// Write both export formats into `dir`.
pub fn save_exports(
    dir: &Path,
    stem: &str,
    plan_text: &str,
    destination_summary: &str,
) -> Result<ExportPaths> {
    std::fs::create_dir_all(dir)?;

    let text = dir.join(format!("{}.txt", stem));
    std::fs::write(&text, text_export(plan_text))?;

    let pdf = dir.join(format!("{}.pdf", stem));
    std::fs::write(&pdf, pdf_export(plan_text, destination_summary)?)?;

    info!(text = %text.display(), pdf = %pdf.display(), "saved plan exports");
    Ok(ExportPaths { text, pdf })
}

pub mod chrome;
pub mod layout;
pub mod pdf;

use crate::error::AppError;
use crate::model::{ReportRecord, ScalarField};
use crate::render::Document;
use std::path::{Path, PathBuf};
use tracing::info;

pub use layout::PageGeometry;
pub use pdf::{compose_pages, write_pdf, ComposedPage};

const UNSAFE_FILE_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub pages: usize,
}

fn file_name_part(value: &str) -> String {
    value
        .chars()
        .filter(|c| !UNSAFE_FILE_CHARS.contains(c) && !c.is_control())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// `{municipality}_{date}_{owner}.pdf`, with empty parts left out.
pub fn output_file_name(record: &ReportRecord) -> String {
    let parts: Vec<String> = [
        file_name_part(record.get(ScalarField::Municipality)),
        record.inspection_date().format("%Y-%m-%d").to_string(),
        file_name_part(record.get(ScalarField::Owner)),
    ]
    .into_iter()
    .filter(|p| !p.is_empty())
    .collect();

    if parts.is_empty() {
        "laudo.pdf".to_string()
    } else {
        format!("{}.pdf", parts.join("_"))
    }
}

/// Paginate, stamp and write `document` to `path`.
pub fn export_pdf(document: &Document, path: &Path) -> Result<ExportSummary, AppError> {
    let geometry = PageGeometry::default();
    let pages = compose_pages(document, &geometry)?;
    write_pdf(&document.title, &pages, &geometry, path)?;
    info!(path = %path.display(), pages = pages.len(), "report exported");

    Ok(ExportSummary {
        path: path.to_path_buf(),
        pages: pages.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn file_name_from_municipality_date_and_owner() {
        let mut record = ReportRecord::new(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        record.set_field(ScalarField::Municipality, "São José dos Pinhais");
        record.set_field(ScalarField::Owner, "João / Maria: \"Silva\"");
        assert_eq!(
            output_file_name(&record),
            "São_José_dos_Pinhais_2025-07-01_João_Maria_Silva.pdf"
        );
    }

    #[test]
    fn file_name_skips_empty_parts() {
        let record = ReportRecord::new(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(output_file_name(&record), "2025-07-01.pdf");
    }
}

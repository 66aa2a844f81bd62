use crate::models::{ListingRecord, ResultSet};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::info;

/// Column names of every tabular export, in `ListingRecord` field order
pub const COLUMNS: [&str; 8] = [
    "portal",
    "title",
    "price",
    "rooms",
    "area",
    "location",
    "url",
    "retrieved_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Json => "json",
        }
    }
}

/// Serialize every record of `results`; nothing is dropped here
pub fn export(results: &ResultSet, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Csv => to_csv(results),
        ExportFormat::Xlsx => to_xlsx(results),
        ExportFormat::Json => {
            serde_json::to_vec_pretty(results.records()).context("Failed to serialize listings to JSON")
        }
    }
}

fn to_csv(results: &ResultSet) -> Result<Vec<u8>> {
    // Header written by hand so an empty export still carries the schema
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(COLUMNS)?;
    for record in results {
        writer.serialize(record)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV buffer: {}", e.error()))
}

fn to_xlsx(results: &ResultSet) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    sheet.set_name("listings")?;

    for (col, name) in COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &bold)?;
    }

    for (i, record) in results.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, record.portal.name())?;
        sheet.write_string(row, 1, record.title.as_str())?;
        sheet.write_number(row, 2, record.price as f64)?;
        sheet.write_string(row, 3, record.rooms_or_placeholder())?;
        sheet.write_string(row, 4, record.area_or_placeholder())?;
        sheet.write_string(row, 5, record.location_or_placeholder())?;
        sheet.write_string(row, 6, record.url.as_str())?;
        sheet.write_string(row, 7, record.retrieved_at.to_string())?;
    }

    workbook
        .save_to_buffer()
        .context("Failed to build spreadsheet")
}

/// Read back a CSV export; placeholders become absent fields again
pub fn read_csv(bytes: &[u8]) -> Result<Vec<ListingRecord>> {
    csv::Reader::from_reader(bytes)
        .deserialize()
        .collect::<Result<Vec<ListingRecord>, _>>()
        .context("Failed to parse CSV export")
}

/// `listings_<location>_<date>.<ext>`, with the location reduced to a file-safe slug
pub fn export_filename(location: &str, date: NaiveDate, format: ExportFormat) -> String {
    let slug: String = location
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    let slug = if slug.is_empty() { "all".to_string() } else { slug };

    format!("listings_{}_{}.{}", slug, date.format("%Y-%m-%d"), format.extension())
}

/// Write the export under `dir` and return the file path
pub async fn save(
    results: &ResultSet,
    format: ExportFormat,
    dir: &Path,
    location: &str,
    date: NaiveDate,
) -> Result<PathBuf> {
    let bytes = export(results, format)?;
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(export_filename(location, date, format));
    tokio::fs::write(&path, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("💾 Saved {} listings to {}", results.len(), path.display());
    Ok(path)
}

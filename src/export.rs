use crate::errors::{AppError, AppResult};
use crate::models::{ExportFormat, GrantRecord};
use crate::utils::{mb_from_bytes, round_two_decimals};
use polars::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Serialize)]
struct ExportDocument<'a> {
    grants: &'a [GrantRecord],
}

/// Converts grant records into a DataFrame with the export columns.
pub fn grants_to_dataframe(grants: &[GrantRecord]) -> AppResult<DataFrame> {
    let len = grants.len();
    let mut titles = Vec::with_capacity(len);
    let mut descriptions = Vec::with_capacity(len);
    let mut sectors = Vec::with_capacity(len);
    let mut locations = Vec::with_capacity(len);
    let mut regions = Vec::with_capacity(len);
    let mut company_types = Vec::with_capacity(len);
    let mut amounts = Vec::with_capacity(len);
    let mut deadlines = Vec::with_capacity(len);
    let mut publication_dates = Vec::with_capacity(len);
    let mut days_remaining = Vec::with_capacity(len);
    let mut sources = Vec::with_capacity(len);
    let mut links = Vec::with_capacity(len);

    for grant in grants {
        titles.push(grant.title.clone());
        descriptions.push(grant.description.clone());
        sectors.push(grant.sector.clone());
        locations.push(grant.location.clone());
        regions.push(grant.region.clone());
        company_types.push(grant.company_type.clone());
        amounts.push(grant.amount.clone());
        deadlines.push(grant.deadline.clone());
        publication_dates.push(grant.publication_date.clone());
        days_remaining.push(grant.days_remaining);
        sources.push(grant.source.clone());
        links.push(grant.link.clone());
    }

    DataFrame::new(vec![
        Series::new("title", titles),
        Series::new("description", descriptions),
        Series::new("sector", sectors),
        Series::new("location", locations),
        Series::new("region", regions),
        Series::new("company_type", company_types),
        Series::new("amount", amounts),
        Series::new("deadline", deadlines),
        Series::new("publication_date", publication_dates),
        Series::new("days_remaining", days_remaining),
        Series::new("source", sources),
        Series::new("link", links),
    ])
    .map_err(|e| AppError::SerializationError(format!("Failed to create DataFrame: {e}")))
}

/// Writes the grants to `{dir}/{stem}.{ext}` and returns the path.
pub fn export_grants(
    grants: &[GrantRecord],
    format: ExportFormat,
    dir: &Path,
    stem: &str,
) -> AppResult<PathBuf> {
    fs::create_dir_all(dir)
        .map_err(|e| AppError::IoError(format!("Failed to create export directory: {e}")))?;
    let path = dir.join(format!("{stem}.{}", format.extension()));
    let mut file = File::create(&path)
        .map_err(|e| AppError::IoError(format!("Failed to create export file {path:?}: {e}")))?;

    match format {
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut file, &ExportDocument { grants }).map_err(|e| {
                AppError::SerializationError(format!("Failed to write JSON export: {e}"))
            })?;
        }
        ExportFormat::Csv => {
            let mut df = grants_to_dataframe(grants)?;
            CsvWriter::new(&mut file)
                .include_header(true)
                .finish(&mut df)
                .map_err(|e| {
                    AppError::SerializationError(format!("Failed to write CSV export: {e}"))
                })?;
        }
        ExportFormat::Parquet => {
            let mut df = grants_to_dataframe(grants)?;
            ParquetWriter::new(&mut file)
                .finish(&mut df)
                .map_err(|e| {
                    AppError::SerializationError(format!("Failed to write Parquet export: {e}"))
                })?;
        }
    }

    let size = fs::metadata(&path)
        .map(|m| round_two_decimals(mb_from_bytes(m.len())))
        .unwrap_or(0.0);
    info!(
        path = %path.display(),
        format = format.extension(),
        rows = grants.len(),
        size_mb = size,
        "Export written"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<GrantRecord> {
        let mut first = GrantRecord::new("Programa NEOTEC");
        first.amount = Some("Hasta 250.000€".to_string());
        first.days_remaining = Some(12);
        let second = GrantRecord::new("Ayudas a la digitalización");
        vec![first, second]
    }

    #[test]
    fn dataframe_has_export_columns() {
        let df = grants_to_dataframe(&sample()).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 12);
        assert_eq!(
            df.get_column_names(),
            vec![
                "title",
                "description",
                "sector",
                "location",
                "region",
                "company_type",
                "amount",
                "deadline",
                "publication_date",
                "days_remaining",
                "source",
                "link"
            ]
        );
    }

    #[test]
    fn empty_input_gives_empty_frame() {
        let df = grants_to_dataframe(&[]).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 12);
    }

    #[test]
    fn json_export_wraps_grants() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = export_grants(&sample(), ExportFormat::Json, dir.path(), "resultados").unwrap();
        assert_eq!(path, dir.path().join("resultados.json"));

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["grants"].as_array().unwrap().len(), 2);
        assert_eq!(value["grants"][0]["title"], "Programa NEOTEC");
    }

    #[test]
    fn csv_export_has_header() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = export_grants(&sample(), ExportFormat::Csv, dir.path(), "resultados").unwrap();
        let contents = fs::read_to_string(path).unwrap();
        let header = contents.lines().next().unwrap();
        assert!(header.starts_with("title,description,sector"));
        assert_eq!(contents.lines().count(), 3);
    }
}

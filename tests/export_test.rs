//! Integration tests for exporting filtered grants

#[path = "common/mod.rs"]
mod common;
use common::*;

use chrono::NaiveDate;
use polars::prelude::*;
use std::fs::{self, File};
use subvenciones_cli::cli::parse_records;
use subvenciones_cli::export::export_grants;
use subvenciones_cli::grants::process_grants;
use subvenciones_cli::models::{ExportFormat, GrantRecord};
use tempfile::TempDir;

fn sample_grants() -> Vec<GrantRecord> {
    let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
    let (records, _) = process_grants(parse_records(SAMPLE_GRANTS_JSON).unwrap(), today, None);
    records
}

#[test]
fn test_export_parquet_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let grants = sample_grants();

    let path =
        export_grants(&grants, ExportFormat::Parquet, temp_dir.path(), "resultados").unwrap();
    assert_eq!(path, temp_dir.path().join("resultados.parquet"));

    let df = ParquetReader::new(File::open(&path).unwrap())
        .finish()
        .unwrap();
    assert_eq!(df.height(), 6);
    assert_eq!(df.width(), 12);

    let titles = df.column("title").unwrap();
    assert_eq!(titles.str().unwrap().get(1), Some("Programa NEOTEC"));

    let days = df.column("days_remaining").unwrap();
    assert_eq!(days.i64().unwrap().get(0), Some(4));
    assert_eq!(days.null_count(), 1);
}

#[test]
fn test_export_json_is_reloadable() {
    let temp_dir = TempDir::new().unwrap();
    let grants = sample_grants();

    let path = export_grants(&grants, ExportFormat::Json, temp_dir.path(), "resultados").unwrap();
    let reloaded = parse_records(&fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(reloaded, grants);
}

#[test]
fn test_export_csv_header() {
    let temp_dir = TempDir::new().unwrap();
    let grants = sample_grants();

    let path = export_grants(&grants, ExportFormat::Csv, temp_dir.path(), "resultados").unwrap();
    let contents = fs::read_to_string(&path).unwrap();
    let header = contents.lines().next().unwrap();

    assert!(header.starts_with("title,description,sector,location"));
    assert_eq!(contents.lines().count(), 7);
}

#[test]
fn test_export_creates_missing_directory() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("exports").join("2024");

    let path = export_grants(&[], ExportFormat::Json, &nested, "vacio").unwrap();

    assert!(path.exists());
    assert!(parse_records(&fs::read_to_string(&path).unwrap())
        .unwrap()
        .is_empty());
}

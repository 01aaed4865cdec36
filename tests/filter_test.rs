//! Integration tests for result filtering over a saved grant list

#[path = "common/mod.rs"]
mod common;
use common::*;

use chrono::NaiveDate;
use subvenciones_cli::cli::{load_records, parse_records};
use subvenciones_cli::filter::{FilterEvaluator, FilterSession};
use subvenciones_cli::grants::process_grants;
use subvenciones_cli::models::{
    Country, FilterState, GrantRecord, QuickFilter, Urgency, UrgencyLevel,
};
use tempfile::TempDir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn sample_grants() -> Vec<GrantRecord> {
    let records = parse_records(SAMPLE_GRANTS_JSON).unwrap();
    let (records, _) = process_grants(records, today(), None);
    records
}

fn visible_titles(records: &[GrantRecord], state: &FilterState) -> Vec<String> {
    FilterEvaluator::new(today())
        .evaluate(records, state)
        .select(records)
        .into_iter()
        .map(|r| r.title.clone())
        .collect()
}

#[test]
fn test_sample_urgencies() {
    let records = sample_grants();
    let urgencies: Vec<Urgency> = records.iter().map(|r| r.urgency).collect();

    assert_eq!(
        urgencies,
        vec![
            Urgency::Critical,
            Urgency::Low,
            Urgency::Medium,
            Urgency::Low,
            Urgency::Expired,
            Urgency::Unknown,
        ]
    );
    assert_eq!(records[0].days_remaining, Some(4));
    assert_eq!(records[4].days_remaining, Some(0));
    assert_eq!(records[5].days_remaining, None);
}

#[test]
fn test_default_state_shows_everything() {
    let records = sample_grants();
    let visibility = FilterEvaluator::new(today()).evaluate(&records, &FilterState::default());

    assert_eq!(visibility.shown(), records.len());
    assert_eq!(
        visibility.counter_text(&FilterState::default()),
        "Mostrando 6 de 6 subvenciones · Filtrado por: Todas"
    );
}

#[test]
fn test_country_spain() {
    let records = sample_grants();
    let titles = visible_titles(&records, &FilterState::new(Country::Spain));

    assert_eq!(
        titles,
        vec![
            "Ayudas a la digitalización de PYMES en Madrid",
            "Programa NEOTEC",
            "Subvenciones al comercio en Sevilla",
            "Convocatoria sin ubicación",
        ]
    );
}

#[test]
fn test_country_eu_and_international() {
    let records = sample_grants();

    assert_eq!(
        visible_titles(&records, &FilterState::new(Country::Eu)),
        vec!["Horizon Europe - Cluster 5", "Convocatoria sin ubicación"]
    );
    assert_eq!(
        visible_titles(&records, &FilterState::new(Country::International)),
        vec!["Fondo Mundial de Innovación", "Convocatoria sin ubicación"]
    );
}

#[test]
fn test_region_narrows_spain_only() {
    let records = sample_grants();

    let andalucia = FilterState::new(Country::Spain).with_region("Andalucía");
    assert_eq!(
        visible_titles(&records, &andalucia),
        vec!["Subvenciones al comercio en Sevilla", "Convocatoria sin ubicación"]
    );
    assert_eq!(
        FilterEvaluator::new(today())
            .evaluate(&records, &andalucia)
            .counter_text(&andalucia),
        "Mostrando 2 de 6 subvenciones · Filtrado por: Andalucía (España)"
    );

    for country in [Country::Eu, Country::International, Country::All] {
        let with_region = FilterState::new(country).with_region("Andalucía");
        let without_region = FilterState::new(country);
        assert_eq!(
            visible_titles(&records, &with_region),
            visible_titles(&records, &without_region)
        );
    }
}

#[test]
fn test_quick_filters() {
    let records = sample_grants();

    assert_eq!(
        visible_titles(&records, &FilterState::default().with_quick(QuickFilter::Urgent)),
        vec!["Ayudas a la digitalización de PYMES en Madrid"]
    );
    assert_eq!(
        visible_titles(
            &records,
            &FilterState::default().with_quick(QuickFilter::HighAmount)
        ),
        vec![
            "Ayudas a la digitalización de PYMES en Madrid",
            "Horizon Europe - Cluster 5",
        ]
    );
    assert_eq!(
        visible_titles(&records, &FilterState::default().with_quick(QuickFilter::Recent)),
        vec![
            "Ayudas a la digitalización de PYMES en Madrid",
            "Subvenciones al comercio en Sevilla",
        ]
    );
}

#[test]
fn test_urgent_spain_example() {
    let mut madrid = GrantRecord::new("Ayuda Madrid");
    madrid.location = Some("Madrid".to_string());
    madrid.region = Some("Madrid".to_string());
    madrid.urgency = Urgency::Critical;

    let mut francia = GrantRecord::new("Ayuda Francia");
    francia.location = Some("Francia".to_string());
    francia.region = Some(String::new());
    francia.urgency = Urgency::Low;

    let state = FilterState::new(Country::Spain)
        .with_region("Todas")
        .with_quick(QuickFilter::Urgent);
    let visibility = FilterEvaluator::new(today()).evaluate(&[madrid, francia], &state);

    assert_eq!(visibility.flags(), &[true, false]);
}

#[test]
fn test_query_and_urgency_level() {
    let records = sample_grants();

    assert_eq!(
        visible_titles(&records, &FilterState::default().with_query("neotec")),
        vec!["Programa NEOTEC"]
    );
    // Matches the description, without the accent
    assert_eq!(
        visible_titles(&records, &FilterState::default().with_query("transformacion")),
        vec!["Ayudas a la digitalización de PYMES en Madrid"]
    );
    assert_eq!(
        visible_titles(
            &records,
            &FilterState::default().with_urgency(UrgencyLevel::Active)
        )
        .len(),
        5
    );
}

#[test]
fn test_source_filter() {
    let records = sample_grants();
    let titles = visible_titles(&records, &FilterState::default().with_source("cdti"));
    assert_eq!(titles, vec!["Programa NEOTEC"]);
}

#[test]
fn test_evaluation_is_idempotent() {
    let records = sample_grants();
    let evaluator = FilterEvaluator::new(today());
    let state = FilterState::new(Country::Spain).with_quick(QuickFilter::Recent);

    let first = evaluator.evaluate(&records, &state);
    let second = evaluator.evaluate(&records, &state);
    assert_eq!(first, second);
}

#[test]
fn test_session_clear_and_country_reset() {
    let records = sample_grants();
    let state = FilterState::new(Country::Spain)
        .with_region("Madrid")
        .with_quick(QuickFilter::Urgent);
    let mut session = FilterSession::with_state(FilterEvaluator::new(today()), state);

    assert_eq!(session.apply(&records).shown(), 1);

    session.set_quick(QuickFilter::Clear);
    // Madrid plus the record without a location
    assert_eq!(session.apply(&records).shown(), 2);
    assert_eq!(session.state().quick, QuickFilter::None);

    session.set_country(Country::Eu);
    assert_eq!(session.state().region, None);
    assert_eq!(session.apply(&records).shown(), 2);
}

#[test]
fn test_load_records_from_directory() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(&temp_dir.path().join("a_busqueda.json"), SAMPLE_GRANTS_JSON);
    create_test_file(
        &temp_dir.path().join("b_lista.json"),
        r#"[{"title": "Ayuda suelta", "location": "Murcia"}]"#,
    );
    create_test_file(&temp_dir.path().join("notas.txt"), "no es json");

    let records = load_records(temp_dir.path()).unwrap();

    assert_eq!(records.len(), 7);
    assert_eq!(records[6].title, "Ayuda suelta");
}

#[test]
fn test_load_records_invalid_json() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("roto.json");
    create_test_file(&path, "{\"grants\": [");

    assert!(load_records(&path).is_err());
}

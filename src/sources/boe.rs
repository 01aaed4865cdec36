//! Daily summaries of the Boletín Oficial del Estado.
//!
//! Each day's summary is a JSON document; grant calls are picked out by keywords in
//! the item titles and tagged with the place names they mention.

use super::http::{HttpFetcher, ACCEPT_JSON};
use crate::config::ResolvedConfig;
use crate::constants::{
    AMOUNT_UNKNOWN, BOE_DAILY_URL, BOE_DATE_FORMAT, BOE_SOURCE_NAME, BOE_SUMMARY_URL, DATE_FORMAT,
};
use crate::errors::AppResult;
use crate::filter::keywords::{contains_any, find_region, normalize, REGION_KEYWORDS};
use crate::models::{GrantRecord, SearchCriteria};
use crate::ui;
use chrono::{Duration, NaiveDate};
use indicatif::MultiProgress;
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{info, warn};

const MAX_TITLE_CHARS: usize = 150;
const DEADLINE_OFFSET_DAYS: i64 = 45;
const DESCRIPTION: &str = "Convocatoria oficial publicada en BOE.";

/// Words that mark a summary item as a grant or support programme.
const RELEVANCE_KEYWORDS: &[&str] = &[
    "subvencion",
    "ayuda",
    "convocatoria",
    "financiacion",
    "programa",
    "incentivo",
    "apoyo",
    "fomento",
];

const HIGH_RELEVANCE: &[&str] = &["subvencion", "ayuda", "convocatoria"];
const AMENDMENT_WORDS: &[&str] = &["modificacion", "correccion", "prorroga"];

const EU_TITLE_KEYWORDS: &[&str] = &["union europea", "ue", "europa", "european"];

const SECTOR_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Tecnología",
        &["tecnologia", "tecnologico", "digital", "innovacion", "i+d+i", "startup", "tic"],
    ),
    (
        "Energía",
        &["energia", "energetico", "renovable", "eficiencia energetica", "autoconsumo"],
    ),
    ("Industria", &["industria", "industrial", "manufactura", "produccion"]),
    ("Agricultura", &["agricultura", "agricola", "rural", "ganadero", "agrario"]),
    (
        "Comercio",
        &["comercio", "comercial", "exportacion", "internacionalizacion"],
    ),
    ("Servicios", &["servicios", "terciario", "turismo", "hosteleria"]),
    ("Construcción", &["construccion", "vivienda", "edificacion", "obra"]),
    ("Salud", &["salud", "sanitario", "medico", "farmaceutico"]),
    ("Turismo", &["turismo", "turistico", "hosteleria", "restauracion"]),
    ("Educación", &["educacion", "educativo", "formacion", "universidad"]),
    (
        "Transporte",
        &["transporte", "logistica", "movilidad", "infraestructura"],
    ),
];

static AMOUNT_EUROS_REGEX: OnceLock<Regex> = OnceLock::new();
static AMOUNT_CAP_REGEX: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, Default, Deserialize)]
struct SummaryEnvelope {
    #[serde(default)]
    sumario: Option<Summary>,
    #[serde(default)]
    data: Option<SummaryData>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryData {
    #[serde(default)]
    sumario: Option<Summary>,
}

#[derive(Debug, Default, Deserialize)]
struct Summary {
    #[serde(default)]
    secciones: Vec<Section>,
}

#[derive(Debug, Default, Deserialize)]
struct Section {
    #[serde(default)]
    secciones: Vec<Subsection>,
}

#[derive(Debug, Default, Deserialize)]
struct Subsection {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Default, Deserialize)]
struct Item {
    #[serde(default)]
    titulo: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    identificador: Option<String>,
}

fn is_grant_title(title: &str) -> bool {
    contains_any(title, RELEVANCE_KEYWORDS)
}

/// Unknown sectors fall back to their own name as the only keyword.
fn matches_sector(title: &str, sector: &str) -> bool {
    let wanted = normalize(sector.trim());
    match SECTOR_KEYWORDS
        .iter()
        .find(|(name, _)| normalize(name) == wanted)
    {
        Some((_, keywords)) => contains_any(title, keywords),
        None => title.contains(&wanted),
    }
}

/// Location criteria against a normalised title.
fn matches_location(title: &str, criteria: &SearchCriteria) -> bool {
    if criteria.any_location() {
        return true;
    }
    let location = normalize(criteria.location.trim());
    match location.as_str() {
        "espana" | "spain" => {
            if contains_any(title, EU_TITLE_KEYWORDS) {
                return false;
            }
            match find_region(&criteria.region) {
                Some((_, keywords)) if !criteria.any_region() => contains_any(title, keywords),
                _ => true,
            }
        }
        "ue" | "eu" | "union europea" => {
            contains_any(title, EU_TITLE_KEYWORDS) || title.contains("horizon")
        }
        _ => match find_region(&criteria.location) {
            Some((_, keywords)) => contains_any(title, keywords),
            None => true,
        },
    }
}

fn region_in_title(title: &str) -> Option<&'static str> {
    REGION_KEYWORDS
        .iter()
        .find(|(_, keywords)| contains_any(title, keywords))
        .map(|(name, _)| *name)
}

/// Region named in the title, then "Unión Europea" for EU titles, then the criteria.
fn location_from_title(title: &str, criteria: &SearchCriteria) -> String {
    if let Some(region) = region_in_title(title) {
        return region.to_string();
    }
    if contains_any(title, EU_TITLE_KEYWORDS) {
        return "Unión Europea".to_string();
    }
    if criteria.any_location() {
        "España".to_string()
    } else {
        criteria.location.clone()
    }
}

/// First euro amount (or capped amount) mentioned in the text, as `"Hasta X€"`.
pub fn amount_from_text(text: &str) -> String {
    let euros = AMOUNT_EUROS_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{2})?)\s*(?:€|euros?)")
            .expect("euro amount pattern is a valid regex")
    });
    let capped = AMOUNT_CAP_REGEX.get_or_init(|| {
        Regex::new(r"(?i)(?:hasta|máximo|maximo|importe)\s*:?\s*(\d{1,3}(?:[.,]\d{3})*)")
            .expect("capped amount pattern is a valid regex")
    });

    [euros, capped]
        .into_iter()
        .find_map(|regex| regex.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| format!("Hasta {}€", m.as_str()))
        .unwrap_or_else(|| AMOUNT_UNKNOWN.to_string())
}

/// Base 5, +2 for an explicit grant word, -2 for amendments, within 1..=10.
pub fn relevance_score(title: &str) -> u8 {
    let title = normalize(title);
    let mut score: i32 = 5;
    if contains_any(&title, HIGH_RELEVANCE) {
        score += 2;
    }
    if contains_any(&title, AMENDMENT_WORDS) {
        score -= 2;
    }
    score.clamp(1, 10) as u8
}

/// Turns one day's summary into grant records matching the criteria.
pub fn parse_summary(
    body: &str,
    date: NaiveDate,
    criteria: &SearchCriteria,
    today: NaiveDate,
) -> AppResult<Vec<GrantRecord>> {
    let envelope: SummaryEnvelope = serde_json::from_str(body)?;
    let Some(summary) = envelope
        .sumario
        .or_else(|| envelope.data.and_then(|d| d.sumario))
    else {
        return Ok(Vec::new());
    };

    let deadline = (today + Duration::days(DEADLINE_OFFSET_DAYS))
        .format(DATE_FORMAT)
        .to_string();
    let publication = date.format(DATE_FORMAT).to_string();
    let fallback_link = format!("{BOE_DAILY_URL}/{}/", date.format("%Y/%m/%d"));

    let records = summary
        .secciones
        .into_iter()
        .flat_map(|section| section.secciones)
        .flat_map(|subsection| subsection.items)
        .filter_map(|item| {
            let normalized = normalize(&item.titulo);
            if !is_grant_title(&normalized)
                || !(criteria.any_sector() || matches_sector(&normalized, &criteria.sector))
                || !matches_location(&normalized, criteria)
            {
                return None;
            }

            let mut record =
                GrantRecord::new(item.titulo.chars().take(MAX_TITLE_CHARS).collect::<String>());
            record.description = Some(DESCRIPTION.to_string());
            record.sector = Some(criteria.sector.clone());
            record.location = Some(location_from_title(&normalized, criteria));
            record.region = Some(
                region_in_title(&normalized)
                    .map(str::to_string)
                    .unwrap_or_else(|| criteria.region.clone()),
            );
            record.company_type = Some(criteria.company_type.clone());
            record.amount = Some(amount_from_text(&item.titulo));
            record.deadline = Some(deadline.clone());
            record.publication_date = Some(publication.clone());
            record.source = Some(BOE_SOURCE_NAME.to_string());
            record.link = Some(item.url.unwrap_or_else(|| fallback_link.clone()));
            record.identifier = item.identificador;
            record.relevance_score = Some(relevance_score(&item.titulo));
            Some(record)
        })
        .collect();

    Ok(records)
}

/// Scans the last `days_back` daily summaries, newest first.
#[derive(Debug, Clone)]
pub struct BoeSource {
    fetcher: HttpFetcher,
    days_back: u32,
    max_results: usize,
    progress: MultiProgress,
}

impl BoeSource {
    pub fn new(fetcher: HttpFetcher, config: &ResolvedConfig, progress: MultiProgress) -> Self {
        Self {
            fetcher,
            days_back: config.boe_days_back,
            max_results: config.boe_max_results,
            progress,
        }
    }

    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        today: NaiveDate,
    ) -> AppResult<Vec<GrantRecord>> {
        info!(days_back = self.days_back, "Querying BOE daily summaries");
        let pb = ui::add_progress_bar(&self.progress, u64::from(self.days_back), "BOE")?;
        let mut grants = Vec::new();

        for offset in 0..self.days_back {
            let date = today - Duration::days(i64::from(offset));
            let url = format!("{BOE_SUMMARY_URL}/{}", date.format(BOE_DATE_FORMAT));

            match self.fetcher.get_text(&url, ACCEPT_JSON).await {
                Ok(body) => match parse_summary(&body, date, criteria, today) {
                    Ok(found) => grants.extend(found),
                    Err(e) => warn!(date = %date, error = %e, "Skipping unreadable BOE summary"),
                },
                Err(e) => warn!(date = %date, error = %e, "Skipping BOE summary"),
            }
            pb.inc(1);

            if grants.len() >= self.max_results {
                break;
            }
            self.fetcher.pause().await;
        }

        grants.truncate(self.max_results);
        pb.finish_and_clear();
        info!(found = grants.len(), "BOE search completed");
        Ok(grants)
    }
}

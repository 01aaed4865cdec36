//! Programme listings on the CDTI website.
//!
//! Listing pages are scanned for links whose text names a programme or call; each
//! programme page is then opened for a description and an amount.

use super::http::{HttpFetcher, ACCEPT_HTML};
use crate::config::ResolvedConfig;
use crate::constants::{
    AMOUNT_SEE_CALL, AMOUNT_UNKNOWN, CDTI_SECTIONS, CDTI_SOURCE_NAME, DATE_FORMAT,
};
use crate::errors::AppResult;
use crate::filter::keywords::{contains_any, normalize};
use crate::models::{GrantRecord, SearchCriteria};
use crate::ui;
use chrono::{Duration, NaiveDate};
use indicatif::MultiProgress;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::{info, warn};
use url::Url;

const MIN_TITLE_CHARS: usize = 10;
const MAX_TITLE_CHARS: usize = 200;
const MIN_DESCRIPTION_CHARS: usize = 100;
const MAX_DESCRIPTION_CHARS: usize = 600;
const MIN_RELEVANCE: u8 = 4;
const DEADLINE_OFFSET_DAYS: i64 = 90;
const DEFAULT_DESCRIPTION: &str =
    "Programa del CDTI. Consulta la documentación oficial para más detalles.";

const LINK_SELECTORS: &[&str] = &[
    r#"a[href*="MP=4"]"#,
    r#"a[href*="programa"]"#,
    r#"a[href*="convocatoria"]"#,
    r#"a[href*="ayuda"]"#,
    "td a",
    ".contenido a",
    r#"div[class*="texto"] a"#,
    "p a",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    "div.contenido p",
    "td p",
    r#"div[class*="texto"] p"#,
    ".descripcion",
    ".resumen",
    "p",
];

const PROGRAMME_KEYWORDS: &[&str] = &[
    "programa",
    "ayuda",
    "convocatoria",
    "subvencion",
    "financiacion",
    "i+d",
    "innovacion",
    "tecnologico",
    "neotec",
    "eureka",
    "innterconecta",
    "pid",
    "cooperacion",
    "internacional",
];

const EXCLUDED_KEYWORDS: &[&str] = &[
    "contacto",
    "aviso legal",
    "cookies",
    "mapa",
    "busqueda",
    "newsletter",
    "rss",
    "imprimir",
    "pdf",
    "descargar",
];

const FUNDING_WORDS: &[&str] = &["financiacion", "subvencion", "ayuda", "prestamo", "incentivo"];

const SECTOR_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Tecnología",
        &["tecnologia", "tic", "digital", "software", "ia", "innovacion tecnologica", "neotec"],
    ),
    (
        "Industria",
        &["industria", "industrial", "manufactura", "produccion", "innterconecta"],
    ),
    ("Energía", &["energia", "energetico", "renovables", "sostenible"]),
    ("Salud", &["salud", "biotecnologia", "farmaceutico", "biomedico"]),
    ("Transporte", &["transporte", "movilidad", "logistica", "automocion"]),
    ("Aeroespacial", &["aeroespacial", "aeronautico", "espacial", "defensa"]),
];

/// Looser keyword lists used when checking a programme against a requested sector.
const SECTOR_MATCH_KEYWORDS: &[(&str, &[&str])] = &[
    ("Tecnología", &["tecnologia", "tic", "digital", "innovacion"]),
    ("Industria", &["industria", "industrial", "manufactura"]),
    ("Energía", &["energia", "renovables", "sostenible"]),
    ("Salud", &["salud", "biotecnologia", "farmaceutico"]),
];

const HIGH_RELEVANCE: &[&str] = &[
    "i+d+i",
    "innovacion",
    "tecnologico",
    "neotec",
    "eureka",
    "innterconecta",
];
const MEDIUM_RELEVANCE: &[&str] = &["programa", "ayuda", "subvencion", "financiacion"];
const AMENDMENT_WORDS: &[&str] = &["modificacion", "correccion", "prorroga"];

const AMOUNT_PATTERNS: &[&str] = &[
    r"hasta\s+(\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{2})?)\s*(?:€|euros?|millones?)",
    r"importe.*?(\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{2})?)\s*(?:€|euros?)",
    r"dotación.*?(\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{2})?)\s*(?:€|euros?|millones?)",
    r"presupuesto.*?(\d{1,3}(?:[.,]\d{3})*(?:[.,]\d{2})?)\s*(?:€|euros?|millones?)",
    r"(\d{1,3}(?:[.,]\d{3})*)\s*(?:€|euros?)\s*(?:máximo|hasta)",
];
const PERCENT_PATTERN: &str = r"subvención.*?(\d{1,2})\s*%";

static LINK_SELECTORS_CACHED: OnceLock<Vec<Selector>> = OnceLock::new();
static DESCRIPTION_SELECTORS_CACHED: OnceLock<Vec<Selector>> = OnceLock::new();
static AMOUNT_REGEXES: OnceLock<Vec<Regex>> = OnceLock::new();
static PERCENT_REGEX: OnceLock<Regex> = OnceLock::new();
static PUNCTUATION_REGEX: OnceLock<Regex> = OnceLock::new();

fn compile_selectors(patterns: &[&str]) -> Vec<Selector> {
    patterns
        .iter()
        .map(|p| Selector::parse(p).expect("CDTI selectors are valid CSS selectors"))
        .collect()
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// A candidate programme link found on a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramLink {
    pub url: String,
    pub title: String,
}

/// Description and amount read from a programme page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramDetails {
    pub description: Option<String>,
    pub amount: String,
}

impl Default for ProgramDetails {
    fn default() -> Self {
        Self {
            description: None,
            amount: AMOUNT_UNKNOWN.to_string(),
        }
    }
}

/// A title names a programme and is not navigation chrome.
pub fn is_programme_title(title: &str) -> bool {
    let title = normalize(title);
    contains_any(&title, PROGRAMME_KEYWORDS) && !contains_any(&title, EXCLUDED_KEYWORDS)
}

/// Extracts programme links from a listing page, in selector order, unique by URL.
pub fn parse_program_links(html: &str, base_url: &Url) -> Vec<ProgramLink> {
    let document = Html::parse_document(html);
    let selectors = LINK_SELECTORS_CACHED.get_or_init(|| compile_selectors(LINK_SELECTORS));

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for selector in selectors {
        for element in document.select(selector) {
            let Some(href) = element.value().attr("href").map(str::trim) else {
                continue;
            };
            let title = element_text(element);
            if href.is_empty() || title.chars().count() < MIN_TITLE_CHARS {
                continue;
            }
            let Ok(url) = base_url.join(href) else {
                continue;
            };
            if !is_programme_title(&title) || !seen.insert(url.to_string()) {
                continue;
            }
            links.push(ProgramLink {
                url: url.to_string(),
                title: title.chars().take(MAX_TITLE_CHARS).collect(),
            });
        }
    }

    links
}

/// Reads the description and the funding amount from a programme page.
pub fn parse_program_page(html: &str, title: &str) -> ProgramDetails {
    let document = Html::parse_document(html);
    let selectors =
        DESCRIPTION_SELECTORS_CACHED.get_or_init(|| compile_selectors(DESCRIPTION_SELECTORS));
    let title_lower = title.to_lowercase();

    let description = selectors
        .iter()
        .flat_map(|selector| document.select(selector))
        .map(element_text)
        .find(|text| {
            text.chars().count() > MIN_DESCRIPTION_CHARS
                && !title_lower.contains(&text.to_lowercase())
        })
        .map(|text| text.chars().take(MAX_DESCRIPTION_CHARS).collect());

    let page_text = element_text(document.root_element()).to_lowercase();

    ProgramDetails {
        description,
        amount: amount_from_page_text(&page_text),
    }
}

/// Amount wording for a lowercased page text.
pub fn amount_from_page_text(text: &str) -> String {
    let regexes = AMOUNT_REGEXES.get_or_init(|| {
        AMOUNT_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("CDTI amount patterns are valid regexes"))
            .collect()
    });

    if let Some(amount) = regexes
        .iter()
        .find_map(|regex| regex.captures(text).and_then(|c| c.get(1)))
    {
        let amount = amount.as_str();
        return if text.contains("millones") || text.contains("millón") {
            format!("Hasta {amount}M€")
        } else {
            format!("Hasta {amount}€")
        };
    }

    let percent = PERCENT_REGEX.get_or_init(|| {
        Regex::new(PERCENT_PATTERN).expect("CDTI percent pattern is a valid regex")
    });
    if let Some(share) = percent.captures(text).and_then(|c| c.get(1)) {
        return format!("Hasta {}% del proyecto", share.as_str());
    }

    if contains_any(&normalize(text), FUNDING_WORDS) {
        AMOUNT_SEE_CALL.to_string()
    } else {
        AMOUNT_UNKNOWN.to_string()
    }
}

/// First sector whose keywords appear in the content; CDTI programmes default to technology.
pub fn sector_from_content(content: &str) -> &'static str {
    let content = normalize(content);
    SECTOR_KEYWORDS
        .iter()
        .find(|(_, keywords)| contains_any(&content, keywords))
        .map(|(sector, _)| *sector)
        .unwrap_or("Tecnología")
}

pub fn company_type_from_content(content: &str) -> &'static str {
    let content = normalize(content);
    if contains_any(&content, &["pyme", "pequena", "mediana"]) {
        "PYME"
    } else if contains_any(&content, &["startup", "nueva empresa"]) {
        "Startup"
    } else if contains_any(&content, &["gran empresa", "grande"]) {
        "Grande empresa"
    } else if contains_any(&content, &["universidad", "centro de investigacion"]) {
        "Centro de investigación"
    } else {
        "Todos"
    }
}

/// Base 6; +2 per innovation keyword, +1 per funding word, -2 per amendment word.
pub fn relevance_score(title: &str, description: &str) -> u8 {
    let text = normalize(&format!("{title} {description}"));
    let count = |words: &[&str]| words.iter().filter(|w| text.contains(*w)).count() as i32;
    let score =
        6 + 2 * count(HIGH_RELEVANCE) + count(MEDIUM_RELEVANCE) - 2 * count(AMENDMENT_WORDS);
    score.clamp(1, 10) as u8
}

fn identifier_for(title: &str) -> String {
    let compact: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .take(30)
        .collect();
    format!("CDTI_{compact}")
}

/// Builds the record for a programme link.
pub fn build_grant(link: &ProgramLink, details: ProgramDetails, today: NaiveDate) -> GrantRecord {
    let description = details.description.unwrap_or_default();
    let content = format!("{} {description}", link.title);

    let mut record = GrantRecord::new(link.title.clone());
    record.sector = Some(sector_from_content(&content).to_string());
    record.location = Some("España".to_string());
    record.region = Some("Todas".to_string());
    record.company_type = Some(company_type_from_content(&content).to_string());
    record.amount = Some(details.amount);
    record.deadline = Some(
        (today + Duration::days(DEADLINE_OFFSET_DAYS))
            .format(DATE_FORMAT)
            .to_string(),
    );
    record.publication_date = Some(today.format(DATE_FORMAT).to_string());
    record.source = Some(CDTI_SOURCE_NAME.to_string());
    record.link = Some(link.url.clone());
    record.relevance_score = Some(relevance_score(&link.title, &description));
    record.identifier = Some(identifier_for(&link.title));
    record.description = Some(if description.is_empty() {
        DEFAULT_DESCRIPTION.to_string()
    } else {
        description
    });
    record
}

/// Programmes below the minimum relevance, or outside the requested sector, are dropped.
pub fn is_relevant(record: &GrantRecord, criteria: &SearchCriteria) -> bool {
    if record.title.trim().is_empty() {
        return false;
    }
    if record.relevance_score.unwrap_or(0) < MIN_RELEVANCE {
        return false;
    }
    if criteria.any_sector() || record.sector.as_deref() == Some(criteria.sector.as_str()) {
        return true;
    }

    let wanted = normalize(criteria.sector.trim());
    let content = normalize(&format!(
        "{} {}",
        record.title,
        record.description.as_deref().unwrap_or("")
    ));
    match SECTOR_MATCH_KEYWORDS
        .iter()
        .find(|(name, _)| normalize(name) == wanted)
    {
        Some((_, keywords)) => contains_any(&content, keywords),
        None => content.contains(&wanted),
    }
}

/// Drops near-duplicate titles (first 50 normalised characters), then orders by
/// relevance, highest first, and keeps at most `max_results`.
pub fn rank_programmes(records: Vec<GrantRecord>, max_results: usize) -> Vec<GrantRecord> {
    let punctuation = PUNCTUATION_REGEX.get_or_init(|| {
        Regex::new(r"[^\w\s]").expect("punctuation pattern is a valid regex")
    });

    let mut seen = HashSet::new();
    let mut unique: Vec<GrantRecord> = records
        .into_iter()
        .filter(|record| {
            let key: String = punctuation
                .replace_all(&record.title, "")
                .to_lowercase()
                .chars()
                .take(50)
                .collect();
            seen.insert(key)
        })
        .collect();

    unique.sort_by_key(|record| std::cmp::Reverse(record.relevance_score.unwrap_or(0)));
    unique.truncate(max_results);
    unique
}

#[derive(Debug, Clone)]
pub struct CdtiSource {
    fetcher: HttpFetcher,
    links_per_section: usize,
    max_results: usize,
    fetch_details: bool,
    progress: MultiProgress,
}

impl CdtiSource {
    pub fn new(fetcher: HttpFetcher, config: &ResolvedConfig, progress: MultiProgress) -> Self {
        Self {
            fetcher,
            links_per_section: config.cdti_links_per_section,
            max_results: config.cdti_max_results,
            fetch_details: config.cdti_fetch_details,
            progress,
        }
    }

    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        today: NaiveDate,
    ) -> AppResult<Vec<GrantRecord>> {
        info!(sections = CDTI_SECTIONS.len(), "Scraping CDTI programme listings");
        let pb = ui::add_progress_bar(&self.progress, CDTI_SECTIONS.len() as u64, "CDTI")?;
        let mut grants = Vec::new();

        for (section, section_url) in CDTI_SECTIONS {
            match self.scrape_section(section_url, criteria, today).await {
                Ok(found) => {
                    info!(section = section, found = found.len(), "CDTI section scraped");
                    grants.extend(found);
                }
                Err(e) => warn!(section = section, error = %e, "Skipping CDTI section"),
            }
            pb.inc(1);
            self.fetcher.pause().await;
        }
        pb.finish_and_clear();

        let ranked = rank_programmes(grants, self.max_results);
        info!(found = ranked.len(), "CDTI search completed");
        Ok(ranked)
    }

    async fn scrape_section(
        &self,
        section_url: &str,
        criteria: &SearchCriteria,
        today: NaiveDate,
    ) -> AppResult<Vec<GrantRecord>> {
        let base_url = Url::parse(section_url)?;
        let html = self.fetcher.get_text(base_url.as_str(), ACCEPT_HTML).await?;
        let links = parse_program_links(&html, &base_url);

        let mut grants = Vec::new();
        for link in links.iter().take(self.links_per_section) {
            let details = if self.fetch_details {
                self.fetcher.pause().await;
                match self.fetcher.get_text(&link.url, ACCEPT_HTML).await {
                    Ok(page) => parse_program_page(&page, &link.title),
                    Err(e) => {
                        warn!(url = %link.url, error = %e, "Programme page unavailable");
                        ProgramDetails::default()
                    }
                }
            } else {
                ProgramDetails::default()
            };

            let record = build_grant(link, details, today);
            if is_relevant(&record, criteria) {
                grants.push(record);
            }
        }
        Ok(grants)
    }
}

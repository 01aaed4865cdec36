use crate::config::{ResolvedConfig, ResolvedConfigFile};
use crate::debounce::Debouncer;
use crate::errors::{AppError, AppResult};
use crate::export::export_grants;
use crate::favorites::{FavoritesStore, ToggleOutcome};
use crate::filter::{sort_records, FilterEvaluator, FilterSession};
use crate::grants::{process_grants, SearchStats};
use crate::models::{
    Country, ExportFormat, FilterState, GrantRecord, QuickFilter, SearchCriteria, SortKey,
    UrgencyLevel,
};
use crate::sources::GrantSearch;
use crate::utils::{format_amount, format_date, format_duration, truncate_smart};
use chrono::{Local, NaiveDate};
use clap::{Arg, ArgAction, ArgMatches, Command};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use walkdir::WalkDir;

// CLI metadata constants
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
const APP_ABOUT: &str = env!("CARGO_PKG_DESCRIPTION");

const TITLE_WIDTH: usize = 100;
const FILTER_EXAMPLE: &str =
    "Example:\n  subvenciones-cli filter grants.json -c España -r Andalucía --quick urgent";

/// Grant files hold either a bare array or an object with a `grants` array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordsDocument {
    List(Vec<GrantRecord>),
    Wrapped { grants: Vec<GrantRecord> },
}

fn filter_args(cmd: Command<'static>) -> Command<'static> {
    cmd.arg(
        Arg::new("country")
            .short('c')
            .long("country")
            .help("Country scope: 'España', 'UE', 'Internacional' or 'Todas'")
            .default_value("Todas")
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("region")
            .short('r')
            .long("region")
            .help("Autonomous community; only applies with country 'España'")
            .default_value("Todas")
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("quick")
            .long("quick")
            .help("Quick filter")
            .value_parser(["urgent", "high-amount", "recent", "clear"])
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("urgency")
            .short('u')
            .long("urgency")
            .help("Urgency level")
            .value_parser(["all", "critical", "high", "medium", "active"])
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("source")
            .short('s')
            .long("source")
            .help("Only grants whose source contains this text")
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("recent_days")
            .long("recent-days")
            .help("Window of the 'recent' quick filter, in days")
            .value_parser(clap::value_parser!(i64))
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("high_amount")
            .long("high-amount")
            .help("Minimum amount in euros for the 'high-amount' quick filter")
            .value_parser(clap::value_parser!(f64))
            .action(ArgAction::Set),
    )
}

fn output_args(cmd: Command<'static>) -> Command<'static> {
    cmd.arg(
        Arg::new("sort")
            .long("sort")
            .help("Result order")
            .value_parser(["none", "deadline", "publication", "alphabetical"])
            .action(ArgAction::Set),
    )
    .arg(
        Arg::new("export")
            .short('e')
            .long("export")
            .help("Export the shown grants")
            .value_parser(["json", "csv", "parquet"])
            .action(ArgAction::Set),
    )
}

fn input_arg() -> Arg<'static> {
    Arg::new("input")
        .help("JSON file, or directory of JSON files, with grant records")
        .required(true)
        .value_parser(clap::value_parser!(PathBuf))
}

pub(crate) fn build_cli() -> Command<'static> {
    Command::new("subvenciones-cli")
        .version(APP_VERSION)
        .author(APP_AUTHOR)
        .about(APP_ABOUT)
        .subcommand(output_args(filter_args(
            Command::new("filter")
                .about("Filter a saved list of grants")
                .after_help(FILTER_EXAMPLE)
                .arg(input_arg())
                .arg(
                    Arg::new("query")
                        .short('q')
                        .long("query")
                        .help("Free-text search over every field")
                        .action(ArgAction::Set),
                ),
        )))
        .subcommand(output_args(
            Command::new("search")
                .about("Search the official sources (BOE, CDTI)")
                .arg(
                    Arg::new("sector")
                        .long("sector")
                        .help("Sector, e.g. 'Tecnología' or 'Energía'")
                        .default_value("Todos")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("location")
                        .short('l')
                        .long("location")
                        .help("'España', 'UE', a region name or 'Todas'")
                        .default_value("Todas")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("company_type")
                        .short('t')
                        .long("company-type")
                        .help("Company type, e.g. 'PYME' or 'Startup'")
                        .default_value("Todos")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("region")
                        .short('r')
                        .long("region")
                        .help("Autonomous community")
                        .default_value("Todas")
                        .action(ArgAction::Set),
                ),
        ))
        .subcommand(filter_args(
            Command::new("interactive")
                .about("Type queries line by line and see the matching grants")
                .arg(input_arg())
                .arg(
                    Arg::new("delay_ms")
                        .long("delay-ms")
                        .help("Quiet period before a query is evaluated")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                ),
        ))
        .subcommand(
            Command::new("favorites")
                .about("Manage favorite grants")
                .arg(
                    Arg::new("file")
                        .short('f')
                        .long("file")
                        .help("Favorites file")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .subcommand(Command::new("list").about("List favorite grant titles"))
                .subcommand(
                    Command::new("toggle")
                        .about("Add a grant to favorites, or remove it if present")
                        .arg(Arg::new("title").required(true).action(ArgAction::Set)),
                ),
        )
        .subcommand(
            Command::new("toml")
                .about("Run a filter described by a TOML file")
                .arg(
                    Arg::new("config")
                        .help("Path to the TOML config file")
                        .required(true)
                        .value_parser(clap::value_parser!(PathBuf)),
                ),
        )
}

/// Parses command-line arguments and runs the selected subcommand.
///
/// - `filter`: load saved grants, apply the filters, print and optionally export
/// - `search`: query the official sources and print the results
/// - `interactive`: re-run the free-text filter for each line typed on stdin
/// - `favorites`: list or toggle favorite grants
/// - `toml`: run `filter` with the settings of a TOML file
pub async fn cli() -> AppResult<()> {
    let cmd = build_cli();
    let mut cmd_for_help = cmd.clone();
    let matches = cmd.get_matches();

    match matches.subcommand() {
        Some(("filter", sub)) => {
            let config = config_from_matches(sub);
            let state = state_from_matches(sub);
            let run = FilterRun {
                input: required_path(sub, "input")?,
                state,
                sort: sort_from_matches(sub),
                export: export_from_matches(sub)?,
            };
            run_filter(&run, &config)?;
        }
        Some(("search", sub)) => {
            let criteria = SearchCriteria {
                sector: string_arg(sub, "sector"),
                location: string_arg(sub, "location"),
                company_type: string_arg(sub, "company_type"),
                region: string_arg(sub, "region"),
            };
            run_search(
                &criteria,
                sort_from_matches(sub),
                export_from_matches(sub)?,
                &ResolvedConfig::default(),
            )
            .await?;
        }
        Some(("interactive", sub)) => {
            let mut config = config_from_matches(sub);
            if let Some(&delay) = sub.get_one::<u64>("delay_ms") {
                config.debounce_ms = delay;
            }
            let input = required_path(sub, "input")?;
            run_interactive(&input, state_from_matches(sub), &config).await?;
        }
        Some(("favorites", sub)) => {
            let path = sub
                .get_one::<PathBuf>("file")
                .cloned()
                .unwrap_or_else(|| ResolvedConfig::default().favorites_path);
            let mut store = FavoritesStore::load(&path)?;
            match sub.subcommand() {
                Some(("toggle", toggle)) => {
                    let title = string_arg(toggle, "title");
                    match store.toggle(&title)? {
                        ToggleOutcome::Added => println!("Agregado a favoritos: {title}"),
                        ToggleOutcome::Removed => println!("Eliminado de favoritos: {title}"),
                    }
                }
                _ => {
                    for title in store.list() {
                        println!("★ {title}");
                    }
                    println!("{} favoritos", store.len());
                }
            }
        }
        Some(("toml", sub)) => {
            let config_path = required_path(sub, "config")?;
            let file_config = ResolvedConfigFile::from_toml_file(&config_path)?;
            let run = FilterRun::from_file(&file_config)?;
            run_filter(&run, &file_config.resolved)?;
        }
        _ => {
            cmd_for_help
                .print_help()
                .map_err(|e| AppError::IoError(format!("Failed to print help: {e}")))?;
        }
    }

    Ok(())
}

fn string_arg(matches: &ArgMatches, name: &str) -> String {
    matches
        .get_one::<String>(name)
        .cloned()
        .unwrap_or_default()
}

fn required_path(matches: &ArgMatches, name: &str) -> AppResult<PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .cloned()
        .ok_or_else(|| AppError::InvalidInput(format!("Missing required argument '{name}'")))
}

fn config_from_matches(matches: &ArgMatches) -> ResolvedConfig {
    let mut config = ResolvedConfig::default();
    if let Some(&days) = matches.get_one::<i64>("recent_days") {
        config.recent_days = days;
    }
    if let Some(&threshold) = matches.get_one::<f64>("high_amount") {
        config.high_amount_threshold = threshold;
    }
    config
}

fn state_from_matches(matches: &ArgMatches) -> FilterState {
    let state = FilterState::new(Country::from(string_arg(matches, "country").as_str()))
        .with_region(&string_arg(matches, "region"))
        .with_quick(QuickFilter::from(string_arg(matches, "quick").as_str()))
        .with_urgency(UrgencyLevel::from(string_arg(matches, "urgency").as_str()))
        .with_source(&string_arg(matches, "source"));
    match matches.try_get_one::<String>("query") {
        Ok(Some(query)) => state.with_query(query),
        _ => state,
    }
}

fn sort_from_matches(matches: &ArgMatches) -> SortKey {
    SortKey::from(string_arg(matches, "sort").as_str())
}

fn export_from_matches(matches: &ArgMatches) -> AppResult<Option<ExportFormat>> {
    matches
        .get_one::<String>("export")
        .map(|format| format.parse())
        .transpose()
}

/// One `filter` invocation, from the command line or a TOML file.
#[derive(Debug, Clone)]
pub(crate) struct FilterRun {
    pub input: PathBuf,
    pub state: FilterState,
    pub sort: SortKey,
    pub export: Option<ExportFormat>,
}

impl FilterRun {
    fn from_file(file: &ResolvedConfigFile) -> AppResult<Self> {
        let state = FilterState::new(Country::from(file.country.as_str()))
            .with_region(&file.region)
            .with_query(&file.query)
            .with_quick(QuickFilter::from(file.quick.as_str()))
            .with_urgency(UrgencyLevel::from(file.urgency.as_str()))
            .with_source(&file.source);
        Ok(Self {
            input: file.input.clone(),
            state,
            sort: SortKey::from(file.sort.as_str()),
            export: file
                .export
                .as_deref()
                .map(str::parse::<ExportFormat>)
                .transpose()?,
        })
    }
}

/// Parses a grants document: a JSON array or an object with a `grants` array.
pub fn parse_records(contents: &str) -> AppResult<Vec<GrantRecord>> {
    let document: RecordsDocument = serde_json::from_str(contents)?;
    Ok(match document {
        RecordsDocument::List(grants) | RecordsDocument::Wrapped { grants } => grants,
    })
}

/// Loads grants from a JSON file, or from every `.json` file under a directory
/// in path order.
pub fn load_records(path: &Path) -> AppResult<Vec<GrantRecord>> {
    if !path.exists() {
        return Err(AppError::InvalidInput(format!(
            "Input path does not exist: {}",
            path.display()
        )));
    }

    let files: Vec<PathBuf> = if path.is_dir() {
        let mut files: Vec<PathBuf> = WalkDir::new(path)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    let mut records = Vec::new();
    for file in &files {
        let contents = fs::read_to_string(file)
            .map_err(|e| AppError::IoError(format!("Failed to read {}: {e}", file.display())))?;
        let parsed = parse_records(&contents).map_err(|e| {
            AppError::ParseError(format!("{}: {e}", file.display()))
        })?;
        records.extend(parsed);
    }

    info!(
        files = files.len(),
        records = records.len(),
        "Grant records loaded"
    );
    Ok(records)
}

/// Card for one grant in the terminal listing.
pub fn format_grant(grant: &GrantRecord, favorite: bool) -> String {
    let marker = if favorite { "★" } else { "•" };
    let na = "N/D";
    let days = grant
        .days_remaining
        .map(|d| format!("{d} días"))
        .unwrap_or_else(|| na.to_string());

    let mut card = format!(
        "{marker} {}\n   Ubicación: {} | Región: {} | Importe: {}\n   Plazo: {} ({days}, {}) | Fuente: {}",
        truncate_smart(&grant.title, TITLE_WIDTH),
        grant.location.as_deref().unwrap_or(na),
        grant.region.as_deref().unwrap_or(na),
        grant
            .amount
            .as_deref()
            .map(format_amount)
            .unwrap_or_else(|| na.to_string()),
        grant
            .deadline
            .as_deref()
            .map(format_date)
            .unwrap_or_else(|| na.to_string()),
        grant.urgency.as_str(),
        grant.source.as_deref().unwrap_or(na),
    );
    if let Some(link) = &grant.link {
        card.push_str("\n   ");
        card.push_str(link);
    }
    card
}

fn load_favorites(config: &ResolvedConfig) -> Option<FavoritesStore> {
    match FavoritesStore::load(&config.favorites_path) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!(error = %e, "Favorites unavailable");
            None
        }
    }
}

fn print_grants(grants: &[GrantRecord], favorites: Option<&FavoritesStore>) {
    for grant in grants {
        let favorite = favorites.map_or(false, |f| f.contains(&grant.title));
        println!("{}\n", format_grant(grant, favorite));
    }
}

fn log_stats(stats: &SearchStats) {
    info!(
        total = stats.total_results,
        active = stats.active_grants,
        urgent = stats.urgent_grants,
        search_time_secs = stats.search_time_secs,
        "Grant statistics"
    );
}

fn export_stem() -> String {
    format!("subvenciones_{}", Local::now().format("%Y%m%d_%H%M%S"))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Applies a filter run and returns the visible grants in display order, with
/// the counter text.
pub(crate) fn filter_records(
    records: Vec<GrantRecord>,
    run: &FilterRun,
    config: &ResolvedConfig,
    today: NaiveDate,
) -> (Vec<GrantRecord>, String, SearchStats) {
    let (records, stats) = process_grants(records, today, None);
    let evaluator = FilterEvaluator::from_config(today, config);
    let mut session = FilterSession::with_state(evaluator, run.state.clone());
    let visibility = session.apply(&records);
    let counter = visibility.counter_text(session.state());

    let mut shown: Vec<GrantRecord> = visibility.select(&records).into_iter().cloned().collect();
    sort_records(&mut shown, run.sort);
    (shown, counter, stats)
}

fn run_filter(run: &FilterRun, config: &ResolvedConfig) -> AppResult<()> {
    let start = Instant::now();
    let records = load_records(&run.input)?;
    let (shown, counter, stats) = filter_records(records, run, config, today());

    print_grants(&shown, load_favorites(config).as_ref());
    println!("{counter}");
    log_stats(&stats);

    if let Some(format) = run.export {
        let path = export_grants(&shown, format, &config.export_dir, &export_stem())?;
        println!("Exportado a {}", path.display());
    }

    info!(
        shown = shown.len(),
        elapsed = format_duration(start.elapsed()),
        "Filter completed"
    );
    Ok(())
}

async fn run_search(
    criteria: &SearchCriteria,
    sort: SortKey,
    export: Option<ExportFormat>,
    config: &ResolvedConfig,
) -> AppResult<()> {
    let start = Instant::now();
    let today = today();
    let mut search = GrantSearch::from_config(config)?;
    let grants = search.search(criteria, today).await;

    let (mut grants, stats) = process_grants(grants, today, Some(start));
    sort_records(&mut grants, sort);

    print_grants(&grants, load_favorites(config).as_ref());
    println!("{} subvenciones encontradas", grants.len());
    log_stats(&stats);

    if let Some(format) = export {
        let path = export_grants(&grants, format, &config.export_dir, &export_stem())?;
        println!("Exportado a {}", path.display());
    }
    Ok(())
}

async fn run_interactive(
    input: &Path,
    state: FilterState,
    config: &ResolvedConfig,
) -> AppResult<()> {
    let today = today();
    let (records, stats) = process_grants(load_records(input)?, today, None);
    log_stats(&stats);
    let records = Arc::new(records);

    let mut session = FilterSession::with_state(FilterEvaluator::from_config(today, config), state);
    println!("{}", session.apply(&records).counter_text(session.state()));
    println!("Escribe un texto para buscar (Ctrl+D para salir)");

    let shown_records = Arc::clone(&records);
    let debouncer = Debouncer::new(Duration::from_millis(config.debounce_ms), move |query: String| {
        session.set_query(&query);
        let visibility = session.apply(&shown_records);
        for grant in visibility.select(&shown_records) {
            println!("• {}", truncate_smart(&grant.title, TITLE_WIDTH));
        }
        println!("{}", visibility.counter_text(session.state()));
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| AppError::IoError(format!("Failed to read stdin: {e}")))?
    {
        debouncer.call(line)?;
    }

    debouncer.finish().await
}

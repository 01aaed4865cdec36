// Data source URLs
pub const BOE_SUMMARY_URL: &str = "https://www.boe.es/datosabiertos/api/sumario";
pub const BOE_DAILY_URL: &str = "https://www.boe.es/boe/dias";
pub const CDTI_SECTIONS: &[(&str, &str)] = &[
    (
        "ayudas_empresas",
        "https://www.cdti.es/index.asp?MP=4&MS=0&MN=1",
    ),
    (
        "programas_cooperacion",
        "https://www.cdti.es/index.asp?MP=4&MS=0&MN=4",
    ),
    (
        "convocatorias",
        "https://www.cdti.es/index.asp?MP=100&MS=606&MN=2",
    ),
];

// HTTP identity
pub const USER_AGENT: &str = "SubvencionesFinder/2.0 (https://subvencionesfinder.com)";
pub const ACCEPT_LANGUAGE: &str = "es-ES,es;q=0.9,en;q=0.8";

// Source display names
pub const BOE_SOURCE_NAME: &str = "BOE - Boletín Oficial del Estado";
pub const CDTI_SOURCE_NAME: &str = "CDTI - Centro para el Desarrollo Tecnológico Industrial";

// Placeholders used when a value cannot be extracted
pub const AMOUNT_UNKNOWN: &str = "Consultar convocatoria";
pub const AMOUNT_SEE_CALL: &str = "Ver convocatoria";

// "Any" values accepted from forms and config files
pub const ANY_ALIASES: &[&str] = &["todas", "todos", "all", "any", ""];

// Country aliases
pub const SPAIN_ALIASES: &[&str] = &["españa", "espana", "spain", "es"];
pub const EU_ALIASES: &[&str] = &["ue", "eu", "unión europea", "union europea", "european union"];
pub const INTERNATIONAL_ALIASES: &[&str] = &["internacional", "international", "intl"];

// Date format used by every record field
pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const BOE_DATE_FORMAT: &str = "%Y%m%d";
pub const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y";

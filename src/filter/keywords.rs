//! Static keyword tables used to classify free-form location strings.
//!
//! Every keyword is stored already normalised (lowercase, no acute accents), so
//! lookups only need to normalise the haystack.

/// Terms that place a location inside Spain.
pub const SPANISH_KEYWORDS: &[&str] = &[
    "espana",
    "madrid",
    "barcelona",
    "valencia",
    "sevilla",
    "andalucia",
    "cataluna",
    "catalunya",
    "galicia",
    "pais vasco",
    "euskadi",
    "aragon",
    "castilla",
    "extremadura",
    "murcia",
    "canarias",
    "baleares",
    "asturias",
    "cantabria",
    "navarra",
    "rioja",
    "ceuta",
    "melilla",
];

/// Terms that mark a European Union scope: institutions and programme names.
pub const EU_KEYWORDS: &[&str] = &[
    "union europea",
    "europa",
    "european",
    "ue",
    "horizon",
    "erasmus",
    "interreg",
    "life",
    "next generation",
    "feder",
];

/// Terms that mark an international (non-EU) scope.
pub const INTERNATIONAL_KEYWORDS: &[&str] = &[
    "internacional",
    "international",
    "mundial",
    "global",
    "iberoamerica",
    "latinoamerica",
    "world bank",
    "onu",
    "oea",
];

/// Autonomous communities and autonomous cities with the place names that belong to them.
pub const REGION_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "Andalucía",
        &[
            "andalucia", "sevilla", "cordoba", "granada", "malaga", "cadiz", "huelva", "jaen",
            "almeria",
        ],
    ),
    (
        "Aragón",
        &["aragon", "zaragoza", "huesca", "teruel"],
    ),
    ("Asturias", &["asturias", "oviedo", "gijon"]),
    (
        "Islas Baleares",
        &["baleares", "balears", "palma", "mallorca", "menorca", "ibiza", "formentera"],
    ),
    (
        "Canarias",
        &["canarias", "las palmas", "santa cruz", "tenerife", "gran canaria"],
    ),
    ("Cantabria", &["cantabria", "santander"]),
    (
        "Castilla-La Mancha",
        &[
            "castilla-la mancha",
            "castilla la mancha",
            "toledo",
            "ciudad real",
            "albacete",
            "cuenca",
            "guadalajara",
        ],
    ),
    (
        "Castilla y León",
        &[
            "castilla y leon",
            "valladolid",
            "salamanca",
            "leon",
            "burgos",
            "zamora",
            "palencia",
            "avila",
            "segovia",
            "soria",
        ],
    ),
    (
        "Cataluña",
        &["cataluna", "catalunya", "barcelona", "girona", "lleida", "tarragona"],
    ),
    ("Extremadura", &["extremadura", "badajoz", "caceres"]),
    (
        "Galicia",
        &["galicia", "coruna", "lugo", "ourense", "pontevedra", "vigo", "santiago de compostela"],
    ),
    ("Madrid", &["madrid", "comunidad de madrid"]),
    ("Murcia", &["murcia", "region de murcia", "cartagena"]),
    ("Navarra", &["navarra", "pamplona"]),
    ("La Rioja", &["la rioja", "rioja", "logrono"]),
    (
        "País Vasco",
        &["pais vasco", "euskadi", "bilbao", "vitoria", "san sebastian", "donostia"],
    ),
    (
        "Valencia",
        &["valencia", "comunidad valenciana", "castellon", "alicante"],
    ),
    ("Ceuta", &["ceuta"]),
    ("Melilla", &["melilla"]),
];

/// Lowercases and strips acute accents and diaeresis. `ñ` is kept as `n`, so
/// "España" and "Espana" compare equal.
pub fn normalize(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'ä' | 'â' => 'a',
            'é' | 'è' | 'ë' | 'ê' => 'e',
            'í' | 'ì' | 'ï' | 'î' => 'i',
            'ó' | 'ò' | 'ö' | 'ô' => 'o',
            'ú' | 'ù' | 'ü' | 'û' => 'u',
            'ñ' => 'n',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Checks a normalised haystack for a keyword.
///
/// Alphanumeric keywords of three characters or fewer ("ue", "onu") must match a
/// whole word; anything else ("i+d", "madrid") matches anywhere.
pub fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if keyword.chars().count() <= 3 && keyword.chars().all(char::is_alphanumeric) {
        haystack
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == keyword)
    } else {
        haystack.contains(keyword)
    }
}

/// True when the normalised haystack contains any keyword of the list.
pub fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| contains_keyword(haystack, k))
}

/// Looks up a region by name, ignoring case and accents. Returns the canonical
/// name and its keyword list.
pub fn find_region(name: &str) -> Option<(&'static str, &'static [&'static str])> {
    let wanted = normalize(name.trim());
    REGION_KEYWORDS
        .iter()
        .find(|(region, _)| normalize(region) == wanted)
        .copied()
}

/// Names of every region in table order.
pub fn region_names() -> impl Iterator<Item = &'static str> {
    REGION_KEYWORDS.iter().map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_table_has_nineteen_entries() {
        assert_eq!(REGION_KEYWORDS.len(), 19);
    }

    #[test]
    fn keyword_tables_are_normalised() {
        let all = SPANISH_KEYWORDS
            .iter()
            .chain(EU_KEYWORDS)
            .chain(INTERNATIONAL_KEYWORDS)
            .chain(REGION_KEYWORDS.iter().flat_map(|(_, k)| k.iter()));
        for keyword in all {
            assert_eq!(normalize(keyword), *keyword, "keyword {keyword} is not normalised");
        }
    }

    #[test]
    fn normalize_strips_accents() {
        assert_eq!(normalize("Andalucía"), "andalucia");
        assert_eq!(normalize("ESPAÑA"), "espana");
        assert_eq!(normalize("Logroño"), "logrono");
    }

    #[test]
    fn short_keywords_require_whole_words() {
        assert!(contains_keyword("fondos ue 2024", "ue"));
        assert!(contains_keyword("ue", "ue"));
        assert!(!contains_keyword("cuenca", "ue"));
        assert!(!contains_keyword("huesca", "ue"));
        assert!(contains_keyword("proyectos de i+d en pymes", "i+d"));
    }

    #[test]
    fn long_keywords_match_substrings() {
        assert!(contains_keyword("comunidad de madrid", "madrid"));
        assert!(contains_keyword("programa horizon europe", "horizon"));
    }

    #[test]
    fn find_region_ignores_case_and_accents() {
        let (name, keywords) = find_region("pais vasco").unwrap();
        assert_eq!(name, "País Vasco");
        assert!(keywords.contains(&"bilbao"));
        assert!(find_region("Narnia").is_none());
    }

    #[test]
    fn region_names_in_table_order() {
        let names: Vec<_> = region_names().collect();
        assert_eq!(names.first(), Some(&"Andalucía"));
        assert_eq!(names.last(), Some(&"Melilla"));
    }
}

use super::keywords::{
    contains_any, find_region, normalize, EU_KEYWORDS, INTERNATIONAL_KEYWORDS, SPANISH_KEYWORDS,
};
use crate::constants::{ANY_ALIASES, SPAIN_ALIASES};
use crate::models::{Country, GrantRecord};

/// Spanish keyword match, or a location that is literally a Spain or "all" label.
pub fn is_spanish_location(location: &str) -> bool {
    let lower = location.trim().to_lowercase();
    if SPAIN_ALIASES.contains(&lower.as_str()) || ANY_ALIASES.contains(&lower.as_str()) {
        return true;
    }
    contains_any(&normalize(&lower), SPANISH_KEYWORDS)
}

pub fn is_european_location(location: &str) -> bool {
    contains_any(&normalize(location), EU_KEYWORDS)
}

pub fn is_international_location(location: &str) -> bool {
    contains_any(&normalize(location), INTERNATIONAL_KEYWORDS)
}

/// Checks whether a location string falls inside a region.
///
/// Regions missing from the static table fall back to matching their own name.
pub fn matches_region(location: &str, region: &str) -> bool {
    let location = normalize(location);
    match find_region(region) {
        Some((_, keywords)) => contains_any(&location, keywords),
        None => {
            let fallback = normalize(region.trim());
            !fallback.is_empty() && location.contains(&fallback)
        }
    }
}

fn same_region(a: &str, b: &str) -> bool {
    normalize(a.trim()) == normalize(b.trim())
}

/// Country predicate.
///
/// A record without a location passes every country. Spain also accepts records
/// whose region field names one of the Spanish regions.
pub fn country_matches(record: &GrantRecord, country: Country) -> bool {
    let location = record.location_text();
    if location.is_empty() {
        return true;
    }
    match country {
        Country::All => true,
        Country::Spain => {
            is_spanish_location(location) || find_region(record.region_text()).is_some()
        }
        Country::Eu => is_european_location(location),
        Country::International => is_international_location(location),
    }
}

/// Region predicate. `region` is the effective region (already `None` outside Spain).
pub fn region_matches(record: &GrantRecord, region: Option<&str>) -> bool {
    let Some(region) = region else {
        return true;
    };
    let location = record.location_text();
    let record_region = record.region_text();
    if location.is_empty() && record_region.is_empty() {
        return true;
    }
    same_region(record_region, region) || matches_region(location, region)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(location: &str, region: &str) -> GrantRecord {
        let mut record = GrantRecord::new("Convocatoria");
        record.location = Some(location.to_string());
        record.region = Some(region.to_string());
        record
    }

    #[test]
    fn spanish_locations() {
        assert!(is_spanish_location("Madrid"));
        assert!(is_spanish_location("España"));
        assert!(is_spanish_location("Todas"));
        assert!(is_spanish_location("Comunidad de Castilla y León"));
        assert!(!is_spanish_location("Francia"));
    }

    #[test]
    fn spain_and_all_labels_count_as_spanish() {
        assert!(is_spanish_location("Spain"));
        assert!(is_spanish_location("All"));
        assert!(country_matches(&record("Spain", ""), Country::Spain));
        assert!(country_matches(&record("All", ""), Country::Spain));
    }

    #[test]
    fn european_locations() {
        assert!(is_european_location("Unión Europea"));
        assert!(is_european_location("Horizon Europe"));
        assert!(is_european_location("UE"));
        assert!(!is_european_location("Cuenca"));
    }

    #[test]
    fn international_locations() {
        assert!(is_international_location("Ámbito internacional"));
        assert!(is_international_location("World Bank"));
        assert!(!is_international_location("Sevilla"));
    }

    #[test]
    fn matches_region_uses_city_table() {
        assert!(matches_region("Bilbao", "País Vasco"));
        assert!(matches_region("Málaga", "Andalucía"));
        assert!(!matches_region("Bilbao", "Andalucía"));
    }

    #[test]
    fn matches_region_falls_back_to_name() {
        assert!(matches_region("Comarca del Bierzo", "Bierzo"));
        assert!(!matches_region("Madrid", ""));
    }

    #[test]
    fn spain_accepts_known_region_field() {
        let record = record("Sede central", "Galicia");
        assert!(country_matches(&record, Country::Spain));
    }

    #[test]
    fn spain_rejects_foreign_location() {
        let record = record("Francia", "");
        assert!(!country_matches(&record, Country::Spain));
    }

    #[test]
    fn missing_location_fails_open() {
        let record = GrantRecord::new("Sin ubicación");
        assert!(country_matches(&record, Country::Spain));
        assert!(country_matches(&record, Country::Eu));
        assert!(region_matches(&record, Some("Madrid")));
    }

    #[test]
    fn region_field_equality_is_accent_insensitive() {
        let record = record("España", "Aragon");
        assert!(region_matches(&record, Some("Aragón")));
    }

    #[test]
    fn region_matches_through_location() {
        let record = record("Zaragoza", "");
        assert!(region_matches(&record, Some("Aragón")));
        assert!(!region_matches(&record, Some("Madrid")));
    }
}

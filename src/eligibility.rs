//! Address parsing and eligibility matching
//!
//! An address is reduced to an optional ZIP code and an optional city, with
//! the directory filling in whichever is missing. A program is eligible when
//! the ZIP or city hits one of its included areas and neither hits one of its
//! excluded areas. City comparisons tolerate typos through an Indel
//! similarity over the longest common subsequence.

use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

use crate::config::MatchingConfig;
use crate::directory::ZipDirectory;
use crate::models::{AreaRule, CcaCoverage, CcaResult};

pub const DEFAULT_STATE: &str = "CA";

fn zip_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\b([0-9]{5})\b").expect("valid ZIP pattern"))
}

fn city_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)([a-z\s]+),?\s*CA").expect("valid city pattern"))
}

/// What an address was reduced to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressQuery {
    pub zipcode: Option<String>,
    pub city: Option<String>,
    pub state: String,
}

impl AddressQuery {
    pub fn is_empty(&self) -> bool {
        self.zipcode.is_none() && self.city.is_none()
    }
}

pub fn parse_address(address: &str, directory: &ZipDirectory) -> AddressQuery {
    let address = address.trim();

    let mut zipcode = zip_pattern()
        .captures(address)
        .map(|caps| caps[1].to_string());
    let mut city = city_pattern()
        .captures(address)
        .map(|caps| caps[1].trim().to_string())
        .filter(|c| !c.is_empty());
    let mut state = DEFAULT_STATE.to_string();

    if city.is_none() {
        if let Some((known_city, known_state)) =
            zipcode.as_deref().and_then(|zip| directory.city_for_zip(zip))
        {
            city = Some(known_city.to_string());
            state = known_state.to_string();
        }
    }

    if zipcode.is_none() {
        if let Some(name) = &city {
            zipcode = directory
                .zips_for(name, &state)
                .and_then(|zips| zips.iter().next().cloned());
        }
    }

    if zipcode.is_none() && city.is_none() && !address.is_empty() {
        city = Some(address.to_string());
    }

    AddressQuery { zipcode, city, state }
}

/// Decides which catalog entries an address query is eligible for
#[derive(Debug, Clone)]
pub struct Matcher {
    fuzzy_threshold: f64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(&MatchingConfig::default())
    }
}

impl Matcher {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            fuzzy_threshold: config.fuzzy_threshold,
        }
    }

    /// Eligible programs in catalog order
    pub fn eligible(&self, query: &AddressQuery, catalog: &[CcaCoverage]) -> Vec<CcaResult> {
        if query.is_empty() {
            return Vec::new();
        }

        catalog
            .iter()
            .filter(|coverage| self.is_eligible(query, coverage))
            .map(|coverage| CcaResult::from(&coverage.cca))
            .collect()
    }

    pub fn is_eligible(&self, query: &AddressQuery, coverage: &CcaCoverage) -> bool {
        let included = self.hits(query, coverage, AreaRule::Included);
        let excluded = self.hits(query, coverage, AreaRule::Excluded);
        debug!(
            "{}: included={} excluded={}",
            coverage.cca.cca_name, included, excluded
        );
        included && !excluded
    }

    fn hits(&self, query: &AddressQuery, coverage: &CcaCoverage, rule: AreaRule) -> bool {
        let zip_hit = query
            .zipcode
            .as_ref()
            .map_or(false, |zip| coverage.zipcodes.get(rule).iter().any(|z| z == zip));
        let city_hit = query
            .city
            .as_ref()
            .map_or(false, |city| self.city_matches(city, coverage.cities.get(rule)));
        zip_hit || city_hit
    }

    /// A listed city matches when it contains the query or is close enough to it
    pub fn city_matches(&self, city: &str, listed: &[String]) -> bool {
        let query = city.trim().to_lowercase();
        if query.is_empty() {
            return false;
        }

        if listed.iter().any(|c| c.to_lowercase().contains(&query)) {
            return true;
        }

        listed
            .iter()
            .any(|c| similarity(&query, &c.to_lowercase()) > self.fuzzy_threshold)
    }
}

/// Indel similarity from 0 to 100: `2 * LCS / (len_a + len_b)`, so a
/// dropped letter costs one edit rather than a substitution.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * longest_common_subsequence(&a, &b) as f64 / total as f64
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cca;

    fn coverage(name: &str, link: Option<&str>) -> CcaCoverage {
        CcaCoverage::new(Cca {
            id: 0,
            cca_name: name.to_string(),
            is_cca: true,
            is_incumbent_utility: false,
            state: "CA".to_string(),
            signup_link: link.map(|s| s.to_string()),
        })
    }

    fn catalog() -> Vec<CcaCoverage> {
        let mut test_cca = coverage("Test CCA", Some("http://test.com"));
        test_cca.zipcodes.included.push("95032".to_string());
        test_cca.cities.included.push("San Rafael".to_string());

        let mut no_link = coverage("No Link CCA", None);
        no_link.cities.included.push("Santa Cruz".to_string());

        let mut carve_out = coverage("County CCA", None);
        carve_out.cities.included.push("Los Gatos".to_string());
        carve_out.zipcodes.excluded.push("95032".to_string());

        vec![test_cca, no_link, carve_out]
    }

    fn names(results: &[CcaResult]) -> Vec<&str> {
        results.iter().map(|r| r.cca_name.as_str()).collect()
    }

    #[test]
    fn test_parse_zip_only() {
        let query = parse_address(" 95032 ", &ZipDirectory::empty());
        assert_eq!(query.zipcode.as_deref(), Some("95032"));
        assert_eq!(query.city, None);
        assert_eq!(query.state, "CA");
    }

    #[test]
    fn test_parse_city_and_zip() {
        let query = parse_address("Los Angeles, CA 90012", &ZipDirectory::empty());
        assert_eq!(query.zipcode.as_deref(), Some("90012"));
        assert_eq!(query.city.as_deref(), Some("Los Angeles"));
    }

    #[test]
    fn test_parse_ignores_longer_digit_runs() {
        let query = parse_address("950321", &ZipDirectory::empty());
        assert_eq!(query.zipcode, None);
        assert_eq!(query.city.as_deref(), Some("950321"));
    }

    #[test]
    fn test_parse_fills_in_from_directory() {
        let mut directory = ZipDirectory::empty();
        directory.insert("Los Gatos", "CA", ["95032", "95030"]);

        let from_zip = parse_address("95032", &directory);
        assert_eq!(from_zip.city.as_deref(), Some("Los Gatos"));
        assert_eq!(from_zip.state, "CA");

        let from_city = parse_address("los gatos, ca", &directory);
        assert_eq!(from_city.city.as_deref(), Some("los gatos"));
        assert_eq!(from_city.zipcode.as_deref(), Some("95030"));
    }

    #[test]
    fn test_parse_blank_city_capture_ignored() {
        let query = parse_address("95032 CA", &ZipDirectory::empty());
        assert_eq!(query.zipcode.as_deref(), Some("95032"));
        assert_eq!(query.city, None);
    }

    #[test]
    fn test_parse_free_text_becomes_city() {
        let query = parse_address("Santa Cruz", &ZipDirectory::empty());
        assert_eq!(query.city.as_deref(), Some("Santa Cruz"));

        let empty = parse_address("   ", &ZipDirectory::empty());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_zip_match() {
        let matcher = Matcher::default();
        let query = parse_address("95032", &ZipDirectory::empty());
        assert_eq!(names(&matcher.eligible(&query, &catalog())), vec!["Test CCA"]);
    }

    #[test]
    fn test_city_typo_match() {
        let matcher = Matcher::default();
        let query = parse_address("San Rafel, CA", &ZipDirectory::empty());
        let results = matcher.eligible(&query, &catalog());
        assert_eq!(names(&results), vec!["Test CCA"]);
        assert_eq!(results[0].link(), Some("http://test.com"));
    }

    #[test]
    fn test_missing_signup_link() {
        let matcher = Matcher::default();
        let query = parse_address("Santa Cruz, CA", &ZipDirectory::empty());
        let results = matcher.eligible(&query, &catalog());
        assert_eq!(names(&results), vec!["No Link CCA"]);
        assert_eq!(results[0].link(), None);
    }

    #[test]
    fn test_exclusion_wins_over_inclusion() {
        let matcher = Matcher::default();
        let query = parse_address("Los Gatos, CA 95032", &ZipDirectory::empty());
        assert_eq!(names(&matcher.eligible(&query, &catalog())), vec!["Test CCA"]);

        let query = parse_address("Los Gatos, CA", &ZipDirectory::empty());
        assert_eq!(names(&matcher.eligible(&query, &catalog())), vec!["County CCA"]);
    }

    #[test]
    fn test_unknown_address_matches_nothing() {
        let matcher = Matcher::default();
        let query = parse_address("Anchorage", &ZipDirectory::empty());
        assert!(matcher.eligible(&query, &catalog()).is_empty());
        assert!(matcher.eligible(&parse_address("", &ZipDirectory::empty()), &catalog()).is_empty());
    }

    #[test]
    fn test_city_matching_rules() {
        let matcher = Matcher::default();
        let listed = vec!["South San Francisco".to_string()];
        assert!(matcher.city_matches("san francisco", &listed));
        assert!(matcher.city_matches("South San Fransisco", &listed));
        assert!(!matcher.city_matches("Oakland", &listed));
        assert!(!matcher.city_matches("  ", &listed));

        let strict = Matcher::new(&MatchingConfig { fuzzy_threshold: 99.0 });
        assert!(!strict.city_matches("San Rafel", &["San Rafael".to_string()]));
    }

    #[test]
    fn test_dropped_letters_still_match() {
        let matcher = Matcher::default();
        assert!(matcher.city_matches("san rafl", &["San Rafael".to_string()]));
        assert!((similarity("san rafl", "san rafael") - 88.888).abs() < 0.01);
        assert!(!matcher.city_matches("san mateo", &["San Rafael".to_string()]));

        let query = parse_address("San Rafl, CA", &ZipDirectory::empty());
        assert_eq!(names(&matcher.eligible(&query, &catalog())), vec!["Test CCA"]);
    }

    #[test]
    fn test_similarity_scores() {
        assert_eq!(similarity("", ""), 100.0);
        assert_eq!(similarity("oakland", "oakland"), 100.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert!((similarity("san jose", "san josé") - 87.5).abs() < 0.01);
    }
}

//! Coverage sheet ingestion
//!
//! Loads the CCA coverage CSV into the catalog. The list columns in that
//! sheet were filled in by hand and mix several encodings, so every list
//! cell goes through [`parse_list`].

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

use crate::models::{AreaKind, AreaRule, Cca, CcaCoverage};
use crate::storage::Storage;

/// One row of the coverage sheet
#[derive(Debug, Default, Deserialize)]
pub struct CoverageRow {
    #[serde(default)]
    pub cca_name: Option<String>,
    #[serde(default)]
    pub is_cca: Option<String>,
    #[serde(default)]
    pub is_incumbent_utility: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub signup_link: Option<String>,
    #[serde(default)]
    pub counties_included: Option<String>,
    #[serde(default)]
    pub counties_excluded: Option<String>,
    #[serde(default)]
    pub cities_included: Option<String>,
    #[serde(default)]
    pub cities_excluded: Option<String>,
    #[serde(default)]
    pub zipcodes_included: Option<String>,
    #[serde(default)]
    pub zipcodes_excluded: Option<String>,
}

impl CoverageRow {
    fn list_column(&self, kind: AreaKind, rule: AreaRule) -> Option<&str> {
        let column = match (kind, rule) {
            (AreaKind::County, AreaRule::Included) => &self.counties_included,
            (AreaKind::County, AreaRule::Excluded) => &self.counties_excluded,
            (AreaKind::City, AreaRule::Included) => &self.cities_included,
            (AreaKind::City, AreaRule::Excluded) => &self.cities_excluded,
            (AreaKind::Zip, AreaRule::Included) => &self.zipcodes_included,
            (AreaKind::Zip, AreaRule::Excluded) => &self.zipcodes_excluded,
        };
        column.as_deref()
    }

    /// Convert to a catalog entry. Rows without a program name yield `None`.
    pub fn to_coverage(&self) -> Option<CcaCoverage> {
        let cca_name = non_empty(self.cca_name.as_deref())?;

        let mut coverage = CcaCoverage::new(Cca {
            id: 0,
            cca_name: cca_name.to_string(),
            is_cca: parse_flag(self.is_cca.as_deref()),
            is_incumbent_utility: parse_flag(self.is_incumbent_utility.as_deref()),
            state: non_empty(self.state.as_deref()).unwrap_or_default().to_string(),
            signup_link: non_empty(self.signup_link.as_deref()).map(|s| s.to_string()),
        });

        for kind in [AreaKind::County, AreaKind::City, AreaKind::Zip] {
            for rule in [AreaRule::Included, AreaRule::Excluded] {
                for value in parse_list(self.list_column(kind, rule).unwrap_or_default()) {
                    coverage.areas_mut(kind).push(rule, value);
                }
            }
        }

        Some(coverage)
    }
}

/// Summary of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub programs: usize,
    pub area_rules: usize,
    pub skipped_rows: usize,
}

/// Load a coverage CSV into the catalog, optionally clearing it first
pub async fn ingest_csv(storage: &Storage, csv_path: &Path, reset: bool) -> Result<IngestReport> {
    info!("Ingesting coverage sheet: {}", csv_path.display());

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(csv_path)
        .with_context(|| format!("Cannot open coverage sheet: {}", csv_path.display()))?;

    let mut coverages = Vec::new();
    let mut report = IngestReport::default();

    for (index, record) in reader.deserialize::<CoverageRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = record.with_context(|| format!("Malformed coverage row at line {}", line))?;
        match row.to_coverage() {
            Some(coverage) => coverages.push(coverage),
            None => {
                warn!("Skipping coverage row at line {}: missing cca_name", line);
                report.skipped_rows += 1;
            }
        }
    }

    if reset {
        info!("Replacing existing catalog");
    }
    storage.store_catalog(&coverages, reset).await?;
    report.programs = coverages.len();
    report.area_rules = coverages.iter().map(CcaCoverage::rule_count).sum();

    info!(
        "Ingestion complete: {} programs, {} area rules, {} rows skipped",
        report.programs, report.area_rules, report.skipped_rows
    );
    Ok(report)
}

/// Parse a list cell from the coverage sheet.
///
/// Accepts plain comma separated text, a quoted string holding commas, and
/// bracketed lists whose items may be double quoted, single quoted, bare
/// words or numbers. `¨` is read as `"` and doubled quotes are collapsed.
/// Items are trimmed and empty items dropped.
pub fn parse_list(value: &str) -> Vec<String> {
    let value = value.trim().replace('¨', "\"");
    if value.is_empty() {
        return Vec::new();
    }

    if !value.starts_with('[') && !value.ends_with(']') {
        let unquoted = if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            &value[1..value.len() - 1]
        } else {
            value.as_str()
        };
        return unquoted.split(',').filter_map(clean_item).collect();
    }

    let inner = value.strip_prefix('[').unwrap_or(&value);
    let inner = inner.strip_suffix(']').unwrap_or(inner);
    let inner = collapse_doubled_quotes(inner);

    split_outside_quotes(&inner)
        .into_iter()
        .filter_map(clean_item)
        .collect()
}

fn clean_item(item: &str) -> Option<String> {
    let item = item.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if item.is_empty() {
        None
    } else {
        Some(item.to_string())
    }
}

fn collapse_doubled_quotes(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut previous_quote = false;
    for c in value.chars() {
        if c == '"' && previous_quote {
            continue;
        }
        previous_quote = c == '"';
        out.push(c);
    }
    out
}

/// Split on commas that are not inside a quoted item
fn split_outside_quotes(value: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match (quote, c) {
            (None, '"') | (None, '\'') if value[start..i].trim().is_empty() => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, ',') => {
                items.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&value[start..]);
    items
}

fn parse_flag(value: Option<&str>) -> bool {
    value.map_or(false, |v| v.trim().eq_ignore_ascii_case("true"))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_parse_list_handles_json_and_csv() {
        assert_eq!(parse_list(r#"["A", "B"]"#), vec!["A", "B"]);
        assert_eq!(parse_list("A,B"), vec!["A", "B"]);
        assert_eq!(parse_list(""), Vec::<String>::new());
        assert_eq!(parse_list("   "), Vec::<String>::new());
        assert_eq!(parse_list("[1,2]"), vec!["1", "2"]);
    }

    #[test]
    fn test_parse_list_messy_encodings() {
        assert_eq!(parse_list("Petaluma"), vec!["Petaluma"]);
        assert_eq!(
            parse_list("[Escalon, Lodi, Manteca, Mountain House, Ripon]"),
            vec!["Escalon", "Lodi", "Manteca", "Mountain House", "Ripon"]
        );
        assert_eq!(parse_list("[Apple Valley]"), vec!["Apple Valley"]);
        assert_eq!(parse_list(r#""Oxnard, Ventura""#), vec!["Oxnard", "Ventura"]);
        assert_eq!(parse_list("[¨Alameda¨, ¨Albany¨]"), vec!["Alameda", "Albany"]);
        assert_eq!(parse_list(r#"["Berkeley"", "Emeryville"]"#), vec!["Berkeley", "Emeryville"]);
        assert_eq!(parse_list("['Davis', 'Woodland']"), vec!["Davis", "Woodland"]);
        assert_eq!(parse_list("[]"), Vec::<String>::new());
        assert_eq!(parse_list("[ , Lodi, ]"), vec!["Lodi"]);
    }

    #[test]
    fn test_parse_list_keeps_commas_inside_quotes() {
        assert_eq!(
            parse_list(r#"["Ventura, unincorporated", "Oxnard"]"#),
            vec!["Ventura, unincorporated", "Oxnard"]
        );
        assert_eq!(parse_list(r#"["San Jose", Campbell]"#), vec!["San Jose", "Campbell"]);
    }

    #[test]
    fn test_row_without_name_is_skipped() {
        let row = CoverageRow {
            cca_name: Some("  ".to_string()),
            ..CoverageRow::default()
        };
        assert!(row.to_coverage().is_none());
    }

    #[test]
    fn test_row_conversion() {
        let row = CoverageRow {
            cca_name: Some("Peninsula Clean Energy".to_string()),
            is_cca: Some(" true ".to_string()),
            is_incumbent_utility: Some("FALSE".to_string()),
            state: Some("CA".to_string()),
            signup_link: Some(String::new()),
            cities_included: Some(r#"["Menlo Park", "Redwood City"]"#.to_string()),
            zipcodes_excluded: Some("[94025]".to_string()),
            ..CoverageRow::default()
        };

        let coverage = row.to_coverage().unwrap();
        assert!(coverage.cca.is_cca);
        assert!(!coverage.cca.is_incumbent_utility);
        assert_eq!(coverage.cca.signup_link, None);
        assert_eq!(coverage.cities.included, vec!["Menlo Park", "Redwood City"]);
        assert_eq!(coverage.zipcodes.excluded, vec!["94025"]);
        assert_eq!(coverage.rule_count(), 3);
    }

    #[tokio::test]
    async fn test_ingestion_creates_cca_and_relations() {
        let dir = TempDir::new().unwrap();
        let csv_path = dir.path().join("cca_coverage.csv");
        let mut file = std::fs::File::create(&csv_path).unwrap();
        writeln!(
            file,
            "cca_name,is_cca,is_incumbent_utility,state,signup_link,counties_included,counties_excluded,cities_included,cities_excluded,zipcodes_included,zipcodes_excluded"
        )
        .unwrap();
        writeln!(
            file,
            r#"Test CCA,TRUE,FALSE,CA,http://test.com,Test County,,"[""Test City""]",,12345,"#
        )
        .unwrap();
        writeln!(file, ",TRUE,FALSE,CA,,,,,,,").unwrap();
        writeln!(file, r#"Other CCA,TRUE,FALSE,CA,,,,"Santa Cruz, Capitola",,,"#).unwrap();
        drop(file);

        let storage = Storage::new(dir.path().join("catalog.db").to_str().unwrap())
            .await
            .unwrap();
        let report = ingest_csv(&storage, &csv_path, false).await.unwrap();
        assert_eq!(
            report,
            IngestReport {
                programs: 2,
                area_rules: 5,
                skipped_rows: 1,
            }
        );

        let catalog = storage.load_catalog().await.unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].cca.cca_name, "Test CCA");
        assert_eq!(catalog[0].counties.included, vec!["Test County"]);
        assert_eq!(catalog[0].cities.included, vec!["Test City"]);
        assert_eq!(catalog[0].zipcodes.included, vec!["12345"]);
        assert_eq!(catalog[1].cities.included, vec!["Santa Cruz", "Capitola"]);

        // Re-ingesting with reset replaces rather than duplicates
        ingest_csv(&storage, &csv_path, true).await.unwrap();
        assert_eq!(storage.load_catalog().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_sheet_is_an_error() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("catalog.db").to_str().unwrap())
            .await
            .unwrap();
        let result = ingest_csv(&storage, &dir.path().join("missing.csv"), false).await;
        assert!(result.is_err());
    }
}

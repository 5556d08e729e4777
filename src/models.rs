use serde::{Deserialize, Serialize};

/// One eligible program as returned by `POST /eligible_ccas`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcaResult {
    pub cca_name: String,
    #[serde(default)]
    pub signup_link: Option<String>,
}

impl CcaResult {
    pub fn new(cca_name: &str, signup_link: Option<&str>) -> Self {
        Self {
            cca_name: cca_name.to_string(),
            signup_link: signup_link.map(|s| s.to_string()),
        }
    }

    /// Signup link, treating an empty string the same as a missing one
    pub fn link(&self) -> Option<&str> {
        self.signup_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

/// Request body for `POST /eligible_ccas`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRequest {
    pub address: String,
}

/// A stored CCA program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cca {
    pub id: i64,
    pub cca_name: String,
    pub is_cca: bool,
    pub is_incumbent_utility: bool,
    pub state: String,
    pub signup_link: Option<String>,
}

impl From<&Cca> for CcaResult {
    fn from(cca: &Cca) -> Self {
        Self {
            cca_name: cca.cca_name.clone(),
            signup_link: cca.signup_link.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaKind {
    County,
    City,
    Zip,
}

impl AreaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaKind::County => "county",
            AreaKind::City => "city",
            AreaKind::Zip => "zip",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "county" => Some(AreaKind::County),
            "city" => Some(AreaKind::City),
            "zip" => Some(AreaKind::Zip),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AreaRule {
    Included,
    Excluded,
}

impl AreaRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            AreaRule::Included => "included",
            AreaRule::Excluded => "excluded",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "included" => Some(AreaRule::Included),
            "excluded" => Some(AreaRule::Excluded),
            _ => None,
        }
    }
}

/// Included and excluded values for one kind of area
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AreaRules {
    pub included: Vec<String>,
    pub excluded: Vec<String>,
}

impl AreaRules {
    pub fn get(&self, rule: AreaRule) -> &[String] {
        match rule {
            AreaRule::Included => &self.included,
            AreaRule::Excluded => &self.excluded,
        }
    }

    pub fn push(&mut self, rule: AreaRule, value: String) {
        match rule {
            AreaRule::Included => self.included.push(value),
            AreaRule::Excluded => self.excluded.push(value),
        }
    }

    pub fn len(&self) -> usize {
        self.included.len() + self.excluded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A program together with the areas it covers or leaves out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcaCoverage {
    pub cca: Cca,
    pub counties: AreaRules,
    pub cities: AreaRules,
    pub zipcodes: AreaRules,
}

impl CcaCoverage {
    pub fn new(cca: Cca) -> Self {
        Self {
            cca,
            counties: AreaRules::default(),
            cities: AreaRules::default(),
            zipcodes: AreaRules::default(),
        }
    }

    pub fn areas(&self, kind: AreaKind) -> &AreaRules {
        match kind {
            AreaKind::County => &self.counties,
            AreaKind::City => &self.cities,
            AreaKind::Zip => &self.zipcodes,
        }
    }

    pub fn areas_mut(&mut self, kind: AreaKind) -> &mut AreaRules {
        match kind {
            AreaKind::County => &mut self.counties,
            AreaKind::City => &mut self.cities,
            AreaKind::Zip => &mut self.zipcodes,
        }
    }

    /// Total number of area rules across all kinds
    pub fn rule_count(&self) -> usize {
        self.counties.len() + self.cities.len() + self.zipcodes.len()
    }
}

/// Catalog counts reported by `ccafinder stats`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogStats {
    pub programs: usize,
    pub with_signup_link: usize,
    pub county_rules: usize,
    pub city_rules: usize,
    pub zip_rules: usize,
    pub last_ingested_at: Option<chrono::NaiveDateTime>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_deserializes_without_link() {
        let parsed: Vec<CcaResult> = serde_json::from_str(
            r#"[{"cca_name": "Marin Clean Energy", "signup_link": "https://mcecleanenergy.org"},
                {"cca_name": "Silicon Valley Clean Energy", "signup_link": null},
                {"cca_name": "Peninsula Clean Energy"}]"#,
        )
        .unwrap();

        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].link(), Some("https://mcecleanenergy.org"));
        assert_eq!(parsed[1].link(), None);
        assert_eq!(parsed[2].link(), None);
    }

    #[test]
    fn test_empty_link_is_no_link() {
        let result = CcaResult::new("Clean Power SF", Some("  "));
        assert_eq!(result.link(), None);
    }

    #[test]
    fn test_area_names_parse_back() {
        for kind in [AreaKind::County, AreaKind::City, AreaKind::Zip] {
            assert_eq!(AreaKind::parse(kind.as_str()), Some(kind));
        }
        for rule in [AreaRule::Included, AreaRule::Excluded] {
            assert_eq!(AreaRule::parse(rule.as_str()), Some(rule));
        }
        assert_eq!(AreaKind::parse("state"), None);
    }
}

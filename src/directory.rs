//! City/ZIP directory used to fill in whichever half of an address is missing

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
struct CityRecord {
    city_ascii: String,
    state_id: String,
    #[serde(default)]
    zips: String,
}

/// Lookup tables built from a `uscities.csv` style file
#[derive(Debug, Default, Clone)]
pub struct ZipDirectory {
    /// (lowercased city, state) -> ZIP codes
    city_state_to_zips: HashMap<(String, String), BTreeSet<String>>,
    /// ZIP code -> (city, state)
    zip_to_city_state: HashMap<String, (String, String)>,
}

impl ZipDirectory {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the directory, falling back to an empty one when the file is absent
    pub fn load_or_empty(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "City directory {} not found; ZIP/city inference disabled",
                path.display()
            );
            return Ok(Self::empty());
        }
        Self::load(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Cannot open city directory: {}", path.display()))?;

        let mut directory = Self::default();
        for record in reader.deserialize::<CityRecord>() {
            let record = record
                .with_context(|| format!("Malformed city directory row in {}", path.display()))?;
            directory.insert(&record.city_ascii, &record.state_id, record.zips.split_whitespace());
        }

        info!(
            "Loaded city directory: {} cities, {} ZIP codes",
            directory.city_state_to_zips.len(),
            directory.zip_to_city_state.len()
        );
        Ok(directory)
    }

    pub fn insert<'a>(&mut self, city: &str, state: &str, zips: impl IntoIterator<Item = &'a str>) {
        let city = city.trim();
        let state = state.trim();
        let entry = self
            .city_state_to_zips
            .entry((city.to_lowercase(), state.to_string()))
            .or_default();

        for zip in zips {
            entry.insert(zip.to_string());
            self.zip_to_city_state
                .insert(zip.to_string(), (city.to_string(), state.to_string()));
        }
    }

    /// ZIP codes for a city; the city name is matched case-insensitively
    pub fn zips_for(&self, city: &str, state: &str) -> Option<&BTreeSet<String>> {
        self.city_state_to_zips
            .get(&(city.trim().to_lowercase(), state.to_string()))
            .filter(|zips| !zips.is_empty())
    }

    pub fn city_for_zip(&self, zip: &str) -> Option<(&str, &str)> {
        self.zip_to_city_state
            .get(zip)
            .map(|(city, state)| (city.as_str(), state.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.city_state_to_zips.is_empty()
    }
}

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::core::{AnchorTable, CountrySeries};

/// Country-keyed indicator table, read once at startup and never mutated.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    countries: BTreeMap<String, CountrySeries>,
}

impl Dataset {
    pub fn new(countries: BTreeMap<String, CountrySeries>) -> Self {
        Self { countries }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let countries: BTreeMap<String, CountrySeries> =
            serde_json::from_str(json).context("dataset is not a country-keyed series table")?;
        Ok(Self::new(countries))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read dataset {}", path.display()))?;
        let dataset = Self::from_json_str(&raw)
            .with_context(|| format!("failed to parse dataset {}", path.display()))?;
        info!(
            "Loaded {} countries from {}",
            dataset.countries.len(),
            path.display()
        );
        Ok(dataset)
    }

    pub fn countries(&self) -> &BTreeMap<String, CountrySeries> {
        &self.countries
    }

    pub fn get(&self, country_code: &str) -> Option<&CountrySeries> {
        self.countries.get(country_code)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Countries that will never produce price metrics because no anchor exists.
    pub fn unanchored<'a>(&'a self, anchors: &'a AnchorTable) -> Vec<&'a str> {
        self.countries
            .keys()
            .map(String::as_str)
            .filter(|code| !anchors.contains(code))
            .collect()
    }

    pub fn warn_unanchored(&self, anchors: &AnchorTable) {
        let missing = self.unanchored(anchors);
        if !missing.is_empty() {
            warn!(
                "No anchor price for {}; price metrics unavailable for them",
                missing.join(", ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "CAN": {
        "realIncome": [{"year": 2016, "value": 51000}, {"year": 2015, "value": 50000}],
        "realHousePriceIndex": [{"year": 2015, "value": 100}, {"year": 2016, "value": 108}],
        "mortgageRate": [{"year": 2015, "value": 2.9}],
        "rent": [{"year": 2015, "value": 100}],
        "households": [{"year": 2015, "value": 14000000}]
      },
      "XYZ": {
        "income": [{"year": 2015, "value": 10000}],
        "housePriceIndex": [{"year": 2015, "value": 100}],
        "rentIndex": [{"year": 2015, "value": 100}]
      }
    }"#;

    #[test]
    fn parses_both_key_styles_and_sorts_points() {
        let dataset = Dataset::from_json_str(SAMPLE).expect("sample should parse");
        assert_eq!(dataset.len(), 2);

        let can = dataset.get("CAN").expect("CAN present");
        let years: Vec<i32> = can.income.years().collect();
        assert_eq!(years, vec![2015, 2016]);
        assert_eq!(can.house_price_index.value_at(2016), Some(108.0));
        assert_eq!(can.rent_index.value_at(2015), Some(100.0));

        let xyz = dataset.get("XYZ").expect("XYZ present");
        assert_eq!(xyz.income.value_at(2015), Some(10_000.0));
        assert!(xyz.mortgage_rate.is_empty());
    }

    #[test]
    fn reports_countries_without_anchor() {
        let dataset = Dataset::from_json_str(SAMPLE).expect("sample should parse");
        let anchors = AnchorTable::oecd_2015();
        assert_eq!(dataset.unanchored(&anchors), vec!["XYZ"]);
    }

    #[test]
    fn rejects_malformed_json() {
        let err = Dataset::from_json_str("[1, 2, 3]").expect_err("must reject array");
        assert!(err.to_string().contains("country-keyed"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = Dataset::load(Path::new("/nonexistent/affordability.json"))
            .expect_err("must fail on missing file");
        assert!(format!("{err:#}").contains("failed to read dataset"));
    }
}

use std::collections::BTreeMap;

use super::types::AnchorPrice;

/// Representative 2015 home prices in each country's local currency.
///
/// Built once by the host and passed into every metric lookup.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnchorTable {
    prices: BTreeMap<String, AnchorPrice>,
}

const OECD_2015_ANCHORS: &[(&str, f64, &str)] = &[
    ("AUS", 450_000.0, "AUD"),
    ("AUT", 250_000.0, "EUR"),
    ("BEL", 230_000.0, "EUR"),
    ("CAN", 440_000.0, "CAD"),
    ("CHL", 55_000_000.0, "CLP"),
    ("COL", 250_000_000.0, "COP"),
    ("CRI", 70_000_000.0, "CRC"),
    ("CZE", 2_500_000.0, "CZK"),
    ("DNK", 2_000_000.0, "DKK"),
    ("EST", 120_000.0, "EUR"),
    ("FIN", 240_000.0, "EUR"),
    ("FRA", 220_000.0, "EUR"),
    ("DEU", 220_000.0, "EUR"),
    ("GRC", 150_000.0, "EUR"),
    ("HUN", 15_000_000.0, "HUF"),
    ("ISL", 40_000_000.0, "ISK"),
    ("IRL", 200_000.0, "EUR"),
    ("ISR", 1_400_000.0, "ILS"),
    ("ITA", 210_000.0, "EUR"),
    ("JPN", 30_000_000.0, "JPY"),
    ("KOR", 350_000_000.0, "KRW"),
    ("LVA", 80_000.0, "EUR"),
    ("LTU", 100_000.0, "EUR"),
    ("LUX", 450_000.0, "EUR"),
    ("MEX", 1_000_000.0, "MXN"),
    ("NLD", 240_000.0, "EUR"),
    ("NZL", 500_000.0, "NZD"),
    ("NOR", 3_000_000.0, "NOK"),
    ("POL", 300_000.0, "PLN"),
    ("PRT", 150_000.0, "EUR"),
    ("SVK", 110_000.0, "EUR"),
    ("SVN", 160_000.0, "EUR"),
    ("ESP", 180_000.0, "EUR"),
    ("SWE", 2_500_000.0, "SEK"),
    ("CHE", 600_000.0, "CHF"),
    ("TUR", 300_000.0, "TRY"),
    ("GBR", 200_000.0, "GBP"),
    ("USA", 250_000.0, "USD"),
];

impl AnchorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn oecd_2015() -> Self {
        OECD_2015_ANCHORS
            .iter()
            .map(|&(code, price, currency)| {
                (
                    code.to_string(),
                    AnchorPrice {
                        price,
                        source_label: format!("2015 representative price ({currency})"),
                    },
                )
            })
            .collect()
    }

    pub fn insert(&mut self, country_code: impl Into<String>, anchor: AnchorPrice) {
        self.prices.insert(country_code.into(), anchor);
    }

    pub fn get(&self, country_code: &str) -> Option<&AnchorPrice> {
        self.prices.get(country_code)
    }

    /// Anchor price usable for derivation; a zero price counts as absent.
    pub fn price(&self, country_code: &str) -> Option<f64> {
        self.get(country_code)
            .map(|anchor| anchor.price)
            .filter(|price| *price != 0.0)
    }

    pub fn contains(&self, country_code: &str) -> bool {
        self.price(country_code).is_some()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(String, AnchorPrice)> for AnchorTable {
    fn from_iter<I: IntoIterator<Item = (String, AnchorPrice)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

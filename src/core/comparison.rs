use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::anchors::AnchorTable;
use super::metrics::metrics_for_year;
use super::mortgage::{monthly_payment, payment_to_income_ratio_pct, years_to_down_payment};
use super::types::{BuyerProfile, ComparisonRow, CountrySeries, SortDirection, SortKey};

const REPRESENTATIVE_COUNT: usize = 5;

/// Picks the top two, the median and the bottom two countries by `metric`.
///
/// Countries whose metric is `None` are left out. With fewer than five
/// ranked countries all of them are returned. Equal metric values keep the
/// map's key order, so ties resolve alphabetically by country code.
pub fn select_representative_countries<F>(
    all_series: &BTreeMap<String, CountrySeries>,
    exclude_code: Option<&str>,
    metric: F,
) -> Vec<String>
where
    F: Fn(&str, &CountrySeries) -> Option<f64>,
{
    let mut ranked: Vec<(&str, f64)> = all_series
        .iter()
        .filter(|(code, _)| Some(code.as_str()) != exclude_code)
        .filter_map(|(code, series)| metric(code, series).map(|value| (code.as_str(), value)))
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let n = ranked.len();
    if n < REPRESENTATIVE_COUNT {
        return ranked.into_iter().map(|(code, _)| code.to_string()).collect();
    }

    let mut selected: Vec<String> = Vec::with_capacity(REPRESENTATIVE_COUNT);
    for idx in [0, 1, n / 2, n - 2, n - 1] {
        let code = ranked[idx].0;
        if !selected.iter().any(|c| c == code) {
            selected.push(code.to_string());
        }
    }
    selected
}

pub fn comparison_rows(
    all_series: &BTreeMap<String, CountrySeries>,
    anchors: &AnchorTable,
    profile: &BuyerProfile,
) -> Vec<ComparisonRow> {
    all_series
        .iter()
        .filter_map(|(code, series)| {
            let end_year = series.income.last()?.year;
            let rate = series.mortgage_rate.last()?.value;

            let mut row = ComparisonRow {
                country_code: code.clone(),
                year: end_year,
                mortgage_rate_pct: rate,
                pti: None,
                mps: None,
                ydp: None,
            };

            if let Some(metrics) = metrics_for_year(series, end_year, code, anchors) {
                let payment = monthly_payment(
                    rate,
                    metrics.house_price,
                    profile.loan_to_value_pct,
                    profile.term_years,
                );
                row.pti = Some(metrics.price_to_income_ratio);
                row.mps = Some(payment_to_income_ratio_pct(metrics.income, payment));
                row.ydp = Some(years_to_down_payment(
                    metrics.house_price,
                    profile.down_payment_pct(),
                    metrics.income,
                    profile.savings_rate_pct,
                ));
            }

            Some(row)
        })
        .collect()
}

fn metric_of(row: &ComparisonRow, key: SortKey) -> Option<f64> {
    match key {
        SortKey::Country => None,
        SortKey::Pti => row.pti,
        SortKey::Mps => row.mps,
        SortKey::Ydp => row.ydp,
    }
}

/// Stable sort; rows missing the sort metric always go last.
pub fn sort_comparison_rows(rows: &mut [ComparisonRow], key: SortKey, direction: SortDirection) {
    let directed = |ordering: Ordering| match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    };

    rows.sort_by(|a, b| {
        if key == SortKey::Country {
            return directed(a.country_code.cmp(&b.country_code));
        }
        match (metric_of(a, key), metric_of(b, key)) {
            (Some(x), Some(y)) => directed(x.total_cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AnchorPrice, TimeSeries};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use proptest::collection::vec;

    fn series_with_income(income: f64) -> CountrySeries {
        CountrySeries {
            income: TimeSeries::from_pairs(&[(2015, income)]),
            house_price_index: TimeSeries::from_pairs(&[(2015, 100.0)]),
            mortgage_rate: TimeSeries::from_pairs(&[(2015, 4.0)]),
            ..CountrySeries::default()
        }
    }

    fn dataset(values: &[(&str, f64)]) -> BTreeMap<String, CountrySeries> {
        values
            .iter()
            .map(|&(code, income)| (code.to_string(), series_with_income(income)))
            .collect()
    }

    fn income_metric(_: &str, series: &CountrySeries) -> Option<f64> {
        series.income.last().map(|p| p.value)
    }

    #[test]
    fn selects_top_median_and_bottom() {
        let all = dataset(&[
            ("A", 10.0),
            ("B", 20.0),
            ("C", 30.0),
            ("D", 40.0),
            ("E", 50.0),
            ("F", 60.0),
            ("G", 70.0),
        ]);
        let selected = select_representative_countries(&all, None, income_metric);
        // Descending: G F E D C B A, median index 3 is D.
        assert_eq!(selected, vec!["G", "F", "D", "B", "A"]);
    }

    #[test]
    fn returns_everything_below_five() {
        let all = dataset(&[("A", 1.0), ("B", 3.0), ("C", 2.0), ("D", 4.0)]);
        let selected = select_representative_countries(&all, None, income_metric);
        assert_eq!(selected, vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn excludes_code_and_missing_metrics() {
        let all = dataset(&[
            ("A", 10.0),
            ("B", 20.0),
            ("C", 30.0),
            ("D", 40.0),
            ("E", 50.0),
            ("F", 60.0),
        ]);
        let selected = select_representative_countries(&all, Some("F"), |code, series| {
            if code == "A" {
                None
            } else {
                income_metric(code, series)
            }
        });
        assert_eq!(selected, vec!["E", "D", "C", "B"]);
    }

    #[test]
    fn ties_keep_code_order() {
        let all = dataset(&[("B", 1.0), ("A", 1.0), ("C", 1.0)]);
        let selected = select_representative_countries(&all, None, income_metric);
        assert_eq!(selected, vec!["A", "B", "C"]);
    }

    #[test]
    fn selection_is_repeatable() {
        let all = dataset(&[
            ("A", 10.0),
            ("B", 20.0),
            ("C", 20.0),
            ("D", 40.0),
            ("E", 50.0),
            ("F", 60.0),
        ]);
        let first = select_representative_countries(&all, Some("E"), income_metric);
        let second = select_representative_countries(&all, Some("E"), income_metric);
        assert_eq!(first, second);
    }

    fn anchors() -> AnchorTable {
        ["A", "B"]
            .into_iter()
            .map(|code| {
                (
                    code.to_string(),
                    AnchorPrice {
                        price: 300_000.0,
                        source_label: "test".to_string(),
                    },
                )
            })
            .collect()
    }

    #[test]
    fn comparison_rows_mark_missing_metrics() {
        let mut all = dataset(&[("A", 60_000.0), ("B", 30_000.0), ("C", 40_000.0)]);
        all.insert("D".to_string(), CountrySeries::default());
        let rows = comparison_rows(&all, &anchors(), &BuyerProfile::default());

        assert_eq!(rows.len(), 3);
        let a = &rows[0];
        assert_eq!(a.country_code, "A");
        assert_eq!(a.year, 2015);
        assert_eq!(a.pti, Some(5.0));
        assert!(a.mps.is_some_and(|v| v > 0.0));
        assert!(a.ydp.is_some_and(|v| (v - 5.0).abs() < 1e-9));

        let c = &rows[2];
        assert_eq!(c.country_code, "C");
        assert_eq!((c.pti, c.mps, c.ydp), (None, None, None));
    }

    #[test]
    fn sorting_puts_missing_values_last_both_ways() {
        let all = dataset(&[("A", 60_000.0), ("B", 30_000.0), ("C", 40_000.0)]);
        let mut rows = comparison_rows(&all, &anchors(), &BuyerProfile::default());

        sort_comparison_rows(&mut rows, SortKey::Pti, SortDirection::Ascending);
        let codes: Vec<&str> = rows.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, vec!["A", "B", "C"]);

        sort_comparison_rows(&mut rows, SortKey::Pti, SortDirection::Descending);
        let codes: Vec<&str> = rows.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, vec!["B", "A", "C"]);

        sort_comparison_rows(&mut rows, SortKey::Country, SortDirection::Descending);
        let codes: Vec<&str> = rows.iter().map(|r| r.country_code.as_str()).collect();
        assert_eq!(codes, vec!["C", "B", "A"]);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_selection_size(values in vec(0u32..1_000, 0..40)) {
            let all: BTreeMap<String, CountrySeries> = values
                .iter()
                .enumerate()
                .map(|(idx, v)| (format!("C{idx:03}"), series_with_income(f64::from(*v))))
                .collect();
            let selected = select_representative_countries(&all, None, income_metric);

            if all.len() < 5 {
                prop_assert_eq!(selected.len(), all.len());
            } else {
                prop_assert_eq!(selected.len(), 5);
            }
            for code in &selected {
                prop_assert!(all.contains_key(code));
            }
        }
    }
}

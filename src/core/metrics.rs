use super::anchors::AnchorTable;
use super::mortgage::{monthly_payment, payment_to_income_ratio_pct, years_to_down_payment};
use super::types::{
    AffordabilityChange, AffordabilityMetrics, BuyerProfile, CountrySeries, CountrySnapshot,
    DivergencePoint, TimeSeries, YearValue,
};

pub const INDEX_BASE_YEAR: i32 = 2015;

/// House price in `year`, scaled from the anchor by the price index.
///
/// When the index has no 2015 observation the first available year stands in
/// as the base, so the anchor is then read as a price in that year instead.
pub fn resolve_house_price(year: i32, price_index: &TimeSeries, anchor_price: f64) -> Option<f64> {
    let at_year = price_index.value_at(year)?;
    let at_base = price_index
        .value_at(INDEX_BASE_YEAR)
        .or_else(|| price_index.first().map(|p| p.value))?;
    if at_base == 0.0 {
        return None;
    }
    Some(anchor_price * (at_year / at_base))
}

pub fn metrics_for_year(
    series: &CountrySeries,
    year: i32,
    country_code: &str,
    anchors: &AnchorTable,
) -> Option<AffordabilityMetrics> {
    let anchor_price = anchors.price(country_code)?;
    let income = series.income.value_at(year).filter(|v| *v != 0.0)?;
    let house_price = resolve_house_price(year, &series.house_price_index, anchor_price)?;

    Some(AffordabilityMetrics {
        year,
        house_price,
        income,
        price_to_income_ratio: house_price / income,
    })
}

pub fn summarize_change(
    start: Option<&AffordabilityMetrics>,
    end: Option<&AffordabilityMetrics>,
) -> Option<AffordabilityChange> {
    let (start, end) = (start?, end?);
    let ratio_delta = end.price_to_income_ratio - start.price_to_income_ratio;
    let ratio_percent_delta = if start.price_to_income_ratio == 0.0 {
        f64::INFINITY
    } else {
        ratio_delta / start.price_to_income_ratio * 100.0
    };

    Some(AffordabilityChange {
        start_ratio: start.price_to_income_ratio,
        start_year: start.year,
        end_ratio: end.price_to_income_ratio,
        end_year: end.year,
        ratio_delta,
        ratio_percent_delta,
    })
}

/// Metrics at the latest income year, the figure used for cross-country views.
pub fn latest_metrics(
    series: &CountrySeries,
    country_code: &str,
    anchors: &AnchorTable,
) -> Option<AffordabilityMetrics> {
    let end_year = series.income.last()?.year;
    metrics_for_year(series, end_year, country_code, anchors)
}

pub fn country_snapshot(
    series: &CountrySeries,
    country_code: &str,
    anchors: &AnchorTable,
    profile: &BuyerProfile,
) -> Option<CountrySnapshot> {
    let start_year = series.income.first()?.year;
    let end_year = series.income.last()?.year;

    let start_metrics = metrics_for_year(series, start_year, country_code, anchors);
    let end_metrics = metrics_for_year(series, end_year, country_code, anchors)?;
    let change = summarize_change(start_metrics.as_ref(), Some(&end_metrics));

    let latest_mortgage_rate_pct = series.mortgage_rate.last().map_or(0.0, |p| p.value);
    let payment = monthly_payment(
        latest_mortgage_rate_pct,
        end_metrics.house_price,
        profile.loan_to_value_pct,
        profile.term_years,
    );

    Some(CountrySnapshot {
        country_code: country_code.to_string(),
        start_year,
        end_year,
        start_metrics,
        end_metrics,
        trend: change.as_ref().map(AffordabilityChange::trend),
        change,
        latest_mortgage_rate_pct,
        monthly_payment: payment,
        payment_to_income_pct: payment_to_income_ratio_pct(end_metrics.income, payment),
        years_to_down_payment: years_to_down_payment(
            end_metrics.house_price,
            profile.down_payment_pct(),
            end_metrics.income,
            profile.savings_rate_pct,
        ),
    })
}

fn yearly_metrics<'a>(
    series: &'a CountrySeries,
    country_code: &'a str,
    anchors: &'a AnchorTable,
) -> impl Iterator<Item = AffordabilityMetrics> + 'a {
    series
        .income
        .years()
        .filter_map(move |year| metrics_for_year(series, year, country_code, anchors))
}

pub fn price_to_income_series(
    series: &CountrySeries,
    country_code: &str,
    anchors: &AnchorTable,
) -> Vec<YearValue> {
    yearly_metrics(series, country_code, anchors)
        .map(|m| YearValue {
            year: m.year,
            value: m.price_to_income_ratio,
        })
        .collect()
}

pub fn mortgage_burden_series(
    series: &CountrySeries,
    country_code: &str,
    anchors: &AnchorTable,
    profile: &BuyerProfile,
) -> Vec<YearValue> {
    yearly_metrics(series, country_code, anchors)
        .filter_map(|m| {
            let rate = series.mortgage_rate.value_at(m.year)?;
            let payment = monthly_payment(
                rate,
                m.house_price,
                profile.loan_to_value_pct,
                profile.term_years,
            );
            Some(YearValue {
                year: m.year,
                value: payment_to_income_ratio_pct(m.income, payment),
            })
        })
        .collect()
}

pub fn down_payment_years_series(
    series: &CountrySeries,
    country_code: &str,
    anchors: &AnchorTable,
    profile: &BuyerProfile,
) -> Vec<YearValue> {
    yearly_metrics(series, country_code, anchors)
        .map(|m| YearValue {
            year: m.year,
            value: years_to_down_payment(
                m.house_price,
                profile.down_payment_pct(),
                m.income,
                profile.savings_rate_pct,
            ),
        })
        .collect()
}

/// House-price and rent indices rebased to 100 at their first common year.
///
/// Both series share one base year so the two lines start together at 100;
/// years missing from either index are skipped.
pub fn rent_price_divergence(series: &CountrySeries) -> Vec<DivergencePoint> {
    let common: Vec<(i32, f64, f64)> = series
        .house_price_index
        .points()
        .iter()
        .filter_map(|p| {
            series
                .rent_index
                .value_at(p.year)
                .map(|rent| (p.year, p.value, rent))
        })
        .collect();

    let Some(&(_, base_price, base_rent)) = common.first() else {
        return Vec::new();
    };
    if base_price == 0.0 || base_rent == 0.0 {
        return Vec::new();
    }

    common
        .into_iter()
        .map(|(year, price, rent)| DivergencePoint {
            year,
            price_index: price / base_price * 100.0,
            rent_index: rent / base_rent * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AnchorPrice;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn anchors_with(code: &str, price: f64) -> AnchorTable {
        let mut table = AnchorTable::new();
        table.insert(
            code,
            AnchorPrice {
                price,
                source_label: "test".to_string(),
            },
        );
        table
    }

    fn sample_series() -> CountrySeries {
        CountrySeries {
            income: TimeSeries::from_pairs(&[(2000, 40_000.0), (2015, 50_000.0), (2020, 55_000.0)]),
            house_price_index: TimeSeries::from_pairs(&[
                (2000, 60.0),
                (2015, 100.0),
                (2020, 130.0),
            ]),
            mortgage_rate: TimeSeries::from_pairs(&[(2000, 6.0), (2015, 3.0), (2020, 2.0)]),
            rent_index: TimeSeries::from_pairs(&[(2000, 80.0), (2015, 100.0), (2020, 110.0)]),
            households: TimeSeries::default(),
        }
    }

    #[test]
    fn metrics_are_bit_identical_across_calls() {
        let series = sample_series();
        let anchors = anchors_with("CAN", 400_000.0);
        let first = metrics_for_year(&series, 2020, "CAN", &anchors).expect("metrics");
        let second = metrics_for_year(&series, 2020, "CAN", &anchors).expect("metrics");
        assert_eq!(first.house_price.to_bits(), second.house_price.to_bits());
        assert_eq!(
            first.price_to_income_ratio.to_bits(),
            second.price_to_income_ratio.to_bits()
        );
    }

    #[test]
    fn house_price_scales_anchor_by_index_ratio() {
        let series = sample_series();
        let price = resolve_house_price(2020, &series.house_price_index, 400_000.0);
        assert_approx(price.expect("price"), 520_000.0);
    }

    #[test]
    fn house_price_falls_back_to_first_year_without_base_year() {
        let index = TimeSeries::from_pairs(&[(2000, 50.0), (2010, 75.0), (2020, 100.0)]);
        assert_approx(
            resolve_house_price(2000, &index, 300_000.0).expect("base"),
            300_000.0,
        );
        assert_approx(
            resolve_house_price(2020, &index, 300_000.0).expect("later"),
            600_000.0,
        );
    }

    #[test]
    fn house_price_missing_when_year_absent_or_base_zero() {
        let series = sample_series();
        assert_eq!(
            resolve_house_price(2010, &series.house_price_index, 1.0),
            None
        );
        let zero_base = TimeSeries::from_pairs(&[(2015, 0.0), (2020, 10.0)]);
        assert_eq!(resolve_house_price(2020, &zero_base, 1.0), None);
        assert_eq!(resolve_house_price(2020, &TimeSeries::default(), 1.0), None);
    }

    #[test]
    fn metrics_compose_price_and_income() {
        let series = sample_series();
        let anchors = anchors_with("CAN", 400_000.0);
        let metrics = metrics_for_year(&series, 2015, "CAN", &anchors).expect("metrics");
        assert_eq!(metrics.year, 2015);
        assert_approx(metrics.house_price, 400_000.0);
        assert_approx(metrics.income, 50_000.0);
        assert_approx(metrics.price_to_income_ratio, 8.0);
    }

    #[test]
    fn metrics_absent_without_anchor_or_income() {
        let mut series = sample_series();
        let anchors = anchors_with("CAN", 400_000.0);
        assert!(metrics_for_year(&series, 2015, "USA", &anchors).is_none());
        assert!(metrics_for_year(&series, 2010, "CAN", &anchors).is_none());

        series.income = TimeSeries::from_pairs(&[(2015, 0.0)]);
        assert!(metrics_for_year(&series, 2015, "CAN", &anchors).is_none());
    }

    #[test]
    fn summarize_change_reports_signed_percent() {
        let series = sample_series();
        let anchors = anchors_with("CAN", 400_000.0);
        let start = metrics_for_year(&series, 2000, "CAN", &anchors);
        let end = metrics_for_year(&series, 2020, "CAN", &anchors);
        let change = summarize_change(start.as_ref(), end.as_ref()).expect("change");

        // 240k / 40k = 6.0 then 520k / 55k.
        assert_approx(change.start_ratio, 6.0);
        assert_approx(change.end_ratio, 520_000.0 / 55_000.0);
        assert_approx(change.ratio_delta, 520_000.0 / 55_000.0 - 6.0);
        assert!(change.ratio_percent_delta > 0.0);
        assert_eq!(change.start_year, 2000);
        assert_eq!(change.end_year, 2020);
        assert_eq!(change.trend(), crate::core::AffordabilityTrend::Worsened);
    }

    #[test]
    fn summarize_change_needs_both_ends() {
        let series = sample_series();
        let anchors = anchors_with("CAN", 400_000.0);
        let end = metrics_for_year(&series, 2020, "CAN", &anchors);
        assert!(summarize_change(None, end.as_ref()).is_none());
        assert!(summarize_change(end.as_ref(), None).is_none());
    }

    #[test]
    fn snapshot_uses_latest_rate_and_profile() {
        let series = sample_series();
        let anchors = anchors_with("CAN", 400_000.0);
        let profile = BuyerProfile::default();
        let snapshot = country_snapshot(&series, "CAN", &anchors, &profile).expect("snapshot");

        assert_eq!(snapshot.start_year, 2000);
        assert_eq!(snapshot.end_year, 2020);
        assert_approx(snapshot.latest_mortgage_rate_pct, 2.0);
        let expected_payment = monthly_payment(2.0, 520_000.0, 90.0, 30);
        assert_approx(snapshot.monthly_payment, expected_payment);
        assert_approx(
            snapshot.payment_to_income_pct,
            expected_payment / (55_000.0 / 12.0) * 100.0,
        );
        // 10% of 520k saved at 10% of 55k.
        assert_approx(snapshot.years_to_down_payment, 52_000.0 / 5_500.0);
        assert!(snapshot.change.is_some());
    }

    #[test]
    fn snapshot_absent_without_end_metrics() {
        let series = sample_series();
        let anchors = AnchorTable::new();
        assert!(country_snapshot(&series, "CAN", &anchors, &BuyerProfile::default()).is_none());
    }

    #[test]
    fn burden_series_skips_years_without_rate() {
        let mut series = sample_series();
        series.mortgage_rate = TimeSeries::from_pairs(&[(2000, 6.0), (2020, 2.0)]);
        let anchors = anchors_with("CAN", 400_000.0);
        let burden = mortgage_burden_series(&series, "CAN", &anchors, &BuyerProfile::default());
        let years: Vec<i32> = burden.iter().map(|p| p.year).collect();
        assert_eq!(years, vec![2000, 2020]);
        assert!(burden.iter().all(|p| p.value.is_finite() && p.value > 0.0));
    }

    #[test]
    fn divergence_rebases_both_indices_to_first_common_year() {
        let series = sample_series();
        let points = rent_price_divergence(&series);
        assert_eq!(points.len(), 3);
        assert_approx(points[0].price_index, 100.0);
        assert_approx(points[0].rent_index, 100.0);
        assert_approx(points[2].price_index, 130.0 / 60.0 * 100.0);
        assert_approx(points[2].rent_index, 110.0 / 80.0 * 100.0);
    }

    #[test]
    fn divergence_empty_without_overlap() {
        let mut series = sample_series();
        series.rent_index = TimeSeries::from_pairs(&[(1990, 50.0)]);
        assert!(rent_price_divergence(&series).is_empty());
    }

    #[test]
    fn price_to_income_series_follows_income_years() {
        let series = sample_series();
        let anchors = anchors_with("CAN", 400_000.0);
        let pti = price_to_income_series(&series, "CAN", &anchors);
        assert_eq!(pti.len(), 3);
        assert_approx(pti[1].value, 8.0);
        let ydp = down_payment_years_series(&series, "CAN", &anchors, &BuyerProfile::default());
        assert_eq!(ydp.len(), 3);
        assert_approx(ydp[1].value, 40_000.0 / 5_000.0);
    }
}

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub year: i32,
    pub value: f64,
}

/// Sorted, year-unique sequence of observations for one indicator.
///
/// Construction normalises the raw points: non-finite values are dropped,
/// points are ordered by year and a repeated year keeps the last value seen.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TimeSeriesPoint>", into = "Vec<TimeSeriesPoint>")]
pub struct TimeSeries {
    points: Vec<TimeSeriesPoint>,
}

impl TimeSeries {
    pub fn new(points: Vec<TimeSeriesPoint>) -> Self {
        let mut points: Vec<TimeSeriesPoint> =
            points.into_iter().filter(|p| p.value.is_finite()).collect();
        points.sort_by_key(|p| p.year);
        let mut deduped: Vec<TimeSeriesPoint> = Vec::with_capacity(points.len());
        for point in points {
            match deduped.last_mut() {
                Some(last) if last.year == point.year => *last = point,
                _ => deduped.push(point),
            }
        }
        Self { points: deduped }
    }

    pub fn from_pairs(pairs: &[(i32, f64)]) -> Self {
        Self::new(
            pairs
                .iter()
                .map(|&(year, value)| TimeSeriesPoint { year, value })
                .collect(),
        )
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.points
            .binary_search_by_key(&year, |p| p.year)
            .ok()
            .map(|idx| self.points[idx].value)
    }

    pub fn first(&self) -> Option<TimeSeriesPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<TimeSeriesPoint> {
        self.points.last().copied()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.points.iter().map(|p| p.year)
    }
}

impl From<Vec<TimeSeriesPoint>> for TimeSeries {
    fn from(points: Vec<TimeSeriesPoint>) -> Self {
        Self::new(points)
    }
}

impl From<TimeSeries> for Vec<TimeSeriesPoint> {
    fn from(series: TimeSeries) -> Self {
        series.points
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CountrySeries {
    #[serde(alias = "realIncome")]
    pub income: TimeSeries,
    #[serde(alias = "realHousePriceIndex")]
    pub house_price_index: TimeSeries,
    pub mortgage_rate: TimeSeries,
    #[serde(alias = "rent")]
    pub rent_index: TimeSeries,
    pub households: TimeSeries,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorPrice {
    pub price: f64,
    pub source_label: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityMetrics {
    pub year: i32,
    pub house_price: f64,
    pub income: f64,
    pub price_to_income_ratio: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AffordabilityTrend {
    Worsened,
    Improved,
    Unchanged,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AffordabilityChange {
    pub start_ratio: f64,
    pub start_year: i32,
    pub end_ratio: f64,
    pub end_year: i32,
    pub ratio_delta: f64,
    pub ratio_percent_delta: f64,
}

impl AffordabilityChange {
    pub fn trend(&self) -> AffordabilityTrend {
        if self.ratio_delta > 0.0 {
            AffordabilityTrend::Worsened
        } else if self.ratio_delta < 0.0 {
            AffordabilityTrend::Improved
        } else {
            AffordabilityTrend::Unchanged
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuyerScenario {
    #[serde(alias = "highSaver")]
    HighSaver,
    Average,
    Stretched,
}

/// Loan shape and saving habit of a typical buyer, all in whole percentages.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyerProfile {
    pub loan_to_value_pct: f64,
    pub term_years: u32,
    pub savings_rate_pct: f64,
}

impl BuyerProfile {
    pub fn down_payment_pct(&self) -> f64 {
        100.0 - self.loan_to_value_pct
    }
}

impl From<BuyerScenario> for BuyerProfile {
    fn from(value: BuyerScenario) -> Self {
        match value {
            BuyerScenario::HighSaver => BuyerProfile {
                loan_to_value_pct: 80.0,
                term_years: 30,
                savings_rate_pct: 15.0,
            },
            BuyerScenario::Average => BuyerProfile {
                loan_to_value_pct: 90.0,
                term_years: 30,
                savings_rate_pct: 10.0,
            },
            BuyerScenario::Stretched => BuyerProfile {
                loan_to_value_pct: 95.0,
                term_years: 30,
                savings_rate_pct: 5.0,
            },
        }
    }
}

impl Default for BuyerProfile {
    fn default() -> Self {
        BuyerScenario::Average.into()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountrySnapshot {
    pub country_code: String,
    pub start_year: i32,
    pub end_year: i32,
    pub start_metrics: Option<AffordabilityMetrics>,
    pub end_metrics: AffordabilityMetrics,
    pub change: Option<AffordabilityChange>,
    pub trend: Option<AffordabilityTrend>,
    pub latest_mortgage_rate_pct: f64,
    pub monthly_payment: f64,
    pub payment_to_income_pct: f64,
    pub years_to_down_payment: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearValue {
    pub year: i32,
    pub value: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergencePoint {
    pub year: i32,
    pub price_index: f64,
    pub rent_index: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub country_code: String,
    pub year: i32,
    pub mortgage_rate_pct: f64,
    pub pti: Option<f64>,
    pub mps: Option<f64>,
    pub ydp: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[serde(alias = "countryCode", alias = "countryName")]
    Country,
    Pti,
    Mps,
    Ydp,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationAssumptions {
    pub annual_home_price_growth_pct: f64,
    pub annual_stock_return_pct: f64,
    pub annual_rent_increase_pct: f64,
    pub annual_ownership_cost_rate_pct: f64,
    pub initial_rental_yield_pct: f64,
}

impl Default for SimulationAssumptions {
    fn default() -> Self {
        Self {
            annual_home_price_growth_pct: 3.0,
            annual_stock_return_pct: 7.0,
            annual_rent_increase_pct: 2.0,
            annual_ownership_cost_rate_pct: 1.5,
            initial_rental_yield_pct: 4.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationParams {
    pub down_payment: f64,
    pub years_to_simulate: u32,
    pub current_home_price: f64,
    pub mortgage_rate_pct: f64,
    pub mortgage_term_years: u32,
    pub assumptions: SimulationAssumptions,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeownerResult {
    pub final_home_value: f64,
    pub remaining_mortgage: f64,
    pub home_equity: f64,
    pub total_monthly_cost: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenterResult {
    pub initial_investment: f64,
    pub average_extra_monthly_investment: f64,
    pub final_investment_value: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub homeowner: HomeownerResult,
    pub renter: RenterResult,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensitivityPoint {
    pub annual_stock_return_pct: f64,
    pub renter_advantage: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SavingsInput {
    MonthlyAmount {
        amount: f64,
    },
    IncomeRate {
        annual_income: f64,
        savings_rate_pct: f64,
    },
}

impl SavingsInput {
    pub fn monthly_amount(self) -> f64 {
        match self {
            SavingsInput::MonthlyAmount { amount } => amount,
            SavingsInput::IncomeRate {
                annual_income,
                savings_rate_pct,
            } => annual_income * savings_rate_pct / 100.0 / 12.0,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalOutcomeParams {
    pub savings: SavingsInput,
    pub down_payment: f64,
    pub years_to_simulate: u32,
    pub current_home_price: f64,
    pub mortgage_rate_pct: f64,
    pub mortgage_term_years: u32,
    pub assumptions: SimulationAssumptions,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalOutcomeResult {
    pub homeowner_net_worth: f64,
    pub renter_net_worth: f64,
}

mod anchors;
mod comparison;
mod metrics;
mod mortgage;
mod personal;
mod simulator;
mod types;

pub use anchors::AnchorTable;
pub use comparison::{comparison_rows, select_representative_countries, sort_comparison_rows};
pub use metrics::{
    INDEX_BASE_YEAR, country_snapshot, down_payment_years_series, latest_metrics,
    metrics_for_year, mortgage_burden_series, price_to_income_series, rent_price_divergence,
    resolve_house_price, summarize_change,
};
pub use mortgage::{
    future_value, future_value_of_annuity, monthly_payment, payment_to_income_ratio_pct,
    remaining_balance, years_to_down_payment,
};
pub use personal::simulate_personal_outcome;
pub use simulator::{
    HomeownerPath, return_sensitivity, run_simulation, simulate_homeowner_path,
    simulate_renter_path,
};
pub use types::{
    AffordabilityChange, AffordabilityMetrics, AffordabilityTrend, AnchorPrice, BuyerProfile,
    BuyerScenario, ComparisonRow, CountrySeries, CountrySnapshot, DivergencePoint,
    HomeownerResult, PersonalOutcomeParams, PersonalOutcomeResult, RenterResult, SavingsInput,
    SensitivityPoint, SimulationAssumptions, SimulationParams, SimulationResult, SortDirection,
    SortKey, TimeSeries, TimeSeriesPoint, YearValue,
};

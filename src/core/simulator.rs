use super::mortgage::{monthly_payment, remaining_balance};
use super::types::{
    HomeownerResult, RenterResult, SensitivityPoint, SimulationParams, SimulationResult,
};

const SENSITIVITY_MAX_RETURN_PCT: f64 = 15.0;
const SENSITIVITY_STEP_PCT: f64 = 0.5;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HomeownerPath {
    pub result: HomeownerResult,
    pub monthly_mortgage_payment: f64,
}

pub fn simulate_homeowner_path(params: &SimulationParams) -> HomeownerPath {
    let assumptions = &params.assumptions;
    let principal = params.current_home_price - params.down_payment;

    // Loan-to-value here is the down payment's share of the price.
    let monthly_mortgage_payment = monthly_payment(
        params.mortgage_rate_pct,
        params.current_home_price,
        params.down_payment / params.current_home_price * 100.0,
        params.mortgage_term_years,
    );

    let final_home_value = appreciated_home_value(params);
    let remaining_mortgage = remaining_balance(
        principal,
        params.mortgage_rate_pct,
        params.mortgage_term_years,
        params.years_to_simulate * 12,
    );

    // Ownership cost stays pinned to the purchase price.
    let monthly_ownership_cost =
        params.current_home_price * assumptions.annual_ownership_cost_rate_pct / 100.0 / 12.0;

    HomeownerPath {
        result: HomeownerResult {
            final_home_value,
            remaining_mortgage,
            home_equity: final_home_value - remaining_mortgage,
            total_monthly_cost: monthly_mortgage_payment + monthly_ownership_cost,
        },
        monthly_mortgage_payment,
    }
}

pub(crate) fn appreciated_home_value(params: &SimulationParams) -> f64 {
    let growth = 1.0 + params.assumptions.annual_home_price_growth_pct / 100.0;
    params.current_home_price * growth.powf(f64::from(params.years_to_simulate))
}

/// Month-by-month renter portfolio.
///
/// The renter invests whatever the homeowner's monthly outlay exceeds the
/// current rent by; in months where rent is higher nothing is withdrawn.
pub fn simulate_renter_path(params: &SimulationParams, homeowner_monthly_cost: f64) -> RenterResult {
    let assumptions = &params.assumptions;
    let monthly_market_return = assumptions.annual_stock_return_pct / 100.0 / 12.0;
    let initial_monthly_rent =
        params.current_home_price * assumptions.initial_rental_yield_pct / 100.0 / 12.0;
    let rent_growth = 1.0 + assumptions.annual_rent_increase_pct / 100.0;
    let months = params.years_to_simulate * 12;

    let mut investment = params.down_payment;
    let mut total_extra_invested = 0.0;

    for month in 1..=months {
        investment *= 1.0 + monthly_market_return;

        let elapsed_years = (month - 1) / 12;
        let current_monthly_rent = initial_monthly_rent * rent_growth.powf(f64::from(elapsed_years));

        let extra = homeowner_monthly_cost - current_monthly_rent;
        if extra > 0.0 {
            investment += extra;
            total_extra_invested += extra;
        }
    }

    let average_extra_monthly_investment = if months > 0 {
        total_extra_invested / f64::from(months)
    } else {
        0.0
    };

    RenterResult {
        initial_investment: params.down_payment,
        average_extra_monthly_investment,
        final_investment_value: investment,
    }
}

pub fn run_simulation(params: &SimulationParams) -> SimulationResult {
    let homeowner = simulate_homeowner_path(params).result;
    let renter = simulate_renter_path(params, homeowner.total_monthly_cost);
    SimulationResult { homeowner, renter }
}

/// Renter advantage over the homeowner across stock returns 0%..=15% in half steps.
pub fn return_sensitivity(params: &SimulationParams) -> Vec<SensitivityPoint> {
    let steps = (SENSITIVITY_MAX_RETURN_PCT / SENSITIVITY_STEP_PCT).round() as u32;
    (0..=steps)
        .map(|step| {
            let rate = f64::from(step) * SENSITIVITY_STEP_PCT;
            let mut scenario = *params;
            scenario.assumptions.annual_stock_return_pct = rate;
            let result = run_simulation(&scenario);
            SensitivityPoint {
                annual_stock_return_pct: rate,
                renter_advantage: result.renter.final_investment_value
                    - result.homeowner.home_equity,
            }
        })
        .collect()
}

use super::mortgage::{future_value, future_value_of_annuity, remaining_balance};
use super::simulator::appreciated_home_value;
use super::types::{PersonalOutcomeParams, PersonalOutcomeResult, SimulationParams};

pub fn simulate_personal_outcome(params: &PersonalOutcomeParams) -> PersonalOutcomeResult {
    let monthly_market_return = params.assumptions.annual_stock_return_pct / 100.0 / 12.0;
    let months = params.years_to_simulate * 12;

    let renter_net_worth = future_value(params.down_payment, monthly_market_return, months)
        + future_value_of_annuity(
            params.savings.monthly_amount(),
            monthly_market_return,
            months,
        );

    let home = SimulationParams::from(*params);
    let final_home_value = appreciated_home_value(&home);
    let remaining_mortgage = remaining_balance(
        params.current_home_price - params.down_payment,
        params.mortgage_rate_pct,
        params.mortgage_term_years,
        months,
    );

    PersonalOutcomeResult {
        homeowner_net_worth: final_home_value - remaining_mortgage,
        renter_net_worth,
    }
}

impl From<PersonalOutcomeParams> for SimulationParams {
    fn from(value: PersonalOutcomeParams) -> Self {
        SimulationParams {
            down_payment: value.down_payment,
            years_to_simulate: value.years_to_simulate,
            current_home_price: value.current_home_price,
            mortgage_rate_pct: value.mortgage_rate_pct,
            mortgage_term_years: value.mortgage_term_years,
            assumptions: value.assumptions,
        }
    }
}

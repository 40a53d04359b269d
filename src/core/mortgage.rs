//! Fixed-rate mortgage and ratio primitives.
//!
//! Rates and ratios are whole percentages (`5.5` means 5.5%). Inputs are
//! expected to be non-negative; nothing here validates them. The only guarded
//! cases are the divisions that would otherwise produce `NaN`.

fn monthly_rate(annual_rate_pct: f64) -> f64 {
    annual_rate_pct / 100.0 / 12.0
}

pub fn monthly_payment(
    annual_rate_pct: f64,
    price: f64,
    loan_to_value_pct: f64,
    term_years: u32,
) -> f64 {
    let principal = price * loan_to_value_pct / 100.0;
    let r = monthly_rate(annual_rate_pct);
    let n = f64::from(term_years * 12);

    // A rate small enough to vanish against 1.0 is treated as zero.
    let growth = (1.0 + r).powf(n);
    if r == 0.0 || growth == 1.0 {
        return principal / n;
    }

    principal * (r * growth) / (growth - 1.0)
}

/// Share of gross monthly income taken by the payment; `+inf` for zero income.
pub fn payment_to_income_ratio_pct(annual_income: f64, monthly_payment: f64) -> f64 {
    let monthly_income = annual_income / 12.0;
    if monthly_income == 0.0 {
        return f64::INFINITY;
    }
    monthly_payment / monthly_income * 100.0
}

pub fn years_to_down_payment(
    price: f64,
    down_payment_pct: f64,
    annual_income: f64,
    annual_savings_rate_pct: f64,
) -> f64 {
    let down_payment = price * down_payment_pct / 100.0;
    let annual_savings = annual_income * annual_savings_rate_pct / 100.0;
    if annual_savings == 0.0 {
        return f64::INFINITY;
    }
    down_payment / annual_savings
}

/// Outstanding balance after `payments_made` monthly payments, never negative.
pub fn remaining_balance(
    principal: f64,
    annual_rate_pct: f64,
    term_years: u32,
    payments_made: u32,
) -> f64 {
    let total_payments = f64::from(term_years * 12);
    let made = f64::from(payments_made);

    let r = monthly_rate(annual_rate_pct);
    let growth_total = (1.0 + r).powf(total_payments);

    let balance = if r == 0.0 || growth_total == 1.0 {
        principal - principal / total_payments * made
    } else {
        let growth_made = (1.0 + r).powf(made);
        principal * (growth_total - growth_made) / (growth_total - 1.0)
    };

    balance.max(0.0)
}

pub fn future_value(present_value: f64, monthly_rate: f64, months: u32) -> f64 {
    present_value * (1.0 + monthly_rate).powf(f64::from(months))
}

pub fn future_value_of_annuity(payment: f64, monthly_rate: f64, months: u32) -> f64 {
    let growth = (1.0 + monthly_rate).powf(f64::from(months));
    if monthly_rate == 0.0 || growth == 1.0 {
        return payment * f64::from(months);
    }
    payment * (growth - 1.0) / monthly_rate
}

use axum::{
    Router,
    extract::{Json, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, ValueEnum};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::core::{
    AnchorTable, BuyerProfile, BuyerScenario, ComparisonRow, CountrySnapshot, DivergencePoint,
    PersonalOutcomeParams, PersonalOutcomeResult, SavingsInput, SensitivityPoint,
    SimulationAssumptions, SimulationParams, SimulationResult, SortDirection, SortKey, YearValue,
    comparison_rows, country_snapshot, down_payment_years_series, latest_metrics,
    mortgage_burden_series, price_to_income_series, rent_price_divergence, return_sensitivity,
    run_simulation, select_representative_countries, simulate_personal_outcome,
    sort_comparison_rows,
};
use crate::data::Dataset;

const DEFAULT_HOME_PRICE: f64 = 440_000.0;
const DEFAULT_DOWN_PAYMENT_PCT: f64 = 20.0;
const DEFAULT_YEARS: u32 = 25;
const DEFAULT_MORTGAGE_RATE: f64 = 5.5;
const DEFAULT_MORTGAGE_TERM: u32 = 30;
const DEFAULT_ANNUAL_INCOME: f64 = 90_000.0;
const DEFAULT_SAVINGS_RATE: f64 = 15.0;
const MAX_YEARS: u32 = 60;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliBuyerScenario {
    HighSaver,
    Average,
    Stretched,
}

impl From<CliBuyerScenario> for BuyerScenario {
    fn from(value: CliBuyerScenario) -> Self {
        match value {
            CliBuyerScenario::HighSaver => BuyerScenario::HighSaver,
            CliBuyerScenario::Average => BuyerScenario::Average,
            CliBuyerScenario::Stretched => BuyerScenario::Stretched,
        }
    }
}

impl From<BuyerScenario> for CliBuyerScenario {
    fn from(value: BuyerScenario) -> Self {
        match value {
            BuyerScenario::HighSaver => CliBuyerScenario::HighSaver,
            BuyerScenario::Average => CliBuyerScenario::Average,
            BuyerScenario::Stretched => CliBuyerScenario::Stretched,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AssumptionArgs {
    #[arg(
        long,
        default_value_t = 3.0,
        help = "Annual home price growth in percent"
    )]
    pub home_price_growth: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Annual stock market return in percent"
    )]
    pub stock_return: f64,
    #[arg(long, default_value_t = 2.0, help = "Annual rent increase in percent")]
    pub rent_increase: f64,
    #[arg(
        long,
        default_value_t = 1.5,
        help = "Annual ownership cost (tax, insurance, upkeep) as percent of purchase price"
    )]
    pub ownership_cost_rate: f64,
    #[arg(
        long,
        default_value_t = 4.0,
        help = "Initial gross rental yield in percent of home price"
    )]
    pub rental_yield: f64,
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[arg(long, default_value_t = DEFAULT_HOME_PRICE, help = "Current home price in local currency")]
    pub home_price: f64,
    #[arg(
        long,
        help = "Down payment amount; defaults to --down-payment-pct of the home price"
    )]
    pub down_payment: Option<f64>,
    #[arg(long, default_value_t = DEFAULT_DOWN_PAYMENT_PCT, help = "Down payment in percent of price")]
    pub down_payment_pct: f64,
    #[arg(long, default_value_t = DEFAULT_YEARS, help = "Years to project")]
    pub years: u32,
    #[arg(long, default_value_t = DEFAULT_MORTGAGE_RATE, help = "Mortgage rate in percent")]
    pub mortgage_rate: f64,
    #[arg(long, default_value_t = DEFAULT_MORTGAGE_TERM, help = "Mortgage term in years")]
    pub mortgage_term: u32,
    #[command(flatten)]
    pub assumptions: AssumptionArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PersonalArgs {
    #[command(flatten)]
    pub simulation: SimulateArgs,
    #[arg(
        long,
        help = "Monthly amount the renter invests; overrides --income and --savings-rate"
    )]
    pub monthly_savings: Option<f64>,
    #[arg(long, default_value_t = DEFAULT_ANNUAL_INCOME, help = "Gross annual income")]
    pub income: f64,
    #[arg(long, default_value_t = DEFAULT_SAVINGS_RATE, help = "Share of income saved in percent")]
    pub savings_rate: f64,
}

#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    #[arg(long, value_enum, default_value_t = CliBuyerScenario::Average)]
    pub scenario: CliBuyerScenario,
    #[arg(long, help = "Loan-to-value in percent; overrides the scenario")]
    pub ltv: Option<f64>,
    #[arg(long, help = "Mortgage term in years; overrides the scenario")]
    pub term: Option<u32>,
    #[arg(long, help = "Savings rate in percent of income; overrides the scenario")]
    pub savings_rate: Option<f64>,
}

pub fn default_assumption_args() -> AssumptionArgs {
    let defaults = SimulationAssumptions::default();
    AssumptionArgs {
        home_price_growth: defaults.annual_home_price_growth_pct,
        stock_return: defaults.annual_stock_return_pct,
        rent_increase: defaults.annual_rent_increase_pct,
        ownership_cost_rate: defaults.annual_ownership_cost_rate_pct,
        rental_yield: defaults.initial_rental_yield_pct,
    }
}

pub fn default_simulate_args() -> SimulateArgs {
    SimulateArgs {
        home_price: DEFAULT_HOME_PRICE,
        down_payment: None,
        down_payment_pct: DEFAULT_DOWN_PAYMENT_PCT,
        years: DEFAULT_YEARS,
        mortgage_rate: DEFAULT_MORTGAGE_RATE,
        mortgage_term: DEFAULT_MORTGAGE_TERM,
        assumptions: default_assumption_args(),
    }
}

pub fn default_personal_args() -> PersonalArgs {
    PersonalArgs {
        simulation: default_simulate_args(),
        monthly_savings: None,
        income: DEFAULT_ANNUAL_INCOME,
        savings_rate: DEFAULT_SAVINGS_RATE,
    }
}

pub fn default_profile_args() -> ProfileArgs {
    ProfileArgs {
        scenario: CliBuyerScenario::Average,
        ltv: None,
        term: None,
        savings_rate: None,
    }
}

fn build_assumptions(args: &AssumptionArgs) -> Result<SimulationAssumptions, String> {
    let growth_rates = [
        ("--home-price-growth", args.home_price_growth),
        ("--stock-return", args.stock_return),
        ("--rent-increase", args.rent_increase),
    ];
    for (flag, value) in growth_rates {
        if !value.is_finite() || value <= -100.0 {
            return Err(format!("{flag} must be > -100"));
        }
    }

    if !args.ownership_cost_rate.is_finite() || args.ownership_cost_rate < 0.0 {
        return Err("--ownership-cost-rate must be >= 0".to_string());
    }

    if !args.rental_yield.is_finite() || args.rental_yield < 0.0 {
        return Err("--rental-yield must be >= 0".to_string());
    }

    Ok(SimulationAssumptions {
        annual_home_price_growth_pct: args.home_price_growth,
        annual_stock_return_pct: args.stock_return,
        annual_rent_increase_pct: args.rent_increase,
        annual_ownership_cost_rate_pct: args.ownership_cost_rate,
        initial_rental_yield_pct: args.rental_yield,
    })
}

pub fn build_simulation_params(args: &SimulateArgs) -> Result<SimulationParams, String> {
    if !args.home_price.is_finite() || args.home_price <= 0.0 {
        return Err("--home-price must be > 0".to_string());
    }

    if !(0.0..=100.0).contains(&args.down_payment_pct) {
        return Err("--down-payment-pct must be between 0 and 100".to_string());
    }

    let down_payment = args
        .down_payment
        .unwrap_or(args.home_price * args.down_payment_pct / 100.0);
    if !down_payment.is_finite() || down_payment < 0.0 || down_payment > args.home_price {
        return Err("--down-payment must be between 0 and --home-price".to_string());
    }

    if args.years == 0 || args.years > MAX_YEARS {
        return Err(format!("--years must be between 1 and {MAX_YEARS}"));
    }

    if !args.mortgage_rate.is_finite() || args.mortgage_rate < 0.0 {
        return Err("--mortgage-rate must be >= 0".to_string());
    }

    if args.mortgage_term == 0 || args.mortgage_term > MAX_YEARS {
        return Err(format!("--mortgage-term must be between 1 and {MAX_YEARS}"));
    }

    Ok(SimulationParams {
        down_payment,
        years_to_simulate: args.years,
        current_home_price: args.home_price,
        mortgage_rate_pct: args.mortgage_rate,
        mortgage_term_years: args.mortgage_term,
        assumptions: build_assumptions(&args.assumptions)?,
    })
}

pub fn build_personal_params(args: &PersonalArgs) -> Result<PersonalOutcomeParams, String> {
    let simulation = build_simulation_params(&args.simulation)?;

    let savings = match args.monthly_savings {
        Some(amount) => {
            if !amount.is_finite() || amount < 0.0 {
                return Err("--monthly-savings must be >= 0".to_string());
            }
            SavingsInput::MonthlyAmount { amount }
        }
        None => {
            if !args.income.is_finite() || args.income < 0.0 {
                return Err("--income must be >= 0".to_string());
            }
            if !(0.0..=100.0).contains(&args.savings_rate) {
                return Err("--savings-rate must be between 0 and 100".to_string());
            }
            SavingsInput::IncomeRate {
                annual_income: args.income,
                savings_rate_pct: args.savings_rate,
            }
        }
    };

    Ok(PersonalOutcomeParams {
        savings,
        down_payment: simulation.down_payment,
        years_to_simulate: simulation.years_to_simulate,
        current_home_price: simulation.current_home_price,
        mortgage_rate_pct: simulation.mortgage_rate_pct,
        mortgage_term_years: simulation.mortgage_term_years,
        assumptions: simulation.assumptions,
    })
}

pub fn build_profile(args: &ProfileArgs) -> Result<BuyerProfile, String> {
    let mut profile = BuyerProfile::from(BuyerScenario::from(args.scenario));

    if let Some(ltv) = args.ltv {
        if !(0.0..=100.0).contains(&ltv) {
            return Err("--ltv must be between 0 and 100".to_string());
        }
        profile.loan_to_value_pct = ltv;
    }

    if let Some(term) = args.term {
        if term == 0 || term > MAX_YEARS {
            return Err(format!("--term must be between 1 and {MAX_YEARS}"));
        }
        profile.term_years = term;
    }

    if let Some(rate) = args.savings_rate {
        if !(0.0..=100.0).contains(&rate) {
            return Err("--savings-rate must be between 0 and 100".to_string());
        }
        profile.savings_rate_pct = rate;
    }

    Ok(profile)
}

pub struct AppState {
    pub dataset: Dataset,
    pub anchors: AnchorTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    home_price: Option<f64>,
    down_payment: Option<f64>,
    down_payment_pct: Option<f64>,
    years: Option<u32>,
    mortgage_rate: Option<f64>,
    mortgage_term: Option<u32>,

    home_price_growth: Option<f64>,
    stock_return: Option<f64>,
    rent_increase: Option<f64>,
    ownership_cost_rate: Option<f64>,
    rental_yield: Option<f64>,

    monthly_savings: Option<f64>,
    income: Option<f64>,
    savings_rate: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ViewQuery {
    scenario: Option<BuyerScenario>,
    ltv: Option<f64>,
    term: Option<u32>,
    savings_rate: Option<f64>,
    sort_key: Option<SortKey>,
    direction: Option<SortDirection>,
    exclude: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CountrySummary {
    country_code: String,
    has_anchor_price: bool,
    first_year: Option<i32>,
    last_year: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotResponse {
    profile: BuyerProfile,
    snapshot: Option<CountrySnapshot>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeriesResponse {
    country_code: String,
    profile: BuyerProfile,
    price_to_income: Vec<YearValue>,
    mortgage_burden: Vec<YearValue>,
    down_payment_years: Vec<YearValue>,
    rent_price_divergence: Vec<DivergencePoint>,
    households: Vec<YearValue>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ComparisonResponse {
    profile: BuyerProfile,
    sort_key: Option<SortKey>,
    direction: Option<SortDirection>,
    rows: Vec<ComparisonRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RepresentativesResponse {
    excluded: Option<String>,
    country_codes: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateResponse {
    params: SimulationParams,
    result: SimulationResult,
    renter_ahead: bool,
    sensitivity: Vec<SensitivityPoint>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalResponse {
    params: PersonalOutcomeParams,
    result: PersonalOutcomeResult,
}

fn simulate_args_from_payload(payload: &SimulatePayload) -> SimulateArgs {
    let mut args = default_simulate_args();

    if let Some(v) = payload.home_price {
        args.home_price = v;
    }
    if let Some(v) = payload.down_payment {
        args.down_payment = Some(v);
    }
    if let Some(v) = payload.down_payment_pct {
        args.down_payment_pct = v;
    }
    if let Some(v) = payload.years {
        args.years = v;
    }
    if let Some(v) = payload.mortgage_rate {
        args.mortgage_rate = v;
    }
    if let Some(v) = payload.mortgage_term {
        args.mortgage_term = v;
    }
    if let Some(v) = payload.home_price_growth {
        args.assumptions.home_price_growth = v;
    }
    if let Some(v) = payload.stock_return {
        args.assumptions.stock_return = v;
    }
    if let Some(v) = payload.rent_increase {
        args.assumptions.rent_increase = v;
    }
    if let Some(v) = payload.ownership_cost_rate {
        args.assumptions.ownership_cost_rate = v;
    }
    if let Some(v) = payload.rental_yield {
        args.assumptions.rental_yield = v;
    }

    args
}

fn personal_args_from_payload(payload: &SimulatePayload) -> PersonalArgs {
    let mut args = default_personal_args();
    args.simulation = simulate_args_from_payload(payload);

    if let Some(v) = payload.monthly_savings {
        args.monthly_savings = Some(v);
    }
    if let Some(v) = payload.income {
        args.income = v;
    }
    if let Some(v) = payload.savings_rate {
        args.savings_rate = v;
    }

    args
}

fn profile_args_from_query(query: &ViewQuery) -> ProfileArgs {
    let mut args = default_profile_args();

    if let Some(v) = query.scenario {
        args.scenario = v.into();
    }
    args.ltv = query.ltv;
    args.term = query.term;
    args.savings_rate = query.savings_rate;

    args
}

pub fn build_simulate_response(params: SimulationParams) -> SimulateResponse {
    let result = run_simulation(&params);
    SimulateResponse {
        params,
        renter_ahead: result.renter.final_investment_value > result.homeowner.home_equity,
        result,
        sensitivity: return_sensitivity(&params),
    }
}

pub fn build_personal_response(params: PersonalOutcomeParams) -> PersonalResponse {
    PersonalResponse {
        params,
        result: simulate_personal_outcome(&params),
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/countries", get(countries_handler))
        .route("/api/countries/:code/snapshot", get(snapshot_handler))
        .route("/api/countries/:code/series", get(series_handler))
        .route("/api/comparison", get(comparison_handler))
        .route("/api/representatives", get(representatives_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .route(
            "/api/personal-outcome",
            get(personal_get_handler).post(personal_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16, state: AppState) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = build_router(Arc::new(state));

    let listener = TcpListener::bind(addr).await?;
    info!("Affordability API listening on http://{addr}");
    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn countries_handler(State(state): State<Arc<AppState>>) -> Response {
    let countries: Vec<CountrySummary> = state
        .dataset
        .countries()
        .iter()
        .map(|(code, series)| CountrySummary {
            country_code: code.clone(),
            has_anchor_price: state.anchors.contains(code),
            first_year: series.income.first().map(|p| p.year),
            last_year: series.income.last().map(|p| p.year),
        })
        .collect();
    json_response(StatusCode::OK, countries)
}

async fn snapshot_handler(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Response {
    let Some(series) = state.dataset.get(&code) else {
        return unknown_country(&code);
    };
    let profile = match build_profile(&profile_args_from_query(&query)) {
        Ok(profile) => profile,
        Err(msg) => return bad_request(&msg),
    };

    let snapshot = country_snapshot(series, &code, &state.anchors, &profile);
    json_response(StatusCode::OK, SnapshotResponse { profile, snapshot })
}

async fn series_handler(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Query(query): Query<ViewQuery>,
) -> Response {
    let Some(series) = state.dataset.get(&code) else {
        return unknown_country(&code);
    };
    let profile = match build_profile(&profile_args_from_query(&query)) {
        Ok(profile) => profile,
        Err(msg) => return bad_request(&msg),
    };

    let anchors = &state.anchors;
    let response = SeriesResponse {
        price_to_income: price_to_income_series(series, &code, anchors),
        mortgage_burden: mortgage_burden_series(series, &code, anchors, &profile),
        down_payment_years: down_payment_years_series(series, &code, anchors, &profile),
        rent_price_divergence: rent_price_divergence(series),
        households: series
            .households
            .points()
            .iter()
            .map(|p| YearValue {
                year: p.year,
                value: p.value,
            })
            .collect(),
        country_code: code,
        profile,
    };
    json_response(StatusCode::OK, response)
}

async fn comparison_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Response {
    let profile = match build_profile(&profile_args_from_query(&query)) {
        Ok(profile) => profile,
        Err(msg) => return bad_request(&msg),
    };

    let mut rows = comparison_rows(state.dataset.countries(), &state.anchors, &profile);
    if let Some(key) = query.sort_key {
        let direction = query.direction.unwrap_or(SortDirection::Ascending);
        sort_comparison_rows(&mut rows, key, direction);
    }

    json_response(
        StatusCode::OK,
        ComparisonResponse {
            profile,
            sort_key: query.sort_key,
            direction: query.direction,
            rows,
        },
    )
}

async fn representatives_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ViewQuery>,
) -> Response {
    let anchors = &state.anchors;
    let country_codes = select_representative_countries(
        state.dataset.countries(),
        query.exclude.as_deref(),
        |code, series| latest_metrics(series, code, anchors).map(|m| m.price_to_income_ratio),
    );
    json_response(
        StatusCode::OK,
        RepresentativesResponse {
            excluded: query.exclude,
            country_codes,
        },
    )
}

async fn simulate_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

async fn simulate_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    simulate_handler_impl(payload)
}

fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let params = match build_simulation_params(&simulate_args_from_payload(&payload)) {
        Ok(params) => params,
        Err(msg) => return bad_request(&msg),
    };
    debug!(
        "Simulating buy vs rent: price={} down={} years={}",
        params.current_home_price, params.down_payment, params.years_to_simulate
    );
    json_response(StatusCode::OK, build_simulate_response(params))
}

async fn personal_get_handler(Query(payload): Query<SimulatePayload>) -> Response {
    personal_handler_impl(payload)
}

async fn personal_post_handler(Json(payload): Json<SimulatePayload>) -> Response {
    personal_handler_impl(payload)
}

fn personal_handler_impl(payload: SimulatePayload) -> Response {
    let params = match build_personal_params(&personal_args_from_payload(&payload)) {
        Ok(params) => params,
        Err(msg) => return bad_request(&msg),
    };
    debug!(
        "Simulating personal outcome: price={} years={}",
        params.current_home_price, params.years_to_simulate
    );
    json_response(StatusCode::OK, build_personal_response(params))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn bad_request(msg: &str) -> Response {
    warn!("Rejected request: {msg}");
    error_response(StatusCode::BAD_REQUEST, msg)
}

fn unknown_country(code: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, &format!("Unknown country: {code}"))
}

use std::path::PathBuf;

use affordability::api::{
    AppState, PersonalArgs, ProfileArgs, SimulateArgs, build_personal_params,
    build_personal_response, build_profile, build_simulate_response, build_simulation_params,
    run_http_server,
};
use affordability::core::{AnchorTable, country_snapshot};
use affordability::data::Dataset;
use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use log::{error, warn};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "affordability",
    about = "Housing affordability metrics and buy-vs-rent projections"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve(ServeArgs),
    /// Project homeowner equity against an invested renter portfolio
    Simulate(SimulateArgs),
    /// Project net worth for a given monthly saving amount
    Personal(PersonalArgs),
    /// Print the affordability snapshot of one country
    Snapshot(SnapshotArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, env = "AFFORDABILITY_DATA", help = "Country series JSON file")]
    data: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SnapshotArgs {
    #[arg(long, env = "AFFORDABILITY_DATA", help = "Country series JSON file")]
    data: PathBuf,
    #[arg(long, help = "Country code, e.g. CAN")]
    country: String,
    #[command(flatten)]
    profile: ProfileArgs,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Simulate(args) => {
            let params = build_simulation_params(&args).map_err(|e| anyhow!(e))?;
            print_json(&build_simulate_response(params))
        }
        Command::Personal(args) => {
            let params = build_personal_params(&args).map_err(|e| anyhow!(e))?;
            print_json(&build_personal_response(params))
        }
        Command::Snapshot(args) => snapshot(args),
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let anchors = AnchorTable::oecd_2015();
    let dataset = match &args.data {
        Some(path) => Dataset::load(path)?,
        None => {
            warn!("No dataset given; country endpoints will be empty");
            Dataset::default()
        }
    };
    dataset.warn_unanchored(&anchors);

    run_http_server(args.port, AppState { dataset, anchors })
        .await
        .with_context(|| format!("server on port {} failed", args.port))
}

fn snapshot(args: SnapshotArgs) -> Result<()> {
    let anchors = AnchorTable::oecd_2015();
    let dataset = Dataset::load(&args.data)?;
    let series = dataset
        .get(&args.country)
        .ok_or_else(|| anyhow!("unknown country: {}", args.country))?;
    let profile = build_profile(&args.profile).map_err(|e| anyhow!(e))?;

    let snapshot = country_snapshot(series, &args.country, &anchors, &profile);
    if snapshot.is_none() {
        warn!(
            "Not enough data for {} (needs income, house price index and an anchor price)",
            args.country
        );
    }
    print_json(&snapshot)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{json}");
    Ok(())
}

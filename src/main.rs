//! OptionMargin - Main Entry Point
//!
//! Loads a portfolio snapshot, resolves its holdings into position groups
//! and reports the margin of each group.

use anyhow::{Context, Result};
use clap::Parser;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use option_margin::config::load_config;
use option_margin::{Portfolio, PortfolioSnapshot, PositionGroup};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Path to the JSON portfolio snapshot
    #[arg(short, long, env = "MARGIN_SNAPSHOT")]
    snapshot: String,

    /// Log level (trace, debug, info, warn, error), overrides the config file
    #[arg(long)]
    log_level: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct GroupReport {
    kind: String,
    quantity: Decimal,
    legs: Vec<String>,
    initial_margin: Decimal,
    maintenance_margin: Decimal,
}

#[derive(Debug, Serialize)]
struct PortfolioReport {
    currency: String,
    total_portfolio_value: Decimal,
    total_initial_margin: Decimal,
    total_margin_used: Decimal,
    margin_remaining: Decimal,
    groups: Vec<GroupReport>,
}

fn group_report(portfolio: &Portfolio, group: &PositionGroup) -> option_margin::Result<GroupReport> {
    let model = group.buying_power_model();
    Ok(GroupReport {
        kind: group.kind().to_string(),
        quantity: group.quantity(),
        legs: group
            .positions()
            .iter()
            .map(|p| format!("{} x {}", p.quantity(), p.symbol()))
            .collect(),
        initial_margin: model.initial_margin(portfolio, group)?,
        maintenance_margin: model.maintenance_margin(portfolio, group)?,
    })
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(args.config.as_str())).context("loading configuration")?;

    // Initialize logging
    let log_level = args.log_level.as_deref().unwrap_or(&config.settings.log_level);
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting OptionMargin");
    info!("Configuration file: {}", args.config);

    let portfolio = PortfolioSnapshot::from_file(&args.snapshot)
        .with_context(|| format!("reading snapshot {}", args.snapshot))?
        .into_portfolio(&config)?;

    let groups = portfolio
        .position_groups()?
        .iter()
        .map(|group| group_report(&portfolio, group))
        .collect::<option_margin::Result<Vec<_>>>()?;

    let report = PortfolioReport {
        currency: portfolio.account_currency().to_string(),
        total_portfolio_value: portfolio.total_portfolio_value(),
        total_initial_margin: portfolio.initial_margin_for_positions(&portfolio.positions())?,
        total_margin_used: portfolio.total_margin_used()?,
        margin_remaining: portfolio.margin_remaining()?,
        groups,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for group in &report.groups {
        println!(
            "{:<28} {:>10}  initial {:>14}  maintenance {:>14}",
            group.kind,
            group.quantity,
            group.initial_margin.round_dp(2),
            group.maintenance_margin.round_dp(2)
        );
        for leg in &group.legs {
            println!("    {}", leg);
        }
    }
    println!();
    println!("Portfolio value:  {} {}", report.total_portfolio_value.round_dp(2), report.currency);
    println!("Initial margin:   {} {}", report.total_initial_margin.round_dp(2), report.currency);
    println!("Margin used:      {} {}", report.total_margin_used.round_dp(2), report.currency);
    println!("Margin remaining: {} {}", report.margin_remaining.round_dp(2), report.currency);

    Ok(())
}

use clap::Args;
use serde_json::{json, Value};

use propdesk_core::property::portfolio::{self, PortfolioInput};

use crate::input;

/// Arguments for the portfolio summary
#[derive(Args)]
pub struct PortfolioArgs {
    /// Path to JSON/YAML input file with units, rent, expenses and mortgages
    #[arg(long)]
    pub input: Option<String>,
}

/// Arguments for a quick occupancy figure
#[derive(Args)]
pub struct OccupancyArgs {
    /// Occupied units
    #[arg(long)]
    pub occupied: usize,

    /// Total units
    #[arg(long)]
    pub total: usize,
}

pub fn run_portfolio(args: PortfolioArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let portfolio_input: PortfolioInput = input::require(args.input.as_deref(), "portfolio summary")?;
    let result = portfolio::summarize_portfolio(&portfolio_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_occupancy(args: OccupancyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.occupied > args.total {
        return Err(format!(
            "--occupied ({}) cannot exceed --total ({})",
            args.occupied, args.total
        )
        .into());
    }
    Ok(json!({
        "result": {
            "occupied_units": args.occupied,
            "total_units": args.total,
            "occupancy_rate_pct": portfolio::occupancy_rate(args.occupied, args.total),
        }
    }))
}

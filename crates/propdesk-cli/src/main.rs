mod commands;
mod input;
mod logger;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::billing::{BalanceArgs, GenerateBillingArgs, RefreshBillingArgs, RunBillingArgs};
use commands::mortgage::{AmortizeArgs, BindArgs, MortgageSummaryArgs, PeriodSplitArgs, ScheduleArgs};
use commands::property::{OccupancyArgs, PortfolioArgs};

/// Mortgage, portfolio and billing calculations for landlords
#[derive(Parser)]
#[command(
    name = "propdesk",
    version,
    about = "Mortgage, portfolio and billing calculations for landlords",
    long_about = "A CLI for the calculations behind a property-management dashboard, \
                  with decimal precision. Supports mortgage payments and amortisation \
                  schedules, binding calculated payments into mortgage records, \
                  occupancy and net income, and tenant billing."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Monthly payment and first-month principal/interest split
    Amortize(AmortizeArgs),
    /// Principal/interest split for one payment period
    PeriodSplit(PeriodSplitArgs),
    /// Full month-by-month amortisation schedule
    Schedule(ScheduleArgs),
    /// Run the record binder over a mortgage form and commit it
    Bind(BindArgs),
    /// Summarise a mortgage record (outlay, maturity, projected balance)
    MortgageSummary(MortgageSummaryArgs),
    /// Occupancy, NOI and cash flow for a portfolio
    Portfolio(PortfolioArgs),
    /// Occupancy rate from unit counts
    Occupancy(OccupancyArgs),
    /// Outstanding balance for a tenant
    OutstandingBalance(BalanceArgs),
    /// Generate pending rent records for a billing period
    GenerateBilling(GenerateBillingArgs),
    /// Mark billing records paid/overdue from payments
    RefreshBilling(RefreshBillingArgs),
    /// Bill the period and refresh all statuses in one pass
    RunBilling(RunBillingArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::mortgage::run_amortize(args),
        Commands::PeriodSplit(args) => commands::mortgage::run_period_split(args),
        Commands::Schedule(args) => commands::mortgage::run_schedule(args),
        Commands::Bind(args) => commands::mortgage::run_bind(args),
        Commands::MortgageSummary(args) => commands::mortgage::run_mortgage_summary(args),
        Commands::Portfolio(args) => commands::property::run_portfolio(args),
        Commands::Occupancy(args) => commands::property::run_occupancy(args),
        Commands::OutstandingBalance(args) => commands::billing::run_outstanding_balance(args),
        Commands::GenerateBilling(args) => commands::billing::run_generate_billing(args),
        Commands::RefreshBilling(args) => commands::billing::run_refresh_billing(args),
        Commands::RunBilling(args) => commands::billing::run_automatic_billing(args),
        Commands::Version => {
            println!("propdesk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

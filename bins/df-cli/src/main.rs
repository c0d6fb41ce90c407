//! df-cli — Data Farming reward engine on the command line.
//!
//! Computes weekly vesting amounts, predictoor rewards for a round, and dry-run
//! disbursement plans.

mod dry_run;
mod rpc;
mod settings;
mod subgraph;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use df_core::traits::{MarketEnumerator, StaticMarkets};
use df_core::types::{Address, MarketId, RewardPeriod};
use df_core::units::wei_to_tokens;
use df_dispense::{DispenseReport, dispense};
use df_predictoor::csvs::{
    load_predictoor_rewards_csv, save_predictoor_data_csv, save_predictoor_rewards_csv,
};
use df_predictoor::{Participant, PredictionEvent, aggregate, calc_predictoor_rewards, flatten};
use df_vesting::{DecayFunction, Stream, VestingCalculator, df_week_number};

use crate::dry_run::DryRunAllocator;
use crate::rpc::RpcDecayOracle;
use crate::settings::DfConfig;
use crate::subgraph::SubgraphMarkets;

/// Data Farming reward engine.
#[derive(Parser)]
#[command(name = "df-cli")]
#[command(version, about = "Predictoor rewards and vesting amounts for Data Farming")]
struct Cli {
    /// Config file (default: ~/.config/df/config.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format ("text" or "json"); overrides config
    #[arg(long, global = true)]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Amount released for the DF week starting on a date.
    WeeklyAmount(WeeklyAmountArgs),
    /// Score a round of predictions and write reward CSVs.
    PredictoorRewards(PredictoorRewardsArgs),
    /// Plan reward disbursement from a rewards CSV without sending anything.
    Dispense(DispenseArgs),
}

#[derive(Args)]
struct WeeklyAmountArgs {
    /// Week start date (YYYY-MM-DD), a Thursday in DF numbering.
    week: NaiveDate,

    /// Ask the vesting wallet contract instead of the local formula.
    #[arg(long)]
    exact: bool,

    /// Also report one active stream ("predictoor" or "volume").
    #[arg(long)]
    stream: Option<Stream>,
}

#[derive(Args)]
struct PredictoorRewardsArgs {
    /// JSON array of prediction records.
    #[arg(long)]
    predictions: PathBuf,

    /// Round start date (YYYY-MM-DD).
    #[arg(long)]
    week: NaiveDate,

    /// Tokens to distribute (default: the week's predictoor stream).
    #[arg(long)]
    tokens: Option<f64>,

    /// Markets to score (comma-separated); overrides config and subgraph.
    #[arg(long, value_delimiter = ',')]
    markets: Vec<String>,

    /// Existing directory receiving predictoor_data.csv and predictoor_rewards.csv.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Args)]
struct DispenseArgs {
    /// Directory holding predictoor_rewards.csv.
    #[arg(long)]
    rewards_dir: PathBuf,

    /// Recipients per batch; overrides config.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Only this 1-based batch (resume after partial failure).
    #[arg(long)]
    batch_number: Option<usize>,
}

/// One prediction as exported by the ingestion side.
#[derive(Debug, Deserialize)]
struct PredictionRecord {
    predictoor: String,
    contract: String,
    payout: f64,
    stake: f64,
    #[serde(default)]
    timestamp: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = DfConfig::load(cli.config.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&cfg.log_level);
    let format = cli.log_format.as_deref().unwrap_or(&cfg.log_format);
    init_logging(level, format);

    match cli.command {
        Commands::WeeklyAmount(args) => weekly_amount(&cfg, args).await,
        Commands::PredictoorRewards(args) => predictoor_rewards(&cfg, args).await,
        Commands::Dispense(args) => dry_run_dispense(&cfg, args).await,
    }
}

fn week_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

async fn weekly_amount(cfg: &DfConfig, args: WeeklyAmountArgs) -> Result<()> {
    let params = cfg.vesting_params()?;
    let week = week_start(args.week);

    let report = if args.exact {
        let url = cfg
            .rpc_url
            .as_deref()
            .context("rpc_url is required for exact mode")?;
        let oracle = RpcDecayOracle::new(
            url,
            cfg.vesting_wallet()?,
            Duration::from_secs(cfg.rpc_timeout_secs),
        )
        .context("Failed to build RPC client")?;
        oracle
            .verify_chain(cfg.chain_id)
            .await
            .context("RPC endpoint is on the wrong chain")?;
        week_report(&VestingCalculator::exact(params, oracle), week, args.stream).await?
    } else {
        week_report(&VestingCalculator::approximate(params), week, args.stream).await?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn week_report<D: DecayFunction>(
    calc: &VestingCalculator<D>,
    week: DateTime<Utc>,
    stream: Option<Stream>,
) -> Result<serde_json::Value> {
    let total = calc
        .reward_amount_for_week_wei(week)
        .await
        .context("Failed to compute weekly amount")?;
    let active = calc.active_reward_amount_for_week_wei(week).await?;

    let mut report = json!({
        "week_start": week.to_rfc3339(),
        "df_week": df_week_number(week),
        "amount_wei": total.to_string(),
        "amount_tokens": wei_to_tokens(total),
        "active_wei": active.to_string(),
    });
    if let Some(stream) = stream {
        let amount = calc.active_reward_amount_by_stream_wei(week, stream).await?;
        report["stream"] = json!({
            "name": stream.to_string(),
            "amount_wei": amount.to_string(),
            "amount_tokens": wei_to_tokens(amount),
        });
    }
    Ok(report)
}

async fn predictoor_rewards(cfg: &DfConfig, args: PredictoorRewardsArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.predictions)
        .with_context(|| format!("Failed to read {}", args.predictions.display()))?;
    let records: Vec<PredictionRecord> =
        serde_json::from_str(&raw).context("Predictions file is not a JSON array of records")?;
    let participants = build_participants(records)?;

    let week = week_start(args.week);
    let period = RewardPeriod::week_starting(week);
    let tokens = match args.tokens {
        Some(t) => t,
        None => {
            let calc = VestingCalculator::approximate(cfg.vesting_params()?);
            wei_to_tokens(calc.active_reward_amount_by_stream_wei(week, Stream::Predictoor).await?)
        }
    };

    let enumerator = market_enumerator(cfg, &args.markets)?;
    let per_market = calc_predictoor_rewards(&participants, tokens, enumerator.as_ref(), &period)
        .await
        .context("Failed to compute predictoor rewards")?;
    let totals = aggregate(&per_market);

    let summaries: BTreeMap<_, _> = participants
        .values()
        .map(|p| (p.address().clone(), p.summary()))
        .collect();
    save_predictoor_data_csv(&summaries, &args.out_dir)?;
    save_predictoor_rewards_csv(&totals, &args.out_dir)?;

    info!(
        participants = participants.len(),
        rewarded = totals.len(),
        tokens,
        "round complete"
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "df_week": df_week_number(week),
            "tokens_avail": tokens,
            "markets": per_market.len(),
            "rewarded": totals.len(),
            "distributed": flatten(&per_market),
        }))?
    );
    Ok(())
}

fn build_participants(records: Vec<PredictionRecord>) -> Result<BTreeMap<Address, Participant>> {
    let mut participants: BTreeMap<Address, Participant> = BTreeMap::new();
    for (i, r) in records.into_iter().enumerate() {
        let address: Address = r
            .predictoor
            .parse()
            .with_context(|| format!("record {i}: bad predictoor"))?;
        let market: MarketId = r
            .contract
            .parse()
            .with_context(|| format!("record {i}: bad contract"))?;
        let event = PredictionEvent::new(r.timestamp, r.payout, r.stake, market)
            .with_context(|| format!("record {i}"))?;
        participants
            .entry(address.clone())
            .or_insert_with(|| Participant::new(address))
            .add_prediction(event);
    }
    Ok(participants)
}

fn market_enumerator(cfg: &DfConfig, cli_markets: &[String]) -> Result<Box<dyn MarketEnumerator>> {
    if !cli_markets.is_empty() {
        let markets = cli_markets
            .iter()
            .map(|m| m.parse().with_context(|| format!("invalid market id {m:?}")))
            .collect::<Result<Vec<MarketId>>>()?;
        return Ok(Box::new(StaticMarkets::new(markets)));
    }
    let configured = cfg.markets()?;
    if !configured.is_empty() {
        return Ok(Box::new(StaticMarkets::new(configured)));
    }
    match cfg.subgraph_url.as_deref() {
        Some(url) => Ok(Box::new(SubgraphMarkets::new(
            url,
            Duration::from_secs(cfg.rpc_timeout_secs),
        )?)),
        None => bail!("no markets: pass --markets, set `markets` or `subgraph_url` in config"),
    }
}

async fn dry_run_dispense(cfg: &DfConfig, args: DispenseArgs) -> Result<()> {
    let rewards = load_predictoor_rewards_csv(&args.rewards_dir)?;
    let mut opts = cfg.dispense_options(args.batch_number);
    if let Some(size) = args.batch_size {
        opts.batch_size = size;
    }

    let allocator = DryRunAllocator::default();
    let report = dispense(&rewards, &allocator, &opts).await?;

    println!("{}", serde_json::to_string_pretty(&dispense_plan(&report, &allocator))?);
    if !report.is_complete() {
        bail!("batches {:?} failed; rerun with --batch-number", report.failed);
    }
    Ok(())
}

fn dispense_plan(report: &DispenseReport, allocator: &DryRunAllocator) -> serde_json::Value {
    let approved: Vec<String> = allocator.approved().iter().map(u128::to_string).collect();
    json!({
        "total_batches": report.total_batches,
        "confirmed": report.confirmed,
        "failed": report.failed,
        "total_wei": report.total_wei.to_string(),
        "approved_wei": approved,
        "calls": allocator.calls(),
    })
}

/// Initialise the tracing subscriber.
fn init_logging(level_str: &str, format: &str) {
    use tracing_subscriber::filter::EnvFilter;
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_str));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
            .init();
    }
}

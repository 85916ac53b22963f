//! gsw: giftswap CLI
//!
//! Thin wrapper over `giftswap-core`: `assign` generates one
//! gift-exchange round from a roster config, `audit` measures the
//! pairing distribution of a generation strategy across seeded trials.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Context;
use chrono::Datelike;
use clap::{Args, Parser, Subcommand};
use giftswap_core::StrategyKind;
use giftswap_core::audit::{AuditReport, audit, audit_parallel};
use giftswap_core::config::RosterConfig;
use giftswap_core::logging::init_logging;
use giftswap_core::strategy::DEFAULT_STRATEGY;
use tracing::info;

#[derive(Parser)]
#[command(name = "gsw", version, about = "Family gift exchange assignments")]
struct Cli {
    /// Default log filter when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate one assignment round from a roster config
    Assign(AssignArgs),
    /// Measure the pairing distribution of generation strategies
    Audit(AuditArgs),
}

#[derive(Args)]
struct AssignArgs {
    /// Path to the roster YAML document
    #[arg(long)]
    config: PathBuf,

    /// Seed override (default: config seed, else the current year)
    #[arg(long)]
    seed: Option<u64>,

    /// Family ids to leave out of this round, besides the config's
    /// standing exclusions
    #[arg(long = "exclude", value_name = "FAMILY_ID")]
    exclude: Vec<String>,

    /// Generation strategy
    #[arg(long, default_value_t = DEFAULT_STRATEGY)]
    strategy: StrategyKind,

    /// Print display names instead of family ids
    #[arg(long)]
    names: bool,
}

#[derive(Args)]
struct AuditArgs {
    /// Synthetic roster size
    #[arg(long, default_value_t = 4)]
    families: usize,

    /// Number of seeded trials
    #[arg(long, default_value_t = 100_000)]
    trials: u64,

    /// Strategy to audit
    #[arg(long, default_value_t = DEFAULT_STRATEGY, conflicts_with = "all")]
    strategy: StrategyKind,

    /// Audit every strategy and print a comparison table
    #[arg(long)]
    all: bool,

    /// Worker threads for the trial sweep
    #[arg(long, default_value_t = 1)]
    workers: usize,

    /// Emit reports as JSON instead of tables
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    match cli.command {
        Command::Assign(args) => run_assign(&args),
        Command::Audit(args) => run_audit(&args),
    }
}

fn run_assign(args: &AssignArgs) -> anyhow::Result<()> {
    let config = RosterConfig::load(&args.config)
        .with_context(|| format!("loading roster config {}", args.config.display()))?;
    let participants = config.participants(&args.exclude);
    let seed = args.seed.or(config.seed).unwrap_or_else(current_year);

    let assignment = args.strategy.generate(participants, Some(seed))?;
    info!(
        seed,
        strategy = %args.strategy,
        families = assignment.len(),
        "assignment round generated"
    );

    for (giver, receiver) in assignment.iter() {
        if args.names {
            println!(
                "{} -> {}",
                config.display_name(giver),
                config.display_name(receiver)
            );
        } else {
            println!("{giver} -> {receiver}");
        }
    }
    Ok(())
}

fn run_audit(args: &AuditArgs) -> anyhow::Result<()> {
    let ids: Vec<String> = (0..args.families).map(|i| format!("F{i:02}")).collect();
    let kinds: Vec<StrategyKind> = if args.all {
        StrategyKind::ALL.to_vec()
    } else {
        vec![args.strategy]
    };

    let mut reports = Vec::with_capacity(kinds.len());
    for kind in kinds {
        reports.push(run_one_audit(&ids, kind, args)?);
    }

    if args.json {
        if let [only] = reports.as_slice() {
            println!("{}", serde_json::to_string_pretty(only)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    } else if args.all {
        print_comparison(args, &reports);
    } else {
        print!("{}", reports[0].render_plain());
    }
    Ok(())
}

fn run_one_audit(ids: &[String], kind: StrategyKind, args: &AuditArgs) -> anyhow::Result<AuditReport> {
    let report = match NonZeroUsize::new(args.workers) {
        Some(workers) if workers.get() > 1 => {
            audit_parallel(ids, kind, 0..args.trials, workers)?
        }
        _ => audit(ids, kind, 0..args.trials)?,
    };
    Ok(report)
}

fn print_comparison(args: &AuditArgs, reports: &[AuditReport]) {
    println!(
        "{} families, {} trials per strategy",
        args.families, args.trials
    );
    println!("{:-<64}", "");
    println!(
        "{:<22} {:>12} {:>18}",
        "strategy", "elapsed (s)", "max deviation %"
    );
    println!("{:-<64}", "");
    for report in reports {
        println!(
            "{:<22} {:>12.3} {:>18.2}",
            report.strategy.to_string(),
            report.elapsed_secs,
            report.max_deviation
        );
    }
}

fn current_year() -> u64 {
    u64::from(chrono::Local::now().year().unsigned_abs())
}

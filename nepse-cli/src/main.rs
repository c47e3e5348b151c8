//! NEPSE CLI: keep the NEPSE price, calendar and listing dataset current.
//!
//! Commands:
//! - `prices`: incremental price update per sector, committed per sector
//! - `scrape`: full history for named symbols, no commit
//! - `holidays`: calendar fill, holiday discovery, derived lists, commit
//! - `listing`: rebuild the sector listing, commit
//! - `lookup`: print the category of a symbol

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use nepse_core::data::{store, HttpClient};
use nepse_runner::jobs::PriceSummary;
use nepse_runner::{
    run_holidays, run_listing, run_prices, run_scrape, Config, Credentials, GitCli, HttpSources,
    JobContext, LogProgress, PublishOutcome, Publisher, PushStatus,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nepse", about = "NEPSE CLI: incremental market data and trading calendar refresh")]
struct Cli {
    /// Path to a TOML config file. Built-in defaults apply without one.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch new price rows for every listed symbol.
    Prices {
        /// Only these sectors (folder names, e.g. Commercial_Banks).
        #[arg(long = "sector")]
        sectors: Vec<String>,

        /// Write files but do not touch git.
        #[arg(long, default_value_t = false)]
        no_publish: bool,
    },
    /// Rebuild the full price history of the given symbols.
    Scrape {
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Refresh the trading calendar and holiday lists.
    Holidays {
        /// Date to fill the calendar through (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        today: Option<String>,

        /// Write files but do not touch git.
        #[arg(long, default_value_t = false)]
        no_publish: bool,
    },
    /// Rebuild the sector listing from the company list.
    Listing {
        /// Write files but do not touch git.
        #[arg(long, default_value_t = false)]
        no_publish: bool,
    },
    /// Print the category a symbol is listed under.
    Lookup { symbol: String },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    tracing::debug!(repo = %config.paths.repo_dir.display(), sectors = config.sectors.len(), "configuration loaded");

    match cli.command {
        Commands::Prices { sectors, no_publish } => cmd_prices(&config, &sectors, no_publish),
        Commands::Scrape { symbols } => cmd_scrape(&config, &symbols),
        Commands::Holidays { today, no_publish } => cmd_holidays(&config, today.as_deref(), no_publish),
        Commands::Listing { no_publish } => cmd_listing(&config, no_publish),
        Commands::Lookup { symbol } => cmd_lookup(&config, &symbol),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

fn sources(config: &Config) -> Result<HttpSources> {
    let client = HttpClient::new(config.http_settings())?;
    Ok(HttpSources::new(client, config.sources.clone()))
}

/// Run `f` with a job context wired to live sources and, unless
/// `no_publish`, to git in the repo directory.
fn with_context<T>(config: &Config, no_publish: bool, f: impl FnOnce(&JobContext<'_>) -> Result<T>) -> Result<T> {
    let sources = sources(config)?;
    let git = GitCli::new(&config.paths.repo_dir);
    let publisher = (!no_publish).then(|| Publisher {
        vcs: &git,
        credentials: Credentials::from_env(&config.git),
    });
    let ctx = JobContext {
        config,
        sources: &sources,
        progress: &LogProgress,
        publisher,
    };
    f(&ctx)
}

fn cmd_prices(config: &Config, sectors: &[String], no_publish: bool) -> Result<()> {
    let summary = with_context(config, no_publish, |ctx| Ok(run_prices(ctx, sectors)?))?;
    print_price_summary(&summary);
    Ok(())
}

fn print_price_summary(summary: &PriceSummary) {
    println!();
    println!("=== Price Update ===");
    for sector in &summary.sectors {
        let latest = sector
            .latest
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<32} updated {:>3}  failed {:>3}  latest {latest}  {}",
            sector.sector,
            sector.updated.len(),
            sector.failed.len(),
            describe_publish(sector.published.as_ref(), sector.publish_error.as_deref()),
        );
    }
    println!(
        "Total: {} symbols updated, {} failed",
        summary.symbols_updated(),
        summary.symbols_failed()
    );
}

fn cmd_scrape(config: &Config, symbols: &[String]) -> Result<()> {
    let summary = with_context(config, true, |ctx| Ok(run_scrape(ctx, symbols)?))?;
    for (symbol, category, rows) in &summary.scraped {
        println!("{symbol}: {rows} rows -> {category}");
    }
    for symbol in &summary.unknown {
        eprintln!("{symbol}: not found in listing");
    }
    for symbol in &summary.failed {
        eprintln!("{symbol}: scrape failed");
    }
    Ok(())
}

fn cmd_holidays(config: &Config, today: Option<&str>, no_publish: bool) -> Result<()> {
    let today = match today {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid --today '{s}'"))?,
        None => chrono::Local::now().date_naive(),
    };
    let summary = with_context(config, no_publish, |ctx| Ok(run_holidays(ctx, today)?))?;

    println!();
    println!("=== Holiday Update ===");
    println!(
        "Calendar fill:    {} weekends, {} weekdays added, {} corrected",
        summary.filled.weekends_added, summary.filled.weekdays_added, summary.filled.weekends_corrected
    );
    println!(
        "Years scraped:    {}",
        summary.years.iter().map(|y| y.year.to_string()).collect::<Vec<_>>().join(", ")
    );
    println!("New holidays:     {}", summary.new_holidays.len());
    for h in &summary.new_holidays {
        println!("  {}  {}", h.date, h.description);
    }
    println!("Files changed:    {}", summary.written.any_written());
    println!("Publish:          {}", describe_publish(summary.published.as_ref(), None));
    Ok(())
}

fn cmd_listing(config: &Config, no_publish: bool) -> Result<()> {
    let summary = with_context(config, no_publish, |ctx| Ok(run_listing(ctx)?))?;
    println!();
    println!("=== Listing Update ===");
    for sector in &summary.listing.sectors {
        println!("{:<32} {:>4} symbols", sector.name, sector.symbols.len());
    }
    if !summary.failed.is_empty() {
        println!("Failed sectors: {}", summary.failed.join(", "));
    }
    println!("Publish: {}", describe_publish(summary.published.as_ref(), None));
    Ok(())
}

fn cmd_lookup(config: &Config, symbol: &str) -> Result<()> {
    let path = config.listing_path();
    if !path.exists() {
        bail!("listing file {} not found; run `nepse listing` first", path.display());
    }
    let listing = store::load_listing(&path)?;
    let category = listing.category_of(symbol)?;
    println!("{category}");
    Ok(())
}

fn describe_publish(outcome: Option<&PublishOutcome>, error: Option<&str>) -> String {
    if let Some(e) = error {
        return format!("publish failed: {e}");
    }
    match outcome {
        None => "not published".into(),
        Some(PublishOutcome::NothingToCommit) => "nothing to commit".into(),
        Some(PublishOutcome::Committed { push }) => match push {
            PushStatus::Pushed => "committed and pushed".into(),
            PushStatus::Skipped => "committed, push skipped (no token)".into(),
            PushStatus::Failed(e) => format!("committed, push failed: {e}"),
        },
    }
}

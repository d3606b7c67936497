use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use tapfarm::page::chrome::ChromeProvider;
use tapfarm::{Farm, FarmConfig};

#[derive(Parser)]
#[command(name = "tapfarm")]
#[command(about = "Multi-account automation for tap-to-earn mini apps")]
#[command(version)]
struct Cli {
    /// Farm config file
    config: PathBuf,

    /// Run browsers headless (overrides config)
    #[arg(long)]
    headless: bool,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Validate config without starting the farm
    #[arg(long)]
    check: bool,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> tapfarm::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        Level::ERROR
    } else {
        match cli.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    let mut config = FarmConfig::load(&cli.config)?;

    if cli.check {
        println!("Config valid");
        if let Some(platform) = config.platform {
            println!("  Platform: {platform}");
        }
        println!("  Accounts: {}", config.accounts.len());
        println!("  Tap budget: {}", config.tap_budget.unwrap_or_default());
        println!("  Claim daily rewards: {}", config.claim_daily_rewards);
        println!("  Use energy boosts: {}", config.use_energy_boosts);
        return Ok(());
    }

    if cli.headless {
        config.browser.headless = true;
    }

    let mut farm = Farm::new(Arc::new(ChromeProvider::new()));
    let status = farm.activate(&config)?;
    println!("Running: {status}");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!();
            println!("Stopping...");
        }
        _ = farm.wait_idle() => {
            println!("All workers finished");
        }
    }

    farm.deactivate().await;
    println!("Farm stopped");

    Ok(())
}

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use txcheck_core::validation::{load_fixtures, run_all};
use txcheck_core::ChainConfig;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Transaction test files (JSON objects mapping test names to vectors)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Network preset: mainnet, ropsten or frontier
    #[arg(long, default_value = "mainnet", conflicts_with_all = ["fork", "config"])]
    network: String,

    /// Test-suite rule set with every fork up to this one active from genesis
    /// (Frontier, Homestead, EIP150, EIP158, Byzantium, Constantinople)
    #[arg(long, conflicts_with = "config")]
    fork: Option<String>,

    /// JSON chain configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only run tests whose name contains this substring
    #[arg(long)]
    filter: Option<String>,
}

fn main() -> Result<()> {
    // 1. Initialize Logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    // 2. Resolve chain configuration
    let config = chain_config(&args)?;
    info!(chain_id = config.chain_id, "Using chain configuration");

    // 3. Run every file
    let mut passed = 0usize;
    let mut failed = 0usize;
    for path in &args.files {
        let (ok, bad) = run_file(path, &config, args.filter.as_deref())
            .with_context(|| format!("Failed to run {}", path.display()))?;
        passed += ok;
        failed += bad;
    }

    info!(passed, failed, "Finished");
    if failed > 0 {
        bail!("{failed} of {} transaction tests failed", passed + failed);
    }
    Ok(())
}

fn chain_config(args: &Args) -> Result<ChainConfig> {
    if let Some(path) = &args.config {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&raw).context("Invalid chain configuration");
    }
    if let Some(fork) = &args.fork {
        return ChainConfig::for_fork(fork).with_context(|| format!("Unknown fork {fork}"));
    }
    ChainConfig::named(&args.network).with_context(|| format!("Unknown network {}", args.network))
}

/// Returns the number of passed and failed tests in one file.
fn run_file(path: &Path, config: &ChainConfig, filter: Option<&str>) -> Result<(usize, usize)> {
    let raw = std::fs::read_to_string(path).context("Failed to read fixture file")?;
    let mut fixtures = load_fixtures(&raw)?;
    if let Some(filter) = filter {
        fixtures.retain(|(name, _)| name.contains(filter));
    }

    let outcomes = run_all(&fixtures, config);
    let mut failed = 0;
    for outcome in &outcomes {
        if let Err(err) = &outcome.result {
            warn!(file = %path.display(), test = %outcome.name, "{err}");
            failed += 1;
        }
    }
    info!(file = %path.display(), total = outcomes.len(), failed, "Ran fixture file");
    Ok((outcomes.len() - failed, failed))
}

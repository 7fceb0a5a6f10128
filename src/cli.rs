//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use commons_sampler::api::{DEFAULT_API_URL, DEFAULT_MAX_ATTEMPTS};
use commons_sampler::harvest::DEFAULT_SEED;

/// Default output folder, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "wikimedia_broken_100";

/// Default pause after each image, in seconds.
pub const DEFAULT_SLEEP_SECS: f64 = 0.25;

/// Longest accepted pause after each image, in seconds.
pub const MAX_SLEEP_SECS: f64 = 3600.0;

/// Sample images per category from Wikimedia Commons.
///
/// Searches each category's query, orders the results with a seeded digest,
/// downloads up to N unique images per category into their own folder and
/// writes `manifest.csv` with source and licence fields.
#[derive(Parser, Debug, Clone)]
#[command(name = "commons-sampler")]
#[command(author, version, about)]
pub struct Args {
    /// Output folder (created if missing)
    #[arg(short = 'o', long = "out", default_value = DEFAULT_OUTPUT_DIR)]
    pub out: PathBuf,

    /// Images per category (1-500)
    #[arg(short = 'n', long, default_value_t = 10, value_parser = clap::value_parser!(u16).range(1..=500))]
    pub per_category: u16,

    /// Seed string for the deterministic ordering
    #[arg(long, default_value = DEFAULT_SEED)]
    pub seed: String,

    /// Seconds to sleep after each image (0-3600)
    #[arg(long, default_value_t = DEFAULT_SLEEP_SECS, value_parser = parse_sleep_secs)]
    pub sleep: f64,

    /// Categories file with `key = "query"` lines (defaults to the built-in table)
    #[arg(long, value_name = "FILE")]
    pub categories: Option<PathBuf>,

    /// MediaWiki API endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Contact (email or URL) appended to the User-Agent
    #[arg(long, value_name = "TEXT")]
    pub contact: Option<String>,

    /// Config file (defaults to $XDG_CONFIG_HOME/commons-sampler/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Attempts per API call before the run aborts (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_ATTEMPTS as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_retries: u8,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress output and non-error logs
    #[arg(short, long)]
    pub quiet: bool,
}

fn parse_sleep_secs(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("`{raw}` is not a number"))?;
    if !(0.0..=MAX_SLEEP_SECS).contains(&value) {
        return Err(format!("`{raw}` must be between 0 and {MAX_SLEEP_SECS} seconds"));
    }
    Ok(value)
}

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};
use commons_sampler::api::DEFAULT_API_TIMEOUT;
use commons_sampler::download::DOWNLOAD_TIMEOUT;
use commons_sampler::harvest::HarvestSettings;

use crate::app_config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Which flags were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) out: bool,
    pub(crate) per_category: bool,
    pub(crate) seed: bool,
    pub(crate) sleep: bool,
    pub(crate) api_url: bool,
    pub(crate) max_retries: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

/// Effective settings after merging flags, config file and defaults.
#[derive(Debug, Clone)]
pub(crate) struct RunSettings {
    pub(crate) out_dir: PathBuf,
    pub(crate) categories_file: Option<PathBuf>,
    pub(crate) api_url: String,
    pub(crate) contact: Option<String>,
    pub(crate) max_attempts: u32,
    pub(crate) api_timeout: Duration,
    pub(crate) download_timeout: Duration,
    pub(crate) harvest: HarvestSettings,
    pub(crate) verbose: u8,
    pub(crate) quiet: bool,
}

pub(crate) fn parse_cli_with_sources() -> (Args, CliValueSources) {
    let command = Args::command();
    let matches = command.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    let sources = CliValueSources {
        out: is_commandline_value(&matches, "out"),
        per_category: is_commandline_value(&matches, "per_category"),
        seed: is_commandline_value(&matches, "seed"),
        sleep: is_commandline_value(&matches, "sleep"),
        api_url: is_commandline_value(&matches, "api_url"),
        max_retries: is_commandline_value(&matches, "max_retries"),
        verbose: is_commandline_value(&matches, "verbose"),
        quiet: is_commandline_value(&matches, "quiet"),
    };
    (args, sources)
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Applies config-file values wherever the flag was left at its default.
pub(crate) fn resolve_run_settings(
    args: Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> RunSettings {
    let mut args = args;
    let mut api_timeout = DEFAULT_API_TIMEOUT;
    let mut download_timeout = DOWNLOAD_TIMEOUT;
    let mut harvest = HarvestSettings::default();

    if let Some(file_config) = file_config {
        if !cli_sources.out
            && let Some(output_dir) = &file_config.output_dir
        {
            args.out = output_dir.clone();
        }
        if !cli_sources.per_category
            && let Some(per_category) = file_config.per_category
        {
            args.per_category = per_category;
        }
        if !cli_sources.seed
            && let Some(seed) = &file_config.seed
        {
            args.seed = seed.clone();
        }
        if !cli_sources.sleep
            && let Some(sleep_secs) = file_config.sleep_secs
        {
            args.sleep = sleep_secs;
        }
        if args.categories.is_none()
            && let Some(categories_file) = &file_config.categories_file
        {
            args.categories = Some(categories_file.clone());
        }
        if !cli_sources.api_url
            && let Some(api_url) = &file_config.api_url
        {
            args.api_url = api_url.clone();
        }
        if args.contact.is_none()
            && let Some(contact) = &file_config.contact
        {
            args.contact = Some(contact.clone());
        }
        if !cli_sources.max_retries
            && let Some(max_retries) = file_config.max_retries
        {
            args.max_retries = max_retries;
        }
        if !cli_sources.verbose
            && !cli_sources.quiet
            && let Some(verbosity) = file_config.verbosity
        {
            apply_config_verbosity(&mut args, verbosity);
        }

        if let Some(limit) = file_config.search_limit {
            harvest.search_limit = limit;
        }
        if let Some(pool) = file_config.metadata_pool {
            harvest.metadata_pool = pool;
        }
        if let Some(batch) = file_config.metadata_batch_size {
            harvest.metadata_batch_size = batch;
        }
        if let Some(secs) = file_config.api_timeout_secs {
            api_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file_config.download_timeout_secs {
            download_timeout = Duration::from_secs(secs);
        }
    }

    harvest.per_category = usize::from(args.per_category);
    harvest.seed = args.seed;
    harvest.pace = Duration::from_secs_f64(args.sleep);
    harvest.show_progress = !args.quiet;

    RunSettings {
        out_dir: args.out,
        categories_file: args.categories,
        api_url: args.api_url,
        contact: args.contact,
        max_attempts: u32::from(args.max_retries),
        api_timeout,
        download_timeout,
        harvest,
        verbose: args.verbose,
        quiet: args.quiet,
    }
}

fn apply_config_verbosity(args: &mut Args, verbosity: VerbositySetting) {
    let (verbose, quiet) = match verbosity {
        VerbositySetting::Default => (0, false),
        VerbositySetting::Verbose => (1, false),
        VerbositySetting::Quiet => (0, true),
        VerbositySetting::Debug => (2, false),
    };
    args.verbose = verbose;
    args.quiet = quiet;
}

pub(crate) fn resolve_default_log_level(settings: &RunSettings) -> &'static str {
    if settings.quiet {
        "error"
    } else {
        match settings.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

pub(crate) fn should_force_cli_log_level(cli_sources: &CliValueSources) -> bool {
    cli_sources.verbose || cli_sources.quiet
}

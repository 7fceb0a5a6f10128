use anyhow::{Context, Result};
use commons_sampler::{
    ApiClient, Fetcher, Harvester, RetryPolicy, build_http_client, default_categories,
    load_categories_file,
};
use tracing::{debug, info};

use crate::app::{config_runtime, terminal};
use crate::app_config::load_file_config;

pub(crate) async fn run_sampler() -> Result<()> {
    let (args, cli_sources) = config_runtime::parse_cli_with_sources();

    let loaded_config = load_file_config(args.config.as_deref())?;
    let settings =
        config_runtime::resolve_run_settings(args, &cli_sources, loaded_config.config.as_ref());

    let default_level = config_runtime::resolve_default_log_level(&settings);
    let force_cli_log_level = config_runtime::should_force_cli_log_level(&cli_sources);
    terminal::init_tracing(default_level, force_cli_log_level);

    debug!(
        config_path = ?loaded_config.path,
        loaded_from_file = loaded_config.config.is_some(),
        ?settings,
        "configuration resolved"
    );

    let categories = match &settings.categories_file {
        Some(path) => load_categories_file(path)
            .with_context(|| format!("Failed to load categories from '{}'", path.display()))?,
        None => default_categories(),
    };

    let out_root = std::path::absolute(&settings.out_dir).with_context(|| {
        format!(
            "Failed to resolve output directory '{}'",
            settings.out_dir.display()
        )
    })?;

    info!(
        categories = categories.len(),
        per_category = settings.harvest.per_category,
        seed = %settings.harvest.seed,
        out = %out_root.display(),
        "Commons sampler starting"
    );

    let http = build_http_client(settings.contact.as_deref())?;
    let api = ApiClient::new(
        http.clone(),
        &settings.api_url,
        RetryPolicy::with_max_attempts(settings.max_attempts),
        settings.api_timeout,
    )
    .with_context(|| format!("Invalid API endpoint '{}'", settings.api_url))?;
    let fetcher = Fetcher::with_timeout(http, settings.download_timeout);

    let harvester = Harvester::new(api, fetcher, settings.harvest.clone());
    let report = harvester
        .run(&categories, &out_root)
        .await
        .context("Sampling run aborted")?;

    info!(
        downloaded = report.downloaded,
        skipped_existing = report.skipped_existing,
        failed = report.failed,
        empty_categories = report.empty_categories.len(),
        "Run complete"
    );
    for (category, selected) in &report.selected {
        debug!(%category, selected, "category summary");
    }

    if !settings.quiet {
        println!(
            "\nDone. Downloaded ~{} images into: {}",
            report.manifest_rows,
            report.out_root.display()
        );
        println!("Manifest: {}", report.manifest_path.display());
    }

    Ok(())
}

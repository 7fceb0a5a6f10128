//! CLI entry point for the commons sampler.

use anyhow::Result;

mod app;
mod app_config;
mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    app::runtime::run_sampler().await
}

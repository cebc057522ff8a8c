//! `license-fetchr` — resolve license identifiers and texts for a list of dependencies.
//!
//! # Flow
//! 1. Parse CLI arguments ([`cli`]) and initialize logging ([`logging`]).
//! 2. Load config ([`config::load_config`]), the dependency listing and the
//!    manual overrides ([`records`], [`source::manual`]). Any failure here
//!    aborts before a single request is made.
//! 3. Normalize identifiers to canonical names ([`normalize`]).
//! 4. Resolve each dependency through the [`chain`]: GitHub, then pkg.go.dev
//!    (`--try-pkg-go-dev`), then manual overrides, on a pool of workers ([`dispatch`]).
//! 5. Partition into resolved / missing and render a summary ([`report`]).
//! 6. Write both files ([`pipeline`]), partial ones too after a cancellation.
//!    Exit `1` if the run was cancelled or missing licenses had nowhere to go.

mod chain;
mod cli;
mod config;
mod context;
mod dispatch;
mod error;
mod license;
mod logging;
mod models;
mod normalize;
mod pipeline;
mod records;
mod report;
mod source;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use chain::ResolutionChain;
use cli::Cli;
use config::load_config;
use context::RunContext;
use normalize::Normalizer;
use pipeline::{finish, resolve_all, Destinations};
use records::{ensure_writable, read_identifiers};
use source::github::GithubResolver;
use source::manual::{ManualOverrides, ManualResolver};
use source::pkg_go_dev::PkgGoDevResolver;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose, cli.quiet);

    let cwd = std::env::current_dir()?;
    let mut config = load_config(&cwd, cli.config.as_deref())?;
    if let Some(workers) = cli.workers {
        config.dispatch.workers = workers;
    }

    let overrides = match &cli.json_manual_input {
        Some(path) => ManualOverrides::load(path)?,
        None => ManualOverrides::default(),
    };
    let identifiers = read_identifiers(&cli.modules)?;

    let dest = Destinations {
        resolved: cli.json_output.clone(),
        missing: cli.json_missing_output.clone(),
    };
    ensure_writable(&dest.resolved)?;
    if let Some(path) = &dest.missing {
        ensure_writable(path)?;
    }

    let client = source::http_client(&config.dispatch.user_agent, config.dispatch.timeout())?;
    if cli.github_token.is_none() {
        tracing::info!("no GitHub token given, API calls are unauthenticated and heavily rate limited");
    }

    let mut chain = ResolutionChain::new().with(Arc::new(GithubResolver::new(
        client.clone(),
        &config.forge,
        cli.github_token.clone(),
    )));
    if cli.try_pkg_go_dev {
        chain = chain.with(Arc::new(PkgGoDevResolver::new(client, &config.registry)?));
    }
    chain = chain.with(Arc::new(ManualResolver::new(Arc::new(overrides))));
    tracing::debug!(sources = chain.len(), "resolution chain ready");

    let ctx = RunContext::new();
    ctx.spawn_watchdog(config.dispatch.deadline());

    let normalizer = Normalizer::new(&config, cli.try_pkg_go_dev);
    let pb = if !cli.quiet {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let outcome = resolve_all(
        &identifiers,
        &normalizer,
        Arc::new(chain),
        config.dispatch.workers,
        &ctx,
        pb.as_ref(),
    )
    .await;

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }
    let outcome = outcome?;

    report::terminal::render(&outcome.partition, cli.verbose, cli.quiet);
    finish(&outcome, &dest)
}

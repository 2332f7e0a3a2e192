// ABOUTME: Vitals CLI - developer tool for inspecting the endpoint registry and provider data
// ABOUTME: Lists metrics, prints connect URLs and fetches normalized vitals with a supplied token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # List supported metrics and their endpoint limits
//! vitals-cli metrics
//!
//! # Print an authorize URL for a fresh connection link
//! vitals-cli authorize-url --patient 6f1c... --clinician 0a2b...
//!
//! # Fetch normalized vitals with an existing access token
//! vitals-cli fetch --metric heart_rate --start 2024-03-01 --end 2024-03-07 --access-token "$TOKEN"
//! ```

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use vitals_bridge::cache::memory::InMemoryCache;
use vitals_bridge::config::EngineConfig;
use vitals_bridge::engine::{VitalsEngine, VitalsOutcome};
use vitals_bridge::logging::{LogFormat, LoggingConfig};
use vitals_bridge::rate_limiting::RateLimiter;
use vitals_bridge::registry;
use vitals_bridge::storage::memory::InMemoryLinkRepository;
use vitals_bridge::storage::LinkRepository;
use vitals_core::models::{PlatformLink, Provider, TokenSet};

#[derive(Parser)]
#[command(
    name = "vitals-cli",
    about = "Wearable vitals bridge developer CLI",
    long_about = "Inspect the endpoint registry, generate provider connect URLs and fetch normalized vitals."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// List supported metrics
    Metrics,

    /// Issue a connection link and print the provider authorize URL
    AuthorizeUrl {
        /// Patient to connect
        #[arg(long)]
        patient: Uuid,

        /// Issuing clinician
        #[arg(long)]
        clinician: Uuid,
    },

    /// Fetch normalized vitals using an access token
    Fetch {
        /// Metric identifier (case-insensitive, e.g. `heart_rate`, `SpO2`)
        #[arg(long)]
        metric: String,

        /// First day, `YYYY-MM-DD` (defaults to seven days before end)
        #[arg(long)]
        start: Option<String>,

        /// Last day, `YYYY-MM-DD` (defaults to today)
        #[arg(long)]
        end: Option<String>,

        /// Provider access token
        #[arg(long, env = "VITALS_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,

        /// Print the full outcome as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: if cli.verbose { "debug" } else { "warn" }.to_owned(),
        format: LogFormat::Compact,
        ..LoggingConfig::from_env()
    };
    logging.init()?;

    let config = EngineConfig::from_env().context("loading configuration")?;
    info!("{}", config.summary());

    match cli.command {
        Command::Metrics => list_metrics(),
        Command::AuthorizeUrl { patient, clinician } => {
            authorize_url(config, patient, clinician).await?;
        }
        Command::Fetch {
            metric,
            start,
            end,
            access_token,
            json,
        } => {
            let outcome = fetch(config, &metric, start, end, access_token).await?;
            print_outcome(&outcome, json)?;
        }
    }

    Ok(())
}

fn build_engine(config: EngineConfig, links: Arc<InMemoryLinkRepository>) -> VitalsEngine {
    let cache = Arc::new(InMemoryCache::new(&config.cache));
    let limiter = Arc::new(RateLimiter::new(config.rate_limit.hourly_limit));
    VitalsEngine::new(config, links, cache, limiter)
}

fn list_metrics() {
    println!(
        "{:<18} {:<12} {:>9}  {}",
        "METRIC", "UNIT", "MAX DAYS", "RANGE ENDPOINT"
    );
    for descriptor in registry::all() {
        println!(
            "{:<18} {:<12} {:>9}  {}",
            descriptor.metric.as_str(),
            descriptor.unit,
            descriptor.max_range_days,
            descriptor.range("{start}", "{end}")
        );
    }
}

async fn authorize_url(config: EngineConfig, patient: Uuid, clinician: Uuid) -> Result<()> {
    let engine = build_engine(config, Arc::new(InMemoryLinkRepository::new()));
    let link = engine
        .connections()
        .create_connection_link(patient, clinician, Provider::Fitbit)
        .await?;
    let url = engine.connections().authorization_url(&link)?;

    println!("link id:    {}", link.id);
    println!("expires at: {}", link.expires_at);
    println!("{url}");
    Ok(())
}

async fn fetch(
    config: EngineConfig,
    metric: &str,
    start: Option<String>,
    end: Option<String>,
    access_token: String,
) -> Result<VitalsOutcome> {
    let lifetime = Duration::seconds(config.provider.default_token_lifetime_secs);
    let links = Arc::new(InMemoryLinkRepository::new());
    let patient_id = Uuid::new_v4();

    let mut link = PlatformLink::new(patient_id);
    let now = Utc::now();
    link.connect(
        Provider::Fitbit,
        TokenSet {
            access_token,
            refresh_token: String::new(),
            expires_at: now + lifetime,
        },
        now,
    );
    links.save_platform_link(&link).await?;

    let engine = build_engine(config, links);
    Ok(engine
        .try_get_vitals(patient_id, metric, start.as_deref(), end.as_deref())
        .await?)
}

fn print_outcome(outcome: &VitalsOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!(
        "range {} .. {}",
        outcome.effective_start.as_deref().unwrap_or("?"),
        outcome.effective_end.as_deref().unwrap_or("?")
    );
    for record in &outcome.records {
        println!("{:<12} {:>10.2} {}", record.timestamp, record.value, record.unit);
    }
    let summary = &outcome.summary;
    if let (Some(min), Some(max), Some(avg)) = (summary.min, summary.max, summary.avg) {
        println!(
            "{} records, min {min:.2} max {max:.2} avg {avg:.2} {}",
            summary.count, summary.unit
        );
    } else {
        println!("no records");
    }
    Ok(())
}

//! maclookup CLI
//!
//! Looks up MAC address manufacturers and inspects the persisted cache.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use maclookup_cache::{ExpiringMap, ExpiringMapConfig};
use maclookup_core::traits::SnapshotStore;
use maclookup_core::SystemClock;
use maclookup_lookup::{LookupConfig, MacPrefix, Manufacturer, ManufacturerLookup};
use maclookup_store::FileStore;

/// maclookup - MAC address manufacturer lookup
#[derive(Parser)]
#[command(name = "maclookup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the manufacturer of one or more MAC addresses
    Lookup {
        /// MAC addresses (only the first 8 characters are used)
        #[arg(required = true)]
        macs: Vec<String>,
        /// Restore and save the on-disk cache
        #[arg(short, long)]
        persist: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or remove the on-disk cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print the entries stored in a snapshot
    Show {
        /// Binding name (defaults to the configured one)
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Delete a snapshot
    Clear {
        /// Binding name (defaults to the configured one)
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "maclookup=debug,info"
    } else {
        "maclookup=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = LookupConfig::from_env().context("Invalid configuration")?;
    debug!(?config, "Loaded configuration");

    match cli.command {
        Commands::Lookup {
            macs,
            persist,
            json,
        } => cmd_lookup(config, &macs, persist, json).await,
        Commands::Cache { action } => match action {
            CacheAction::Show { name } => cmd_cache_show(&config, name).await,
            CacheAction::Clear { name } => cmd_cache_clear(&config, name).await,
        },
    }
}

/// Look up each MAC, then print the results
async fn cmd_lookup(config: LookupConfig, macs: &[String], persist: bool, json: bool) -> Result<()> {
    let lookup = ManufacturerLookup::builder()
        .config(config)
        .build()
        .context("Failed to set up lookup")?;

    let pb = if macs.len() > 1 && !json {
        let pb = ProgressBar::new(macs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut results = Vec::with_capacity(macs.len());
    for mac in macs {
        results.push(lookup.lookup_manufacturer(mac, persist).await);
        pb.inc(1);
    }
    pb.finish_and_clear();

    if persist {
        lookup
            .force_cache_save()
            .await
            .context("Failed to save cache")?;
    }

    let failures = results.iter().filter(|r| r.is_err()).count();

    if json {
        let rows: Vec<_> = macs
            .iter()
            .zip(&results)
            .map(|(mac, result)| match result {
                Ok(found) => serde_json::json!({
                    "mac": mac,
                    "found": found.is_some(),
                    "manufacturer": found,
                }),
                Err(e) => serde_json::json!({
                    "mac": mac,
                    "found": false,
                    "error": e.to_string(),
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (mac, result) in macs.iter().zip(&results) {
            match result {
                Ok(Some(m)) => print_manufacturer(mac, m),
                Ok(None) => println!("{} {}", mac.bold(), "not found".yellow()),
                Err(e) => println!("{} {} {}", mac.bold(), "error:".red().bold(), e),
            }
        }
    }

    if failures > 0 {
        bail!("{} of {} lookup(s) failed", failures, macs.len());
    }
    Ok(())
}

fn print_manufacturer(mac: &str, m: &Manufacturer) {
    println!("{} {}", mac.bold(), m.company.green());
    if !m.address.is_empty() {
        println!("   {} {}", "Address:".dimmed(), m.address);
    }
    if !m.country_code.is_empty() {
        println!("   {} {}", "Country:".dimmed(), m.country_code);
    }
}

/// Print a snapshot's entries
async fn cmd_cache_show(config: &LookupConfig, name: Option<String>) -> Result<()> {
    let name = name.unwrap_or_else(|| config.storage_name.clone());
    let store = FileStore::new(config.storage_dir());
    println!(
        "{} {}",
        "📂 Cache snapshot:".cyan().bold(),
        store.path_for(&name).display()
    );

    let cache: ExpiringMap<MacPrefix, Manufacturer> = ExpiringMap::with_parts(
        ExpiringMapConfig {
            ttl_seconds: config.ttl_seconds,
            flush_interval_seconds: 0,
        },
        Arc::new(SystemClock),
        Arc::new(store),
    );
    cache
        .bind_storage(&name)
        .await
        .context("Failed to read cache snapshot")?;

    let mut entries = cache.entries();
    if entries.is_empty() {
        println!("\n{}", "Cache is empty.".yellow());
        return Ok(());
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    println!("\n{} {} entr(ies):", "✅".green(), entries.len());
    for (prefix, m) in &entries {
        println!(
            "   {}  {}  {}",
            prefix.as_str().bold(),
            m.company,
            m.country_code.dimmed()
        );
    }
    Ok(())
}

/// Delete a snapshot
async fn cmd_cache_clear(config: &LookupConfig, name: Option<String>) -> Result<()> {
    let name = name.unwrap_or_else(|| config.storage_name.clone());
    let store = FileStore::new(config.storage_dir());
    let path = store.path_for(&name);

    store
        .remove(&name)
        .await
        .with_context(|| format!("Failed to remove {}", path.display()))?;

    println!("{} {}", "🗑️  Removed:".green(), path.display());
    Ok(())
}

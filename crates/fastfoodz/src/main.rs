//! `foodz` - CLI for fastfoodz
//!
//! This binary refreshes the local snapshot cache from the business search
//! API and prints what is cached.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use fastfoodz::cli::{
    Cli, Command, ConfigCommand, ListCommand, OutputFormat, PruneCommand, RefreshCommand,
    ShowCommand, SnapshotsCommand,
};
use fastfoodz::{
    init_logging, Business, CacheHandle, CacheOptions, Config, Storage, YelpClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    // Config commands run even when the configuration itself is broken.
    let command = match cli.command {
        Command::Config(cmd) => return handle_config(cli.config, cmd),
        command => command,
    };

    let config = Config::load_from(cli.config).context("failed to load configuration")?;

    match command {
        Command::Refresh(cmd) => handle_refresh(&config, &cmd).await,
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Show(cmd) => handle_show(&config, &cmd),
        Command::Snapshots(cmd) => handle_snapshots(&config, &cmd),
        Command::Prune(cmd) => handle_prune(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, cmd.json),
        Command::Config(_) => unreachable!("config commands are handled before loading"),
    }
}

async fn handle_refresh(
    config: &Config,
    cmd: &RefreshCommand,
) -> Result<()> {
    let latitude = cmd.lat.unwrap_or(config.search.latitude);
    let longitude = cmd.lon.unwrap_or(config.search.longitude);
    let radius = cmd.radius.unwrap_or(config.search.radius_meters);

    let client = YelpClient::new(&config.api).context("cannot create search client")?;
    let storage = open_storage(config)?;
    let cache = CacheHandle::spawn(storage, Arc::new(client), CacheOptions::from(config))?;

    let previous_id = cache.current().and_then(|snapshot| snapshot.id);
    let refreshed = cache.refresh_businesses(latitude, longitude, radius).await?;
    let current = cache
        .current()
        .filter(|snapshot| snapshot.id != previous_id);
    cache.shutdown().await?;

    if refreshed {
        match current {
            Some(snapshot) => println!(
                "Refreshed: {} businesses near ({:.6}, {:.6})",
                snapshot.len(),
                snapshot.region_center.latitude,
                snapshot.region_center.longitude
            ),
            None => println!("Refreshed: no businesses found"),
        }
        Ok(())
    } else {
        bail!("refresh failed (run with -v for details)")
    }
}

fn handle_list(config: &Config, cmd: &ListCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let Some(snapshot) = storage.latest_snapshot()? else {
        println!("No cached results. Run `foodz refresh` first.");
        return Ok(());
    };

    let limit = cmd.limit.unwrap_or(usize::MAX);
    let businesses: Vec<&Business> = snapshot.businesses.iter().take(limit).collect();

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&businesses)?),
        OutputFormat::Plain => {
            for business in businesses {
                println!("{}", business.display_name());
                let info = business.info_line();
                if !info.is_empty() {
                    println!("  {info}");
                }
            }
        }
        OutputFormat::Table => {
            println!(
                "{:<32} {:<24} {:>6} {:>6} {:>9}",
                "NAME", "CATEGORY", "PRICE", "RATING", "MILES"
            );
            for business in businesses {
                println!(
                    "{:<32} {:<24} {:>6} {:>6} {:>9}",
                    truncate(business.display_name(), 32),
                    truncate(&business.category_titles(), 24),
                    business.price.as_deref().unwrap_or("-"),
                    business
                        .rating
                        .map_or_else(|| "-".to_string(), |r| format!("{r:.1}")),
                    business
                        .distance_miles()
                        .map_or_else(|| "-".to_string(), |m| format!("{m:.2}")),
                );
            }
        }
    }
    Ok(())
}

fn handle_show(config: &Config, cmd: &ShowCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let Some(business) = storage.find_business(&cmd.business_id)? else {
        bail!("no cached business with id '{}'", cmd.business_id);
    };

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&business)?);
        return Ok(());
    }

    println!("{}", business.display_name());
    println!("{}", "=".repeat(business.display_name().chars().count()));
    let info = business.info_line();
    if !info.is_empty() {
        println!("{info}");
    }
    if let Some(rating) = business.rating {
        let reviews = business.review_count.unwrap_or(0);
        println!("Rating:       {rating:.1} ({reviews} reviews)");
    }
    let categories = business.category_titles();
    if !categories.is_empty() {
        println!("Categories:   {categories}");
    }
    if let Some(location) = &business.location {
        for (i, line) in location.display_address.iter().enumerate() {
            let label = if i == 0 { "Address:" } else { "" };
            println!("{label:<14}{line}");
        }
    }
    if let Some(phone) = business.display_phone.as_deref().filter(|p| !p.is_empty()) {
        println!("Phone:        {phone}");
    }
    if let Some(uri) = business.phone_uri() {
        println!("Call:         {uri}");
    }
    if let Some(url) = business.share_url() {
        println!("Share:        {url}");
    }
    if let Some(coordinates) = business.coordinates {
        println!(
            "Coordinates:  {:.6}, {:.6}",
            coordinates.latitude, coordinates.longitude
        );
    }
    if !business.transactions.is_empty() {
        println!("Transactions: {}", business.transactions.join(", "));
    }
    if business.is_closed == Some(true) {
        println!("(permanently closed)");
    }
    Ok(())
}

fn handle_snapshots(
    config: &Config,
    cmd: &SnapshotsCommand,
) -> Result<()> {
    let storage = open_storage(config)?;
    let summaries = storage.list_snapshots(cmd.limit)?;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No cached snapshots.");
        return Ok(());
    }

    println!("{:>6}  {:<25}  {:>22}  {:>10}", "ID", "REQUESTED", "CENTER", "BUSINESSES");
    for summary in summaries {
        println!(
            "{:>6}  {:<25}  {:>22}  {:>10}",
            summary.id,
            summary.request_date.format("%Y-%m-%d %H:%M:%S UTC"),
            format!(
                "{:.4}, {:.4}",
                summary.region_center.latitude, summary.region_center.longitude
            ),
            summary.business_count
        );
    }
    Ok(())
}

fn handle_prune(config: &Config, cmd: &PruneCommand) -> Result<()> {
    let storage = open_storage(config)?;

    if cmd.all {
        let removed = storage.clear()?;
        println!("Removed {removed} snapshots.");
        return Ok(());
    }

    let keep = cmd.keep.unwrap_or(config.storage.keep_snapshots).max(1);
    let mut removed = storage.prune_keep_recent(keep)?;
    if let Some(days) = cmd.older_than_days {
        removed += storage.prune_older_than(chrono::Duration::days(i64::from(days)))?;
    }
    println!("Removed {removed} snapshots.");
    Ok(())
}

fn handle_status(config: &Config, json: bool) -> Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "api_key_configured": config.has_api_key(),
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("foodz status");
    println!("------------");
    println!("Database:      {}", config.database_path().display());
    println!(
        "API key:       {}",
        if config.has_api_key() { "configured" } else { "missing" }
    );
    println!("Snapshots:     {}", stats.total_snapshots);
    println!("Businesses:    {}", stats.total_businesses);
    if let Some(newest) = stats.newest_snapshot {
        println!("Newest:        {}", newest.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(oldest) = stats.oldest_snapshot {
        println!("Oldest:        {}", oldest.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("Size:          {} bytes", stats.db_size_bytes);
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let mut shown =
                Config::load_from(config_path).context("failed to load configuration")?;
            if shown.has_api_key() {
                shown.api.api_key = Some("********".to_string());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&shown)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[API]");
                println!("  Base URL:           {}", shown.api.base_url);
                println!(
                    "  API key:            {}",
                    shown.api.api_key.as_deref().unwrap_or("(not set)")
                );
                println!("  Timeout (secs):     {}", shown.api.timeout_secs);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", shown.database_path().display());
                println!("  Prune threshold:    {}", shown.storage.prune_threshold);
                println!("  Keep snapshots:     {}", shown.storage.keep_snapshots);
                println!();
                println!("[Search]");
                println!(
                    "  Center:             {}, {}",
                    shown.search.latitude, shown.search.longitude
                );
                println!("  Radius (m):         {}", shown.search.radius_meters);
                println!("  Categories:         {}", shown.search.categories.join(", "));
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("cannot open cache at {}", path.display()))
}

/// Shorten `text` to at most `width` characters, marking the cut.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut shortened: String = text.chars().take(width.saturating_sub(1)).collect();
        shortened.push('…');
        shortened
    }
}

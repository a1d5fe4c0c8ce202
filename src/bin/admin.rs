//! CLI administration tool for safe-shortener.
//!
//! Inspects and removes short URLs, checks subjects against the block
//! lists, and performs database operations without requiring HTTP API
//! access.
//!
//! # Usage
//!
//! ```bash
//! # Show the validation state and clicks of a short URL
//! cargo run --bin admin -- link info a1B2c3D4e5F6
//!
//! # Delete a short URL (asks for confirmation unless -y)
//! cargo run --bin admin -- link delete a1B2c3D4e5F6 -y
//!
//! # Check a URL or IP against the block lists
//! cargo run --bin admin -- blocklist check https://phishing.example/ --kind url
//!
//! # Generate a value for ADMIN_TOKEN
//! cargo run --bin admin -- token generate
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required for `link`, `stats` and `db`)
//! - `BLOCK_URL_LIST`, `BLOCK_IP_LIST` (optional, for `blocklist`)

use safe_shortener::domain::checkers::{BlockListChecker, ListKind};
use safe_shortener::domain::repositories::{ClickRepository, ShortUrlRepository};
use safe_shortener::infrastructure::checkers::FileBlockListProvider;
use safe_shortener::infrastructure::persistence::{PgClickRepository, PgShortUrlRepository};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::Confirm;
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing safe-shortener.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect or delete short URLs
    Link {
        #[command(subcommand)]
        action: LinkAction,
    },

    /// Query the block lists
    Blocklist {
        #[command(subcommand)]
        action: BlocklistAction,
    },

    /// Admin token helpers
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Show statistics
    Stats,

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinkAction {
    /// Show validation state and click history
    Info { hash: String },

    /// Delete a short URL and its clicks
    Delete {
        hash: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum BlocklistAction {
    /// Check whether a subject is blocked
    Check {
        subject: String,

        /// List to check against
        #[arg(short, long, default_value = "url")]
        kind: ListKind,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Print a random token suitable for ADMIN_TOKEN
    Generate,
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Blocklist { action } => handle_blocklist_action(action).await,
        Commands::Token { action } => handle_token_action(action),
        Commands::Link { action } => handle_link_action(action, &connect().await?).await,
        Commands::Stats => handle_stats(&connect().await?).await,
        Commands::Db { action } => handle_db_action(action, &connect().await?).await,
    }
}

async fn connect() -> Result<PgPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")
}

/// Dispatches short URL commands.
async fn handle_link_action(action: LinkAction, pool: &PgPool) -> Result<()> {
    let pool = Arc::new(pool.clone());
    let short_urls = PgShortUrlRepository::new(pool.clone());

    match action {
        LinkAction::Info { hash } => {
            let clicks = PgClickRepository::new(pool);
            show_link(&short_urls, &clicks, &hash).await
        }
        LinkAction::Delete { hash, yes } => delete_link(&short_urls, &hash, yes).await,
    }
}

/// Prints the stored state of a short URL.
///
/// # Output Format
///
/// ```text
/// 🔗 a1B2c3D4e5F6
///
///   Target:        https://example.com/
///   Created:       2026-03-01 10:30
///   Redirect mode: 307
///   Validation:    OK
///   ...
/// ```
async fn show_link(
    short_urls: &PgShortUrlRepository,
    clicks: &PgClickRepository,
    hash: &str,
) -> Result<()> {
    let record = short_urls
        .find_by_hash(hash)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("Short URL not found")?;

    let outcome = record.outcome();
    let validation = if outcome.is_failure() {
        outcome.to_string().red()
    } else {
        outcome.to_string().green()
    };

    println!("{}", format!("🔗 {}", record.hash).bright_blue().bold());
    println!();
    println!("  Target:        {}", record.target.cyan());
    println!(
        "  Created:       {}",
        record.created_at.format("%Y-%m-%d %H:%M").to_string().bright_black()
    );
    println!("  Redirect mode: {}", record.redirect_mode.code());
    println!("  Validation:    {}", validation);
    println!("  Block state:   {}", record.block_state);
    println!("  Reachability:  {}", record.reachable_state);
    println!("  Safety:        {}", record.safety);
    if let Some(ip) = &record.properties.ip {
        println!("  Creator IP:    {}", ip);
    }
    if let Some(sponsor) = &record.properties.sponsor {
        println!("  Sponsor:       {}", sponsor);
    }

    let history = clicks
        .find_all_by_hash(hash)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    println!();
    println!(
        "  Clicks: {}",
        history.len().to_string().bright_white().bold()
    );
    for click in history.iter().rev().take(10) {
        println!(
            "    {}  {:<12} {}",
            click.created_at.format("%Y-%m-%d %H:%M:%S").to_string().bright_black(),
            click.properties.browser.as_deref().unwrap_or("-"),
            click.properties.platform.as_deref().unwrap_or("-")
        );
    }
    println!();

    Ok(())
}

/// Deletes a short URL with confirmation prompt (default: No).
async fn delete_link(short_urls: &PgShortUrlRepository, hash: &str, skip_confirm: bool) -> Result<()> {
    println!("{}", "🗑  Delete Short URL".bright_blue().bold());
    println!();

    let record = short_urls
        .find_by_hash(hash)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
        .context("Short URL not found")?;

    println!("  Hash:   {}", record.hash.cyan());
    println!("  Target: {}", record.target.bright_black());
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete this short URL and its clicks?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    short_urls
        .delete_by_hash(hash)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete short URL: {}", e))?;

    println!("{}", "✅ Short URL deleted".green().bold());
    println!();

    Ok(())
}

/// Checks a subject against the configured block list.
async fn handle_blocklist_action(action: BlocklistAction) -> Result<()> {
    let BlocklistAction::Check { subject, kind } = action;

    let url_list =
        std::env::var("BLOCK_URL_LIST").unwrap_or_else(|_| "resources/block_url.txt".to_string());
    let ip_list =
        std::env::var("BLOCK_IP_LIST").unwrap_or_else(|_| "resources/block_ip.txt".to_string());
    let checker = BlockListChecker::new(Arc::new(FileBlockListProvider::new(url_list, ip_list)));

    if checker.check(&subject, kind).await.is_blocked() {
        println!("{} {} ({} list)", "⛔ BLOCKED".red().bold(), subject, kind);
    } else {
        println!("{} {} ({} list)", "✅ OK".green().bold(), subject, kind);
    }

    Ok(())
}

/// Token helpers.
fn handle_token_action(action: TokenAction) -> Result<()> {
    match action {
        TokenAction::Generate => {
            println!("{}", generate_token()?.bright_yellow().bold());
        }
    }

    Ok(())
}

/// Displays system statistics.
async fn handle_stats(pool: &PgPool) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM short_urls")
        .fetch_one(pool)
        .await?;

    let failed_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM short_urls WHERE redirect_mode IN (400, 403)",
    )
    .fetch_one(pool)
    .await?;

    let clicks_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clicks")
        .fetch_one(pool)
        .await?;

    println!(
        "  Short URLs: {}",
        links_count.to_string().bright_green().bold()
    );
    println!(
        "  Rejected:   {}",
        failed_count.to_string().bright_red().bold()
    );
    println!(
        "  Clicks:     {}",
        clicks_count.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            println!("  PostgreSQL: {}", version.bright_white());
            println!();
        }
    }

    Ok(())
}

/// Generates a random 64-character hex token (256 bits).
fn generate_token() -> Result<String> {
    let mut buffer = [0u8; 32];
    getrandom::fill(&mut buffer).map_err(|e| anyhow::anyhow!("Failed to generate token: {}", e))?;
    Ok(hex::encode(buffer))
}

//! CLI administration tool for short-links.
//!
//! Creates and resolves short links directly against the PostgreSQL store,
//! without going through the HTTP service.
//!
//! # Usage
//!
//! ```bash
//! # Shorten a URL (same validation and code derivation as POST /short-link)
//! cargo run --bin admin -- shorten https://example.com/some/page
//!
//! # Look up the URL behind a code
//! cargo run --bin admin -- resolve 3f2a...
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_HOST`/`DB_PORT`/`DB_USER`/`DB_PASSWORD`/`DB_NAME` (required)

use short_links::application::services::LinkService;
use short_links::config::{self, mask_connection_string};
use short_links::infrastructure::persistence::PgLinkRepository;
use short_links::server::connect_database;
use short_links::utils::url_validator::check_url;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::process::ExitCode;
use std::sync::Arc;

/// CLI tool for managing short-links.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create (or look up) the short code for a URL
    Shorten {
        /// Absolute http(s) URL
        url: String,
    },

    /// Print the URL behind a short code
    Resolve {
        /// Short code
        code: String,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection and apply migrations
    Check,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL (or DB_* components) must be set")?;

    let pool = connect_database(database_url, config.db_max_connections).await?;

    match cli.command {
        Commands::Shorten { url } => shorten(&pool, &url).await,
        Commands::Resolve { code } => resolve(&pool, &code).await,
        Commands::Db { action } => handle_db_action(action, &pool, database_url).await,
    }
}

fn link_service(pool: &PgPool) -> LinkService {
    LinkService::new(Arc::new(PgLinkRepository::new(Arc::new(pool.clone()))))
}

/// Validates `url` and prints its short code, creating the record if needed.
async fn shorten(pool: &PgPool, url: &str) -> Result<ExitCode> {
    if let Err(e) = check_url(url) {
        eprintln!("{} {}", "Invalid URL:".red().bold(), e);
        return Ok(ExitCode::FAILURE);
    }

    let code = link_service(pool)
        .create_short_link(url)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create short link: {}", e))?;

    println!("  URL:  {}", url.cyan());
    println!("  Code: {}", code.bright_green().bold());

    Ok(ExitCode::SUCCESS)
}

/// Prints the original URL for `code`, or fails if it is unknown.
async fn resolve(pool: &PgPool, code: &str) -> Result<ExitCode> {
    let url = link_service(pool)
        .resolve_short_link(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    match url {
        Some(url) => {
            println!("{}", url);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("{} {}", "Short code not found:".yellow(), code);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool, database_url: &str) -> Result<ExitCode> {
    match action {
        DbAction::Check => {
            println!(
                "{} {}",
                "Checking database connection:".bright_blue(),
                mask_connection_string(database_url)
            );

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            let links_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM links")
                .fetch_one(pool)
                .await?;

            println!("{}", "Database connection OK".green().bold());
            println!(
                "  Links: {}",
                links_count.to_string().bright_white().bold()
            );
        }
    }

    Ok(ExitCode::SUCCESS)
}

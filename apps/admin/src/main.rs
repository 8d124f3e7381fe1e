//! # Snack Admin Maintenance Tool
//!
//! Operational entry point for the admin deployment.
//!
//! ## Usage
//! ```bash
//! # Apply pending migrations to the configured database
//! snack-admin migrate
//!
//! # Print the report figures as JSON
//! snack-admin report
//!
//! # Produce a hash for admin_users[].password_hash
//! snack-admin hash-password 's3cret'
//!
//! # Use another config file
//! snack-admin --config /etc/snack-admin.toml report
//! ```
//!
//! ## Startup Sequence
//! 1. Load configuration (defaults, file, `SNACK_*`)
//! 2. Initialize tracing
//! 3. Connect to database & run migrations (not for `hash-password`)
//! 4. Run the subcommand

use std::env;
use std::path::PathBuf;

use snack_admin::state::{hash_password, AppConfig, CONFIG_FILE};
use snack_admin::{init_tracing, AdminApp};
use snack_db::migrations::migration_status;
use tracing::info;

fn print_help() {
    println!("Snack Manager admin tool");
    println!();
    println!("Usage: snack-admin [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  migrate                  Apply pending database migrations");
    println!("  report                   Print investment, sales, profit and debts");
    println!("  hash-password <PASSWORD> Print an argon2 hash for the config file");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>    Config file (default: ./{})", CONFIG_FILE);
    println!("  -h, --help             Show this help message");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path = PathBuf::from(CONFIG_FILE);
    let mut rest = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => rest.push(other.to_string()),
        }
        i += 1;
    }

    let Some(command) = rest.first().cloned() else {
        print_help();
        return Ok(());
    };

    if command == "hash-password" {
        let password = rest.get(1).ok_or("hash-password needs a password argument")?;
        println!("{}", hash_password(password)?);
        return Ok(());
    }

    let config = AppConfig::load_from(&config_path)?;
    init_tracing(&config);

    match command.as_str() {
        "migrate" => {
            let app = AdminApp::start(config).await?;
            let (total, applied) = migration_status(app.db.inner().pool()).await?;
            info!(total, applied, "Migrations checked");
            println!("✓ {applied}/{total} migrations applied");
            app.shutdown().await;
        }
        "report" => {
            let app = AdminApp::start(config).await?;
            let reports = app.db.inner().reports().get_reports().await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
            app.shutdown().await;
        }
        other => {
            print_help();
            return Err(format!("unknown command: {other}").into());
        }
    }

    Ok(())
}

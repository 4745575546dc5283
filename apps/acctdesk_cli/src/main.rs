mod console;

use std::path::PathBuf;

use acctdesk_adapters::accounts::read_config_items;
use acctdesk_adapters::configuration;
use acctdesk_adapters::telemetry;
use acctdesk_core::entities::{AccountId, AccountRecord};
use chrono::Utc;
use clap::{Parser, Subcommand};
use console::Console;
use dialoguer::Confirm;
use tracing::error;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List managed accounts
    Accounts {
        /// Only show enabled, refreshable accounts that expire soon (server clock)
        #[arg(long, default_value = "false")]
        expiring: bool,
    },

    /// Delete one or more accounts
    Delete {
        /// Account ids
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip confirmation prompt
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },

    /// Disable one or more accounts
    Disable {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Enable one or more accounts
    Enable {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Replace the account configuration with the contents of a JSON file
    ApplyConfig {
        /// JSON array of account config items
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(short, long, default_value = "false")]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = match configuration::get_configuration() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return Err(anyhow::anyhow!("configuration loading failed"));
        }
    };

    let _guard = telemetry::init_subscriber(&settings)?;

    let cli = Cli::parse();
    let console = Console::new(settings)?;

    let result = run(&console, &cli.command).await;

    if console.session_expired() {
        println!(
            "Session expired. Log in again at {}.",
            console.history.current()
        );
    }

    if let Err(e) = &result {
        error!(error = %e, "command failed");
    }
    result
}

async fn run(console: &Console, command: &Commands) -> anyhow::Result<()> {
    let store = &console.store;

    match command {
        Commands::Accounts { expiring } => {
            store.load_accounts().await?;

            if *expiring {
                let window = console.settings.store.expiry_window();
                let now = console.settings.store.server_now(Utc::now())?;
                let ids = store.expiring_accounts(now, window);
                if ids.is_empty() {
                    println!("No accounts expire within {:?}.", window);
                } else {
                    println!("{} accounts expire within {:?}:", ids.len(), window);
                    for id in ids {
                        println!("  {}", id);
                    }
                }
                return Ok(());
            }

            let accounts = store.accounts();
            if accounts.is_empty() {
                println!("No accounts.");
            } else {
                for account in &accounts {
                    print_account(account);
                }
                let counts = store.counts();
                println!(
                    "{} accounts ({} enabled, {} disabled)",
                    counts.total, counts.enabled, counts.disabled
                );
            }
        }

        Commands::Delete { ids, yes } => {
            let ids = to_ids(ids);

            if !*yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete {} account(s)?", ids.len()))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            match ids.as_slice() {
                [id] => store.delete_account(id).await?,
                _ => store.bulk_delete(&ids).await?,
            }
            println!("Deleted {} account(s).", ids.len());
        }

        Commands::Disable { ids } => {
            let ids = to_ids(ids);
            match ids.as_slice() {
                [id] => store.disable_account(id).await?,
                _ => store.bulk_disable(&ids).await?,
            }
            println!("Disabled {} account(s).", ids.len());
        }

        Commands::Enable { ids } => {
            let ids = to_ids(ids);
            match ids.as_slice() {
                [id] => store.enable_account(id).await?,
                _ => store.bulk_enable(&ids).await?,
            }
            println!("Enabled {} account(s).", ids.len());
        }

        Commands::ApplyConfig { file, yes } => {
            let items = read_config_items(file)?;

            if !*yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Replace the account configuration with {} item(s)?",
                        items.len()
                    ))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            store.update_config(&items).await?;
            let counts = store.counts();
            println!(
                "Configuration applied. {} accounts ({} enabled, {} disabled)",
                counts.total, counts.enabled, counts.disabled
            );
        }
    }

    Ok(())
}

fn to_ids(ids: &[String]) -> Vec<AccountId> {
    ids.iter().map(|id| AccountId::new(id.as_str())).collect()
}

fn print_account(account: &AccountRecord) {
    println!(
        "  {} {}{}",
        if account.disabled { "-" } else { "*" },
        account.id,
        account
            .expires_at
            .as_deref()
            .map(|e| format!(" (expires {})", e))
            .unwrap_or_default(),
    );
}

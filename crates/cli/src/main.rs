//! ByteHub CLI - feed inspection and store maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Parse a saved feed document and print the products as YAML
//! bytehub-cli feed parse feed.json
//!
//! # Fetch the live feed (or another URL) and print the products
//! bytehub-cli feed fetch --url "https://example.blogspot.com/feeds/posts/default?alt=json"
//!
//! # Create the encrypted store and session tables
//! bytehub-cli store migrate
//!
//! # Inspect or delete a key in the encrypted store
//! bytehub-cli store get "3f0c...:cart"
//! bytehub-cli store remove "3f0c...:cart"
//! ```
//!
//! Store commands read the same `STOREFRONT_*` variables as the server.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bytehub-cli")]
#[command(author, version, about = "ByteHub storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the product feed
    Feed {
        #[command(subcommand)]
        action: FeedAction,
    },
    /// Maintain the encrypted visitor store
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum FeedAction {
    /// Parse a saved feed document
    Parse {
        /// Path to a feed JSON (or script-wrapped JSON) file
        file: PathBuf,
    },
    /// Fetch and parse the feed
    Fetch {
        /// Feed URL (default: `STOREFRONT_FEED_URL` or the built-in feed)
        #[arg(short, long)]
        url: Option<String>,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Create the `kv_store` and session tables
    Migrate,
    /// Print the decrypted value stored under a key
    Get {
        /// Fully-qualified key (`<visitor>:<name>` or `currencyRates`)
        key: String,
    },
    /// Delete a key
    Remove {
        /// Fully-qualified key
        key: String,
    },
    /// List stored keys
    Keys,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Feed { action } => match action {
            FeedAction::Parse { file } => commands::feed::parse(&file).await?,
            FeedAction::Fetch { url } => commands::feed::fetch(url).await?,
        },
        Commands::Store { action } => match action {
            StoreAction::Migrate => commands::store::migrate().await?,
            StoreAction::Get { key } => commands::store::get(&key).await?,
            StoreAction::Remove { key } => commands::store::remove(&key).await?,
            StoreAction::Keys => commands::store::keys().await?,
        },
    }
    Ok(())
}

use anyhow::Result;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use parimutuel_board::access::{evaluate_access, WalletState};
use parimutuel_board::config::Settings;
use parimutuel_board::state::{AccessLists, ListStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let path = std::env::var("BOARD_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let settings = Settings::load(&path)?;
    let wallet = WalletState::from_env();

    let store = match &settings.access.list_endpoint {
        Some(endpoint) => {
            println!("Fetching lists from {}...", endpoint);
            let store = ListStore::new();
            let start = Instant::now();
            store
                .spawn_fetch(reqwest::Client::new(), endpoint.clone(), CancellationToken::new())
                .await?;
            println!("Fetched in {}ms", start.elapsed().as_millis());
            store
        }
        None => ListStore::seeded(AccessLists::new(
            settings.access.whitelist.clone(),
            settings.access.blacklist.clone(),
        )),
    };

    let lists = store.snapshot();
    println!("Whitelist: {} wallets", lists.whitelist.len());
    println!("Blacklist: {} wallets", lists.blacklist.len());

    let verdict = evaluate_access(&wallet, settings.access.geo_blocked, &lists, &settings.env);

    println!("\nenv:     {}", settings.env);
    println!("wallet:  {}", wallet.public_key.as_deref().unwrap_or("(not connected)"));
    println!("blocked: {}", verdict.is_blocked);
    if let Some(modal) = verdict.modal {
        println!("modal:   {:?}", modal);
    }

    Ok(())
}

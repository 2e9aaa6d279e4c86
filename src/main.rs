use anyhow::{Context, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use parimutuel_board::access::{evaluate_access, AccessVerdict, WalletState};
use parimutuel_board::api::markets;
use parimutuel_board::board::assemble;
use parimutuel_board::commands;
use parimutuel_board::config::Settings;
use parimutuel_board::directory::StaticDirectory;
use parimutuel_board::events::Event;
use parimutuel_board::feeds::pyth::PythFeed;
use parimutuel_board::state::{AccessLists, ListStore, MarketRecord, PriceBoard};
use parimutuel_board::table::{render, Column, SortDirection, SortState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let path = std::env::var("BOARD_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    let settings = Settings::load(&path).with_context(|| format!("load config {}", path))?;

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.general.log_level)),
        )
        .init();

    let network = settings.network_config()?;
    info!(target: "app", env = %settings.env, network = %network.name, rpc = %settings.rpc_url(), "starting board");

    let token = CancellationToken::new();
    let client = reqwest::Client::new();

    // Access lists
    let lists = match &settings.access.list_endpoint {
        Some(endpoint) => {
            let store = ListStore::new();
            store.spawn_fetch(client.clone(), endpoint.clone(), token.clone());
            store
        }
        None => ListStore::seeded(AccessLists::new(
            settings.access.whitelist.clone(),
            settings.access.blacklist.clone(),
        )),
    };

    let wallet = WalletState::from_env();
    let mut selection = settings.view.selection.clone();
    let directory = StaticDirectory::new(settings.markets.clone());
    if directory.is_empty() {
        warn!(target: "app", "no [[markets]] configured, board will be empty");
    }
    let mut sort = initial_sort(&settings);

    // Create the event channel
    let (tx, mut rx) = mpsc::channel::<Event>(100);

    markets::spawn_poller(
        client.clone(),
        settings.feed.markets_url.clone(),
        Duration::from_secs(settings.feed.poll_interval_secs.max(1)),
        tx.clone(),
        token.clone(),
    );
    if settings.oracle.feeds.is_empty() {
        warn!(target: "app", "no [oracle.feeds] configured, prices will show as 0");
    } else {
        PythFeed::new(settings.oracle.ws_url.clone(), &settings.oracle.feeds)
            .spawn(tx.clone(), token.clone());
    }
    spawn_list_watcher(&lists, tx.clone(), token.clone());
    commands::spawn_stdin(tx.clone(), token.clone());
    spawn_shutdown(tx.clone());

    let mut live: Vec<MarketRecord> = Vec::new();
    let mut prices = PriceBoard::new();
    let mut last_verdict: Option<AccessVerdict> = None;

    // Main event loop
    while let Some(event) = rx.recv().await {
        let now_ms = chrono::Utc::now().timestamp_millis();
        match event {
            Event::OraclePrice { pair, price } => {
                if !prices.update(&pair, price) || pair != selection.selected_pair {
                    continue;
                }
            }
            Event::Markets(records) => live = records,
            Event::ListsChanged => {}
            Event::Sort(column) => {
                sort.toggle(column);
                info!(target: "app", sort = ?sort.active(), "sort changed");
            }
            Event::ToggleDuration(duration) => {
                selection.toggle_duration(duration);
                info!(target: "app", %duration, on = selection.includes(duration), "duration filter toggled");
            }
            Event::Pair(pair) => {
                info!(target: "app", %pair, "pair selected");
                selection.set_pair(pair);
            }
            Event::Shutdown => {
                info!(target: "app", "shutting down");
                token.cancel();
                break;
            }
        }

        let verdict = evaluate_access(
            &wallet,
            settings.access.geo_blocked,
            &lists.snapshot(),
            &settings.env,
        );
        if last_verdict != Some(verdict) {
            if let Some(modal) = verdict.modal {
                warn!(target: "app", ?modal, "board blocked");
            } else {
                info!(target: "app", "access granted");
            }
            last_verdict = Some(verdict);
        }
        if verdict.is_blocked {
            continue;
        }

        let rows = assemble(
            &live,
            prices.price(&selection.selected_pair),
            &selection,
            &network,
            &directory,
        );
        println!(
            "\n{} | {} | {}",
            selection.selected_pair,
            chrono::Utc::now().format("%H:%M:%S"),
            prices
                .price(&selection.selected_pair)
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "no price".to_string())
        );
        print!("{}", render(&rows, &sort, now_ms));
    }

    Ok(())
}

fn initial_sort(settings: &Settings) -> SortState {
    let column = match settings.view.sort_column.as_deref().map(str::parse::<Column>) {
        Some(Ok(column)) => column,
        Some(Err(e)) => {
            warn!(target: "app", "ignoring sort_column: {}", e);
            return SortState::default();
        }
        None => return SortState::default(),
    };
    let direction = settings
        .view
        .sort_direction
        .as_deref()
        .and_then(|d| d.parse::<SortDirection>().ok())
        .unwrap_or(SortDirection::Ascending);
    SortState::new(column, direction)
}

/// Forward access list changes into the event loop.
fn spawn_list_watcher(lists: &ListStore, tx: mpsc::Sender<Event>, token: CancellationToken) {
    let mut changes = lists.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => return,
                changed = changes.changed() => {
                    if changed.is_err() || tx.send(Event::ListsChanged).await.is_err() {
                        return;
                    }
                }
            }
        }
    });
}

fn spawn_shutdown(tx: mpsc::Sender<Event>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(Event::Shutdown).await;
        }
    });
}

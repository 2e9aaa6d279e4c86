use anyhow::{anyhow, Result};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::events::Event;
use crate::state::MarketRecord;

/// Fetch the live market records.
pub async fn fetch_markets(client: &reqwest::Client, url: &str) -> Result<Vec<MarketRecord>> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(anyhow!("market feed returned {}", response.status()));
    }

    let markets: Vec<MarketRecord> = response.json().await?;
    Ok(markets)
}

/// Spawns a task that polls the market feed and sends Markets events
pub fn spawn_poller(
    client: reqwest::Client,
    url: String,
    interval: Duration,
    tx: mpsc::Sender<Event>,
    token: CancellationToken,
) {
    tokio::spawn(async move {
        loop {
            match fetch_markets(&client, &url).await {
                Ok(markets) => {
                    debug!(target: "markets", count = markets.len(), "market snapshot");
                    if tx.send(Event::Markets(markets)).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!(target: "markets", "market fetch failed: {}", e);
                }
            }

            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    });
}

use futures_util::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::Event;

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// Message we send to subscribe
#[derive(serde::Serialize)]
struct SubscribeMsg {
    ids: Vec<String>,
    #[serde(rename = "type")]
    kind: &'static str,
}

// Hermes sends price updates with this shape
#[derive(serde::Deserialize, Debug)]
struct PriceUpdate {
    #[serde(rename = "type")]
    kind: String,
    price_feed: Option<PriceFeed>,
}

#[derive(serde::Deserialize, Debug)]
struct PriceFeed {
    id: String,
    price: PythPrice,
}

#[derive(serde::Deserialize, Debug)]
struct PythPrice {
    price: String,
    expo: i32,
}

/// Oracle price feed for a set of pairs.
pub struct PythFeed {
    ws_url: String,
    /// Feed id (lowercase, no 0x) -> pair symbol
    pairs: HashMap<String, String>,
}

impl PythFeed {
    /// `feeds` maps pair symbol to feed id, as in the `[oracle.feeds]` table.
    pub fn new(ws_url: String, feeds: &HashMap<String, String>) -> Self {
        let pairs = feeds
            .iter()
            .map(|(pair, id)| (normalize_id(id), pair.clone()))
            .collect();
        Self { ws_url, pairs }
    }

    /// Spawns a task that connects and sends OraclePrice events.
    ///
    /// Every failed or dropped session waits `RECONNECT_DELAY` before the
    /// next attempt. The task ends when `token` is cancelled or the event
    /// channel closes.
    pub fn spawn(self, tx: mpsc::Sender<Event>, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                info!(target: "oracle", "connecting to {}", self.ws_url);

                let connected = tokio::select! {
                    _ = token.cancelled() => return,
                    res = connect_async(self.ws_url.as_str()) => res,
                };
                match connected {
                    Ok((ws_stream, _)) => {
                        info!(target: "oracle", "connected");
                        if self.run_session(ws_stream, &tx, &token).await.is_break() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!(target: "oracle", "failed to connect: {}", e);
                    }
                }

                info!(target: "oracle", "reconnecting in {} seconds", RECONNECT_DELAY.as_secs());
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(RECONNECT_DELAY) => {}
                }
            }
        })
    }

    /// Subscribe and forward updates until the stream ends. Break means the
    /// feed should stop for good.
    async fn run_session(
        &self,
        ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
        tx: &mpsc::Sender<Event>,
        token: &CancellationToken,
    ) -> ControlFlow<()> {
        let (mut write, mut read) = ws_stream.split();

        let subscribe = SubscribeMsg {
            ids: self.pairs.keys().cloned().collect(),
            kind: "subscribe",
        };
        let msg = match serde_json::to_string(&subscribe) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(target: "oracle", "failed to encode subscribe: {}", e);
                return ControlFlow::Break(());
            }
        };
        if let Err(e) = write.send(tungstenite::Message::Text(msg)).await {
            warn!(target: "oracle", "failed to subscribe: {}", e);
            return ControlFlow::Continue(());
        }

        info!(target: "oracle", feeds = self.pairs.len(), "subscribed");

        loop {
            let msg = tokio::select! {
                _ = token.cancelled() => return ControlFlow::Break(()),
                msg = read.next() => msg,
            };
            match msg {
                Some(Ok(tungstenite::Message::Text(text))) => {
                    let Some((id, price)) = parse_update(text) else {
                        continue;
                    };
                    let Some(pair) = self.pairs.get(&id) else {
                        debug!(target: "oracle", id = %id, "update for unknown feed");
                        continue;
                    };
                    let event = Event::OraclePrice {
                        pair: pair.clone(),
                        price,
                    };
                    if tx.send(event).await.is_err() {
                        return ControlFlow::Break(());
                    }
                }
                Some(Err(e)) => {
                    warn!(target: "oracle", "stream error: {}", e);
                    return ControlFlow::Continue(());
                }
                None => return ControlFlow::Continue(()),
                _ => {}
            }
        }
    }
}

fn normalize_id(id: &str) -> String {
    id.trim().trim_start_matches("0x").to_ascii_lowercase()
}

/// Pull (feed id, price) out of a `price_update` frame.
fn parse_update(text: String) -> Option<(String, Decimal)> {
    let mut bytes = text.into_bytes();
    let update: PriceUpdate = simd_json::from_slice(&mut bytes).ok()?;
    if update.kind != "price_update" {
        return None;
    }
    let feed = update.price_feed?;
    let mantissa: i64 = feed.price.price.parse().ok()?;
    let price = scale_price(mantissa, feed.price.expo)?;
    Some((normalize_id(&feed.id), price))
}

/// price * 10^expo as a decimal. None if it does not fit.
pub fn scale_price(mantissa: i64, expo: i32) -> Option<Decimal> {
    if expo <= 0 {
        let scale = expo.unsigned_abs();
        if scale > 28 {
            return None;
        }
        Some(Decimal::new(mantissa, scale))
    } else {
        let factor = 10i64.checked_pow(expo as u32)?;
        Decimal::from(mantissa).checked_mul(Decimal::from(factor))
    }
}

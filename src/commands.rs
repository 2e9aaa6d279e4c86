use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::events::Event;
use crate::table::Column;

pub const HELP: &str = "commands: sort <column> | dur <1m|5m|1h|...> | pair <SYMBOL> | quit";

/// Turn one line of terminal input into a board event.
///
/// `sort <column>` stands in for a header click, `dur <duration>` toggles a
/// duration filter and `pair <symbol>` switches the viewed pair.
pub fn parse_command(line: &str) -> Result<Event, String> {
    let mut parts = line.split_whitespace();
    let cmd = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next();
    if parts.next().is_some() {
        return Err(format!("too many arguments: {}", line.trim()));
    }

    match (cmd.as_str(), arg) {
        ("sort" | "s", Some(col)) => {
            let column: Column = col.parse()?;
            if !column.is_sortable() {
                return Err(format!("column {} is not sortable", col));
            }
            Ok(Event::Sort(column))
        }
        ("dur" | "d", Some(dur)) => Ok(Event::ToggleDuration(dur.parse()?)),
        ("pair" | "p", Some(pair)) => Ok(Event::Pair(pair.to_ascii_uppercase())),
        ("quit" | "q" | "exit", None) => Ok(Event::Shutdown),
        ("", None) => Err("empty command".to_string()),
        _ => Err(format!("unknown command: {}", line.trim())),
    }
}

/// Reads commands from stdin until EOF or cancellation.
pub fn spawn_stdin(tx: mpsc::Sender<Event>, token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        info!(target: "input", "{}", HELP);
        loop {
            let line = tokio::select! {
                _ = token.cancelled() => return,
                line = lines.next_line() => line,
            };
            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => return,
                Err(e) => {
                    warn!(target: "input", "stdin read failed: {}", e);
                    return;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_command(&line) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                Err(e) => warn!(target: "input", "{}; {}", e, HELP),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MarketDuration;

    #[test]
    fn test_sort_command() {
        assert_eq!(parse_command("sort pool"), Ok(Event::Sort(Column::PoolSize)));
        assert_eq!(parse_command("  S payout "), Ok(Event::Sort(Column::ExpectedPayout)));
    }

    #[test]
    fn test_sort_rejects_price_columns() {
        assert!(parse_command("sort locked_price").is_err());
        assert!(parse_command("sort current_price").is_err());
        assert!(parse_command("sort nope").is_err());
    }

    #[test]
    fn test_duration_command() {
        assert_eq!(
            parse_command("dur 5m"),
            Ok(Event::ToggleDuration(MarketDuration::FIVE_MIN))
        );
        assert_eq!(
            parse_command("d 3600"),
            Ok(Event::ToggleDuration(MarketDuration::ONE_HOUR))
        );
        assert!(parse_command("dur soon").is_err());
    }

    #[test]
    fn test_pair_command() {
        assert_eq!(parse_command("pair eth-usd"), Ok(Event::Pair("ETH-USD".to_string())));
        assert!(parse_command("pair").is_err());
    }

    #[test]
    fn test_quit_and_garbage() {
        assert_eq!(parse_command("q"), Ok(Event::Shutdown));
        assert_eq!(parse_command("quit"), Ok(Event::Shutdown));
        assert!(parse_command("quit now").is_err());
        assert!(parse_command("sort pool extra").is_err());
        assert!(parse_command("").is_err());
        assert!(parse_command("launch").is_err());
    }
}

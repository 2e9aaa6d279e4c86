use rust_decimal::Decimal;

use crate::state::{MarketDuration, MarketRecord};
use crate::table::Column;

/// Everything the board loop reacts to.
#[derive(Debug, PartialEq)]
pub enum Event {
    // Oracle sent a new price for a pair
    OraclePrice { pair: String, price: Decimal },

    // Fresh snapshot of the live market feed
    Markets(Vec<MarketRecord>),

    // Access lists changed (fetch resolved)
    ListsChanged,

    // Header click on a column
    Sort(Column),

    // Duration filter toggled on or off
    ToggleDuration(MarketDuration),

    // Viewed pair changed
    Pair(String),

    // Ctrl+C, kill signal or `quit`
    Shutdown,
}

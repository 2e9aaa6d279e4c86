use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::config::NetworkConfig;
use crate::directory::MarketDirectory;
use crate::state::{MarketRecord, UserSelection};

/// Build the rows to display from the live feed.
///
/// Keeps live order. Only markets that are canonical for the selected pair
/// and one of the selected durations survive, and each kept row carries the
/// latest oracle price (0 when the oracle has nothing yet). `live` is not
/// modified.
pub fn assemble(
    live: &[MarketRecord],
    oracle_price: Option<Decimal>,
    selection: &UserSelection,
    network: &NetworkConfig,
    directory: &dyn MarketDirectory,
) -> Vec<MarketRecord> {
    let canonical: HashSet<String> = directory
        .market_pubkeys(network, &selection.selected_pair)
        .into_iter()
        .filter(|m| selection.includes(m.duration))
        .map(|m| m.pubkey)
        .collect();

    let price = oracle_price.unwrap_or(Decimal::ZERO);

    live.iter()
        .filter(|r| canonical.contains(&r.key.market_pubkey))
        .map(|r| {
            let mut row = r.clone();
            row.current_price = price;
            row.settled_price = price;
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::CanonicalMarket;
    use crate::state::{test_record, MarketDuration};
    use rust_decimal_macros::dec;

    struct FixedDirectory(Vec<CanonicalMarket>);

    impl MarketDirectory for FixedDirectory {
        fn market_pubkeys(&self, _network: &NetworkConfig, _pair: &str) -> Vec<CanonicalMarket> {
            self.0.clone()
        }
    }

    fn canonical(pubkey: &str, duration: MarketDuration) -> CanonicalMarket {
        CanonicalMarket {
            pubkey: pubkey.to_string(),
            duration,
        }
    }

    #[test]
    fn test_keeps_only_canonical_selected_durations() {
        let live = vec![
            test_record("X", MarketDuration::ONE_HOUR),
            test_record("Y", MarketDuration::FOUR_HOURS),
        ];
        let dir = FixedDirectory(vec![
            canonical("X", MarketDuration::ONE_HOUR),
            canonical("Y", MarketDuration::FOUR_HOURS),
        ]);
        let sel = UserSelection::new("BTC-USD", [MarketDuration::ONE_HOUR]);

        let rows = assemble(&live, Some(dec!(101)), &sel, &NetworkConfig::dev(), &dir);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].key.market_pubkey, "X");
    }

    #[test]
    fn test_overwrites_prices_without_touching_input() {
        let live = vec![test_record("X", MarketDuration::ONE_HOUR)];
        let dir = FixedDirectory(vec![canonical("X", MarketDuration::ONE_HOUR)]);
        let sel = UserSelection::new("BTC-USD", [MarketDuration::ONE_HOUR]);

        let rows = assemble(&live, Some(dec!(65000.25)), &sel, &NetworkConfig::dev(), &dir);

        assert_eq!(rows[0].current_price, dec!(65000.25));
        assert_eq!(rows[0].settled_price, dec!(65000.25));
        assert_eq!(live[0].settled_price, Decimal::ZERO);
    }

    #[test]
    fn test_missing_oracle_price_is_zero() {
        let live = vec![test_record("X", MarketDuration::ONE_HOUR)];
        let dir = FixedDirectory(vec![canonical("X", MarketDuration::ONE_HOUR)]);
        let sel = UserSelection::new("BTC-USD", [MarketDuration::ONE_HOUR]);

        let rows = assemble(&live, None, &sel, &NetworkConfig::dev(), &dir);
        assert_eq!(rows[0].settled_price, Decimal::ZERO);
    }

    #[test]
    fn test_never_fabricates_rows() {
        // Canonical markets missing from the live feed produce nothing
        let live = vec![
            test_record("A", MarketDuration::ONE_MIN),
            test_record("B", MarketDuration::ONE_MIN),
            test_record("C", MarketDuration::ONE_MIN),
        ];
        let dir = FixedDirectory(vec![
            canonical("C", MarketDuration::ONE_MIN),
            canonical("A", MarketDuration::ONE_MIN),
            canonical("Q", MarketDuration::ONE_MIN),
        ]);
        let sel = UserSelection::new("BTC-USD", [MarketDuration::ONE_MIN]);

        let rows = assemble(&live, Some(dec!(1)), &sel, &NetworkConfig::dev(), &dir);
        let keys: Vec<&str> = rows.iter().map(|r| r.key.market_pubkey.as_str()).collect();

        // Live order, not directory order
        assert_eq!(keys, vec!["A", "C"]);
        assert!(rows.iter().all(|r| r.settled_price == dec!(1)));
    }

    #[test]
    fn test_empty_selection_yields_nothing() {
        let live = vec![test_record("X", MarketDuration::ONE_HOUR)];
        let dir = FixedDirectory(vec![canonical("X", MarketDuration::ONE_HOUR)]);
        let sel = UserSelection::new("BTC-USD", Vec::<MarketDuration>::new());

        assert!(assemble(&live, Some(dec!(1)), &sel, &NetworkConfig::dev(), &dir).is_empty());
    }
}

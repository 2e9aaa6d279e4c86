use rust_decimal::Decimal;
use std::collections::HashMap;

/// Latest oracle price per pair symbol.
#[derive(Debug, Clone, Default)]
pub struct PriceBoard {
    prices: HashMap<String, Decimal>,
}

impl PriceBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tick. Returns true if the price changed.
    pub fn update(&mut self, pair: &str, price: Decimal) -> bool {
        match self.prices.insert(pair.to_string(), price) {
            Some(prev) => prev != price,
            None => true,
        }
    }

    pub fn price(&self, pair: &str) -> Option<Decimal> {
        self.prices.get(pair).copied()
    }
}

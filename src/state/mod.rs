mod lists;
mod market;
mod prices;
mod selection;

pub use lists::{AccessLists, ListStore};
pub use market::{MarketDuration, MarketKey, MarketRecord, Position};
pub use prices::PriceBoard;
pub use selection::UserSelection;

#[cfg(test)]
pub(crate) use market::tests::record as test_record;

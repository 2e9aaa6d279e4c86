use super::MarketDuration;
use serde::Deserialize;
use std::collections::BTreeSet;

/// What the viewer chose to look at: one pair and any number of durations.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserSelection {
    #[serde(rename = "pair")]
    pub selected_pair: String,
    #[serde(rename = "durations")]
    pub selected_durations: BTreeSet<MarketDuration>,
}

impl UserSelection {
    pub fn new(pair: impl Into<String>, durations: impl IntoIterator<Item = MarketDuration>) -> Self {
        Self {
            selected_pair: pair.into(),
            selected_durations: durations.into_iter().collect(),
        }
    }

    pub fn includes(&self, duration: MarketDuration) -> bool {
        self.selected_durations.contains(&duration)
    }

    /// Flip one duration on or off.
    pub fn toggle_duration(&mut self, duration: MarketDuration) {
        if !self.selected_durations.remove(&duration) {
            self.selected_durations.insert(duration);
        }
    }

    pub fn set_pair(&mut self, pair: impl Into<String>) {
        self.selected_pair = pair.into();
    }
}

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Market window length in seconds (60 = 1m, 3600 = 1h, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct MarketDuration(pub u64);

impl MarketDuration {
    pub const ONE_MIN: Self = Self(60);
    pub const FIVE_MIN: Self = Self(300);
    pub const FIFTEEN_MIN: Self = Self(900);
    pub const ONE_HOUR: Self = Self(3600);
    pub const FOUR_HOURS: Self = Self(14_400);
    pub const ONE_DAY: Self = Self(86_400);
}

impl FromStr for MarketDuration {
    type Err = String;

    /// Accepts plain seconds ("300") or a unit suffix ("5m", "1h", "1d").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        let (digits, unit) = match s.char_indices().last() {
            Some((i, c)) if c.is_ascii_alphabetic() => (&s[..i], c),
            _ => (s.as_str(), 's'),
        };
        let value: u64 = digits
            .parse()
            .map_err(|_| format!("bad duration: {}", s))?;
        let multiplier = match unit {
            's' => 1,
            'm' => 60,
            'h' => 3600,
            'd' => 86_400,
            other => return Err(format!("bad duration unit: {}", other)),
        };
        match value.checked_mul(multiplier) {
            Some(secs) if secs > 0 => Ok(Self(secs)),
            _ => Err(format!("bad duration: {}", s)),
        }
    }
}

impl fmt::Display for MarketDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0;
        if secs >= 86_400 && secs % 86_400 == 0 {
            write!(f, "{}d", secs / 86_400)
        } else if secs >= 3600 && secs % 3600 == 0 {
            write!(f, "{}h", secs / 3600)
        } else if secs >= 60 && secs % 60 == 0 {
            write!(f, "{}m", secs / 60)
        } else {
            write!(f, "{}s", secs)
        }
    }
}

/// On-chain identity of a market: the market account and its pool account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketKey {
    pub market_pubkey: String,
    pub pool_pubkey: String,
}

/// Viewer's stake on each side of a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub long: Decimal,
    #[serde(default)]
    pub short: Decimal,
}

impl Position {
    pub fn total(&self) -> Decimal {
        self.long.saturating_add(self.short)
    }

    pub fn is_empty(&self) -> bool {
        self.long == Decimal::ZERO && self.short == Decimal::ZERO
    }
}

/// One parimutuel market as delivered by the live feed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MarketRecord {
    pub key: MarketKey,
    /// Trading pair, e.g. "BTC-USD"
    pub pair: String,
    pub duration: MarketDuration,
    /// Window end in milliseconds
    pub end_ms: i64,
    /// Price locked at window start; None until the pool locks
    #[serde(default)]
    pub locked_price: Option<Decimal>,
    #[serde(default)]
    pub current_price: Decimal,
    /// Price the expected payout is computed against
    #[serde(default)]
    pub settled_price: Decimal,
    #[serde(default)]
    pub pool_long: Decimal,
    #[serde(default)]
    pub pool_short: Decimal,
    #[serde(default)]
    pub position: Option<Position>,
}

impl MarketRecord {
    pub fn pool_size(&self) -> Decimal {
        self.pool_long.saturating_add(self.pool_short)
    }

    pub fn position_size(&self) -> Decimal {
        self.position.as_ref().map(Position::total).unwrap_or_default()
    }

    /// Seconds until the window ends. Returns 0 once it has ended.
    pub fn time_remaining_secs(&self, now_ms: i64) -> i64 {
        (self.end_ms.saturating_sub(now_ms) / 1000).max(0)
    }

    /// Payout the viewer collects if the market settled at `settled_price`.
    ///
    /// Long wins above the locked price, short wins below. A flat close or an
    /// unlocked pool refunds the stake. The winning side splits the whole pool
    /// pro rata. Pools too large for exact multiplication are divided first;
    /// a result that still does not fit saturates at `Decimal::MAX`.
    pub fn expected_payout(&self) -> Decimal {
        let position = match &self.position {
            Some(p) if !p.is_empty() => p,
            _ => return Decimal::ZERO,
        };
        let locked = match self.locked_price {
            Some(price) => price,
            None => return position.total(),
        };

        let (stake, side_pool) = if self.settled_price > locked {
            (position.long, self.pool_long)
        } else if self.settled_price < locked {
            (position.short, self.pool_short)
        } else {
            return position.total();
        };

        if side_pool == Decimal::ZERO {
            return Decimal::ZERO;
        }
        let pool = self.pool_size();
        stake
            .checked_mul(pool)
            .and_then(|v| v.checked_div(side_pool))
            .or_else(|| stake.checked_div(side_pool)?.checked_mul(pool))
            .unwrap_or(Decimal::MAX)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn record(pubkey: &str, duration: MarketDuration) -> MarketRecord {
        MarketRecord {
            key: MarketKey {
                market_pubkey: pubkey.to_string(),
                pool_pubkey: format!("{}-pool", pubkey),
            },
            pair: "BTC-USD".to_string(),
            duration,
            end_ms: 1_000_000,
            locked_price: Some(dec!(100)),
            current_price: Decimal::ZERO,
            settled_price: Decimal::ZERO,
            pool_long: dec!(300),
            pool_short: dec!(100),
            position: None,
        }
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(MarketDuration::ONE_MIN.to_string(), "1m");
        assert_eq!(MarketDuration::FIFTEEN_MIN.to_string(), "15m");
        assert_eq!(MarketDuration::FOUR_HOURS.to_string(), "4h");
        assert_eq!(MarketDuration::ONE_DAY.to_string(), "1d");
        assert_eq!(MarketDuration(45).to_string(), "45s");
    }

    #[test]
    fn test_time_remaining_clamps() {
        let r = record("X", MarketDuration::ONE_HOUR);
        assert_eq!(r.time_remaining_secs(940_000), 60);
        assert_eq!(r.time_remaining_secs(2_000_000), 0);
    }

    #[test]
    fn test_payout_long_wins() {
        let mut r = record("X", MarketDuration::ONE_HOUR);
        r.position = Some(Position { long: dec!(30), short: dec!(10) });
        r.settled_price = dec!(101);

        // 30 of a 300 long pool, total pool 400
        assert_eq!(r.expected_payout(), dec!(40));
    }

    #[test]
    fn test_payout_short_wins() {
        let mut r = record("X", MarketDuration::ONE_HOUR);
        r.position = Some(Position { long: dec!(30), short: dec!(10) });
        r.settled_price = dec!(99);

        // 10 of a 100 short pool, total pool 400
        assert_eq!(r.expected_payout(), dec!(40));
    }

    #[test]
    fn test_payout_flat_or_unlocked_refunds() {
        let mut r = record("X", MarketDuration::ONE_HOUR);
        r.position = Some(Position { long: dec!(5), short: dec!(7) });
        r.settled_price = dec!(100);
        assert_eq!(r.expected_payout(), dec!(12));

        r.locked_price = None;
        r.settled_price = dec!(150);
        assert_eq!(r.expected_payout(), dec!(12));
    }

    #[test]
    fn test_payout_large_pools_do_not_overflow() {
        let big = Decimal::from(1_000_000_000_000_000i64);
        let mut r = record("X", MarketDuration::ONE_HOUR);
        r.pool_long = big;
        r.pool_short = big;
        r.position = Some(Position { long: big, short: Decimal::ZERO });
        r.settled_price = dec!(150);

        // stake * pool does not fit in a Decimal
        assert!(big.checked_mul(r.pool_size()).is_none());
        assert_eq!(r.expected_payout(), big * Decimal::from(2));
    }

    #[test]
    fn test_payout_saturates_when_result_cannot_fit() {
        let mut r = record("X", MarketDuration::ONE_HOUR);
        r.pool_long = dec!(0.000001);
        r.pool_short = Decimal::MAX;
        r.position = Some(Position { long: Decimal::MAX, short: Decimal::ZERO });
        r.settled_price = dec!(150);

        assert_eq!(r.pool_size(), Decimal::MAX);
        assert_eq!(r.expected_payout(), Decimal::MAX);
    }

    #[test]
    fn test_time_remaining_extreme_end() {
        let mut r = record("X", MarketDuration::ONE_HOUR);
        r.end_ms = i64::MIN;
        assert_eq!(r.time_remaining_secs(i64::MAX), 0);
        r.end_ms = i64::MAX;
        assert_eq!(r.time_remaining_secs(i64::MIN), i64::MAX / 1000);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!("300".parse::<MarketDuration>().unwrap(), MarketDuration::FIVE_MIN);
        assert_eq!("1h".parse::<MarketDuration>().unwrap(), MarketDuration::ONE_HOUR);
        assert_eq!("4H".parse::<MarketDuration>().unwrap(), MarketDuration::FOUR_HOURS);
        assert_eq!("1d".parse::<MarketDuration>().unwrap(), MarketDuration::ONE_DAY);
        assert!("0m".parse::<MarketDuration>().is_err());
        assert!("5x".parse::<MarketDuration>().is_err());
        assert!("".parse::<MarketDuration>().is_err());
    }

    #[test]
    fn test_payout_without_position() {
        let mut r = record("X", MarketDuration::ONE_HOUR);
        r.settled_price = dec!(150);
        assert_eq!(r.expected_payout(), Decimal::ZERO);
        assert_eq!(r.position_size(), Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_feed_record() {
        let json = r#"{
            "key": {"market_pubkey": "Mkt1", "pool_pubkey": "Pool1"},
            "pair": "SOL-USD",
            "duration": 300,
            "end_ms": 1700000000000,
            "locked_price": "21.5",
            "pool_long": 10,
            "pool_short": "2.5"
        }"#;
        let r: MarketRecord = serde_json::from_str(json).unwrap();
        assert_eq!(r.duration, MarketDuration::FIVE_MIN);
        assert_eq!(r.locked_price, Some(dec!(21.5)));
        assert_eq!(r.pool_size(), dec!(12.5));
        assert!(r.position.is_none());
    }
}

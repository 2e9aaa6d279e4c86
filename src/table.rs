use std::cmp::Ordering;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::state::MarketRecord;

/// Board columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Market,
    Time,
    PoolSize,
    MyPosition,
    LockedPrice,
    CurrentPrice,
    ExpectedPayout,
}

impl Column {
    pub fn spec(&self) -> &'static ColumnSpec {
        &COLUMNS[*self as usize]
    }

    pub fn is_sortable(&self) -> bool {
        self.spec().compare.is_some()
    }
}

impl FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "id" => Ok(Column::Id),
            "market" => Ok(Column::Market),
            "time" => Ok(Column::Time),
            "pool_size" | "pool" => Ok(Column::PoolSize),
            "my_position" | "position" => Ok(Column::MyPosition),
            "locked_price" => Ok(Column::LockedPrice),
            "current_price" => Ok(Column::CurrentPrice),
            "expected_payout" | "payout" => Ok(Column::ExpectedPayout),
            other => Err(format!("unknown column: {}", other)),
        }
    }
}

type Formatter = fn(&MarketRecord, i64) -> String;
type Comparator = fn(&MarketRecord, &MarketRecord) -> Ordering;

/// How one column is shown and ordered. `compare` is None for columns that
/// cannot be sorted.
pub struct ColumnSpec {
    pub column: Column,
    pub header: &'static str,
    pub width: usize,
    pub format: Formatter,
    pub compare: Option<Comparator>,
}

pub static COLUMNS: [ColumnSpec; 8] = [
    ColumnSpec {
        column: Column::Id,
        header: "ID",
        width: 13,
        format: fmt_id,
        compare: Some(cmp_id),
    },
    ColumnSpec {
        column: Column::Market,
        header: "Market",
        width: 12,
        format: fmt_market,
        compare: Some(cmp_market),
    },
    ColumnSpec {
        column: Column::Time,
        header: "Time",
        width: 10,
        format: fmt_time,
        compare: Some(cmp_time),
    },
    ColumnSpec {
        column: Column::PoolSize,
        header: "Pool Size",
        width: 12,
        format: fmt_pool,
        compare: Some(cmp_pool),
    },
    ColumnSpec {
        column: Column::MyPosition,
        header: "My Position",
        width: 20,
        format: fmt_position,
        compare: Some(cmp_position),
    },
    ColumnSpec {
        column: Column::LockedPrice,
        header: "Locked Price",
        width: 14,
        format: fmt_locked,
        compare: None,
    },
    ColumnSpec {
        column: Column::CurrentPrice,
        header: "Current Price",
        width: 14,
        format: fmt_current,
        compare: None,
    },
    ColumnSpec {
        column: Column::ExpectedPayout,
        header: "Expected Payout",
        width: 16,
        format: fmt_payout,
        compare: Some(cmp_payout),
    },
];

/// "F1v6trCq...Di14Y" style short form: first and last `chars` characters.
pub fn shorten_address(address: &str, chars: usize) -> String {
    let len = address.chars().count();
    if len <= chars * 2 + 3 {
        return address.to_string();
    }
    let head: String = address.chars().take(chars).collect();
    let tail: String = address.chars().skip(len - chars).collect();
    format!("{}...{}", head, tail)
}

fn format_remaining(secs: i64) -> String {
    if secs <= 0 {
        return "ended".to_string();
    }
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}

// The ID column is the pool account; filtering uses the market account.
fn fmt_id(r: &MarketRecord, _now_ms: i64) -> String {
    shorten_address(&r.key.pool_pubkey, 4)
}

fn fmt_market(r: &MarketRecord, _now_ms: i64) -> String {
    format!("{} {}", r.pair, r.duration)
}

fn fmt_time(r: &MarketRecord, now_ms: i64) -> String {
    format_remaining(r.time_remaining_secs(now_ms))
}

fn fmt_pool(r: &MarketRecord, _now_ms: i64) -> String {
    format!("{:.2}", r.pool_size())
}

fn fmt_position(r: &MarketRecord, _now_ms: i64) -> String {
    match &r.position {
        Some(p) if !p.is_empty() => format!("L {:.2} / S {:.2}", p.long, p.short),
        _ => "-".to_string(),
    }
}

fn fmt_locked(r: &MarketRecord, _now_ms: i64) -> String {
    match r.locked_price {
        Some(price) => format!("{:.2}", price),
        None => "-".to_string(),
    }
}

fn fmt_current(r: &MarketRecord, _now_ms: i64) -> String {
    format!("{:.2}", r.current_price)
}

fn fmt_payout(r: &MarketRecord, _now_ms: i64) -> String {
    if r.position_size().is_zero() {
        return "-".to_string();
    }
    format!("{:.2}", r.expected_payout())
}

fn cmp_id(a: &MarketRecord, b: &MarketRecord) -> Ordering {
    a.key.pool_pubkey.cmp(&b.key.pool_pubkey)
}

fn cmp_market(a: &MarketRecord, b: &MarketRecord) -> Ordering {
    a.pair.cmp(&b.pair)
}

fn cmp_time(a: &MarketRecord, b: &MarketRecord) -> Ordering {
    a.end_ms.cmp(&b.end_ms)
}

fn cmp_pool(a: &MarketRecord, b: &MarketRecord) -> Ordering {
    a.pool_size().cmp(&b.pool_size())
}

fn cmp_position(a: &MarketRecord, b: &MarketRecord) -> Ordering {
    a.position_size().cmp(&b.position_size())
}

fn cmp_payout(a: &MarketRecord, b: &MarketRecord) -> Ordering {
    a.expected_payout().cmp(&b.expected_payout())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            other => Err(format!("unknown sort direction: {}", other)),
        }
    }
}

/// At most one sorted column at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortState {
    active: Option<(Column, SortDirection)>,
}

impl SortState {
    pub fn new(column: Column, direction: SortDirection) -> Self {
        if !column.is_sortable() {
            return Self::default();
        }
        Self {
            active: Some((column, direction)),
        }
    }

    pub fn active(&self) -> Option<(Column, SortDirection)> {
        self.active
    }

    /// Direction for `column`, or None if it is not the sorted column.
    pub fn direction(&self, column: Column) -> Option<SortDirection> {
        match self.active {
            Some((c, dir)) if c == column => Some(dir),
            _ => None,
        }
    }

    /// Header click: unsorted -> ascending -> descending -> unsorted.
    /// Clicking another column starts it ascending.
    pub fn toggle(&mut self, column: Column) {
        if !column.is_sortable() {
            return;
        }
        self.active = match self.active {
            Some((c, SortDirection::Ascending)) if c == column => {
                Some((column, SortDirection::Descending))
            }
            Some((c, SortDirection::Descending)) if c == column => None,
            _ => Some((column, SortDirection::Ascending)),
        };
    }

    /// Stable sort of `rows` by the active column. No-op when unsorted.
    pub fn apply(&self, rows: &mut [MarketRecord]) {
        let (column, direction) = match self.active {
            Some(active) => active,
            None => return,
        };
        let compare = match column.spec().compare {
            Some(f) => f,
            None => return,
        };
        rows.sort_by(|a, b| match direction {
            SortDirection::Ascending => compare(a, b),
            SortDirection::Descending => compare(b, a),
        });
    }
}

/// Render rows as a fixed-width text table.
pub fn render(rows: &[MarketRecord], sort: &SortState, now_ms: i64) -> String {
    let mut sorted = rows.to_vec();
    sort.apply(&mut sorted);

    let mut out = String::new();
    for spec in COLUMNS.iter() {
        let marker = match sort.direction(spec.column) {
            Some(SortDirection::Ascending) => " ^",
            Some(SortDirection::Descending) => " v",
            None => "",
        };
        let header = format!("{}{}", spec.header, marker);
        let _ = write!(out, "{:<width$} ", header, width = spec.width);
    }
    out.truncate(out.trim_end().len());
    out.push('\n');

    for row in &sorted {
        let mut line = String::new();
        for spec in COLUMNS.iter() {
            let cell = (spec.format)(row, now_ms);
            let _ = write!(line, "{:<width$} ", cell, width = spec.width);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    if sorted.is_empty() {
        out.push_str("(no markets)\n");
    }
    out
}

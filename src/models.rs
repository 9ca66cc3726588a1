use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Flow direction of a transaction. `None` is used for neutral rows
/// (balance adjustments) and for rules that match either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    None,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "In",
            Self::Out => "Out",
            Self::None => "None",
        }
    }

    pub fn parse(s: &str) -> Option<Direction> {
        match s.trim().to_lowercase().as_str() {
            "in" => Some(Self::In),
            "out" => Some(Self::Out),
            "none" | "" => Some(Self::None),
            _ => None,
        }
    }
}

/// Where a ledger row came from: an imported file, a captured mirror of a
/// categorized transfer, or a synthetic balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    File,
    Captured,
    Synthetic,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "File",
            Self::Captured => "Captured",
            Self::Synthetic => "Synthetic",
        }
    }

    pub fn parse(s: &str) -> Option<Origin> {
        match s.trim() {
            "File" => Some(Self::File),
            "Captured" => Some(Self::Captured),
            "Synthetic" => Some(Self::Synthetic),
            _ => None,
        }
    }
}

pub const UNCATEGORIZED: &str = "Uncategorized";
pub const BALANCE_ADJUSTMENT: &str = "Balance Adjustment";

/// One ledger line. File-origin rows keep their source balance column when
/// the export provided one; derived rows carry no balance except synthetic
/// adjustments, which record the manual balance they reconciled to.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub transaction_date: NaiveDate,
    pub effective_date: NaiveDate,
    pub bank: String,
    pub account: String,
    pub description: String,
    pub direction: Direction,
    pub amount: Decimal,
    pub balance: Option<Decimal>,
    pub category: String,
    pub sub_category: String,
    pub origin: Origin,
    pub source_file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub id: Option<i64>,
    pub pattern: String,
    pub category: String,
    pub sub_category: String,
    pub direction: Direction,
    pub priority: i64,
    pub is_wildcard: bool,
}

impl Rule {
    /// Default priority by specificity: exact patterns outrank wildcard
    /// patterns, longer patterns outrank shorter ones.
    pub fn default_priority(pattern: &str) -> i64 {
        let len = pattern.len() as i64;
        if pattern.contains('*') {
            len
        } else {
            len + 100
        }
    }
}

#[derive(Debug, Clone)]
pub struct ManualOverride {
    pub txn_key: String,
    pub category: String,
    pub sub_category: String,
    pub direction: Direction,
    pub created_at: String,
}

/// Links a target account to the (category, sub-category) pairs whose
/// transactions should be mirrored into it.
#[derive(Debug, Clone)]
pub struct CategoryLink {
    pub bank: String,
    pub account: String,
    pub pairs: Vec<(String, String)>,
}

impl CategoryLink {
    /// Parse the stored `(Category,Sub)|(Category2,Sub2)` source list.
    /// Entries that don't fit the shape are ignored.
    pub fn parse_sources(sources: &str) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for part in sources.split('|') {
            let part = part.trim();
            let Some(inner) = part.strip_prefix('(').and_then(|p| p.strip_suffix(')')) else {
                continue;
            };
            let fields: Vec<&str> = inner.splitn(2, ',').map(|f| f.trim()).collect();
            if fields.len() == 2 {
                pairs.push((fields[0].to_string(), fields[1].to_string()));
            }
        }
        pairs
    }

    pub fn format_sources(pairs: &[(String, String)]) -> String {
        pairs
            .iter()
            .map(|(cat, sub)| format!("({cat},{sub})"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// A manually entered balance checkpoint for a balance-only account. The
/// balance is kept as entered; parsing happens at reconciliation time so a
/// bad value skips one entry instead of poisoning the whole table.
#[derive(Debug, Clone)]
pub struct BalanceEntry {
    pub bank: String,
    pub account: String,
    pub snapshot_date: NaiveDate,
    pub balance: String,
    pub entered_at: String,
}

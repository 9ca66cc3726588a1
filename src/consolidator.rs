use std::collections::{HashMap, HashSet};

use crate::categorizer::{apply_overrides, categorize, compile_rules, rule_conflicts};
use crate::keys::transaction_key;
use crate::models::{BalanceEntry, CategoryLink, ManualOverride, Rule, Transaction};
use crate::reconciler::{capture, synthesize};

#[derive(Debug, Default)]
pub struct RunReport {
    pub file_rows: usize,
    pub duplicates_dropped: usize,
    pub captured_rows: usize,
    pub synthetic_rows: usize,
    pub skipped_entries: Vec<String>,
    pub rule_conflicts: Vec<String>,
}

/// Drop repeated fingerprints, keeping the first occurrence. Input order is
/// the deterministic load order, so this is stable and idempotent.
pub fn deduplicate(transactions: Vec<Transaction>) -> (Vec<Transaction>, usize) {
    let mut seen = HashSet::new();
    let before = transactions.len();
    let kept: Vec<Transaction> = transactions
        .into_iter()
        .filter(|tx| seen.insert(transaction_key(tx)))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// One full consolidation run over immutable input snapshots:
/// dedup -> categorize -> overrides -> capture -> synthesize -> merge,
/// finishing with a stable sort by transaction date descending. Pure; the
/// caller owns persistence of the returned ledger.
pub fn consolidate(
    raw_records: Vec<Transaction>,
    rules: &[Rule],
    overrides: &HashMap<String, ManualOverride>,
    links: &[CategoryLink],
    balance_entries: &[BalanceEntry],
) -> (Vec<Transaction>, RunReport) {
    let mut report = RunReport::default();

    let (mut ledger, dropped) = deduplicate(raw_records);
    report.duplicates_dropped = dropped;
    report.file_rows = ledger.len();

    let compiled = compile_rules(rules);
    report.rule_conflicts = rule_conflicts(&compiled);
    categorize(&mut ledger, &compiled);
    apply_overrides(&mut ledger, overrides);

    let captured = capture(&ledger, links);
    report.captured_rows = captured.len();

    let synthesis = synthesize(&captured, balance_entries);
    report.skipped_entries = synthesis.skipped_entries;

    // Synthetic rows are themselves deduplicated by fingerprint before the
    // merge; identical checkpoints in the entry table collapse to one row.
    let (synthetic, _) = deduplicate(synthesis.rows);
    report.synthetic_rows = synthetic.len();

    ledger.extend(captured);
    ledger.extend(synthetic);

    // Stable sort: ties keep merge order (File, then Captured, then Synthetic).
    ledger.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));

    (ledger, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, Origin, UNCATEGORIZED};
    use chrono::NaiveDate;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn raw(date_s: &str, bank: &str, account: &str, desc: &str, amount: &str, balance: Option<&str>) -> Transaction {
        Transaction {
            transaction_date: date(date_s),
            effective_date: date(date_s),
            bank: bank.to_string(),
            account: account.to_string(),
            description: desc.to_string(),
            direction: if amount.starts_with('-') { Direction::Out } else { Direction::In },
            amount: amount.parse().unwrap(),
            balance: balance.map(|b| b.parse().unwrap()),
            category: UNCATEGORIZED.to_string(),
            sub_category: String::new(),
            origin: Origin::File,
            source_file: Some("export.csv".to_string()),
        }
    }

    fn rule(pattern: &str, category: &str, sub: &str, direction: Direction, priority: i64) -> Rule {
        Rule {
            id: None,
            pattern: pattern.to_string(),
            category: category.to_string(),
            sub_category: sub.to_string(),
            direction,
            priority,
            is_wildcard: pattern.contains('*'),
        }
    }

    #[test]
    fn test_deduplicate_collapses_identical_rows() {
        let rows = vec![
            raw("2025-01-01", "B", "A", "COFFEE", "-4.50", None),
            raw("2025-01-01", "B", "A", "COFFEE", "-4.50", None),
            raw("2025-01-01", "B", "A", "COFFEE", "-4.51", None),
        ];
        let (kept, dropped) = deduplicate(rows);
        assert_eq!(kept.len(), 2);
        assert_eq!(dropped, 1);
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let rows = vec![
            raw("2025-01-01", "B", "A", "COFFEE", "-4.50", None),
            raw("2025-01-01", "B", "A", "COFFEE", "-4.50", None),
        ];
        let (once, _) = deduplicate(rows);
        let (twice, dropped) = deduplicate(once.clone());
        assert_eq!(once, twice);
        assert_eq!(dropped, 0);
    }

    #[test]
    fn test_end_to_end_salary_scenario() {
        let raw_records = vec![raw(
            "2025-01-01", "Santander", "Chequing", "SALARY PAYMENT", "2000", Some("2000"),
        )];
        let rules = vec![rule("salary*", "Income", "Salary", Direction::In, 200)];
        let (ledger, report) = consolidate(raw_records, &rules, &HashMap::new(), &[], &[]);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].category, "Income");
        assert_eq!(ledger[0].sub_category, "Salary");
        assert_eq!(ledger[0].origin, Origin::File);
        assert_eq!(report.file_rows, 1);
        assert_eq!(report.captured_rows, 0);
        assert_eq!(report.synthetic_rows, 0);
    }

    #[test]
    fn test_consolidate_is_idempotent() {
        let raw_records = vec![
            raw("2025-01-01", "Santander", "Chequing", "SALARY PAYMENT", "2000", Some("2000")),
            raw("2025-01-05", "Santander", "Chequing", "TRANSFER TO TFSA", "-500", Some("1500")),
        ];
        let rules = vec![
            rule("salary*", "Income", "Salary", Direction::In, 200),
            rule("*transfer*", "Savings", "Transfer", Direction::Out, 150),
        ];
        let links = vec![CategoryLink {
            bank: "Wealthsimple".to_string(),
            account: "TFSA".to_string(),
            pairs: vec![("Savings".to_string(), "Transfer".to_string())],
        }];
        let entries = vec![BalanceEntry {
            bank: "Wealthsimple".to_string(),
            account: "TFSA".to_string(),
            snapshot_date: date("2025-01-31"),
            balance: "600.00".to_string(),
            entered_at: String::new(),
        }];
        let overrides = HashMap::new();

        let (first, _) = consolidate(raw_records.clone(), &rules, &overrides, &links, &entries);
        let (second, _) = consolidate(raw_records, &rules, &overrides, &links, &entries);
        assert_eq!(first, second);
    }

    #[test]
    fn test_full_pipeline_with_capture_and_synthesis() {
        let raw_records = vec![
            raw("2025-01-05", "Santander", "Chequing", "TRANSFER TO TFSA", "-500.00", Some("1500")),
        ];
        let rules = vec![rule("*transfer*", "Savings", "Transfer", Direction::Out, 150)];
        let links = vec![CategoryLink {
            bank: "Wealthsimple".to_string(),
            account: "TFSA".to_string(),
            pairs: vec![("Savings".to_string(), "Transfer".to_string())],
        }];
        let entries = vec![BalanceEntry {
            bank: "Wealthsimple".to_string(),
            account: "TFSA".to_string(),
            snapshot_date: date("2025-01-31"),
            balance: "600.00".to_string(),
            entered_at: String::new(),
        }];

        let (ledger, report) = consolidate(raw_records, &rules, &HashMap::new(), &links, &entries);
        assert_eq!(report.file_rows, 1);
        assert_eq!(report.captured_rows, 1);
        assert_eq!(report.synthetic_rows, 1);
        assert_eq!(ledger.len(), 3);

        let captured: Vec<_> = ledger.iter().filter(|t| t.origin == Origin::Captured).collect();
        assert_eq!(captured[0].amount, "500.00".parse().unwrap());

        // 600 stated minus 500 captured.
        let synthetic: Vec<_> = ledger.iter().filter(|t| t.origin == Origin::Synthetic).collect();
        assert_eq!(synthetic[0].amount, "100.00".parse().unwrap());
    }

    #[test]
    fn test_ledger_sorted_date_descending() {
        let raw_records = vec![
            raw("2025-01-01", "B", "A", "OLD", "-1", None),
            raw("2025-03-01", "B", "A", "NEW", "-2", None),
            raw("2025-02-01", "B", "A", "MID", "-3", None),
        ];
        let (ledger, _) = consolidate(raw_records, &[], &HashMap::new(), &[], &[]);
        let dates: Vec<_> = ledger.iter().map(|t| t.transaction_date).collect();
        assert_eq!(dates, vec![date("2025-03-01"), date("2025-02-01"), date("2025-01-01")]);
    }

    #[test]
    fn test_sort_ties_keep_input_order() {
        let raw_records = vec![
            raw("2025-01-01", "B", "A", "FIRST", "-1", None),
            raw("2025-01-01", "B", "A", "SECOND", "-2", None),
        ];
        let (ledger, _) = consolidate(raw_records, &[], &HashMap::new(), &[], &[]);
        assert_eq!(ledger[0].description, "FIRST");
        assert_eq!(ledger[1].description, "SECOND");
    }

    #[test]
    fn test_report_surfaces_rule_conflicts_and_skipped_entries() {
        let raw_records = vec![raw("2025-01-01", "B", "A", "PAYMENT", "-1", None)];
        let rules = vec![
            rule("*payment*", "A", "", Direction::None, 10),
            rule("payment", "B", "", Direction::None, 10),
        ];
        let entries = vec![BalanceEntry {
            bank: "W".to_string(),
            account: "X".to_string(),
            snapshot_date: date("2025-01-31"),
            balance: "not-a-number".to_string(),
            entered_at: String::new(),
        }];
        let (_, report) = consolidate(raw_records, &rules, &HashMap::new(), &[], &entries);
        assert_eq!(report.rule_conflicts.len(), 1);
        assert_eq!(report.skipped_entries.len(), 1);
    }
}

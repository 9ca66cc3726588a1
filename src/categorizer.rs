use std::collections::HashMap;

use crate::keys::transaction_key;
use crate::models::{Direction, ManualOverride, Rule, Transaction};

/// A rule pattern compiled once per run. Only leading/trailing asterisks are
/// wildcards; the needle is stored lowercased for case-insensitive matching.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchMode {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl MatchMode {
    pub fn compile(pattern: &str) -> MatchMode {
        let p = pattern.to_lowercase();
        let starts = p.starts_with('*');
        let ends = p.len() > 1 && p.ends_with('*');
        match (starts, ends) {
            (true, true) => Self::Contains(p[1..p.len() - 1].to_string()),
            (true, false) => Self::Suffix(p[1..].to_string()),
            (false, true) => Self::Prefix(p[..p.len() - 1].to_string()),
            (false, false) => Self::Exact(p),
        }
    }

    /// `needle` expects an already-lowercased description.
    fn matches_lower(&self, desc: &str) -> bool {
        match self {
            Self::Exact(n) => desc == n,
            Self::Prefix(n) => desc.starts_with(n.as_str()),
            Self::Suffix(n) => desc.ends_with(n.as_str()),
            Self::Contains(n) => desc.contains(n.as_str()),
        }
    }

    pub fn matches(&self, description: &str) -> bool {
        self.matches_lower(&description.to_lowercase())
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub mode: MatchMode,
    pub pattern: String,
    pub category: String,
    pub sub_category: String,
    pub direction: Direction,
    pub priority: i64,
}

impl CompiledRule {
    fn applies_to(&self, tx: &Transaction) -> bool {
        (self.direction == Direction::None || self.direction == tx.direction)
            && self.mode.matches_lower(&tx.description.to_lowercase())
    }
}

/// Compile and order rules for one run: priority descending, insertion order
/// as the tie-break. The sort is stable so equal priorities keep table order.
pub fn compile_rules(rules: &[Rule]) -> Vec<CompiledRule> {
    let mut compiled: Vec<CompiledRule> = rules
        .iter()
        .map(|r| CompiledRule {
            mode: MatchMode::compile(&r.pattern),
            pattern: r.pattern.clone(),
            category: r.category.clone(),
            sub_category: r.sub_category.clone(),
            direction: r.direction,
            priority: r.priority,
        })
        .collect();
    compiled.sort_by(|a, b| b.priority.cmp(&a.priority));
    compiled
}

/// Non-fatal warnings for rules that tie on priority and overlap, i.e. one
/// rule's pattern text would match the other's pattern. The earlier rule
/// wins deterministically; this just surfaces the shadowing.
pub fn rule_conflicts(compiled: &[CompiledRule]) -> Vec<String> {
    let mut warnings = Vec::new();
    for (i, a) in compiled.iter().enumerate() {
        for b in compiled.iter().skip(i + 1) {
            if a.priority != b.priority {
                continue;
            }
            if a.mode.matches(&b.pattern) || b.mode.matches(&a.pattern) {
                warnings.push(format!(
                    "rules '{}' and '{}' overlap at priority {}; '{}' wins by insertion order",
                    a.pattern, b.pattern, a.priority, a.pattern
                ));
            }
        }
    }
    warnings
}

/// Assign category/sub-category from the first matching rule; a rule with an
/// explicit direction also replaces the transaction's direction. Unmatched
/// rows keep the Uncategorized default. Pure and total.
pub fn categorize(transactions: &mut [Transaction], rules: &[CompiledRule]) {
    for tx in transactions.iter_mut() {
        for rule in rules {
            if rule.applies_to(tx) {
                tx.category = rule.category.clone();
                tx.sub_category = rule.sub_category.clone();
                if rule.direction != Direction::None {
                    tx.direction = rule.direction;
                }
                break;
            }
        }
    }
}

/// Final pass: a manual override addressed by fingerprint beats whatever the
/// rules decided. Must run after `categorize` so re-runs never clobber it.
pub fn apply_overrides(
    transactions: &mut [Transaction],
    overrides: &HashMap<String, ManualOverride>,
) {
    if overrides.is_empty() {
        return;
    }
    for tx in transactions.iter_mut() {
        let key = transaction_key(tx);
        if let Some(ov) = overrides.get(&key) {
            tx.category = ov.category.clone();
            tx.sub_category = ov.sub_category.clone();
            tx.direction = ov.direction;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Origin, UNCATEGORIZED};
    use chrono::NaiveDate;

    fn tx(desc: &str, direction: Direction) -> Transaction {
        let d = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        Transaction {
            transaction_date: d,
            effective_date: d,
            bank: "Santander".to_string(),
            account: "Chequing".to_string(),
            description: desc.to_string(),
            direction,
            amount: "-50.00".parse().unwrap(),
            balance: None,
            category: UNCATEGORIZED.to_string(),
            sub_category: String::new(),
            origin: Origin::File,
            source_file: None,
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
    fn test_match_modes() {
        assert_eq!(MatchMode::compile("salary"), MatchMode::Exact("salary".to_string()));
        assert_eq!(MatchMode::compile("salary*"), MatchMode::Prefix("salary".to_string()));
        assert_eq!(MatchMode::compile("*salary"), MatchMode::Suffix("salary".to_string()));
        assert_eq!(MatchMode::compile("*salary*"), MatchMode::Contains("salary".to_string()));
    }

    #[test]
    fn test_exact_is_full_string_case_insensitive() {
        let m = MatchMode::compile("Salary Payment");
        assert!(m.matches("SALARY PAYMENT"));
        assert!(!m.matches("SALARY PAYMENT JAN"));
    }

    #[test]
    fn test_prefix_suffix_contains() {
        assert!(MatchMode::compile("salary*").matches("SALARY PAYMENT"));
        assert!(!MatchMode::compile("salary*").matches("JAN SALARY"));
        assert!(MatchMode::compile("*payment").matches("SALARY PAYMENT"));
        assert!(!MatchMode::compile("*payment").matches("PAYMENT FEE"));
        assert!(MatchMode::compile("*alar*").matches("SALARY"));
    }

    #[test]
    fn test_lone_asterisk_matches_everything() {
        let m = MatchMode::compile("*");
        assert!(m.matches("anything"));
        assert!(m.matches(""));
    }

    #[test]
    fn test_first_match_wins_by_priority() {
        let rules = compile_rules(&[
            rule("*payment*", "Fees", "", Direction::None, 50),
            rule("*payment*", "Income", "Salary", Direction::None, 100),
        ]);
        let mut txs = vec![tx("SALARY PAYMENT", Direction::In)];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].category, "Income");
        assert_eq!(txs[0].sub_category, "Salary");
    }

    #[test]
    fn test_priority_tie_broken_by_insertion_order() {
        let rules = compile_rules(&[
            rule("*payment*", "First", "", Direction::None, 10),
            rule("*payment*", "Second", "", Direction::None, 10),
        ]);
        let mut txs = vec![tx("SALARY PAYMENT", Direction::In)];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].category, "First");
    }

    #[test]
    fn test_direction_filter() {
        let rules = compile_rules(&[rule("*salary*", "Income", "Salary", Direction::In, 100)]);
        let mut txs = vec![tx("SALARY REFUND", Direction::Out)];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].category, UNCATEGORIZED);
    }

    #[test]
    fn test_rule_direction_replaces_transaction_direction() {
        let rules = compile_rules(&[rule("*transfer*", "Savings", "Transfer", Direction::Out, 100)]);
        let mut txs = vec![tx("TRANSFER TO SAVINGS", Direction::Out)];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].direction, Direction::Out);

        let neutral = compile_rules(&[rule("*transfer*", "Savings", "Transfer", Direction::None, 100)]);
        let mut txs = vec![tx("TRANSFER TO SAVINGS", Direction::In)];
        categorize(&mut txs, &neutral);
        // Direction::None on the rule preserves the source direction.
        assert_eq!(txs[0].direction, Direction::In);
    }

    #[test]
    fn test_unmatched_stays_uncategorized() {
        let rules = compile_rules(&[rule("*adobe*", "Software", "", Direction::None, 10)]);
        let mut txs = vec![tx("RANDOM VENDOR XYZ", Direction::Out)];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].category, UNCATEGORIZED);
        assert_eq!(txs[0].sub_category, "");
    }

    #[test]
    fn test_override_beats_rule() {
        let rules = compile_rules(&[rule("*salary*", "Income", "Salary", Direction::In, 100)]);
        let mut txs = vec![tx("SALARY PAYMENT", Direction::In)];
        categorize(&mut txs, &rules);
        assert_eq!(txs[0].category, "Income");

        let key = transaction_key(&txs[0]);
        let mut overrides = HashMap::new();
        overrides.insert(
            key,
            ManualOverride {
                txn_key: String::new(),
                category: "Reimbursement".to_string(),
                sub_category: "Expenses".to_string(),
                direction: Direction::In,
                created_at: String::new(),
            },
        );
        apply_overrides(&mut txs, &overrides);
        assert_eq!(txs[0].category, "Reimbursement");
        assert_eq!(txs[0].sub_category, "Expenses");
    }

    #[test]
    fn test_override_unmatched_key_is_noop() {
        let mut txs = vec![tx("SALARY PAYMENT", Direction::In)];
        let mut overrides = HashMap::new();
        overrides.insert(
            "no-such-key".to_string(),
            ManualOverride {
                txn_key: "no-such-key".to_string(),
                category: "X".to_string(),
                sub_category: String::new(),
                direction: Direction::None,
                created_at: String::new(),
            },
        );
        apply_overrides(&mut txs, &overrides);
        assert_eq!(txs[0].category, UNCATEGORIZED);
    }

    #[test]
    fn test_rule_conflicts_reported() {
        let compiled = compile_rules(&[
            rule("*payment*", "A", "", Direction::None, 10),
            rule("salary payment", "B", "", Direction::None, 10),
        ]);
        let warnings = rule_conflicts(&compiled);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("overlap at priority 10"));
    }

    #[test]
    fn test_no_conflict_across_priorities() {
        let compiled = compile_rules(&[
            rule("*payment*", "A", "", Direction::None, 10),
            rule("*payment*", "B", "", Direction::None, 20),
        ]);
        assert!(rule_conflicts(&compiled).is_empty());
    }
}

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::models::{
    BalanceEntry, CategoryLink, Direction, Origin, Transaction, BALANCE_ADJUSTMENT,
};

/// Phase A: for every account with category links, mirror each ledger
/// transaction whose (category, sub-category) matches a linked pair. The
/// mirror lands in the linked account with the amount sign reversed — money
/// leaving the source account arrives in the linked one. Regenerated from
/// scratch on every run.
pub fn capture(transactions: &[Transaction], links: &[CategoryLink]) -> Vec<Transaction> {
    let mut captured = Vec::new();
    for link in links {
        if link.pairs.is_empty() {
            continue;
        }
        for tx in transactions {
            let matched = link
                .pairs
                .iter()
                .any(|(cat, sub)| tx.category == *cat && tx.sub_category == *sub);
            if !matched {
                continue;
            }
            captured.push(Transaction {
                transaction_date: tx.transaction_date,
                effective_date: tx.effective_date,
                bank: link.bank.clone(),
                account: link.account.clone(),
                description: tx.description.clone(),
                direction: tx.direction,
                amount: -tx.amount,
                balance: None,
                category: tx.category.clone(),
                sub_category: tx.sub_category.clone(),
                origin: Origin::Captured,
                source_file: tx.source_file.clone(),
            });
        }
    }
    captured
}

pub struct SynthesisResult {
    pub rows: Vec<Transaction>,
    /// Entries skipped because their balance was missing or non-numeric.
    pub skipped_entries: Vec<String>,
}

/// Phase B: walk each account's balance checkpoints in date order, keeping a
/// running sum of captured amounts dated at or before the checkpoint. A
/// non-zero gap between the stated balance and that sum becomes one synthetic
/// adjustment row. Deltas are independent per checkpoint: each one is stated
/// balance minus total captured-to-date, never net of earlier adjustments.
pub fn synthesize(captured: &[Transaction], entries: &[BalanceEntry]) -> SynthesisResult {
    let mut rows = Vec::new();
    let mut skipped_entries = Vec::new();

    // Group by account; BTreeMap keeps account iteration deterministic.
    let mut by_account: BTreeMap<(String, String), Vec<&BalanceEntry>> = BTreeMap::new();
    for entry in entries {
        by_account
            .entry((entry.bank.clone(), entry.account.clone()))
            .or_default()
            .push(entry);
    }

    for ((bank, account), mut acct_entries) in by_account {
        acct_entries.sort_by_key(|e| e.snapshot_date);

        let mut acct_captured: Vec<&Transaction> = captured
            .iter()
            .filter(|t| t.bank == bank && t.account == account)
            .collect();
        acct_captured.sort_by_key(|t| t.transaction_date);

        let mut running_sum = Decimal::ZERO;
        let mut idx = 0;

        for entry in acct_entries {
            let balance = match Decimal::from_str(entry.balance.trim()) {
                Ok(b) => b,
                Err(_) => {
                    skipped_entries.push(format!(
                        "{} {} @ {}: unparsable balance '{}'",
                        bank, account, entry.snapshot_date, entry.balance
                    ));
                    continue;
                }
            };

            while idx < acct_captured.len()
                && acct_captured[idx].transaction_date <= entry.snapshot_date
            {
                running_sum += acct_captured[idx].amount;
                idx += 1;
            }

            let delta = balance - running_sum;
            if !delta.is_zero() {
                rows.push(Transaction {
                    transaction_date: entry.snapshot_date,
                    effective_date: entry.snapshot_date,
                    bank: bank.clone(),
                    account: account.clone(),
                    description: format!("Adjustment - {bank} {account} | Balance {balance}"),
                    direction: Direction::None,
                    amount: delta,
                    balance: Some(balance),
                    category: BALANCE_ADJUSTMENT.to_string(),
                    sub_category: BALANCE_ADJUSTMENT.to_string(),
                    origin: Origin::Synthetic,
                    source_file: None,
                });
            }
        }
    }

    SynthesisResult {
        rows,
        skipped_entries,
    }
}

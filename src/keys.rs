use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::models::Transaction;

/// Canonical decimal text for hashing: trailing zeros stripped so that
/// "70" and "70.00" fingerprint identically regardless of source formatting.
fn canon(d: &Decimal) -> String {
    d.normalize().to_string()
}

/// Deterministic fingerprint over the six identity fields:
/// (transaction_date, bank, account, description, amount, balance).
/// A missing balance hashes as the empty string. Two file rows that agree on
/// all six fields are the same transaction.
pub fn transaction_key(tx: &Transaction) -> String {
    let balance = tx.balance.as_ref().map(canon).unwrap_or_default();
    let input = format!(
        "{}|{}|{}|{}|{}|{}",
        tx.transaction_date,
        tx.bank,
        tx.account,
        tx.description,
        canon(&tx.amount),
        balance,
    );
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Short prefix for display in tables; full keys are used for addressing.
/// Keys are normally lowercase hex, but user-typed keys can hold anything,
/// so the cut lands on a char boundary.
pub fn short_key(key: &str) -> &str {
    match key.char_indices().nth(12) {
        Some((i, _)) => &key[..i],
        None => key,
    }
}

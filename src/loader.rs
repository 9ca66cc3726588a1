use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::{Direction, Origin, Transaction, UNCATEGORIZED};

/// Strip currency noise and parse; accepts `(500.00)` accounting negatives.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let s = raw.replace(',', "").replace('"', "").replace('$', "");
    let s = s.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return Decimal::from_str(inner.trim()).ok().map(|d| -d);
    }
    Decimal::from_str(s).ok()
}

/// Accept ISO dates and the M/D/Y that most bank exports still use.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d);
    }
    NaiveDate::parse_from_str(raw, "%m/%d/%Y").ok()
}

pub struct LoadResult {
    pub records: Vec<Transaction>,
    /// Rows excluded from the load with a reason; reported, not fatal.
    pub malformed: Vec<String>,
}

fn header_index(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Read one normalized export (common columns: Date, Effective Date,
/// Description, Direction, Amount, Balance) into File-origin records for the
/// given bank/account. Per-bank column mangling is the uploader's problem;
/// this reader only enforces the normalized shape.
pub fn read_file(path: &Path, bank: &str, account: &str) -> Result<LoadResult> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let source_file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();

    let headers = rdr.headers()?.clone();
    let idx_date = header_index(&headers, "Date");
    let idx_eff = header_index(&headers, "Effective Date");
    let idx_desc = header_index(&headers, "Description");
    let idx_dir = header_index(&headers, "Direction");
    let idx_amount = header_index(&headers, "Amount");
    let idx_balance = header_index(&headers, "Balance");

    let (Some(idx_date), Some(idx_desc), Some(idx_amount)) = (idx_date, idx_desc, idx_amount)
    else {
        return Err(crate::error::TallyError::MalformedRecord(format!(
            "{source_file}: missing required column (need Date, Description, Amount)"
        )));
    };

    let mut records = Vec::new();
    let mut malformed = Vec::new();

    for (line, result) in rdr.records().enumerate() {
        let row = line + 2; // 1-based, after the header
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                malformed.push(format!("{source_file}:{row}: {e}"));
                continue;
            }
        };
        let field = |idx: usize| record.get(idx).unwrap_or("").trim().to_string();

        let description = field(idx_desc);
        if description.is_empty() {
            malformed.push(format!("{source_file}:{row}: empty description"));
            continue;
        }
        let Some(transaction_date) = parse_date(&field(idx_date)) else {
            malformed.push(format!(
                "{source_file}:{row}: unparsable date '{}'",
                field(idx_date)
            ));
            continue;
        };
        let Some(amount) = parse_amount(&field(idx_amount)) else {
            malformed.push(format!(
                "{source_file}:{row}: unparsable amount '{}'",
                field(idx_amount)
            ));
            continue;
        };

        let effective_date = idx_eff
            .and_then(|i| parse_date(&field(i)))
            .unwrap_or(transaction_date);
        let direction = match idx_dir {
            Some(i) => match Direction::parse(&field(i)) {
                Some(d) => d,
                None => {
                    malformed.push(format!(
                        "{source_file}:{row}: unknown direction '{}'",
                        field(i)
                    ));
                    continue;
                }
            },
            None => Direction::None,
        };
        let balance = idx_balance.and_then(|i| {
            let raw = field(i);
            if raw.is_empty() {
                None
            } else {
                parse_amount(&raw)
            }
        });

        records.push(Transaction {
            transaction_date,
            effective_date,
            bank: bank.to_string(),
            account: account.to_string(),
            description,
            direction,
            amount,
            balance,
            category: UNCATEGORIZED.to_string(),
            sub_category: String::new(),
            origin: Origin::File,
            source_file: Some(source_file.clone()),
        });
    }

    Ok(LoadResult { records, malformed })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234.56"), Some("1234.56".parse().unwrap()));
        assert_eq!(parse_amount("\"500.00\""), Some("500.00".parse().unwrap()));
        assert_eq!(parse_amount("  -42.50  "), Some("-42.50".parse().unwrap()));
        assert_eq!(parse_amount("$2,000"), Some("2000".parse().unwrap()));
        assert_eq!(parse_amount("(500.00)"), Some("-500.00".parse().unwrap()));
        assert_eq!(parse_amount("not_a_number"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2025-01-15"), NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(parse_date("01/15/2025"), NaiveDate::from_ymd_opt(2025, 1, 15));
        assert_eq!(parse_date("02/30/2025"), None);
        assert_eq!(parse_date("soon"), None);
    }

    fn write_csv(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_file_normalized_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "jan.csv",
            "Date,Effective Date,Description,Direction,Amount,Balance\n\
             2025-01-01,2025-01-02,SALARY PAYMENT,In,2000,2000\n\
             2025-01-05,2025-01-05,TRANSFER TO TFSA,Out,-500.00,1500.00\n",
        );
        let result = read_file(&path, "Santander", "Chequing").unwrap();
        assert!(result.malformed.is_empty());
        assert_eq!(result.records.len(), 2);
        let first = &result.records[0];
        assert_eq!(first.bank, "Santander");
        assert_eq!(first.account, "Chequing");
        assert_eq!(first.direction, Direction::In);
        assert_eq!(first.amount, "2000".parse().unwrap());
        assert_eq!(first.balance, Some("2000".parse().unwrap()));
        assert_eq!(first.effective_date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        assert_eq!(first.source_file.as_deref(), Some("jan.csv"));
        assert_eq!(first.category, UNCATEGORIZED);
    }

    #[test]
    fn test_read_file_collects_malformed_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "bad.csv",
            "Date,Description,Direction,Amount\n\
             2025-01-01,GOOD ROW,Out,-10.00\n\
             not-a-date,BAD DATE,Out,-10.00\n\
             2025-01-03,BAD AMOUNT,Out,ten\n\
             2025-01-04,,Out,-10.00\n\
             2025-01-05,BAD DIRECTION,sideways,-10.00\n",
        );
        let result = read_file(&path, "B", "A").unwrap();
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].description, "GOOD ROW");
        assert_eq!(result.malformed.len(), 4);
        assert!(result.malformed[0].contains("unparsable date"));
    }

    #[test]
    fn test_read_file_missing_balance_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "nobal.csv",
            "Date,Description,Direction,Amount,Balance\n\
             2025-01-01,CARD PAYMENT,Out,-25.00,\n",
        );
        let result = read_file(&path, "B", "A").unwrap();
        assert_eq!(result.records[0].balance, None);
    }

    #[test]
    fn test_read_file_requires_core_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(dir.path(), "wrong.csv", "Foo,Bar\n1,2\n");
        assert!(read_file(&path, "B", "A").is_err());
    }

    #[test]
    fn test_read_file_without_direction_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            dir.path(),
            "min.csv",
            "Date,Description,Amount\n2025-01-01,FEE,-1.00\n",
        );
        let result = read_file(&path, "B", "A").unwrap();
        assert_eq!(result.records[0].direction, Direction::None);
    }
}

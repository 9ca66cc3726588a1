pub mod balance;
pub mod consolidate;
pub mod export;
pub mod init;
pub mod ledger;
pub mod links;
pub mod load;
pub mod overrides;
pub mod rules;
pub mod status;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tally", about = "Multi-bank transaction consolidation and reconciliation CLI.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up tally: choose a data directory and initialize the database.
    Init {
        /// Path for tally data (default: ~/Documents/tally)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Load normalized CSV exports into the raw record store.
    Load {
        /// CSV files to load (processed in lexicographic path order)
        files: Vec<String>,
        /// Source bank name
        #[arg(long)]
        bank: String,
        /// Source account name
        #[arg(long)]
        account: String,
    },
    /// Manage categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Manage manual categorization overrides.
    Override {
        #[command(subcommand)]
        command: OverrideCommands,
    },
    /// Manage category links for balance-only accounts.
    Links {
        #[command(subcommand)]
        command: LinksCommands,
    },
    /// Manage balance checkpoints for balance-only accounts.
    Balance {
        #[command(subcommand)]
        command: BalanceCommands,
    },
    /// Rebuild the consolidated ledger from all inputs.
    Consolidate,
    /// Show the consolidated ledger.
    Ledger {
        /// Filter by bank name
        #[arg(long)]
        bank: Option<String>,
        /// Filter by account name
        #[arg(long)]
        account: Option<String>,
        /// Maximum rows to show
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Export the consolidated ledger to CSV.
    Export {
        /// Output file path
        #[arg(long)]
        output: String,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a categorization rule.
    Add {
        /// Pattern: exact text, or wildcards 'pat*', '*pat', '*pat*'
        pattern: String,
        /// Category to assign
        #[arg(long)]
        category: String,
        /// Sub-category to assign
        #[arg(long, default_value = "")]
        sub: String,
        /// Direction filter: In, Out, None (None matches both)
        #[arg(long, default_value = "None")]
        direction: String,
        /// Rule priority (higher wins; default derived from pattern length)
        #[arg(long)]
        priority: Option<i64>,
    },
    /// List all categorization rules.
    List,
    /// Delete a rule by ID.
    Delete {
        /// Rule ID (shown in `tally rules list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum OverrideCommands {
    /// Add or replace the override for a transaction key.
    Add {
        /// Transaction key (shown in `tally ledger`)
        key: String,
        /// Category to assign
        #[arg(long)]
        category: String,
        /// Sub-category to assign
        #[arg(long, default_value = "")]
        sub: String,
        /// Direction to assign: In, Out, None
        #[arg(long, default_value = "None")]
        direction: String,
    },
    /// Remove the override for a transaction key.
    Remove {
        /// Transaction key
        key: String,
    },
    /// List all overrides.
    List,
}

#[derive(Subcommand)]
pub enum LinksCommands {
    /// Set the linked category sources for an account.
    Set {
        /// Target bank name
        #[arg(long)]
        bank: String,
        /// Target account name
        #[arg(long)]
        account: String,
        /// Linked pairs: "(Category,Sub)|(Category2,Sub2)"
        #[arg(long)]
        sources: String,
    },
    /// List all category links.
    List,
}

#[derive(Subcommand)]
pub enum BalanceCommands {
    /// Add or update a balance checkpoint.
    Add {
        /// Bank name
        #[arg(long)]
        bank: String,
        /// Account name
        #[arg(long)]
        account: String,
        /// Snapshot date: YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Stated balance on that date
        #[arg(long)]
        amount: String,
    },
    /// Remove a balance checkpoint.
    Remove {
        #[arg(long)]
        bank: String,
        #[arg(long)]
        account: String,
        /// Snapshot date: YYYY-MM-DD
        #[arg(long)]
        date: String,
    },
    /// List all balance checkpoints.
    List,
}

mod categorizer;
mod cli;
mod consolidator;
mod db;
mod error;
mod fmt;
mod keys;
mod loader;
mod models;
mod reconciler;
mod settings;

use clap::Parser;

use cli::{BalanceCommands, Cli, Commands, LinksCommands, OverrideCommands, RulesCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Load {
            files,
            bank,
            account,
        } => cli::load::run(&files, &bank, &account),
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                pattern,
                category,
                sub,
                direction,
                priority,
            } => cli::rules::add(&pattern, &category, &sub, &direction, priority),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Delete { id } => cli::rules::delete(id),
        },
        Commands::Override { command } => match command {
            OverrideCommands::Add {
                key,
                category,
                sub,
                direction,
            } => cli::overrides::add(&key, &category, &sub, &direction),
            OverrideCommands::Remove { key } => cli::overrides::remove(&key),
            OverrideCommands::List => cli::overrides::list(),
        },
        Commands::Links { command } => match command {
            LinksCommands::Set {
                bank,
                account,
                sources,
            } => cli::links::set(&bank, &account, &sources),
            LinksCommands::List => cli::links::list(),
        },
        Commands::Balance { command } => match command {
            BalanceCommands::Add {
                bank,
                account,
                date,
                amount,
            } => cli::balance::add(&bank, &account, &date, &amount),
            BalanceCommands::Remove {
                bank,
                account,
                date,
            } => cli::balance::remove(&bank, &account, &date),
            BalanceCommands::List => cli::balance::list(),
        },
        Commands::Consolidate => cli::consolidate::run(),
        Commands::Ledger {
            bank,
            account,
            limit,
        } => cli::ledger::run(bank.as_deref(), account.as_deref(), limit),
        Commands::Export { output } => cli::export::run(&output),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

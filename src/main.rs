//! Card Ledger CLI
//!
//! Tracks gift and loyalty cards in a local JSON file and exchanges
//! backups as versioned JSON documents.
//!
//! # Usage
//!
//! ```bash
//! card-ledger add <number> <name> [balance] [expiry]
//! card-ledger list [--archived]
//! card-ledger show <id>
//! card-ledger spend <id> <amount> [description]
//! card-ledger reset <id> <amount>
//! card-ledger archive|unarchive|delete <id>
//! card-ledger move <id> <target-id>
//! card-ledger format <id> <barcode-format>
//! card-ledger export [file]
//! card-ledger import <file> [--yes]
//! ```
//!
//! # Environment Variables
//!
//! - `CARD_LEDGER_FILE`: path of the card data file (default `cards.json`)
//! - `CARD_LEDGER_STORES`: optional store directory JSON for theming lookups
//! - `RUST_LOG`: set to `debug` or `warn` to control logging verbosity

use card_ledger::{
    codec, stores, BarcodeFormat, Card, JsonFileStore, Ledger, LedgerError, Money, Result,
};
use chrono::{NaiveDate, Utc};
use std::env;
use std::fs;
use std::process;
use std::str::FromStr;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().ok_or(LedgerError::MissingArgument)?;

    let data_file = env::var("CARD_LEDGER_FILE").unwrap_or_else(|_| "cards.json".to_string());
    let mut ledger = Ledger::open(JsonFileStore::new(data_file));

    match command.as_str() {
        "add" => cmd_add(&mut ledger, &args),
        "list" => cmd_list(&ledger, args.iter().any(|a| a == "--archived")),
        "show" => cmd_show(&ledger, arg(&args, 1)?),
        "spend" => cmd_spend(&mut ledger, &args),
        "reset" => {
            let tx = ledger.reset_balance(arg(&args, 1)?, parse_amount(arg(&args, 2)?)?)?;
            println!("Balance reset to €{}", tx.balance_after);
            Ok(())
        }
        "archive" => {
            ledger.archive(arg(&args, 1)?)?;
            println!("Card archived");
            Ok(())
        }
        "unarchive" => {
            ledger.unarchive(arg(&args, 1)?)?;
            println!("Card unarchived");
            Ok(())
        }
        "delete" => {
            ledger.delete_card(arg(&args, 1)?)?;
            println!("Card deleted");
            Ok(())
        }
        "move" => {
            ledger.reorder(arg(&args, 1)?, arg(&args, 2)?)?;
            println!("Card moved");
            Ok(())
        }
        "format" => {
            let format = parse_format(arg(&args, 2)?)?;
            ledger.set_barcode_format(arg(&args, 1)?, format)?;
            println!("Barcode format set to {}", format);
            Ok(())
        }
        "export" => cmd_export(&ledger, args.get(1).map(String::as_str)),
        "import" => cmd_import(&mut ledger, &args),
        other => Err(LedgerError::UnknownCommand(other.to_string())),
    }
}

fn arg<'a>(args: &'a [String], index: usize) -> Result<&'a str> {
    args.get(index)
        .map(String::as_str)
        .ok_or(LedgerError::MissingArgument)
}

fn parse_amount(input: &str) -> Result<Money> {
    Money::from_str(input).map_err(|_| LedgerError::InvalidAmount {
        input: input.to_string(),
    })
}

fn parse_format(input: &str) -> Result<BarcodeFormat> {
    BarcodeFormat::from_str(input)
        .map_err(|_| LedgerError::InvalidBarcodeFormat(input.to_string()))
}

fn cmd_add<S: card_ledger::CardStore>(ledger: &mut Ledger<S>, args: &[String]) -> Result<()> {
    let number = arg(args, 1)?;
    let name = arg(args, 2)?;
    let balance_input = args.get(3).map(String::as_str).unwrap_or("");
    let expiry = match args.get(4) {
        Some(raw) => Some(NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            LedgerError::InvalidDate {
                input: raw.to_string(),
            }
        })?),
        None => None,
    };

    let card = ledger.create_card(number, name, balance_input, expiry)?;
    if card.is_fidelity() {
        println!("Fidelity card '{}' added ({})", card.name, card.id);
    } else {
        println!(
            "Gift card '{}' added with balance €{} ({})",
            card.name,
            card.current_balance.unwrap_or(Money::ZERO),
            card.id
        );
    }
    Ok(())
}

fn cmd_list<S: card_ledger::CardStore>(ledger: &Ledger<S>, archived: bool) -> Result<()> {
    let mut count = 0;
    let cards: Vec<&Card> = if archived {
        ledger.archived().collect()
    } else {
        ledger.active().collect()
    };

    for card in cards {
        println!(
            "{}  #{}  {}  {}",
            card.id,
            card.number,
            card.name,
            summarize(card)
        );
        count += 1;
    }

    if count == 0 {
        println!(
            "No {} cards",
            if archived { "archived" } else { "active" }
        );
    }
    Ok(())
}

fn summarize(card: &Card) -> String {
    match card.current_balance {
        Some(balance) if !card.is_fidelity() => {
            let mut summary = format!("€{}", balance);
            if card.is_expired() {
                summary.push_str(" [expired]");
            } else if card.is_expiring_soon() {
                summary.push_str(" [expires soon]");
            }
            summary
        }
        _ => "[fidelity]".to_string(),
    }
}

fn cmd_show<S: card_ledger::CardStore>(ledger: &Ledger<S>, id: &str) -> Result<()> {
    let card = ledger
        .find(id)
        .ok_or_else(|| LedgerError::NotFound { id: id.to_string() })?;

    println!("{}", card.name);
    if let Ok(path) = env::var("CARD_LEDGER_STORES") {
        let directory = stores::load_directory(path);
        if let Some(store) = stores::match_store(&card.name, &directory) {
            println!("Store: {} ({})", store.name, store.color);
        }
    }

    println!("Number: {}", card.number);
    println!("Barcode: {}", card.barcode_format);
    println!("Created: {}", card.created_at.format("%Y-%m-%d %H:%M"));
    if card.archived {
        println!("Archived: yes");
    }

    if card.is_fidelity() {
        println!("Type: fidelity card (no balance tracking)");
    } else {
        if let (Some(current), Some(initial)) = (card.current_balance, card.initial_balance) {
            println!("Balance: €{} (initial €{})", current, initial);
        }
        if let Some(expiry) = card.expiry_date {
            println!("Expires: {}{}", expiry, expiry_note(card));
        }
    }

    if !card.transactions.is_empty() {
        println!("Transactions:");
        for tx in &card.transactions {
            println!(
                "  {}  {:>10}  balance €{}  {}",
                tx.date.format("%Y-%m-%d %H:%M"),
                format!("€{}", tx.amount),
                tx.balance_after,
                tx.description
            );
        }
    }
    Ok(())
}

fn expiry_note(card: &Card) -> &'static str {
    if card.is_expired() {
        " [expired]"
    } else if card.is_expiring_soon() {
        " [expires soon]"
    } else {
        ""
    }
}

fn cmd_spend<S: card_ledger::CardStore>(ledger: &mut Ledger<S>, args: &[String]) -> Result<()> {
    let id = arg(args, 1)?;
    let amount = parse_amount(arg(args, 2)?)?;
    let description = args.get(3).map(String::as_str);

    let tx = ledger.record_spend(id, amount, description)?;
    println!(
        "Recorded spend of €{}, balance now €{}",
        amount, tx.balance_after
    );
    Ok(())
}

fn cmd_export<S: card_ledger::CardStore>(ledger: &Ledger<S>, file: Option<&str>) -> Result<()> {
    let filename = match file {
        Some(file) => file.to_string(),
        None => codec::backup_filename(Utc::now()),
    };

    fs::write(&filename, ledger.export_json()?)?;
    println!("Exported {} cards to {}", ledger.cards().len(), filename);
    Ok(())
}

fn cmd_import<S: card_ledger::CardStore>(ledger: &mut Ledger<S>, args: &[String]) -> Result<()> {
    let path = arg(args, 1)?;
    let confirmed = args.iter().any(|a| a == "--yes");

    let json = fs::read_to_string(path)?;

    if !confirmed {
        // validate up front so the user sees errors before confirming
        let parsed = codec::parse(&json)?;
        println!(
            "This will replace the {} stored cards with the {} cards from the backup.",
            ledger.cards().len(),
            parsed.cards.len()
        );
        match parsed.export_date {
            Some(date) => println!("Backup taken {}", date.format("%Y-%m-%d %H:%M")),
            None => println!("Backup date unknown"),
        }
        println!("Re-run with --yes to confirm.");
        return Ok(());
    }

    let summary = ledger.import_document(&json)?;
    println!(
        "Imported {} cards (replaced {})",
        summary.imported, summary.previous
    );
    Ok(())
}

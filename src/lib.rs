//! # Card Ledger
//!
//! A record-keeper for prepaid gift cards and loyalty cards: each card
//! carries a running balance kept consistent with its append-only
//! transaction log, the collection persists to a local JSON store, and
//! backups round-trip losslessly through a versioned export document.
//!
//! ## Design Principles
//!
//! - **Exact arithmetic**: balances use 2-decimal fixed-point via `rust_decimal`
//! - **Atomic operations**: every mutation fully succeeds or leaves the
//!   collection untouched, then persists
//! - **Strict imports**: untrusted documents are validated field by field
//!   and rejected whole on the first violation
//! - **Typed card kinds**: fidelity (no balance) vs. balance-bearing is a
//!   pattern match, not a null check
//!
//! ## Example
//!
//! ```
//! use card_ledger::{Ledger, MemoryStore, Money};
//! use std::str::FromStr;
//!
//! let mut ledger = Ledger::open(MemoryStore::new());
//! let id = ledger.create_card("111", "Cafe", "50", None).unwrap().id.clone();
//! ledger.record_spend(&id, Money::from_str("20").unwrap(), Some("Coffee")).unwrap();
//! assert_eq!(ledger.find(&id).unwrap().current_balance, Money::from_str("30").ok());
//! ```

pub mod card;
pub mod codec;
pub mod error;
pub mod ledger;
pub mod money;
pub mod storage;
pub mod stores;

pub use card::{BarcodeFormat, Card, CardKind, Transaction, TxType, EXPIRY_WARNING_DAYS};
pub use codec::{BackupDocument, ParsedBackup, EXPORT_VERSION};
pub use error::{LedgerError, Result};
pub use ledger::{ImportSummary, Ledger};
pub use money::Money;
pub use storage::{CardStore, JsonFileStore, MemoryStore};
pub use stores::{match_store, Store};

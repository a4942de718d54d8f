//! Error types for the card ledger.

use crate::money::Money;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operation.
///
/// All variants are local, recoverable conditions: every mutating
/// operation either fully succeeds or leaves the collection untouched.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// A card with the same number already exists (archived cards included)
    #[error("A card with number '{number}' already exists")]
    DuplicateNumber { number: String },

    /// No card with the given id
    #[error("No card with id '{id}'")]
    NotFound { id: String },

    /// The target card is a fidelity card and does not track a balance
    #[error("Card '{id}' is a fidelity card and has no balance to change")]
    FidelityCard { id: String },

    /// A spend would take the balance below zero
    #[error("Spend of {amount} exceeds the current balance of {balance}")]
    InsufficientBalance { amount: Money, balance: Money },

    /// An amount failed to parse or is out of the allowed range
    #[error("Invalid amount: '{input}'")]
    InvalidAmount { input: String },

    /// An imported document does not have the expected shape
    #[error("Import document is invalid: {0}")]
    SchemaInvalid(String),

    /// A card in an imported document failed field validation
    #[error("Import document has a card with an invalid '{field}' field")]
    FieldInvalid { field: &'static str },

    /// Failed to read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A date failed to parse
    #[error("Invalid date: '{input}' (expected YYYY-MM-DD)")]
    InvalidDate { input: String },

    /// An unknown barcode format name
    #[error("Unknown barcode format '{0}'")]
    InvalidBarcodeFormat(String),

    /// Missing CLI argument
    #[error("Missing argument. Usage: card-ledger <command> [args]")]
    MissingArgument,

    /// Unknown CLI command
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),
}

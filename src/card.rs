//! Card and transaction models.
//!
//! A card is either balance-bearing (tracks a spendable amount via an
//! append-only transaction log) or a fidelity card (loyalty/stamp card,
//! no balance tracking). The wire format keeps the nullable
//! `initialBalance`/`currentBalance` fields of existing backup documents;
//! [`Card::kind`] is the typed view over them.

use crate::money::Money;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Days before expiry within which a card counts as "expiring soon".
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Classification of a card, derived from its balance fields.
///
/// A card whose `currentBalance` is absent or exactly zero is a fidelity
/// card. The zero case is deliberate: zeroing a balance demotes the card
/// to a fidelity card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    /// Loyalty card with no balance tracking.
    Fidelity,

    /// Card tracking a spendable balance.
    Balanced(Money),
}

/// Transaction type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    /// Initial funding recorded at card creation.
    Initial,

    /// A purchase against the balance.
    Spend,

    /// Balance set to an arbitrary non-negative value.
    Reset,
}

/// A ledger entry attached to exactly one card. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Timestamp of creation.
    pub date: DateTime<Utc>,

    /// Signed delta applied to the balance (negative for spends).
    pub amount: Money,

    /// Transaction type.
    #[serde(rename = "type")]
    pub tx_type: TxType,

    /// The card's balance immediately after this transaction.
    pub balance_after: Money,

    /// Free-text label; a generic default is filled in when omitted.
    #[serde(default)]
    pub description: String,
}

impl Transaction {
    /// The `initial` entry seeding a balance-bearing card's log.
    pub fn initial(amount: Money) -> Self {
        Transaction {
            date: Utc::now(),
            amount,
            tx_type: TxType::Initial,
            balance_after: amount,
            description: "Initial balance".to_string(),
        }
    }

    /// A `spend` entry. `amount` is the positive amount spent.
    pub fn spend(amount: Money, balance_after: Money, description: Option<&str>) -> Self {
        let description = match description {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => "Purchase".to_string(),
        };
        Transaction {
            date: Utc::now(),
            amount: -amount,
            tx_type: TxType::Spend,
            balance_after,
            description,
        }
    }

    /// A `reset` entry recording the delta from the prior balance.
    pub fn reset(delta: Money, balance_after: Money) -> Self {
        Transaction {
            date: Utc::now(),
            amount: delta,
            tx_type: TxType::Reset,
            balance_after,
            description: "Balance reset".to_string(),
        }
    }
}

/// Barcode symbology selector. A rendering hint only; it has no effect
/// on ledger logic and is carried losslessly through import/export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[default]
    #[serde(rename = "CODE128")]
    Code128,
    #[serde(rename = "CODE39")]
    Code39,
    #[serde(rename = "EAN13")]
    Ean13,
    #[serde(rename = "EAN8")]
    Ean8,
    #[serde(rename = "UPC")]
    Upc,
    #[serde(rename = "ITF14")]
    Itf14,
    #[serde(rename = "MSI")]
    Msi,
    #[serde(rename = "CODABAR")]
    Codabar,
}

impl BarcodeFormat {
    /// The wire name of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            BarcodeFormat::Code128 => "CODE128",
            BarcodeFormat::Code39 => "CODE39",
            BarcodeFormat::Ean13 => "EAN13",
            BarcodeFormat::Ean8 => "EAN8",
            BarcodeFormat::Upc => "UPC",
            BarcodeFormat::Itf14 => "ITF14",
            BarcodeFormat::Msi => "MSI",
            BarcodeFormat::Codabar => "CODABAR",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarcodeFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CODE128" => Ok(BarcodeFormat::Code128),
            "CODE39" => Ok(BarcodeFormat::Code39),
            "EAN13" => Ok(BarcodeFormat::Ean13),
            "EAN8" => Ok(BarcodeFormat::Ean8),
            "UPC" => Ok(BarcodeFormat::Upc),
            "ITF14" => Ok(BarcodeFormat::Itf14),
            "MSI" => Ok(BarcodeFormat::Msi),
            "CODABAR" => Ok(BarcodeFormat::Codabar),
            other => Err(format!("unknown barcode format '{}'", other)),
        }
    }
}

/// One physical or virtual card.
///
/// # Invariants
///
/// - For balance-bearing cards, `current_balance` equals the
///   `balance_after` of the most recently appended transaction.
/// - `current_balance` never goes negative.
/// - Fidelity cards have an empty transaction log.
/// - `number` is unique across the collection at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    /// Opaque unique identifier, assigned at creation, never reused.
    pub id: String,

    /// The card's printed/encoded identifier string.
    pub number: String,

    /// Free-text label used for display and store matching.
    pub name: String,

    /// Amount fixed at creation, or `None` for fidelity cards.
    #[serde(default)]
    pub initial_balance: Option<Money>,

    /// Running balance, mutated only by ledger operations.
    #[serde(default)]
    pub current_balance: Option<Money>,

    /// Barcode symbology hint.
    #[serde(default)]
    pub barcode_format: BarcodeFormat,

    /// Ordered-by-creation transaction log.
    pub transactions: Vec<Transaction>,

    /// Creation timestamp, immutable. Documents that predate the field
    /// get the import time.
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    /// Archived cards are excluded from the primary view but stay mutable.
    #[serde(default)]
    pub archived: bool,

    /// Expiry date; only meaningful for balance-bearing cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

impl Card {
    /// Creates a card with a fresh id and creation timestamp.
    ///
    /// A `Some` balance seeds the transaction log with one `initial`
    /// entry and attaches the expiry date if supplied; `None` produces a
    /// fidelity card with an empty log and no expiry.
    pub fn create(
        number: &str,
        name: &str,
        initial_balance: Option<Money>,
        expiry_date: Option<NaiveDate>,
    ) -> Self {
        let transactions = match initial_balance {
            Some(amount) => vec![Transaction::initial(amount)],
            None => Vec::new(),
        };

        Card {
            id: Uuid::new_v4().to_string(),
            number: number.trim().to_string(),
            name: name.trim().to_string(),
            initial_balance,
            current_balance: initial_balance,
            barcode_format: BarcodeFormat::default(),
            transactions,
            created_at: Utc::now(),
            archived: false,
            expiry_date: initial_balance.and(expiry_date),
        }
    }

    /// Classifies this card. `None` or zero `current_balance` means fidelity.
    pub fn kind(&self) -> CardKind {
        match self.current_balance {
            Some(balance) if !balance.is_zero() => CardKind::Balanced(balance),
            _ => CardKind::Fidelity,
        }
    }

    /// Returns `true` if this is a fidelity card (no balance tracking).
    pub fn is_fidelity(&self) -> bool {
        matches!(self.kind(), CardKind::Fidelity)
    }

    /// Returns `true` if the card's expiry date has passed.
    ///
    /// Always `false` for fidelity cards and cards without an expiry date.
    pub fn is_expired(&self) -> bool {
        self.is_expired_on(Local::now().date_naive())
    }

    /// Date-injected variant of [`Card::is_expired`].
    ///
    /// Compares calendar dates, not timestamps, so a card expiring today
    /// is not yet expired regardless of the time of day.
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        match (self.kind(), self.expiry_date) {
            (CardKind::Balanced(_), Some(expiry)) => expiry < today,
            _ => false,
        }
    }

    /// Returns `true` if the card expires within [`EXPIRY_WARNING_DAYS`].
    pub fn is_expiring_soon(&self) -> bool {
        self.is_expiring_soon_on(Local::now().date_naive(), EXPIRY_WARNING_DAYS)
    }

    /// Date-injected variant of [`Card::is_expiring_soon`].
    ///
    /// True when the days until expiry fall in `[0, threshold_days]`.
    pub fn is_expiring_soon_on(&self, today: NaiveDate, threshold_days: i64) -> bool {
        match (self.kind(), self.expiry_date) {
            (CardKind::Balanced(_), Some(expiry)) => {
                let days = (expiry - today).num_days();
                (0..=threshold_days).contains(&days)
            }
            _ => false,
        }
    }
}

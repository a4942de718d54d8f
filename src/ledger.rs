//! Core balance-ledger engine.
//!
//! Owns the card collection and enforces its invariants: a card's
//! current balance always equals the `balance_after` of its latest
//! transaction, spends never take a balance below zero, and fidelity
//! cards never accumulate transactions. Every mutating operation runs
//! validate -> mutate -> persist and either fully succeeds or leaves the
//! collection untouched.
//!
//! The ledger is single-owner and synchronous. Callers that share one
//! ledger across threads must wrap it in a single mutex scoped to whole
//! operations, import included.

use crate::card::{BarcodeFormat, Card, CardKind, Transaction};
use crate::codec::{self, ParsedBackup};
use crate::error::{LedgerError, Result};
use crate::money::Money;
use crate::storage::CardStore;
use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};

/// Outcome of a successful import, for caller display.
#[derive(Debug)]
pub struct ImportSummary {
    /// Number of cards now in the collection.
    pub imported: usize,

    /// Number of cards that were replaced.
    pub previous: usize,

    /// When the backup was taken, if the document said so.
    pub export_date: Option<DateTime<Utc>>,
}

/// The card ledger.
///
/// Holds the collection in user-controlled display order and persists it
/// through the injected [`CardStore`] after every mutation. Collection
/// iteration order is the display order; only [`Ledger::reorder`] changes
/// it.
pub struct Ledger<S: CardStore> {
    /// Cards in display order.
    cards: Vec<Card>,

    /// Persistence adapter, written after every mutating operation.
    store: S,
}

impl<S: CardStore> Ledger<S> {
    /// Opens a ledger over the given store, loading whatever it holds.
    pub fn open(store: S) -> Self {
        let cards = store.load();
        debug!("Loaded {} cards", cards.len());
        Ledger { cards, store }
    }

    /// All cards in display order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Cards shown in the primary view.
    pub fn active(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|card| !card.archived)
    }

    /// Archived cards.
    pub fn archived(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter().filter(|card| card.archived)
    }

    /// Looks up a card by id.
    pub fn find(&self, id: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// The persistence adapter.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.cards
            .iter()
            .position(|card| card.id == id)
            .ok_or_else(|| LedgerError::NotFound { id: id.to_string() })
    }

    /// Creates a card and appends it to the collection.
    ///
    /// `balance_input` is raw user input: empty, unparseable, or zero
    /// input produces a fidelity card (zeroing is the documented way to
    /// opt out of balance tracking); a positive decimal produces a
    /// balance-bearing card seeded with one `initial` transaction; a
    /// negative decimal is rejected. The card number must not match any
    /// existing card's, archived cards included (exact, case-sensitive).
    pub fn create_card(
        &mut self,
        number: &str,
        name: &str,
        balance_input: &str,
        expiry_date: Option<NaiveDate>,
    ) -> Result<&Card> {
        let number = number.trim();
        if self.cards.iter().any(|card| card.number == number) {
            return Err(LedgerError::DuplicateNumber {
                number: number.to_string(),
            });
        }

        let initial_balance = match Money::parse_input(balance_input) {
            Some(amount) if amount.is_negative() => {
                return Err(LedgerError::InvalidAmount {
                    input: balance_input.to_string(),
                })
            }
            Some(amount) if amount.is_zero() => None,
            Some(amount) => Some(amount),
            None => None,
        };

        let card = Card::create(number, name, initial_balance, expiry_date);
        debug!(
            "Created {} card '{}' ({})",
            if card.is_fidelity() { "fidelity" } else { "gift" },
            card.name,
            card.id
        );

        self.cards.push(card);
        self.store.save(&self.cards);

        Ok(self.cards.last().expect("card exists"))
    }

    /// Records a spend against a balance-bearing card.
    ///
    /// The amount must be positive and must not exceed the current
    /// balance; a spend that would go negative is rejected outright and
    /// the card is left unchanged.
    pub fn record_spend(
        &mut self,
        id: &str,
        amount: Money,
        description: Option<&str>,
    ) -> Result<&Transaction> {
        if !amount.is_positive() {
            return Err(LedgerError::InvalidAmount {
                input: amount.to_string(),
            });
        }

        let index = self.position(id)?;
        let balance = match self.cards[index].kind() {
            CardKind::Fidelity => {
                return Err(LedgerError::FidelityCard { id: id.to_string() })
            }
            CardKind::Balanced(balance) => balance,
        };

        if amount > balance {
            return Err(LedgerError::InsufficientBalance { amount, balance });
        }

        let new_balance = balance - amount;
        let card = &mut self.cards[index];
        card.transactions
            .push(Transaction::spend(amount, new_balance, description));
        card.current_balance = Some(new_balance);

        debug!("Spent {} on card {}, balance now {}", amount, id, new_balance);
        self.store.save(&self.cards);

        Ok(self.cards[index]
            .transactions
            .last()
            .expect("transaction exists"))
    }

    /// Sets a balance-bearing card's balance to an arbitrary non-negative
    /// value, recording the delta from the prior balance.
    ///
    /// This is the only operation that can increase a balance after
    /// creation. The delta may be zero or negative. Resetting to zero
    /// demotes the card to a fidelity card.
    pub fn reset_balance(&mut self, id: &str, new_balance: Money) -> Result<&Transaction> {
        if new_balance.is_negative() {
            return Err(LedgerError::InvalidAmount {
                input: new_balance.to_string(),
            });
        }

        let index = self.position(id)?;
        let balance = match self.cards[index].kind() {
            CardKind::Fidelity => {
                return Err(LedgerError::FidelityCard { id: id.to_string() })
            }
            CardKind::Balanced(balance) => balance,
        };

        let delta = new_balance - balance;
        let card = &mut self.cards[index];
        card.transactions.push(Transaction::reset(delta, new_balance));
        card.current_balance = Some(new_balance);

        debug!("Reset card {} balance to {}", id, new_balance);
        self.store.save(&self.cards);

        Ok(self.cards[index]
            .transactions
            .last()
            .expect("transaction exists"))
    }

    /// Hides a card from the primary view. No effect on its balance or
    /// transactions.
    pub fn archive(&mut self, id: &str) -> Result<()> {
        self.set_archived(id, true)
    }

    /// Restores an archived card to the primary view.
    pub fn unarchive(&mut self, id: &str) -> Result<()> {
        self.set_archived(id, false)
    }

    fn set_archived(&mut self, id: &str, archived: bool) -> Result<()> {
        let index = self.position(id)?;
        self.cards[index].archived = archived;
        self.store.save(&self.cards);
        Ok(())
    }

    /// Permanently removes a card and its transactions. Irreversible.
    pub fn delete_card(&mut self, id: &str) -> Result<()> {
        let index = self.position(id)?;
        let card = self.cards.remove(index);
        info!("Deleted card '{}' ({})", card.name, card.id);
        self.store.save(&self.cards);
        Ok(())
    }

    /// Moves the dragged card to the target card's position. Card fields
    /// are untouched; only the display order changes.
    pub fn reorder(&mut self, dragged_id: &str, target_id: &str) -> Result<()> {
        let from = self.position(dragged_id)?;
        let to = self.position(target_id)?;
        if from == to {
            return Ok(());
        }

        let card = self.cards.remove(from);
        self.cards.insert(to, card);
        self.store.save(&self.cards);
        Ok(())
    }

    /// Switches a card's barcode symbology hint.
    pub fn set_barcode_format(&mut self, id: &str, format: BarcodeFormat) -> Result<()> {
        let index = self.position(id)?;
        self.cards[index].barcode_format = format;
        self.store.save(&self.cards);
        Ok(())
    }

    /// Serializes the collection to a backup document.
    pub fn export_json(&self) -> Result<String> {
        codec::export_json(&self.cards)
    }

    /// Validates a backup document and, if it is fully valid, replaces
    /// the entire collection with its cards and persists.
    ///
    /// Callers are expected to confirm the replacement with the user
    /// (old count vs. new count) before invoking this; the replace
    /// itself is unconditional and has no partial-merge mode.
    pub fn import_document(&mut self, json: &str) -> Result<ImportSummary> {
        let ParsedBackup { cards, export_date } = codec::parse(json)?;

        let previous = self.cards.len();
        let imported = cards.len();
        self.cards = cards;
        self.store.save(&self.cards);

        info!("Imported {} cards, replacing {}", imported, previous);
        Ok(ImportSummary {
            imported,
            previous,
            export_date,
        })
    }
}

//! Backup document import/export.
//!
//! Exports serialize the collection verbatim under a versioned envelope;
//! exporting and immediately re-importing is a no-op on the collection.
//! Imports validate untrusted documents strictly and fail fast on the
//! first offending card; nothing is applied unless the whole document is
//! valid.

use crate::card::Card;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;

/// Version written into every export envelope.
pub const EXPORT_VERSION: &str = "1.0";

/// The export envelope: version, export timestamp, and the collection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument<'a> {
    pub version: &'static str,
    pub export_date: DateTime<Utc>,
    pub cards: &'a [Card],
}

/// Wraps the collection in an export envelope stamped with the current time.
pub fn export(cards: &[Card]) -> BackupDocument<'_> {
    BackupDocument {
        version: EXPORT_VERSION,
        export_date: Utc::now(),
        cards,
    }
}

/// Serializes the collection to a pretty-printed backup document.
pub fn export_json(cards: &[Card]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export(cards))?)
}

/// Suggested download filename for a backup taken at `now`:
/// `gift-cards-backup-<YYYY-MM-DDTHH-MM-SS>.json` (colons replaced, no
/// milliseconds or timezone suffix).
pub fn backup_filename(now: DateTime<Utc>) -> String {
    format!("gift-cards-backup-{}.json", now.format("%Y-%m-%dT%H-%M-%S"))
}

/// A validated backup document ready to replace the collection.
#[derive(Debug)]
pub struct ParsedBackup {
    /// The cards to import, in document order.
    pub cards: Vec<Card>,

    /// The document's export timestamp, if present and valid. `None` is
    /// the "unknown date" sentinel for display, never an error.
    pub export_date: Option<DateTime<Utc>>,
}

/// Parses and validates an untrusted backup document.
///
/// Validation order per card: `id`, `number`, `name` must be non-empty
/// strings; `transactions` must be an array; `initialBalance` and
/// `currentBalance` must be null, absent, or a number. The first
/// violation aborts the whole import with [`LedgerError::FieldInvalid`].
/// A document without a `cards` array, or one whose cards fail typed
/// decoding beyond these checks, is [`LedgerError::SchemaInvalid`].
pub fn parse(json: &str) -> Result<ParsedBackup> {
    let doc: Value =
        serde_json::from_str(json).map_err(|e| LedgerError::SchemaInvalid(e.to_string()))?;

    let raw_cards = doc
        .get("cards")
        .and_then(Value::as_array)
        .ok_or_else(|| LedgerError::SchemaInvalid("missing 'cards' array".to_string()))?;

    for raw in raw_cards {
        validate_card(raw)?;
    }

    let mut cards = Vec::with_capacity(raw_cards.len());
    for raw in raw_cards {
        cards.push(decode_card(raw)?);
    }

    let export_date = doc.get("exportDate").and_then(parse_export_date);

    Ok(ParsedBackup { cards, export_date })
}

/// Reads the envelope timestamp: an RFC 3339 string (our exports) or an
/// epoch-milliseconds number (documents written by other tooling).
fn parse_export_date(value: &Value) -> Option<DateTime<Utc>> {
    if let Some(s) = value.as_str() {
        return DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }
    value
        .as_i64()
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
}

fn validate_card(raw: &Value) -> Result<()> {
    for field in ["id", "number", "name"] {
        let valid = raw
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|s| !s.trim().is_empty());
        if !valid {
            return Err(LedgerError::FieldInvalid { field });
        }
    }

    if !raw.get("transactions").is_some_and(Value::is_array) {
        return Err(LedgerError::FieldInvalid {
            field: "transactions",
        });
    }

    for field in ["initialBalance", "currentBalance"] {
        // null or absent marks a fidelity card; otherwise it must be a number
        match raw.get(field) {
            None => {}
            Some(value) if value.is_null() || value.is_number() => {}
            Some(_) => return Err(LedgerError::FieldInvalid { field }),
        }
    }

    Ok(())
}

/// Decodes a validated card value, defaulting a missing `archived` flag
/// to `false` for documents that predate the archive feature. This is
/// the only place a field default is applied on import.
fn decode_card(raw: &Value) -> Result<Card> {
    let mut raw = raw.clone();
    if let Some(obj) = raw.as_object_mut() {
        obj.entry("archived").or_insert(Value::Bool(false));
    }
    serde_json::from_value(raw).map_err(|e| LedgerError::SchemaInvalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn money(s: &str) -> Money {
        Money::from_str(s).unwrap()
    }

    fn sample_cards() -> Vec<Card> {
        let mut balanced = Card::create("111", "Cafe", Some(money("50")), None);
        balanced.archived = true;
        let fidelity = Card::create("222", "Loyalty", None, None);
        vec![balanced, fidelity]
    }

    #[test]
    fn test_export_import_round_trip() {
        let cards = sample_cards();
        let json = export_json(&cards).unwrap();

        let parsed = parse(&json).unwrap();
        assert_eq!(parsed.cards, cards);
        assert!(parsed.export_date.is_some());
    }

    #[test]
    fn test_export_envelope_shape() {
        let cards = sample_cards();
        let value: Value = serde_json::from_str(&export_json(&cards).unwrap()).unwrap();

        assert_eq!(value["version"], EXPORT_VERSION);
        assert!(value["exportDate"].is_string());
        assert_eq!(value["cards"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_cards_is_schema_invalid() {
        assert!(matches!(
            parse(r#"{"version":"1.0"}"#),
            Err(LedgerError::SchemaInvalid(_))
        ));
        assert!(matches!(
            parse(r#"{"cards":"nope"}"#),
            Err(LedgerError::SchemaInvalid(_))
        ));
        assert!(matches!(
            parse("not json at all"),
            Err(LedgerError::SchemaInvalid(_))
        ));
    }

    #[test]
    fn test_field_validation_order_and_names() {
        let base = r#"{"cards":[{"id":"1","number":"111","name":"Cafe","transactions":[]}]}"#;
        assert!(parse(base).is_ok());

        let cases = [
            (r#"{"cards":[{}]}"#, "id"),
            (r#"{"cards":[{"id":"  "}]}"#, "id"),
            (r#"{"cards":[{"id":"1"}]}"#, "number"),
            (r#"{"cards":[{"id":"1","number":"111"}]}"#, "name"),
            (
                r#"{"cards":[{"id":"1","number":"111","name":"Cafe"}]}"#,
                "transactions",
            ),
            (
                r#"{"cards":[{"id":"1","number":"111","name":"Cafe","transactions":{}}]}"#,
                "transactions",
            ),
            (
                r#"{"cards":[{"id":"1","number":"111","name":"Cafe","transactions":[],"initialBalance":"50"}]}"#,
                "initialBalance",
            ),
            (
                r#"{"cards":[{"id":"1","number":"111","name":"Cafe","transactions":[],"currentBalance":true}]}"#,
                "currentBalance",
            ),
        ];

        for (json, expected) in cases {
            match parse(json) {
                Err(LedgerError::FieldInvalid { field }) => assert_eq!(field, expected),
                other => panic!("expected FieldInvalid({}), got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_first_invalid_card_aborts_import() {
        // second card is broken: nothing from the document is usable
        let json = r#"{"cards":[
            {"id":"1","number":"111","name":"Cafe","transactions":[]},
            {"id":"2","number":"222","name":"Bad","transactions":"x"}
        ]}"#;

        assert!(matches!(
            parse(json),
            Err(LedgerError::FieldInvalid {
                field: "transactions"
            })
        ));
    }

    #[test]
    fn test_missing_archived_defaults_to_false() {
        let json = r#"{"cards":[{"id":"1","number":"111","name":"Cafe","transactions":[]}]}"#;
        let parsed = parse(json).unwrap();
        assert!(!parsed.cards[0].archived);

        let json = r#"{"cards":[{"id":"1","number":"111","name":"Cafe","transactions":[],"archived":true}]}"#;
        let parsed = parse(json).unwrap();
        assert!(parsed.cards[0].archived);
    }

    #[test]
    fn test_invalid_export_date_is_not_an_error() {
        let json = r#"{"exportDate":"yesterday","cards":[]}"#;
        let parsed = parse(json).unwrap();
        assert!(parsed.export_date.is_none());

        let json = r#"{"cards":[]}"#;
        assert!(parse(json).unwrap().export_date.is_none());

        let json = r#"{"exportDate":"2026-01-02T03:04:05Z","cards":[]}"#;
        let parsed = parse(json).unwrap();
        assert_eq!(
            parsed.export_date,
            Some(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
        );
    }

    #[test]
    fn test_numeric_export_date_is_epoch_milliseconds() {
        let json = r#"{"exportDate":1767323045000,"cards":[]}"#;
        let parsed = parse(json).unwrap();
        assert_eq!(
            parsed.export_date,
            Some(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
        );

        // non-integer numbers stay in the unknown-date sentinel
        let json = r#"{"exportDate":1.5,"cards":[]}"#;
        assert!(parse(json).unwrap().export_date.is_none());
    }

    #[test]
    fn test_backup_filename_format() {
        let now = Utc.with_ymd_and_hms(2026, 8, 23, 14, 5, 9).unwrap();
        assert_eq!(
            backup_filename(now),
            "gift-cards-backup-2026-08-23T14-05-09.json"
        );
    }
}

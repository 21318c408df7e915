//! Validation engine for canonical event collections.
//!
//! `validate` is a pure function: it never mutates, drops, or reorders the
//! input, it only reports. Whether a non-empty report blocks anything is the
//! exporter's decision, not this module's.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{fractional_digits, EventTimestamp, MAX_FRACTIONAL_DIGITS};
use crate::{Event, EventCategory};

/// Positional, advisory finding against one record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub row_index: usize,
    pub field: &'static str,
    pub message: String,
    pub offending_value: String,
}

impl ValidationError {
    fn new(
        row_index: usize,
        field: &'static str,
        message: impl Into<String>,
        offending_value: impl Into<String>,
    ) -> Self {
        Self {
            row_index,
            field,
            message: message.into(),
            offending_value: offending_value.into(),
        }
    }
}

/// Validates a collection of events and returns every violation found.
///
/// Per-event rules cover the timestamp format, required fields, decimal
/// precision, and the category-specific pnl/fee invariants. The one
/// cross-event rule is `external_id` uniqueness: the first occurrence wins
/// and every later duplicate is reported against the first row.
///
/// The category itself is a closed enum and cannot hold an out-of-set value,
/// so no rule for it appears here. Amounts are `Decimal` and therefore
/// always finite.
pub fn validate(events: &[Event]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for (row_index, event) in events.iter().enumerate() {
        check_timestamp(row_index, event, &mut errors);
        check_asset(row_index, event, &mut errors);
        check_quantity(row_index, "amount", event.amount, &mut errors);
        check_quantity(row_index, "fee", event.fee, &mut errors);
        check_pnl_precision(row_index, event.realized_pnl, &mut errors);
        check_external_id(row_index, event, &mut errors);
        check_settlement_token(row_index, event, &mut errors);
        check_category_invariants(row_index, event, &mut errors);

        if event.external_id.is_empty() {
            continue;
        }
        match first_seen.get(event.external_id.as_str()) {
            None => {
                first_seen.insert(event.external_id.as_str(), row_index);
            }
            Some(&first_row) => {
                errors.push(ValidationError::new(
                    first_row,
                    "externalId",
                    format!(
                        "duplicate externalId '{}' also appears at row {row_index}",
                        event.external_id
                    ),
                    event.external_id.clone(),
                ));
            }
        }
    }

    errors
}

fn check_timestamp(row_index: usize, event: &Event, errors: &mut Vec<ValidationError>) {
    if let Err(error) = EventTimestamp::parse(&event.timestamp) {
        errors.push(ValidationError::new(
            row_index,
            "timestamp",
            error.to_string(),
            event.timestamp.clone(),
        ));
    }
}

fn check_asset(row_index: usize, event: &Event, errors: &mut Vec<ValidationError>) {
    if event.asset.trim().is_empty() {
        errors.push(ValidationError::new(
            row_index,
            "asset",
            "asset must not be empty",
            event.asset.clone(),
        ));
    }
}

fn check_quantity(
    row_index: usize,
    field: &'static str,
    value: Decimal,
    errors: &mut Vec<ValidationError>,
) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.push(ValidationError::new(
            row_index,
            field,
            format!("{field} must be non-negative"),
            value.to_string(),
        ));
    }

    if fractional_digits(value) > MAX_FRACTIONAL_DIGITS {
        errors.push(ValidationError::new(
            row_index,
            field,
            format!("{field} exceeds {MAX_FRACTIONAL_DIGITS} decimal places"),
            value.to_string(),
        ));
    }
}

fn check_pnl_precision(row_index: usize, value: Decimal, errors: &mut Vec<ValidationError>) {
    if fractional_digits(value) > MAX_FRACTIONAL_DIGITS {
        errors.push(ValidationError::new(
            row_index,
            "pnl",
            format!("pnl exceeds {MAX_FRACTIONAL_DIGITS} decimal places"),
            value.to_string(),
        ));
    }
}

fn check_external_id(row_index: usize, event: &Event, errors: &mut Vec<ValidationError>) {
    if event.external_id.is_empty() {
        errors.push(ValidationError::new(
            row_index,
            "externalId",
            "externalId must not be empty",
            String::new(),
        ));
    }
}

fn check_settlement_token(row_index: usize, event: &Event, errors: &mut Vec<ValidationError>) {
    if !event.category.requires_settlement_token() {
        return;
    }

    let missing = event
        .settlement_token
        .as_deref()
        .is_none_or(|token| token.trim().is_empty());
    if missing {
        errors.push(ValidationError::new(
            row_index,
            "settlementToken",
            format!(
                "settlementToken is required for {} events",
                event.category.as_str()
            ),
            event.settlement_token.clone().unwrap_or_default(),
        ));
    }
}

fn check_category_invariants(row_index: usize, event: &Event, errors: &mut Vec<ValidationError>) {
    let pnl = event.realized_pnl;
    let fee = event.fee;

    match event.category {
        EventCategory::OpenPosition => {
            if !pnl.is_zero() {
                errors.push(ValidationError::new(
                    row_index,
                    "pnl",
                    "open_position events must carry zero pnl",
                    pnl.to_string(),
                ));
            }
        }
        EventCategory::StakingReward => {
            if pnl <= Decimal::ZERO {
                errors.push(ValidationError::new(
                    row_index,
                    "pnl",
                    "staking_reward events must carry positive pnl",
                    pnl.to_string(),
                ));
            }
            if !fee.is_zero() {
                errors.push(ValidationError::new(
                    row_index,
                    "fee",
                    "staking_reward events must carry zero fee",
                    fee.to_string(),
                ));
            }
        }
        EventCategory::Slashing => {
            if pnl >= Decimal::ZERO {
                errors.push(ValidationError::new(
                    row_index,
                    "pnl",
                    "slashing events must carry negative pnl",
                    pnl.to_string(),
                ));
            }
            if !fee.is_zero() {
                errors.push(ValidationError::new(
                    row_index,
                    "fee",
                    "slashing events must carry zero fee",
                    fee.to_string(),
                ));
            }
        }
        EventCategory::ClosePosition | EventCategory::FundingPayment => {}
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn reward(external_id: &str) -> Event {
        Event {
            timestamp: String::from("06/01/2021 00:00:00"),
            asset: String::from("ATOM"),
            amount: dec!(1.5),
            fee: Decimal::ZERO,
            realized_pnl: dec!(1.5),
            settlement_token: Some(String::from("ATOM")),
            notes: String::new(),
            external_id: external_id.to_owned(),
            category: EventCategory::StakingReward,
        }
    }

    #[test]
    fn clean_collection_produces_no_errors() {
        let events = vec![reward("tx-1"), reward("tx-2")];
        assert!(validate(&events).is_empty());
    }

    #[test]
    fn validation_is_idempotent() {
        let mut bad = reward("tx-1");
        bad.amount = dec!(1.234567891);
        let events = vec![bad, reward("tx-1")];

        assert_eq!(validate(&events), validate(&events));
    }

    #[test]
    fn nine_fractional_digits_flag_amount() {
        let mut event = reward("tx-1");
        event.amount = dec!(1.23456789);
        assert!(validate(&[event.clone()]).is_empty());

        event.amount = dec!(1.234567891);
        let errors = validate(&[event]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "amount");
        assert_eq!(errors[0].message, "amount exceeds 8 decimal places");
    }

    #[test]
    fn duplicate_external_id_reported_once_against_first_row() {
        let first = reward("tx-x");
        let mut second = reward("tx-x");
        second.asset = String::from("OSMO");
        second.settlement_token = Some(String::from("OSMO"));

        let errors = validate(&[first, second]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row_index, 0);
        assert_eq!(errors[0].field, "externalId");
    }

    #[test]
    fn triple_duplicate_reports_each_later_occurrence() {
        let errors = validate(&[reward("tx-x"), reward("tx-x"), reward("tx-x")]);
        let duplicates: Vec<_> = errors
            .iter()
            .filter(|error| error.message.starts_with("duplicate"))
            .collect();
        assert_eq!(duplicates.len(), 2);
        assert!(duplicates.iter().all(|error| error.row_index == 0));
    }

    #[test]
    fn open_position_with_nonzero_pnl_is_flagged() {
        let event = Event {
            timestamp: String::from("03/15/2024 12:00:00"),
            asset: String::from("SOL"),
            amount: dec!(10),
            fee: dec!(0.01),
            realized_pnl: dec!(2),
            settlement_token: Some(String::from("USDC")),
            notes: String::new(),
            external_id: String::from("fill-1"),
            category: EventCategory::OpenPosition,
        };

        let errors = validate(&[event]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "pnl");
    }

    #[test]
    fn staking_reward_with_fee_is_flagged() {
        let mut event = reward("tx-1");
        event.fee = dec!(0.1);

        let errors = validate(&[event]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "fee");
    }

    #[test]
    fn slashing_with_non_negative_pnl_is_flagged() {
        let mut event = reward("tx-1");
        event.category = EventCategory::Slashing;
        event.realized_pnl = Decimal::ZERO;

        let errors = validate(&[event]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "pnl");
        assert_eq!(errors[0].message, "slashing events must carry negative pnl");
    }

    #[test]
    fn missing_settlement_token_flagged_for_required_categories() {
        let mut event = reward("tx-1");
        event.settlement_token = None;
        let errors = validate(&[event]);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "settlementToken");

        let open = Event {
            timestamp: String::from("03/15/2024 12:00:00"),
            asset: String::from("SOL"),
            amount: dec!(10),
            fee: Decimal::ZERO,
            realized_pnl: Decimal::ZERO,
            settlement_token: None,
            notes: String::new(),
            external_id: String::from("fill-1"),
            category: EventCategory::OpenPosition,
        };
        assert!(validate(&[open]).is_empty());
    }

    #[test]
    fn malformed_timestamp_and_empty_fields_are_reported() {
        let event = Event {
            timestamp: String::from("2024-03-15 12:00:00"),
            asset: String::from("  "),
            amount: dec!(-1),
            fee: Decimal::ZERO,
            realized_pnl: dec!(1),
            settlement_token: Some(String::from("ATOM")),
            notes: String::new(),
            external_id: String::new(),
            category: EventCategory::StakingReward,
        };

        let errors = validate(&[event]);
        let fields: Vec<_> = errors.iter().map(|error| error.field).collect();
        assert!(fields.contains(&"timestamp"));
        assert!(fields.contains(&"asset"));
        assert!(fields.contains(&"amount"));
        assert!(fields.contains(&"externalId"));
    }
}

//! Validation engine behavior over canonical event collections.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use chainledger_core::{fractional_digits, parse_decimal};
use chainledger_tests::*;

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
fn validation_reports_without_mutating_or_dropping() {
    let events = vec![reward("tx-1"), reward("tx-1"), reward("tx-2")];
    let snapshot = events.clone();

    let errors = validate(&events);
    assert_eq!(events, snapshot);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].row_index, 0, "duplicate is reported against the first row");
    assert_eq!(errors[0].field, "externalId");

    assert_eq!(validate(&events), errors, "validation is idempotent");
}

#[test]
fn precision_boundary_is_exactly_eight_fractional_digits() {
    let mut event = reward("tx-1");
    event.amount = dec!(0.12345678);
    assert!(validate(std::slice::from_ref(&event)).is_empty());

    event.amount = dec!(0.123456789);
    let errors = validate(&[event]);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "amount");
}

#[test]
fn scientific_notation_counts_effective_digits() {
    let fine = parse_decimal("2.5e-7").expect("parses");
    assert_eq!(fractional_digits(fine), 8);

    let over = parse_decimal("1e-9").expect("parses");
    assert_eq!(fractional_digits(over), 9);

    let mut event = reward("tx-1");
    event.realized_pnl = over;
    event.amount = over;
    let errors = validate(&[event]);
    let fields: Vec<_> = errors.iter().map(|error| error.field).collect();
    assert!(fields.contains(&"amount"));
    assert!(fields.contains(&"pnl"));
}

#[test]
fn calendar_validity_is_enforced_not_just_shape() {
    let mut event = reward("tx-1");
    event.timestamp = String::from("02/29/2024 10:00:00");
    assert!(validate(std::slice::from_ref(&event)).is_empty(), "leap day is valid");

    for bad in ["02/29/2023 10:00:00", "13/01/2024 10:00:00", "06/01/1999 00:00:00"] {
        event.timestamp = String::from(bad);
        let errors = validate(std::slice::from_ref(&event));
        assert_eq!(errors.len(), 1, "{bad} must be rejected");
        assert_eq!(errors[0].field, "timestamp");
    }
}

#[test]
fn category_invariants_hold_per_event() {
    let mut open = reward("tx-1");
    open.category = EventCategory::OpenPosition;
    open.realized_pnl = dec!(1);
    let errors = validate(&[open]);
    assert!(errors.iter().any(|e| e.field == "pnl"));

    let mut slashed = reward("tx-2");
    slashed.category = EventCategory::Slashing;
    slashed.realized_pnl = dec!(0.5);
    slashed.fee = dec!(0.01);
    let errors = validate(&[slashed]);
    assert!(errors.iter().any(|e| e.field == "pnl"));
    assert!(errors.iter().any(|e| e.field == "fee"));

    let mut reward_with_fee = reward("tx-3");
    reward_with_fee.fee = dec!(0.1);
    let errors = validate(&[reward_with_fee]);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "fee");
}

#[test]
fn settlement_token_is_required_except_for_opens() {
    let mut missing = reward("tx-1");
    missing.settlement_token = None;
    let errors = validate(&[missing]);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, "settlementToken");

    let open = Event {
        timestamp: String::from("03/15/2024 12:00:00"),
        asset: String::from("SOL"),
        amount: dec!(10),
        fee: dec!(0.01),
        realized_pnl: Decimal::ZERO,
        settlement_token: None,
        notes: String::new(),
        external_id: String::from("fill-1"),
        category: EventCategory::OpenPosition,
    };
    assert!(validate(&[open]).is_empty());
}

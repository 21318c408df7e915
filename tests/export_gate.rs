//! Export gating: nothing leaves the system while validation errors remain.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use chainledger_core::parse_decimal;
use chainledger_tests::*;

fn reward(external_id: &str) -> Event {
    Event {
        timestamp: String::from("06/01/2021 00:00:00"),
        asset: String::from("ATOM"),
        amount: dec!(1.5),
        fee: Decimal::ZERO,
        realized_pnl: dec!(1.5),
        settlement_token: Some(String::from("ATOM")),
        notes: String::from("delegation reward"),
        external_id: external_id.to_owned(),
        category: EventCategory::StakingReward,
    }
}

#[tokio::test]
async fn fetched_collection_exports_once_validation_is_clean() {
    let aggregator = default_aggregator();
    let report = aggregator
        .events(&source("cosmoshub"), &account(COSMOS_ACCOUNT), None)
        .await
        .expect("events succeed");
    assert!(report.validation_errors.is_empty());

    let csv = export_csv(&report.events, &report.validation_errors).expect("export succeeds");
    assert_eq!(csv.lines().count(), report.events.len() + 1);
    assert!(csv.starts_with("date,asset,amount,fee,pnl,paymentToken,notes,externalId,category"));
}

#[test]
fn a_single_validation_error_refuses_the_whole_export() {
    let mut overprecise = reward("tx-2");
    overprecise.amount = dec!(0.123456789);
    let events = vec![reward("tx-1"), overprecise];

    let errors = validate(&events);
    assert_eq!(errors.len(), 1);

    let refused = export_csv(&events, &errors).expect_err("must refuse");
    assert!(refused.to_string().contains("export refused"));
    assert!(export_json(&events, &errors).is_err());
}

#[test]
fn empty_clean_collection_exports_header_only() {
    let csv = export_csv(&[], &[]).expect("export succeeds");
    assert_eq!(csv.lines().count(), 1);

    let json = export_json(&[], &[]).expect("export succeeds");
    assert_eq!(json, "[]");
}

#[test]
fn numeric_cells_are_truncated_never_rounded() {
    let mut event = reward("tx-1");
    event.amount = dec!(1.50000000);
    event.realized_pnl = dec!(1.50000000);
    let csv = export_csv(&[event], &[]).expect("export succeeds");
    let row = csv.lines().nth(1).expect("one data row");

    assert!(row.contains(",1.5,"));
    assert!(!row.contains("1.50000000"));
}

#[test]
fn csv_round_trips_for_plain_collections() {
    // No embedded quotes, commas, or newlines, so rows split cleanly.
    let events = vec![reward("tx-1"), reward("tx-2")];
    let csv = export_csv(&events, &[]).expect("export succeeds");

    let rebuilt: Vec<Event> = csv
        .lines()
        .skip(1)
        .map(|row| {
            let cells: Vec<&str> = row.split(',').collect();
            assert_eq!(cells.len(), 9);
            Event {
                timestamp: cells[0].to_owned(),
                asset: cells[1].to_owned(),
                amount: parse_decimal(cells[2]).expect("amount parses"),
                fee: parse_decimal(cells[3]).expect("fee parses"),
                realized_pnl: parse_decimal(cells[4]).expect("pnl parses"),
                settlement_token: (!cells[5].is_empty()).then(|| cells[5].to_owned()),
                notes: cells[6].to_owned(),
                external_id: cells[7].to_owned(),
                category: cells[8].parse().expect("category parses"),
            }
        })
        .collect();

    assert_eq!(rebuilt, events);
}

#[test]
fn cells_with_delimiters_survive_quoting() {
    let mut event = reward("tx-1");
    event.notes = String::from("reward, restaked \"auto\"");
    let csv = export_csv(&[event], &[]).expect("export succeeds");

    assert!(csv.contains("\"reward, restaked \"\"auto\"\"\""));
}

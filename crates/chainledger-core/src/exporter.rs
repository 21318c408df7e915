//! CSV and JSON export over a finalized event collection.
//!
//! Export is gated, not best-effort: while the collection's validation
//! report is non-empty, both forms refuse outright. Numeric cells use the
//! truncating fixed-point rendering; nothing here ever rounds.

use serde::Serialize;

use crate::domain::render_fixed;
use crate::validation::ValidationError;
use crate::Event;

/// Column order shared by both export forms.
pub const EXPORT_COLUMNS: [&str; 9] = [
    "date",
    "asset",
    "amount",
    "fee",
    "pnl",
    "paymentToken",
    "notes",
    "externalId",
    "category",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The collection still has validation errors; nothing is written.
    #[error("export refused: {error_count} validation error(s) remain")]
    Refused { error_count: usize },
    #[error("export serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Serialize)]
struct ExportRow<'a> {
    date: &'a str,
    asset: &'a str,
    amount: String,
    fee: String,
    pnl: String,
    #[serde(rename = "paymentToken")]
    payment_token: Option<&'a str>,
    notes: &'a str,
    #[serde(rename = "externalId")]
    external_id: &'a str,
    category: &'a str,
}

impl<'a> ExportRow<'a> {
    fn from_event(event: &'a Event) -> Self {
        Self {
            date: &event.timestamp,
            asset: &event.asset,
            amount: render_fixed(event.amount),
            fee: render_fixed(event.fee),
            pnl: render_fixed(event.realized_pnl),
            payment_token: event.settlement_token.as_deref(),
            notes: &event.notes,
            external_id: &event.external_id,
            category: event.category.as_str(),
        }
    }
}

/// Renders the collection as CSV.
///
/// An empty, clean collection exports as the header line alone. Cells
/// containing a comma, quote, or line break are quoted with internal quotes
/// doubled, so spreadsheet-hostile values survive a round trip unmodified.
pub fn export_csv(events: &[Event], errors: &[ValidationError]) -> Result<String, ExportError> {
    refuse_if_invalid(errors)?;

    let mut out = EXPORT_COLUMNS.join(",");
    out.push('\n');
    for event in events {
        let row = ExportRow::from_event(event);
        let cells = [
            escape_csv(row.date),
            escape_csv(row.asset),
            escape_csv(&row.amount),
            escape_csv(&row.fee),
            escape_csv(&row.pnl),
            escape_csv(row.payment_token.unwrap_or_default()),
            escape_csv(row.notes),
            escape_csv(row.external_id),
            escape_csv(row.category),
        ];
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    Ok(out)
}

/// Renders the collection as a JSON array with the CSV's field names and
/// order. An empty, clean collection exports as `[]`.
pub fn export_json(events: &[Event], errors: &[ValidationError]) -> Result<String, ExportError> {
    refuse_if_invalid(errors)?;

    let rows: Vec<ExportRow<'_>> = events.iter().map(ExportRow::from_event).collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

fn refuse_if_invalid(errors: &[ValidationError]) -> Result<(), ExportError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ExportError::Refused {
            error_count: errors.len(),
        })
    }
}

fn escape_csv(cell: &str) -> String {
    if cell.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_owned()
    }
}

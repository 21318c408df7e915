use serde::Serialize;

use chainledger_core::{Aggregator, Event, Mode, SourceId, SourceReport, ValidationError};

use crate::cli::EventsArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventsResponseData {
    source: SourceId,
    source_name: String,
    mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode_annotation: Option<String>,
    truncated: bool,
    count: usize,
    events: Vec<Event>,
    validation_errors: Vec<ValidationError>,
}

pub async fn run(args: &EventsArgs, aggregator: &Aggregator) -> Result<CommandResult, CliError> {
    let source = super::parse_source(&args.source)?;
    let account = super::parse_account(&args.account)?;
    let credentials = super::parse_credentials(args.api_key.as_deref())?;

    let report = aggregator
        .events(&source, &account, credentials.as_ref())
        .await?;
    let warnings = report_warnings(&report);

    let data = serde_json::to_value(EventsResponseData {
        source: report.source.clone(),
        source_name: report.source_name,
        mode: report.mode,
        mode_annotation: report.mode_annotation,
        truncated: report.truncated,
        count: report.events.len(),
        events: report.events,
        validation_errors: report.validation_errors,
    })?;

    let mut result = CommandResult::ok(data, vec![report.source]);
    for warning in warnings {
        result = result.with_warning(warning);
    }
    Ok(result)
}

fn report_warnings(report: &SourceReport) -> Vec<String> {
    let mut warnings = Vec::new();
    match report.mode {
        Mode::Assisted => warnings.push(format!(
            "source '{}' is assisted: {}",
            report.source,
            report
                .mode_annotation
                .as_deref()
                .unwrap_or("validated events still need human review")
        )),
        Mode::Partial => warnings.push(format!(
            "source '{}' is partial: {}",
            report.source,
            report
                .mode_annotation
                .as_deref()
                .unwrap_or("only a subset of activity is exported")
        )),
        Mode::Strict | Mode::Blocked => {}
    }
    if report.truncated {
        warnings.push(format!(
            "source '{}' hit the page cap; the collection is a prefix of the history",
            report.source
        ));
    }
    if !report.validation_errors.is_empty() {
        warnings.push(format!(
            "{} validation error(s); the collection cannot be exported until they are resolved",
            report.validation_errors.len()
        ));
    }
    warnings
}

use serde::Serialize;

use chainledger_core::{
    Aggregator, BatchResult, Event, SourceId, SourceStatusEntry, ValidationError,
};

use crate::cli::BatchArgs;
use crate::envelope::EnvelopeError;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchResponseData {
    count: usize,
    duplicates_dropped: usize,
    merged_events: Vec<Event>,
    validation_errors: Vec<ValidationError>,
    per_source_status: Vec<StatusRow>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusRow {
    source: SourceId,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<EnvelopeError>,
}

impl StatusRow {
    fn from_entry(entry: &SourceStatusEntry) -> Self {
        Self {
            source: entry.source.clone(),
            status: entry.status.as_str(),
            error: entry
                .error
                .as_ref()
                .map(|error| EnvelopeError::from_fetch(error, Some(entry.source.clone()))),
        }
    }
}

pub async fn run(args: &BatchArgs, aggregator: &Aggregator) -> Result<CommandResult, CliError> {
    let sources = super::parse_sources(&args.sources)?;
    let account = super::parse_account(&args.account)?;
    let credentials = super::parse_credentials(args.api_key.as_deref())?;

    let result = aggregator
        .batch_events(&sources, &account, credentials.as_ref())
        .await?;

    to_command_result(&result)
}

fn to_command_result(result: &BatchResult) -> Result<CommandResult, CliError> {
    let errors: Vec<EnvelopeError> = result
        .statuses
        .iter()
        .filter_map(|entry| {
            entry
                .error
                .as_ref()
                .map(|error| EnvelopeError::from_fetch(error, Some(entry.source.clone())))
        })
        .collect();

    let source_chain: Vec<SourceId> = result
        .statuses
        .iter()
        .map(|entry| entry.source.clone())
        .collect();

    let data = serde_json::to_value(BatchResponseData {
        count: result.events.len(),
        duplicates_dropped: result.duplicates_dropped,
        merged_events: result.events.clone(),
        validation_errors: result.validation_errors.clone(),
        per_source_status: result.statuses.iter().map(StatusRow::from_entry).collect(),
    })?;

    let mut command_result = CommandResult::ok(data, source_chain).with_errors(errors);
    if result.duplicates_dropped > 0 {
        command_result = command_result.with_warning(format!(
            "{} duplicate event(s) dropped during merge; first occurrence kept",
            result.duplicates_dropped
        ));
    }
    if !result.validation_errors.is_empty() {
        command_result = command_result.with_warning(format!(
            "{} validation error(s); the merged collection cannot be exported until they are resolved",
            result.validation_errors.len()
        ));
    }
    Ok(command_result)
}

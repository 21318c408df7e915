use serde::Serialize;

use chainledger_core::{export_csv, export_json, Aggregator, SourceId, SourceStatus};

use crate::cli::{ExportArgs, ExportFormat};
use crate::envelope::EnvelopeError;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportResponseData {
    format: &'static str,
    rows: usize,
    duplicates_dropped: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    written_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<String>,
}

pub async fn run(args: &ExportArgs, aggregator: &Aggregator) -> Result<CommandResult, CliError> {
    let sources = super::parse_sources(&args.sources)?;
    let account = super::parse_account(&args.account)?;
    let credentials = super::parse_credentials(args.api_key.as_deref())?;

    let result = aggregator
        .batch_events(&sources, &account, credentials.as_ref())
        .await?;

    // The gate is the validation report; a failed source surfaces as an
    // envelope error so a partial document is never mistaken for complete.
    let document = match args.export_format {
        ExportFormat::Csv => export_csv(&result.events, &result.validation_errors)?,
        ExportFormat::Json => export_json(&result.events, &result.validation_errors)?,
    };

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
    let failed_sources: Vec<&str> = result
        .statuses
        .iter()
        .filter(|entry| entry.status == SourceStatus::Error)
        .map(|entry| entry.source.as_str())
        .collect();

    let (written_to, document) = match &args.out {
        Some(path) => {
            std::fs::write(path, &document)?;
            (Some(path.display().to_string()), None)
        }
        None => (None, Some(document)),
    };

    let data = serde_json::to_value(ExportResponseData {
        format: args.export_format.as_str(),
        rows: result.events.len(),
        duplicates_dropped: result.duplicates_dropped,
        written_to,
        document,
    })?;

    let source_chain: Vec<SourceId> = result
        .statuses
        .iter()
        .map(|entry| entry.source.clone())
        .collect();

    let mut command_result = CommandResult::ok(data, source_chain).with_errors(errors);
    if !failed_sources.is_empty() {
        command_result = command_result.with_warning(format!(
            "export excludes failed source(s): {}",
            failed_sources.join(", ")
        ));
    }
    Ok(command_result)
}

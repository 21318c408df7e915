use serde::Serialize;

use chainledger_core::{Aggregator, Mode, SourceId};

use crate::cli::SourcesArgs;
use crate::error::CliError;

use super::CommandResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SourceRow {
    id: SourceId,
    display_name: String,
    mode: Mode,
    requires_credentials: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    capabilities: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
struct SourcesResponseData {
    sources: Vec<SourceRow>,
}

pub fn run(args: &SourcesArgs, aggregator: &Aggregator) -> Result<CommandResult, CliError> {
    let policy = aggregator.policy();
    let sources: Vec<SourceRow> = aggregator
        .registry()
        .descriptors(policy)
        .into_iter()
        .map(|descriptor| SourceRow {
            annotation: policy.annotation(&descriptor.id).map(str::to_owned),
            capabilities: args
                .verbose
                .then(|| descriptor.capabilities.supported_categories()),
            id: descriptor.id,
            display_name: descriptor.display_name,
            mode: descriptor.mode,
            requires_credentials: descriptor.requires_credentials,
        })
        .collect();

    let source_chain: Vec<SourceId> = sources.iter().map(|row| row.id.clone()).collect();
    let data = serde_json::to_value(SourcesResponseData { sources })?;

    Ok(CommandResult::ok(data, source_chain))
}

mod batch;
mod events;
mod export;
mod sources;

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use uuid::Uuid;

use chainledger_core::{
    Account, Aggregator, Credentials, ModePolicy, SourceId, SourceRegistry,
};

use crate::cli::{Cli, Command};
use crate::envelope::{Envelope, EnvelopeError, EnvelopeMeta};
use crate::error::CliError;

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub errors: Vec<EnvelopeError>,
    pub source_chain: Vec<SourceId>,
}

impl CommandResult {
    pub fn ok(data: Value, source_chain: Vec<SourceId>) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            errors: Vec::new(),
            source_chain,
        }
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_errors(mut self, errors: Vec<EnvelopeError>) -> Self {
        self.errors.extend(errors);
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let aggregator = Aggregator::new(
        Arc::new(SourceRegistry::default()),
        Arc::new(ModePolicy::default_policy()),
    );
    let started = Instant::now();

    let command_result = match &cli.command {
        Command::Events(args) => events::run(args, &aggregator).await?,
        Command::Batch(args) => batch::run(args, &aggregator).await?,
        Command::Export(args) => export::run(args, &aggregator).await?,
        Command::Sources(args) => sources::run(args, &aggregator)?,
    };

    let CommandResult {
        data,
        warnings,
        errors,
        source_chain,
    } = command_result;

    let mut meta = EnvelopeMeta::new(
        Uuid::new_v4().to_string(),
        source_chain,
        started.elapsed().as_millis() as u64,
    );
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope::new(meta, data, errors))
}

fn parse_source(raw: &str) -> Result<SourceId, CliError> {
    Ok(SourceId::parse(raw)?)
}

fn parse_sources(raw: &[String]) -> Result<Vec<SourceId>, CliError> {
    raw.iter().map(|value| parse_source(value)).collect()
}

fn parse_account(raw: &str) -> Result<Account, CliError> {
    Ok(Account::parse(raw)?)
}

fn parse_credentials(api_key: Option<&str>) -> Result<Option<Credentials>, CliError> {
    api_key.map(Credentials::new).transpose().map_err(Into::into)
}

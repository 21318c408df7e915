//! Single-source and batch event aggregation.
//!
//! Batch requests fan selected sources out onto concurrent tasks. Failures
//! stay isolated per source: one source failing never blocks or aborts the
//! others, and the batch as a whole fails only when every selected source
//! failed. Cancelling the batch future aborts the remaining tasks; an
//! aborted source keeps its pre-terminal status and is never reported as a
//! failure.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;

use crate::adapter::{Account, Credentials, FetchError};
use crate::validation::{validate, ValidationError};
use crate::{Event, Mode, ModePolicy, SourceId, SourceRegistry};

/// Result of one source's events flow: normalized events plus the advisory
/// validation report and the mode the caller must interpret it under.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: SourceId,
    pub source_name: String,
    pub mode: Mode,
    pub mode_annotation: Option<String>,
    pub events: Vec<Event>,
    pub validation_errors: Vec<ValidationError>,
    /// The page cap was hit; the collection is a prefix of the history.
    pub truncated: bool,
}

/// Lifecycle of one source inside a batch.
///
/// `Pending` and `Loading` are pre-terminal; `batch_events` itself only ever
/// returns `Done` and `Error` entries, but a cancelled task keeps `Loading`
/// so progressive callers can distinguish "aborted" from "failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Pending,
    Loading,
    Done,
    Error,
}

impl SourceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Loading => "loading",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

/// Per-source terminal state of a batch.
#[derive(Debug, Clone)]
pub struct SourceStatusEntry {
    pub source: SourceId,
    pub status: SourceStatus,
    pub error: Option<FetchError>,
}

/// Merged outcome of a batch request.
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Merged in selection order, deduplicated first-occurrence-wins.
    pub events: Vec<Event>,
    /// Re-validation of the merged collection.
    pub validation_errors: Vec<ValidationError>,
    pub statuses: Vec<SourceStatusEntry>,
    /// Later occurrences dropped by external-id dedup. Informational; the
    /// kept events are untouched.
    pub duplicates_dropped: usize,
}

/// Batch-level failure. Individual source failures are not batch failures;
/// they appear as `Error` entries in [`BatchResult::statuses`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum BatchError {
    #[error("no sources selected")]
    NoSourcesSelected,
    #[error("all {} selected sources failed", .statuses.len())]
    AllSourcesFailed { statuses: Vec<SourceStatusEntry> },
}

/// Front door for event retrieval, shared by the CLI commands.
///
/// Cheap to clone; batch tasks each carry their own handle.
#[derive(Clone)]
pub struct Aggregator {
    registry: Arc<SourceRegistry>,
    policy: Arc<ModePolicy>,
}

impl Aggregator {
    pub fn new(registry: Arc<SourceRegistry>, policy: Arc<ModePolicy>) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn policy(&self) -> &ModePolicy {
        &self.policy
    }

    /// Fetches, normalizes, and validates one source's events.
    ///
    /// Blocked sources fail fast with their policy annotation before any
    /// account or credential checks run: "cannot be done safely" must never
    /// be confusable with "no activity". A capability violation by the
    /// adapter surfaces as a `Contract` error rather than leaking events
    /// outside the declared set.
    pub async fn events(
        &self,
        source: &SourceId,
        account: &Account,
        credentials: Option<&Credentials>,
    ) -> Result<SourceReport, FetchError> {
        let adapter = self
            .registry
            .get(source)
            .ok_or_else(|| FetchError::not_registered(source))?;

        let mode = self.policy.mode_of(source);
        let mode_annotation = self.policy.annotation(source).map(str::to_owned);
        if mode == Mode::Blocked {
            let reason = mode_annotation
                .clone()
                .unwrap_or_else(|| format!("source '{source}' is blocked by policy"));
            return Err(FetchError::blocked(reason));
        }

        if !adapter.accepts_account(account) {
            return Err(FetchError::invalid_input(format!(
                "'{account}' is not a valid {source} account"
            )));
        }
        if adapter.requires_credentials() && credentials.is_none() {
            return Err(FetchError::auth_required(source));
        }

        let outcome = adapter.fetch(account, credentials).await?;

        let capabilities = adapter.capabilities();
        if let Some(event) = outcome
            .events
            .iter()
            .find(|event| !capabilities.supports(event.category))
        {
            return Err(FetchError::contract(format!(
                "source '{source}' emitted '{}' outside its declared capability set",
                event.category.as_str()
            )));
        }

        let validation_errors = validate(&outcome.events);
        Ok(SourceReport {
            source: source.clone(),
            source_name: adapter.display_name().to_owned(),
            mode,
            mode_annotation,
            events: outcome.events,
            validation_errors,
            truncated: outcome.truncated,
        })
    }

    /// Runs the events flow for every selected source concurrently and
    /// merges the results.
    ///
    /// Duplicate selections are collapsed before spawning. Merge order is
    /// selection order regardless of completion order; cross-source
    /// `external_id` collisions keep the first occurrence. The merged
    /// collection is validated again as a whole.
    pub async fn batch_events(
        &self,
        sources: &[SourceId],
        account: &Account,
        credentials: Option<&Credentials>,
    ) -> Result<BatchResult, BatchError> {
        if sources.is_empty() {
            return Err(BatchError::NoSourcesSelected);
        }
        let selection = dedupe_selection(sources);

        let mut join_set = JoinSet::new();
        let mut task_slots: HashMap<tokio::task::Id, usize> = HashMap::new();
        for (index, source) in selection.iter().enumerate() {
            let aggregator = self.clone();
            let source = source.clone();
            let account = account.clone();
            let credentials = credentials.cloned();
            let handle = join_set.spawn(async move {
                let result = aggregator
                    .events(&source, &account, credentials.as_ref())
                    .await;
                (index, result)
            });
            task_slots.insert(handle.id(), index);
        }

        let mut slots: Vec<Option<Result<SourceReport, FetchError>>> =
            vec![None; selection.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(join_error) if join_error.is_cancelled() => {
                    // Aborted task: the slot stays pre-terminal.
                }
                Err(join_error) => {
                    if let Some(&index) = task_slots.get(&join_error.id()) {
                        slots[index] = Some(Err(FetchError::contract(format!(
                            "source task panicked: {join_error}"
                        ))));
                    }
                }
            }
        }

        let statuses: Vec<SourceStatusEntry> = selection
            .iter()
            .zip(&slots)
            .map(|(source, slot)| terminal_status(source, slot))
            .collect();

        let all_failed = slots
            .iter()
            .all(|slot| matches!(slot, Some(Err(_))));
        if all_failed {
            return Err(BatchError::AllSourcesFailed { statuses });
        }

        let mut events = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut duplicates_dropped = 0;
        for slot in slots {
            let Some(Ok(report)) = slot else { continue };
            for event in report.events {
                // Empty external ids are a validation finding, not a dedup
                // key; they pass through untouched.
                if !event.external_id.is_empty() && !seen.insert(event.external_id.clone()) {
                    duplicates_dropped += 1;
                    continue;
                }
                events.push(event);
            }
        }

        let validation_errors = validate(&events);
        Ok(BatchResult {
            events,
            validation_errors,
            statuses,
            duplicates_dropped,
        })
    }
}

/// Maps a joined task slot to its caller-facing status.
///
/// A slot left unfilled belongs to an aborted task; it stays `Loading` with
/// no error so cancellation is never confusable with failure.
fn terminal_status(
    source: &SourceId,
    slot: &Option<Result<SourceReport, FetchError>>,
) -> SourceStatusEntry {
    match slot {
        None => SourceStatusEntry {
            source: source.clone(),
            status: SourceStatus::Loading,
            error: None,
        },
        Some(Ok(_)) => SourceStatusEntry {
            source: source.clone(),
            status: SourceStatus::Done,
            error: None,
        },
        Some(Err(error)) => SourceStatusEntry {
            source: source.clone(),
            status: SourceStatus::Error,
            error: Some(error.clone()),
        },
    }
}

fn dedupe_selection(sources: &[SourceId]) -> Vec<SourceId> {
    let mut seen = HashSet::new();
    sources
        .iter()
        .filter(|source| seen.insert((*source).clone()))
        .cloned()
        .collect()
}

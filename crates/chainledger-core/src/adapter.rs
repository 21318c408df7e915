//! Source adapter contract and its error taxonomy.
//!
//! Every per-chain client implements [`SourceAdapter`]. The contract is
//! strict about two things:
//!
//! - **Non-inference**: if a required financial value is not present as an
//!   explicit, protocol-level quantity in the upstream payload, the adapter
//!   fails with an `InsufficientData` error. Deriving it from balance deltas
//!   or price estimates is a contract violation, not a fallback.
//! - **Pagination bounds**: an adapter pages until the upstream signals
//!   completion or the hard page cap is hit; hitting the cap marks the
//!   outcome truncated rather than failed.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{Event, EventCategory, Mode, SchemaError, SourceId};

/// Hard upper bound on paginated upstream requests per fetch.
///
/// Applies identically whether a source runs alone or inside a batch.
pub const PAGE_CAP: u32 = 50;

/// Account identifier as supplied by the caller.
///
/// Format checking beyond "non-empty, no whitespace" is per-source: each
/// adapter declares its own address predicate via
/// [`SourceAdapter::accepts_account`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account(String);

impl Account {
    pub fn parse(value: &str) -> Result<Self, SchemaError> {
        let value = value.trim();
        if value.is_empty() || value.chars().any(char::is_whitespace) {
            return Err(SchemaError::InvalidAccount);
        }
        Ok(Self(value.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Account {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upstream credentials for sources that require them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_secret: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SchemaError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SchemaError::EmptyApiKey);
        }
        Ok(Self {
            api_key,
            api_secret: None,
        })
    }

    pub fn with_secret(mut self, api_secret: impl Into<String>) -> Self {
        self.api_secret = Some(api_secret.into());
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn api_secret(&self) -> Option<&str> {
        self.api_secret.as_deref()
    }
}

/// The closed set of event categories a source is permitted to ever emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet {
    pub open_position: bool,
    pub close_position: bool,
    pub funding_payment: bool,
    pub staking_reward: bool,
    pub slashing: bool,
}

impl CapabilitySet {
    pub const fn new(
        open_position: bool,
        close_position: bool,
        funding_payment: bool,
        staking_reward: bool,
        slashing: bool,
    ) -> Self {
        Self {
            open_position,
            close_position,
            funding_payment,
            staking_reward,
            slashing,
        }
    }

    pub const fn none() -> Self {
        Self::new(false, false, false, false, false)
    }

    /// Staking-chain surface: rewards and slashing only.
    pub const fn staking() -> Self {
        Self::new(false, false, false, true, true)
    }

    /// Perpetuals surface: position lifecycle plus funding.
    pub const fn perp() -> Self {
        Self::new(true, true, true, false, false)
    }

    pub const fn funding_only() -> Self {
        Self::new(false, false, true, false, false)
    }

    pub const fn supports(self, category: EventCategory) -> bool {
        match category {
            EventCategory::OpenPosition => self.open_position,
            EventCategory::ClosePosition => self.close_position,
            EventCategory::FundingPayment => self.funding_payment,
            EventCategory::StakingReward => self.staking_reward,
            EventCategory::Slashing => self.slashing,
        }
    }

    pub const fn is_empty(self) -> bool {
        !(self.open_position
            || self.close_position
            || self.funding_payment
            || self.staking_reward
            || self.slashing)
    }

    pub fn supported_categories(self) -> Vec<&'static str> {
        EventCategory::ALL
            .into_iter()
            .filter(|category| self.supports(*category))
            .map(EventCategory::as_str)
            .collect()
    }
}

/// Static, caller-facing description of a registered source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceDescriptor {
    pub id: SourceId,
    pub display_name: String,
    pub mode: Mode,
    pub capabilities: CapabilitySet,
    pub requires_credentials: bool,
}

/// Result of one adapter fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub events: Vec<Event>,
    /// The page cap was hit before the upstream signalled completion.
    pub truncated: bool,
    pub pages_fetched: u32,
}

impl FetchOutcome {
    pub fn complete(events: Vec<Event>, pages_fetched: u32) -> Self {
        Self {
            events,
            truncated: false,
            pages_fetched,
        }
    }

    pub fn truncated(events: Vec<Event>, pages_fetched: u32) -> Self {
        Self {
            events,
            truncated: true,
            pages_fetched,
        }
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Bad account format or request shape; caller-correctable.
    InvalidInput,
    /// Credentials missing for a source that requires them.
    AuthRequired,
    /// Credentials rejected by the upstream.
    AuthInvalid,
    /// The upstream lacks an explicit protocol-level value. Permanent per
    /// source; retrying cannot produce the value safely.
    InsufficientData,
    /// Non-2xx upstream response or malformed payload.
    Upstream,
    /// Transport-level failure; transient, retryable by the caller.
    Network,
    /// The source is policy-blocked and can produce no safe event.
    Blocked,
    /// The selected source id is not in the registry.
    NotRegistered,
    /// The adapter violated its own declared contract.
    Contract,
}

/// Structured source error carried unmodified up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
}

impl FetchError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::with_kind(FetchErrorKind::InvalidInput, message)
    }

    pub fn auth_required(source: &SourceId) -> Self {
        Self::with_kind(
            FetchErrorKind::AuthRequired,
            format!("source '{source}' requires credentials"),
        )
    }

    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::with_kind(FetchErrorKind::AuthInvalid, message)
    }

    pub fn insufficient_data(message: impl Into<String>) -> Self {
        Self::with_kind(FetchErrorKind::InsufficientData, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::with_kind(FetchErrorKind::Upstream, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::with_kind(FetchErrorKind::Network, message)
    }

    pub fn blocked(message: impl Into<String>) -> Self {
        Self::with_kind(FetchErrorKind::Blocked, message)
    }

    pub fn not_registered(source: &SourceId) -> Self {
        Self::with_kind(
            FetchErrorKind::NotRegistered,
            format!("source '{source}' is not registered"),
        )
    }

    pub fn contract(message: impl Into<String>) -> Self {
        Self::with_kind(FetchErrorKind::Contract, message)
    }

    fn with_kind(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Transient failures the caller may retry. Everything else is either
    /// caller-correctable or a permanent per-source limitation; retrying
    /// those misleads the caller.
    pub const fn retryable(&self) -> bool {
        matches!(self.kind, FetchErrorKind::Upstream | FetchErrorKind::Network)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            FetchErrorKind::InvalidInput => "source.invalid_input",
            FetchErrorKind::AuthRequired => "source.auth_required",
            FetchErrorKind::AuthInvalid => "source.auth_invalid",
            FetchErrorKind::InsufficientData => "source.insufficient_data",
            FetchErrorKind::Upstream => "source.upstream",
            FetchErrorKind::Network => "source.network",
            FetchErrorKind::Blocked => "source.blocked",
            FetchErrorKind::NotRegistered => "source.not_registered",
            FetchErrorKind::Contract => "source.contract",
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for FetchError {}

type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<FetchOutcome, FetchError>> + Send + 'a>>;

/// Contract every per-chain source client implements.
///
/// Implementations must be `Send + Sync`; a batch request shares them across
/// concurrently running tasks. `fetch` must check the account predicate
/// before any network access, honor [`PAGE_CAP`], and uphold the
/// non-inference invariant documented at module level.
pub trait SourceAdapter: Send + Sync {
    /// Stable registry id.
    fn id(&self) -> SourceId;

    /// Human-readable name for reports.
    fn display_name(&self) -> &'static str;

    /// Categories this source is permitted to emit.
    fn capabilities(&self) -> CapabilitySet;

    /// Whether `fetch` needs credentials to reach the upstream.
    fn requires_credentials(&self) -> bool {
        false
    }

    /// Address-format predicate for this source's chain.
    fn accepts_account(&self, account: &Account) -> bool;

    /// Fetches and normalizes the account's raw platform events.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a rejected account, before any network access
    /// - `AuthRequired` / `AuthInvalid` for credential problems
    /// - `InsufficientData` when a required value is not explicit upstream
    /// - `Upstream` for non-2xx responses (except "not found") and
    ///   malformed payloads
    /// - `Network` for transport failures
    ///
    /// An empty or "not found" upstream result is a valid empty outcome,
    /// not an error.
    fn fetch<'a>(
        &'a self,
        account: &'a Account,
        credentials: Option<&'a Credentials>,
    ) -> FetchFuture<'a>;
}

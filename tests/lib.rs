// Shared imports for the cross-crate behavior tests.
pub use chainledger_core::{
    adapters::{CosmosHubAdapter, DriftPerpsAdapter, KavaFundingAdapter, ObolVaultAdapter},
    export_csv, export_json, validate, Account, Aggregator, BatchError, CapabilitySet,
    Credentials, Event, EventCategory, FetchErrorKind, Mode, ModePolicy, SourceAdapter,
    SourceId, SourceRegistry, SourceStatus,
};
pub use std::sync::Arc;

/// Aggregator over the in-tree reference adapters and the default policy.
pub fn default_aggregator() -> Aggregator {
    Aggregator::new(
        Arc::new(SourceRegistry::default()),
        Arc::new(ModePolicy::default_policy()),
    )
}

pub fn source(id: &str) -> SourceId {
    SourceId::parse(id).expect("test source id is valid")
}

pub fn account(value: &str) -> Account {
    Account::parse(value).expect("test account is valid")
}

pub const COSMOS_ACCOUNT: &str = "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";
pub const DRIFT_ACCOUNT: &str = "FpkVr2ZqGVKgBrNJTdcRJ8GAM5mH3xWPK9D4QeTzjm7a";
pub const KAVA_ACCOUNT: &str = "kava1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5z5tpwxqergd";
pub const VAULT_ACCOUNT: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

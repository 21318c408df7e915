//! Reference source adapters.
//!
//! Each adapter serves deterministic local payloads when built with an
//! offline transport and real upstream calls otherwise. Both paths go
//! through the same normalization code, so the contract checks (explicit
//! quantities only, pagination bounds, capability conformance) are
//! exercised identically in tests and production.

mod cosmoshub;
mod driftperps;
mod kavafunding;
mod obolvault;

pub use cosmoshub::CosmosHubAdapter;
pub use driftperps::DriftPerpsAdapter;
pub use kavafunding::KavaFundingAdapter;
pub use obolvault::ObolVaultAdapter;

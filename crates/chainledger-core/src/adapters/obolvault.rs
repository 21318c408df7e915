use std::future::Future;
use std::pin::Pin;

use crate::adapter::{
    Account, CapabilitySet, Credentials, FetchError, FetchOutcome, SourceAdapter,
};
use crate::SourceId;

/// Distributed-validator vault whose reward distributor exposes balance
/// deltas only. No event category can be produced without inferring
/// amounts, so the capability set is empty and every fetch is refused.
#[derive(Clone)]
pub struct ObolVaultAdapter {
    source_id: SourceId,
}

impl Default for ObolVaultAdapter {
    fn default() -> Self {
        Self {
            source_id: SourceId::parse("obolvault").expect("adapter id is valid"),
        }
    }
}

impl SourceAdapter for ObolVaultAdapter {
    fn id(&self) -> SourceId {
        self.source_id.clone()
    }

    fn display_name(&self) -> &'static str {
        "Obol Vault"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::none()
    }

    fn accepts_account(&self, account: &Account) -> bool {
        let value = account.as_str();
        match value.strip_prefix("0x") {
            Some(rest) => rest.len() == 40 && rest.chars().all(|ch| ch.is_ascii_hexdigit()),
            None => false,
        }
    }

    fn fetch<'a>(
        &'a self,
        account: &'a Account,
        credentials: Option<&'a Credentials>,
    ) -> Pin<Box<dyn Future<Output = Result<FetchOutcome, FetchError>> + Send + 'a>> {
        let _ = credentials;
        Box::pin(async move {
            if !self.accepts_account(account) {
                return Err(FetchError::invalid_input(format!(
                    "'{account}' is not a 0x-prefixed vault address"
                )));
            }
            Err(FetchError::blocked(
                "obolvault distributor exposes only balance deltas; \
                 explicit reward amounts are not available",
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FetchErrorKind;

    const ACCOUNT: &str = "0x52908400098527886E0F7030069857D2E4169EE7";

    #[tokio::test]
    async fn every_fetch_is_blocked_and_not_retryable() {
        let adapter = ObolVaultAdapter::default();
        let account = Account::parse(ACCOUNT).expect("valid account");

        let error = adapter.fetch(&account, None).await.expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::Blocked);
        assert!(!error.retryable());
        assert!(error.message().contains("balance deltas"));
    }

    #[tokio::test]
    async fn bad_address_is_invalid_input_not_blocked() {
        let adapter = ObolVaultAdapter::default();
        let account = Account::parse("0x1234").expect("valid account");

        let error = adapter.fetch(&account, None).await.expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::InvalidInput);
    }

    #[test]
    fn declares_no_capabilities() {
        assert!(ObolVaultAdapter::default().capabilities().is_empty());
    }
}

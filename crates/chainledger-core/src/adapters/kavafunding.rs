use std::future::Future;
use std::pin::Pin;

use rust_decimal::Decimal;

use crate::adapter::{
    Account, CapabilitySet, Credentials, FetchError, FetchOutcome, SourceAdapter,
};
use crate::domain::EventTimestamp;
use crate::{Event, EventCategory, SourceId};

/// Funding-rate feed for a Kava-style margin market.
///
/// The public feed publishes explicit funding payments only; there is no
/// position or staking surface, so the capability set stays funding-only.
/// No upstream indexer exists yet, so the adapter serves deterministic
/// local payloads.
#[derive(Clone)]
pub struct KavaFundingAdapter {
    source_id: SourceId,
}

impl Default for KavaFundingAdapter {
    fn default() -> Self {
        Self {
            source_id: SourceId::parse("kavafunding").expect("adapter id is valid"),
        }
    }
}

impl KavaFundingAdapter {
    fn mock_outcome(&self, account: &Account) -> Result<FetchOutcome, FetchError> {
        let seed = account_seed(account);
        let base_time = 1_705_000_000_i64 + (seed % 86_400) as i64;

        let mut events = Vec::with_capacity(2);
        for index in 0..2_u64 {
            // Funding payments alternate direction; pnl keeps the sign,
            // amount is the unsigned magnitude.
            let micros = (1 + (seed.wrapping_add(index * 7)) % 500_000) as i64;
            let payment = Decimal::new(micros, 6) * if index % 2 == 0 { Decimal::NEGATIVE_ONE } else { Decimal::ONE };
            let timestamp = EventTimestamp::from_unix(base_time + (index as i64) * 28_800)
                .map_err(|error| FetchError::contract(format!("kavafunding mock: {error}")))?
                .render();

            events.push(Event {
                timestamp,
                asset: String::from("KAVA"),
                amount: payment.abs(),
                fee: Decimal::ZERO,
                realized_pnl: payment,
                settlement_token: Some(String::from("USDX")),
                notes: String::from("KAVA margin funding on kavafunding"),
                external_id: format!("kava-funding-{:012x}-{index}", seed),
                category: EventCategory::FundingPayment,
            });
        }
        Ok(FetchOutcome::complete(events, 1))
    }
}

impl SourceAdapter for KavaFundingAdapter {
    fn id(&self) -> SourceId {
        self.source_id.clone()
    }

    fn display_name(&self) -> &'static str {
        "Kava Funding"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::funding_only()
    }

    fn accepts_account(&self, account: &Account) -> bool {
        let value = account.as_str();
        match value.strip_prefix("kava1") {
            Some(rest) => {
                (30..=52).contains(&rest.len())
                    && rest
                        .chars()
                        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
            }
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
                    "'{account}' is not a bech32 kava account address"
                )));
            }
            self.mock_outcome(account)
        })
    }
}

fn account_seed(account: &Account) -> u64 {
    account.as_str().bytes().fold(17_u64, |acc, byte| {
        acc.wrapping_mul(31).wrapping_add(byte as u64)
    })
}

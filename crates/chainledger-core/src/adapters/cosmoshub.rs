use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::adapter::{
    Account, CapabilitySet, Credentials, FetchError, FetchOutcome, SourceAdapter, PAGE_CAP,
};
use crate::domain::{parse_decimal, EventTimestamp};
use crate::transport::{HttpRequest, NoopTransport, Transport};
use crate::{Event, EventCategory, SourceId};

const BASE_URL: &str = "https://indexer.cosmoshub.example/v1";
const PAGE_SIZE: u32 = 100;

/// Cosmos Hub distribution-ledger adapter: staking rewards and slashing.
#[derive(Clone)]
pub struct CosmosHubAdapter {
    source_id: SourceId,
    transport: Arc<dyn Transport>,
    base_url: String,
    page_cap: u32,
    use_real_api: bool,
}

impl Default for CosmosHubAdapter {
    fn default() -> Self {
        Self {
            source_id: SourceId::parse("cosmoshub").expect("adapter id is valid"),
            transport: Arc::new(NoopTransport),
            base_url: String::from(BASE_URL),
            page_cap: PAGE_CAP,
            use_real_api: false,
        }
    }
}

impl CosmosHubAdapter {
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        let use_real_api = !transport.is_offline();
        Self {
            transport,
            use_real_api,
            ..Self::default()
        }
    }

    pub fn with_page_cap(mut self, page_cap: u32) -> Self {
        self.page_cap = page_cap;
        self
    }

    fn page_url(&self, account: &Account, cursor: Option<&str>) -> String {
        let mut url = format!(
            "{}/accounts/{}/distribution?page_size={PAGE_SIZE}",
            self.base_url,
            urlencoding::encode(account.as_str())
        );
        if let Some(cursor) = cursor {
            url.push_str("&cursor=");
            url.push_str(&urlencoding::encode(cursor));
        }
        url
    }

    async fn fetch_pages(&self, account: &Account) -> Result<FetchOutcome, FetchError> {
        let mut events = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages_fetched = 0;

        loop {
            if pages_fetched == self.page_cap {
                return Ok(FetchOutcome::truncated(events, pages_fetched));
            }

            let request =
                HttpRequest::get(self.page_url(account, cursor.as_deref())).with_timeout_ms(5_000);
            let response = self.transport.execute(request).await.map_err(|error| {
                FetchError::network(format!("cosmoshub transport error: {}", error.message()))
            })?;

            if response.is_not_found() {
                return Ok(FetchOutcome::complete(events, pages_fetched));
            }
            if !response.is_success() {
                return Err(FetchError::upstream(format!(
                    "cosmoshub returned status {}",
                    response.status
                )));
            }

            let page: CosmosLedgerPage = serde_json::from_str(&response.body).map_err(|error| {
                FetchError::upstream(format!("cosmoshub payload did not parse: {error}"))
            })?;
            pages_fetched += 1;

            for entry in page.entries {
                events.push(normalize_entry(entry)?);
            }

            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => return Ok(FetchOutcome::complete(events, pages_fetched)),
            }
        }
    }

    fn mock_outcome(&self, account: &Account) -> Result<FetchOutcome, FetchError> {
        let seed = account_seed(account);
        let base_time = 1_700_000_000_i64 + (seed % 86_400) as i64;

        let mut entries = Vec::with_capacity(4);
        for index in 0..3_u64 {
            entries.push(CosmosLedgerEntry {
                kind: String::from("withdraw_rewards"),
                tx_hash: format!("{:016X}{index:02}", seed.wrapping_mul(index + 1)),
                block_time: base_time + index as i64 * 3_600,
                denom: String::from("ATOM"),
                amount: Some(format!(
                    "{}.{:06}",
                    1 + seed % 9,
                    seed.wrapping_mul(index + 7) % 1_000_000
                )),
            });
        }
        if seed % 3 == 0 {
            entries.push(CosmosLedgerEntry {
                kind: String::from("slash"),
                tx_hash: format!("{:016X}SL", seed.rotate_left(17)),
                block_time: base_time + 4 * 3_600,
                denom: String::from("ATOM"),
                amount: Some(String::from("0.250000")),
            });
        }

        let events = entries
            .into_iter()
            .map(normalize_entry)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FetchOutcome::complete(events, 1))
    }
}

impl SourceAdapter for CosmosHubAdapter {
    fn id(&self) -> SourceId {
        self.source_id.clone()
    }

    fn display_name(&self) -> &'static str {
        "Cosmos Hub"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::staking()
    }

    fn accepts_account(&self, account: &Account) -> bool {
        let Some(rest) = account.as_str().strip_prefix("cosmos1") else {
            return false;
        };
        (32..=52).contains(&rest.len())
            && rest
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit())
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
                    "'{account}' is not a bech32 cosmoshub account address"
                )));
            }

            if self.use_real_api {
                self.fetch_pages(account).await
            } else {
                self.mock_outcome(account)
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CosmosLedgerPage {
    #[serde(default)]
    entries: Vec<CosmosLedgerEntry>,
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CosmosLedgerEntry {
    kind: String,
    tx_hash: String,
    block_time: i64,
    denom: String,
    #[serde(default)]
    amount: Option<String>,
}

fn normalize_entry(entry: CosmosLedgerEntry) -> Result<Event, FetchError> {
    // Explicit protocol-level quantity or nothing: entries without an amount
    // are never reconstructed from balance deltas.
    let raw_amount = entry.amount.ok_or_else(|| {
        FetchError::insufficient_data(format!(
            "cosmoshub entry {} carries no explicit amount",
            entry.tx_hash
        ))
    })?;
    let amount = parse_decimal(&raw_amount).map_err(|_| {
        FetchError::upstream(format!(
            "cosmoshub entry {} has unparseable amount '{raw_amount}'",
            entry.tx_hash
        ))
    })?;
    let timestamp = EventTimestamp::from_unix(entry.block_time)
        .map_err(|error| FetchError::upstream(format!("cosmoshub entry {}: {error}", entry.tx_hash)))?;

    let (category, realized_pnl) = match entry.kind.as_str() {
        "withdraw_rewards" => (EventCategory::StakingReward, amount),
        "slash" => (EventCategory::Slashing, -amount),
        other => {
            return Err(FetchError::upstream(format!(
                "cosmoshub entry {} has unrecognized kind '{other}'",
                entry.tx_hash
            )))
        }
    };

    Ok(Event {
        timestamp: timestamp.render(),
        asset: entry.denom.clone(),
        amount,
        fee: Decimal::ZERO,
        realized_pnl,
        settlement_token: Some(entry.denom),
        notes: format!("{} on cosmoshub", entry.kind),
        external_id: entry.tx_hash,
        category,
    })
}

fn account_seed(account: &Account) -> u64 {
    account.as_str().bytes().fold(7_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(byte as u64)
    })
}

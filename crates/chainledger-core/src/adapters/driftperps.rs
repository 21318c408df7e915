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

const BASE_URL: &str = "https://settlements.driftperps.example/v2";
const PAGE_SIZE: u32 = 200;

/// Drift-style perp DEX settlement adapter: position opens/closes and
/// funding payments.
///
/// The indexer requires an API key. Fills carry `realized_pnl` explicitly or
/// not at all; entry/exit prices are present in the payload but are never
/// used to derive a missing value.
#[derive(Clone)]
pub struct DriftPerpsAdapter {
    source_id: SourceId,
    transport: Arc<dyn Transport>,
    base_url: String,
    page_cap: u32,
    use_real_api: bool,
}

impl Default for DriftPerpsAdapter {
    fn default() -> Self {
        Self {
            source_id: SourceId::parse("driftperps").expect("adapter id is valid"),
            transport: Arc::new(NoopTransport),
            base_url: String::from(BASE_URL),
            page_cap: PAGE_CAP,
            use_real_api: false,
        }
    }
}

impl DriftPerpsAdapter {
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

    fn page_url(&self, account: &Account, from: Option<u64>) -> String {
        let mut url = format!(
            "{}/accounts/{}/settlements?page_size={PAGE_SIZE}",
            self.base_url,
            urlencoding::encode(account.as_str())
        );
        if let Some(from) = from {
            url.push_str(&format!("&from={from}"));
        }
        url
    }

    async fn fetch_pages(
        &self,
        account: &Account,
        credentials: &Credentials,
    ) -> Result<FetchOutcome, FetchError> {
        let mut events = Vec::new();
        let mut from: Option<u64> = None;
        let mut pages_fetched = 0;

        loop {
            if pages_fetched == self.page_cap {
                return Ok(FetchOutcome::truncated(events, pages_fetched));
            }

            let request = HttpRequest::get(self.page_url(account, from))
                .with_header("x-api-key", credentials.api_key())
                .with_timeout_ms(5_000);
            let response = self.transport.execute(request).await.map_err(|error| {
                FetchError::network(format!("driftperps transport error: {}", error.message()))
            })?;

            if response.status == 401 || response.status == 403 {
                return Err(FetchError::auth_invalid(format!(
                    "driftperps rejected the supplied api key (status {})",
                    response.status
                )));
            }
            if response.is_not_found() {
                return Ok(FetchOutcome::complete(events, pages_fetched));
            }
            if !response.is_success() {
                return Err(FetchError::upstream(format!(
                    "driftperps returned status {}",
                    response.status
                )));
            }

            let page: DriftSettlementsPage =
                serde_json::from_str(&response.body).map_err(|error| {
                    FetchError::upstream(format!("driftperps payload did not parse: {error}"))
                })?;
            pages_fetched += 1;

            for fill in page.fills {
                events.push(normalize_fill(fill)?);
            }
            for funding in page.funding {
                events.push(normalize_funding(funding)?);
            }

            match page.next_from {
                Some(next) => from = Some(next),
                None => return Ok(FetchOutcome::complete(events, pages_fetched)),
            }
        }
    }

    fn mock_outcome(&self, account: &Account) -> Result<FetchOutcome, FetchError> {
        let seed = account_seed(account);
        let base_time = 1_710_000_000_i64 + (seed % 43_200) as i64;
        let market = if seed % 2 == 0 { "SOL-PERP" } else { "ETH-PERP" };

        let fills = vec![
            DriftFillRow {
                order_id: format!("ord-{:012x}-open", seed),
                market: market.to_owned(),
                ts: base_time,
                base_amount: format!("{}.{:04}", 1 + seed % 20, seed % 10_000),
                fee: String::from("0.0250"),
                settle_mint: String::from("USDC"),
                realized_pnl: Some(String::from("0")),
                entry_price: Some(String::from("148.25")),
                exit_price: None,
            },
            DriftFillRow {
                order_id: format!("ord-{:012x}-close", seed),
                market: market.to_owned(),
                ts: base_time + 7_200,
                base_amount: format!("{}.{:04}", 1 + seed % 20, seed % 10_000),
                fee: String::from("0.0250"),
                settle_mint: String::from("USDC"),
                realized_pnl: Some(format!("{}.{:02}", (seed % 40) as i64 - 15, seed % 100)),
                entry_price: Some(String::from("148.25")),
                exit_price: Some(String::from("151.80")),
            },
        ];
        let funding = vec![DriftFundingRow {
            id: seed % 1_000_000,
            market: market.to_owned(),
            ts: base_time + 3_600,
            payment: format!("-0.{:06}", 1 + seed % 900_000),
            settle_mint: String::from("USDC"),
        }];

        let mut events = Vec::with_capacity(fills.len() + funding.len());
        for fill in fills {
            events.push(normalize_fill(fill)?);
        }
        for row in funding {
            events.push(normalize_funding(row)?);
        }
        Ok(FetchOutcome::complete(events, 1))
    }
}

impl SourceAdapter for DriftPerpsAdapter {
    fn id(&self) -> SourceId {
        self.source_id.clone()
    }

    fn display_name(&self) -> &'static str {
        "Drift Perps"
    }

    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::perp()
    }

    fn requires_credentials(&self) -> bool {
        true
    }

    fn accepts_account(&self, account: &Account) -> bool {
        let value = account.as_str();
        (32..=44).contains(&value.len())
            && value.chars().all(|ch| {
                ch.is_ascii_alphanumeric() && !matches!(ch, '0' | 'O' | 'I' | 'l')
            })
    }

    fn fetch<'a>(
        &'a self,
        account: &'a Account,
        credentials: Option<&'a Credentials>,
    ) -> Pin<Box<dyn Future<Output = Result<FetchOutcome, FetchError>> + Send + 'a>> {
        Box::pin(async move {
            if !self.accepts_account(account) {
                return Err(FetchError::invalid_input(format!(
                    "'{account}' is not a base58 driftperps account address"
                )));
            }
            let Some(credentials) = credentials else {
                return Err(FetchError::auth_required(&self.source_id));
            };

            if self.use_real_api {
                self.fetch_pages(account, credentials).await
            } else {
                self.mock_outcome(account)
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DriftSettlementsPage {
    #[serde(default)]
    fills: Vec<DriftFillRow>,
    #[serde(default)]
    funding: Vec<DriftFundingRow>,
    #[serde(default)]
    next_from: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct DriftFillRow {
    order_id: String,
    market: String,
    ts: i64,
    base_amount: String,
    fee: String,
    settle_mint: String,
    #[serde(default)]
    realized_pnl: Option<String>,
    #[serde(default)]
    entry_price: Option<String>,
    #[serde(default)]
    exit_price: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct DriftFundingRow {
    id: u64,
    market: String,
    ts: i64,
    payment: String,
    settle_mint: String,
}

fn normalize_fill(fill: DriftFillRow) -> Result<Event, FetchError> {
    // Entry/exit prices are deliberately unused: a missing realized pnl is a
    // permanent upstream limitation, not something to reconstruct.
    let (_, _) = (&fill.entry_price, &fill.exit_price);
    let raw_pnl = fill.realized_pnl.ok_or_else(|| {
        FetchError::insufficient_data(format!(
            "driftperps fill {} carries no explicit realized pnl",
            fill.order_id
        ))
    })?;

    let realized_pnl = parse_field(&fill.order_id, "realized_pnl", &raw_pnl)?;
    let amount = parse_field(&fill.order_id, "base_amount", &fill.base_amount)?;
    let fee = parse_field(&fill.order_id, "fee", &fill.fee)?;
    let timestamp = timestamp_for(&fill.order_id, fill.ts)?;

    // The upstream classifies zero-pnl fills as opens, so a true break-even
    // close is reported as an open. This mirrors the upstream data contract.
    let category = if realized_pnl.is_zero() {
        EventCategory::OpenPosition
    } else {
        EventCategory::ClosePosition
    };

    Ok(Event {
        timestamp,
        asset: market_base(&fill.market),
        amount,
        fee,
        realized_pnl,
        settlement_token: Some(fill.settle_mint),
        notes: format!("{} fill on driftperps", fill.market),
        external_id: fill.order_id,
        category,
    })
}

fn normalize_funding(row: DriftFundingRow) -> Result<Event, FetchError> {
    let external_id = format!("funding-{}", row.id);
    let payment = parse_field(&external_id, "payment", &row.payment)?;
    let timestamp = timestamp_for(&external_id, row.ts)?;

    Ok(Event {
        timestamp,
        asset: market_base(&row.market),
        amount: payment.abs(),
        fee: Decimal::ZERO,
        realized_pnl: payment,
        settlement_token: Some(row.settle_mint),
        notes: format!("{} funding on driftperps", row.market),
        external_id,
        category: EventCategory::FundingPayment,
    })
}

fn parse_field(record: &str, field: &str, raw: &str) -> Result<Decimal, FetchError> {
    parse_decimal(raw).map_err(|_| {
        FetchError::upstream(format!(
            "driftperps record {record} has unparseable {field} '{raw}'"
        ))
    })
}

fn timestamp_for(record: &str, unix_seconds: i64) -> Result<String, FetchError> {
    EventTimestamp::from_unix(unix_seconds)
        .map(EventTimestamp::render)
        .map_err(|error| FetchError::upstream(format!("driftperps record {record}: {error}")))
}

fn market_base(market: &str) -> String {
    market.split('-').next().unwrap_or(market).to_owned()
}

fn account_seed(account: &Account) -> u64 {
    account.as_str().bytes().fold(13_u64, |acc, byte| {
        acc.wrapping_mul(31).wrapping_add(byte as u64)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::transport::{HttpError, HttpResponse};
    use crate::validation::validate;
    use crate::FetchErrorKind;

    const ACCOUNT: &str = "FpkVr2ZqGVKgBrNJTdcRJ8GAM5mH3xWPK9D4QeTzjm7a";

    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn execute<'a>(
            &'a self,
            request: HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            self.requests
                .lock()
                .expect("request store intact")
                .push(request);
            let response = self
                .responses
                .lock()
                .expect("response script intact")
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::ok_json("{}")));
            Box::pin(async move { response })
        }
    }

    fn account() -> Account {
        Account::parse(ACCOUNT).expect("valid account")
    }

    fn credentials() -> Credentials {
        Credentials::new("drift-key").expect("valid credentials")
    }

    #[tokio::test]
    async fn missing_credentials_fail_fast_with_auth_required() {
        let adapter = DriftPerpsAdapter::default();

        let error = adapter.fetch(&account(), None).await.expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::AuthRequired);
    }

    #[tokio::test]
    async fn mock_outcome_is_validation_clean_and_in_capability_set() {
        let adapter = DriftPerpsAdapter::default();
        let outcome = adapter
            .fetch(&account(), Some(&credentials()))
            .await
            .expect("fetch succeeds");

        assert_eq!(outcome.events.len(), 3);
        assert!(validate(&outcome.events).is_empty());
        let capabilities = adapter.capabilities();
        assert!(outcome
            .events
            .iter()
            .all(|event| capabilities.supports(event.category)));
    }

    #[tokio::test]
    async fn rejected_api_key_maps_to_auth_invalid() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse {
            status: 401,
            body: String::new(),
        })]));
        let adapter = DriftPerpsAdapter::with_transport(transport);

        let error = adapter
            .fetch(&account(), Some(&credentials()))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::AuthInvalid);
        assert!(!error.retryable());
    }

    #[tokio::test]
    async fn api_key_is_sent_as_header_not_url() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse::ok_json("{}"))]));
        let adapter = DriftPerpsAdapter::with_transport(transport.clone());

        adapter
            .fetch(&account(), Some(&credentials()))
            .await
            .expect("fetch succeeds");

        let requests = transport.requests.lock().expect("request store intact");
        assert_eq!(
            requests[0].headers.get("x-api-key").map(String::as_str),
            Some("drift-key")
        );
        assert!(!requests[0].url.contains("drift-key"));
    }

    #[tokio::test]
    async fn fill_without_realized_pnl_is_insufficient_data() {
        // Entry and exit prices are present; deriving pnl from them is
        // exactly what the contract forbids.
        let body = r#"{"fills":[{"order_id":"ord-1","market":"SOL-PERP","ts":1710000000,
            "base_amount":"2.5","fee":"0.01","settle_mint":"USDC",
            "entry_price":"148.25","exit_price":"151.80"}]}"#;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse::ok_json(body))]));
        let adapter = DriftPerpsAdapter::with_transport(transport);

        let error = adapter
            .fetch(&account(), Some(&credentials()))
            .await
            .expect_err("must fail");
        assert_eq!(error.kind(), FetchErrorKind::InsufficientData);
    }

    #[tokio::test]
    async fn zero_pnl_fill_is_classified_as_open() {
        let body = r#"{"fills":[{"order_id":"ord-1","market":"SOL-PERP","ts":1710000000,
            "base_amount":"2.5","fee":"0.01","settle_mint":"USDC","realized_pnl":"0"}]}"#;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse::ok_json(body))]));
        let adapter = DriftPerpsAdapter::with_transport(transport);

        let outcome = adapter
            .fetch(&account(), Some(&credentials()))
            .await
            .expect("fetch succeeds");
        assert_eq!(outcome.events[0].category, EventCategory::OpenPosition);
        assert_eq!(outcome.events[0].asset, "SOL");
    }

    #[tokio::test]
    async fn funding_rows_keep_signed_pnl_and_absolute_amount() {
        let body = r#"{"funding":[{"id":7,"market":"ETH-PERP","ts":1710000000,
            "payment":"-0.125","settle_mint":"USDC"}]}"#;
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpResponse::ok_json(body))]));
        let adapter = DriftPerpsAdapter::with_transport(transport);

        let outcome = adapter
            .fetch(&account(), Some(&credentials()))
            .await
            .expect("fetch succeeds");
        let event = &outcome.events[0];
        assert_eq!(event.category, EventCategory::FundingPayment);
        assert_eq!(event.realized_pnl.to_string(), "-0.125");
        assert_eq!(event.amount.to_string(), "0.125");
        assert_eq!(event.external_id, "funding-7");
    }
}

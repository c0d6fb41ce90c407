//! Market enumeration from the predictoor subgraph.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use df_core::error::CollaboratorError;
use df_core::traits::MarketEnumerator;
use df_core::types::{MarketId, RewardPeriod};

const PAGE_SIZE: usize = 1000;

pub struct SubgraphMarkets {
    client: reqwest::Client,
    url: String,
}

impl SubgraphMarkets {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn page(&self, period: &RewardPeriod, skip: usize) -> Result<Value, CollaboratorError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "query": markets_query(period, skip) }))
            .send()
            .await
            .map_err(|e| CollaboratorError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(CollaboratorError::Unavailable(format!("subgraph returned {status}")));
        }
        if !status.is_success() {
            return Err(CollaboratorError::InvalidResponse(format!("subgraph returned {status}")));
        }
        resp.json()
            .await
            .map_err(|e| CollaboratorError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl MarketEnumerator for SubgraphMarkets {
    async fn list_active_markets(
        &self,
        period: &RewardPeriod,
    ) -> Result<BTreeSet<MarketId>, CollaboratorError> {
        let mut markets = BTreeSet::new();
        let mut skip = 0;
        loop {
            let page = parse_markets(&self.page(period, skip).await?)?;
            let n = page.len();
            markets.extend(page);
            debug!(skip, fetched = n, "subgraph markets page");
            if n < PAGE_SIZE {
                break;
            }
            skip += n;
        }
        Ok(markets)
    }
}

/// Contracts deployed before the end of `period`.
pub fn markets_query(period: &RewardPeriod, skip: usize) -> String {
    format!(
        "{{ predictContracts(first: {PAGE_SIZE}, skip: {skip}, where: {{ timestamp_lt: {} }}) {{ id }} }}",
        period.end().timestamp()
    )
}

/// Extract market ids from a GraphQL response body.
pub fn parse_markets(body: &Value) -> Result<Vec<MarketId>, CollaboratorError> {
    if let Some(errors) = body.get("errors") {
        return Err(CollaboratorError::InvalidResponse(format!("subgraph errors: {errors}")));
    }
    let contracts = body
        .pointer("/data/predictContracts")
        .and_then(Value::as_array)
        .ok_or_else(|| CollaboratorError::InvalidResponse("missing data.predictContracts".into()))?;
    contracts
        .iter()
        .map(|c| {
            let id = c
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| CollaboratorError::InvalidResponse(format!("contract without id: {c}")))?;
            id.parse()
                .map_err(|e| CollaboratorError::InvalidResponse(format!("{e}")))
        })
        .collect()
}

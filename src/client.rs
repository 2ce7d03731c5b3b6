//! Trading gateway API client
//!
//! One HTTP client implementing every external capability against the
//! gateway service: indicators, portfolio balance, quotes, trade
//! submission, and the remote record store.

use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::{
    CapabilityError, LedgerStore, MarketData, PortfolioProvider, QuoteProvider, StoreError,
    TradeGateway,
};
use crate::ledger::{LedgerFilter, LedgerRecord, RecordType};
use crate::types::{IndicatorSnapshot, TradeQuote};

/// HTTP client for the trading gateway service
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a new gateway client
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, CapabilityError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CapabilityError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CapabilityError::BadResponse(format!("{status} - {text}")));
        }

        response
            .json()
            .await
            .map_err(|e| CapabilityError::BadResponse(e.to_string()))
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, CapabilityError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| CapabilityError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(CapabilityError::BadResponse(format!("{status} - {text}")));
        }

        response
            .json()
            .await
            .map_err(|e| CapabilityError::BadResponse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl MarketData for GatewayClient {
    async fn indicators(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<IndicatorSnapshot, CapabilityError> {
        let url = format!(
            "{}/v1/indicators/{}?timeframe={}",
            self.base_url,
            symbol.replace('/', "-"),
            timeframe
        );
        debug!("Fetching indicators from {}", url);
        self.get_json(&url).await
    }
}

#[async_trait::async_trait]
impl PortfolioProvider for GatewayClient {
    async fn total_balance(&self) -> Result<Decimal, CapabilityError> {
        let url = format!("{}/v1/portfolio/balance", self.base_url);
        let resp: BalanceResponse = self.get_json(&url).await?;
        Ok(resp.total_balance)
    }
}

#[async_trait::async_trait]
impl QuoteProvider for GatewayClient {
    async fn quote(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: Decimal,
    ) -> Result<TradeQuote, CapabilityError> {
        let url = format!("{}/v1/quote", self.base_url);
        let req = QuoteRequest {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount_in,
        };
        let resp: QuoteResponse = self.post_json(&url, &req).await?;
        Ok(TradeQuote {
            amount_out: resp.amount_out,
            price_impact_pct: resp.price_impact_pct,
        })
    }
}

#[async_trait::async_trait]
impl TradeGateway for GatewayClient {
    async fn execute(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: Decimal,
        min_amount_out: Decimal,
    ) -> Result<String, CapabilityError> {
        let url = format!("{}/v1/trades", self.base_url);
        let req = TradeRequest {
            token_in: token_in.to_string(),
            token_out: token_out.to_string(),
            amount_in,
            min_amount_out,
        };
        let resp: TradeResponse = self.post_json(&url, &req).await?;
        Ok(resp.tx_ref)
    }
}

#[async_trait::async_trait]
impl LedgerStore for GatewayClient {
    async fn append(&self, record: &LedgerRecord) -> Result<(), StoreError> {
        let url = format!("{}/v1/records", self.base_url);
        let _: AppendResponse = self
            .post_json(&url, record)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(())
    }

    async fn query(&self, filter: &LedgerFilter) -> Result<Vec<LedgerRecord>, StoreError> {
        let mut url = format!("{}/v1/records?limit={}", self.base_url, filter.limit);
        if let Some(record_type) = filter.record_type {
            let kind = match record_type {
                RecordType::Decision => "decision",
                RecordType::Insight => "insight",
            };
            url.push_str(&format!("&type={kind}"));
        }
        if let Some(instrument) = &filter.instrument {
            url.push_str(&format!("&instrument={}", instrument.replace('/', "-")));
        }

        let resp: RecordsResponse = self
            .get_json(&url)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(resp.records)
    }
}

// --- Wire structures ---

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    total_balance: Decimal,
}

#[derive(Debug, Serialize)]
struct QuoteRequest {
    token_in: String,
    token_out: String,
    amount_in: Decimal,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    amount_out: Decimal,
    price_impact_pct: f64,
}

#[derive(Debug, Serialize)]
struct TradeRequest {
    token_in: String,
    token_out: String,
    amount_in: Decimal,
    min_amount_out: Decimal,
}

#[derive(Debug, Deserialize)]
struct TradeResponse {
    tx_ref: String,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    #[allow(dead_code)]
    accepted: bool,
}

#[derive(Debug, Deserialize)]
struct RecordsResponse {
    records: Vec<LedgerRecord>,
}

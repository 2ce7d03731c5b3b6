//! External capability traits
//!
//! The core consumes market data, portfolio balance, quotes, trade
//! execution, and durable record storage as abstract capabilities. The
//! pipeline and scheduler never depend on their implementation; the HTTP
//! client in `client.rs` and the test mocks both live behind these seams.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::{LedgerFilter, LedgerRecord};
use crate::types::{IndicatorSnapshot, TradeQuote};

/// Failure of an external capability call. Always recovered at the stage
/// boundary; never crosses the scheduler loop.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),
}

/// Failure of the durable record store. Logged by callers; durability is
/// best-effort and never fails the overall cycle.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Supplies indicator snapshots for an instrument and timeframe
#[async_trait::async_trait]
pub trait MarketData: Send + Sync {
    async fn indicators(
        &self,
        symbol: &str,
        timeframe: &str,
    ) -> Result<IndicatorSnapshot, CapabilityError>;
}

/// Supplies the current portfolio balance
#[async_trait::async_trait]
pub trait PortfolioProvider: Send + Sync {
    async fn total_balance(&self) -> Result<Decimal, CapabilityError>;
}

/// Quotes a proposed trade
#[async_trait::async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn quote(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: Decimal,
    ) -> Result<TradeQuote, CapabilityError>;
}

/// Submits trades, returning a transaction reference
#[async_trait::async_trait]
pub trait TradeGateway: Send + Sync {
    async fn execute(
        &self,
        token_in: &str,
        token_out: &str,
        amount_in: Decimal,
        min_amount_out: Decimal,
    ) -> Result<String, CapabilityError>;
}

/// Durable, append-only record storage
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn append(&self, record: &LedgerRecord) -> Result<(), StoreError>;

    /// Most relevant records first; exact ordering is the store's
    /// relevance/search semantics, not strict chronology.
    async fn query(&self, filter: &LedgerFilter) -> Result<Vec<LedgerRecord>, StoreError>;
}

//! Core types shared across the decision pipeline
//!
//! These types define the contract between the signal engine, the
//! execution pipeline, and the decision ledger.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Snapshot of technical readings for one instrument and timeframe.
///
/// Produced fresh on every evaluation by the market-data capability and
/// consumed once by the signal engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    /// Momentum oscillator (RSI), 0-100
    pub rsi: f64,
    /// MACD line
    pub macd_line: f64,
    /// MACD signal line
    pub macd_signal: f64,
    /// MACD histogram (line - signal)
    pub macd_histogram: f64,
    /// 20-period simple moving average
    pub sma_20: f64,
    /// 50-period simple moving average
    pub sma_50: f64,
    /// 12-period exponential moving average
    pub ema_12: f64,
    /// 26-period exponential moving average
    pub ema_26: f64,
    /// Traded volume over the timeframe
    pub volume: f64,
    /// Volatility measure (e.g. normalized ATR)
    pub volatility: f64,
}

/// Trade action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
            TradeAction::Hold => write!(f, "hold"),
        }
    }
}

/// Scored trading signal produced by the signal engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Signal action (buy/sell/hold)
    pub action: TradeAction,
    /// Confidence score, 0.0 - 1.0, sum of fired-rule contributions
    pub confidence: f64,
    /// Fired-rule phrases, in rule order
    pub reasons: Vec<String>,
    /// Optional target price annotation
    pub target_price: Option<Decimal>,
    /// Optional stop-loss price annotation
    pub stop_loss: Option<Decimal>,
}

impl Signal {
    /// Rationale text: fired-rule phrases joined in rule order
    pub fn rationale(&self) -> String {
        self.reasons.join(", ")
    }
}

/// A committed trade decision, immutable once created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeDecision {
    /// Decision identifier
    pub id: Uuid,
    /// Instrument symbol (e.g. "SOL/USDC")
    pub instrument: String,
    /// Decided action (buy or sell; hold never reaches this type)
    pub action: TradeAction,
    /// Position size in quote-currency units
    pub size: Decimal,
    /// Why this trade
    pub rationale: String,
    /// Signal confidence behind the decision
    pub confidence: f64,
    /// Decision timestamp
    pub timestamp: DateTime<Utc>,
}

/// Terminal result of the execute stage for one decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the trade was submitted and accepted
    pub executed: bool,
    /// Transaction reference from the trade gateway
    pub tx_ref: Option<String>,
    /// Amount spent (input token, quote units)
    pub amount_in: Decimal,
    /// Estimated amount received per the quote
    pub estimated_out: Decimal,
    /// Quoted price impact percentage
    pub price_impact_pct: f64,
    /// Realized PnL if known (backfilled by the store on settlement)
    pub pnl: Option<Decimal>,
    /// Rejection/failure reason when not executed
    pub reason: Option<String>,
}

impl ExecutionResult {
    /// Failure result carrying a reason, never a crash
    pub fn failed(amount_in: Decimal, reason: impl Into<String>) -> Self {
        Self {
            executed: false,
            tx_ref: None,
            amount_in,
            estimated_out: Decimal::ZERO,
            price_impact_pct: 0.0,
            pnl: None,
            reason: Some(reason.into()),
        }
    }
}

/// Terminal status of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Pipeline reached Execute and produced an ExecutionResult
    Success,
    /// Intentional no-trade exit (hold, low confidence, impact guard)
    Skipped,
}

/// Normalized outcome returned to the scheduler by the record stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleOutcome {
    /// Instrument this outcome belongs to
    pub instrument: String,
    /// Terminal status
    pub status: OutcomeStatus,
    /// Human-readable summary
    pub message: String,
    /// Execution result when the pipeline reached Execute
    pub result: Option<ExecutionResult>,
}

impl CycleOutcome {
    /// True when a trade was actually submitted and accepted
    pub fn executed(&self) -> bool {
        self.result.as_ref().map(|r| r.executed).unwrap_or(false)
    }
}

/// Quote for a proposed trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeQuote {
    /// Estimated output amount for the proposed input
    pub amount_out: Decimal,
    /// Estimated price impact percentage of this trade size
    pub price_impact_pct: f64,
}

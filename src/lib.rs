//! Longline
//!
//! Bounded-risk trading decision service: a deterministic signal engine,
//! a risk-capped position sizer, a four-stage execution pipeline, an
//! append-only decision ledger, and a cooldown-aware scheduling loop over
//! abstract market/portfolio/quote/execution/store capabilities.

pub mod capabilities;
pub mod client;
pub mod config;
pub mod instrument;
pub mod ledger;
pub mod pipeline;
pub mod scheduler;
pub mod signal;
pub mod sizing;
pub mod types;

// Re-export main types for convenience
pub use capabilities::{
    CapabilityError, LedgerStore, MarketData, PortfolioProvider, QuoteProvider, StoreError,
    TradeGateway,
};
pub use client::GatewayClient;
pub use config::{ExecutionConfig, RiskConfig, RunnerConfig, ScheduleConfig};
pub use ledger::{DecisionLedger, LedgerAnalytics, LedgerFilter, LedgerRecord, RecordPayload, RecordType};
pub use pipeline::{ExecutionPipeline, PipelineError};
pub use scheduler::{Scheduler, SchedulerError};
pub use sizing::{position_size, SizingError};
pub use types::{
    CycleOutcome, ExecutionResult, IndicatorSnapshot, OutcomeStatus, Signal, TradeAction,
    TradeDecision, TradeQuote,
};

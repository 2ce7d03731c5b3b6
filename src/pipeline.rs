//! Execution pipeline - Analyze, Decide, Execute, Record
//!
//! One pipeline run covers a single instrument for a single cycle. The
//! stages execute strictly in order with no branching back; the decide
//! and execute stages carry guard conditions that turn the run into an
//! intentional no-trade exit. Capability failures inside the execute
//! stage become a failed `ExecutionResult`, never a crash; only the
//! analyze/decide capabilities propagate an error, and the scheduler
//! catches those at the loop boundary.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::capabilities::{
    CapabilityError, MarketData, PortfolioProvider, QuoteProvider, TradeGateway,
};
use crate::config::{ExecutionConfig, RiskConfig};
use crate::instrument::Instrument;
use crate::ledger::DecisionLedger;
use crate::signal;
use crate::sizing::{self, SizingError};
use crate::types::{
    CycleOutcome, ExecutionResult, OutcomeStatus, Signal, TradeAction, TradeDecision,
};

/// Errors escaping a pipeline run. Caught by the scheduler loop; never
/// allowed to terminate it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("{stage} capability failed for {instrument}: {source}")]
    Capability {
        stage: &'static str,
        instrument: String,
        #[source]
        source: CapabilityError,
    },

    #[error(transparent)]
    InvalidInput(#[from] SizingError),
}

/// Output of the decide stage
enum Decide {
    Skip(String),
    Trade(TradeDecision),
}

/// Output of the execute stage
enum Execute {
    Skip(String),
    Done(TradeDecision, ExecutionResult),
}

/// Four-stage execution pipeline over the external capabilities
pub struct ExecutionPipeline {
    market: Arc<dyn MarketData>,
    portfolio: Arc<dyn PortfolioProvider>,
    quotes: Arc<dyn QuoteProvider>,
    gateway: Arc<dyn TradeGateway>,
    ledger: Arc<DecisionLedger>,
    risk: RiskConfig,
    execution: ExecutionConfig,
}

impl ExecutionPipeline {
    pub fn new(
        market: Arc<dyn MarketData>,
        portfolio: Arc<dyn PortfolioProvider>,
        quotes: Arc<dyn QuoteProvider>,
        gateway: Arc<dyn TradeGateway>,
        ledger: Arc<DecisionLedger>,
        risk: RiskConfig,
        execution: ExecutionConfig,
    ) -> Self {
        Self {
            market,
            portfolio,
            quotes,
            gateway,
            ledger,
            risk,
            execution,
        }
    }

    /// Run all four stages for one instrument and return the normalized
    /// outcome.
    pub async fn run(&self, symbol: &str, timeframe: &str) -> Result<CycleOutcome, PipelineError> {
        let signal = self.analyze(symbol, timeframe).await?;
        let decided = self.decide(symbol, &signal).await?;

        let staged = match decided {
            Decide::Skip(reason) => Execute::Skip(reason),
            Decide::Trade(decision) => self.execute(decision).await?,
        };

        Ok(self.record(symbol, staged).await)
    }

    /// Analyze: fetch a fresh indicator snapshot and score it
    async fn analyze(&self, symbol: &str, timeframe: &str) -> Result<Signal, PipelineError> {
        let snapshot = self
            .market
            .indicators(symbol, timeframe)
            .await
            .map_err(|source| PipelineError::Capability {
                stage: "market-data",
                instrument: symbol.to_string(),
                source,
            })?;

        let signal = signal::score(&snapshot);
        debug!(
            "Analyzed {}: {} conf={:.2} rsi={:.1} vol={:.3} [{}]",
            symbol,
            signal.action,
            signal.confidence,
            snapshot.rsi,
            snapshot.volatility,
            signal.rationale()
        );

        Ok(signal)
    }

    /// Decide: confidence gate, balance fetch, position sizing
    async fn decide(&self, symbol: &str, signal: &Signal) -> Result<Decide, PipelineError> {
        if signal.action == TradeAction::Hold {
            return Ok(Decide::Skip("hold signal".to_string()));
        }
        if signal.confidence < self.risk.min_confidence {
            return Ok(Decide::Skip(format!(
                "low confidence {:.2} < {:.2}",
                signal.confidence, self.risk.min_confidence
            )));
        }

        let balance = self
            .portfolio
            .total_balance()
            .await
            .map_err(|source| PipelineError::Capability {
                stage: "portfolio",
                instrument: symbol.to_string(),
                source,
            })?;

        let stop_loss_pct = match signal.action {
            TradeAction::Buy => self.risk.stop_loss_buy_pct,
            TradeAction::Sell => self.risk.stop_loss_sell_pct,
            TradeAction::Hold => unreachable!("hold exits above"),
        };

        let size = sizing::position_size(balance, self.risk.risk_pct, stop_loss_pct)?;

        Ok(Decide::Trade(TradeDecision {
            id: Uuid::new_v4(),
            instrument: symbol.to_string(),
            action: signal.action,
            size,
            rationale: signal.rationale(),
            confidence: signal.confidence,
            timestamp: Utc::now(),
        }))
    }

    /// Execute: quote guard, slippage-bounded submission, synchronous
    /// ledger append
    async fn execute(&self, decision: TradeDecision) -> Result<Execute, PipelineError> {
        let instrument = Instrument::resolve(&decision.instrument)
            .ok_or_else(|| PipelineError::UnknownInstrument(decision.instrument.clone()))?;

        // Buy spends the quote token; sell mirrors with tokens reversed
        let (token_in, token_out) = match decision.action {
            TradeAction::Buy => (&instrument.quote, &instrument.base),
            _ => (&instrument.base, &instrument.quote),
        };

        // Shave the fee buffer off the sized amount to leave room for
        // fees and slippage
        let amount_in = decision.size * bps_remainder(self.execution.fee_buffer_bps);

        let quote = match self
            .quotes
            .quote(&token_in.address, &token_out.address, amount_in)
            .await
        {
            Ok(quote) => quote,
            Err(e) => {
                let result = ExecutionResult::failed(amount_in, format!("quote failed: {e}"));
                self.append_decision(&decision, &result).await;
                return Ok(Execute::Done(decision, result));
            }
        };

        if quote.price_impact_pct >= self.execution.max_price_impact_pct {
            return Ok(Execute::Skip("price impact too high".to_string()));
        }

        let min_amount_out = quote.amount_out * bps_remainder(self.execution.max_slippage_bps);

        let result = match self
            .gateway
            .execute(
                &token_in.address,
                &token_out.address,
                amount_in,
                min_amount_out,
            )
            .await
        {
            Ok(tx_ref) => ExecutionResult {
                executed: true,
                tx_ref: Some(tx_ref),
                amount_in,
                estimated_out: quote.amount_out,
                price_impact_pct: quote.price_impact_pct,
                pnl: None,
                reason: None,
            },
            Err(e) => {
                let mut result =
                    ExecutionResult::failed(amount_in, format!("execution failed: {e}"));
                result.estimated_out = quote.amount_out;
                result.price_impact_pct = quote.price_impact_pct;
                result
            }
        };

        self.append_decision(&decision, &result).await;
        Ok(Execute::Done(decision, result))
    }

    /// Record: normalize the terminal stage into a status and message
    async fn record(&self, symbol: &str, staged: Execute) -> CycleOutcome {
        match staged {
            Execute::Skip(reason) => {
                let message = format!("skipped: {reason}");
                // Best-effort insight so skips leave a ledger trace too
                if let Err(e) = self.ledger.append_insight(symbol, &message, 0.0).await {
                    warn!("Ledger unreachable for {} insight: {}", symbol, e);
                }
                CycleOutcome {
                    instrument: symbol.to_string(),
                    status: OutcomeStatus::Skipped,
                    message,
                    result: None,
                }
            }
            Execute::Done(decision, result) => {
                let message = if result.executed {
                    format!(
                        "trade executed: {} {} {} (est out {}, impact {:.2}%)",
                        decision.action,
                        result.amount_in,
                        decision.instrument,
                        result.estimated_out,
                        result.price_impact_pct
                    )
                } else {
                    format!(
                        "trade not executed: {}",
                        result.reason.as_deref().unwrap_or("unknown")
                    )
                };
                CycleOutcome {
                    instrument: symbol.to_string(),
                    status: OutcomeStatus::Success,
                    message,
                    result: Some(result),
                }
            }
        }
    }

    /// Append the decision record; store unavailability is logged, never
    /// fatal to the cycle.
    async fn append_decision(&self, decision: &TradeDecision, result: &ExecutionResult) {
        if let Err(e) = self.ledger.append_decision(decision, result).await {
            warn!(
                "Ledger unreachable for {} decision {}: {}",
                decision.instrument, decision.id, e
            );
        }
    }
}

/// Multiplier leaving `bps` basis points of headroom (100 bps -> 0.99)
fn bps_remainder(bps: u32) -> Decimal {
    (Decimal::from(10_000u32) - Decimal::from(bps)) / Decimal::from(10_000u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bps_remainder() {
        use std::str::FromStr;
        assert_eq!(bps_remainder(100), Decimal::from_str("0.99").unwrap());
        assert_eq!(bps_remainder(0), Decimal::ONE);
        assert_eq!(bps_remainder(10_000), Decimal::ZERO);
    }
}

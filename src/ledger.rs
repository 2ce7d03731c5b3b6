//! Decision ledger - append-only record keeping and analytics
//!
//! Wraps the durable store capability with record construction (unique
//! identity via a process-monotonic sequence), filtered retrieval, and
//! aggregate trade analytics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capabilities::{LedgerStore, StoreError};
use crate::types::{ExecutionResult, TradeAction, TradeDecision};

/// How many decision records one analytics pass scans
const ANALYTICS_SCAN_LIMIT: usize = 500;

/// Ledger record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Decision,
    Insight,
}

/// One append-only ledger record.
///
/// Identity is (record_type, instrument, timestamp, seq); `seq` is a
/// process-monotonic tie-break so same-millisecond appends stay unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub record_type: RecordType,
    pub instrument: String,
    pub timestamp: DateTime<Utc>,
    pub seq: u64,
    pub payload: RecordPayload,
}

/// Record payload by kind
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordPayload {
    Decision {
        decision_id: uuid::Uuid,
        action: TradeAction,
        size: Decimal,
        confidence: f64,
        rationale: String,
        executed: bool,
        tx_ref: Option<String>,
        amount_in: Decimal,
        estimated_out: Decimal,
        price_impact_pct: f64,
        /// Realized PnL once known; None until settled
        pnl: Option<Decimal>,
        reason: Option<String>,
    },
    Insight {
        text: String,
        confidence: f64,
    },
}

/// Retrieval filter for `query`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub record_type: Option<RecordType>,
    pub instrument: Option<String>,
    pub limit: usize,
}

/// Aggregate analytics over executed decisions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerAnalytics {
    pub total_trades: usize,
    pub profitable_trades: usize,
    /// profitable / total * 100, 0 when no trades
    pub win_rate: f64,
    pub total_profit: Decimal,
    /// total_profit / total, 0 when no trades
    pub average_profit: Decimal,
}

/// Append-only decision ledger over a store capability
pub struct DecisionLedger {
    store: Arc<dyn LedgerStore>,
    seq: AtomicU64,
}

impl DecisionLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Append a decision record for an execution outcome.
    ///
    /// Fails with `StoreError::Unavailable` when the store is
    /// unreachable; callers log and continue, never failing the cycle.
    pub async fn append_decision(
        &self,
        decision: &TradeDecision,
        result: &ExecutionResult,
    ) -> Result<(), StoreError> {
        let record = LedgerRecord {
            record_type: RecordType::Decision,
            instrument: decision.instrument.clone(),
            timestamp: Utc::now(),
            seq: self.next_seq(),
            payload: RecordPayload::Decision {
                decision_id: decision.id,
                action: decision.action,
                size: decision.size,
                confidence: decision.confidence,
                rationale: decision.rationale.clone(),
                executed: result.executed,
                tx_ref: result.tx_ref.clone(),
                amount_in: result.amount_in,
                estimated_out: result.estimated_out,
                price_impact_pct: result.price_impact_pct,
                pnl: result.pnl,
                reason: result.reason.clone(),
            },
        };

        self.store.append(&record).await?;
        debug!(
            "Ledger decision recorded: {} {} seq={}",
            decision.instrument, decision.action, record.seq
        );
        Ok(())
    }

    /// Append a free-text insight annotation. Side-channel only; never a
    /// control input to the pipeline.
    pub async fn append_insight(
        &self,
        instrument: &str,
        text: &str,
        confidence: f64,
    ) -> Result<(), StoreError> {
        let record = LedgerRecord {
            record_type: RecordType::Insight,
            instrument: instrument.to_string(),
            timestamp: Utc::now(),
            seq: self.next_seq(),
            payload: RecordPayload::Insight {
                text: text.to_string(),
                confidence,
            },
        };

        self.store.append(&record).await?;
        debug!("Ledger insight recorded: {} seq={}", instrument, record.seq);
        Ok(())
    }

    /// Filtered retrieval, most relevant first (store ordering)
    pub async fn query(&self, filter: &LedgerFilter) -> Result<Vec<LedgerRecord>, StoreError> {
        let mut records = self.store.query(filter).await?;
        if filter.limit > 0 {
            records.truncate(filter.limit);
        }
        Ok(records)
    }

    /// Aggregate analytics over the executed subset of decision records,
    /// optionally scoped to one instrument.
    pub async fn analytics(
        &self,
        instrument: Option<&str>,
    ) -> Result<LedgerAnalytics, StoreError> {
        let filter = LedgerFilter {
            record_type: Some(RecordType::Decision),
            instrument: instrument.map(str::to_string),
            limit: ANALYTICS_SCAN_LIMIT,
        };

        let records = self.query(&filter).await?;

        let mut total_trades = 0usize;
        let mut profitable_trades = 0usize;
        let mut total_profit = Decimal::ZERO;

        for record in &records {
            if let RecordPayload::Decision { executed, pnl, .. } = &record.payload {
                if !executed {
                    continue;
                }
                total_trades += 1;
                let pnl = pnl.unwrap_or(Decimal::ZERO);
                if pnl > Decimal::ZERO {
                    profitable_trades += 1;
                }
                total_profit += pnl;
            }
        }

        let (win_rate, average_profit) = if total_trades > 0 {
            (
                profitable_trades as f64 / total_trades as f64 * 100.0,
                total_profit / Decimal::from(total_trades as u64),
            )
        } else {
            (0.0, Decimal::ZERO)
        };

        Ok(LedgerAnalytics {
            total_trades,
            profitable_trades,
            win_rate,
            total_profit,
            average_profit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use std::sync::Mutex;

    /// In-memory store, newest records first like a relevance-ordered
    /// remote store
    struct MemoryStore {
        records: Mutex<Vec<LedgerRecord>>,
        fail: bool,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
                fail: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl LedgerStore for MemoryStore {
        async fn append(&self, record: &LedgerRecord) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("store offline".to_string()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn query(&self, filter: &LedgerFilter) -> Result<Vec<LedgerRecord>, StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("store offline".to_string()));
            }
            let records = self.records.lock().unwrap();
            Ok(records
                .iter()
                .rev()
                .filter(|r| {
                    filter
                        .record_type
                        .map(|t| r.record_type == t)
                        .unwrap_or(true)
                        && filter
                            .instrument
                            .as_ref()
                            .map(|i| &r.instrument == i)
                            .unwrap_or(true)
                })
                .cloned()
                .collect())
        }
    }

    fn decision(instrument: &str) -> TradeDecision {
        TradeDecision {
            id: uuid::Uuid::new_v4(),
            instrument: instrument.to_string(),
            action: TradeAction::Buy,
            size: Decimal::from(100),
            rationale: "oversold".to_string(),
            confidence: 0.75,
            timestamp: Utc::now(),
        }
    }

    fn executed_result(pnl: i64) -> ExecutionResult {
        ExecutionResult {
            executed: true,
            tx_ref: Some("sig".to_string()),
            amount_in: Decimal::from(99),
            estimated_out: Decimal::from(1),
            price_impact_pct: 0.3,
            pnl: Some(Decimal::from(pnl)),
            reason: None,
        }
    }

    #[tokio::test]
    async fn test_analytics_over_executed_decisions() {
        let store = Arc::new(MemoryStore::new());
        let ledger = DecisionLedger::new(store);

        for pnl in [10, -5, 20, 0] {
            ledger
                .append_decision(&decision("SOL/USDC"), &executed_result(pnl))
                .await
                .unwrap();
        }

        let analytics = ledger.analytics(None).await.unwrap();
        assert_eq!(analytics.total_trades, 4);
        assert_eq!(analytics.profitable_trades, 2);
        assert_eq!(analytics.win_rate, 50.0);
        assert_eq!(analytics.total_profit, Decimal::from(25));
        assert_eq!(
            analytics.average_profit,
            Decimal::from_str("6.25").unwrap()
        );
    }

    #[tokio::test]
    async fn test_analytics_empty_is_zeroed() {
        let ledger = DecisionLedger::new(Arc::new(MemoryStore::new()));
        let analytics = ledger.analytics(Some("SOL/USDC")).await.unwrap();
        assert_eq!(analytics.total_trades, 0);
        assert_eq!(analytics.win_rate, 0.0);
        assert_eq!(analytics.average_profit, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_non_executed_decisions_excluded() {
        let store = Arc::new(MemoryStore::new());
        let ledger = DecisionLedger::new(store);

        ledger
            .append_decision(&decision("SOL/USDC"), &executed_result(10))
            .await
            .unwrap();
        ledger
            .append_decision(
                &decision("SOL/USDC"),
                &ExecutionResult::failed(Decimal::from(99), "quote failed"),
            )
            .await
            .unwrap();

        let analytics = ledger.analytics(None).await.unwrap();
        assert_eq!(analytics.total_trades, 1);
    }

    #[tokio::test]
    async fn test_seq_is_monotonic_per_process() {
        let store = Arc::new(MemoryStore::new());
        let ledger = DecisionLedger::new(store.clone());

        ledger
            .append_insight("SOL/USDC", "skip: low confidence", 0.4)
            .await
            .unwrap();
        ledger
            .append_insight("SOL/USDC", "skip: hold", 0.0)
            .await
            .unwrap();

        let records = store.records.lock().unwrap();
        assert_eq!(records[0].seq, 0);
        assert_eq!(records[1].seq, 1);
    }

    #[tokio::test]
    async fn test_query_filters_and_limits() {
        let store = Arc::new(MemoryStore::new());
        let ledger = DecisionLedger::new(store);

        ledger
            .append_decision(&decision("SOL/USDC"), &executed_result(1))
            .await
            .unwrap();
        ledger
            .append_decision(&decision("WETH/USDC"), &executed_result(2))
            .await
            .unwrap();
        ledger
            .append_insight("SOL/USDC", "note", 0.5)
            .await
            .unwrap();

        let filter = LedgerFilter {
            record_type: Some(RecordType::Decision),
            instrument: Some("SOL/USDC".to_string()),
            limit: 10,
        };
        let records = ledger.query(&filter).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].instrument, "SOL/USDC");

        let capped = ledger
            .query(&LedgerFilter {
                record_type: None,
                instrument: None,
                limit: 2,
            })
            .await
            .unwrap();
        assert_eq!(capped.len(), 2);
    }

    #[tokio::test]
    async fn test_unavailable_store_surfaces_error() {
        let ledger = DecisionLedger::new(Arc::new(MemoryStore::failing()));
        let err = ledger
            .append_insight("SOL/USDC", "note", 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}

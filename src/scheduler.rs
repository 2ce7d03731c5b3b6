//! Scheduler - rotation loop with cooldown, pacing, and error containment
//!
//! A single long-lived task drives the pipeline across the instrument
//! rotation. Per-instrument failures are caught and logged at the loop
//! boundary; the loop itself only exits when `stop()` is observed at the
//! top of an instrument iteration or a cycle. The last-trade map is owned
//! exclusively by the loop, so cooldown checks always observe the ledger
//! append that the pipeline performs before returning an executed
//! outcome.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ScheduleConfig;
use crate::ledger::DecisionLedger;
use crate::pipeline::ExecutionPipeline;

/// Lifecycle misuse errors
#[derive(Debug, Error, PartialEq)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,
}

/// Scheduler state shared with the loop task
struct Shared {
    active: AtomicBool,
    shutdown: Notify,
}

/// Drives repeated evaluation of the instrument rotation
pub struct Scheduler {
    pipeline: Arc<ExecutionPipeline>,
    ledger: Arc<DecisionLedger>,
    instruments: Vec<String>,
    timeframe: String,
    schedule: ScheduleConfig,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new(
        pipeline: Arc<ExecutionPipeline>,
        ledger: Arc<DecisionLedger>,
        instruments: Vec<String>,
        timeframe: String,
        schedule: ScheduleConfig,
    ) -> Self {
        Self {
            pipeline,
            ledger,
            instruments,
            timeframe,
            schedule,
            shared: Arc::new(Shared {
                active: AtomicBool::new(false),
                shutdown: Notify::new(),
            }),
            handle: None,
        }
    }

    /// Whether the loop is currently running
    pub fn is_running(&self) -> bool {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Launch the evaluation loop. Fails with `AlreadyRunning` if the
    /// scheduler is already in the Running state.
    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.shared.active.swap(true, Ordering::SeqCst) {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(
            "Scheduler starting: {} instruments, cooldown {}s, cycle spacing {}s",
            self.instruments.len(),
            self.schedule.cooldown_secs,
            self.schedule.cycle_spacing_secs
        );

        let pipeline = self.pipeline.clone();
        let ledger = self.ledger.clone();
        let instruments = self.instruments.clone();
        let timeframe = self.timeframe.clone();
        let schedule = self.schedule;
        let shared = self.shared.clone();

        self.handle = Some(tokio::spawn(async move {
            run_loop(pipeline, ledger, instruments, timeframe, schedule, shared).await;
        }));

        Ok(())
    }

    /// Stop the loop and wait for the in-flight iteration to drain.
    /// Idempotent: stopping a stopped scheduler is a no-op.
    pub async fn stop(&mut self) {
        self.shared.active.store(false, Ordering::SeqCst);
        self.shared.shutdown.notify_waiters();

        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                error!("Scheduler task join error: {e}");
            }
            info!("Scheduler stopped");
        }
    }
}

/// Whole-cycle failure: every instrument in the rotation failed
#[derive(Debug, Error)]
#[error("all {0} instruments failed this cycle")]
struct CycleError(usize);

async fn run_loop(
    pipeline: Arc<ExecutionPipeline>,
    ledger: Arc<DecisionLedger>,
    instruments: Vec<String>,
    timeframe: String,
    schedule: ScheduleConfig,
    shared: Arc<Shared>,
) {
    let cooldown = chrono::Duration::seconds(schedule.cooldown_secs as i64);
    let mut last_trade: HashMap<String, DateTime<Utc>> = HashMap::new();

    while shared.active.load(Ordering::SeqCst) {
        let cycle = run_cycle(
            &pipeline,
            &ledger,
            &instruments,
            &timeframe,
            &schedule,
            &shared,
            cooldown,
            &mut last_trade,
        )
        .await;

        if let Err(e) = cycle {
            error!(
                "Cycle error: {e}; backing off {}s",
                schedule.error_backoff_secs
            );
            pause(&shared, Duration::from_secs(schedule.error_backoff_secs)).await;
            continue;
        }

        pause(&shared, Duration::from_secs(schedule.cycle_spacing_secs)).await;
    }

    info!("Scheduler loop exited");
}

#[allow(clippy::too_many_arguments)]
async fn run_cycle(
    pipeline: &ExecutionPipeline,
    ledger: &DecisionLedger,
    instruments: &[String],
    timeframe: &str,
    schedule: &ScheduleConfig,
    shared: &Shared,
    cooldown: chrono::Duration,
    last_trade: &mut HashMap<String, DateTime<Utc>>,
) -> Result<(), CycleError> {
    let mut failures = 0usize;

    for symbol in instruments {
        if !shared.active.load(Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(last) = last_trade.get(symbol) {
            let elapsed = Utc::now() - *last;
            if elapsed < cooldown {
                debug!(
                    "Cooldown active for {} ({}s of {}s elapsed), skipping",
                    symbol,
                    elapsed.num_seconds(),
                    cooldown.num_seconds()
                );
                continue;
            }
        }

        match pipeline.run(symbol, timeframe).await {
            Ok(outcome) => {
                if outcome.executed() {
                    // The pipeline appended the decision record before
                    // returning, so this update is ordered after it
                    last_trade.insert(symbol.clone(), Utc::now());
                }
                // Exactly one log line per decision or skip
                info!("{}: {}", symbol, outcome.message);
            }
            Err(e) => {
                failures += 1;
                warn!("Pipeline error for {}: {}", symbol, e);
                if let Err(se) = ledger
                    .append_insight(symbol, &format!("pipeline failure: {e}"), 0.0)
                    .await
                {
                    debug!("Could not record failure insight for {}: {}", symbol, se);
                }
            }
        }

        pause(shared, Duration::from_secs(schedule.instrument_spacing_secs)).await;
    }

    if !instruments.is_empty() && failures == instruments.len() {
        return Err(CycleError(failures));
    }
    Ok(())
}

/// Sleep that wakes early on shutdown so stop latency stays bounded
async fn pause(shared: &Shared, duration: Duration) {
    if duration.is_zero() {
        // Still a suspension point, so a zero-spacing loop cannot starve
        // the runtime
        tokio::task::yield_now().await;
        return;
    }

    // notify_waiters() only wakes futures already registered, so enable
    // the waiter first and then re-check the flag: a stop() issued while
    // the loop was inside the pipeline is caught by the flag, and one
    // issued after the load lands in the enabled waiter.
    let shutdown = shared.shutdown.notified();
    tokio::pin!(shutdown);
    shutdown.as_mut().enable();

    if !shared.active.load(Ordering::SeqCst) {
        return;
    }

    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        _ = &mut shutdown => {}
    }
}

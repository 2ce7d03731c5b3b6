//! Runner configuration

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Full runner configuration: instrument rotation plus the risk,
/// execution, and scheduling knobs. Defaults match the production
/// policy; individual fields can be overridden from the environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerConfig {
    /// Instrument rotation, evaluated in order each cycle
    #[serde(default = "default_instruments")]
    pub instruments: Vec<String>,
    /// Indicator timeframe requested from market data
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            instruments: default_instruments(),
            timeframe: default_timeframe(),
            risk: RiskConfig::default(),
            execution: ExecutionConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// - `INSTRUMENTS` - comma-separated pair symbols
    /// - `TIMEFRAME` - indicator timeframe (e.g. "1h")
    /// - `COOLDOWN_SECS`, `INSTRUMENT_SPACING_SECS`, `CYCLE_SPACING_SECS`
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("INSTRUMENTS") {
            let instruments: Vec<String> = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if instruments.is_empty() {
                return Err(anyhow::anyhow!("INSTRUMENTS is set but empty: {raw}"));
            }
            config.instruments = instruments;
        }

        if let Ok(tf) = std::env::var("TIMEFRAME") {
            config.timeframe = tf;
        }

        if let Ok(raw) = std::env::var("COOLDOWN_SECS") {
            config.schedule.cooldown_secs = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid COOLDOWN_SECS: {e}"))?;
        }
        if let Ok(raw) = std::env::var("INSTRUMENT_SPACING_SECS") {
            config.schedule.instrument_spacing_secs = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid INSTRUMENT_SPACING_SECS: {e}"))?;
        }
        if let Ok(raw) = std::env::var("CYCLE_SPACING_SECS") {
            config.schedule.cycle_spacing_secs = raw
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid CYCLE_SPACING_SECS: {e}"))?;
        }

        Ok(config)
    }
}

/// Risk policy applied at the decide stage
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RiskConfig {
    /// Minimum signal confidence to trade
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    /// Risk per decision, percent of balance
    #[serde(default = "default_risk_pct")]
    pub risk_pct: Decimal,
    /// Stop-loss percent for buys
    #[serde(default = "default_stop_loss_buy_pct")]
    pub stop_loss_buy_pct: Decimal,
    /// Stop-loss percent for sells
    #[serde(default = "default_stop_loss_sell_pct")]
    pub stop_loss_sell_pct: Decimal,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            risk_pct: default_risk_pct(),
            stop_loss_buy_pct: default_stop_loss_buy_pct(),
            stop_loss_sell_pct: default_stop_loss_sell_pct(),
        }
    }
}

/// Execution guards applied at the execute stage
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ExecutionConfig {
    /// Max quoted price impact percentage; at or above this the trade is
    /// skipped
    #[serde(default = "default_max_price_impact_pct")]
    pub max_price_impact_pct: f64,
    /// Slippage tolerance in basis points below the quoted output
    #[serde(default = "default_max_slippage_bps")]
    pub max_slippage_bps: u32,
    /// Fee/slippage buffer in basis points shaved off the position size
    #[serde(default = "default_fee_buffer_bps")]
    pub fee_buffer_bps: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_price_impact_pct: default_max_price_impact_pct(),
            max_slippage_bps: default_max_slippage_bps(),
            fee_buffer_bps: default_fee_buffer_bps(),
        }
    }
}

/// Scheduling cadence and containment intervals
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Minimum elapsed seconds after an executed trade before
    /// re-evaluating the same instrument
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    /// Sleep between instruments within a cycle (downstream rate limits)
    #[serde(default = "default_instrument_spacing_secs")]
    pub instrument_spacing_secs: u64,
    /// Sleep between full rotations
    #[serde(default = "default_cycle_spacing_secs")]
    pub cycle_spacing_secs: u64,
    /// Backoff after a whole-cycle error
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
            instrument_spacing_secs: default_instrument_spacing_secs(),
            cycle_spacing_secs: default_cycle_spacing_secs(),
            error_backoff_secs: default_error_backoff_secs(),
        }
    }
}

fn default_instruments() -> Vec<String> {
    vec!["SOL/USDC".to_string(), "WETH/USDC".to_string()]
}
fn default_timeframe() -> String {
    "1h".to_string()
}
fn default_min_confidence() -> f64 {
    0.6
}
fn default_risk_pct() -> Decimal {
    Decimal::new(15, 1) // 1.5%
}
fn default_stop_loss_buy_pct() -> Decimal {
    Decimal::from(3)
}
fn default_stop_loss_sell_pct() -> Decimal {
    Decimal::from(2)
}
fn default_max_price_impact_pct() -> f64 {
    1.5
}
fn default_max_slippage_bps() -> u32 {
    100
}
fn default_fee_buffer_bps() -> u32 {
    100
}
fn default_cooldown_secs() -> u64 {
    3600
}
fn default_instrument_spacing_secs() -> u64 {
    5
}
fn default_cycle_spacing_secs() -> u64 {
    300
}
fn default_error_backoff_secs() -> u64 {
    60
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_defaults_match_policy() {
        let config = RunnerConfig::default();
        assert_eq!(config.risk.min_confidence, 0.6);
        assert_eq!(config.risk.risk_pct, Decimal::from_str("1.5").unwrap());
        assert_eq!(config.risk.stop_loss_buy_pct, Decimal::from(3));
        assert_eq!(config.risk.stop_loss_sell_pct, Decimal::from(2));
        assert_eq!(config.execution.max_price_impact_pct, 1.5);
        assert_eq!(config.execution.max_slippage_bps, 100);
        assert_eq!(config.execution.fee_buffer_bps, 100);
        assert_eq!(config.schedule.cooldown_secs, 3600);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: RunnerConfig =
            serde_json::from_str(r#"{"instruments": ["SOL/USDC"]}"#).unwrap();
        assert_eq!(config.instruments, vec!["SOL/USDC"]);
        assert_eq!(config.risk.min_confidence, 0.6);
        assert_eq!(config.schedule.cycle_spacing_secs, 300);
    }
}

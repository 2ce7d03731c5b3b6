//! Signal engine - deterministic rule scoring over indicator snapshots
//!
//! Each rule is evaluated independently and fires at most once,
//! contributing a fixed amount to the confidence score and appending its
//! phrase to the rationale. No rule performs I/O and scoring never fails.

use crate::types::{IndicatorSnapshot, Signal, TradeAction};

/// RSI below this is oversold (buy bias)
const RSI_OVERSOLD: f64 = 30.0;
/// RSI above this is overbought (sell bias)
const RSI_OVERBOUGHT: f64 = 70.0;
/// Volume above this counts as confirmation
const VOLUME_CONFIRMATION_THRESHOLD: f64 = 1_000_000.0;
/// Volatility above this dampens confidence
const HIGH_VOLATILITY_THRESHOLD: f64 = 0.05;
/// Dampening multiplier applied in high-volatility regimes
const VOLATILITY_DAMPENING: f64 = 0.8;

const RSI_CONTRIB: f64 = 0.30;
const MACD_CONTRIB: f64 = 0.25;
const MA_CONTRIB: f64 = 0.20;
const VOLUME_CONTRIB: f64 = 0.15;

/// Score an indicator snapshot into an action/confidence verdict.
///
/// Total function: any snapshot yields a signal, defaulting to hold with
/// zero confidence when no rule fires. Confidence is clamped to [0, 1]
/// and rounded to two decimals.
pub fn score(snapshot: &IndicatorSnapshot) -> Signal {
    let mut bias: Option<TradeAction> = None;
    let mut confidence = 0.0;
    let mut reasons = Vec::new();

    // Rule 1: momentum oscillator extremes
    if snapshot.rsi < RSI_OVERSOLD {
        bias = Some(TradeAction::Buy);
        confidence += RSI_CONTRIB;
        reasons.push("oversold".to_string());
    } else if snapshot.rsi > RSI_OVERBOUGHT {
        bias = Some(TradeAction::Sell);
        confidence += RSI_CONTRIB;
        reasons.push("overbought".to_string());
    }

    // Rule 2: trend-convergence crossover
    if snapshot.macd_line > snapshot.macd_signal && snapshot.macd_histogram > 0.0 {
        if bias.is_none() {
            bias = Some(TradeAction::Buy);
        }
        confidence += MACD_CONTRIB;
        reasons.push("bullish crossover".to_string());
    } else if snapshot.macd_line < snapshot.macd_signal && snapshot.macd_histogram < 0.0 {
        if bias.is_none() {
            bias = Some(TradeAction::Sell);
        }
        confidence += MACD_CONTRIB;
        reasons.push("bearish crossover".to_string());
    }

    // Rule 3: moving-average alignment
    if snapshot.ema_12 > snapshot.ema_26 {
        if bias.is_none() {
            bias = Some(TradeAction::Buy);
        }
        confidence += MA_CONTRIB;
        reasons.push("bullish alignment".to_string());
    } else if snapshot.ema_12 < snapshot.ema_26 {
        if bias.is_none() {
            bias = Some(TradeAction::Sell);
        }
        confidence += MA_CONTRIB;
        reasons.push("bearish alignment".to_string());
    }

    // Rule 4: volume confirmation (never sets bias)
    if snapshot.volume > VOLUME_CONFIRMATION_THRESHOLD {
        confidence += VOLUME_CONTRIB;
        reasons.push("volume confirmation".to_string());
    }

    // Rule 5: volatility dampening
    if snapshot.volatility > HIGH_VOLATILITY_THRESHOLD {
        confidence *= VOLATILITY_DAMPENING;
        reasons.push("high volatility".to_string());
    }

    Signal {
        action: bias.unwrap_or(TradeAction::Hold),
        confidence: round2(confidence.clamp(0.0, 1.0)),
        reasons,
        target_price: None,
        stop_loss: None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn neutral_snapshot() -> IndicatorSnapshot {
        IndicatorSnapshot {
            rsi: 50.0,
            macd_line: 0.0,
            macd_signal: 0.0,
            macd_histogram: 0.0,
            sma_20: 100.0,
            sma_50: 100.0,
            ema_12: 100.0,
            ema_26: 100.0,
            volume: 0.0,
            volatility: 0.01,
        }
    }

    #[test]
    fn test_all_bullish_rules_fire() {
        let snapshot = IndicatorSnapshot {
            rsi: 20.0,
            macd_line: 1.5,
            macd_signal: 1.0,
            macd_histogram: 0.5,
            ema_12: 105.0,
            ema_26: 100.0,
            volume: 2_000_000.0,
            volatility: 0.02,
            ..neutral_snapshot()
        };

        let signal = score(&snapshot);
        assert_eq!(signal.action, TradeAction::Buy);
        // 0.30 + 0.25 + 0.20 + 0.15, no dampening
        assert_eq!(signal.confidence, 0.90);
        assert_eq!(
            signal.rationale(),
            "oversold, bullish crossover, bullish alignment, volume confirmation"
        );
    }

    #[test]
    fn test_neutral_snapshot_holds() {
        let signal = score(&neutral_snapshot());
        assert_eq!(signal.action, TradeAction::Hold);
        assert_eq!(signal.confidence, 0.0);
        assert!(signal.reasons.is_empty());
    }

    #[test]
    fn test_overbought_sell_bias() {
        let snapshot = IndicatorSnapshot {
            rsi: 80.0,
            ..neutral_snapshot()
        };

        let signal = score(&snapshot);
        assert_eq!(signal.action, TradeAction::Sell);
        assert_eq!(signal.confidence, 0.30);
    }

    #[test]
    fn test_first_rule_wins_the_bias() {
        // Oversold buy bias must not be flipped by a bearish alignment
        let snapshot = IndicatorSnapshot {
            rsi: 20.0,
            ema_12: 95.0,
            ema_26: 100.0,
            ..neutral_snapshot()
        };

        let signal = score(&snapshot);
        assert_eq!(signal.action, TradeAction::Buy);
        // 0.30 (oversold) + 0.20 (bearish alignment still contributes)
        assert_eq!(signal.confidence, 0.50);
    }

    #[test]
    fn test_volatility_dampening() {
        let snapshot = IndicatorSnapshot {
            rsi: 20.0,
            macd_line: 1.5,
            macd_signal: 1.0,
            macd_histogram: 0.5,
            volatility: 0.10,
            ..neutral_snapshot()
        };

        let signal = score(&snapshot);
        // (0.30 + 0.25) * 0.8
        assert_eq!(signal.confidence, 0.44);
        assert_eq!(
            signal.reasons.last().map(String::as_str),
            Some("high volatility")
        );
    }

    #[test]
    fn test_confidence_stays_in_bounds() {
        let fixtures = [
            neutral_snapshot(),
            IndicatorSnapshot {
                rsi: 5.0,
                macd_line: 3.0,
                macd_signal: 1.0,
                macd_histogram: 2.0,
                ema_12: 120.0,
                ema_26: 100.0,
                volume: 9_000_000.0,
                volatility: 0.02,
                ..neutral_snapshot()
            },
            IndicatorSnapshot {
                rsi: 95.0,
                macd_line: -3.0,
                macd_signal: -1.0,
                macd_histogram: -2.0,
                ema_12: 80.0,
                ema_26: 100.0,
                volume: 9_000_000.0,
                volatility: 0.20,
                ..neutral_snapshot()
            },
        ];

        for snapshot in &fixtures {
            let signal = score(snapshot);
            assert!(
                (0.0..=1.0).contains(&signal.confidence),
                "confidence {} out of bounds",
                signal.confidence
            );
        }
    }
}

//! RSI (Relative Strength Index) with Wilder's smoothing.
//!
//! - Seed averages: simple mean of gains/losses over the first `period` deltas
//! - Subsequent: avg = (prev_avg * (period - 1) + current) / period
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss)),
//! with RSI = 100 whenever avg_loss == 0.
//!
//! The output has the same length as the input. The first `period` entries
//! are `None` (warm-up); a series with `len <= period` is all `None`.

/// Compute the RSI series over close prices. Deterministic and pure: the
/// same input slice always yields bit-identical output.
pub fn compute_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    if period == 0 || n <= period {
        return vec![None; n];
    }

    let mut values = vec![None; n];

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = closes[i] - closes[i - 1];
        avg_gain += delta.max(0.0);
        avg_loss += (-delta).max(0.0);
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    values[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..n {
        let delta = closes[i] - closes[i - 1];
        avg_gain = (avg_gain * (period - 1) as f64 + delta.max(0.0)) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + (-delta).max(0.0)) / period as f64;
        values[i] = Some(rsi_value(avg_gain, avg_loss));
    }

    values
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series() {
        assert!(compute_rsi(&[], 14).is_empty());
    }

    #[test]
    fn series_no_longer_than_period_is_all_none() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        let rsi = compute_rsi(&closes, 14);
        assert_eq!(rsi.len(), 14);
        assert!(rsi.iter().all(|v| v.is_none()));
    }

    #[test]
    fn warm_up_entries_are_none() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + (i % 5) as f64).collect();
        let rsi = compute_rsi(&closes, 14);
        assert_eq!(rsi.len(), 20);
        for (i, value) in rsi.iter().enumerate() {
            if i < 14 {
                assert!(value.is_none(), "index {} should be warm-up", i);
            } else {
                assert!(value.is_some(), "index {} should be defined", i);
            }
        }
    }

    #[test]
    fn all_gains_is_100() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 + i as f64).collect();
        let rsi = compute_rsi(&closes, 14);
        assert_eq!(rsi[14], Some(100.0));
        assert_eq!(rsi[15], Some(100.0));
    }

    #[test]
    fn all_losses_is_0() {
        let closes: Vec<f64> = (0..16).map(|i| 100.0 - i as f64).collect();
        let rsi = compute_rsi(&closes, 14);
        let first = rsi[14].unwrap();
        assert!(first.abs() < f64::EPSILON, "RSI should be 0, got {}", first);
    }

    #[test]
    fn values_stay_in_range() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i * 7) % 13) as f64 - 6.0)
            .collect();
        for value in compute_rsi(&closes, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&value), "RSI {} out of range", value);
        }
    }

    #[test]
    fn known_wilder_seed_value() {
        // period 2 over closes [100, 99, 98, 105]:
        // deltas -1, -1, +7; seed avg_gain 0, avg_loss 1 -> RSI[2] = 0
        // then avg_gain (0*1+7)/2 = 3.5, avg_loss (1*1+0)/2 = 0.5
        // RS = 7 -> RSI[3] = 100 - 100/8 = 87.5
        let rsi = compute_rsi(&[100.0, 99.0, 98.0, 105.0], 2);
        assert_eq!(rsi[0], None);
        assert_eq!(rsi[1], None);
        assert!(rsi[2].unwrap().abs() < f64::EPSILON);
        assert!((rsi[3].unwrap() - 87.5).abs() < 1e-9);
    }

    #[test]
    fn flat_series_is_100() {
        // No losses at all: avg_loss stays 0 and the divide-by-zero guard
        // pins RSI at 100.
        let closes = vec![50.0; 10];
        let rsi = compute_rsi(&closes, 3);
        assert_eq!(rsi[3], Some(100.0));
        assert_eq!(rsi[9], Some(100.0));
    }

    #[test]
    fn zero_period_is_all_none() {
        let rsi = compute_rsi(&[100.0, 101.0, 102.0], 0);
        assert_eq!(rsi, vec![None, None, None]);
    }

    #[test]
    fn recomputation_is_bit_identical() {
        let closes: Vec<f64> = (0..100)
            .map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0)
            .collect();
        assert_eq!(compute_rsi(&closes, 14), compute_rsi(&closes, 14));
    }
}

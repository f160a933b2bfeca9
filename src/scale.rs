// 🎨 Color Scale - maps a bucket's net value to a visual intensity tier
// Scale is relative to the busiest bucket of the current view, floored at 100

use crate::heatmap::Bucket;
use serde::Serialize;

/// Lowest possible scale maximum; keeps quiet views from saturating
pub const SCALE_FLOOR: f64 = 100.0;

/// Ratio above which a cell label is drawn inverted
pub const INVERT_LABEL_RATIO: f64 = 0.6;

// ============================================================================
// TIER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "tone", content = "level", rename_all = "lowercase")]
pub enum Tier {
    /// Padding cell, rendered transparent
    Blank,
    /// Exactly zero
    Neutral,
    /// Net positive, intensity 1..=4
    Gain(u8),
    /// Net negative, intensity 1..=4
    Loss(u8),
}

impl Tier {
    pub fn level(&self) -> u8 {
        match self {
            Tier::Blank | Tier::Neutral => 0,
            Tier::Gain(level) | Tier::Loss(level) => *level,
        }
    }
}

// ============================================================================
// SCALE MAPPING
// ============================================================================

/// `max(100, max |value|)` over the non-padding buckets
pub fn max_abs(buckets: &[Bucket]) -> f64 {
    buckets
        .iter()
        .filter(|b| !b.is_padding)
        .map(|b| b.value.abs())
        .fold(SCALE_FLOOR, f64::max)
}

/// Quartile intensity for a ratio: [0,.25) → 1 ... [.75,∞) → 4
pub fn intensity(ratio: f64) -> u8 {
    if ratio < 0.25 {
        1
    } else if ratio < 0.5 {
        2
    } else if ratio < 0.75 {
        3
    } else {
        4
    }
}

/// Tier of a single value against the view's scale
pub fn tier_for(value: f64, max_abs: f64) -> Tier {
    if value == 0.0 {
        return Tier::Neutral;
    }

    let level = intensity(value.abs() / max_abs);
    if value > 0.0 {
        Tier::Gain(level)
    } else {
        Tier::Loss(level)
    }
}

pub fn bucket_tier(bucket: &Bucket, max_abs: f64) -> Tier {
    if bucket.is_padding {
        Tier::Blank
    } else {
        tier_for(bucket.value, max_abs)
    }
}

/// Tiers for a whole view, index-aligned with `buckets`
pub fn bucket_tiers(buckets: &[Bucket]) -> Vec<Tier> {
    let scale = max_abs(buckets);
    buckets.iter().map(|b| bucket_tier(b, scale)).collect()
}

pub fn label_inverted(value: f64, max_abs: f64) -> bool {
    value.abs() / max_abs > INVERT_LABEL_RATIO
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(value: f64) -> Bucket {
        Bucket {
            key: "k".to_string(),
            label: String::new(),
            value,
            date: None,
            day_of_week: None,
            is_padding: false,
        }
    }

    fn pad() -> Bucket {
        Bucket {
            is_padding: true,
            ..cell(0.0)
        }
    }

    #[test]
    fn test_max_abs_has_floor() {
        assert_eq!(max_abs(&[]), 100.0);
        assert_eq!(max_abs(&[cell(3.0), cell(-7.5)]), 100.0);
        assert_eq!(max_abs(&[cell(40.0), cell(-400.0)]), 400.0);
    }

    #[test]
    fn test_padding_excluded_from_scale() {
        let mut big_pad = pad();
        big_pad.value = 10_000.0;
        assert_eq!(max_abs(&[big_pad.clone(), cell(200.0)]), 200.0);
        assert_eq!(bucket_tier(&big_pad, 200.0), Tier::Blank);
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(tier_for(0.0, 100.0), Tier::Neutral);
        assert_eq!(tier_for(24.9, 100.0), Tier::Gain(1));
        assert_eq!(tier_for(25.0, 100.0), Tier::Gain(2));
        assert_eq!(tier_for(50.0, 100.0), Tier::Gain(3));
        assert_eq!(tier_for(75.0, 100.0), Tier::Gain(4));
        assert_eq!(tier_for(-100.0, 100.0), Tier::Loss(4));
        assert_eq!(tier_for(-0.01, 100.0), Tier::Loss(1));
    }

    #[test]
    fn test_tier_monotonic_in_magnitude() {
        let scale = 1000.0;
        let mut previous = 0;
        for step in 1..=200 {
            let level = tier_for(step as f64 * 5.0, scale).level();
            assert!(level >= previous, "tier dropped at step {}", step);
            previous = level;
        }

        let mut previous = 0;
        for step in 1..=200 {
            let level = tier_for(-(step as f64) * 5.0, scale).level();
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn test_bucket_tiers_align() {
        let buckets = vec![pad(), cell(0.0), cell(400.0), cell(-100.0)];
        let tiers = bucket_tiers(&buckets);

        assert_eq!(
            tiers,
            vec![Tier::Blank, Tier::Neutral, Tier::Gain(4), Tier::Loss(2)]
        );
    }

    #[test]
    fn test_label_inverted() {
        assert!(label_inverted(-61.0, 100.0));
        assert!(!label_inverted(60.0, 100.0));
    }
}

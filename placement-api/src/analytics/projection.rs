//! Heuristic projections: historical averages scaled by hand-authored
//! weight tables, with optional uniform jitter.
//!
//! Nothing here is a model. The numbers are labelled predictions in the
//! insights report and carry their jitter bound so callers can tell how much
//! of a value is noise.

use rand::Rng;
use serde::Serialize;
use ts_rs::TS;

/// Economic multiplier per province.
pub const PROVINCE_MULTIPLIERS: [(&str, f64); 9] = [
    ("Western", 1.2),
    ("Central", 1.0),
    ("Southern", 1.05),
    ("Northern", 0.85),
    ("Eastern", 0.9),
    ("North Western", 1.0),
    ("North Central", 0.9),
    ("Uva", 0.85),
    ("Sabaragamuwa", 0.95),
];

/// Seasonal multiplier per calendar month, January first.
pub const SEASONAL_MULTIPLIERS: [f64; 12] = [
    1.15, 1.05, 1.0, 0.85, 0.95, 1.0, 1.05, 1.0, 1.1, 1.05, 0.95, 0.8,
];

/// Demand multiplier per company industry.
pub const INDUSTRY_MULTIPLIERS: [(&str, f64); 7] = [
    ("Hospitality", 1.25),
    ("Construction", 1.2),
    ("Manufacturing", 1.1),
    ("Healthcare", 1.3),
    ("Agriculture", 0.95),
    ("IT", 1.15),
    ("Retail", 1.0),
];

fn lookup(table: &[(&str, f64)], key: &str) -> f64 {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key.trim()))
        .map(|(_, weight)| *weight)
        .unwrap_or(1.0)
}

/// Province weight; unknown provinces weigh 1.0.
pub fn province_multiplier(province: &str) -> f64 {
    lookup(&PROVINCE_MULTIPLIERS, province)
}

/// Industry weight; unknown industries weigh 1.0.
pub fn industry_multiplier(industry: &str) -> f64 {
    lookup(&INDUSTRY_MULTIPLIERS, industry)
}

/// Seasonal weight for a 1-based month. Out-of-range months weigh 1.0.
pub fn seasonal_multiplier(month: u32) -> f64 {
    month
        .checked_sub(1)
        .and_then(|i| SEASONAL_MULTIPLIERS.get(i as usize))
        .copied()
        .unwrap_or(1.0)
}

pub fn project(historical_average: f64, weight: f64) -> f64 {
    historical_average * weight
}

/// `min(95, 40 + 5 * history_rows)`.
pub fn confidence(history_rows: usize) -> f64 {
    (40.0 + 5.0 * history_rows as f64).min(95.0)
}

/// Uniform noise `rng() * range - offset`, i.e. in `[-offset, range - offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct Jitter {
    pub range: f64,
    pub offset: f64,
}

impl Jitter {
    pub const NONE: Jitter = Jitter {
        range: 0.0,
        offset: 0.0,
    };

    /// Symmetric noise in `[-half_width, half_width)`.
    pub const fn symmetric(half_width: f64) -> Self {
        Jitter {
            range: half_width * 2.0,
            offset: half_width,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.random::<f64>() * self.range - self.offset
    }

    pub fn lower(&self) -> f64 {
        -self.offset
    }

    pub fn upper(&self) -> f64 {
        self.range - self.offset
    }

    pub fn bound(&self) -> JitterBound {
        JitterBound {
            min: self.lower(),
            max: self.upper(),
        }
    }
}

/// The interval a jittered value's noise was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct JitterBound {
    pub min: f64,
    pub max: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_weight_lookups() {
        assert_eq!(province_multiplier("Western"), 1.2);
        assert_eq!(province_multiplier("north central"), 0.9);
        assert_eq!(province_multiplier("Atlantis"), 1.0);
        assert_eq!(industry_multiplier("Healthcare"), 1.3);
        assert_eq!(industry_multiplier("Fishing"), 1.0);
        assert_eq!(seasonal_multiplier(1), 1.15);
        assert_eq!(seasonal_multiplier(12), 0.8);
        assert_eq!(seasonal_multiplier(0), 1.0);
        assert_eq!(seasonal_multiplier(13), 1.0);
    }

    #[test]
    fn test_confidence_caps_at_95() {
        assert_eq!(confidence(0), 40.0);
        assert_eq!(confidence(6), 70.0);
        assert_eq!(confidence(11), 95.0);
        assert_eq!(confidence(40), 95.0);
    }

    #[test]
    fn test_jitter_stays_in_bound() {
        let mut rng = StdRng::seed_from_u64(7);
        let jitter = Jitter { range: 10.0, offset: 5.0 };
        for _ in 0..1000 {
            let noise = jitter.sample(&mut rng);
            assert!(noise >= jitter.lower() && noise < jitter.upper(), "{}", noise);
        }
        assert_eq!(jitter.bound(), JitterBound { min: -5.0, max: 5.0 });
    }

    #[test]
    fn test_no_jitter_is_exact() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Jitter::NONE.sample(&mut rng), 0.0);
        assert_eq!(project(10.0, province_multiplier("Western")), 12.0);
        assert_eq!(Jitter::symmetric(3.0), Jitter { range: 6.0, offset: 3.0 });
    }
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::error::{ForecastError, Result};

pub const DEFAULT_CTR_CURVE: [f64; 10] = [32.0, 25.0, 18.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CtrCurveEntry {
    pub position: u32,
    #[serde(alias = "ctr")]
    pub ctr_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CtrCurve {
    by_position: BTreeMap<u32, f64>,
}

impl CtrCurve {
    pub fn new(entries: impl IntoIterator<Item = CtrCurveEntry>) -> Result<Self> {
        let mut by_position = BTreeMap::new();
        for entry in entries {
            if entry.position == 0 || !(0.0..=100.0).contains(&entry.ctr_percent) {
                return Err(ForecastError::InvalidCtrEntry {
                    position: entry.position,
                    ctr_percent: entry.ctr_percent,
                });
            }
            by_position.insert(entry.position, entry.ctr_percent);
        }
        if by_position.is_empty() {
            return Err(ForecastError::EmptyCtrCurve);
        }
        Ok(Self { by_position })
    }

    /// CTR at `position`; positions without an entry fall back to the CTR of
    /// the deepest tabulated position.
    pub fn ctr_for_position(&self, position: u32) -> f64 {
        if let Some(ctr) = self.by_position.get(&position) {
            return *ctr;
        }
        self.by_position
            .last_key_value()
            .map(|(_, ctr)| *ctr)
            .unwrap_or(0.0)
    }

    pub fn max_position(&self) -> u32 {
        self.by_position
            .last_key_value()
            .map(|(position, _)| *position)
            .unwrap_or(0)
    }

    pub fn entries(&self) -> Vec<CtrCurveEntry> {
        self.by_position
            .iter()
            .map(|(&position, &ctr_percent)| CtrCurveEntry {
                position,
                ctr_percent,
            })
            .collect()
    }
}

impl Default for CtrCurve {
    fn default() -> Self {
        let by_position = DEFAULT_CTR_CURVE
            .iter()
            .enumerate()
            .map(|(idx, &ctr)| (idx as u32 + 1, ctr))
            .collect();
        Self { by_position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert_eq, proptest};

    fn entry(position: u32, ctr_percent: f64) -> CtrCurveEntry {
        CtrCurveEntry {
            position,
            ctr_percent,
        }
    }

    #[test]
    fn empty_curve_is_rejected() {
        let err = CtrCurve::new(Vec::new()).expect_err("empty curve");
        assert!(matches!(err, ForecastError::EmptyCtrCurve));
    }

    #[test]
    fn out_of_range_entries_are_rejected() {
        assert!(CtrCurve::new(vec![entry(0, 10.0)]).is_err());
        assert!(CtrCurve::new(vec![entry(1, 100.5)]).is_err());
        assert!(CtrCurve::new(vec![entry(1, -1.0)]).is_err());
    }

    #[test]
    fn duplicate_position_keeps_last_value() {
        let curve = CtrCurve::new(vec![entry(1, 30.0), entry(2, 20.0), entry(1, 28.0)])
            .expect("valid curve");
        assert_eq!(curve.ctr_for_position(1), 28.0);
        assert_eq!(curve.entries().len(), 2);
    }

    #[test]
    fn default_curve_covers_top_ten() {
        let curve = CtrCurve::default();
        assert_eq!(curve.max_position(), 10);
        assert_eq!(curve.ctr_for_position(1), 32.0);
        assert_eq!(curve.ctr_for_position(8), 4.0);
    }

    #[test]
    fn unordered_entries_fall_back_to_deepest_position() {
        let curve = CtrCurve::new(vec![entry(5, 7.0), entry(1, 30.0), entry(3, 12.0)])
            .expect("valid curve");
        assert_eq!(curve.max_position(), 5);
        assert_eq!(curve.ctr_for_position(2), 7.0);
        assert_eq!(curve.ctr_for_position(40), 7.0);
    }

    proptest! {
        #[test]
        fn prop_positions_past_the_curve_use_last_known_ctr(position in 11u32..500) {
            let curve = CtrCurve::default();
            prop_assert_eq!(curve.ctr_for_position(position), curve.ctr_for_position(10));
        }
    }
}

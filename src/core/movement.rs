pub const FAST_PHASE_FLOOR: f64 = 15.0;
pub const HARD_PHASE_CEILING: f64 = 6.0;

pub fn base_drift(msv: f64) -> f64 {
    if msv <= 500.0 {
        1.5
    } else if msv <= 2_000.0 {
        1.0
    } else if msv <= 10_000.0 {
        0.75
    } else {
        0.5
    }
}

pub fn phase_multiplier(position: f64) -> f64 {
    if position > FAST_PHASE_FLOOR {
        3.0
    } else if position > HARD_PHASE_CEILING {
        1.0
    } else {
        0.5
    }
}

pub fn monthly_drift(
    msv: f64,
    phase_multiplier: f64,
    speed_factor: f64,
    scenario_multiplier: f64,
) -> f64 {
    (base_drift(msv) * speed_factor * phase_multiplier * scenario_multiplier).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn base_drift_tier_boundaries_are_inclusive() {
        assert_approx(base_drift(0.0), 1.5);
        assert_approx(base_drift(500.0), 1.5);
        assert_approx(base_drift(500.5), 1.0);
        assert_approx(base_drift(2_000.0), 1.0);
        assert_approx(base_drift(10_000.0), 0.75);
        assert_approx(base_drift(10_001.0), 0.5);
        assert_approx(base_drift(12_100.0), 0.5);
    }

    #[test]
    fn phase_multiplier_boundaries() {
        assert_approx(phase_multiplier(40.0), 3.0);
        assert_approx(phase_multiplier(15.01), 3.0);
        assert_approx(phase_multiplier(15.0), 1.0);
        assert_approx(phase_multiplier(6.01), 1.0);
        assert_approx(phase_multiplier(6.0), 0.5);
        assert_approx(phase_multiplier(1.0), 0.5);
    }

    #[test]
    fn monthly_drift_multiplies_all_factors() {
        assert_approx(monthly_drift(300.0, 3.0, 1.0, 1.5), 6.75);
        assert_approx(monthly_drift(12_100.0, 1.0, 1.0, 1.0), 0.5);
        assert_approx(monthly_drift(1_500.0, 0.5, 2.0, 0.5), 0.5);
        assert_approx(monthly_drift(1_500.0, 1.0, 0.0, 1.0), 0.0);
    }

    proptest! {
        #[test]
        fn prop_drift_is_non_negative_and_shrinks_with_volume(
            low in 0u32..20_000,
            extra in 0u32..50_000,
            speed_pct in 0u32..400,
        ) {
            let speed = speed_pct as f64 / 100.0;
            let easy = monthly_drift(low as f64, 1.0, speed, 1.0);
            let hard = monthly_drift((low + extra) as f64, 1.0, speed, 1.0);
            prop_assert!(hard >= 0.0);
            prop_assert!(hard <= easy);
        }
    }
}

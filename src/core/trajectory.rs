use chrono::NaiveDate;

use super::error::Result;
use super::movement::{monthly_drift, phase_multiplier};
use super::types::{
    FORECAST_MONTHS, ForecastSettings, KeywordRecord, ProjectConfig, ScenarioKind,
    forecast_month_date,
};

pub const LAUNCH_SNAP_POSITION: f64 = 15.0;
pub const TOP_POSITION: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub month_index: u32,
    pub date: NaiveDate,
    pub position: f64,
    pub live: bool,
}

// Unranked keywords (position 0) start on the rank floor.
pub fn starting_position(current_position: f64) -> f64 {
    current_position.max(TOP_POSITION)
}

pub fn simulate_trajectory(
    keyword: &KeywordRecord,
    project: &ProjectConfig,
    settings: &ForecastSettings,
    scenario: ScenarioKind,
) -> Result<Vec<TrajectoryPoint>> {
    let mut position = starting_position(keyword.current_position);
    let mut points = Vec::with_capacity(FORECAST_MONTHS as usize);

    for month_index in 1..=FORECAST_MONTHS {
        let date = forecast_month_date(settings.base_month, month_index)?;
        let live = date >= project.launch_date();

        if live {
            if month_index == 1 {
                if position > LAUNCH_SNAP_POSITION {
                    position = LAUNCH_SNAP_POSITION;
                }
            } else {
                let drift = monthly_drift(
                    keyword.msv,
                    phase_multiplier(position),
                    settings.speed_factor,
                    scenario.rank_speed_multiplier(),
                );
                position = (position - drift).max(TOP_POSITION);
            }
        }

        points.push(TrajectoryPoint {
            month_index,
            date,
            position,
            live,
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).expect("valid date")
    }

    fn keyword(msv: f64, current_position: f64) -> KeywordRecord {
        KeywordRecord {
            project: "Acme".to_string(),
            keyword: "shoes".to_string(),
            msv,
            current_position,
            has_featured_snippet: false,
            has_ai_overview: false,
            current_url: None,
        }
    }

    fn settings() -> ForecastSettings {
        ForecastSettings::new(date(2026, 10))
    }

    #[test]
    fn month_one_snaps_far_keywords_to_fifteen() {
        let points = simulate_trajectory(
            &keyword(1_000.0, 40.0),
            &ProjectConfig::new(date(2026, 10), 0),
            &settings(),
            ScenarioKind::Medium,
        )
        .expect("trajectory");

        assert_eq!(points.len(), 24);
        assert_approx(points[0].position, 15.0);
        // 15 sits in the medium phase: 1.0 base * 1.0 phase.
        assert_approx(points[1].position, 14.0);
    }

    #[test]
    fn month_one_leaves_close_keywords_alone_then_drifts_by_scenario() {
        let project = ProjectConfig::new(date(2026, 10), 0);
        let kw = keyword(12_100.0, 8.0);

        let medium = simulate_trajectory(&kw, &project, &settings(), ScenarioKind::Medium)
            .expect("trajectory");
        let high = simulate_trajectory(&kw, &project, &settings(), ScenarioKind::High)
            .expect("trajectory");
        let low = simulate_trajectory(&kw, &project, &settings(), ScenarioKind::Low)
            .expect("trajectory");

        assert_approx(medium[0].position, 8.0);
        assert_approx(medium[1].position, 7.5);
        assert_approx(high[1].position, 7.25);
        assert_approx(low[1].position, 7.75);
    }

    #[test]
    fn pre_launch_months_hold_position_and_launch_month_drifts_without_snap() {
        let project = ProjectConfig::new(date(2027, 2), 0);
        let points = simulate_trajectory(
            &keyword(300.0, 40.0),
            &project,
            &settings(),
            ScenarioKind::Medium,
        )
        .expect("trajectory");

        for point in &points[..4] {
            assert!(!point.live);
            assert_approx(point.position, 40.0);
        }
        assert!(points[4].live);
        assert_eq!(points[4].date, date(2027, 2));
        assert_approx(points[4].position, 35.5);
    }

    #[test]
    fn unranked_keywords_start_on_the_rank_floor() {
        let pre_launch = simulate_trajectory(
            &keyword(300.0, 0.0),
            &ProjectConfig::new(date(2030, 1), 0),
            &settings(),
            ScenarioKind::High,
        )
        .expect("trajectory");
        assert!(pre_launch.iter().all(|p| p.position == TOP_POSITION));

        let live = simulate_trajectory(
            &keyword(12_100.0, 0.0),
            &ProjectConfig::new(date(2026, 10), 0),
            &settings(),
            ScenarioKind::Medium,
        )
        .expect("trajectory");
        assert!(live.iter().all(|p| p.position == TOP_POSITION));
    }

    #[test]
    fn position_floors_at_one() {
        let points = simulate_trajectory(
            &keyword(100.0, 3.0),
            &ProjectConfig::new(date(2026, 10), 0),
            &settings(),
            ScenarioKind::High,
        )
        .expect("trajectory");
        assert_approx(points[23].position, 1.0);
    }

    proptest! {
        #[test]
        fn prop_live_positions_never_worsen_and_stay_above_one(
            msv in 0u32..100_000,
            start_tenths in 0u32..1_500,
            launch_offset in 0u32..30,
            speed_pct in 0u32..300,
            scenario_idx in 0usize..3,
        ) {
            let base = date(2026, 10);
            let launch = base
                .checked_add_months(chrono::Months::new(launch_offset))
                .expect("valid launch");
            let mut s = settings();
            s.speed_factor = speed_pct as f64 / 100.0;
            let kw = keyword(msv as f64, start_tenths as f64 / 10.0);
            let points = simulate_trajectory(
                &kw,
                &ProjectConfig::new(launch, 0),
                &s,
                ScenarioKind::ALL[scenario_idx],
            )
            .expect("trajectory");

            prop_assert_eq!(points.len(), 24);
            let start = starting_position(kw.current_position);
            let mut previous = start;
            for point in &points {
                prop_assert!(point.position >= 1.0);
                prop_assert!(point.position <= previous + EPS);
                if !point.live {
                    prop_assert_eq!(point.position, start);
                }
                previous = point.position;
            }
        }
    }
}

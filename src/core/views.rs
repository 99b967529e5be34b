use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use serde::Serialize;

use super::error::{ForecastError, Result};
use super::types::{ForecastRecord, ProjectConfigs, ScenarioKind, round_position};

pub const DEFAULT_MILESTONES: [u32; 4] = [3, 6, 9, 12];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSeriesPoint {
    pub scenario: ScenarioKind,
    pub date: NaiveDate,
    pub clicks: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioTotals {
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl ScenarioTotals {
    fn add(&mut self, scenario: ScenarioKind, clicks: f64) {
        match scenario {
            ScenarioKind::High => self.high += clicks,
            ScenarioKind::Medium => self.medium += clicks,
            ScenarioKind::Low => self.low += clicks,
        }
    }

    pub fn get(&self, scenario: ScenarioKind) -> f64 {
        match scenario {
            ScenarioKind::High => self.high,
            ScenarioKind::Medium => self.medium,
            ScenarioKind::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummaryRow {
    pub month: String,
    pub date: NaiveDate,
    #[serde(flatten)]
    pub totals: ScenarioTotals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankCell {
    pub date: NaiveDate,
    pub position: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankProgressionRow {
    pub project: String,
    pub keyword: String,
    pub scenario: ScenarioKind,
    pub positions: Vec<RankCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneTotal {
    pub months: u32,
    pub clicks: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMilestoneSummary {
    pub project: String,
    pub launch_date: NaiveDate,
    pub paid_listings: u8,
    pub milestones: Vec<MilestoneTotal>,
}

pub fn time_series(records: &[ForecastRecord]) -> Vec<TimeSeriesPoint> {
    let mut sums: BTreeMap<(ScenarioKind, NaiveDate), f64> = BTreeMap::new();
    for record in records {
        *sums
            .entry((record.scenario, record.calendar_date))
            .or_default() += record.adjusted_clicks;
    }
    sums.into_iter()
        .map(|((scenario, date), clicks)| TimeSeriesPoint {
            scenario,
            date,
            clicks,
        })
        .collect()
}

pub fn scenario_totals(
    series: &[TimeSeriesPoint],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ScenarioTotals> {
    check_range(start, end)?;
    let mut totals = ScenarioTotals::default();
    for point in series.iter().filter(|p| p.date >= start && p.date <= end) {
        totals.add(point.scenario, point.clicks);
    }
    Ok(totals)
}

pub fn monthly_summary(
    series: &[TimeSeriesPoint],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<MonthlySummaryRow>> {
    check_range(start, end)?;
    let mut by_month: BTreeMap<NaiveDate, ScenarioTotals> = BTreeMap::new();
    for point in series.iter().filter(|p| p.date >= start && p.date <= end) {
        by_month
            .entry(point.date)
            .or_default()
            .add(point.scenario, point.clicks);
    }
    Ok(by_month
        .into_iter()
        .map(|(date, totals)| MonthlySummaryRow {
            month: date.format("%b %Y").to_string(),
            date,
            totals,
        })
        .collect())
}

/// Rounded rank per keyword, scenario and month. Repeated keyword rows are
/// averaged before rounding.
pub fn rank_progression(records: &[ForecastRecord]) -> Vec<RankProgressionRow> {
    type Key = (String, String, ScenarioKind);
    let mut grouped: BTreeMap<Key, BTreeMap<NaiveDate, (f64, u32)>> = BTreeMap::new();
    for record in records {
        let cell = grouped
            .entry((
                record.project.clone(),
                record.keyword.clone(),
                record.scenario,
            ))
            .or_default()
            .entry(record.calendar_date)
            .or_insert((0.0, 0));
        cell.0 += record.position;
        cell.1 += 1;
    }

    grouped
        .into_iter()
        .map(|((project, keyword, scenario), cells)| RankProgressionRow {
            project,
            keyword,
            scenario,
            positions: cells
                .into_iter()
                .map(|(date, (sum, count))| RankCell {
                    date,
                    position: round_position(sum / f64::from(count)),
                })
                .collect(),
        })
        .collect()
}

/// Cumulative Medium-scenario clicks from each project's launch month through
/// the first N months after launch.
pub fn milestone_summary(
    records: &[ForecastRecord],
    projects: &ProjectConfigs,
    milestones: &[u32],
) -> Vec<ProjectMilestoneSummary> {
    projects
        .iter()
        .map(|(project, config)| {
            let medium = records
                .iter()
                .filter(|r| r.scenario == ScenarioKind::Medium && r.project == project)
                .collect::<Vec<_>>();
            let milestones = milestones
                .iter()
                .map(|&months| {
                    let window_end = config.launch_date().checked_add_months(Months::new(months));
                    let clicks = medium
                        .iter()
                        .filter(|r| {
                            r.calendar_date >= config.launch_date()
                                && window_end.is_none_or(|end| r.calendar_date < end)
                        })
                        .map(|r| r.adjusted_clicks)
                        .sum();
                    MilestoneTotal { months, clicks }
                })
                .collect();
            ProjectMilestoneSummary {
                project: project.to_string(),
                launch_date: config.launch_date(),
                paid_listings: config.paid_listings(),
                milestones,
            }
        })
        .collect()
}

fn check_range(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(ForecastError::InvalidDateRange { start, end });
    }
    Ok(())
}

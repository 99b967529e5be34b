mod cache;
mod clicks;
mod ctr;
mod engine;
mod error;
mod ingest;
mod movement;
mod seasonality;
mod trajectory;
mod types;
mod views;

pub use cache::{CachedForecast, ForecastCache, input_hash};
pub use clicks::{ClickModel, ClickOutcome, scenario_ctr};
pub use ctr::{CtrCurve, CtrCurveEntry, DEFAULT_CTR_CURVE};
pub use engine::{filter_project, run_forecast};
pub use error::{ForecastError, Result};
pub use ingest::{Cell, RawKeywordRow, coerce_rows};
pub use movement::{base_drift, monthly_drift, phase_multiplier};
pub use seasonality::{MONTH_NAMES, SeasonalityEntry, SeasonalityTable, month_name};
pub use trajectory::{TrajectoryPoint, simulate_trajectory, starting_position};
pub use types::{
    BelowCurvePolicy, DEFAULT_AI_OVERVIEW_CTR, DEFAULT_FEATURED_SNIPPET_CTR,
    DEFAULT_PAID_LISTINGS, DEFAULT_SPEED_FACTOR, FORECAST_MONTHS, ForecastInputs, ForecastRecord,
    ForecastSettings, KeywordRecord, MAX_PAID_LISTINGS, ProjectConfig, ProjectConfigs,
    ScenarioKind, first_of_month, forecast_month_date, round_position,
};
pub use views::{
    DEFAULT_MILESTONES, MilestoneTotal, MonthlySummaryRow, ProjectMilestoneSummary, RankCell,
    RankProgressionRow, ScenarioTotals, TimeSeriesPoint, milestone_summary, monthly_summary,
    rank_progression, scenario_totals, time_series,
};

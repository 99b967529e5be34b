use rayon::prelude::*;
use tracing::{debug, info};

use super::clicks::{ClickModel, ClickOutcome};
use super::error::{ForecastError, Result};
use super::trajectory::simulate_trajectory;
use super::types::{FORECAST_MONTHS, ForecastInputs, ForecastRecord, KeywordRecord, ScenarioKind};

/// Runs every (scenario, keyword) trajectory over 24 months and flattens the
/// result into records ordered scenario-major, then keyword, then month.
pub fn run_forecast(inputs: &ForecastInputs) -> Result<Vec<ForecastRecord>> {
    if inputs.keywords.is_empty() {
        debug!("no keywords supplied, nothing to forecast");
        return Ok(Vec::new());
    }

    inputs.settings.validate()?;
    for keyword in &inputs.keywords {
        if inputs.projects.get(&keyword.project).is_none() {
            return Err(ForecastError::MissingProjectConfig(keyword.project.clone()));
        }
    }

    let jobs = ScenarioKind::ALL
        .iter()
        .flat_map(|&scenario| inputs.keywords.iter().map(move |kw| (scenario, kw)))
        .collect::<Vec<_>>();
    debug!(
        keywords = inputs.keywords.len(),
        projects = inputs.projects.len(),
        base_month = %inputs.settings.base_month,
        speed_factor = inputs.settings.speed_factor,
        "starting forecast run"
    );

    let model = ClickModel {
        curve: &inputs.ctr_curve,
        seasonality: &inputs.seasonality,
        settings: &inputs.settings,
    };
    let per_keyword = jobs
        .par_iter()
        .map(|&(scenario, keyword)| forecast_keyword(inputs, &model, keyword, scenario))
        .collect::<Result<Vec<_>>>()?;

    let records = per_keyword.into_iter().flatten().collect::<Vec<_>>();
    info!(
        keywords = inputs.keywords.len(),
        records = records.len(),
        "forecast run complete"
    );
    Ok(records)
}

fn forecast_keyword(
    inputs: &ForecastInputs,
    model: &ClickModel<'_>,
    keyword: &KeywordRecord,
    scenario: ScenarioKind,
) -> Result<Vec<ForecastRecord>> {
    let project = inputs
        .projects
        .get(&keyword.project)
        .ok_or_else(|| ForecastError::MissingProjectConfig(keyword.project.clone()))?;
    let trajectory = simulate_trajectory(keyword, project, &inputs.settings, scenario)?;
    let url = keyword.current_url.clone().unwrap_or_default();

    let mut records = Vec::with_capacity(FORECAST_MONTHS as usize);
    for point in trajectory {
        let clicks = if point.live {
            model.convert(
                point.position,
                keyword,
                project.paid_listings(),
                scenario,
                point.date,
            )?
        } else {
            ClickOutcome::default()
        };
        records.push(ForecastRecord {
            scenario,
            project: keyword.project.clone(),
            keyword: keyword.keyword.clone(),
            url: url.clone(),
            month_index: point.month_index,
            calendar_date: point.date,
            position: point.position,
            ctr_percent: clicks.ctr_percent,
            raw_clicks: clicks.raw_clicks,
            adjusted_clicks: clicks.adjusted_clicks,
            live: point.live,
        });
    }
    Ok(records)
}

pub fn filter_project(keywords: &[KeywordRecord], project: Option<&str>) -> Vec<KeywordRecord> {
    match project {
        Some(name) => keywords
            .iter()
            .filter(|kw| kw.project == name)
            .cloned()
            .collect(),
        None => keywords.to_vec(),
    }
}

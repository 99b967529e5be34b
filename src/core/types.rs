use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::ctr::CtrCurve;
use super::error::{ForecastError, Result};
use super::seasonality::SeasonalityTable;

pub const FORECAST_MONTHS: u32 = 24;
pub const MAX_PAID_LISTINGS: u8 = 10;
pub const DEFAULT_PAID_LISTINGS: u8 = 2;
pub const DEFAULT_SPEED_FACTOR: f64 = 1.0;
pub const DEFAULT_FEATURED_SNIPPET_CTR: f64 = 20.0;
pub const DEFAULT_AI_OVERVIEW_CTR: f64 = 15.0;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub enum ScenarioKind {
    High,
    Medium,
    Low,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 3] = [
        ScenarioKind::High,
        ScenarioKind::Medium,
        ScenarioKind::Low,
    ];

    pub fn rank_speed_multiplier(self) -> f64 {
        match self {
            ScenarioKind::High => 1.5,
            ScenarioKind::Medium => 1.0,
            ScenarioKind::Low => 0.5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScenarioKind::High => "High",
            ScenarioKind::Medium => "Medium",
            ScenarioKind::Low => "Low",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BelowCurvePolicy {
    #[default]
    ZeroClicks,
    LastKnownCtr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordRecord {
    pub project: String,
    pub keyword: String,
    pub msv: f64,
    pub current_position: f64,
    pub has_featured_snippet: bool,
    pub has_ai_overview: bool,
    pub current_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    launch_date: NaiveDate,
    paid_listings: u8,
}

impl ProjectConfig {
    /// Launch dates are month-granular; any day inside a month launches that month.
    pub fn new(launch_date: NaiveDate, paid_listings: u8) -> Self {
        Self {
            launch_date: first_of_month(launch_date),
            paid_listings,
        }
    }

    pub fn default_for(today: NaiveDate) -> Self {
        Self::new(today, DEFAULT_PAID_LISTINGS)
    }

    pub fn launch_date(&self) -> NaiveDate {
        self.launch_date
    }

    pub fn paid_listings(&self) -> u8 {
        self.paid_listings
    }

    fn validate(&self, project: &str) -> Result<()> {
        if self.paid_listings > MAX_PAID_LISTINGS {
            return Err(ForecastError::InvalidPaidListings {
                project: project.to_string(),
                value: self.paid_listings,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectConfigs {
    configs: BTreeMap<String, ProjectConfig>,
}

impl ProjectConfigs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, project: impl Into<String>, config: ProjectConfig) -> Result<()> {
        let project = project.into();
        config.validate(&project)?;
        self.configs.insert(project, config);
        Ok(())
    }

    pub fn get(&self, project: &str) -> Option<&ProjectConfig> {
        self.configs.get(project)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProjectConfig)> {
        self.configs.iter().map(|(name, cfg)| (name.as_str(), cfg))
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Keeps exactly one config per project present in `keywords`. Edits for
    /// surviving projects are preserved, stale projects are dropped and new ones
    /// start at the first of `today`'s month with the default paid listings.
    pub fn sync(&mut self, keywords: &[KeywordRecord], today: NaiveDate) -> Result<()> {
        self.sync_with_defaults(keywords, ProjectConfig::default_for(today))
    }

    pub fn sync_with_defaults(
        &mut self,
        keywords: &[KeywordRecord],
        defaults: ProjectConfig,
    ) -> Result<()> {
        let mut synced = BTreeMap::new();
        for record in keywords {
            if synced.contains_key(&record.project) {
                continue;
            }
            let config = match self.configs.get(&record.project) {
                Some(existing) => *existing,
                None => {
                    defaults.validate(&record.project)?;
                    defaults
                }
            };
            synced.insert(record.project.clone(), config);
        }
        self.configs = synced;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSettings {
    pub base_month: NaiveDate,
    pub speed_factor: f64,
    pub featured_snippet_ctr: f64,
    pub ai_overview_ctr: f64,
    pub below_curve_policy: BelowCurvePolicy,
}

impl ForecastSettings {
    pub fn new(base_month: NaiveDate) -> Self {
        Self {
            base_month: first_of_month(base_month),
            speed_factor: DEFAULT_SPEED_FACTOR,
            featured_snippet_ctr: DEFAULT_FEATURED_SNIPPET_CTR,
            ai_overview_ctr: DEFAULT_AI_OVERVIEW_CTR,
            below_curve_policy: BelowCurvePolicy::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.speed_factor.is_finite() || self.speed_factor < 0.0 {
            return Err(ForecastError::InvalidSetting(format!(
                "speed factor must be a finite value >= 0, got {}",
                self.speed_factor
            )));
        }
        for (name, value) in [
            ("featured snippet CTR", self.featured_snippet_ctr),
            ("AI overview CTR", self.ai_overview_ctr),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ForecastError::InvalidSetting(format!(
                    "{name} must be between 0 and 100, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastInputs {
    pub keywords: Vec<KeywordRecord>,
    pub projects: ProjectConfigs,
    pub ctr_curve: CtrCurve,
    pub seasonality: SeasonalityTable,
    pub settings: ForecastSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRecord {
    pub scenario: ScenarioKind,
    pub project: String,
    pub keyword: String,
    pub url: String,
    pub month_index: u32,
    pub calendar_date: NaiveDate,
    pub position: f64,
    pub ctr_percent: f64,
    pub raw_clicks: f64,
    pub adjusted_clicks: f64,
    pub live: bool,
}

impl ForecastRecord {
    pub fn display_position(&self) -> u32 {
        round_position(self.position)
    }
}

pub fn round_position(position: f64) -> u32 {
    position.round().max(0.0) as u32
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn forecast_month_date(base_month: NaiveDate, month_index: u32) -> Result<NaiveDate> {
    let offset = month_index.saturating_sub(1);
    first_of_month(base_month)
        .checked_add_months(Months::new(offset))
        .ok_or(ForecastError::DateOutOfRange(offset))
}

use chrono::NaiveDate;

use super::ctr::CtrCurve;
use super::error::Result;
use super::seasonality::{SeasonalityTable, month_name};
use super::types::{BelowCurvePolicy, ForecastSettings, KeywordRecord, ScenarioKind, round_position};

pub const PAID_LISTING_CTR_PENALTY: f64 = 0.05;
pub const LOW_SCENARIO_CTR_FACTOR: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClickOutcome {
    pub ctr_percent: f64,
    pub raw_clicks: f64,
    pub adjusted_clicks: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ClickModel<'a> {
    pub curve: &'a CtrCurve,
    pub seasonality: &'a SeasonalityTable,
    pub settings: &'a ForecastSettings,
}

impl ClickModel<'_> {
    pub fn convert(
        &self,
        position: f64,
        keyword: &KeywordRecord,
        paid_listings: u8,
        scenario: ScenarioKind,
        date: NaiveDate,
    ) -> Result<ClickOutcome> {
        let rounded = round_position(position);
        if rounded > self.curve.max_position()
            && self.settings.below_curve_policy == BelowCurvePolicy::ZeroClicks
        {
            return Ok(ClickOutcome::default());
        }

        let ctr_percent = scenario_ctr(
            self.curve.ctr_for_position(rounded),
            rounded,
            keyword,
            paid_listings,
            scenario,
            self.settings,
        );
        let raw_clicks = ctr_percent / 100.0 * keyword.msv;
        let adjustment = self.seasonality.adjustment_for_month(month_name(date))?;
        let adjusted_clicks = (raw_clicks * (1.0 + adjustment / 100.0)).max(0.0);

        Ok(ClickOutcome {
            ctr_percent,
            raw_clicks,
            adjusted_clicks,
        })
    }
}

pub fn scenario_ctr(
    base_ctr: f64,
    rounded_position: u32,
    keyword: &KeywordRecord,
    paid_listings: u8,
    scenario: ScenarioKind,
    settings: &ForecastSettings,
) -> f64 {
    let discount = match scenario {
        ScenarioKind::High => return base_ctr.max(0.0),
        ScenarioKind::Medium => 1.0,
        ScenarioKind::Low => LOW_SCENARIO_CTR_FACTOR,
    };

    let serp_override = if rounded_position == 1 {
        if keyword.has_ai_overview {
            Some(settings.ai_overview_ctr)
        } else if keyword.has_featured_snippet {
            Some(settings.featured_snippet_ctr)
        } else {
            None
        }
    } else {
        None
    };

    let ctr = match serp_override {
        Some(ctr) => ctr * discount,
        None => {
            base_ctr * discount * (1.0 - PAID_LISTING_CTR_PENALTY * f64::from(paid_listings))
        }
    };
    ctr.max(0.0)
}

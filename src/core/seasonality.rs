use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::error::{ForecastError, Result};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalityEntry {
    #[serde(alias = "month")]
    pub month_name: String,
    #[serde(alias = "adjustment")]
    pub adjustment_percent: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonalityTable {
    adjustments: [f64; 12],
}

impl SeasonalityTable {
    pub fn from_entries(entries: impl IntoIterator<Item = SeasonalityEntry>) -> Result<Self> {
        let mut adjustments = [None; 12];
        for entry in entries {
            let idx = month_index(&entry.month_name)?;
            if !(-100.0..=100.0).contains(&entry.adjustment_percent) {
                return Err(ForecastError::InvalidSeasonality {
                    month: entry.month_name,
                    adjustment: entry.adjustment_percent,
                });
            }
            if adjustments[idx].replace(entry.adjustment_percent).is_some() {
                return Err(ForecastError::DuplicateSeasonality(entry.month_name));
            }
        }

        let mut resolved = [0.0; 12];
        for (idx, adjustment) in adjustments.into_iter().enumerate() {
            resolved[idx] = adjustment
                .ok_or_else(|| ForecastError::MissingSeasonality(MONTH_NAMES[idx].to_string()))?;
        }
        Ok(Self {
            adjustments: resolved,
        })
    }

    pub fn adjustment_for_month(&self, month_name: &str) -> Result<f64> {
        Ok(self.adjustments[month_index(month_name)?])
    }

    pub fn entries(&self) -> Vec<SeasonalityEntry> {
        MONTH_NAMES
            .iter()
            .zip(self.adjustments)
            .map(|(name, adjustment_percent)| SeasonalityEntry {
                month_name: name.to_string(),
                adjustment_percent,
            })
            .collect()
    }
}

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

fn month_index(month_name: &str) -> Result<usize> {
    MONTH_NAMES
        .iter()
        .position(|name| *name == month_name)
        .ok_or_else(|| ForecastError::UnknownMonth(month_name.to_string()))
}

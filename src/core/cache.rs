use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::engine::run_forecast;
use super::error::Result;
use super::types::{ForecastInputs, ForecastRecord};

/// Remembers the last forecast run, keyed by a hash of its full input snapshot.
/// Any change to any input produces a new key and replaces the entry.
#[derive(Debug, Default)]
pub struct ForecastCache {
    entry: Option<(String, Arc<Vec<ForecastRecord>>)>,
    hits: u64,
    misses: u64,
}

#[derive(Debug, Clone)]
pub struct CachedForecast {
    pub key: String,
    pub records: Arc<Vec<ForecastRecord>>,
    pub hit: bool,
}

impl ForecastCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_run(&mut self, inputs: &ForecastInputs) -> Result<CachedForecast> {
        let key = input_hash(inputs);
        if let Some((cached_key, records)) = &self.entry {
            if *cached_key == key {
                self.hits += 1;
                debug!(key = %key, "forecast cache hit");
                return Ok(CachedForecast {
                    key,
                    records: Arc::clone(records),
                    hit: true,
                });
            }
        }

        let records = Arc::new(run_forecast(inputs)?);
        self.misses += 1;
        self.entry = Some((key.clone(), Arc::clone(&records)));
        Ok(CachedForecast {
            key,
            records,
            hit: false,
        })
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

pub fn input_hash(inputs: &ForecastInputs) -> String {
    let mut hasher = Sha256::new();
    // Serializing plain data with string keys cannot fail.
    let canonical = serde_json::to_vec(inputs).unwrap_or_default();
    hasher.update(&canonical);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ctr::CtrCurve;
    use crate::core::seasonality::SeasonalityTable;
    use crate::core::types::{ForecastSettings, KeywordRecord, ProjectConfig, ProjectConfigs};
    use chrono::NaiveDate;

    fn inputs() -> ForecastInputs {
        let base = NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date");
        let mut projects = ProjectConfigs::new();
        projects
            .insert("Acme", ProjectConfig::new(base, 2))
            .expect("valid config");
        ForecastInputs {
            keywords: vec![KeywordRecord {
                project: "Acme".to_string(),
                keyword: "shoes".to_string(),
                msv: 1_000.0,
                current_position: 12.0,
                has_featured_snippet: false,
                has_ai_overview: true,
                current_url: None,
            }],
            projects,
            ctr_curve: CtrCurve::default(),
            seasonality: SeasonalityTable::default(),
            settings: ForecastSettings::new(base),
        }
    }

    #[test]
    fn identical_inputs_hit_the_cache() {
        let mut cache = ForecastCache::new();
        let first = cache.get_or_run(&inputs()).expect("forecast");
        let second = cache.get_or_run(&inputs()).expect("forecast");

        assert!(!first.hit);
        assert!(second.hit);
        assert_eq!(first.key, second.key);
        assert!(Arc::ptr_eq(&first.records, &second.records));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn any_input_change_invalidates_the_entry() {
        let mut cache = ForecastCache::new();
        let base = cache.get_or_run(&inputs()).expect("forecast");

        let mut faster = inputs();
        faster.settings.speed_factor = 1.25;
        let changed = cache.get_or_run(&faster).expect("forecast");
        assert!(!changed.hit);
        assert_ne!(base.key, changed.key);

        let mut edited = inputs();
        edited
            .projects
            .insert("Acme", ProjectConfig::new(edited.settings.base_month, 3))
            .expect("valid config");
        assert_ne!(input_hash(&edited), input_hash(&inputs()));
        assert_eq!(cache.misses(), 2);
    }
}

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("CTR curve must contain at least one position")]
    EmptyCtrCurve,

    #[error("invalid CTR entry: position {position} with CTR {ctr_percent}%")]
    InvalidCtrEntry { position: u32, ctr_percent: f64 },

    #[error("seasonality table is missing an entry for {0}")]
    MissingSeasonality(String),

    #[error("seasonality table lists {0} more than once")]
    DuplicateSeasonality(String),

    #[error("seasonality adjustment for {month} must be between -100 and 100, got {adjustment}")]
    InvalidSeasonality { month: String, adjustment: f64 },

    #[error("unknown month name: {0}")]
    UnknownMonth(String),

    #[error("no project configuration for project {0:?}")]
    MissingProjectConfig(String),

    #[error("paid listings for project {project:?} must be between 0 and 10, got {value}")]
    InvalidPaidListings { project: String, value: u8 },

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("calendar date out of range for month offset {0}")]
    DateOutOfRange(u32),

    #[error("end date {end} is before start date {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("input is missing required column {0:?}")]
    MissingColumn(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;

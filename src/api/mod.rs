use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::{
    BelowCurvePolicy, CachedForecast, CtrCurve, CtrCurveEntry, DEFAULT_AI_OVERVIEW_CTR,
    DEFAULT_FEATURED_SNIPPET_CTR, DEFAULT_MILESTONES, DEFAULT_PAID_LISTINGS, DEFAULT_SPEED_FACTOR,
    FORECAST_MONTHS, ForecastCache, ForecastInputs, ForecastRecord, ForecastSettings,
    MAX_PAID_LISTINGS, MonthlySummaryRow, ProjectConfig, ProjectConfigs, ProjectMilestoneSummary,
    RankProgressionRow, RawKeywordRow, ScenarioTotals, SeasonalityEntry, SeasonalityTable,
    TimeSeriesPoint, coerce_rows, filter_project, first_of_month, forecast_month_date,
    milestone_summary, monthly_summary, rank_progression, scenario_totals, time_series,
};
use crate::csv_io::write_forecast_csv;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliBelowCurvePolicy {
    ZeroClicks,
    LastKnownCtr,
}

impl From<CliBelowCurvePolicy> for BelowCurvePolicy {
    fn from(value: CliBelowCurvePolicy) -> Self {
        match value {
            CliBelowCurvePolicy::ZeroClicks => BelowCurvePolicy::ZeroClicks,
            CliBelowCurvePolicy::LastKnownCtr => BelowCurvePolicy::LastKnownCtr,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiBelowCurvePolicy {
    #[serde(alias = "zeroClicks", alias = "zero_clicks", alias = "zero")]
    ZeroClicks,
    #[serde(alias = "lastKnownCtr", alias = "last_known_ctr", alias = "last-known")]
    LastKnownCtr,
}

impl From<ApiBelowCurvePolicy> for CliBelowCurvePolicy {
    fn from(value: ApiBelowCurvePolicy) -> Self {
        match value {
            ApiBelowCurvePolicy::ZeroClicks => CliBelowCurvePolicy::ZeroClicks,
            ApiBelowCurvePolicy::LastKnownCtr => CliBelowCurvePolicy::LastKnownCtr,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ForecastCli {
    #[arg(
        long,
        help = "First forecast month (YYYY-MM-DD, any day); defaults to the current month"
    )]
    pub base_month: Option<NaiveDate>,
    #[arg(
        long,
        help = "Launch date for projects without one (YYYY-MM-DD); defaults to the base month"
    )]
    pub launch_date: Option<NaiveDate>,
    #[arg(
        long,
        default_value_t = DEFAULT_PAID_LISTINGS,
        help = "Average paid listings on the results page for projects without a setting (0-10)"
    )]
    pub paid_listings: u8,
    #[arg(
        long,
        default_value_t = DEFAULT_SPEED_FACTOR,
        help = "Global multiplier on monthly rank movement"
    )]
    pub speed_factor: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_FEATURED_SNIPPET_CTR,
        help = "CTR in percent at position 1 when a Featured Snippet is present"
    )]
    pub featured_snippet_ctr: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_AI_OVERVIEW_CTR,
        help = "CTR in percent at position 1 when an AI Overview is present"
    )]
    pub ai_overview_ctr: f64,
    #[arg(
        long,
        value_enum,
        default_value_t = CliBelowCurvePolicy::ZeroClicks,
        help = "Clicks for ranks past the CTR curve: none, or the last tabulated CTR"
    )]
    pub below_curve_policy: CliBelowCurvePolicy,
    #[arg(long, help = "Only forecast keywords of this project")]
    pub project: Option<String>,
}

pub fn default_cli_for_api() -> ForecastCli {
    ForecastCli {
        base_month: None,
        launch_date: None,
        paid_listings: DEFAULT_PAID_LISTINGS,
        speed_factor: DEFAULT_SPEED_FACTOR,
        featured_snippet_ctr: DEFAULT_FEATURED_SNIPPET_CTR,
        ai_overview_ctr: DEFAULT_AI_OVERVIEW_CTR,
        below_curve_policy: CliBelowCurvePolicy::ZeroClicks,
        project: None,
    }
}

pub fn build_settings(cli: &ForecastCli, today: NaiveDate) -> Result<ForecastSettings, String> {
    if !cli.speed_factor.is_finite() || cli.speed_factor < 0.0 {
        return Err("--speed-factor must be a finite value >= 0".to_string());
    }

    if !(0.0..=100.0).contains(&cli.featured_snippet_ctr) {
        return Err("--featured-snippet-ctr must be between 0 and 100".to_string());
    }

    if !(0.0..=100.0).contains(&cli.ai_overview_ctr) {
        return Err("--ai-overview-ctr must be between 0 and 100".to_string());
    }

    if cli.paid_listings > MAX_PAID_LISTINGS {
        return Err(format!("--paid-listings must be between 0 and {MAX_PAID_LISTINGS}"));
    }

    let mut settings = ForecastSettings::new(cli.base_month.unwrap_or(today));
    settings.speed_factor = cli.speed_factor;
    settings.featured_snippet_ctr = cli.featured_snippet_ctr;
    settings.ai_overview_ctr = cli.ai_overview_ctr;
    settings.below_curve_policy = cli.below_curve_policy.into();
    Ok(settings)
}

pub fn default_project_config(cli: &ForecastCli, settings: &ForecastSettings) -> ProjectConfig {
    ProjectConfig::new(
        cli.launch_date.unwrap_or(settings.base_month),
        cli.paid_listings,
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    #[serde(alias = "name")]
    project: String,
    launch_date: Option<NaiveDate>,
    paid_listings: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ForecastPayload {
    keywords: Vec<RawKeywordRow>,
    projects: Vec<ProjectPayload>,
    ctr_curve: Option<Vec<CtrCurveEntry>>,
    seasonality: Option<Vec<SeasonalityEntry>>,

    base_month: Option<NaiveDate>,
    default_launch_date: Option<NaiveDate>,
    paid_listings: Option<u8>,
    speed_factor: Option<f64>,
    featured_snippet_ctr: Option<f64>,
    ai_overview_ctr: Option<f64>,
    below_curve_policy: Option<ApiBelowCurvePolicy>,
    project: Option<String>,

    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    milestones: Option<Vec<u32>>,
    include_records: Option<bool>,
}

#[derive(Debug, Clone)]
struct ApiOptions {
    start_date: NaiveDate,
    end_date: NaiveDate,
    milestones: Vec<u32>,
    include_records: bool,
}

#[derive(Debug, Clone)]
struct ApiRequest {
    inputs: ForecastInputs,
    options: ApiOptions,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastResponse {
    base_month: NaiveDate,
    start_date: NaiveDate,
    end_date: NaiveDate,
    cache_key: String,
    cache_hit: bool,
    keyword_count: usize,
    record_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<Vec<ForecastRecord>>,
    totals: ScenarioTotals,
    time_series: Vec<TimeSeriesPoint>,
    monthly_summary: Vec<MonthlySummaryRow>,
    rank_progression: Vec<RankProgressionRow>,
    project_summary: Vec<ProjectMilestoneSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefaultsResponse {
    ctr_curve: Vec<CtrCurveEntry>,
    seasonality: Vec<SeasonalityEntry>,
    speed_factor: f64,
    featured_snippet_ctr: f64,
    ai_overview_ctr: f64,
    paid_listings: u8,
    below_curve_policy: BelowCurvePolicy,
    milestones: Vec<u32>,
    forecast_months: u32,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone, Default)]
pub struct AppState {
    cache: Arc<Mutex<ForecastCache>>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/defaults", get(defaults_handler))
        .route("/api/forecast", post(forecast_handler))
        .route("/api/forecast.csv", post(forecast_csv_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(AppState::default());

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "SEO forecast HTTP API listening");
    info!("local access: http://127.0.0.1:{port}/api/health");

    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, serde_json::json!({ "status": "ok" }))
}

async fn defaults_handler() -> Response {
    json_response(StatusCode::OK, build_defaults_response())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn forecast_handler(
    State(state): State<AppState>,
    payload: Result<Json<ForecastPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let (request, cached) = match run_request(&state, payload).await {
        Ok(ok) => ok,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };
    match build_forecast_response(&request, &cached) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(msg) => error_response(StatusCode::BAD_REQUEST, &msg),
    }
}

async fn forecast_csv_handler(
    State(state): State<AppState>,
    payload: Result<Json<ForecastPayload>, JsonRejection>,
) -> Response {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => return rejection_response(rejection),
    };
    let (_, cached) = match run_request(&state, payload).await {
        Ok(ok) => ok,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    let mut body = Vec::new();
    if let Err(e) = write_forecast_csv(&cached.records, &mut body) {
        warn!(error = %e, "failed to render forecast CSV");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
    }
    with_cache_control((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"forecast.csv\"",
            ),
        ],
        body,
    ))
}

async fn run_request(
    state: &AppState,
    payload: ForecastPayload,
) -> Result<(ApiRequest, CachedForecast), String> {
    let today = Local::now().date_naive();
    let request = api_request_from_payload(payload, today)?;
    let cached = state
        .cache
        .lock()
        .await
        .get_or_run(&request.inputs)
        .map_err(|e| e.to_string())?;
    if cached.hit {
        info!(key = %cached.key, "served forecast from cache");
    }
    Ok((request, cached))
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn rejection_response(rejection: JsonRejection) -> Response {
    warn!(status = %rejection.status(), "rejected forecast payload");
    error_response(
        StatusCode::BAD_REQUEST,
        &format!("Invalid API JSON payload: {}", rejection.body_text()),
    )
}

#[cfg(test)]
fn api_request_from_json(json: &str, today: NaiveDate) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<ForecastPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload, today)
}

fn api_request_from_payload(
    payload: ForecastPayload,
    today: NaiveDate,
) -> Result<ApiRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.base_month {
        cli.base_month = Some(v);
    }
    if let Some(v) = payload.default_launch_date {
        cli.launch_date = Some(v);
    }
    if let Some(v) = payload.paid_listings {
        cli.paid_listings = v;
    }
    if let Some(v) = payload.speed_factor {
        cli.speed_factor = v;
    }
    if let Some(v) = payload.featured_snippet_ctr {
        cli.featured_snippet_ctr = v;
    }
    if let Some(v) = payload.ai_overview_ctr {
        cli.ai_overview_ctr = v;
    }
    if let Some(v) = payload.below_curve_policy {
        cli.below_curve_policy = v.into();
    }
    if let Some(v) = payload.project {
        cli.project = Some(v);
    }

    let settings = build_settings(&cli, today)?;
    let defaults = default_project_config(&cli, &settings);

    let keywords = filter_project(&coerce_rows(payload.keywords), cli.project.as_deref());

    let mut projects = ProjectConfigs::new();
    for project in payload.projects {
        let config = ProjectConfig::new(
            project.launch_date.unwrap_or(defaults.launch_date()),
            project.paid_listings.unwrap_or(defaults.paid_listings()),
        );
        projects
            .insert(project.project, config)
            .map_err(|e| e.to_string())?;
    }
    projects
        .sync_with_defaults(&keywords, defaults)
        .map_err(|e| e.to_string())?;

    let ctr_curve = match payload.ctr_curve {
        Some(entries) => CtrCurve::new(entries).map_err(|e| e.to_string())?,
        None => CtrCurve::default(),
    };
    let seasonality = match payload.seasonality {
        Some(entries) => SeasonalityTable::from_entries(entries).map_err(|e| e.to_string())?,
        None => SeasonalityTable::default(),
    };

    let last_month =
        forecast_month_date(settings.base_month, FORECAST_MONTHS).map_err(|e| e.to_string())?;
    let options = ApiOptions {
        start_date: payload
            .start_date
            .map(first_of_month)
            .unwrap_or(settings.base_month),
        end_date: payload.end_date.map(first_of_month).unwrap_or(last_month),
        milestones: payload
            .milestones
            .unwrap_or_else(|| DEFAULT_MILESTONES.to_vec()),
        include_records: payload.include_records.unwrap_or(true),
    };

    Ok(ApiRequest {
        inputs: ForecastInputs {
            keywords,
            projects,
            ctr_curve,
            seasonality,
            settings,
        },
        options,
    })
}

fn build_forecast_response(
    request: &ApiRequest,
    cached: &CachedForecast,
) -> Result<ForecastResponse, String> {
    let records = cached.records.as_slice();
    let options = &request.options;
    let series = time_series(records);
    let totals = scenario_totals(&series, options.start_date, options.end_date)
        .map_err(|e| e.to_string())?;
    let summary = monthly_summary(&series, options.start_date, options.end_date)
        .map_err(|e| e.to_string())?;

    Ok(ForecastResponse {
        base_month: request.inputs.settings.base_month,
        start_date: options.start_date,
        end_date: options.end_date,
        cache_key: cached.key.clone(),
        cache_hit: cached.hit,
        keyword_count: request.inputs.keywords.len(),
        record_count: records.len(),
        records: options.include_records.then(|| records.to_vec()),
        totals,
        time_series: series,
        monthly_summary: summary,
        rank_progression: rank_progression(records),
        project_summary: milestone_summary(records, &request.inputs.projects, &options.milestones),
    })
}

fn build_defaults_response() -> DefaultsResponse {
    DefaultsResponse {
        ctr_curve: CtrCurve::default().entries(),
        seasonality: SeasonalityTable::default().entries(),
        speed_factor: DEFAULT_SPEED_FACTOR,
        featured_snippet_ctr: DEFAULT_FEATURED_SNIPPET_CTR,
        ai_overview_ctr: DEFAULT_AI_OVERVIEW_CTR,
        paid_listings: DEFAULT_PAID_LISTINGS,
        below_curve_policy: BelowCurvePolicy::default(),
        milestones: DEFAULT_MILESTONES.to_vec(),
        forecast_months: FORECAST_MONTHS,
    }
}

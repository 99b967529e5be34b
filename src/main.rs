use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use seo_forecast::api::{ForecastCli, build_settings, default_project_config, run_http_server};
use seo_forecast::core::{
    CtrCurve, DEFAULT_MILESTONES, ForecastInputs, ProjectConfigs, ScenarioKind, SeasonalityTable,
    filter_project, milestone_summary, run_forecast, scenario_totals, time_series,
};
use seo_forecast::csv_io::{read_keywords_csv, write_forecast_csv};

/// Organic search click forecasting over a 24-month horizon.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct App {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the forecast HTTP API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Forecast a keyword CSV and write the per-month export
    Forecast {
        #[arg(
            long,
            help = "Keyword sheet with Project, Keyword, MSV, Current Position, ... columns"
        )]
        input: PathBuf,
        #[arg(long, help = "Destination CSV; defaults to stdout")]
        output: Option<PathBuf>,
        #[command(flatten)]
        settings: ForecastCli,
    },
}

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("seo_forecast=info,warn"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr).with_target(true))
        .init();

    let app = App::parse();
    let result = match app.command {
        Command::Serve { port } => run_http_server(port).await.map_err(|e| e.to_string()),
        Command::Forecast {
            input,
            output,
            settings,
        } => forecast_command(&input, output.as_deref(), &settings),
    };

    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn forecast_command(
    input: &std::path::Path,
    output: Option<&std::path::Path>,
    cli: &ForecastCli,
) -> Result<(), String> {
    let settings = build_settings(cli, Local::now().date_naive())?;
    let file = File::open(input).map_err(|e| format!("cannot open {}: {e}", input.display()))?;
    let keywords = read_keywords_csv(file).map_err(|e| e.to_string())?;
    let keywords = filter_project(&keywords, cli.project.as_deref());

    let mut projects = ProjectConfigs::new();
    projects
        .sync_with_defaults(&keywords, default_project_config(cli, &settings))
        .map_err(|e| e.to_string())?;
    info!(
        keywords = keywords.len(),
        projects = projects.len(),
        base_month = %settings.base_month,
        "loaded keyword sheet"
    );

    let inputs = ForecastInputs {
        keywords,
        projects,
        ctr_curve: CtrCurve::default(),
        seasonality: SeasonalityTable::default(),
        settings,
    };
    let records = run_forecast(&inputs).map_err(|e| e.to_string())?;

    let series = time_series(&records);
    let first_month = series.iter().map(|p| p.date).min();
    let last_month = series.iter().map(|p| p.date).max();
    if let (Some(start), Some(end)) = (first_month, last_month) {
        let totals = scenario_totals(&series, start, end).map_err(|e| e.to_string())?;
        for scenario in ScenarioKind::ALL {
            info!(
                scenario = scenario.label(),
                clicks = totals.get(scenario).round(),
                "24-month forecast total"
            );
        }
    }
    for summary in milestone_summary(&records, &inputs.projects, &DEFAULT_MILESTONES) {
        for milestone in &summary.milestones {
            info!(
                project = %summary.project,
                launch = %summary.launch_date,
                months = milestone.months,
                clicks = milestone.clicks.round(),
                "medium scenario clicks since launch"
            );
        }
    }

    match output {
        Some(path) => {
            let file =
                File::create(path).map_err(|e| format!("cannot create {}: {e}", path.display()))?;
            write_forecast_csv(&records, BufWriter::new(file)).map_err(|e| e.to_string())?;
            info!(path = %path.display(), records = records.len(), "wrote forecast export");
        }
        None => {
            write_forecast_csv(&records, io::stdout().lock()).map_err(|e| e.to_string())?;
        }
    }
    Ok(())
}

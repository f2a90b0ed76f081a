use chrono::Utc;
use monetization_optimizer::config::{AppConfig, load_config};
use monetization_optimizer::observer::{Observer, TracingObserver};
use monetization_optimizer::pipeline::{Pipeline, RunReport};
use monetization_optimizer::storage::{SqliteStore, StateStore};
use monetization_optimizer::tracker::TrackStatus;
use std::sync::Arc;
use tracing::{Level, error, info, warn};

const DEFAULT_CONFIG_PATH: &str = "config.json";

/// `[config.json] [track <strategy_id>]`: without `track`, one full run.
enum Command {
    Run,
    Track(String),
}

fn parse_args(mut args: Vec<String>) -> Result<(String, Command), String> {
    let track_at = args.iter().position(|a| a == "track");
    let command = match track_at {
        Some(i) => {
            let id = args
                .get(i + 1)
                .cloned()
                .ok_or_else(|| "track requires a strategy id".to_string())?;
            args.truncate(i);
            Command::Track(id)
        }
        None => Command::Run,
    };
    let config_path = args
        .into_iter()
        .next()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    Ok((config_path, command))
}

#[tokio::main]
async fn main() {
    let (config_path, command) = match parse_args(std::env::args().skip(1).collect()) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Usage error: {}", e);
            return;
        }
    };

    let config: AppConfig = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    // Initialize logging
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let store: Arc<dyn StateStore> = match SqliteStore::new(&config.store.path) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };

    let observer: Arc<dyn Observer> = Arc::new(TracingObserver);
    let pipeline = Pipeline::from_config(&config, store, observer);

    if let Command::Track(strategy_id) = command {
        match pipeline.tracker().track_strategy_implementation(&strategy_id).await {
            TrackStatus::Success => info!("Strategy {} tracked", strategy_id),
            TrackStatus::Failure => warn!("Strategy {} was not tracked", strategy_id),
        }
        return;
    }

    if !config.analysis.model.is_implemented() {
        warn!(
            "Model {} has no implementation; analysis will fail",
            config.analysis.model
        );
    }
    let run_id = Utc::now().format("%Y%m%dT%H%M%S").to_string();
    info!("Starting optimization run {}", run_id);

    match pipeline.run(&run_id).await {
        Ok(report) => log_report(&report),
        Err(e) => warn!(stage = %e.stage(), "Optimization run failed: {}", e),
    }
}

fn log_report(report: &RunReport) {
    info!("Run {} report", report.run_id);
    if let Some(customers) = &report.customers {
        info!(
            "Customers: {} | total purchases {:.2} | mean {:.2}",
            customers.customers, customers.total_purchase, customers.mean_purchase
        );
    }

    for prediction in &report.analysis.predictions {
        info!(
            "Forecast {}: {:.2}",
            prediction.date, prediction.predicted_revenue
        );
    }

    if report.ranked.is_empty() {
        info!("No strategy recommended for this run");
    }
    for (rank, scored) in report.ranked.iter().enumerate() {
        info!(
            "#{} {} | ROI {:.2}% | score {:.2} | {}",
            rank + 1,
            scored.strategy.name,
            scored.strategy.expected_roi,
            scored.score,
            scored.strategy.description
        );
    }

    for outcome in &report.tracked {
        let record = outcome.record();
        info!(
            "Tracked {} as {} at {}",
            record.strategy_id,
            record.status,
            record.timestamp.to_rfc3339()
        );
    }
}

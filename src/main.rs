use market_analyst::analyzer::{Analyzer, AnalyzerImpl};
use market_analyst::config::{load_config, AppConfig, MarketConfig};
use market_analyst::model::MarketAnalysis;
use market_analyst::normalizer::align_series;
use market_analyst::source;
use market_analyst::storage::SqliteStorage;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};
use futures::future::join_all;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Log any panic before the process unwinds. Panics caught inside the
    // analyzer are reported here only; the analyzer logs them at debug level.
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {}", panic_info);
    }));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config: Arc<AppConfig> = match load_config(&config_path) {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error ({}): {}", config_path, e);
            return;
        }
    };

    let analyzer = Arc::new(AnalyzerImpl::with_settings(config.analysis.clone()));

    // Reports go to SQLite, shared between the per-market tasks
    let storage = match SqliteStorage::new(&config.database_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            return;
        }
    };

    loop {
        info!("Markets to analyze: {}", config.markets.len());

        let tasks: Vec<_> = config
            .markets
            .iter()
            .map(|market| process_market(market, analyzer.clone(), storage.clone(), config.history_limit))
            .collect();
        join_all(tasks).await;

        log_latest_actions(&storage).await;

        let Some(interval) = config.check_interval_seconds else {
            info!("Single run finished.");
            break;
        };

        info!("Waiting {}s for the next cycle (Ctrl-C to stop)...", interval);
        tokio::select! {
            _ = sleep(Duration::from_secs(interval)) => {
                debug!("Timer triggered.");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested.");
                break;
            }
        }
    }
}

/// Fetches one market's history, analyzes it off the async workers and stores the report.
async fn process_market(
    market: &MarketConfig,
    analyzer: Arc<AnalyzerImpl>,
    storage: Arc<Mutex<SqliteStorage>>,
    history_limit: usize,
) {
    let symbol = market.symbol.clone();
    info!("Processing market: {}", symbol);

    let mut series = match source::from_config(&market.source).fetch(&symbol).await {
        Ok(series) => series,
        Err(e) => {
            warn!("Source error for {}: {}", symbol, e);
            return;
        }
    };
    align_series(&mut series, &symbol);

    let task_symbol = symbol.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        analyzer.analyze_market(&task_symbol, &series.prices, &series.volumes)
    })
    .await;

    let report = match outcome {
        Ok(Ok(report)) => report,
        Ok(Err(e)) => {
            // The analyzer already logged the cause.
            warn!("{} for {}", e, symbol);
            return;
        }
        Err(e) => {
            error!("Analysis task for {} did not complete: {}", symbol, e);
            return;
        }
    };

    log_report(&report);

    let storage = storage.lock().await;
    match storage.latest_report(&symbol) {
        Ok(Some(previous)) if previous.recommended_action != report.recommended_action => {
            info!(
                "Recommendation for {} changed: {} -> {}",
                symbol,
                previous.recommended_action.as_str(),
                report.recommended_action.as_str()
            );
        }
        Ok(_) => {}
        Err(e) => warn!("Failed to read previous report for {}: {}", symbol, e),
    }

    if let Err(e) = storage.save_report(&report) {
        warn!("Failed to save report for {}: {}", symbol, e);
        return;
    }
    match storage.prune_history(&symbol, history_limit) {
        Ok(0) => {}
        Ok(n) => debug!("Pruned {} old reports for {}", n, symbol),
        Err(e) => warn!("Prune failed for {}: {}", symbol, e),
    }

    info!("Finished market: {}", symbol);
}

fn log_report(report: &MarketAnalysis) {
    info!(
        "{}: price {:.2} ({:+.2}%), volume {:.0} ({:+.2}%)",
        report.symbol,
        report.price.value,
        report.price.change_percent,
        report.volume.value,
        report.volume.change_percent
    );
    for indicator in &report.technical_indicators {
        info!("  {} = {:.4} -> {:?}", indicator.name, indicator.value, indicator.signal);
    }
    info!(
        "  sentiment {:?}, risk {}, action {} (confidence {:.2})",
        report.sentiment.overall,
        report.risk_level.as_str(),
        report.recommended_action.as_str(),
        report.confidence
    );
    for warning in &report.warnings {
        warn!("  {}: {}", report.symbol, warning);
    }
    match serde_json::to_string(report) {
        Ok(json) => debug!("Report JSON: {}", json),
        Err(e) => warn!("Report encoding failed: {}", e),
    }
}

async fn log_latest_actions(storage: &Arc<Mutex<SqliteStorage>>) {
    match storage.lock().await.latest_actions() {
        Ok(actions) => {
            for (symbol, action, at) in actions {
                info!("Latest: {} -> {} at {}", symbol, action.as_str(), at);
            }
        }
        Err(e) => warn!("Failed to list latest actions: {}", e),
    }
}

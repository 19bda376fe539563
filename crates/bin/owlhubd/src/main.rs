//! # owlhubd: owlhub daemon
//!
//! Composition root that wires all adapters together and runs the
//! ingestion pipeline.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install the `tracing` subscriber
//! - Construct the serial transport, the analysis client and the event fan-out
//! - Build the ingestion pipeline and the axum router around them
//! - Run both until Ctrl-C, then stop ingesting, close the device and end
//!   the open event streams
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use owlhub_adapter_anomaly_http::HttpAnomalyAnalyzer;
use owlhub_adapter_http_axum::state::AppState;
use owlhub_adapter_serial::SerialTransport;
use owlhub_app::anomaly_gateway::AnomalyGateway;
use owlhub_app::automation::AutomationController;
use owlhub_app::calibrator::Calibrator;
use owlhub_app::connector::Connector;
use owlhub_app::event_bus::EventFanout;
use owlhub_app::pipeline::Pipeline;

use crate::config::Config;

/// Events each subscriber may have queued before new ones are dropped.
const SUBSCRIBER_QUEUE_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .init();

    // Event fan-out
    let events = Arc::new(EventFanout::new(SUBSCRIBER_QUEUE_CAPACITY));

    // Device connector
    let connector = Connector::new(
        SerialTransport::new(&config.serial),
        config.serial.selection_policy(),
        config.serial.retry_backoff(),
    );

    // Anomaly analysis
    let analyzer = HttpAnomalyAnalyzer::new(&config.analysis)?;
    let (gateway, alert_router) =
        AnomalyGateway::spawn(analyzer, Arc::clone(&events), config.analysis.alert_ttl());

    let pipeline = Pipeline::new(
        connector,
        Calibrator::new(config.calibration.temperature_offset),
        AutomationController::new(config.automation.humidity_threshold),
        gateway,
        Arc::clone(&events),
    );

    // HTTP
    let app = owlhub_adapter_http_axum::router::build(AppState::new(Arc::clone(&events)));
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        addr = %bind_addr,
        analysis_url = %config.analysis.url,
        "owlhubd listening"
    );

    let server = async {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
    };
    let ingestion = async {
        pipeline.run_until(shutdown_signal()).await;
        // SSE bodies only end once their subscriptions do.
        events.close();
    };
    let ((), served) = tokio::join!(ingestion, server);

    alert_router.abort();
    tracing::info!("owlhubd stopped");
    served?;
    Ok(())
}

/// Resolve on Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

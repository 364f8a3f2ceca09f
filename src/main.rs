use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payment_monitor::api::{self, AppState};
use payment_monitor::config::{self, Config};
use payment_monitor::engine::{consume, Monitor, SharedMonitor};
use payment_monitor::metrics::MonitorMetrics;
use payment_monitor::{feed, replay};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let args = cli::Cli::parse();
    let mut cfg = config::load(args.config.as_deref())?;

    let result = match args.command {
        Some(cli::Commands::Serve { port, feed_url }) => {
            if let Some(port) = port {
                cfg.port = port;
            }
            if let Some(url) = feed_url {
                cfg.feed_url = url;
            }
            cfg.validate()?;
            run_server(cfg).await
        }
        Some(cli::Commands::Replay { file, dimension }) => {
            run_replay(cfg, &file, dimension.as_deref()).await
        }
        None => run_server(cfg).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// Console logging, plus OTLP export when OTEL_EXPORTER_OTLP_ENDPOINT is set.
fn init_tracing() -> anyhow::Result<()> {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "payment-monitor"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let json = std::env::var("MONITOR_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let (json_layer, text_layer) = if json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "payment_monitor=debug,tower_http=debug".into()),
        ))
        .with(json_layer)
        .with(text_layer)
        .with(telemetry_layer)
        .init();
    Ok(())
}

async fn run_server(cfg: Config) -> anyhow::Result<()> {
    let monitor = SharedMonitor::new(Monitor::new(&cfg.monitor_settings())?);
    let metrics = MonitorMetrics::new().context("registering metrics")?;

    let (tx, rx) = mpsc::channel(cfg.channel_capacity);
    let consumer = tokio::spawn(consume(rx, monitor.clone(), metrics.clone()));

    let feed_url = cfg.feed_url.clone();
    let reconnect = cfg.reconnect.clone();
    let feed_task = tokio::spawn(async move { feed::run(&feed_url, &reconnect, tx).await });
    tracing::info!(url = %cfg.feed_url, "feed client started");

    let state = Arc::new(AppState {
        monitor,
        metrics,
        render_interval: cfg.render_interval(),
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("payment monitor listening on {}", addr);

    axum::serve(listener, api::app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the feed task drops the only sender, which ends the consumer.
    feed_task.abort();
    let stats = consumer.await.context("consumer task panicked")?;
    tracing::info!(
        applied = stats.applied,
        dropped = stats.dropped,
        sessions = stats.sessions,
        "shutdown complete"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn run_replay(
    cfg: Config,
    file: &std::path::Path,
    dimension: Option<&str>,
) -> anyhow::Result<()> {
    let monitor = SharedMonitor::new(Monitor::new(&cfg.monitor_settings())?);
    if let Some(dim) = dimension {
        if !monitor.select(dim).await {
            anyhow::bail!(
                "dimension '{}' is not configured (expected one of {:?})",
                dim,
                cfg.dimensions
            );
        }
    }

    let metrics = MonitorMetrics::new().context("registering metrics")?;
    let stats = replay::replay_file(file, monitor.clone(), metrics).await?;

    print!("{}", replay::render_chart(&monitor.chart().await));
    println!();
    print!("{}", replay::render_alerts(&monitor.alert_cards().await));
    println!();
    println!("{} events applied, {} dropped", stats.applied, stats.dropped);
    Ok(())
}

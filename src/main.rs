//! Smart Bin Monitor - Main Entry Point
//!
//! Seeds an in-memory store from a fleet snapshot, runs one dashboard
//! refresh, and logs the KPIs and per-bin status.

use anyhow::Context;
use smartbin_monitor::domain::config::{AppConfig, LoggingConfig};
use smartbin_monitor::helpers::get_or_create_data_dir;
use smartbin_monitor::services::{BinService, FleetSnapshot, MemoryStore, block_on};
use smartbin_monitor::state::{DashboardState, MapState, ingest_events, new_shared};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

const SNAPSHOT_FILE: &str = "fleet.json";

fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "smartbin-monitor.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

fn snapshot_path(config: &AppConfig) -> anyhow::Result<PathBuf> {
    match &config.store.snapshot_path {
        Some(path) => Ok(path.clone()),
        None => Ok(get_or_create_data_dir()?.join(SNAPSHOT_FILE)),
    }
}

fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    let _guard = init_tracing(&config.logging);

    tracing::info!("Starting Smart Bin Monitor...");

    let path = snapshot_path(&config)?;
    let store = if path.exists() {
        let snapshot = FleetSnapshot::load(&path)
            .with_context(|| format!("reading fleet snapshot {}", path.display()))?;
        tracing::info!(
            "Loaded {} bins and {} logs from {}",
            snapshot.bin_registry.len(),
            snapshot.bin_history.len(),
            path.display()
        );
        MemoryStore::from_snapshot(snapshot)
    } else {
        tracing::warn!("No fleet snapshot at {}, starting empty", path.display());
        MemoryStore::new()
    };

    let service = BinService::with_store(Arc::new(store));
    let dashboard = new_shared(DashboardState::new());
    let mut map = MapState::from_config(&config.map);

    block_on(service.refresh(&dashboard));

    let mut dashboard = dashboard.lock();
    ingest_events(&service.events(), &mut dashboard, &mut map);
    map.set_markers(dashboard.bins());

    let stats = dashboard.stats();
    tracing::info!(
        "Total waste {:.1} kg, average fill {}%, {} active, {} critical",
        stats.total_waste_kg,
        stats.average_fill_percent,
        stats.active_bin_count,
        stats.critical_bin_count
    );
    for marker in map.markers() {
        tracing::info!(
            "Bin {}: {:.0}% {:.1} kg [{}] at ({:.1}, {:.1})",
            marker.assigned_id,
            marker.fill_level,
            marker.weight,
            marker.status.label(),
            marker.position.x,
            marker.position.y
        );
    }
    let counts = map.status_counts();
    tracing::info!(
        "Legend: {} normal, {} warning, {} critical",
        counts.normal,
        counts.warning,
        counts.critical
    );
    for notice in dashboard.notices() {
        tracing::debug!("[{}] {}", notice.level.label(), notice.message);
    }

    Ok(())
}

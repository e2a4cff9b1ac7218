use std::net::SocketAddr;

use crate::sql::Command;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total statements executed. Labels: command, status.
pub const QUERIES_TOTAL: &str = "tablebook_queries_total";

/// Histogram: statement latency in seconds. Labels: command.
pub const QUERY_DURATION_SECONDS: &str = "tablebook_query_duration_seconds";

// ── Store metrics ───────────────────────────────────────────────

/// Counter: reservations committed under a fresh id.
pub const RESERVATIONS_CREATED_TOTAL: &str = "tablebook_reservations_created_total";

/// Counter: reservations replaced under an existing id.
pub const RESERVATIONS_UPDATED_TOTAL: &str = "tablebook_reservations_updated_total";

/// Counter: reservations deleted.
pub const RESERVATIONS_DELETED_TOTAL: &str = "tablebook_reservations_deleted_total";

/// Counter: candidates refused. Labels: reason.
pub const ADMISSION_REJECTED_TOTAL: &str = "tablebook_admission_rejected_total";

/// Gauge: reservations currently held by the store.
pub const RESERVATIONS_LIVE: &str = "tablebook_reservations_live";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: active TCP connections.
pub const CONNECTIONS_ACTIVE: &str = "tablebook_connections_active";

/// Counter: total connections accepted.
pub const CONNECTIONS_TOTAL: &str = "tablebook_connections_total";

/// Counter: connections rejected due to limit.
pub const CONNECTIONS_REJECTED_TOTAL: &str = "tablebook_connections_rejected_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), metrics_exporter_prometheus::BuildError> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::InsertReservation { request } if request.id.is_some() => "replace_reservation",
        Command::InsertReservation { .. } => "insert_reservation",
        Command::DeleteReservation { .. } => "delete_reservation",
        Command::SelectAll => "select_all",
        Command::SelectById { .. } => "select_by_id",
        Command::SelectDay { .. } => "select_day",
        Command::SelectBetween { .. } => "select_between",
        Command::SelectAvailability { .. } => "select_availability",
    }
}

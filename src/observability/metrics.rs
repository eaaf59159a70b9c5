//! Metrics recording.
//!
//! # Responsibilities
//! - Define resilience metrics (retries, rejections, timeouts, policy builds)
//! - Keep call sites to one line
//!
//! # Metrics
//! - `resilience_retries_total` (counter): retries by layer (`retry`, `server_throttle`)
//! - `resilience_rejections_total` (counter): fail-fast rejections by kind
//! - `resilience_timeouts_total` (counter): attempt timeouts by transfer class
//! - `resilience_policy_builds_total` (counter): component policy (re)builds
//! - `resilience_config_reloads_total` (counter): config swaps by outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; installing an exporter is
//!   left to the embedding process
//! - Labels are static strings only

pub fn record_retry(layer: &'static str) {
    metrics::counter!("resilience_retries_total", "layer" => layer).increment(1);
}

pub fn record_rejection(kind: &'static str) {
    metrics::counter!("resilience_rejections_total", "kind" => kind).increment(1);
}

pub fn record_timeout(transfer: &'static str) {
    metrics::counter!("resilience_timeouts_total", "transfer" => transfer).increment(1);
}

pub fn record_policy_build(component: &'static str) {
    metrics::counter!("resilience_policy_builds_total", "component" => component).increment(1);
}

pub fn record_config_reload(outcome: &'static str) {
    metrics::counter!("resilience_config_reloads_total", "outcome" => outcome).increment(1);
}

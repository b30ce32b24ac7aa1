//! Prometheus metrics for the push service.
//!
//! - Event metrics (received, ignored, rejected)
//! - Notification outcome metrics per robot (sent, skipped, failed)
//! - Send latency and failure classification
//! - Device token lookups

mod helpers;

pub use helpers::{encode_metrics, EventMetrics, NotificationMetrics, TokenLookupMetrics};

use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

/// Prefix for all metrics
const METRIC_PREFIX: &str = "atlas_push";

lazy_static! {
    // ============================================================================
    // Event Metrics
    // ============================================================================

    /// Document-created events received, by robot
    pub static ref EVENTS_RECEIVED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_received_total", METRIC_PREFIX),
        "Total document-created events received",
        &["robot"]
    ).unwrap();

    /// Events acknowledged without dispatch (other event types, unrouted paths)
    pub static ref EVENTS_IGNORED_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_events_ignored_total", METRIC_PREFIX),
        "Total events acknowledged but not dispatched",
        &["reason"]
    ).unwrap();

    /// Malformed events rejected with 400
    pub static ref EVENTS_REJECTED_TOTAL: IntCounter = register_int_counter!(
        format!("{}_events_rejected_total", METRIC_PREFIX),
        "Total malformed events rejected"
    ).unwrap();

    // ============================================================================
    // Notification Metrics
    // ============================================================================

    /// Handler outcomes by robot
    pub static ref NOTIFICATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notifications_total", METRIC_PREFIX),
        "Total handler outcomes",
        &["robot", "outcome"]
    ).unwrap();

    /// Handler failures by robot and error kind
    pub static ref NOTIFICATION_FAILURES_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_notification_failures_total", METRIC_PREFIX),
        "Total handler failures by error kind",
        &["robot", "kind"]
    ).unwrap();

    /// Time spent in the messaging send call
    pub static ref SEND_LATENCY: HistogramVec = register_histogram_vec!(
        format!("{}_send_latency_seconds", METRIC_PREFIX),
        "Push send latency in seconds",
        &["robot"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]
    ).unwrap();

    // ============================================================================
    // Token Lookup Metrics
    // ============================================================================

    /// Device token lookups by result (found, missing_user, missing_token, error)
    pub static ref TOKEN_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        format!("{}_token_lookups_total", METRIC_PREFIX),
        "Total device token lookups",
        &["result"]
    ).unwrap();
}

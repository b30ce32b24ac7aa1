//! Metrics helper structs for convenient metric recording

use std::time::Duration;

use prometheus::{Encoder, TextEncoder};

use super::{
    EVENTS_IGNORED_TOTAL, EVENTS_RECEIVED_TOTAL, EVENTS_REJECTED_TOTAL,
    NOTIFICATIONS_TOTAL, NOTIFICATION_FAILURES_TOTAL, SEND_LATENCY, TOKEN_LOOKUPS_TOTAL,
};

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer).unwrap_or_default())
}

/// Helper struct for recording event ingestion metrics
pub struct EventMetrics;

impl EventMetrics {
    pub fn record_received(robot: &str) {
        EVENTS_RECEIVED_TOTAL.with_label_values(&[robot]).inc();
    }

    pub fn record_ignored(reason: &str) {
        EVENTS_IGNORED_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn record_rejected() {
        EVENTS_REJECTED_TOTAL.inc();
    }
}

/// Helper struct for recording handler outcomes
pub struct NotificationMetrics;

impl NotificationMetrics {
    pub fn record_sent(robot: &str, latency: Duration) {
        NOTIFICATIONS_TOTAL.with_label_values(&[robot, "sent"]).inc();
        SEND_LATENCY
            .with_label_values(&[robot])
            .observe(latency.as_secs_f64());
    }

    pub fn record_skipped(robot: &str) {
        NOTIFICATIONS_TOTAL.with_label_values(&[robot, "skipped"]).inc();
    }

    pub fn record_failed(robot: &str, kind: &str) {
        NOTIFICATIONS_TOTAL.with_label_values(&[robot, "failed"]).inc();
        NOTIFICATION_FAILURES_TOTAL
            .with_label_values(&[robot, kind])
            .inc();
    }
}

/// Helper struct for recording device token lookups
pub struct TokenLookupMetrics;

impl TokenLookupMetrics {
    pub fn record(result: &str) {
        TOKEN_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_recorded_metrics() {
        EventMetrics::record_received("broadcast");
        NotificationMetrics::record_sent("broadcast", Duration::from_millis(20));
        NotificationMetrics::record_failed("chat_message", "unregistered");

        let output = encode_metrics().unwrap();
        assert!(output.contains("atlas_push_events_received_total"));
        assert!(output.contains("atlas_push_notifications_total"));
        assert!(output.contains("atlas_push_send_latency_seconds"));
        assert!(output.contains("atlas_push_notification_failures_total"));
    }
}

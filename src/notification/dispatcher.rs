use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::firestore::PathPattern;
use crate::metrics::EventMetrics;

use super::broadcast::notify_broadcast;
use super::chat::notify_chat_message;
use super::context::RobotContext;
use super::interaction::notify_interaction;
use super::types::{DocumentCreated, HandlerOutcome, RobotEvent, RobotKind};

/// Result of dispatching one document-created event
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    pub event_id: String,
    /// Robot that handled the event, if any path pattern matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robot: Option<RobotKind>,
    #[serde(flatten)]
    pub outcome: HandlerOutcome,
}

/// Statistics for the dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    pub events_received: AtomicU64,
    pub events_ignored: AtomicU64,
    pub total_sent: AtomicU64,
    pub total_skipped: AtomicU64,
    pub total_failed: AtomicU64,
    pub broadcast_events: AtomicU64,
    pub chat_message_events: AtomicU64,
    pub interaction_events: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            events_received: self.events_received.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            total_sent: self.total_sent.load(Ordering::Relaxed),
            total_skipped: self.total_skipped.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            broadcast_events: self.broadcast_events.load(Ordering::Relaxed),
            chat_message_events: self.chat_message_events.load(Ordering::Relaxed),
            interaction_events: self.interaction_events.load(Ordering::Relaxed),
        }
    }

    fn record_robot(&self, robot: RobotKind) {
        let counter = match robot {
            RobotKind::Broadcast => &self.broadcast_events,
            RobotKind::ChatMessage => &self.chat_message_events,
            RobotKind::Interaction => &self.interaction_events,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn record_outcome(&self, outcome: &HandlerOutcome) {
        let counter = match outcome {
            HandlerOutcome::Sent { .. } => &self.total_sent,
            HandlerOutcome::Skipped { .. } => &self.total_skipped,
            HandlerOutcome::Failed { .. } => &self.total_failed,
            HandlerOutcome::Ignored => &self.events_ignored,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub events_received: u64,
    pub events_ignored: u64,
    pub total_sent: u64,
    pub total_skipped: u64,
    pub total_failed: u64,
    pub broadcast_events: u64,
    pub chat_message_events: u64,
    pub interaction_events: u64,
}

/// Routes document-created events to the robot watching their path
pub struct NotificationDispatcher {
    context: RobotContext,
    routes: Vec<(RobotKind, PathPattern)>,
    stats: DispatcherStats,
}

impl NotificationDispatcher {
    pub fn new(context: RobotContext) -> Self {
        let routes = RobotKind::ALL
            .iter()
            .map(|robot| (*robot, robot.path_pattern()))
            .collect();

        Self {
            context,
            routes,
            stats: DispatcherStats::default(),
        }
    }

    pub fn context(&self) -> &RobotContext {
        &self.context
    }

    /// Get dispatcher statistics
    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Find the robot watching `path` and bind its wildcards
    pub fn route(&self, path: &str) -> Option<(RobotKind, std::collections::HashMap<String, String>)> {
        self.routes
            .iter()
            .find_map(|(robot, pattern)| pattern.matches(path).map(|params| (*robot, params)))
    }

    /// Acknowledge an event without handing it to a robot
    pub fn ignore(&self, event_id: String, reason: &str) -> DispatchResult {
        EventMetrics::record_ignored(reason);
        self.stats.record_outcome(&HandlerOutcome::Ignored);

        DispatchResult {
            event_id,
            robot: None,
            outcome: HandlerOutcome::Ignored,
        }
    }

    /// Hand one created document to its robot.
    ///
    /// Never fails: robot errors come back as `HandlerOutcome::Failed`.
    #[tracing::instrument(
        name = "dispatcher.dispatch",
        skip(self, event),
        fields(event_id = %event.event_id, path = %event.path)
    )]
    pub async fn dispatch(&self, event: DocumentCreated) -> DispatchResult {
        self.stats.events_received.fetch_add(1, Ordering::Relaxed);

        let Some((robot, params)) = self.route(&event.path) else {
            tracing::debug!("No robot watches this path");
            return self.ignore(event.event_id, "unrouted");
        };

        EventMetrics::record_received(robot.as_str());
        self.stats.record_robot(robot);

        let robot_event = RobotEvent {
            event_id: event.event_id.clone(),
            document: event.document,
            params,
        };

        let outcome = match robot {
            RobotKind::Broadcast => notify_broadcast(&self.context, &robot_event).await,
            RobotKind::ChatMessage => notify_chat_message(&self.context, &robot_event).await,
            RobotKind::Interaction => notify_interaction(&self.context, &robot_event).await,
        };

        self.stats.record_outcome(&outcome);
        tracing::debug!(robot = %robot, status = outcome.status(), "Event dispatched");

        DispatchResult {
            event_id: event.event_id,
            robot: Some(robot),
            outcome,
        }
    }
}

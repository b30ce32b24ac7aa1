// Shared infrastructure
pub mod auth;
pub mod config;
pub mod error;
pub mod metrics;
pub mod telemetry;

// Google APIs
pub mod firestore;
pub mod messaging;

// Notification robots
pub mod fields;
pub mod notification;

// Application layer
pub mod api;
pub mod server;
pub mod triggers;

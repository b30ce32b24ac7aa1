use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    pub firebase: FirebaseConfig,
    #[serde(default)]
    pub firestore: FirestoreConfig,
    #[serde(default)]
    pub fcm: FcmConfig,
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiConfig {
    /// Shared secret expected in `X-API-Key` on the event endpoint
    pub key: Option<String>,
}

/// How the service obtains Google access tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Signed JWT assertion from a service account key file
    #[default]
    ServiceAccount,
    /// Instance metadata server (Cloud Run, GCE, GKE)
    Metadata,
    /// Fixed token from configuration (emulators)
    Static,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirebaseConfig {
    pub project_id: String,
    /// Path to a service account JSON key
    pub credentials_file: Option<String>,
    #[serde(default)]
    pub auth: AuthMode,
    pub static_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirestoreConfig {
    /// "firestore" or "memory"
    #[serde(default = "default_firestore_backend")]
    pub backend: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_firestore_base_url")]
    pub base_url: String,
    /// Talk to the local emulator (no Google credentials)
    #[serde(default)]
    pub emulator: bool,
    #[serde(default = "default_users_collection")]
    pub users_collection: String,
    #[serde(default = "default_token_field")]
    pub token_field: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FcmConfig {
    /// "fcm" or "memory"
    #[serde(default = "default_fcm_backend")]
    pub backend: String,
    #[serde(default = "default_fcm_base_url")]
    pub base_url: String,
    /// Validate messages without delivering them
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default = "default_broadcast_topic")]
    pub broadcast_topic: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_sampling_ratio")]
    pub sampling_ratio: f64,
    /// Emit logs as JSON lines instead of human-readable text
    #[serde(default)]
    pub json_logs: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_firestore_backend() -> String {
    "firestore".to_string()
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_firestore_base_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_users_collection() -> String {
    "users".to_string()
}

fn default_token_field() -> String {
    "fcmToken".to_string()
}

fn default_fcm_backend() -> String {
    "fcm".to_string()
}

fn default_fcm_base_url() -> String {
    "https://fcm.googleapis.com".to_string()
}

fn default_broadcast_topic() -> String {
    "general".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_string()
}

fn default_service_name() -> String {
    "atlas-push-service".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        // Load .env file if exists
        let _ = dotenvy::dotenv();

        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("firestore.backend", "firestore")?
            .set_default("fcm.backend", "fcm")?
            .set_default("fcm.broadcast_topic", "general")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // FIREBASE__PROJECT_ID, FCM__DRY_RUN, SERVER__PORT, API__KEY, etc.
            .add_source(
                Environment::default()
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        builder.build()?.try_deserialize()
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
        }
    }
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        Self {
            backend: default_firestore_backend(),
            database: default_database(),
            base_url: default_firestore_base_url(),
            emulator: false,
            users_collection: default_users_collection(),
            token_field: default_token_field(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for FcmConfig {
    fn default() -> Self {
        Self {
            backend: default_fcm_backend(),
            base_url: default_fcm_base_url(),
            dry_run: false,
            broadcast_topic: default_broadcast_topic(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for OtelConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_service_name(),
            sampling_ratio: default_sampling_ratio(),
            json_logs: false,
        }
    }
}

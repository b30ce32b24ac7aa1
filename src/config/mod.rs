mod settings;

pub use settings::{
    ApiConfig, AuthMode, FcmConfig, FirebaseConfig, FirestoreConfig, OtelConfig, ServerConfig,
    Settings,
};

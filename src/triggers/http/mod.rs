//! HTTP event trigger
//!
//! Eventarc pushes Firestore document events to `POST /events` as
//! CloudEvents (binary or structured mode).

mod handlers;
mod models;

pub use handlers::receive_event;
pub use models::{
    DocumentEventData, EventResponse, FirestoreCloudEvent, CREATED_EVENT_TYPES,
    STRUCTURED_CONTENT_TYPE,
};

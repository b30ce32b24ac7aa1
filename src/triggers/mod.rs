mod http;

pub use http::{
    receive_event, DocumentEventData, EventResponse, FirestoreCloudEvent, CREATED_EVENT_TYPES,
    STRUCTURED_CONTENT_TYPE,
};

//! Notification robots and the dispatcher that routes events to them.
//!
//! Each robot is a stateless handler for one watched collection:
//!
//! | Robot | Path | Target |
//! |-------|------|--------|
//! | broadcast | `broadcasts/{broadcastId}` | topic `general` |
//! | chat message | `chats/{chatId}/messages/{msgId}` | recipient's device |
//! | interaction | `interactions/{intId}` | post owner's device |
//!
//! Robots never return errors. Missing fields fall back to defaults or
//! skip the event, and lookup or delivery failures are logged and reported
//! as `HandlerOutcome::Failed`.

mod broadcast;
mod chat;
mod context;
mod dispatcher;
mod interaction;
mod types;

pub use broadcast::{build_broadcast_message, notify_broadcast, BroadcastContent};
pub use chat::{build_chat_message, chat_recipient, notify_chat_message};
pub use context::{DeviceToken, RobotContext, RobotOptions};
pub use dispatcher::{DispatchResult, DispatcherStatsSnapshot, NotificationDispatcher};
pub use interaction::{
    build_interaction_message, interaction_content, interaction_owner, notify_interaction,
    InteractionType,
};
pub use types::{DocumentCreated, HandlerOutcome, RobotEvent, RobotKind, SkipReason};

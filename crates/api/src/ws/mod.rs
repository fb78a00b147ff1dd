//! Real-time channel: connection registry, wire messages, socket handling,
//! and heartbeat.

mod handler;
pub mod heartbeat;
pub mod hub;
pub mod messages;

pub use handler::ws_handler;
pub use hub::{ConnectionState, HubError, RealtimeHub};
pub use messages::{AlertLevel, HubUser, InitialSnapshot, ServerMessage};

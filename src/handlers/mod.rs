//! HTTP request handlers.

pub mod health;
pub mod messages;

pub use health::health_check;
pub use messages::{list_messages, send_message};

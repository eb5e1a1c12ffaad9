mod health;
mod messages;
mod metrics;

pub use health::health_handler;
pub use messages::{clear_messages, list_messages, post_message};
pub use metrics::metrics_handler;

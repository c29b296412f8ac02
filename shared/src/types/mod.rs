pub mod app_config;
pub mod event;
pub mod sse;

pub use self::app_config::{AppConfig, ConfigError, ServerConfig, StreamConfig};
pub use self::event::{Severity, SystemEvent};
pub use self::sse::{EventChange, Operation, SseError, SseResult};

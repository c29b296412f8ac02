pub mod config;

pub use self::config::{load_config, load_or_default};

pub mod settings;

pub use settings::{AppConfig, ScyllaConfig, Settings};

//! Server configuration
//!
//! Settings are loaded from a TOML file given with `--config` or the
//! `XLFRAME_CONFIG` environment variable. Every section is optional:
//!
//! ```toml
//! [server]
//! name = "xlframe"
//!
//! [read]
//! has_header = true
//! infer_schema_length = 100
//!
//! [logging]
//! filter = "info"
//! ```

mod settings;

#[cfg(test)]
mod tests;

pub use settings::{ConfigError, LoggingSettings, ServerSettings, Settings, CONFIG_ENV};

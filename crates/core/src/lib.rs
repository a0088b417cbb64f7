pub mod config;
pub mod domain;
pub mod generation;
pub mod normalize;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::quote::{Quote, QuoteDraft};
pub use generation::{DuplicateGate, GenerationPolicy, GenerationState};
pub use normalize::{normalize, FALLBACK_AUTHOR, FALLBACK_TEXT};

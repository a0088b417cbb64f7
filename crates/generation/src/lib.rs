pub mod service;
pub mod source;

pub use service::{GenerationError, GenerationService};
pub use source::{CannedQuoteSource, HttpQuoteSource, QuoteSource, SourceError};

pub mod config;
pub mod corpus;
pub mod discovery;
pub mod display;
pub mod error;
pub mod metadata;
pub mod profanity;
pub mod reader;
pub mod selector;

// Re-export main types for convenient access
pub use corpus::{scan, Corpus, Line, ScanConfig};
pub use error::VerseError;
pub use metadata::{MetadataResolver, TrackMetadata};
pub use profanity::{CacheState, Classifier, CommandClassifier, ProfanityCache, ProfanityFlags};
pub use selector::{pick, pick_line, pick_streaming, Pick, SelectionError, StreamOptions};

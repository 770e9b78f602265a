//! Media identity, caller preferences and the stream descriptors we hand back.

mod markers;
mod types;

pub use markers::{describe_file, format_size_gb, EpisodeMarker, FileTraits, UNKNOWN_TRAIT};
pub use types::*;

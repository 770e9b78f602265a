//! Debrid service integration: magnet upload, file listing, link unlock.

mod alldebrid;
mod files;
mod types;

pub use alldebrid::AllDebridClient;
pub use files::{is_video_file, select_video_files, VIDEO_EXTENSIONS};
pub use types::*;

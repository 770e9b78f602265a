//! Display text for unlocked streams.

use crate::debrid::{Magnet, VideoFile};
use crate::media::{describe_file, format_size_gb, MediaMetadata, MediaQuery, Stream};

/// Indexer name as shown to users (`ygg` -> `Ygg`).
pub fn source_label(source: &str) -> String {
    let mut chars = source.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unknown".to_string(),
    }
}

/// Build the stream descriptor for an unlocked file.
pub fn build_stream(
    metadata: &MediaMetadata,
    query: &MediaQuery,
    magnet: &Magnet,
    file: &VideoFile,
    url: String,
) -> Stream {
    let traits = describe_file(&file.name);

    let name = format!(
        "{} + AD | {} | {}",
        source_label(&magnet.source),
        traits.resolution,
        traits.codec
    );

    let mut heading = metadata.primary_title.clone();
    if let Some(marker) = query.episode_marker() {
        heading.push_str(&format!(" - {}", marker));
    }
    let title = format!(
        "{}\n{}\n{} | {}",
        heading,
        file.name,
        traits.source,
        format_size_gb(file.size_bytes)
    );

    Stream { name, title, url }
}

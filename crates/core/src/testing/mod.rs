//! Testing utilities and mock implementations of the upstream services.
//!
//! Every external boundary (metadata, indexers, debrid) has a mock here so
//! the whole pipeline can be driven without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use relaystream_core::testing::{fixtures, MockDebridClient, MockIndexer};
//!
//! let indexer = MockIndexer::new("ygg");
//! indexer
//!     .set_results_for("Film", vec![fixtures::hashed_candidate("1", "Film 1080p x265", "aaa")])
//!     .await;
//!
//! let debrid = MockDebridClient::new();
//! debrid.set_files(1, vec![fixtures::video_file("Film.1080p.mkv")]).await;
//! ```

mod mock_debrid;
mod mock_indexer;
mod mock_metadata;

pub use mock_debrid::MockDebridClient;
pub use mock_indexer::MockIndexer;
pub use mock_metadata::MockMetadataProvider;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::debrid::{Magnet, Readiness, VideoFile};
    use crate::indexer::RawCandidate;
    use crate::media::{MediaKind, MediaMetadata};

    /// A search hit without inline hash or language tag.
    pub fn raw_candidate(id: &str, title: &str) -> RawCandidate {
        RawCandidate {
            id: id.to_string(),
            title: title.to_string(),
            size_bytes: 1024 * 1024 * 1024 * 2, // 2 GB
            seeders: 10,
            language: None,
            info_hash: None,
        }
    }

    /// A search hit that carries its content hash inline.
    pub fn hashed_candidate(id: &str, title: &str, hash: &str) -> RawCandidate {
        RawCandidate {
            info_hash: Some(hash.to_string()),
            ..raw_candidate(id, title)
        }
    }

    /// A magnet reported by the debrid service, sourced from `ygg`.
    pub fn magnet(hash: &str, remote_id: u64, ready: bool) -> Magnet {
        Magnet {
            hash: hash.to_string(),
            remote_id,
            name: format!("Mock Magnet {}", hash),
            size_bytes: 1024 * 1024 * 1024,
            readiness: if ready {
                Readiness::Ready
            } else {
                Readiness::NotReady
            },
            source: "ygg".to_string(),
        }
    }

    pub fn metadata(
        external_id: &str,
        kind: MediaKind,
        title: &str,
        alternate: Option<&str>,
    ) -> MediaMetadata {
        MediaMetadata {
            external_id: external_id.to_string(),
            kind,
            primary_title: title.to_string(),
            alternate_title: alternate.map(str::to_string),
        }
    }

    /// A 1.5 GB file whose locked link is derived from its name.
    pub fn video_file(name: &str) -> VideoFile {
        VideoFile {
            name: name.to_string(),
            size_bytes: 1024 * 1024 * 1536,
            link: format!("https://locked.test/{}", name),
        }
    }
}

//! Video file selection.

use super::VideoFile;

/// Extensions treated as playable video.
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mkv", ".avi", ".mov", ".wmv"];

pub fn is_video_file(name: &str) -> bool {
    let name = name.to_lowercase();
    VIDEO_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}

/// Keep video files; when none qualify, keep the whole listing instead.
pub fn select_video_files(files: Vec<VideoFile>) -> Vec<VideoFile> {
    let videos: Vec<VideoFile> = files
        .iter()
        .filter(|f| is_video_file(&f.name))
        .cloned()
        .collect();

    if videos.is_empty() {
        files
    } else {
        videos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> VideoFile {
        VideoFile {
            name: name.to_string(),
            size_bytes: 1,
            link: format!("https://locked/{}", name),
        }
    }

    #[test]
    fn test_keeps_only_videos() {
        let selected = select_video_files(vec![
            file("Movie.MKV"),
            file("sample.txt"),
            file("cover.jpg"),
            file("extra.mp4"),
        ]);
        let names: Vec<&str> = selected.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Movie.MKV", "extra.mp4"]);
    }

    #[test]
    fn test_falls_back_to_everything() {
        let selected = select_video_files(vec![file("movie"), file("movie.nfo")]);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_empty_stays_empty() {
        assert!(select_video_files(Vec::new()).is_empty());
    }
}

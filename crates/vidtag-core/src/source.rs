use std::path::{Path, PathBuf};

use tracing::warn;
use walkdir::WalkDir;

use crate::{
    error::{Result, VidtagError},
    types::VideoFile,
};

/// Extensions accepted by the provider and the MIME type announced on upload.
pub const SUPPORTED_VIDEO_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("mov", "video/mov"),
    ("avi", "video/avi"),
    ("flv", "video/x-flv"),
    ("mpg", "video/mpg"),
    ("webm", "video/webm"),
    ("wmv", "video/wmv"),
    ("3gp", "video/3gpp"),
];

/// Files smaller than this are almost certainly truncated or corrupt.
pub const MIN_VIDEO_BYTES: u64 = 10;

pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    SUPPORTED_VIDEO_TYPES
        .iter()
        .find(|(supported, _)| *supported == ext)
        .map(|(_, mime)| *mime)
}

pub fn is_supported_video(path: &Path) -> bool {
    mime_type_for(path).is_some()
}

/// Check a single file before upload.
pub fn validate_video(path: &Path, max_bytes: u64) -> Result<VideoFile> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        _ => {
            return Err(VidtagError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    let Some(mime_type) = mime_type_for(path) else {
        return Err(VidtagError::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    };

    let size = metadata.len();
    if size < MIN_VIDEO_BYTES {
        return Err(VidtagError::TransferFailed {
            path: path.to_path_buf(),
            reason: format!("file is only {size} bytes, likely corrupt"),
        });
    }
    if size > max_bytes {
        return Err(VidtagError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: max_bytes,
        });
    }

    Ok(VideoFile {
        path: path.to_path_buf(),
        size,
        mime_type,
    })
}

/// Resolve the `--video` argument into an ordered list of candidate files.
///
/// A directory is walked recursively without following symlinks; files with
/// unsupported extensions are skipped and the result is sorted by path. When
/// `specific` is set only files with that exact file name are kept.
pub fn collect_videos(input: &Path, specific: Option<&str>) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        if !is_supported_video(input) {
            return Err(VidtagError::UnsupportedExtension {
                path: input.to_path_buf(),
            });
        }
        return Ok(vec![input.to_path_buf()]);
    }

    if !input.is_dir() {
        return Err(VidtagError::InputNotFound {
            path: input.to_path_buf(),
        });
    }

    let mut found: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry under {}: {}", input.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_supported_video(path))
        .collect();
    if let Some(name) = specific {
        found.retain(|path| path.file_name().is_some_and(|n| n == name));
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for(Path::new("a.MP4")), Some("video/mp4"));
        assert_eq!(mime_type_for(Path::new("clip.3gp")), Some("video/3gpp"));
        assert_eq!(mime_type_for(Path::new("notes.txt")), None);
        assert_eq!(mime_type_for(Path::new("no_extension")), None);
    }

    #[test]
    fn test_collect_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.mov"), b"0123456789").unwrap();
        fs::write(dir.path().join("a.mp4"), b"0123456789").unwrap();
        fs::write(dir.path().join("readme.txt"), b"hello").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.webm"), b"0123456789").unwrap();

        let found = collect_videos(dir.path(), None).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.mp4"),
                PathBuf::from("b.mov"),
                PathBuf::from("nested").join("c.webm"),
            ]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_collect_does_not_follow_symlink_loops() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"0123456789").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let found = collect_videos(dir.path(), None).unwrap();
        assert_eq!(found, vec![dir.path().join("a.mp4")]);
    }

    #[test]
    fn test_collect_specific() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"0123456789").unwrap();
        fs::write(dir.path().join("b.mp4"), b"0123456789").unwrap();

        let found = collect_videos(dir.path(), Some("b.mp4")).unwrap();
        assert_eq!(found, vec![dir.path().join("b.mp4")]);
    }

    #[test]
    fn test_collect_rejects_bad_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");
        assert!(matches!(
            collect_videos(&missing, None),
            Err(VidtagError::InputNotFound { .. })
        ));

        let text = dir.path().join("notes.txt");
        fs::write(&text, b"hello").unwrap();
        assert!(matches!(
            collect_videos(&text, None),
            Err(VidtagError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn test_validate_size_limits() {
        let dir = tempfile::tempdir().unwrap();
        let tiny = dir.path().join("tiny.mp4");
        fs::write(&tiny, b"abc").unwrap();
        assert!(matches!(
            validate_video(&tiny, 1024),
            Err(VidtagError::TransferFailed { .. })
        ));

        let big = dir.path().join("big.mp4");
        fs::write(&big, vec![0u8; 64]).unwrap();
        assert!(matches!(
            validate_video(&big, 32),
            Err(VidtagError::FileTooLarge { size: 64, limit: 32, .. })
        ));

        let ok = validate_video(&big, 1024).unwrap();
        assert_eq!(ok.size, 64);
        assert_eq!(ok.mime_type, "video/mp4");
        assert_eq!(ok.file_name(), "big.mp4");
    }
}

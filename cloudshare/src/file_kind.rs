//! Presentation category of a stored file, derived from its URL's extension.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Archive,
    Other,
    Unknown,
}

/// How the dashboard shows a file of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "element", rename_all = "lowercase")]
pub enum Presentation {
    Image,
    Video { source_type: &'static str },
    Link { label: &'static str },
    Hidden,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Image => "image",
            FileKind::Video => "video",
            FileKind::Archive => "archive",
            FileKind::Other => "other",
            FileKind::Unknown => "unknown",
        }
    }

    pub fn presentation(&self) -> Presentation {
        match self {
            FileKind::Image => Presentation::Image,
            FileKind::Video => Presentation::Video {
                source_type: "video/mp4",
            },
            FileKind::Archive => Presentation::Link {
                label: "📦 Download ZIP File",
            },
            FileKind::Other => Presentation::Link {
                label: "📁 Open File",
            },
            FileKind::Unknown => Presentation::Hidden,
        }
    }
}

/// Classify a file URL by the extension of its last path segment.
///
/// Query and fragment are ignored, the scheme and host never count as a
/// segment, and the extension is matched case-insensitively. A segment with
/// no dot, or ending in one, is `Unknown`.
pub fn classify_file_kind(url: &str) -> FileKind {
    let url = url.split('#').next().unwrap_or_default();
    let url = url.split('?').next().unwrap_or_default();

    let path = match url.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map(|(_, path)| path).unwrap_or_default(),
        None => url,
    };

    let segment = path.rsplit('/').next().unwrap_or_default();
    let Some((_, ext)) = segment.rsplit_once('.') else {
        return FileKind::Unknown;
    };
    if ext.is_empty() {
        return FileKind::Unknown;
    }

    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "png" | "gif" | "webp" => FileKind::Image,
        "mp4" | "webm" | "ogg" => FileKind::Video,
        "zip" | "rar" | "7z" => FileKind::Archive,
        _ => FileKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_extension() {
        assert_eq!(classify_file_kind("a.PNG"), FileKind::Image);
        assert_eq!(classify_file_kind("v.webm"), FileKind::Video);
        assert_eq!(classify_file_kind("f.rar"), FileKind::Archive);
        assert_eq!(classify_file_kind("f.pdf"), FileKind::Other);
        assert_eq!(classify_file_kind("noext"), FileKind::Unknown);
    }

    #[test]
    fn hosted_urls_use_the_last_path_segment() {
        assert_eq!(
            classify_file_kind("https://res.cloudinary.com/demo/image/upload/v17/cat.JPEG?w=300#top"),
            FileKind::Image
        );
        assert_eq!(
            classify_file_kind("https://res.cloudinary.com/demo/raw/upload/v1.2/archive"),
            FileKind::Unknown
        );
        assert_eq!(classify_file_kind("https://example.com"), FileKind::Unknown);
        assert_eq!(classify_file_kind("https://example.com/"), FileKind::Unknown);
        assert_eq!(classify_file_kind("memory://media/abc/bundle.7z"), FileKind::Archive);
        assert_eq!(classify_file_kind("trailing."), FileKind::Unknown);
        assert_eq!(classify_file_kind(""), FileKind::Unknown);
    }

    #[test]
    fn presentation_per_kind() {
        assert_eq!(FileKind::Image.presentation(), Presentation::Image);
        assert_eq!(
            FileKind::Video.presentation(),
            Presentation::Video { source_type: "video/mp4" }
        );
        assert_eq!(
            FileKind::Archive.presentation(),
            Presentation::Link { label: "📦 Download ZIP File" }
        );
        assert_eq!(
            FileKind::Other.presentation(),
            Presentation::Link { label: "📁 Open File" }
        );
        assert_eq!(FileKind::Unknown.presentation(), Presentation::Hidden);
    }
}

use anyhow::{anyhow, bail, Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Image extensions accepted by both binaries.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "JPG", "jpeg", "JPEG", "png", "PNG", "bmp", "BMP"];

/// Video container extensions accepted as file streams.
pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mov", "mp4", "mkv", "wmv"];

/// Where frames come from, decided once from the `--source` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Image(PathBuf),
    Folder(PathBuf),
    Video(PathBuf),
    Usb(i32),
    PiCamera(i32),
}

impl SourceKind {
    /// Video files and cameras produce frames on their own; images wait for the user.
    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            SourceKind::Video(_) | SourceKind::Usb(_) | SourceKind::PiCamera(_)
        )
    }

    pub fn is_camera(&self) -> bool {
        matches!(self, SourceKind::Usb(_) | SourceKind::PiCamera(_))
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Image(p) => write!(f, "image {}", p.display()),
            SourceKind::Folder(p) => write!(f, "folder {}", p.display()),
            SourceKind::Video(p) => write!(f, "video {}", p.display()),
            SourceKind::Usb(idx) => write!(f, "usb camera {}", idx),
            SourceKind::PiCamera(idx) => write!(f, "camera module {}", idx),
        }
    }
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn is_video_path(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Classifies a user-supplied source string.
///
/// Filesystem entries win over device names, so a directory literally called
/// `usb0` is still treated as a folder.
pub fn classify_source(source: &str) -> Result<SourceKind> {
    let path = Path::new(source);

    if path.is_dir() {
        return Ok(SourceKind::Folder(path.to_path_buf()));
    }

    if path.is_file() {
        if is_image_path(path) {
            return Ok(SourceKind::Image(path.to_path_buf()));
        }
        if is_video_path(path) {
            return Ok(SourceKind::Video(path.to_path_buf()));
        }
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        bail!("File extension '.{}' is not supported: {}", ext, source);
    }

    if let Some(idx) = source.strip_prefix("usb") {
        return parse_device_index(idx, source).map(SourceKind::Usb);
    }

    if let Some(idx) = source.strip_prefix("picamera") {
        return parse_device_index(idx, source).map(SourceKind::PiCamera);
    }

    Err(anyhow!("Input source '{}' is invalid", source))
}

fn parse_device_index(raw: &str, source: &str) -> Result<i32> {
    raw.parse::<i32>()
        .ok()
        .filter(|idx| *idx >= 0)
        .ok_or_else(|| anyhow!("Input source '{}' has an invalid device index", source))
}

/// Lists the image files directly inside `folder`, sorted by path.
pub fn list_folder_images(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        bail!("Not a directory: {}", folder.display());
    }

    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| {
            let keep = is_image_path(p);
            if !keep {
                tracing::debug!("Skipping non-image file {}", p.display());
            }
            keep
        })
        .collect();
    images.sort();

    Ok(images)
}

/// Resolves a classified source into the ordered list of files it covers.
pub fn image_paths(kind: &SourceKind) -> Result<Vec<PathBuf>> {
    match kind {
        SourceKind::Image(path) => Ok(vec![path.clone()]),
        SourceKind::Folder(path) => list_folder_images(path)
            .with_context(|| format!("Failed to list images in {}", path.display())),
        other => bail!("{} is not a file source", other),
    }
}

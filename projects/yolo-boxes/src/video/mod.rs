pub mod image_reader;
pub mod opencv_reader;
pub mod recorder;

use crate::source::SourceKind;
use anyhow::Result;
use opencv::core::Mat;

/// What a single fetch from a source produced.
#[derive(Debug)]
pub enum FrameOutcome {
    Frame(Mat),
    /// The source ran out normally (last image shown, end of video file).
    EndOfStream,
    /// A camera stopped delivering frames.
    DeviceError(String),
}

pub trait FrameSource {
    /// Blocks until the next frame is available or the source is finished.
    fn next_frame(&mut self) -> Result<FrameOutcome>;
}

/// Requested output size, parsed from `WxH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: i32,
    pub height: i32,
}

impl std::str::FromStr for Resolution {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow::anyhow!("Resolution must look like 640x480, got '{}'", s))?;
        let width: i32 = w.trim().parse()?;
        let height: i32 = h.trim().parse()?;
        if width <= 0 || height <= 0 {
            anyhow::bail!("Resolution must be positive, got '{}'", s);
        }
        Ok(Self { width, height })
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Opens the reader matching a classified source.
pub fn open_source(
    kind: &SourceKind,
    resolution: Option<Resolution>,
) -> Result<Box<dyn FrameSource>> {
    use image_reader::ImageListSource;
    use opencv_reader::CaptureSource;

    if let Some(res) = resolution {
        if kind.is_camera() {
            tracing::info!("Requesting {} from {}", res, kind);
        } else {
            tracing::debug!("Frames from {} will be resized to {}", kind, res);
        }
    }

    let source: Box<dyn FrameSource> = match kind {
        SourceKind::Image(_) | SourceKind::Folder(_) => {
            Box::new(ImageListSource::new(crate::source::image_paths(kind)?))
        }
        SourceKind::Video(path) => Box::new(CaptureSource::open_file(path)?),
        SourceKind::Usb(index) => Box::new(CaptureSource::open_usb(*index, resolution)?),
        SourceKind::PiCamera(index) => {
            Box::new(CaptureSource::open_camera_module(*index, resolution)?)
        }
    };

    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolution() {
        let res: Resolution = "640x480".parse().unwrap();
        assert_eq!(
            res,
            Resolution {
                width: 640,
                height: 480
            }
        );
        assert_eq!(res.to_string(), "640x480");
        assert!("1280X720".parse::<Resolution>().is_ok());
        assert!("640".parse::<Resolution>().is_err());
        assert!("0x480".parse::<Resolution>().is_err());
        assert!("axb".parse::<Resolution>().is_err());
    }
}

use super::{FrameOutcome, FrameSource, Resolution};
use anyhow::{anyhow, Result};
use opencv::{
    prelude::*,
    videoio::{
        VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_COUNT, CAP_PROP_FRAME_HEIGHT,
        CAP_PROP_FRAME_WIDTH, CAP_V4L2,
    },
};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureKind {
    File,
    Camera,
}

/// Video file or camera read through `VideoCapture`.
///
/// The capture is released when this value is dropped.
pub struct CaptureSource {
    capture: VideoCapture,
    kind: CaptureKind,
    name: String,
    frames_read: usize,
}

impl CaptureSource {
    pub fn open_file(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let capture = VideoCapture::from_file(&name, CAP_ANY)?;
        if !capture.is_opened()? {
            return Err(anyhow!("Failed to open video file: {}", name));
        }

        let mut fps = capture.get(CAP_PROP_FPS)?;
        if fps <= 0.0 {
            tracing::warn!("CaptureSource: Failed to get FPS from metadata, falling back to 30.0");
            fps = 30.0;
        }
        let raw_count = capture.get(CAP_PROP_FRAME_COUNT)? as usize;

        tracing::info!(
            "CaptureSource: opened {}, duration={:.2}s, fps={:.2}, stream_frames={}",
            name,
            raw_count as f64 / fps,
            fps,
            raw_count
        );

        Ok(Self {
            capture,
            kind: CaptureKind::File,
            name,
            frames_read: 0,
        })
    }

    pub fn open_usb(index: i32, resolution: Option<Resolution>) -> Result<Self> {
        Self::open_device(index, CAP_ANY, format!("usb{}", index), resolution)
    }

    /// Camera modules are exposed by libcamera as V4L2 nodes.
    pub fn open_camera_module(index: i32, resolution: Option<Resolution>) -> Result<Self> {
        Self::open_device(index, CAP_V4L2, format!("picamera{}", index), resolution)
    }

    fn open_device(
        index: i32,
        api: i32,
        name: String,
        resolution: Option<Resolution>,
    ) -> Result<Self> {
        let mut capture = VideoCapture::new(index, api)?;
        if !capture.is_opened()? {
            return Err(anyhow!("Failed to open camera: {}", name));
        }

        if let Some(res) = resolution {
            let ok_w = capture.set(CAP_PROP_FRAME_WIDTH, res.width as f64)?;
            let ok_h = capture.set(CAP_PROP_FRAME_HEIGHT, res.height as f64)?;
            if !(ok_w && ok_h) {
                tracing::warn!("CaptureSource: {} refused resolution {}", name, res);
            }
        }

        tracing::info!(
            "CaptureSource: opened {} at {}x{}",
            name,
            capture.get(CAP_PROP_FRAME_WIDTH)?,
            capture.get(CAP_PROP_FRAME_HEIGHT)?
        );

        Ok(Self {
            capture,
            kind: CaptureKind::Camera,
            name,
            frames_read: 0,
        })
    }
}

impl FrameSource for CaptureSource {
    fn next_frame(&mut self) -> Result<FrameOutcome> {
        let mut frame = Mat::default();
        let success = self.capture.read(&mut frame)?;

        if success && !frame.empty() {
            self.frames_read += 1;
            return Ok(FrameOutcome::Frame(frame));
        }

        Ok(match self.kind {
            CaptureKind::File => FrameOutcome::EndOfStream,
            CaptureKind::Camera => FrameOutcome::DeviceError(format!(
                "{} stopped delivering frames after {} frames",
                self.name, self.frames_read
            )),
        })
    }
}

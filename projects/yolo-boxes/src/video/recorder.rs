use super::Resolution;
use anyhow::{anyhow, Result};
use opencv::{
    core::{Mat, Size},
    prelude::*,
    videoio::VideoWriter,
};
use std::path::Path;

pub const RECORD_FILE: &str = "demo1.avi";
pub const RECORD_FPS: f64 = 30.0;

/// MJPG writer for annotated frames. Finalised on drop.
pub struct VideoRecorder {
    writer: VideoWriter,
    frames_written: usize,
}

impl VideoRecorder {
    pub fn create(path: &Path, resolution: Resolution) -> Result<Self> {
        let name = path
            .to_str()
            .ok_or_else(|| anyhow!("Recording path is not valid UTF-8: {:?}", path))?;
        let fourcc = VideoWriter::fourcc('M', 'J', 'P', 'G')?;
        let writer = VideoWriter::new(
            name,
            fourcc,
            RECORD_FPS,
            Size::new(resolution.width, resolution.height),
            true,
        )?;
        if !writer.is_opened()? {
            return Err(anyhow!("Failed to open video writer for {}", name));
        }
        tracing::info!("Recording to {} at {} @ {} fps", name, resolution, RECORD_FPS);

        Ok(Self {
            writer,
            frames_written: 0,
        })
    }

    pub fn write(&mut self, frame: &Mat) -> Result<()> {
        self.writer.write(frame)?;
        self.frames_written += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> usize {
        self.frames_written
    }
}

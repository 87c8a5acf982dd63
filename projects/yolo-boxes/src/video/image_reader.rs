use super::{FrameOutcome, FrameSource};
use anyhow::Result;
use opencv::{imgcodecs, prelude::*};
use std::collections::VecDeque;
use std::path::PathBuf;

/// Decodes images from disk one at a time, in the given order.
pub struct ImageListSource {
    pending: VecDeque<PathBuf>,
}

impl ImageListSource {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            pending: paths.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl FrameSource for ImageListSource {
    fn next_frame(&mut self) -> Result<FrameOutcome> {
        while let Some(path) = self.pending.pop_front() {
            let Some(name) = path.to_str() else {
                tracing::warn!("Skipping non UTF-8 path {:?}", path);
                continue;
            };
            let frame = imgcodecs::imread(name, imgcodecs::IMREAD_COLOR)?;
            if frame.empty() {
                tracing::warn!("Skipping unreadable image {}", path.display());
                continue;
            }
            tracing::debug!("Loaded {} ({} left)", path.display(), self.remaining());
            return Ok(FrameOutcome::Frame(frame));
        }

        Ok(FrameOutcome::EndOfStream)
    }
}

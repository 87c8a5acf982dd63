use crate::pipeline::control::KeyWait;
use anyhow::Result;
use opencv::{core::Mat, highgui};

pub const WINDOW_TITLE: &str = "YOLO detection results";

/// Shows frames and reports key presses.
pub trait Viewer {
    fn show(&mut self, frame: &Mat) -> Result<()>;

    /// Returns the raw key code, or `None` if the wait ended without a key.
    fn wait_key(&mut self, wait: KeyWait) -> Result<Option<i32>>;
}

/// A HighGUI window. Destroyed on drop.
pub struct HighGuiViewer {
    window: String,
}

impl HighGuiViewer {
    pub fn open(title: &str) -> Result<Self> {
        highgui::named_window(title, highgui::WINDOW_AUTOSIZE)?;
        Ok(Self {
            window: title.to_string(),
        })
    }
}

impl Viewer for HighGuiViewer {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        highgui::imshow(&self.window, frame)?;
        Ok(())
    }

    fn wait_key(&mut self, wait: KeyWait) -> Result<Option<i32>> {
        let key = highgui::wait_key(wait.as_millis())?;
        Ok((key >= 0).then_some(key))
    }
}

impl Drop for HighGuiViewer {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_window(&self.window) {
            tracing::debug!("Failed to destroy window {}: {}", self.window, e);
        }
    }
}

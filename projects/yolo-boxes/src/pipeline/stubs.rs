//! Detector and viewer doubles for driving `DetectionSession` without a model or a window.

use crate::display::Viewer;
use crate::pipeline::control::KeyWait;
use crate::pipeline::detection::{Detection, Detector};
use anyhow::Result;
use opencv::core::Mat;
use opencv::prelude::*;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Reports one fixed box per frame.
pub(crate) struct StubDetector {
    pub(crate) confidence: f32,
}

impl Detector for StubDetector {
    fn infer(&mut self, _frame: &Mat) -> Result<Vec<Detection>> {
        Ok(vec![Detection {
            xmin: 10.0,
            ymin: 20.0,
            xmax: 60.0,
            ymax: 90.0,
            class_id: 0,
            label: "object".to_string(),
            confidence: self.confidence,
        }])
    }
}

#[derive(Default)]
pub(crate) struct ViewerLog {
    pub(crate) shown: Vec<(i32, i32)>,
    pub(crate) waits: Vec<KeyWait>,
}

/// Replays keys in order, then reports no key pressed.
pub(crate) struct ScriptedViewer {
    keys: VecDeque<Option<i32>>,
    log: Rc<RefCell<ViewerLog>>,
}

impl ScriptedViewer {
    pub(crate) fn new(keys: &[Option<char>], log: Rc<RefCell<ViewerLog>>) -> Self {
        Self {
            keys: keys.iter().map(|k| k.map(|c| c as i32)).collect(),
            log,
        }
    }
}

impl Viewer for ScriptedViewer {
    fn show(&mut self, frame: &Mat) -> Result<()> {
        self.log.borrow_mut().shown.push((frame.cols(), frame.rows()));
        Ok(())
    }

    fn wait_key(&mut self, wait: KeyWait) -> Result<Option<i32>> {
        self.log.borrow_mut().waits.push(wait);
        Ok(self.keys.pop_front().flatten())
    }
}

// Detection loop: owns the source, model, window and recorder for one run
// and drives them through the control state machine.

use crate::display::Viewer;
use crate::pipeline::annotate::annotate_frame;
use crate::pipeline::control::{KeyCommand, KeyWait, LoopEvent, LoopState};
use crate::pipeline::detection::Detector;
use crate::pipeline::fps::FpsWindow;
use crate::run_context::RunContext;
use crate::video::recorder::VideoRecorder;
use crate::video::{FrameOutcome, FrameSource, Resolution};
use anyhow::{Context, Result};
use opencv::core::{Mat, Size, Vector};
use opencv::{imgcodecs, imgproc};
use std::path::Path;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    DeviceError(String),
    Quit,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: usize,
    pub boxes: usize,
    pub snapshots: usize,
    pub avg_fps: f64,
    pub stop: StopReason,
}

/// The resources of one detection run.
///
/// Every field is released by `Drop`, so an early `?` return still closes
/// the capture, the writer and the window.
pub struct DetectionSession {
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn Detector>,
    pub viewer: Box<dyn Viewer>,
    pub recorder: Option<VideoRecorder>,
}

fn resize_frame(frame: Mat, target: Resolution) -> Result<Mat> {
    let mut resized = Mat::default();
    imgproc::resize(
        &frame,
        &mut resized,
        Size::new(target.width, target.height),
        0.0,
        0.0,
        imgproc::INTER_LINEAR,
    )?;
    Ok(resized)
}

pub fn save_snapshot(path: &Path, frame: &Mat) -> Result<()> {
    let name = path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Snapshot path is not valid UTF-8: {:?}", path))?;
    let written = imgcodecs::imwrite(name, frame, &Vector::new())?;
    if !written {
        anyhow::bail!("Failed to write snapshot {}", name);
    }
    tracing::info!("Saved snapshot to {}", name);
    Ok(())
}

impl DetectionSession {
    pub fn run(self, ctx: &RunContext) -> Result<RunSummary> {
        let DetectionSession {
            mut source,
            mut detector,
            mut viewer,
            mut recorder,
        } = self;

        let mut state = LoopState::Running;
        let mut fps = FpsWindow::default();
        let mut stop = StopReason::EndOfStream;
        let mut frames = 0;
        let mut boxes = 0;
        let mut snapshots = 0;

        while state.accepts_frames() {
            let t_start = Instant::now();

            let mut frame = match source.next_frame()? {
                FrameOutcome::Frame(frame) => frame,
                FrameOutcome::EndOfStream => {
                    tracing::info!("Reached the end of the source after {} frames", frames);
                    stop = StopReason::EndOfStream;
                    state = state.on(LoopEvent::EndOfStream);
                    continue;
                }
                FrameOutcome::DeviceError(msg) => {
                    tracing::warn!("Camera disconnected or not working: {}", msg);
                    stop = StopReason::DeviceError(msg);
                    state = state.on(LoopEvent::DeviceLost);
                    continue;
                }
            };

            if let Some(target) = ctx.resize {
                frame = resize_frame(frame, target)?;
            }

            let detections = detector.infer(&frame).context("Inference failed")?;
            let avg_fps = ctx.shows_fps().then(|| fps.mean());
            let drawn = annotate_frame(&mut frame, &detections, &ctx.filter, avg_fps)?;
            tracing::debug!(
                "Frame {}: {} detections, {} drawn",
                frames,
                detections.len(),
                drawn
            );

            viewer.show(&frame)?;
            if let Some(rec) = recorder.as_mut() {
                rec.write(&frame)?;
            }
            frames += 1;
            boxes += drawn;

            if let Some(cmd) = viewer.wait_key(ctx.key_wait)?.and_then(KeyCommand::from_key) {
                state = state.on(LoopEvent::Key(cmd));
                match cmd {
                    KeyCommand::Quit => stop = StopReason::Quit,
                    KeyCommand::Snapshot => {
                        save_snapshot(&ctx.snapshot_path, &frame)?;
                        snapshots += 1;
                    }
                    KeyCommand::Pause => tracing::info!("Paused, press any key to continue"),
                }
            }

            while state == LoopState::Paused {
                let key = viewer.wait_key(KeyWait::Forever)?;
                let event = match key.and_then(KeyCommand::from_key) {
                    Some(KeyCommand::Quit) => {
                        stop = StopReason::Quit;
                        LoopEvent::Key(KeyCommand::Quit)
                    }
                    _ => LoopEvent::Resumed,
                };
                state = state.on(event);
            }

            fps.record(t_start.elapsed());
        }

        if let Some(rec) = recorder.take() {
            tracing::info!("Recorded {} frames", rec.frames_written());
        }
        drop(source);
        drop(viewer);
        state = state.on(LoopEvent::Released);
        debug_assert_eq!(state, LoopState::Stopped);

        let summary = RunSummary {
            frames,
            boxes,
            snapshots,
            avg_fps: fps.mean(),
            stop,
        };
        tracing::info!("Average pipeline FPS: {:.2}", summary.avg_fps);

        Ok(summary)
    }
}

//! Drawing detections and status text onto frames.

use crate::pipeline::detection::Detection;
use anyhow::Result;
use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc;

/// Cutoff used when no `--thresh` is given.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Tableau 10, in BGR order.
pub const PALETTE: [(u8, u8, u8); 10] = [
    (164, 120, 87),
    (68, 148, 228),
    (93, 97, 209),
    (178, 182, 133),
    (88, 159, 106),
    (96, 202, 231),
    (159, 124, 168),
    (169, 162, 241),
    (98, 118, 150),
    (172, 176, 184),
];

const LABEL_FONT_SCALE: f64 = 0.5;
const STATUS_FONT_SCALE: f64 = 0.7;

pub fn class_color(class_id: usize) -> Scalar {
    let (b, g, r) = PALETTE[class_id % PALETTE.len()];
    Scalar::new(b as f64, g as f64, r as f64, 0.0)
}

fn status_color() -> Scalar {
    Scalar::new(0.0, 255.0, 255.0, 0.0)
}

/// Decides which detections are drawn and counted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceFilter {
    threshold: f32,
}

impl Default for ConfidenceFilter {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl ConfidenceFilter {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Strictly greater than: a detection sitting exactly on the threshold is dropped.
    pub fn accepts(&self, confidence: f32) -> bool {
        confidence > self.threshold
    }
}

pub fn label_text(detection: &Detection) -> String {
    format!(
        "{}: {}%",
        detection.label,
        (detection.confidence * 100.0) as i32
    )
}

/// Draws one box with its filled label tab.
pub fn draw_detection(frame: &mut Mat, detection: &Detection) -> Result<()> {
    let color = class_color(detection.class_id);
    let xmin = detection.xmin as i32;
    let ymin = detection.ymin as i32;
    let xmax = detection.xmax as i32;
    let ymax = detection.ymax as i32;

    imgproc::rectangle_points(
        frame,
        Point::new(xmin, ymin),
        Point::new(xmax, ymax),
        color,
        2,
        imgproc::LINE_8,
        0,
    )?;

    let label = label_text(detection);
    let mut base_line = 0;
    let label_size = imgproc::get_text_size(
        &label,
        imgproc::FONT_HERSHEY_SIMPLEX,
        LABEL_FONT_SCALE,
        1,
        &mut base_line,
    )?;
    // Keep the label tab inside the frame near the top edge.
    let label_ymin = ymin.max(label_size.height + 10);

    imgproc::rectangle_points(
        frame,
        Point::new(xmin, label_ymin - label_size.height - 10),
        Point::new(xmin + label_size.width, label_ymin + base_line - 10),
        color,
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )?;
    imgproc::put_text(
        frame,
        &label,
        Point::new(xmin, label_ymin - 7),
        imgproc::FONT_HERSHEY_SIMPLEX,
        LABEL_FONT_SCALE,
        Scalar::all(0.0),
        1,
        imgproc::LINE_8,
        false,
    )?;

    Ok(())
}

fn draw_status(frame: &mut Mat, text: &str, y: i32) -> Result<()> {
    imgproc::put_text(
        frame,
        text,
        Point::new(10, y),
        imgproc::FONT_HERSHEY_SIMPLEX,
        STATUS_FONT_SCALE,
        status_color(),
        2,
        imgproc::LINE_8,
        false,
    )?;
    Ok(())
}

/// Draws every detection the filter accepts plus the status overlay.
///
/// `avg_fps` is only drawn when given. Returns the number of boxes drawn.
pub fn annotate_frame(
    frame: &mut Mat,
    detections: &[Detection],
    filter: &ConfidenceFilter,
    avg_fps: Option<f64>,
) -> Result<usize> {
    let mut object_count = 0;
    for detection in detections.iter().filter(|d| filter.accepts(d.confidence)) {
        draw_detection(frame, detection)?;
        object_count += 1;
    }

    if let Some(fps) = avg_fps {
        draw_status(frame, &format!("FPS: {:.2}", fps), 20)?;
    }
    draw_status(frame, &format!("Objects: {}", object_count), 40)?;

    Ok(object_count)
}

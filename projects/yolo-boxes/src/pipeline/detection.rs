use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, ImageBuffer, Rgb};
use opencv::core::Mat;
use opencv::prelude::*;
use std::fs;
use std::path::Path;
use usls::models::YOLO;
use usls::{Config, Hbb, Image, Task};

/// A single detected object in frame pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub class_id: usize,
    pub label: String,
    pub confidence: f32,
}

/// Anything that turns a frame into detections.
pub trait Detector {
    fn infer(&mut self, frame: &Mat) -> Result<Vec<Detection>>;
}

/// Ultralytics export format, used when `--yolo-version` is not given.
pub const DEFAULT_YOLO_VERSION: u8 = 8;

/// A wrapper around the USLS YOLO model that handles BGR-to-RGB conversion.
pub struct YoloDetector {
    model: YOLO,
    labels: Option<Vec<String>>,
}

impl YoloDetector {
    /// Create a new detector from an exported model file.
    ///
    /// `version` selects the YOLO output layout. `labels` overrides the class
    /// names embedded in the model.
    pub fn new(model_path: &Path, version: u8, labels: Option<Vec<String>>) -> Result<Self> {
        if !model_path.exists() {
            return Err(anyhow!(
                "Model path is invalid or the model was not found: {}",
                model_path.display()
            ));
        }
        let model_file = model_path
            .to_str()
            .ok_or_else(|| anyhow!("Model path is not valid UTF-8: {:?}", model_path))?;

        let mut config = Config::yolo()
            .with_task(Task::ObjectDetection)
            .with_version(version.into())
            .with_model_file(model_file);
        if let Some(names) = labels.as_ref() {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            config = config.with_class_names(&names);
        }

        #[cfg(target_os = "macos")]
        let config = config.with_model_device(usls::Device::CoreMl);

        let config = config.commit()?;
        let model = YOLO::new(config)
            .with_context(|| format!("Failed to load model {}", model_path.display()))?;

        Ok(Self { model, labels })
    }
}

impl Detector for YoloDetector {
    fn infer(&mut self, frame: &Mat) -> Result<Vec<Detection>> {
        let image = Image::from(mat_to_dynamic_image(frame)?);
        let results = self.model.forward(std::slice::from_ref(&image))?;

        let Some(y) = results.into_iter().next() else {
            return Ok(Vec::new());
        };

        let labels = self.labels.as_deref();
        let detections = y
            .hbbs
            .iter()
            .map(|hbb| detection_from_hbb(hbb, labels))
            .collect();

        Ok(detections)
    }
}

/// Converts a model box into frame coordinates, preferring names from `labels`.
pub fn detection_from_hbb(hbb: &Hbb, labels: Option<&[String]>) -> Detection {
    let class_id = hbb.id().unwrap_or(0);
    let label = labels
        .and_then(|l| l.get(class_id).cloned())
        .or_else(|| hbb.name().map(str::to_string))
        .unwrap_or_else(|| class_id.to_string());

    Detection {
        xmin: hbb.xmin(),
        ymin: hbb.ymin(),
        xmax: hbb.xmin() + hbb.width(),
        ymax: hbb.ymin() + hbb.height(),
        class_id,
        label,
        confidence: hbb.confidence().unwrap_or(0.0),
    }
}

/// Reads a class-name file: one name per line, blank lines ignored.
pub fn load_labels(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read labels file {}", path.display()))?;
    let labels: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();

    if labels.is_empty() {
        anyhow::bail!("Labels file {} is empty", path.display());
    }

    Ok(labels)
}

/// Convert an OpenCV Mat (BGR) to an image::DynamicImage (RGB)
pub fn mat_to_dynamic_image(mat: &Mat) -> Result<DynamicImage> {
    let mut rgb_mat = Mat::default();
    opencv::imgproc::cvt_color_def(mat, &mut rgb_mat, opencv::imgproc::COLOR_BGR2RGB)?;

    let size = rgb_mat.size()?;
    let width = size.width as u32;
    let height = size.height as u32;

    if !rgb_mat.is_continuous() {
        return Err(anyhow!("Mat is not continuous"));
    }

    let buffer = rgb_mat.data_bytes()?.to_vec();

    let img_buffer = ImageBuffer::<Rgb<u8>, _>::from_vec(width, height, buffer)
        .ok_or_else(|| anyhow!("Failed to create ImageBuffer from Mat data"))?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}

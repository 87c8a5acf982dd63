use crate::pipeline::detection::DEFAULT_YOLO_VERSION;
use crate::video::Resolution;
use clap::Parser;
use std::path::PathBuf;

fn parse_threshold(s: &str) -> Result<f32, String> {
    let value: f32 = s.parse().map_err(|e| format!("{}", e))?;
    if !(0.0..=1.0).contains(&value) {
        return Err(format!("threshold must be between 0 and 1, got {}", value));
    }
    Ok(value)
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a YOLO model over images, video or cameras", long_about = None)]
pub struct Args {
    /// Path to the exported YOLO model (e.g. "runs/detect/train/weights/best.onnx")
    #[arg(long, env = "YOLO_BOXES_MODEL")]
    pub model: PathBuf,

    /// Image file, image folder, video file, "usb<N>" or "picamera<N>"
    #[arg(long, env = "YOLO_BOXES_SOURCE")]
    pub source: String,

    /// Minimum confidence for a detection to be drawn
    #[arg(long, default_value_t = 0.5, value_parser = parse_threshold)]
    pub thresh: f32,

    /// Display resolution as WxH (e.g. "640x480"); otherwise the source resolution
    #[arg(long)]
    pub resolution: Option<Resolution>,

    /// Record the annotated stream to demo1.avi (needs a video or camera source and --resolution)
    #[arg(long)]
    pub record: bool,

    /// Optional file with one class name per line, overriding the model's names
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// YOLO release the model was exported from (5, 6, 7, 8, 9, 10, 11, ...)
    #[arg(long, env = "YOLO_BOXES_VERSION", default_value_t = DEFAULT_YOLO_VERSION)]
    pub yolo_version: u8,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Cut random 600x600 backgrounds out of a folder of images", long_about = None)]
pub struct CropArgs {
    /// Folder with the source images
    #[arg(long, env = "CROP_BACKGROUNDS_INPUT", default_value = "original")]
    pub input: PathBuf,

    /// Folder the backgrounds are written to
    #[arg(long, env = "CROP_BACKGROUNDS_OUTPUT", default_value = "entrada/backgrounds")]
    pub output: PathBuf,

    /// Seed for a reproducible set of crops
    #[arg(long)]
    pub seed: Option<u64>,
}

impl CropArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_args() {
        let args = Args::try_parse_from([
            "yolo-boxes",
            "--model",
            "best.onnx",
            "--source",
            "usb0",
            "--resolution",
            "640x480",
            "--record",
        ])
        .unwrap();
        assert_eq!(args.thresh, 0.5);
        assert_eq!(args.resolution.unwrap().width, 640);
        assert!(args.record);
        assert!(args.labels.is_none());
        assert_eq!(args.yolo_version, 8);
    }

    #[test]
    fn test_yolo_version_override() {
        let args = Args::try_parse_from([
            "yolo-boxes",
            "--model",
            "best.onnx",
            "--source",
            "a.jpg",
            "--yolo-version",
            "11",
        ])
        .unwrap();
        assert_eq!(args.yolo_version, 11);
    }

    #[test]
    fn test_threshold_range() {
        let base = ["yolo-boxes", "--model", "m.onnx", "--source", "a.jpg"];
        let ok = Args::try_parse_from(base.iter().copied().chain(["--thresh", "0.35"])).unwrap();
        assert!((ok.thresh - 0.35).abs() < f32::EPSILON);
        assert!(Args::try_parse_from(base.iter().copied().chain(["--thresh", "1.5"])).is_err());
        assert!(Args::try_parse_from(base.iter().copied().chain(["--resolution", "big"])).is_err());
    }

    #[test]
    fn test_crop_args_defaults() {
        let args = CropArgs::try_parse_from(["crop-backgrounds"]).unwrap();
        assert_eq!(args.input, PathBuf::from("original"));
        assert_eq!(args.output, PathBuf::from("entrada/backgrounds"));
        assert!(args.seed.is_none());
    }
}

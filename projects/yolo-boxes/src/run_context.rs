use crate::cli::Args;
use crate::pipeline::annotate::{ConfidenceFilter, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::pipeline::control::KeyWait;
use crate::source::{classify_source, SourceKind};
use crate::video::recorder::RECORD_FILE;
use crate::video::Resolution;
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const SNAPSHOT_FILE: &str = "capture.png";

#[derive(Debug, Clone, PartialEq)]
pub struct RecordSettings {
    pub path: PathBuf,
    pub resolution: Resolution,
}

/// Everything the detection loop needs to know about one invocation.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub model_path: PathBuf,
    pub yolo_version: u8,
    pub labels_path: Option<PathBuf>,
    pub source: SourceKind,
    pub resize: Option<Resolution>,
    pub filter: ConfidenceFilter,
    pub record: Option<RecordSettings>,
    pub snapshot_path: PathBuf,
    pub key_wait: KeyWait,
}

impl RunContext {
    pub fn from_args(args: &Args) -> Result<Self> {
        if !args.model.exists() {
            bail!(
                "Model path is invalid or the model was not found: {}",
                args.model.display()
            );
        }

        let source = classify_source(&args.source)?;
        Self::with_source(args, source)
    }

    pub(crate) fn with_source(args: &Args, source: SourceKind) -> Result<Self> {
        let record = if args.record {
            if !source.is_streaming() {
                bail!("Recording only works with video and camera sources");
            }
            let Some(resolution) = args.resolution else {
                bail!("Please specify --resolution to record video");
            };
            Some(RecordSettings {
                path: PathBuf::from(RECORD_FILE),
                resolution,
            })
        } else {
            None
        };

        let filter = ConfidenceFilter::new(args.thresh);
        if filter != ConfidenceFilter::default() {
            tracing::warn!(
                "Confidence threshold set to {} instead of the default {}; detections are filtered at the requested value",
                args.thresh,
                DEFAULT_CONFIDENCE_THRESHOLD
            );
        }

        Ok(Self {
            model_path: args.model.clone(),
            yolo_version: args.yolo_version,
            labels_path: args.labels.clone(),
            key_wait: KeyWait::for_source(source.is_streaming()),
            source,
            resize: args.resolution,
            filter,
            record,
            snapshot_path: PathBuf::from(SNAPSHOT_FILE),
        })
    }

    /// Only streaming sources get a rolling FPS overlay.
    pub fn shows_fps(&self) -> bool {
        self.source.is_streaming()
    }
}

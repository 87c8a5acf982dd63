use anyhow::Result;
use yolo_boxes::cli::Args;
use yolo_boxes::display::{HighGuiViewer, WINDOW_TITLE};
use yolo_boxes::pipeline::detection::{load_labels, YoloDetector};
use yolo_boxes::pipeline::orchestrator::{DetectionSession, StopReason};
use yolo_boxes::run_context::RunContext;
use yolo_boxes::video::open_source;
use yolo_boxes::video::recorder::VideoRecorder;

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let args = Args::parse_args();
    let ctx = RunContext::from_args(&args)?;

    tracing::info!(
        "Source: {}, confidence threshold: {}",
        ctx.source,
        ctx.filter.threshold()
    );

    let labels = ctx.labels_path.as_deref().map(load_labels).transpose()?;
    let detector = YoloDetector::new(&ctx.model_path, ctx.yolo_version, labels)?;
    let source = open_source(&ctx.source, ctx.resize)?;
    let recorder = ctx
        .record
        .as_ref()
        .map(|r| VideoRecorder::create(&r.path, r.resolution))
        .transpose()?;
    let viewer = HighGuiViewer::open(WINDOW_TITLE)?;

    let session = DetectionSession {
        source,
        detector: Box::new(detector),
        viewer: Box::new(viewer),
        recorder,
    };
    let summary = session.run(&ctx)?;

    match &summary.stop {
        StopReason::EndOfStream => tracing::info!("All frames processed"),
        StopReason::Quit => tracing::info!("Stopped by user"),
        StopReason::DeviceError(msg) => tracing::warn!("Stopped on device error: {}", msg),
    }
    tracing::info!(
        "Processed {} frames, drew {} boxes, saved {} snapshots",
        summary.frames,
        summary.boxes,
        summary.snapshots
    );

    Ok(())
}

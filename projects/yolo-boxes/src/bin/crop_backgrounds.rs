use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use yolo_boxes::cli::CropArgs;
use yolo_boxes::crop::run_batch;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = CropArgs::parse_args();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    tracing::info!(
        "Cropping backgrounds from {} into {}",
        args.input.display(),
        args.output.display()
    );
    let report = run_batch(&args.input, &args.output, &mut rng)?;
    tracing::info!(
        "Wrote {} backgrounds from {} images ({} failed)",
        report.crops_written,
        report.processed,
        report.failed
    );

    Ok(())
}

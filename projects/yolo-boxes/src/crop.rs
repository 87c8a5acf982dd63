//! Random background crops.
//!
//! Each source image yields a fixed number of square windows sampled
//! uniformly inside the image bounds. The windows are independent draws, so
//! they may overlap.

use crate::source::list_folder_images;
use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const CROP_SIZE: u32 = 600;
pub const CROPS_PER_IMAGE: usize = 3;

/// Raised when the source image cannot hold a single crop window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTooSmall {
    pub width: u32,
    pub height: u32,
    pub size: u32,
}

impl fmt::Display for ImageTooSmall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "image is {}x{}, smaller than the {}x{} crop window",
            self.width, self.height, self.size, self.size
        )
    }
}

impl std::error::Error for ImageTooSmall {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: u32,
    pub y: u32,
    pub size: u32,
}

/// One image's worth of cropping.
#[derive(Debug, Clone)]
pub struct CropJob {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub size: u32,
    pub count: usize,
}

impl CropJob {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            size: CROP_SIZE,
            count: CROPS_PER_IMAGE,
        }
    }
}

/// Picks a top-left corner so the `size`-square window stays inside the image.
pub fn pick_window<R: Rng + ?Sized>(
    width: u32,
    height: u32,
    size: u32,
    rng: &mut R,
) -> Result<CropWindow, ImageTooSmall> {
    if width < size || height < size {
        return Err(ImageTooSmall {
            width,
            height,
            size,
        });
    }

    let x = rng.gen_range(0..=width - size);
    let y = rng.gen_range(0..=height - size);

    Ok(CropWindow { x, y, size })
}

pub fn background_name(index: usize) -> String {
    format!("background_{}.png", index)
}

/// Crops `job.count` windows out of `job.input`.
///
/// Files are numbered from `first_index`; existing files with the same name
/// are overwritten. Returns the written paths in order. If any crop fails, the
/// crops already written for this job are removed so the indices stay free.
pub fn crop_backgrounds<R: Rng + ?Sized>(
    job: &CropJob,
    first_index: usize,
    rng: &mut R,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(&job.output_dir)
        .with_context(|| format!("Failed to create {}", job.output_dir.display()))?;

    let img = image::open(&job.input)
        .with_context(|| format!("Failed to open image {}", job.input.display()))?;

    let mut written = Vec::with_capacity(job.count);
    for i in 0..job.count {
        match save_crop(&img, job, first_index + i, rng) {
            Ok(out_path) => written.push(out_path),
            Err(e) => {
                remove_partial(&written);
                return Err(e);
            }
        }
    }

    Ok(written)
}

fn save_crop<R: Rng + ?Sized>(
    img: &DynamicImage,
    job: &CropJob,
    index: usize,
    rng: &mut R,
) -> Result<PathBuf> {
    let (width, height) = img.dimensions();
    let window = pick_window(width, height, job.size, rng)
        .with_context(|| format!("Cannot crop {}", job.input.display()))?;
    let crop = img.crop_imm(window.x, window.y, window.size, window.size);

    let out_path = job.output_dir.join(background_name(index));
    crop.save(&out_path)
        .with_context(|| format!("Failed to save crop {}", out_path.display()))?;
    tracing::debug!(
        "Cropped {} at ({}, {}) -> {}",
        job.input.display(),
        window.x,
        window.y,
        out_path.display()
    );
    Ok(out_path)
}

fn remove_partial(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to remove partial crop {}: {}", path.display(), e);
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub failed: usize,
    pub crops_written: usize,
}

/// Crops every image in `input_dir` into `output_dir`.
///
/// A failing image is logged and skipped; the batch keeps going.
pub fn run_batch<R: Rng + ?Sized>(
    input_dir: &Path,
    output_dir: &Path,
    rng: &mut R,
) -> Result<BatchReport> {
    let images = list_folder_images(input_dir)
        .with_context(|| format!("Failed to list input folder {}", input_dir.display()))?;

    if images.is_empty() {
        tracing::warn!("No images found in {}", input_dir.display());
    }

    let pb = ProgressBar::new(images.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );

    let mut report = BatchReport::default();
    for path in images {
        let job = CropJob::new(&path, output_dir);
        match crop_backgrounds(&job, report.crops_written, rng) {
            Ok(written) => {
                report.processed += 1;
                report.crops_written += written.len();
            }
            Err(e) => {
                report.failed += 1;
                pb.suspend(|| tracing::warn!("Skipping {}: {:#}", path.display(), e));
            }
        }
        pb.inc(1);
    }

    pb.finish_with_message("Done");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn write_image(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 7]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_pick_window_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for (w, h) in [(600, 600), (601, 900), (1920, 1080), (4000, 610)] {
            for _ in 0..500 {
                let win = pick_window(w, h, CROP_SIZE, &mut rng).unwrap();
                assert!(win.x <= w - CROP_SIZE);
                assert!(win.y <= h - CROP_SIZE);
                assert_eq!(win.size, CROP_SIZE);
            }
        }
    }

    #[test]
    fn test_exact_fit_has_single_window() {
        let mut rng = StdRng::seed_from_u64(1);
        let win = pick_window(600, 600, 600, &mut rng).unwrap();
        assert_eq!((win.x, win.y), (0, 0));
    }

    #[test]
    fn test_pick_window_rejects_small_images() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = pick_window(599, 800, CROP_SIZE, &mut rng).unwrap_err();
        assert_eq!(
            err,
            ImageTooSmall {
                width: 599,
                height: 800,
                size: 600
            }
        );
        assert!(pick_window(800, 10, CROP_SIZE, &mut rng).is_err());
    }

    #[test]
    fn test_crop_backgrounds_writes_full_size_crops() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.png");
        write_image(&input, 800, 700);
        let out_dir = dir.path().join("out").join("backgrounds");

        let mut rng = StdRng::seed_from_u64(3);
        let job = CropJob::new(&input, &out_dir);
        let written = crop_backgrounds(&job, 0, &mut rng).unwrap();

        assert_eq!(written.len(), CROPS_PER_IMAGE);
        for (i, path) in written.iter().enumerate() {
            assert_eq!(path.file_name().unwrap().to_str().unwrap(), background_name(i));
            let crop = image::open(path).unwrap();
            assert_eq!(crop.dimensions(), (CROP_SIZE, CROP_SIZE));
        }
    }

    #[test]
    fn test_crop_backgrounds_small_image_is_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tiny.png");
        write_image(&input, 320, 240);

        let mut rng = StdRng::seed_from_u64(3);
        let job = CropJob::new(&input, dir.path().join("out"));
        let err = crop_backgrounds(&job, 0, &mut rng).unwrap_err();
        let too_small = err.downcast_ref::<ImageTooSmall>().unwrap();
        assert_eq!((too_small.width, too_small.height), (320, 240));
    }

    #[test]
    fn test_run_batch_continues_past_failures() {
        let dir = tempfile::tempdir().unwrap();
        let input_dir = dir.path().join("original");
        fs::create_dir(&input_dir).unwrap();
        write_image(&input_dir.join("a.png"), 700, 700);
        write_image(&input_dir.join("b.png"), 100, 100);
        write_image(&input_dir.join("c.png"), 900, 650);
        fs::write(input_dir.join("readme.txt"), b"not an image").unwrap();
        let out_dir = dir.path().join("backgrounds");

        let mut rng = StdRng::seed_from_u64(11);
        let report = run_batch(&input_dir, &out_dir, &mut rng).unwrap();

        assert_eq!(
            report,
            BatchReport {
                processed: 2,
                failed: 1,
                crops_written: 6
            }
        );
        for i in 0..6 {
            assert!(out_dir.join(background_name(i)).exists());
        }
        assert!(!out_dir.join(background_name(6)).exists());
    }

    #[test]
    fn test_failed_save_removes_earlier_crops() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("source.png");
        write_image(&input, 800, 700);
        let out_dir = dir.path().join("backgrounds");
        // A directory in place of the second crop makes its save fail.
        fs::create_dir_all(out_dir.join(background_name(1))).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let job = CropJob::new(&input, &out_dir);
        let err = crop_backgrounds(&job, 0, &mut rng).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to save crop"));

        assert!(!out_dir.join(background_name(0)).exists());
        assert!(!out_dir.join(background_name(2)).exists());

        // The freed index is reused by the next successful image.
        fs::remove_dir(out_dir.join(background_name(1))).unwrap();
        let written = crop_backgrounds(&job, 0, &mut rng).unwrap();
        assert_eq!(written.len(), CROPS_PER_IMAGE);
        assert!(out_dir.join(background_name(0)).exists());
    }
}

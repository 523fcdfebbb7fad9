use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use facesort_core::detection::domain::face_detector::{DetectorFactory, FaceDetector};
use facesort_core::detection::infrastructure::json_face_detector::JsonFaceDetector;
use facesort_core::imaging::infrastructure::image_file_reader::ImageFileReader;
use facesort_core::imaging::infrastructure::image_file_writer::ImageFileWriter;
use facesort_core::pipeline::group_photos_use_case::{GroupPhotosUseCase, GroupingReport};
use facesort_core::pipeline::infrastructure::executor_factory::create_executor;
use facesort_core::shared::constants::IMAGE_EXTENSIONS;
use facesort_core::shared::grouping_config::{ClusteringStrategy, GroupingConfig};

/// Group photos into one folder per person.
#[derive(Parser)]
#[command(name = "facesort")]
struct Cli {
    /// Directory to scan for images (recursively).
    input_dir: PathBuf,

    /// Directory to write person_<n>/ and no_faces_found/ into.
    output_dir: PathBuf,

    /// Precomputed detections as a JSON manifest keyed by file name.
    /// Without it, `<image>.faces.json` sidecar files are read.
    #[arg(long)]
    detections: Option<PathBuf>,

    /// JSON configuration file; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum cosine distance between neighbours (density clustering).
    #[arg(long)]
    eps: Option<f64>,

    /// Neighbours (including the point itself) needed to seed a cluster.
    #[arg(long)]
    min_samples: Option<usize>,

    /// Centroid similarity at which clusters are merged.
    #[arg(long)]
    merge_threshold: Option<f64>,

    /// Similarity threshold for threshold clustering.
    #[arg(long)]
    similarity_threshold: Option<f64>,

    /// Clustering strategy: dbscan, threshold or adaptive.
    #[arg(long)]
    strategy: Option<ClusteringStrategy>,

    /// Thumbnail size as WIDTHxHEIGHT, e.g. 150x150.
    #[arg(long, value_parser = parse_size)]
    thumbnail_size: Option<(u32, u32)>,

    /// Number of detection worker threads.
    #[arg(long)]
    workers: Option<usize>,

    /// Give up on an image after this many seconds of detection.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = build_config(&cli)?;
    config.validate()?;

    let images = list_images(&cli.input_dir, &cli.output_dir)?;
    log::info!(
        "Found {} images in {}",
        images.len(),
        cli.input_dir.display()
    );

    let detector_factory = build_detector_factory(cli.detections.as_deref())?;
    let executor = create_executor(
        config.workers,
        config.detection_timeout_secs.map(Duration::from_secs),
    );
    let progress: Box<dyn Fn(f64) + Send> = Box::new(|fraction: f64| {
        let pct = (fraction * 100.0).round() as u32;
        eprint!("\rDetecting faces... {pct}%");
    });

    let use_case = GroupPhotosUseCase::new(
        config,
        detector_factory,
        Arc::new(ImageFileReader::new()),
        Box::new(ImageFileWriter::new()),
        executor,
        Some(progress),
    );
    let report = use_case.execute(&images, &cli.output_dir)?;
    if !images.is_empty() {
        eprintln!();
    }
    print_summary(&report, &cli.output_dir);
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input_dir.is_dir() {
        return Err(format!("Input directory not found: {}", cli.input_dir.display()).into());
    }
    if let Some(path) = &cli.detections {
        if !path.is_file() {
            return Err(format!("Detections file not found: {}", path.display()).into());
        }
    }
    Ok(())
}

/// Configuration file (or defaults) with command-line overrides applied.
fn build_config(cli: &Cli) -> Result<GroupingConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => GroupingConfig::from_json_file(path)?,
        None => GroupingConfig::default(),
    };
    let clustering = &mut config.clustering;
    if let Some(eps) = cli.eps {
        clustering.eps = eps;
    }
    if let Some(min_samples) = cli.min_samples {
        clustering.min_samples = min_samples;
    }
    if let Some(threshold) = cli.merge_threshold {
        clustering.merge_threshold = threshold;
    }
    if let Some(threshold) = cli.similarity_threshold {
        clustering.similarity_threshold = threshold;
    }
    if let Some(strategy) = cli.strategy {
        clustering.strategy = strategy;
    }
    if let Some(size) = cli.thumbnail_size {
        config.thumbnail_size = size;
    }
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(secs) = cli.timeout_secs {
        config.detection_timeout_secs = Some(secs);
    }
    Ok(config)
}

fn build_detector_factory(
    detections: Option<&Path>,
) -> Result<DetectorFactory, Box<dyn std::error::Error>> {
    let detector = match detections {
        Some(path) => {
            log::info!("Loading detections from {}", path.display());
            JsonFaceDetector::from_manifest(path)?
        }
        None => {
            log::info!("Reading per-image detection sidecars");
            JsonFaceDetector::sidecar()
        }
    };
    Ok(Box::new(
        move || -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error + Send + Sync>> {
            Ok(Box::new(detector.clone()))
        },
    ))
}

/// Image files under `dir`, recursively, sorted by path. `skip` (the output
/// directory) is not descended into.
fn list_images(dir: &Path, skip: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let skip = fs::canonicalize(skip).ok();
    let mut images = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let path = entry?.path();
            if path.is_dir() {
                if skip.is_some() && fs::canonicalize(&path).ok() == skip {
                    continue;
                }
                pending.push(path);
            } else if is_image(&path) {
                images.push(path);
            }
        }
    }
    images.sort();
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{value}'"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{w}'"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{h}'"))?;
    if w == 0 || h == 0 {
        return Err(format!("thumbnail size must be non-zero, got {w}x{h}"));
    }
    Ok((w, h))
}

fn print_summary(report: &GroupingReport, output_dir: &Path) {
    for group in &report.groups {
        log::info!(
            "{}: {} face(s)",
            group.directory.display(),
            group.members.len()
        );
    }
    log::info!(
        "Grouped {} faces into {} groups, {} images without faces, output in {}",
        report.face_count(),
        report.groups.len(),
        report.no_face_images.len(),
        output_dir.display()
    );
}

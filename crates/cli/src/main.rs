use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use posecache_core::detection::domain::body_detector::BodyDetector;
use posecache_core::detection::domain::face_detector::FaceDetector;
use posecache_core::detection::infrastructure::face_boxes_detector::FaceBoxesDetector;
use posecache_core::detection::infrastructure::model_resolver;
use posecache_core::detection::infrastructure::movenet_detector::MoveNetDetector;
use posecache_core::pipeline::benchmark_use_case::BenchmarkUseCase;
use posecache_core::pipeline::detect_frames_use_case::DetectFramesUseCase;
use posecache_core::pipeline::infrastructure::json_lines_writer::JsonLinesWriter;
use posecache_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use posecache_core::pipeline::result_writer::ResultWriter;
use posecache_core::shared::config::DetectionConfig;
use posecache_core::video::domain::frame_reader::FrameReader;
use posecache_core::video::infrastructure::image_sequence_reader::ImageSequenceReader;

/// Body pose and face detection over images and image sequences.
#[derive(Parser, Debug)]
#[command(name = "posecache")]
struct Cli {
    /// Input image, or directory of frames processed in file-name order.
    input: PathBuf,

    /// Write JSON lines here instead of stdout.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// JSON detection config; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Consecutive frames allowed to reuse cached body results.
    #[arg(long)]
    skip_frames: Option<usize>,

    /// Disable result reuse and crop tracking between frames.
    #[arg(long)]
    no_skip_frame: bool,

    /// Maximum number of bodies per frame.
    #[arg(long)]
    max_detected: Option<usize>,

    /// Body keypoint and instance confidence threshold (0.0-1.0).
    #[arg(long)]
    min_confidence: Option<f64>,

    /// Also run face detection.
    #[arg(long)]
    faces: bool,

    /// Body model file name or absolute path.
    #[arg(long)]
    body_model: Option<String>,

    /// Face model file name or absolute path.
    #[arg(long)]
    face_model: Option<String>,

    /// Directory searched for models after the user cache.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Time N detections of the first frame instead of writing results.
    #[arg(long, value_name = "N")]
    benchmark: Option<usize>,
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

    let body_detector = build_body_detector(&config);
    let face_detector = build_face_detector(&config);

    if let Some(iterations) = cli.benchmark {
        return run_benchmark(&cli.input, body_detector, face_detector, config, iterations);
    }

    let writer: Box<dyn ResultWriter> = match &cli.output {
        Some(path) => Box::new(JsonLinesWriter::new(BufWriter::new(File::create(path)?))),
        None => Box::new(JsonLinesWriter::new(BufWriter::new(io::stdout()))),
    };
    let mut use_case = DetectFramesUseCase::new(
        Box::new(ImageSequenceReader::new()),
        body_detector,
        face_detector,
        writer,
        Box::new(StdoutPipelineLogger::default()),
        config,
    );
    let summary = use_case.execute(&cli.input)?;
    log::info!(
        "Processed {} frame(s): {} cache hits, {} degraded",
        summary.frames,
        summary.cache_hits,
        summary.degraded_frames
    );
    if let Some(path) = &cli.output {
        log::info!("Output written to {}", path.display());
    }
    Ok(())
}

fn run_benchmark(
    input: &Path,
    body_detector: Box<dyn BodyDetector>,
    face_detector: Option<Box<dyn FaceDetector>>,
    config: DetectionConfig,
    iterations: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = ImageSequenceReader::new();
    reader.open(input)?;
    let frame = reader.frames().next().ok_or("No frames in input")??;
    reader.close();

    let mut use_case = BenchmarkUseCase::new(body_detector, face_detector, config);
    let report = use_case.execute(&frame, iterations)?;
    println!(
        "Warmup: {:.0}ms  Average: {:.1}ms ({} iterations, {}x{})",
        report.warmup_ms,
        report.average_ms,
        report.iterations,
        frame.width(),
        frame.height()
    );
    Ok(())
}

/// Loads the config file (or defaults) and applies flag overrides.
fn build_config(cli: &Cli) -> Result<DetectionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => DetectionConfig::load(path)?,
        None => DetectionConfig::default(),
    };
    if cli.no_skip_frame {
        config.skip_frame = false;
    }
    if let Some(n) = cli.skip_frames {
        config.body.skip_frames = n;
    }
    if let Some(n) = cli.max_detected {
        config.body.max_detected = n;
    }
    if let Some(c) = cli.min_confidence {
        config.body.min_confidence = c;
    }
    if cli.faces {
        config.face.enabled = true;
    }
    if let Some(name) = &cli.body_model {
        config.body.model_path = name.clone();
    }
    if let Some(name) = &cli.face_model {
        config.face.model_path = name.clone();
    }
    if let Some(dir) = &cli.model_dir {
        config.model_base_path = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

/// A body model that cannot be resolved or loaded leaves the detector
/// unloaded: every frame then yields empty results instead of failing.
fn build_body_detector(config: &DetectionConfig) -> Box<dyn BodyDetector> {
    let detector = resolve_model(config, &config.body.model_path)
        .and_then(|path| Ok(MoveNetDetector::load(&path)?));
    match detector {
        Ok(detector) => Box::new(detector),
        Err(e) => {
            log::warn!("Body model unavailable, results will be empty: {e}");
            Box::new(MoveNetDetector::unloaded())
        }
    }
}

fn build_face_detector(config: &DetectionConfig) -> Option<Box<dyn FaceDetector>> {
    if !config.face.enabled {
        return None;
    }
    let detector = resolve_model(config, &config.face.model_path)
        .and_then(|path| Ok(FaceBoxesDetector::load(&path)?));
    match detector {
        Ok(detector) => Some(Box::new(detector)),
        Err(e) => {
            log::warn!("Face model unavailable, no faces will be reported: {e}");
            Some(Box::new(FaceBoxesDetector::unloaded()))
        }
    }
}

fn resolve_model(config: &DetectionConfig, name: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    let path = model_resolver::resolve(
        name,
        config.model_base_url.as_deref(),
        config.model_base_path.as_deref(),
        Some(Box::new(download_progress)),
    )?;
    Ok(path)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if let Some(path) = &cli.config {
        if !path.is_file() {
            return Err(format!("Config file not found: {}", path.display()).into());
        }
    }
    if cli.max_detected == Some(0) {
        return Err("Max detected must be at least 1".into());
    }
    if let Some(c) = cli.min_confidence {
        if !(0.0..=1.0).contains(&c) {
            return Err(format!("Min confidence must be between 0.0 and 1.0, got {c}").into());
        }
    }
    if cli.benchmark == Some(0) {
        return Err("Benchmark needs at least one iteration".into());
    }
    if cli.benchmark.is_some() && cli.output.is_some() {
        return Err("--benchmark and --output are mutually exclusive".into());
    }
    if let Some(dir) = &cli.model_dir {
        if !dir.is_dir() {
            return Err(format!("Model directory not found: {}", dir.display()).into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("posecache").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().to_str().unwrap();
        let cli = parse(&[
            input,
            "--no-skip-frame",
            "--skip-frames",
            "4",
            "--max-detected",
            "3",
            "--min-confidence",
            "0.4",
            "--faces",
            "--body-model",
            "thunder.onnx",
        ]);
        let config = build_config(&cli).unwrap();

        assert!(!config.skip_frame);
        assert_eq!(config.body.skip_frames, 4);
        assert_eq!(config.body.max_detected, 3);
        assert_eq!(config.body.min_confidence, 0.4);
        assert!(config.face.enabled);
        assert_eq!(config.body.model_path, "thunder.onnx");
    }

    #[test]
    fn test_flags_override_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("config.json");
        fs::write(
            &config_path,
            r#"{"skipFrame": true, "body": {"skipFrames": 2, "maxDetected": 5}}"#,
        )
        .unwrap();
        let cli = parse(&[
            tmp.path().to_str().unwrap(),
            "--config",
            config_path.to_str().unwrap(),
            "--max-detected",
            "2",
        ]);
        let config = build_config(&cli).unwrap();

        assert!(config.skip_frame);
        assert_eq!(config.body.skip_frames, 2);
        assert_eq!(config.body.max_detected, 2);
    }

    #[test]
    fn test_validate_rejects_missing_input() {
        let cli = parse(&["/nonexistent/frames"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().to_str().unwrap();
        for args in [
            vec![input, "--max-detected", "0"],
            vec![input, "--min-confidence", "1.5"],
            vec![input, "--benchmark", "0"],
            vec![input, "--benchmark", "3", "--output", "out.jsonl"],
            vec![input, "--model-dir", "/nonexistent/models"],
        ] {
            assert!(validate(&parse(&args)).is_err(), "accepted {args:?}");
        }
    }

    #[test]
    fn test_unresolvable_body_model_degrades_to_unloaded() {
        let tmp = TempDir::new().unwrap();
        let mut config = DetectionConfig::default();
        config.body.model_path = tmp.path().join("missing.onnx").to_string_lossy().into_owned();
        config.model_base_path = Some(tmp.path().to_path_buf());

        let mut detector = build_body_detector(&config);
        let frame = posecache_core::shared::frame::Frame::from_rgb(vec![0; 12], 2, 2, 0).unwrap();
        let prediction = detector.predict(&frame, &config).unwrap();
        assert!(prediction.bodies.is_empty());
    }
}

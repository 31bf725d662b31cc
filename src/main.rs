use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use hough_lanes::{image_io, LaneConfig, Pipeline};
use opencv::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about = "Lane detection on a single road image", long_about = None)]
struct Args {
    /// Input path of image
    #[arg(long, default_value = "./Assets/1.jpg")]
    input_path: PathBuf,

    /// Output path of image (original and result side by side)
    #[arg(long, default_value = "./Assets/1_out.jpg")]
    output_path: PathBuf,

    /// Also write the raw Hough segments to this path
    #[arg(long)]
    segments_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // 파이프라인 생성 (컴파일 시점 기본 설정)
    let pipeline = Pipeline::new(LaneConfig::default()).context("Invalid pipeline configuration")?;

    let img = image_io::read_image(&args.input_path)
        .with_context(|| format!("Failed to load {}", args.input_path.display()))?;
    tracing::info!(
        "Loaded {} ({}x{})",
        args.input_path.display(),
        img.cols(),
        img.rows()
    );

    let detection = pipeline.process(&img).context("Lane detection failed")?;
    tracing::info!(
        "Detected {} segment(s); left lane: {}, right lane: {}",
        detection.segments.len(),
        detection.lines.left.is_some(),
        detection.lines.right.is_some()
    );

    // 원본과 결과를 가로로 이어붙여 저장
    let merged = image_io::side_by_side(&img, &detection.annotated)?;
    image_io::write_image(&args.output_path, &merged)
        .with_context(|| format!("Failed to write {}", args.output_path.display()))?;
    tracing::info!("Wrote {}", args.output_path.display());

    if let Some(path) = &args.segments_path {
        let segments = pipeline.segment_overlay(img.size()?, &detection.segments)?;
        image_io::write_image(path, &segments)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!("Wrote segment overlay {}", path.display());
    }

    Ok(())
}

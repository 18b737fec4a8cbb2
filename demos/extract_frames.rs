//! Extract frames from a video into a directory, one image per sampled frame.
//!
//! Usage:
//!   cargo run --example extract_frames -- <input_file> [fps]

use std::error::Error;

use vidframes::{ExtractOptions, FrameExtractor, ImageFormat, OutputTarget, VideoSource};

fn main() -> Result<(), Box<dyn Error>> {
    let input_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "input.mp4".to_string());
    let fps = std::env::args()
        .nth(2)
        .map(|value| value.parse::<f64>())
        .transpose()?;

    println!("Opening {input_path}...");
    let source = VideoSource::open(&input_path)?;

    // Print video metadata.
    let metadata = source.metadata().clone();
    println!(
        "Video: {}x{}, {:.2} fps, {:.2}s, codec {}",
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        metadata.duration.as_secs_f64(),
        metadata.codec,
    );

    let mut options = ExtractOptions::new().with_format(ImageFormat::Png);
    if let Some(fps) = fps {
        options = options.with_fps(fps);
    }

    // Write the first few frames by hand.
    let mut extractor = FrameExtractor::new(source, &options)?;
    println!("Sampling at {:.2} fps", extractor.plan().effective_fps());
    std::fs::create_dir_all("preview")?;
    for frame in extractor.frames().take(3) {
        let frame = frame?;
        let path = format!("preview/{}.png", frame.index);
        std::fs::write(&path, &frame.bytes)?;
        println!("Saved {path} ({} bytes)", frame.bytes.len());
    }

    // Let the library drive a whole run into a fresh directory.
    let target = OutputTarget::new(std::path::Path::new("."), "all_frames", false);
    let mut sink = target.create()?;
    let summary = vidframes::extract(extractor.into_source(), &mut sink, &options)?;
    println!(
        "Wrote {} frames to {} in {:.2}s",
        summary.frame_count,
        target.path().display(),
        summary.elapsed.as_secs_f64(),
    );

    Ok(())
}

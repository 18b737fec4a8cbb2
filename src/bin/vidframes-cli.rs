use std::{env, error::Error, ffi::OsString, path::PathBuf, time::Instant};

use clap::Parser;
use colored::Colorize;
use vidframes::{DEFAULT_JPEG_QUALITY, DEFAULT_OUTPUT_NAME, ExtractRequest, FfmpegLogLevel};

const CLI_AFTER_HELP: &str = "Examples:\n  vidframes -v input.mp4\n  vidframes -v input.mp4 -nz -n stills --fps 2 -f png\n  vidframes -v input.mp4 -o /tmp/out --fps 0.5 --quality 80 --verbose";

#[derive(Debug, Parser)]
#[command(
    name = "vidframes",
    version,
    about = "Write the frames of a video to a zip archive or a directory",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Path to the input video.
    #[arg(short = 'v', long)]
    video_path: PathBuf,

    /// Directory the output is created in (defaults to the current directory).
    #[arg(short = 'o', long)]
    output_path: Option<PathBuf>,

    /// Name of the output directory, or of the archive without `.zip`.
    #[arg(short = 'n', long, default_value = DEFAULT_OUTPUT_NAME)]
    output_name: String,

    /// Write frames to a directory instead of a zip archive (short form: -nz).
    #[arg(long)]
    no_zip: bool,

    /// Frames to extract per second of video (defaults to every frame).
    #[arg(long, allow_negative_numbers = true)]
    fps: Option<f64>,

    /// Image format of the frames (png, jpeg, jpg).
    #[arg(short = 'f', long, default_value = "jpg")]
    format: String,

    /// JPEG quality, 1-100.
    #[arg(short = 'q', long, default_value_t = DEFAULT_JPEG_QUALITY)]
    quality: u8,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long)]
    log_level: Option<FfmpegLogLevel>,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,
}

/// Rewrite the two-letter `-nz` short flag, which clap cannot express, to
/// `--no-zip`.
fn normalize_args<I: IntoIterator<Item = OsString>>(args: I) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            if arg == "-nz" {
                OsString::from("--no-zip")
            } else {
                arg
            }
        })
        .collect()
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

fn build_request(cli: Cli) -> Result<ExtractRequest, Box<dyn Error>> {
    let output_path = match cli.output_path {
        Some(path) => path,
        None => env::current_dir()?,
    };

    Ok(ExtractRequest::new(cli.video_path)
        .output_path(output_path)
        .output_name(cli.output_name)
        .archive(!cli.no_zip)
        .fps(cli.fps)
        .format(cli.format)
        .jpeg_quality(cli.quality))
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse_from(normalize_args(env::args_os()));
    init_logging(cli.verbose);

    if let Some(level) = cli.log_level {
        vidframes::set_ffmpeg_log_level(level);
    }

    let start = Instant::now();
    let request = build_request(cli)?;
    let validated = request.validate()?;
    let summary = validated.run()?;

    log::info!(
        "{} frame(s) written to {}",
        summary.frame_count,
        validated.target().path().display()
    );
    println!(
        "{} {}",
        "success:".green().bold(),
        format!("finished in {:.3} seconds", start.elapsed().as_secs_f64()).green()
    );

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsString, path::PathBuf};

    use clap::Parser;

    use super::{Cli, build_request, normalize_args};

    fn parse(args: &[&str]) -> Cli {
        let args = args.iter().map(OsString::from);
        Cli::try_parse_from(normalize_args(args)).unwrap()
    }

    #[test]
    fn defaults() {
        let cli = parse(&["vidframes", "-v", "input.mp4"]);
        assert_eq!(cli.video_path, PathBuf::from("input.mp4"));
        assert_eq!(cli.output_path, None);
        assert_eq!(cli.output_name, "frames");
        assert!(!cli.no_zip);
        assert_eq!(cli.fps, None);
        assert_eq!(cli.format, "jpg");
        assert_eq!(cli.quality, 95);
    }

    #[test]
    fn short_no_zip_flag_selects_directory_output() {
        let cli = parse(&["vidframes", "-v", "input.mp4", "-nz", "-o", "/tmp"]);
        assert!(cli.no_zip);

        let request = build_request(cli).unwrap();
        assert!(!request.archive);
        assert_eq!(request.output_path, PathBuf::from("/tmp"));
    }

    #[test]
    fn long_options() {
        let cli = parse(&[
            "vidframes",
            "--video-path",
            "clip.mkv",
            "--output-name",
            "stills",
            "--no-zip",
            "--fps",
            "2.5",
            "--format",
            "png",
            "--log-level",
            "quiet",
        ]);
        assert_eq!(cli.output_name, "stills");
        assert!(cli.no_zip);
        assert_eq!(cli.fps, Some(2.5));
        assert_eq!(cli.format, "png");
        assert!(cli.log_level.is_some());
    }

    #[test]
    fn negative_fps_reaches_validation() {
        let cli = parse(&["vidframes", "-v", "input.mp4", "--fps", "-1"]);
        assert_eq!(cli.fps, Some(-1.0));
    }

    #[test]
    fn video_path_is_required() {
        assert!(Cli::try_parse_from(["vidframes", "-f", "png"]).is_err());
    }
}

use std::{ffi::OsString, path::PathBuf, process::ExitCode, sync::Arc};

use clap::{ArgAction, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use stillshot::{
    ExtractOptions, ExtractionReport, ExtractionSession, FfmpegLogLevel, ProgressCallback,
    ProgressInfo, parse_timestamp,
};

const CLI_AFTER_HELP: &str = "Examples:\n  stillshot -i input.mp4 -o shot_%03d.jpg 2 5 10\n  stillshot -i input.mp4 -o shot_%d.png --crop 480 --width 640 -- 2 5\n  stillshot -i interlaced.ts -o frame_%d.jpg --deinterlace -v=6 60";

/// Default verbosity: FFmpeg's `info` level.
const DEFAULT_VERBOSITY: u8 = 5;

#[derive(Debug, Parser)]
#[command(
    name = "stillshot",
    version,
    about = "Extract still frames from a video at the given timestamps (in seconds)",
    disable_help_flag = true,
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input media file.
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file template; %d is replaced by the timestamp in seconds.
    #[arg(short, long, value_name = "TEMPLATE")]
    output: Option<String>,

    /// Deinterlace frames before any other processing.
    #[arg(short, long)]
    deinterlace: bool,

    /// Resize frames to this width.
    #[arg(short, long, value_name = "PX", allow_negative_numbers = true)]
    width: Option<i64>,

    /// Resize frames to this height.
    #[arg(short = 'h', long, value_name = "PX", allow_negative_numbers = true)]
    height: Option<i64>,

    /// Crop frames to this height, keeping the aspect ratio.
    #[arg(short, long, value_name = "PX", allow_negative_numbers = true)]
    crop: Option<i64>,

    /// Verbosity level 0-8 (bare -v selects 6, "verbose").
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "6"
    )]
    verbose: Option<u8>,

    /// Skip timestamps whose output file already exists.
    #[arg(long)]
    no_overwrite: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Print the extraction report as JSON.
    #[arg(long)]
    json: bool,

    /// Print help.
    #[arg(short = '?', long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Timestamps in whole seconds.
    #[arg(value_name = "SECONDS")]
    timestamps: Vec<String>,
}

struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        let status = if info.written { "written" } else { "skipped" };
        self.bar.set_message(format!("{}s {status}", info.seconds));
    }
}

fn init_logging(level: FfmpegLogLevel) {
    let _ = env_logger::Builder::new()
        .filter_level(level.to_log_filter())
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .try_init();
}

/// Rewrite the attached short form `-vN` to `-v=N`, the only spelling clap
/// accepts for an optional value. Arguments after `--` are left alone.
fn attach_verbose_values<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut positional = false;
    args.into_iter()
        .map(|arg| {
            if positional {
                return arg;
            }
            if arg == "--" {
                positional = true;
                return arg;
            }
            match arg.to_str().and_then(|value| value.strip_prefix("-v")) {
                Some(level) if !level.is_empty() && level.bytes().all(|b| b.is_ascii_digit()) => {
                    OsString::from(format!("-v={level}"))
                }
                _ => arg,
            }
        })
        .collect()
}

fn collect_timestamps(values: &[String]) -> Vec<u64> {
    values
        .iter()
        .filter_map(|value| {
            let parsed = parse_timestamp(value);
            if parsed.is_none() {
                log::warn!("Ignoring invalid timestamp '{value}', expected whole seconds");
            }
            parsed
        })
        .collect()
}

fn build_options(cli: &Cli) -> Option<ExtractOptions> {
    let timestamps = collect_timestamps(&cli.timestamps);

    let mut valid = true;
    if cli.input.is_none() {
        log::error!("input file must be specified");
        valid = false;
    }
    if cli.output.is_none() {
        log::error!("output file must be specified");
        valid = false;
    }
    if timestamps.is_empty() {
        log::error!("at least one timestamp must be specified");
        valid = false;
    }
    if !valid {
        return None;
    }

    let mut options = ExtractOptions::new(cli.input.clone()?, cli.output.clone()?)
        .with_deinterlace(cli.deinterlace)
        .with_timestamps(timestamps)
        .with_overwrite(!cli.no_overwrite);
    if let Some(crop) = cli.crop {
        options = options.with_crop_height(crop);
    }
    if cli.width.is_some() || cli.height.is_some() {
        options = options.with_resize(cli.width, cli.height);
    }
    Some(options)
}

fn report_json(
    session: &ExtractionSession,
    options: &ExtractOptions,
    report: &ExtractionReport,
) -> serde_json::Value {
    let stream = session.stream_info();
    let settings = session.settings();
    json!({
        "input": options.input.display().to_string(),
        "output": options.output,
        "stream": {
            "index": stream.index,
            "codec": stream.codec,
            "width": stream.width,
            "height": stream.height,
            "pixel_format": format!("{:?}", stream.format),
        },
        "encoder": {
            "muxer": session.muxer(),
            "codec": session.codec(),
            "width": settings.result.width,
            "height": settings.result.height,
            "pixel_format": format!("{:?}", settings.result.format),
        },
        "written": report.written.iter().map(|(seconds, path)| json!({
            "seconds": seconds,
            "path": path.display().to_string(),
        })).collect::<Vec<_>>(),
        "skipped": report.skipped.iter().map(|(seconds, reason)| json!({
            "seconds": seconds,
            "reason": reason,
        })).collect::<Vec<_>>(),
    })
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(attach_verbose_values(std::env::args_os()));

    let level = FfmpegLogLevel::from_verbosity(cli.verbose.unwrap_or(DEFAULT_VERBOSITY));
    init_logging(level);
    stillshot::set_ffmpeg_log_level(level);

    let Some(mut options) = build_options(&cli) else {
        eprintln!("call for help: {} --help", env!("CARGO_BIN_NAME"));
        return Ok(ExitCode::FAILURE);
    };

    let progress_bar = if cli.progress {
        let pb = ProgressBar::new(options.timestamps.len() as u64);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        pb.set_style(style.progress_chars("##-"));
        options = options.with_progress(Arc::new(BarProgress { bar: pb.clone() }));
        Some(pb)
    } else {
        None
    };

    let mut session = ExtractionSession::open(&options)?;
    let report = session.run();

    if let Some(pb) = progress_bar {
        pb.finish_with_message("done");
    }

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report_json(&session, &options, &report))?
        );
    } else {
        if !report.skipped.is_empty() {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("skipped {} timestamp(s)", report.skipped.len()).yellow()
            );
        }
        println!(
            "{} {}",
            "success:".green().bold(),
            format!("Extracted {} frame(s)", report.written.len()).green()
        );
    }

    log::info!("Done!");
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn short_h_is_height() {
        let cli = Cli::try_parse_from([
            "stillshot", "-i", "in.mp4", "-o", "%d.jpg", "-h", "480", "--", "2", "5",
        ])
        .unwrap();
        assert_eq!(cli.height, Some(480));
        assert_eq!(cli.timestamps, vec!["2", "5"]);
    }

    #[test]
    fn verbose_levels() {
        let bare = Cli::try_parse_from(["stillshot", "-v"]).unwrap();
        assert_eq!(bare.verbose, Some(6));

        let explicit = Cli::try_parse_from(["stillshot", "--verbose=3"]).unwrap();
        assert_eq!(explicit.verbose, Some(3));

        let absent = Cli::try_parse_from(["stillshot"]).unwrap();
        assert_eq!(absent.verbose, None);
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(attach_verbose_values(args.iter().map(OsString::from))).unwrap()
    }

    #[test]
    fn attached_verbose_level() {
        let cli = parse(&["stillshot", "-v6", "-i", "in.mp4", "3"]);
        assert_eq!(cli.verbose, Some(6));
        assert_eq!(cli.timestamps, vec!["3"]);

        let cli = parse(&["stillshot", "-v=2"]);
        assert_eq!(cli.verbose, Some(2));
    }

    #[test]
    fn attached_form_is_ignored_after_separator() {
        let args = attach_verbose_values(["stillshot", "--", "-v6"].map(OsString::from));
        assert_eq!(args.last(), Some(&OsString::from("-v6")));
    }

    #[test]
    fn question_mark_requests_help() {
        let error = Cli::try_parse_from(["stillshot", "-?"]).unwrap_err();
        assert_eq!(error.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn invalid_timestamps_are_dropped() {
        let values: Vec<String> = ["2", "x", "-1", "07", "10"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(collect_timestamps(&values), vec![2, 10]);
    }

    #[test]
    fn options_require_input_output_and_timestamps() {
        let cli = Cli::try_parse_from(["stillshot", "-o", "%d.jpg", "3"]).unwrap();
        assert!(build_options(&cli).is_none());

        let cli = Cli::try_parse_from([
            "stillshot", "-i", "in.mp4", "-o", "%d.jpg", "--crop", "480", "-w", "640", "3",
        ])
        .unwrap();
        let options = build_options(&cli).unwrap();
        assert_eq!(options.crop_height, Some(480));
        assert_eq!(options.resize_width, Some(640));
        assert_eq!(options.resize_height, None);
        assert_eq!(options.timestamps, vec![3]);
    }
}

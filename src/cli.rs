// Command-line front end
//
// The download core is synchronous. Each request runs on a blocking worker
// and its progress events travel over a bounded channel to an async task
// that drives the progress bar.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use crate::downloader::{
    ContainerFormat, DownloadRequest, DownloadResult, Downloader, DownloaderConfig,
    ProcessGateway, ProgressEvent, QualitySpec, ToolManager,
};
use crate::logging;

/// Progress events buffered between the worker and the renderer
const PROGRESS_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Parser)]
#[command(name = "video-downloader", version, about = "Download web video through yt-dlp and ffmpeg")]
pub struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the yt-dlp binary
    #[arg(long, global = true, env = "VIDEO_DL_YTDLP")]
    pub ytdlp: Option<PathBuf>,

    /// Path to the ffmpeg binary
    #[arg(long, global = true, env = "VIDEO_DL_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Seconds to wait for a tool's version check
    #[arg(long, global = true, env = "VIDEO_DL_PROBE_TIMEOUT", default_value_t = 10)]
    pub probe_timeout: u64,

    /// User agent for stream copies
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download one or more URLs
    Download(DownloadArgs),
    /// Show title, duration and available qualities without downloading
    Info {
        url: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Check that yt-dlp and ffmpeg are installed
    Check,
}

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Video page URLs or .m3u8 manifests
    #[arg(required_unless_present = "batch_file")]
    pub urls: Vec<String>,

    /// best, bestaudio, or a height such as 720p
    #[arg(short, long, default_value = "best")]
    pub quality: QualitySpec,

    /// MP4, MP3, WEBM, MKV or AVI
    #[arg(short, long, default_value = "MP4")]
    pub format: ContainerFormat,

    /// Output directory (default: ~/Downloads/YT_Downloads)
    #[arg(short, long, env = "VIDEO_DL_OUTPUT_DIR")]
    pub out_dir: Option<PathBuf>,

    /// File with one URL per line; blank lines and # comments are skipped
    #[arg(long)]
    pub batch_file: Option<PathBuf>,

    /// Download whole playlists instead of the single linked video
    #[arg(long)]
    pub playlist: bool,

    /// Extra HTTP header, "Name: value" (repeatable)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{}'", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("empty header name in '{}'", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// URLs from a batch file
pub fn read_batch_file(path: &Path) -> anyhow::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file {}", path.display()))?;
    Ok(parse_batch(&content))
}

fn parse_batch(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

fn config_from(cli: &Cli) -> DownloaderConfig {
    DownloaderConfig::default()
        .with_ytdlp_path(cli.ytdlp.clone())
        .with_ffmpeg_path(cli.ffmpeg.clone())
        .with_probe_timeout(Duration::from_secs(cli.probe_timeout))
        .with_user_agent(cli.user_agent.clone())
}

pub async fn run() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "video-downloader starting");

    let config = config_from(&cli);

    match cli.command {
        Commands::Download(args) => download(config, args).await,
        Commands::Info { url, json } => info(config, url, json).await,
        Commands::Check => Ok(check(&config)),
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar
}

/// Drain progress events into a bar until the worker drops its sender
async fn render_progress(mut rx: mpsc::Receiver<ProgressEvent>) -> ProgressBar {
    let bar = progress_bar();

    while let Some(event) = rx.recv().await {
        match event.percentage {
            Some(p) => bar.set_position(p.round() as u64),
            // Stream copies report nothing until the end
            None => bar.enable_steady_tick(Duration::from_millis(120)),
        }

        if event.is_finished() {
            bar.set_message(format!("{} - finished", event.filename));
        } else {
            bar.set_message(format!("{} @ {}", event.filename, event.speed));
        }
    }

    bar
}

async fn download(config: DownloaderConfig, args: DownloadArgs) -> anyhow::Result<ExitCode> {
    let mut urls = args.urls.clone();
    if let Some(path) = &args.batch_file {
        urls.extend(read_batch_file(path)?);
    }
    if urls.is_empty() {
        bail!("no URLs to download");
    }

    let out_dir = args.out_dir.clone().unwrap_or_else(|| config.output_dir.clone());
    let downloader = Arc::new(Downloader::new(Box::new(ProcessGateway::new(config))));

    let mut failures = 0usize;
    // One at a time: the file numbering has no lock, so parallel requests
    // into the same directory could pick the same prefix
    for url in urls {
        let mut request = DownloadRequest::new(url, args.quality, args.format, &out_dir)
            .with_playlist(args.playlist);
        request.headers = args.headers.clone();

        println!("Downloading {}", request.url);
        match run_one(Arc::clone(&downloader), request).await? {
            DownloadResult::Success { filename } => println!("Done: {}", filename),
            DownloadResult::Failure { error_message } => {
                failures += 1;
                eprintln!("Failed: {}", error_message);
            }
        }
    }

    if failures > 0 {
        eprintln!("{} download(s) failed", failures);
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_one(downloader: Arc<Downloader>, request: DownloadRequest) -> anyhow::Result<DownloadResult> {
    let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
    let ui = tokio::spawn(render_progress(rx));

    let result = tokio::task::spawn_blocking(move || {
        downloader.execute(&request, &mut |event| {
            // Renderer gone means nobody is watching; keep downloading
            let _ = tx.blocking_send(event);
        })
    })
    .await
    .context("download worker panicked")?;

    let bar = ui.await.context("progress renderer panicked")?;
    bar.finish_and_clear();
    Ok(result)
}

async fn info(config: DownloaderConfig, url: String, json: bool) -> anyhow::Result<ExitCode> {
    let downloader = Downloader::new(Box::new(ProcessGateway::new(config)));
    let info = tokio::task::spawn_blocking(move || downloader.video_info(&url))
        .await
        .context("info worker panicked")??;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("Title:     {}", info.title);
    println!("Duration:  {}", info.duration);
    if !info.thumbnail.is_empty() {
        println!("Thumbnail: {}", info.thumbnail);
    }
    println!("Qualities:");
    for option in &info.formats {
        match option.filesize {
            Some(size) => println!(
                "  {:<18} {:<5} ~{:.1} MB",
                option.quality,
                option.ext,
                size as f64 / 1_048_576.0
            ),
            None => println!("  {:<18} {}", option.quality, option.ext),
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn check(config: &DownloaderConfig) -> ExitCode {
    let report = ToolManager::new(config).check_all();
    println!("{}", report);
    if report.all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_download_args() {
        let cli = Cli::try_parse_from([
            "video-downloader",
            "download",
            "https://example.com/a",
            "-q",
            "720p",
            "-f",
            "webm",
            "-H",
            "Referer: https://example.com/",
        ])
        .unwrap();

        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.urls, vec!["https://example.com/a"]);
                assert_eq!(args.quality, QualitySpec::MaxHeight(720));
                assert_eq!(args.format, ContainerFormat::Webm);
                assert_eq!(
                    args.headers,
                    vec![("Referer".to_string(), "https://example.com/".to_string())]
                );
                assert!(!args.playlist);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_download_needs_urls() {
        assert!(Cli::try_parse_from(["video-downloader", "download"]).is_err());
        assert!(Cli::try_parse_from(["video-downloader", "download", "--batch-file", "urls.txt"]).is_ok());
        assert!(Cli::try_parse_from(["video-downloader", "download", "x", "-q", "hd"]).is_err());
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header("Cookie: a=b; c=d").unwrap(), ("Cookie".to_string(), "a=b; c=d".to_string()));
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_parse_batch() {
        let content = "https://a\n\n# comment\n  https://b  \n";
        assert_eq!(parse_batch(content), vec!["https://a", "https://b"]);
    }
}

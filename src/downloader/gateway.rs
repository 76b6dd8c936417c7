// Process gateway - runs yt-dlp and ffmpeg as child processes
//
// Both tools are driven synchronously: the calling thread blocks until the
// child exits. Only the probe has a timeout; a stalled download or a hung
// ffmpeg blocks for as long as the tool does.

use std::io::{self, BufReader};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use super::config::DownloaderConfig;
use super::errors::GatewayError;
use super::progress::{self, RawProgress};
use super::tools::{ToolManager, ToolType};
use super::traits::{ExtractorOptions, ToolGateway};
use super::utils::{for_each_line_lossy, tail_lines};

/// `ToolGateway` backed by the real binaries
pub struct ProcessGateway {
    config: DownloaderConfig,
    tools: ToolManager,
}

impl ProcessGateway {
    pub fn new(config: DownloaderConfig) -> Self {
        let tools = ToolManager::new(&config);
        Self { config, tools }
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    pub fn tools(&self) -> &ToolManager {
        &self.tools
    }

    fn spawn_error(tool: ToolType, e: io::Error) -> GatewayError {
        if e.kind() == io::ErrorKind::NotFound {
            GatewayError::ToolMissing(tool.as_str().to_string())
        } else {
            GatewayError::Io(format!("failed to start {}: {}", tool, e))
        }
    }
}

/// Arguments for a stream copy: no persistent connections, fixed UA, `-c copy`
pub fn muxer_args(
    source_url: &str,
    dest_path: &Path,
    headers: &[(String, String)],
    user_agent: &str,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-nostdin".to_string(),
        "-hide_banner".to_string(),
        "-nostats".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-http_persistent".to_string(),
        "0".to_string(),
        "-user_agent".to_string(),
        user_agent.to_string(),
    ];

    if !headers.is_empty() {
        // ffmpeg wants CRLF-terminated "Name: value" lines in one argument
        let joined: String = headers
            .iter()
            .map(|(name, value)| format!("{}: {}\r\n", name, value))
            .collect();
        args.push("-headers".to_string());
        args.push(joined);
    }

    args.extend([
        "-i".to_string(),
        source_url.to_string(),
        "-c".to_string(),
        "copy".to_string(),
        dest_path.to_string_lossy().to_string(),
    ]);
    args
}

/// Arguments for an extractor download with machine-readable progress
pub fn extractor_args(opts: &ExtractorOptions, ffmpeg_location: Option<&Path>) -> Vec<String> {
    let mut args = vec!["-f".to_string(), opts.selector.spec.clone()];

    // yt-dlp only accepts video containers here; audio goes through -x
    if !opts.selector.is_audio_only() {
        args.push("--merge-output-format".to_string());
        args.push(opts.selector.merge_output_format.clone());
    }

    args.extend([
        "-o".to_string(),
        opts.output_template.clone(),
        "--newline".to_string(),
        "--no-colors".to_string(),
        "--progress-template".to_string(),
        progress::progress_template(),
    ]);

    args.push(if opts.allow_playlist { "--yes-playlist" } else { "--no-playlist" }.to_string());

    if opts.selector.is_audio_only() {
        args.extend([
            "-x".to_string(),
            "--audio-format".to_string(),
            "mp3".to_string(),
        ]);
    }

    for (name, value) in &opts.headers {
        args.push("--add-header".to_string());
        args.push(format!("{}:{}", name, value));
    }

    if let Some(path) = ffmpeg_location {
        args.push("--ffmpeg-location".to_string());
        args.push(path.to_string_lossy().to_string());
    }

    // URL last, after "--" so a URL starting with '-' is not read as a flag
    args.push("--".to_string());
    args.push(opts.url.clone());
    args
}

/// Best message for a failed extractor run: its ERROR lines, else the end
/// of stderr, else the exit status
pub fn extractor_error_message(stderr: &str, status: Option<ExitStatus>) -> String {
    let errors: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR:"))
        .collect();

    if !errors.is_empty() {
        return errors.join("\n");
    }

    let tail = tail_lines(stderr, 5);
    if !tail.is_empty() {
        return tail;
    }

    match status.and_then(|s| s.code()) {
        Some(code) => format!("yt-dlp exited with status code {}", code),
        None => "yt-dlp exited without status code (terminated by signal)".to_string(),
    }
}

impl ToolGateway for ProcessGateway {
    fn probe_tool(&self, tool: ToolType) -> bool {
        match self.tools.get_version(tool) {
            Ok(version) => {
                tracing::debug!(tool = tool.as_str(), %version, "tool available");
                true
            }
            Err(problem) => {
                tracing::warn!(tool = tool.as_str(), %problem, "tool probe failed");
                false
            }
        }
    }

    fn run_muxer_copy(
        &self,
        source_url: &str,
        dest_path: &Path,
        headers: &[(String, String)],
    ) -> Result<(), GatewayError> {
        let ffmpeg = self.tools.binary(ToolType::Ffmpeg);
        let args = muxer_args(source_url, dest_path, headers, &self.config.user_agent);
        tracing::debug!(program = %ffmpeg.display(), args = ?args, "starting stream copy");

        let output = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::spawn_error(ToolType::Ffmpeg, e))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(GatewayError::ProcessFailed {
            tool: ToolType::Ffmpeg.as_str().to_string(),
            exit_code: output.status.code(),
            stderr: tail_lines(&stderr, 10),
        })
    }

    fn run_extractor_download(
        &self,
        opts: &ExtractorOptions,
        on_progress: &mut dyn FnMut(RawProgress),
    ) -> Result<(), GatewayError> {
        let ytdlp = self.tools.binary(ToolType::YtDlp);
        let ffmpeg = &self.config.ffmpeg_path;
        let ffmpeg_location = ffmpeg.is_absolute().then_some(ffmpeg.as_path());
        let args = extractor_args(opts, ffmpeg_location);
        tracing::debug!(program = %ytdlp.display(), args = ?args, "starting yt-dlp");

        let mut child = Command::new(ytdlp)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Self::spawn_error(ToolType::YtDlp, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GatewayError::Io("failed to capture yt-dlp stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| GatewayError::Io("failed to capture yt-dlp stderr".to_string()))?;

        // Collect stderr on its own thread so a chatty child can't block on a
        // full pipe while we read stdout
        let stderr_handle = std::thread::spawn(move || {
            let mut lines = Vec::new();
            for_each_line_lossy(BufReader::new(stderr), |l| lines.push(l.to_string()));
            lines.join("\n")
        });

        for_each_line_lossy(BufReader::new(stdout), |line| match progress::parse_progress_line(line) {
            Some(raw) => on_progress(raw),
            None => tracing::debug!(target: "video_downloader_lib::yt_dlp", "{}", line),
        });

        let status = child.wait();
        let stderr_output = stderr_handle.join().unwrap_or_default();

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(GatewayError::ExtractionFailed {
                message: extractor_error_message(&stderr_output, Some(status)),
            }),
            Err(e) => Err(GatewayError::ExtractionFailed {
                message: format!("failed to wait for yt-dlp: {}", e),
            }),
        }
    }

    fn extract_info(&self, url: &str) -> Result<serde_json::Value, GatewayError> {
        let ytdlp = self.tools.binary(ToolType::YtDlp);
        let args = ["--dump-json", "--no-playlist", "--no-warnings", "--", url];
        tracing::debug!(program = %ytdlp.display(), args = ?args, "extracting info");

        let output = Command::new(ytdlp)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Self::spawn_error(ToolType::YtDlp, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GatewayError::ExtractionFailed {
                message: extractor_error_message(&stderr, Some(output.status)),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| GatewayError::ExtractionFailed {
            message: format!("invalid JSON from yt-dlp: {}", e),
        })
    }
}

// Downloader configuration

use std::path::PathBuf;
use std::time::Duration;

use super::tools::{self, ToolType};

/// User agent sent by the muxer for manifest downloads
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const OUTPUT_DIR_NAME: &str = "YT_Downloads";

/// ~/Downloads/YT_Downloads, or ./YT_Downloads without a home directory
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(OUTPUT_DIR_NAME)
}

#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub ytdlp_path: PathBuf,
    pub ffmpeg_path: PathBuf,
    /// Upper bound for tool probes; downloads themselves are unbounded
    pub probe_timeout: Duration,
    pub user_agent: String,
    pub output_dir: PathBuf,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        let resolve = |tool: ToolType| tools::locate(tool).unwrap_or_else(|| PathBuf::from(tool.as_str()));

        Self {
            ytdlp_path: resolve(ToolType::YtDlp),
            ffmpeg_path: resolve(ToolType::Ffmpeg),
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            output_dir: default_output_dir(),
        }
    }
}

impl DownloaderConfig {
    pub fn with_ytdlp_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.ytdlp_path = path;
        }
        self
    }

    pub fn with_ffmpeg_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.ffmpeg_path = path;
        }
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        if let Some(ua) = user_agent {
            self.user_agent = ua;
        }
        self
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output_dir = dir;
        }
        self
    }
}

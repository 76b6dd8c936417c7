// Common data models for downloader

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::errors::ParseError;

/// Requested quality for one download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualitySpec {
    /// Best available video + audio
    Best,
    /// Audio stream only (always ends up as MP3)
    AudioOnly,
    /// Best video whose height is at most this many pixels
    MaxHeight(u32),
}

impl FromStr for QualitySpec {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_lowercase();
        match value.as_str() {
            "best" => return Ok(Self::Best),
            "bestaudio" | "audio" | "audio only" | "audio only (mp3)" => {
                return Ok(Self::AudioOnly)
            }
            _ => {}
        }

        let digits = value.strip_suffix('p').unwrap_or(&value);
        match digits.parse::<u32>() {
            Ok(height) if height > 0 => Ok(Self::MaxHeight(height)),
            _ => Err(ParseError::Quality(s.to_string())),
        }
    }
}

impl fmt::Display for QualitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Best => write!(f, "best"),
            Self::AudioOnly => write!(f, "bestaudio"),
            Self::MaxHeight(h) => write!(f, "{}p", h),
        }
    }
}

/// Output container chosen by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerFormat {
    Mp4,
    Mp3,
    Webm,
    Mkv,
    Avi,
}

impl ContainerFormat {
    pub const ALL: [ContainerFormat; 5] = [
        ContainerFormat::Mp4,
        ContainerFormat::Mp3,
        ContainerFormat::Webm,
        ContainerFormat::Mkv,
        ContainerFormat::Avi,
    ];

    /// Lower-case file extension, also used as yt-dlp container name
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mp3 => "mp3",
            Self::Webm => "webm",
            Self::Mkv => "mkv",
            Self::Avi => "avi",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Mp3)
    }
}

impl FromStr for ContainerFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().trim_start_matches('.').to_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == value)
            .ok_or_else(|| ParseError::Format(s.to_string()))
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension().to_uppercase())
    }
}

/// Input to a single orchestration call
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: QualitySpec,
    pub format: ContainerFormat,
    pub destination_dir: PathBuf,
    /// Let the extractor expand playlist URLs instead of taking one entry
    pub allow_playlist: bool,
    /// Extra HTTP headers (Referer, Cookie, ...) sent by either tool
    pub headers: Vec<(String, String)>,
}

impl DownloadRequest {
    pub fn new(
        url: impl Into<String>,
        quality: QualitySpec,
        format: ContainerFormat,
        destination_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            quality,
            format,
            destination_dir: destination_dir.into(),
            allow_playlist: false,
            headers: Vec::new(),
        }
    }

    pub fn with_playlist(mut self, allow: bool) -> Self {
        self.allow_playlist = allow;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// How a request gets downloaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Manifest URL copied as-is by the muxer, no extractor involved
    DirectStreamCopy,
    /// Everything else goes through yt-dlp
    ExtractorDownload,
}

/// Canonical progress status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Downloading,
    Finished,
}

/// Progress update handed to the caller's sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    /// 0.0-100.0, `None` when the tool reports no progress at all
    pub percentage: Option<f64>,
    pub speed: String,
    pub filename: String,
}

impl ProgressEvent {
    pub fn is_finished(&self) -> bool {
        self.status == ProgressStatus::Finished
    }
}

/// Terminal outcome of one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadResult {
    Success { filename: String },
    Failure { error_message: String },
}

impl DownloadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Quality choice offered for a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityOption {
    pub format_id: String,
    /// Display label ("1080p", "Audio Only (MP3)")
    pub quality: String,
    pub ext: String,
    pub filesize: Option<u64>,
    pub height: Option<u32>,
}

impl QualityOption {
    pub fn is_audio(&self) -> bool {
        self.height.is_none()
    }
}

/// Video information without downloading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub title: String,
    pub duration_seconds: u64,
    /// "m:ss"
    pub duration: String,
    pub thumbnail: String,
    pub formats: Vec<QualityOption>,
}

// Progress normalization
//
// yt-dlp reports progress as a loose dictionary whose keys depend on what the
// site and downloader know (exact size, estimated size, nothing at all). We
// ask yt-dlp to dump that dictionary as JSON on each progress line, decode
// it once into `RawProgress`, and turn it into a `ProgressEvent` here so the
// rest of the crate never looks at raw shapes.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use super::models::{ProgressEvent, ProgressStatus};

/// Prefix our progress template puts in front of the JSON payload
pub const PROGRESS_MARKER: &str = "vdl-progress:";

/// Value for yt-dlp `--progress-template`
pub fn progress_template() -> String {
    format!("download:{}%(progress)j", PROGRESS_MARKER)
}

pub const UNKNOWN_SPEED: &str = "Unknown";
const DOWNLOADING_PLACEHOLDER: &str = "downloading...";
const FINISHED_PLACEHOLDER: &str = "completed";

lazy_static! {
    static ref ANSI_RE: Regex = Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap();
}

/// Fields yt-dlp may put in a progress dictionary. All optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawFields {
    #[serde(default, rename = "_percent_str")]
    pub percent_str: Option<String>,
    #[serde(default)]
    pub downloaded_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes: Option<f64>,
    #[serde(default)]
    pub total_bytes_estimate: Option<f64>,
    #[serde(default, rename = "_speed_str")]
    pub speed_str: Option<String>,
    /// Bytes per second
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub filename: Option<String>,
}

/// One progress callback from the extractor, keyed by its native status
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RawProgress {
    Downloading(RawFields),
    Finished(RawFields),
    /// "error" and anything newer yt-dlp might add
    #[serde(other)]
    Other,
}

impl RawProgress {
    pub fn downloading(fields: RawFields) -> Self {
        Self::Downloading(fields)
    }

    pub fn finished(fields: RawFields) -> Self {
        Self::Finished(fields)
    }
}

/// Decode one line of extractor stdout. `None` for non-progress output and
/// for payloads that fail to decode.
pub fn parse_progress_line(line: &str) -> Option<RawProgress> {
    let idx = line.find(PROGRESS_MARKER)?;
    let payload = line[idx + PROGRESS_MARKER.len()..].trim();

    match serde_json::from_str::<RawProgress>(payload) {
        Ok(raw) => Some(raw),
        Err(e) => {
            tracing::warn!(error = %e, "unparseable progress payload, skipping");
            None
        }
    }
}

/// Normalizer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizerState {
    Idle,
    Downloading,
    Finished,
    Failed,
}

/// Per-download state machine turning raw callbacks into `ProgressEvent`s
#[derive(Debug)]
pub struct ProgressNormalizer {
    state: NormalizerState,
}

impl ProgressNormalizer {
    pub fn new() -> Self {
        Self {
            state: NormalizerState::Idle,
        }
    }

    pub fn state(&self) -> NormalizerState {
        self.state
    }

    /// Feed one raw event. Returns the event to forward, if any.
    pub fn normalize(&mut self, raw: &RawProgress) -> Option<ProgressEvent> {
        if self.state == NormalizerState::Failed {
            return None;
        }

        match raw {
            RawProgress::Downloading(fields) => {
                // Finished -> Downloading happens when yt-dlp moves on to the
                // next stream of a video+audio merge.
                self.state = NormalizerState::Downloading;
                Some(ProgressEvent {
                    status: ProgressStatus::Downloading,
                    percentage: Some(percentage(fields)),
                    speed: speed(fields),
                    filename: display_filename(fields.filename.as_deref(), DOWNLOADING_PLACEHOLDER),
                })
            }
            RawProgress::Finished(fields) => {
                self.state = NormalizerState::Finished;
                Some(ProgressEvent {
                    status: ProgressStatus::Finished,
                    percentage: Some(100.0),
                    speed: speed(fields),
                    filename: display_filename(fields.filename.as_deref(), FINISHED_PLACEHOLDER),
                })
            }
            RawProgress::Other => None,
        }
    }

    /// The gateway reported an error. No event is produced for this; the
    /// failure travels in the `DownloadResult`.
    pub fn fail(&mut self) {
        self.state = NormalizerState::Failed;
    }
}

impl Default for ProgressNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn clean(s: &str) -> String {
    ANSI_RE.replace_all(s, "").trim().to_string()
}

/// Parse "  42.1%" style strings
fn parse_percent_str(s: &str) -> Option<f64> {
    let cleaned = clean(s);
    let number = cleaned.strip_suffix('%').unwrap_or(&cleaned).trim();
    number.parse::<f64>().ok().filter(|p| p.is_finite())
}

fn ratio(done: Option<f64>, total: Option<f64>) -> Option<f64> {
    match (done, total) {
        (Some(done), Some(total)) if total > 0.0 => Some(done / total * 100.0),
        _ => None,
    }
}

/// First available of: formatted percent, exact size, estimated size, 0
fn percentage(fields: &RawFields) -> f64 {
    fields
        .percent_str
        .as_deref()
        .and_then(parse_percent_str)
        .or_else(|| ratio(fields.downloaded_bytes, fields.total_bytes))
        .or_else(|| ratio(fields.downloaded_bytes, fields.total_bytes_estimate))
        .unwrap_or(0.0)
        .clamp(0.0, 100.0)
}

/// Formatted speed, then raw bytes/s, then "Unknown"
fn speed(fields: &RawFields) -> String {
    if let Some(s) = fields.speed_str.as_deref() {
        let cleaned = clean(s);
        if !cleaned.is_empty() && cleaned != "N/A" && cleaned != "Unknown B/s" {
            return cleaned;
        }
    }

    match fields.speed {
        Some(rate) if rate.is_finite() => format!("{:.2}B/s", rate),
        _ => UNKNOWN_SPEED.to_string(),
    }
}

/// Base name of `path` reduced to printable ASCII
pub fn display_filename(path: Option<&str>, placeholder: &str) -> String {
    let base = path
        .and_then(|p| p.rsplit(['/', '\\']).next())
        .unwrap_or_default();

    let printable: String = base
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .collect();
    let printable = printable.trim();

    if printable.is_empty() {
        placeholder.to_string()
    } else {
        printable.to_string()
    }
}

// Tool gateway trait definition

use std::path::Path;

use super::errors::GatewayError;
use super::format_selector::FormatSelector;
use super::progress::RawProgress;
use super::tools::ToolType;

/// Everything the extractor needs for one download
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub url: String,
    pub selector: FormatSelector,
    /// yt-dlp output template, e.g. "/dl/001-%(title)s.%(ext)s"
    pub output_template: String,
    pub allow_playlist: bool,
    pub headers: Vec<(String, String)>,
}

/// Synchronous boundary to the external binaries.
///
/// Every call blocks the calling thread until the tool exits.
pub trait ToolGateway: Send + Sync {
    /// Run the tool's version command with a bounded wait
    fn probe_tool(&self, tool: ToolType) -> bool;

    /// Stream-copy `source_url` into `dest_path` without re-encoding
    fn run_muxer_copy(
        &self,
        source_url: &str,
        dest_path: &Path,
        headers: &[(String, String)],
    ) -> Result<(), GatewayError>;

    /// Download through the extractor, forwarding every raw progress
    /// callback to `on_progress` before returning
    fn run_extractor_download(
        &self,
        opts: &ExtractorOptions,
        on_progress: &mut dyn FnMut(RawProgress),
    ) -> Result<(), GatewayError>;

    /// Metadata-only extraction, returns the extractor's info JSON
    fn extract_info(&self, url: &str) -> Result<serde_json::Value, GatewayError>;
}

// Orchestrator - one request in, one DownloadResult out

use std::path::Path;

use super::errors::GatewayError;
use super::format_selector::build_format_selector;
use super::media_info::parse_video_info;
use super::models::{
    DownloadRequest, DownloadResult, ProgressEvent, ProgressStatus, Strategy, VideoInfo,
};
use super::progress::{display_filename, ProgressNormalizer, RawProgress, UNKNOWN_SPEED};
use super::sequencer::next_number;
use super::strategy::classify;
use super::tools::ToolType;
use super::traits::{ExtractorOptions, ToolGateway};

/// Output template for an extractor download numbered `n`
pub fn output_template(dir: &Path, n: u32, allow_playlist: bool) -> String {
    let name = if allow_playlist {
        format!("{:03}-%(playlist_index)s-%(title)s.%(ext)s", n)
    } else {
        format!("{:03}-%(title)s.%(ext)s", n)
    };
    dir.join(name).to_string_lossy().to_string()
}

/// File name used for a direct stream copy numbered `n`
pub fn stream_filename(n: u32) -> String {
    format!("{:03}-stream.mp4", n)
}

pub struct Downloader {
    gateway: Box<dyn ToolGateway>,
}

impl Downloader {
    pub fn new(gateway: Box<dyn ToolGateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &dyn ToolGateway {
        self.gateway.as_ref()
    }

    /// Run one request to completion, blocking the calling thread.
    ///
    /// Progress goes to `sink` as it happens. Exactly one result is returned;
    /// nothing is retried.
    pub fn execute(
        &self,
        request: &DownloadRequest,
        sink: &mut dyn FnMut(ProgressEvent),
    ) -> DownloadResult {
        if let Err(e) = std::fs::create_dir_all(&request.destination_dir) {
            return failure(format!(
                "Cannot create output directory {}: {}",
                request.destination_dir.display(),
                e
            ));
        }

        let strategy = classify(&request.url);
        tracing::info!(url = %request.url, ?strategy, "starting download");

        let result = match strategy {
            Strategy::DirectStreamCopy => self.stream_copy(request, sink),
            Strategy::ExtractorDownload => self.extractor_download(request, sink),
        };

        match &result {
            DownloadResult::Success { filename } => {
                tracing::info!(url = %request.url, %filename, "download finished")
            }
            DownloadResult::Failure { error_message } => {
                tracing::error!(url = %request.url, error = %error_message, "download failed")
            }
        }
        result
    }

    fn stream_copy(
        &self,
        request: &DownloadRequest,
        sink: &mut dyn FnMut(ProgressEvent),
    ) -> DownloadResult {
        if !self.gateway.probe_tool(ToolType::Ffmpeg) {
            return failure("FFmpeg not found".to_string());
        }

        let n = next_number(&request.destination_dir);
        let name = stream_filename(n);
        let dest = request.destination_dir.join(&name);

        // ffmpeg gives us no percentage for a copy, only start and end
        sink(ProgressEvent {
            status: ProgressStatus::Downloading,
            percentage: None,
            speed: UNKNOWN_SPEED.to_string(),
            filename: name.clone(),
        });

        match self.gateway.run_muxer_copy(&request.url, &dest, &request.headers) {
            Ok(()) => {
                sink(ProgressEvent {
                    status: ProgressStatus::Finished,
                    percentage: Some(100.0),
                    speed: UNKNOWN_SPEED.to_string(),
                    filename: name,
                });
                DownloadResult::Success {
                    filename: dest.to_string_lossy().to_string(),
                }
            }
            Err(e) => failure(format!("FFmpeg error: {}", e)),
        }
    }

    fn extractor_download(
        &self,
        request: &DownloadRequest,
        sink: &mut dyn FnMut(ProgressEvent),
    ) -> DownloadResult {
        let selector = build_format_selector(request.quality, request.format);
        let n = next_number(&request.destination_dir);
        let template = output_template(&request.destination_dir, n, request.allow_playlist);
        tracing::debug!(selector = %selector.spec, container = %selector.merge_output_format, %template, "extractor options");

        let opts = ExtractorOptions {
            url: request.url.clone(),
            selector,
            output_template: template.clone(),
            allow_playlist: request.allow_playlist,
            headers: request.headers.clone(),
        };

        let mut normalizer = ProgressNormalizer::new();
        let mut last_file: Option<String> = None;
        let mut on_raw = |raw: RawProgress| {
            if let Some(event) = normalizer.normalize(&raw) {
                if event.is_finished() {
                    if let RawProgress::Finished(fields) = &raw {
                        if fields.filename.is_some() {
                            last_file = Some(event.filename.clone());
                        }
                    }
                }
                sink(event);
            }
        };

        match self.gateway.run_extractor_download(&opts, &mut on_raw) {
            Ok(()) => {
                let file = last_file.unwrap_or_else(|| display_filename(Some(template.as_str()), "download"));
                DownloadResult::Success {
                    filename: format!("Downloaded successfully as {} ({})", request.format, file),
                }
            }
            Err(e) => {
                normalizer.fail();
                failure(e.to_string())
            }
        }
    }

    /// Title, duration, thumbnail and quality choices without downloading
    pub fn video_info(&self, url: &str) -> Result<VideoInfo, GatewayError> {
        let json = self.gateway.extract_info(url)?;
        Ok(parse_video_info(&json))
    }
}

fn failure(error_message: String) -> DownloadResult {
    DownloadResult::Failure { error_message }
}

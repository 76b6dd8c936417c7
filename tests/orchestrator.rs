// End-to-end orchestration against a scripted gateway

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::json;
use tempfile::TempDir;

use video_downloader_lib::downloader::{
    ContainerFormat, DownloadRequest, DownloadResult, Downloader, ExtractorOptions, GatewayError,
    ProgressEvent, ProgressStatus, QualitySpec, RawFields, RawProgress, ToolGateway, ToolType,
};

#[derive(Default)]
struct Calls {
    muxer: Vec<(String, PathBuf)>,
    extractor: Vec<ExtractorOptions>,
}

/// Gateway that replays canned progress and outcomes
struct StubGateway {
    ffmpeg_present: bool,
    progress: Vec<RawProgress>,
    extractor_error: Option<String>,
    muxer_error: Option<String>,
    calls: Arc<Mutex<Calls>>,
}

impl StubGateway {
    fn new() -> Self {
        Self {
            ffmpeg_present: true,
            progress: Vec::new(),
            extractor_error: None,
            muxer_error: None,
            calls: Arc::new(Mutex::new(Calls::default())),
        }
    }
}

impl ToolGateway for StubGateway {
    fn probe_tool(&self, tool: ToolType) -> bool {
        match tool {
            ToolType::Ffmpeg => self.ffmpeg_present,
            ToolType::YtDlp => true,
        }
    }

    fn run_muxer_copy(
        &self,
        source_url: &str,
        dest_path: &Path,
        _headers: &[(String, String)],
    ) -> Result<(), GatewayError> {
        self.calls
            .lock()
            .unwrap()
            .muxer
            .push((source_url.to_string(), dest_path.to_path_buf()));
        match &self.muxer_error {
            Some(stderr) => Err(GatewayError::ProcessFailed {
                tool: "ffmpeg".to_string(),
                exit_code: Some(1),
                stderr: stderr.clone(),
            }),
            None => Ok(()),
        }
    }

    fn run_extractor_download(
        &self,
        opts: &ExtractorOptions,
        on_progress: &mut dyn FnMut(RawProgress),
    ) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().extractor.push(opts.clone());
        for raw in &self.progress {
            on_progress(raw.clone());
        }
        match &self.extractor_error {
            Some(message) => Err(GatewayError::ExtractionFailed {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn extract_info(&self, _url: &str) -> Result<serde_json::Value, GatewayError> {
        Ok(json!({
            "title": "Sample clip",
            "duration": 125,
            "thumbnail": "https://img.example/t.jpg",
            "formats": [
                {"format_id": "22", "vcodec": "avc1", "height": 720, "ext": "mp4"},
                {"format_id": "18", "vcodec": "avc1", "height": 360, "ext": "mp4"},
                {"format_id": "140", "vcodec": "none", "ext": "m4a"}
            ]
        }))
    }
}

fn run(gateway: StubGateway, request: &DownloadRequest) -> (DownloadResult, Vec<ProgressEvent>) {
    let downloader = Downloader::new(Box::new(gateway));
    let mut events = Vec::new();
    let result = downloader.execute(request, &mut |e| events.push(e));
    (result, events)
}

fn request(url: &str, dir: &TempDir) -> DownloadRequest {
    DownloadRequest::new(url, QualitySpec::Best, ContainerFormat::Mp4, dir.path())
}

#[test]
fn extractor_download_reports_progress_and_success() {
    let dir = TempDir::new().unwrap();
    let mut gateway = StubGateway::new();
    let calls = Arc::clone(&gateway.calls);
    let file = dir.path().join("001-Sample clip.mp4").to_string_lossy().to_string();
    gateway.progress = vec![
        RawProgress::downloading(RawFields {
            percent_str: Some(" 50.0%".to_string()),
            speed_str: Some("1.00MiB/s".to_string()),
            filename: Some(file.clone()),
            ..Default::default()
        }),
        RawProgress::finished(RawFields {
            filename: Some(file),
            ..Default::default()
        }),
    ];

    let (result, events) = run(gateway, &request("https://www.youtube.com/watch?v=abc", &dir));

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].status, ProgressStatus::Downloading);
    assert_eq!(events[0].percentage, Some(50.0));
    assert_eq!(events[0].speed, "1.00MiB/s");
    assert_eq!(events[0].filename, "001-Sample clip.mp4");
    assert_eq!(events[1].status, ProgressStatus::Finished);
    assert_eq!(events[1].percentage, Some(100.0));

    match result {
        DownloadResult::Success { filename } => {
            assert!(filename.contains("Downloaded successfully as MP4"));
            assert!(filename.contains("001-Sample clip.mp4"));
        }
        other => panic!("expected success, got {:?}", other),
    }

    let calls = calls.lock().unwrap();
    assert_eq!(calls.extractor.len(), 1);
    assert!(calls.muxer.is_empty());
    let opts = &calls.extractor[0];
    assert_eq!(opts.selector.spec, "bestvideo+bestaudio/best");
    assert!(opts.output_template.ends_with("001-%(title)s.%(ext)s"));
    assert!(!opts.allow_playlist);
}

#[test]
fn extractor_failure_is_passed_through() {
    let dir = TempDir::new().unwrap();
    let mut gateway = StubGateway::new();
    gateway.extractor_error = Some("ERROR: Video unavailable".to_string());

    let (result, events) = run(gateway, &request("https://www.youtube.com/watch?v=gone", &dir));

    assert!(events.is_empty());
    assert_eq!(
        result,
        DownloadResult::Failure {
            error_message: "ERROR: Video unavailable".to_string()
        }
    );
}

#[test]
fn numbering_continues_after_existing_files() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("005-old.mp4"), b"").unwrap();
    std::fs::write(dir.path().join("009-notes.txt"), b"").unwrap();

    let gateway = StubGateway::new();
    let calls = Arc::clone(&gateway.calls);
    let (result, _) = run(gateway, &request("https://vimeo.com/1", &dir));

    assert!(result.is_success());
    let calls = calls.lock().unwrap();
    assert!(calls.extractor[0].output_template.ends_with("006-%(title)s.%(ext)s"));
}

#[test]
fn audio_request_uses_audio_selector() {
    let dir = TempDir::new().unwrap();
    let gateway = StubGateway::new();
    let calls = Arc::clone(&gateway.calls);
    let req = DownloadRequest::new(
        "https://www.youtube.com/watch?v=abc",
        QualitySpec::AudioOnly,
        ContainerFormat::Mp3,
        dir.path(),
    )
    .with_playlist(true);

    let (result, _) = run(gateway, &req);

    assert!(result.is_success());
    let calls = calls.lock().unwrap();
    let opts = &calls.extractor[0];
    assert_eq!(opts.selector.spec, "bestaudio/best");
    assert_eq!(opts.selector.merge_output_format, "mp3");
    assert!(opts.allow_playlist);
}

#[test]
fn stream_copy_without_ffmpeg_fails_fast() {
    let dir = TempDir::new().unwrap();
    let mut gateway = StubGateway::new();
    gateway.ffmpeg_present = false;
    let calls = Arc::clone(&gateway.calls);

    let (result, events) = run(gateway, &request("https://cdn.example/live/index.m3u8", &dir));

    assert!(events.is_empty());
    assert_eq!(
        result,
        DownloadResult::Failure {
            error_message: "FFmpeg not found".to_string()
        }
    );
    assert!(calls.lock().unwrap().muxer.is_empty());
}

#[test]
fn stream_copy_writes_numbered_file() {
    let dir = TempDir::new().unwrap();
    let gateway = StubGateway::new();
    let calls = Arc::clone(&gateway.calls);

    let (result, events) = run(gateway, &request("https://cdn.example/live/index.m3u8", &dir));

    let expected = dir.path().join("001-stream.mp4");
    assert_eq!(
        result,
        DownloadResult::Success {
            filename: expected.to_string_lossy().to_string()
        }
    );

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].status, ProgressStatus::Downloading);
    assert_eq!(events[0].percentage, None);
    assert_eq!(events[1].status, ProgressStatus::Finished);
    assert_eq!(events[1].percentage, Some(100.0));
    assert_eq!(events[1].filename, "001-stream.mp4");

    let calls = calls.lock().unwrap();
    assert_eq!(calls.muxer, vec![("https://cdn.example/live/index.m3u8".to_string(), expected)]);
    assert!(calls.extractor.is_empty());
}

#[test]
fn stream_copy_failure_is_wrapped() {
    let dir = TempDir::new().unwrap();
    let mut gateway = StubGateway::new();
    gateway.muxer_error = Some("403 Forbidden".to_string());

    let (result, events) = run(gateway, &request("https://cdn.example/a.m3u8", &dir));

    assert_eq!(events.len(), 1);
    match result {
        DownloadResult::Failure { error_message } => {
            assert!(error_message.starts_with("FFmpeg error:"));
            assert!(error_message.contains("403 Forbidden"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn missing_output_directory_is_created() {
    let dir = TempDir::new().unwrap();
    let nested = dir.path().join("a").join("b");
    let req = DownloadRequest::new("https://vimeo.com/1", QualitySpec::Best, ContainerFormat::Mkv, &nested);

    let (result, _) = run(StubGateway::new(), &req);

    assert!(result.is_success());
    assert!(nested.is_dir());
}

#[test]
fn video_info_lists_qualities() {
    let downloader = Downloader::new(Box::new(StubGateway::new()));
    let info = downloader.video_info("https://www.youtube.com/watch?v=abc").unwrap();

    assert_eq!(info.title, "Sample clip");
    assert_eq!(info.duration, "2:05");
    let labels: Vec<_> = info.formats.iter().map(|f| f.quality.as_str()).collect();
    assert_eq!(labels, vec!["720p", "360p", "Audio Only (MP3)"]);
}

#[test]
fn success_message_falls_back_to_template_name() {
    let dir = TempDir::new().unwrap();
    let req = DownloadRequest::new("https://vimeo.com/1", QualitySpec::Best, ContainerFormat::Webm, dir.path());

    let (result, events) = run(StubGateway::new(), &req);

    assert!(events.is_empty());
    assert_eq!(
        result,
        DownloadResult::Success {
            filename: "Downloaded successfully as WEBM (001-%(title)s.%(ext)s)".to_string()
        }
    );
}
